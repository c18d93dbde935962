//! Render frames handed to the renderer and animation driver

use rosary_util::EpochMs;
use serde::{Deserialize, Serialize};

use crate::{PrayerNode, SessionStatus};

/// What the user can do on the current prayer screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Capabilities {
    /// A tap moves to the next node
    pub can_advance: bool,
    /// A tap reveals the next part of this node
    pub can_progress: bool,
}

/// Renderable content for the current reveal step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PrayerContent {
    /// Whole text on one screen
    Plain { text: String },
    /// One stanza of an ordered sequence
    Stanza {
        index: usize,
        total: usize,
        text: String,
    },
    /// One versicle/response pair; `response` is `None` until revealed
    Vr {
        pair_index: usize,
        total_pairs: usize,
        versicle: String,
        response: Option<String>,
    },
}

/// Evaluated view of a prayer node's progress
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressView {
    pub capabilities: Capabilities,
    pub content: PrayerContent,
    /// When the dwell delay ends, if it has been armed and is still running
    pub advance_unlocks_at: Option<EpochMs>,
}

/// The screen the renderer should paint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum Screen {
    Start,
    Load {
        duration_ms: u64,
        remaining_ms: u64,
        /// Value for the "Next in Ns" label
        countdown_secs: u64,
    },
    Prayer {
        node: PrayerNode,
        view: ProgressView,
    },
    /// Shown briefly after the last node before returning to start
    Finale,
}

/// Everything the renderer needs after a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub status: SessionStatus,
    pub node_index: Option<usize>,
    pub node_count: usize,
    pub screen: Screen,
}

impl Frame {
    /// Capability flags of the current screen (all false off prayer screens)
    pub fn capabilities(&self) -> Capabilities {
        match &self.screen {
            Screen::Prayer { view, .. } => view.capabilities,
            _ => Capabilities::default(),
        }
    }
}

/// Read-only inputs for the ambient animation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnimationInputs {
    pub status: SessionStatus,
    /// Time since the load node started divided by its duration, 0..=1
    pub ramp: f64,
    /// Period of one breathing pulse
    pub breath_cycle_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capabilities_off_prayer_screens() {
        let frame = Frame {
            status: SessionStatus::InProgress,
            node_index: Some(0),
            node_count: 49,
            screen: Screen::Load {
                duration_ms: 7140,
                remaining_ms: 7140,
                countdown_secs: 8,
            },
        };
        assert_eq!(frame.capabilities(), Capabilities::default());
    }

    #[test]
    fn vr_content_wire_shape() {
        let content = PrayerContent::Vr {
            pair_index: 0,
            total_pairs: 2,
            versicle: "V. O God, make speed to save us.".into(),
            response: None,
        };
        let value = serde_json::to_value(&content).unwrap();
        assert_eq!(value["mode"], "vr");
        assert!(value["response"].is_null());
    }
}
