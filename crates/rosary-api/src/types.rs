//! Timeline, session and progress types

use rosary_util::{EpochMs, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// What a prayer node contains. Determines its reveal mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrayerKind {
    Creed,
    Invitatory,
    LordsPrayer,
    Mystery,
    Invocation,
}

impl PrayerKind {
    /// Reveal mode used by nodes of this kind
    pub fn progress_mode(self) -> ProgressMode {
        match self {
            PrayerKind::Creed | PrayerKind::LordsPrayer => ProgressMode::Stanza,
            PrayerKind::Invitatory => ProgressMode::Vr,
            PrayerKind::Mystery | PrayerKind::Invocation => ProgressMode::Default,
        }
    }
}

impl fmt::Display for PrayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PrayerKind::Creed => "creed",
            PrayerKind::Invitatory => "invitatory",
            PrayerKind::LordsPrayer => "lords_prayer",
            PrayerKind::Mystery => "mystery",
            PrayerKind::Invocation => "invocation",
        };
        f.write_str(s)
    }
}

/// A prayer screen
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrayerNode {
    pub kind: PrayerKind,
    pub title: String,
    pub text: String,
    pub meta: String,
    /// Ordered parts for stanza-mode kinds; empty otherwise
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stanzas: Vec<String>,
}

/// One step of the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Animated transition that auto-advances after `duration_ms`
    Load {
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    /// Text display advanced by the user
    Prayer(PrayerNode),
}

impl Node {
    pub fn load(duration_ms: u64) -> Self {
        Node::Load { duration_ms }
    }

    pub fn prayer(
        kind: PrayerKind,
        title: impl Into<String>,
        text: impl Into<String>,
        meta: impl Into<String>,
    ) -> Self {
        Node::Prayer(PrayerNode {
            kind,
            title: title.into(),
            text: text.into(),
            meta: meta.into(),
            stanzas: Vec::new(),
        })
    }

    pub fn is_load(&self) -> bool {
        matches!(self, Node::Load { .. })
    }

    pub fn as_prayer(&self) -> Option<&PrayerNode> {
        match self {
            Node::Prayer(p) => Some(p),
            Node::Load { .. } => None,
        }
    }

    pub fn kind(&self) -> Option<PrayerKind> {
        self.as_prayer().map(|p| p.kind)
    }

    /// Short label for logs
    pub fn type_name(&self) -> &'static str {
        match self {
            Node::Load { .. } => "load",
            Node::Prayer(_) => "prayer",
        }
    }
}

/// Top-level session status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Start,
    InProgress,
}

/// Reveal mode of a prayer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMode {
    Default,
    Stanza,
    Vr,
}

/// Phase within one versicle/response pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VrPhase {
    /// Versicle shown, response hidden
    AwaitResponse,
    /// Both lines shown
    AwaitNextPair,
}

/// Position within a prayer's reveal sequence, tagged by mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RevealStep {
    Default,
    Stanza {
        #[serde(rename = "stanzaIndex")]
        stanza_index: usize,
    },
    Vr {
        #[serde(rename = "pairIndex")]
        pair_index: usize,
        phase: VrPhase,
    },
}

impl RevealStep {
    /// First step for a mode
    pub fn initial(mode: ProgressMode) -> Self {
        match mode {
            ProgressMode::Default => RevealStep::Default,
            ProgressMode::Stanza => RevealStep::Stanza { stanza_index: 0 },
            ProgressMode::Vr => RevealStep::Vr {
                pair_index: 0,
                phase: VrPhase::AwaitResponse,
            },
        }
    }

    pub fn mode(&self) -> ProgressMode {
        match self {
            RevealStep::Default => ProgressMode::Default,
            RevealStep::Stanza { .. } => ProgressMode::Stanza,
            RevealStep::Vr { .. } => ProgressMode::Vr,
        }
    }
}

/// Reveal progress within one prayer node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressRecord {
    #[serde(flatten)]
    pub step: RevealStep,

    /// Set once, when the final reveal step is reached. Advancing to the
    /// next node is blocked until this moment.
    #[serde(rename = "nextVisibleAtEpochMs", default)]
    pub next_visible_at_epoch_ms: Option<EpochMs>,
}

impl ProgressRecord {
    pub fn new(mode: ProgressMode) -> Self {
        Self {
            step: RevealStep::initial(mode),
            next_visible_at_epoch_ms: None,
        }
    }

    pub fn mode(&self) -> ProgressMode {
        self.step.mode()
    }
}

/// The single process-wide session
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Session {
    pub status: SessionStatus,

    /// `None` while at `start`, otherwise a valid timeline index
    pub node_index: Option<usize>,

    pub started_at_epoch_ms: Option<EpochMs>,
    pub updated_at_epoch_ms: Option<EpochMs>,
    pub active_round_id: Option<RoundId>,

    /// Progress per prayer node index, created on first visit
    pub node_progress: BTreeMap<usize, ProgressRecord>,
}

impl Session {
    /// Session at the start screen
    pub fn idle() -> Self {
        Self::default()
    }

    /// Fresh round positioned on the first node
    pub fn begin(round_id: RoundId, now: EpochMs) -> Self {
        Self {
            status: SessionStatus::InProgress,
            node_index: Some(0),
            started_at_epoch_ms: Some(now),
            updated_at_epoch_ms: Some(now),
            active_round_id: Some(round_id),
            node_progress: BTreeMap::new(),
        }
    }

    pub fn is_in_progress(&self) -> bool {
        self.status == SessionStatus::InProgress
    }

    /// Node index in wire form: -1 when no node is selected
    pub fn wire_node_index(&self) -> i64 {
        self.node_index.map_or(-1, |i| i as i64)
    }

    /// Whether the round has run for at least `max_age_ms`.
    ///
    /// A session without a start time never expires.
    pub fn is_expired(&self, now: EpochMs, max_age_ms: EpochMs) -> bool {
        is_expired(self.started_at_epoch_ms, now, max_age_ms)
    }
}

/// Expiry rule shared by the live session and persisted payloads
pub fn is_expired(started_at: Option<EpochMs>, now: EpochMs, max_age_ms: EpochMs) -> bool {
    match started_at {
        Some(started) => now.saturating_sub(started) >= max_age_ms,
        None => false,
    }
}
