//! Reveal progress within a single prayer node
//!
//! Stanza nodes reveal one stanza per tap; versicle/response nodes reveal
//! the versicle, then its response, pair by pair. Once the final step is
//! on screen a dwell delay is armed, and only after it elapses may the
//! user move on to the next node.

use rosary_api::{
    Capabilities, PrayerContent, PrayerNode, ProgressMode, ProgressRecord, ProgressView,
    RevealStep, VrPhase,
};
use rosary_util::EpochMs;

/// One versicle and its response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VrPair {
    pub versicle: String,
    pub response: String,
}

/// Result of a tap on a prayer screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Progress moved one step within the node
    Progressed,
    /// The node is complete; the caller should advance
    Advance,
    /// Nothing to do yet (dwell still running)
    Ignored,
}

/// Split text into versicle/response pairs.
///
/// Blank lines are dropped and the rest are paired two at a time. An odd
/// trailing line gets an empty response, and text with no usable lines
/// still yields a single empty pair.
pub fn vr_pairs(text: &str) -> Vec<VrPair> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return vec![VrPair {
            versicle: String::new(),
            response: String::new(),
        }];
    }

    lines
        .chunks(2)
        .map(|chunk| VrPair {
            versicle: chunk[0].to_string(),
            response: chunk.get(1).map(|s| s.to_string()).unwrap_or_default(),
        })
        .collect()
}

/// Stanzas of a node, falling back to the whole text as one stanza
pub fn stanza_list(node: &PrayerNode) -> Vec<String> {
    if node.stanzas.is_empty() {
        vec![node.text.clone()]
    } else {
        node.stanzas.clone()
    }
}

fn stanza_count(node: &PrayerNode) -> usize {
    node.stanzas.len().max(1)
}

fn pair_count(node: &PrayerNode) -> usize {
    vr_pairs(&node.text).len()
}

/// Whether the record is on the last reveal step of its node
pub fn is_final(node: &PrayerNode, record: &ProgressRecord) -> bool {
    match record.step {
        RevealStep::Default => true,
        RevealStep::Stanza { stanza_index } => stanza_index + 1 >= stanza_count(node),
        RevealStep::Vr { pair_index, phase } => {
            pair_index + 1 >= pair_count(node) && phase == VrPhase::AwaitNextPair
        }
    }
}

/// Whether a (possibly persisted) record can belong to this node
pub fn is_valid_for(node: &PrayerNode, record: &ProgressRecord) -> bool {
    if record.mode() != node.kind.progress_mode() {
        return false;
    }
    let in_range = match record.step {
        RevealStep::Default => return true,
        RevealStep::Stanza { stanza_index } => stanza_index < stanza_count(node),
        RevealStep::Vr { pair_index, .. } => pair_index < pair_count(node),
    };
    // A dwell deadline only exists once the last step is showing
    in_range && (record.next_visible_at_epoch_ms.is_none() || is_final(node, record))
}

fn arm_dwell(record: &mut ProgressRecord, now: EpochMs, dwell_ms: EpochMs) {
    if record.next_visible_at_epoch_ms.is_none() {
        record.next_visible_at_epoch_ms = Some(now.saturating_add(dwell_ms));
    }
}

/// Arm the dwell for a record restored on its last step without a deadline.
///
/// Returns true when the record was changed.
pub fn restore_dwell(
    node: &PrayerNode,
    record: &mut ProgressRecord,
    now: EpochMs,
    dwell_ms: EpochMs,
) -> bool {
    if record.mode() == ProgressMode::Default
        || record.next_visible_at_epoch_ms.is_some()
        || !is_final(node, record)
    {
        return false;
    }
    arm_dwell(record, now, dwell_ms);
    true
}

/// Fresh record for a first visit to `node`.
///
/// Stanza and vr nodes whose first step is already the last one arm the
/// dwell immediately.
pub fn initial_progress(node: &PrayerNode, now: EpochMs, dwell_ms: EpochMs) -> ProgressRecord {
    let mut record = ProgressRecord::new(node.kind.progress_mode());
    if record.mode() != ProgressMode::Default && is_final(node, &record) {
        arm_dwell(&mut record, now, dwell_ms);
    }
    record
}

fn dwell_elapsed(record: &ProgressRecord, now: EpochMs) -> bool {
    record
        .next_visible_at_epoch_ms
        .is_some_and(|deadline| now >= deadline)
}

/// Capabilities and renderable content for the current step
pub fn evaluate(node: &PrayerNode, record: &ProgressRecord, now: EpochMs) -> ProgressView {
    let final_step = is_final(node, record);

    let (content, can_advance) = match record.step {
        RevealStep::Default => (
            PrayerContent::Plain {
                text: node.text.clone(),
            },
            true,
        ),
        RevealStep::Stanza { stanza_index } => {
            let stanzas = stanza_list(node);
            let index = stanza_index.min(stanzas.len() - 1);
            (
                PrayerContent::Stanza {
                    index,
                    total: stanzas.len(),
                    text: stanzas[index].clone(),
                },
                final_step && dwell_elapsed(record, now),
            )
        }
        RevealStep::Vr { pair_index, phase } => {
            let pairs = vr_pairs(&node.text);
            let index = pair_index.min(pairs.len() - 1);
            let pair = &pairs[index];
            (
                PrayerContent::Vr {
                    pair_index: index,
                    total_pairs: pairs.len(),
                    versicle: pair.versicle.clone(),
                    response: (phase == VrPhase::AwaitNextPair).then(|| pair.response.clone()),
                },
                final_step && dwell_elapsed(record, now),
            )
        }
    };

    let advance_unlocks_at = record
        .next_visible_at_epoch_ms
        .filter(|deadline| *deadline > now);

    ProgressView {
        capabilities: Capabilities {
            can_advance,
            can_progress: !final_step,
        },
        content,
        advance_unlocks_at,
    }
}

/// Apply one tap to the record.
///
/// Performs at most one transition. The record is left untouched when the
/// outcome is `Ignored` or `Advance`.
pub fn apply_tap(
    node: &PrayerNode,
    record: &mut ProgressRecord,
    now: EpochMs,
    dwell_ms: EpochMs,
) -> TapOutcome {
    if is_final(node, record) {
        let unlocked = record.mode() == ProgressMode::Default || dwell_elapsed(record, now);
        return if unlocked {
            TapOutcome::Advance
        } else {
            TapOutcome::Ignored
        };
    }

    record.step = match record.step {
        RevealStep::Stanza { stanza_index } => RevealStep::Stanza {
            stanza_index: stanza_index + 1,
        },
        RevealStep::Vr {
            pair_index,
            phase: VrPhase::AwaitResponse,
        } => RevealStep::Vr {
            pair_index,
            phase: VrPhase::AwaitNextPair,
        },
        RevealStep::Vr {
            pair_index,
            phase: VrPhase::AwaitNextPair,
        } => RevealStep::Vr {
            pair_index: pair_index + 1,
            phase: VrPhase::AwaitResponse,
        },
        // Default is always final
        RevealStep::Default => return TapOutcome::Ignored,
    };

    if is_final(node, record) {
        arm_dwell(record, now, dwell_ms);
    }
    TapOutcome::Progressed
}
