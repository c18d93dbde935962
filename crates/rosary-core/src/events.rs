//! Core events emitted by the engine

use rosary_util::RoundId;
use std::fmt;

use crate::Rejection;

/// Why a session went back to the start screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetReason {
    /// Advanced past the last node
    Completed,
    /// Round reached its maximum age
    Expired,
    /// Back-to-start requested by the user
    UserRequested,
}

impl fmt::Display for ResetReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ResetReason::Completed => "completed",
            ResetReason::Expired => "expired",
            ResetReason::UserRequested => "user_requested",
        };
        f.write_str(s)
    }
}

/// Events emitted by the flow engine
#[derive(Debug, Clone, PartialEq)]
pub enum CoreEvent {
    /// A new round started at node 0
    RoundStarted { round_id: RoundId },

    /// A persisted round was restored
    SessionResumed {
        round_id: RoundId,
        node_index: usize,
    },

    /// A persisted round was discarded on load
    PersistedRejected { reason: Rejection },

    /// The cursor moved onto a node
    NodeEntered { node_index: usize },

    /// A tap revealed the next part of a prayer
    ProgressStepped { node_index: usize },

    /// The dwell on a prayer's final step elapsed
    AdvanceUnlocked { node_index: usize },

    /// The last node was passed
    RoundCompleted { round_id: Option<RoundId> },

    /// The session returned to the start screen
    SessionReset { reason: ResetReason },

    /// The finale screen timed out
    FinaleEnded,
}
