//! Timer slots
//!
//! Each timer kind has a single slot. Scheduling into an occupied slot
//! replaces the previous token, so a stale callback can be recognised by
//! comparing its token against the slot.

use rosary_util::EpochMs;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The suspension points of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimerKind {
    /// Auto-advance off a load node
    LoadAdvance,
    /// Dwell gate on a prayer's final reveal step
    DwellReveal,
    /// Periodic expiry watcher
    ExpiryCheck,
    /// Finale screen before returning to start
    Finale,
}

impl TimerKind {
    pub const ALL: [TimerKind; 4] = [
        TimerKind::LoadAdvance,
        TimerKind::DwellReveal,
        TimerKind::ExpiryCheck,
        TimerKind::Finale,
    ];

    fn slot(self) -> usize {
        match self {
            TimerKind::LoadAdvance => 0,
            TimerKind::DwellReveal => 1,
            TimerKind::ExpiryCheck => 2,
            TimerKind::Finale => 3,
        }
    }
}

impl fmt::Display for TimerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TimerKind::LoadAdvance => "load_advance",
            TimerKind::DwellReveal => "dwell_reveal",
            TimerKind::ExpiryCheck => "expiry_check",
            TimerKind::Finale => "finale",
        };
        f.write_str(s)
    }
}

/// Handle to one scheduled callback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimerToken {
    pub kind: TimerKind,
    pub id: u64,
    pub due_at: EpochMs,
}

/// At most one outstanding timer per kind
#[derive(Debug, Clone, Default)]
pub struct TimerSlots {
    next_id: u64,
    slots: [Option<TimerToken>; 4],
}

impl TimerSlots {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a timer, cancelling any outstanding one of the same kind
    pub fn schedule(&mut self, kind: TimerKind, due_at: EpochMs) -> TimerToken {
        self.next_id += 1;
        let token = TimerToken {
            kind,
            id: self.next_id,
            due_at,
        };
        self.slots[kind.slot()] = Some(token);
        token
    }

    pub fn cancel(&mut self, kind: TimerKind) -> Option<TimerToken> {
        self.slots[kind.slot()].take()
    }

    /// Cancel timers tied to the node being left
    pub fn cancel_node_timers(&mut self) {
        self.cancel(TimerKind::LoadAdvance);
        self.cancel(TimerKind::DwellReveal);
    }

    /// Cancel everything tied to the current round.
    ///
    /// The expiry watcher is process-wide and keeps running.
    pub fn cancel_round_timers(&mut self) {
        self.cancel_node_timers();
        self.cancel(TimerKind::Finale);
    }

    pub fn get(&self, kind: TimerKind) -> Option<&TimerToken> {
        self.slots[kind.slot()].as_ref()
    }

    /// Whether `token` is still the outstanding timer of its kind
    pub fn is_current(&self, token: &TimerToken) -> bool {
        self.get(token.kind) == Some(token)
    }

    /// Earliest due time among outstanding timers
    pub fn next_due(&self) -> Option<EpochMs> {
        self.slots.iter().flatten().map(|t| t.due_at).min()
    }

    /// Remove and return the earliest timer due at or before `now`
    pub fn take_due(&mut self, now: EpochMs) -> Option<TimerToken> {
        let token = *self
            .slots
            .iter()
            .flatten()
            .filter(|t| t.due_at <= now)
            .min_by_key(|t| (t.due_at, t.id))?;
        self.slots[token.kind.slot()] = None;
        Some(token)
    }

    pub fn pending(&self) -> usize {
        self.slots.iter().flatten().count()
    }
}
