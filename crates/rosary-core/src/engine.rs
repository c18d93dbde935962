//! Session state machine

use rosary_api::{AnimationInputs, Frame, Node, PrayerKind, Screen, Session};
use rosary_config::FlowTiming;
use rosary_host_api::HapticNotifier;
use rosary_store::{KeyValueStore, SessionRepository};
use rosary_util::{EpochMs, RosaryError, RoundId, countdown_seconds, ramp_fraction};
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::{
    CoreEvent, LoadOutcome, ResetReason, SessionPersistence, TapOutcome, Timeline, TimerKind,
    TimerSlots, TimerToken, progress,
};

/// Breathing period of the ambient animation on the start screen
pub const START_BREATH_CYCLE_MS: u64 = 5000;

/// The flow engine: owns the session, its timers and the persisted mirror.
///
/// Every operation takes the current time explicitly and returns the
/// events it produced; the caller repaints from [`FlowEngine::frame`] and
/// wakes up again at [`FlowEngine::next_deadline`].
pub struct FlowEngine {
    timing: FlowTiming,
    timeline: Timeline,
    persistence: SessionPersistence,
    haptics: Arc<dyn HapticNotifier>,
    session: Session,
    timers: TimerSlots,
    /// When the current node was entered (drives the load ramp)
    node_entered_at: Option<EpochMs>,
    /// Finale screen is showing until this moment
    finale_until: Option<EpochMs>,
}

impl FlowEngine {
    /// Create an engine at the start screen. Call [`FlowEngine::hydrate`]
    /// to pick up a persisted round.
    pub fn new(
        timing: FlowTiming,
        store: Arc<dyn KeyValueStore>,
        session_key: impl Into<String>,
        haptics: Arc<dyn HapticNotifier>,
    ) -> Self {
        let timeline = Timeline::build(timing.load_duration_ms());
        let persistence = SessionPersistence::new(
            SessionRepository::new(store, session_key),
            timeline.flow_version(),
        );

        info!(
            node_count = timeline.len(),
            flow_version = %timeline.flow_version(),
            "Flow engine initialized"
        );

        Self {
            timing,
            timeline,
            persistence,
            haptics,
            session: Session::idle(),
            timers: TimerSlots::new(),
            node_entered_at: None,
            finale_until: None,
        }
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn timing(&self) -> &FlowTiming {
        &self.timing
    }

    /// The node under the cursor
    pub fn current_node(&self) -> rosary_util::Result<(usize, &Node)> {
        let index = self
            .session
            .node_index
            .filter(|_| self.session.is_in_progress())
            .ok_or(RosaryError::NoActiveRound)?;
        let node = self.timeline.get(index).ok_or(RosaryError::NodeOutOfRange {
            index,
            len: self.timeline.len(),
        })?;
        Ok((index, node))
    }

    /// Outstanding timer of a kind, if any
    pub fn timer(&self, kind: TimerKind) -> Option<&TimerToken> {
        self.timers.get(kind)
    }

    /// When the next timer is due
    pub fn next_deadline(&self) -> Option<EpochMs> {
        self.timers.next_due()
    }

    pub fn is_finale_showing(&self) -> bool {
        self.finale_until.is_some()
    }

    /// Restore a persisted round, if a valid one exists, and start the
    /// expiry watcher.
    pub fn hydrate(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        self.ensure_watcher(now);

        match self
            .persistence
            .load(&self.timeline, now, self.timing.max_age_ms())
        {
            LoadOutcome::Empty => {}
            LoadOutcome::Rejected(reason) => {
                events.push(CoreEvent::PersistedRejected { reason });
            }
            LoadOutcome::Resumed(session) => {
                self.timers.cancel_round_timers();
                self.finale_until = None;
                self.session = session;

                let node_index = self.session.node_index.unwrap_or_default();
                let round_id = self.session.active_round_id.clone().unwrap_or_default();
                info!(
                    round_id = %round_id,
                    node_index,
                    "Session resumed"
                );
                events.push(CoreEvent::SessionResumed {
                    round_id,
                    node_index,
                });

                self.enter_current_node(now, &mut events);
                self.persist(now);
            }
        }

        events
    }

    /// Begin a fresh round at node 0, from any state
    pub fn start_round(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        self.ensure_watcher(now);
        self.timers.cancel_round_timers();
        self.finale_until = None;

        let round_id = RoundId::new();
        self.session = Session::begin(round_id.clone(), now);
        info!(round_id = %round_id, "Round started");
        events.push(CoreEvent::RoundStarted { round_id });

        self.enter_current_node(now, &mut events);
        self.persist(now);
        events
    }

    /// Move to the next node, completing the round past the last one.
    ///
    /// Ignored unless a round is in progress. An expired round is reset
    /// instead of advanced.
    pub fn advance(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        let Some(index) = self.session.node_index.filter(|_| self.session.is_in_progress()) else {
            debug!("Advance ignored: no round in progress");
            return events;
        };

        if self.expire_if_due(now, &mut events) {
            return events;
        }

        self.timers.cancel_node_timers();

        if self.timeline.get(index).and_then(Node::kind) == Some(PrayerKind::Invocation) {
            self.notify_haptic();
        }

        let next = index + 1;
        if next >= self.timeline.len() {
            self.complete(now, &mut events);
            return events;
        }

        debug!(from = index, to = next, "Advancing");
        self.session.node_index = Some(next);
        self.enter_current_node(now, &mut events);
        self.persist(now);
        events
    }

    /// Return to the start screen, clearing the persisted round
    pub fn reset_to_start(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        self.reset(now, ResetReason::UserRequested, &mut events);
        events
    }

    /// The primary user gesture.
    ///
    /// On the start screen this starts a round; on a prayer screen it either
    /// reveals the next part or, once allowed, advances. Load and finale
    /// screens ignore taps.
    pub fn tap(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if !self.session.is_in_progress() {
            if self.finale_until.is_some() {
                trace!("Tap ignored during finale");
                return events;
            }
            return self.start_round(now);
        }

        if self.expire_if_due(now, &mut events) {
            return events;
        }

        let Some(index) = self.session.node_index else {
            return events;
        };
        let Some(Node::Prayer(prayer)) = self.timeline.get(index) else {
            trace!(node_index = index, "Tap ignored on load node");
            return events;
        };

        let dwell_ms = self.timing.dwell_ms();
        let record = self
            .session
            .node_progress
            .entry(index)
            .or_insert_with(|| progress::initial_progress(prayer, now, dwell_ms));

        match progress::apply_tap(prayer, record, now, dwell_ms) {
            TapOutcome::Ignored => {
                trace!(node_index = index, "Tap ignored until dwell elapses");
            }
            TapOutcome::Advance => return self.advance(now),
            TapOutcome::Progressed => {
                let unlocks_at = record.next_visible_at_epoch_ms.filter(|at| *at > now);
                debug!(node_index = index, step = ?record.step, "Progress stepped");
                if let Some(at) = unlocks_at
                    && self.timers.get(TimerKind::DwellReveal).is_none()
                {
                    self.timers.schedule(TimerKind::DwellReveal, at);
                }
                self.persist(now);
                events.push(CoreEvent::ProgressStepped { node_index: index });
            }
        }

        events
    }

    /// Developer skip: advance regardless of node type or progress, or
    /// start a round from the start screen.
    pub fn skip(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        if self.session.is_in_progress() {
            debug!("Skipping current node");
            self.advance(now)
        } else {
            self.start_round(now)
        }
    }

    /// Fire every timer due at `now`, earliest first, then check expiry
    pub fn tick(&mut self, now: EpochMs) -> Vec<CoreEvent> {
        let mut events = Vec::new();
        while let Some(token) = self.timers.take_due(now) {
            events.extend(self.on_timer(token, now));
        }
        self.expire_if_due(now, &mut events);
        events
    }

    /// Run a single timer callback. Tokens that were cancelled or replaced
    /// are ignored.
    pub fn fire(&mut self, token: TimerToken, now: EpochMs) -> Vec<CoreEvent> {
        if !self.timers.is_current(&token) {
            trace!(kind = %token.kind, id = token.id, "Stale timer ignored");
            return Vec::new();
        }
        self.timers.cancel(token.kind);
        self.on_timer(token, now)
    }

    /// What the renderer should paint at `now`
    pub fn frame(&self, now: EpochMs) -> Frame {
        let screen = match (self.session.is_in_progress(), self.session.node_index) {
            (true, Some(index)) => match self.timeline.get(index) {
                Some(Node::Load { duration_ms }) => {
                    let remaining_ms = self.load_remaining_ms(*duration_ms, now);
                    Screen::Load {
                        duration_ms: *duration_ms,
                        remaining_ms,
                        countdown_secs: countdown_seconds(remaining_ms as EpochMs),
                    }
                }
                Some(Node::Prayer(prayer)) => {
                    let record = self
                        .session
                        .node_progress
                        .get(&index)
                        .copied()
                        .unwrap_or_else(|| {
                            progress::initial_progress(prayer, now, self.timing.dwell_ms())
                        });
                    Screen::Prayer {
                        node: prayer.clone(),
                        view: progress::evaluate(prayer, &record, now),
                    }
                }
                None => Screen::Start,
            },
            _ if self.finale_until.is_some() => Screen::Finale,
            _ => Screen::Start,
        };

        Frame {
            status: self.session.status,
            node_index: self.session.node_index,
            node_count: self.timeline.len(),
            screen,
        }
    }

    /// Read-only inputs for the ambient animation
    pub fn animation(&self, now: EpochMs) -> AnimationInputs {
        let load = self
            .session
            .node_index
            .filter(|_| self.session.is_in_progress())
            .and_then(|i| self.timeline.get(i));

        match (load, self.node_entered_at) {
            (Some(Node::Load { duration_ms }), Some(entered_at)) => AnimationInputs {
                status: self.session.status,
                ramp: ramp_fraction(entered_at, *duration_ms, now),
                breath_cycle_ms: (*duration_ms / 2).max(1),
            },
            _ => AnimationInputs {
                status: self.session.status,
                ramp: 0.0,
                breath_cycle_ms: START_BREATH_CYCLE_MS,
            },
        }
    }

    fn on_timer(&mut self, token: TimerToken, now: EpochMs) -> Vec<CoreEvent> {
        trace!(kind = %token.kind, id = token.id, "Timer fired");
        let mut events = Vec::new();

        match token.kind {
            TimerKind::LoadAdvance => events.extend(self.advance(now)),
            TimerKind::DwellReveal => {
                if let Some(node_index) = self.session.node_index {
                    debug!(node_index, "Advance unlocked");
                    events.push(CoreEvent::AdvanceUnlocked { node_index });
                }
            }
            TimerKind::ExpiryCheck => {
                self.schedule_watcher(now);
                self.expire_if_due(now, &mut events);
            }
            TimerKind::Finale => {
                self.finale_until = None;
                debug!("Finale ended");
                events.push(CoreEvent::FinaleEnded);
            }
        }

        events
    }

    /// Set up the current node: progress record and its timers
    fn enter_current_node(&mut self, now: EpochMs, events: &mut Vec<CoreEvent>) {
        self.timers.cancel_node_timers();
        let Some(index) = self.session.node_index else {
            return;
        };
        self.node_entered_at = Some(now);

        match self.timeline.get(index) {
            Some(Node::Load { duration_ms }) => {
                let due = now.saturating_add(*duration_ms as EpochMs);
                self.timers.schedule(TimerKind::LoadAdvance, due);
            }
            Some(Node::Prayer(prayer)) => {
                let dwell_ms = self.timing.dwell_ms();
                let record = self
                    .session
                    .node_progress
                    .entry(index)
                    .or_insert_with(|| progress::initial_progress(prayer, now, dwell_ms));
                if progress::restore_dwell(prayer, record, now, dwell_ms) {
                    debug!(node_index = index, "Re-armed dwell for restored progress");
                }
                if let Some(at) = record.next_visible_at_epoch_ms.filter(|at| *at > now) {
                    self.timers.schedule(TimerKind::DwellReveal, at);
                }
            }
            None => {
                warn!(node_index = index, "Entered node outside the timeline");
                return;
            }
        }

        debug!(
            node_index = index,
            node_type = self.timeline.get(index).map_or("none", Node::type_name),
            "Node entered"
        );
        events.push(CoreEvent::NodeEntered { node_index: index });
    }

    fn complete(&mut self, now: EpochMs, events: &mut Vec<CoreEvent>) {
        let round_id = self.session.active_round_id.clone();
        info!(
            round_id = ?round_id.as_ref().map(RoundId::as_str),
            "Round completed"
        );
        events.push(CoreEvent::RoundCompleted { round_id });

        self.reset(now, ResetReason::Completed, events);

        let finale_ms = self.timing.finale_ms();
        if finale_ms > 0 {
            let until = now.saturating_add(finale_ms);
            self.finale_until = Some(until);
            self.timers.schedule(TimerKind::Finale, until);
        }
    }

    fn reset(&mut self, now: EpochMs, reason: ResetReason, events: &mut Vec<CoreEvent>) {
        self.timers.cancel_round_timers();
        self.session = Session::idle();
        self.node_entered_at = None;
        self.finale_until = None;

        if let Err(e) = self.persistence.clear() {
            warn!(error = %e, "Failed to clear persisted session");
        }

        info!(reason = %reason, now, "Session reset to start");
        events.push(CoreEvent::SessionReset { reason });
    }

    /// Reset if the round has reached its maximum age
    fn expire_if_due(&mut self, now: EpochMs, events: &mut Vec<CoreEvent>) -> bool {
        if self.session.is_in_progress() && self.session.is_expired(now, self.timing.max_age_ms())
        {
            info!(
                started_at = ?self.session.started_at_epoch_ms,
                "Round expired"
            );
            self.reset(now, ResetReason::Expired, events);
            return true;
        }
        false
    }

    fn ensure_watcher(&mut self, now: EpochMs) {
        if self.timers.get(TimerKind::ExpiryCheck).is_none() {
            self.schedule_watcher(now);
        }
    }

    fn schedule_watcher(&mut self, now: EpochMs) {
        let interval = self.timing.expiry_check_ms().max(1);
        self.timers
            .schedule(TimerKind::ExpiryCheck, now.saturating_add(interval));
    }

    fn load_remaining_ms(&self, duration_ms: u64, now: EpochMs) -> u64 {
        match self.timers.get(TimerKind::LoadAdvance) {
            Some(token) => token.due_at.saturating_sub(now).max(0) as u64,
            None => {
                let elapsed = self
                    .node_entered_at
                    .map_or(0, |at| now.saturating_sub(at).max(0) as u64);
                duration_ms.saturating_sub(elapsed)
            }
        }
    }

    fn persist(&mut self, now: EpochMs) {
        self.session.updated_at_epoch_ms = Some(now);
        if let Err(e) = self.persistence.save(&self.session) {
            warn!(error = %e, "Failed to persist session");
        }
    }

    fn notify_haptic(&self) {
        if let Err(e) = self.haptics.light_impact() {
            debug!(error = %e, "Haptic impact failed");
        }
    }
}
