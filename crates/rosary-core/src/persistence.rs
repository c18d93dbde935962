//! Save/load of the session with validation on resume

use rosary_api::{Node, ProgressRecord, Session, SessionStatus};
use rosary_store::{PersistedSession, SessionRepository, StoreError, StoreResult};
use rosary_util::{EpochMs, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use crate::{Timeline, progress};

/// Why a persisted session was discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The blob did not parse
    Malformed,
    /// Written for different timeline content
    StaleFlow,
    /// No start time recorded
    MissingStart,
    /// The round is older than the maximum age
    Expired,
    /// The node index does not address the current timeline
    InvalidIndex,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::Malformed => "malformed",
            Rejection::StaleFlow => "stale_flow",
            Rejection::MissingStart => "missing_start",
            Rejection::Expired => "expired",
            Rejection::InvalidIndex => "invalid_index",
        };
        f.write_str(s)
    }
}

/// Result of reading the persisted session
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Nothing stored (or the store could not be read)
    Empty,
    /// A valid round to continue
    Resumed(Session),
    /// Something was stored but it was discarded
    Rejected(Rejection),
}

/// Mirrors the session into the key-value store
#[derive(Clone)]
pub struct SessionPersistence {
    repo: SessionRepository,
    flow_version: String,
}

impl SessionPersistence {
    pub fn new(repo: SessionRepository, flow_version: impl Into<String>) -> Self {
        Self {
            repo,
            flow_version: flow_version.into(),
        }
    }

    /// Write the session together with the current flow version
    pub fn save(&self, session: &Session) -> StoreResult<()> {
        self.repo
            .save(&PersistedSession::from_session(session, &self.flow_version))
    }

    /// Remove the stored session
    pub fn clear(&self) -> StoreResult<()> {
        self.repo.clear()
    }

    /// Read, validate and convert the stored session.
    ///
    /// Rejected payloads are removed from the store.
    pub fn load(&self, timeline: &Timeline, now: EpochMs, max_age_ms: EpochMs) -> LoadOutcome {
        let persisted = match self.repo.load() {
            Ok(Some(persisted)) => persisted,
            Ok(None) => {
                debug!("No persisted session");
                return LoadOutcome::Empty;
            }
            Err(StoreError::Serialization(e)) => {
                debug!(error = %e, "Persisted session does not parse");
                return self.reject(Rejection::Malformed);
            }
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                return LoadOutcome::Empty;
            }
        };

        match self.validate(persisted, timeline, now, max_age_ms) {
            Ok(session) => {
                info!(
                    node_index = session.wire_node_index(),
                    progress_records = session.node_progress.len(),
                    "Persisted session accepted"
                );
                LoadOutcome::Resumed(session)
            }
            Err(rejection) => self.reject(rejection),
        }
    }

    fn reject(&self, rejection: Rejection) -> LoadOutcome {
        warn!(reason = %rejection, "Discarding persisted session");
        if let Err(e) = self.repo.clear() {
            warn!(error = %e, "Failed to clear rejected session");
        }
        LoadOutcome::Rejected(rejection)
    }

    fn validate(
        &self,
        persisted: PersistedSession,
        timeline: &Timeline,
        now: EpochMs,
        max_age_ms: EpochMs,
    ) -> Result<Session, Rejection> {
        if persisted.flow_version != self.flow_version {
            return Err(Rejection::StaleFlow);
        }

        let started_at = persisted.started_at_epoch_ms.ok_or(Rejection::MissingStart)?;
        if rosary_api::is_expired(Some(started_at), now, max_age_ms) {
            return Err(Rejection::Expired);
        }

        let node_index = usize::try_from(persisted.node_index)
            .ok()
            .filter(|i| *i < timeline.len())
            .ok_or(Rejection::InvalidIndex)?;

        Ok(Session {
            status: SessionStatus::InProgress,
            node_index: Some(node_index),
            started_at_epoch_ms: Some(started_at),
            updated_at_epoch_ms: persisted.updated_at_epoch_ms.or(Some(started_at)),
            active_round_id: Some(persisted.active_round_id.unwrap_or_else(RoundId::new)),
            node_progress: sanitize_progress(persisted.node_progress, timeline),
        })
    }
}

/// Drop progress records that cannot belong to the node they are keyed by
fn sanitize_progress(
    records: BTreeMap<usize, ProgressRecord>,
    timeline: &Timeline,
) -> BTreeMap<usize, ProgressRecord> {
    records
        .into_iter()
        .filter(|(index, record)| match timeline.get(*index) {
            Some(Node::Prayer(prayer)) => {
                let valid = progress::is_valid_for(prayer, record);
                if !valid {
                    debug!(node_index = index, "Dropping mismatched progress record");
                }
                valid
            }
            _ => {
                debug!(node_index = index, "Dropping progress for non-prayer node");
                false
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosary_api::{ProgressMode, RevealStep};
    use rosary_store::{KeyValueStore, MemoryStore};
    use std::sync::Arc;

    const MAX_AGE: EpochMs = 120 * 60 * 1000;
    const KEY: &str = "anglican_rosary_session_v1";

    fn setup() -> (Arc<MemoryStore>, SessionPersistence, Timeline) {
        let store = Arc::new(MemoryStore::new());
        let timeline = Timeline::default();
        let persistence = SessionPersistence::new(
            SessionRepository::new(store.clone(), KEY),
            timeline.flow_version(),
        );
        (store, persistence, timeline)
    }

    fn in_progress(started: EpochMs, index: usize) -> Session {
        let mut session = Session::begin(RoundId::new(), started);
        session.node_index = Some(index);
        session
    }

    #[test]
    fn empty_store() {
        let (_, persistence, timeline) = setup();
        assert_eq!(persistence.load(&timeline, 0, MAX_AGE), LoadOutcome::Empty);
    }

    #[test]
    fn round_trip_preserves_progress() {
        let (_, persistence, timeline) = setup();
        let mut session = in_progress(1_000, 1);
        session.node_progress.insert(
            1,
            ProgressRecord {
                step: RevealStep::Stanza { stanza_index: 3 },
                next_visible_at_epoch_ms: None,
            },
        );
        persistence.save(&session).unwrap();

        match persistence.load(&timeline, 2_000, MAX_AGE) {
            LoadOutcome::Resumed(loaded) => {
                assert_eq!(loaded.status, session.status);
                assert_eq!(loaded.node_index, session.node_index);
                assert_eq!(loaded.node_progress, session.node_progress);
                assert_eq!(loaded.active_round_id, session.active_round_id);
            }
            other => panic!("expected resume, got {other:?}"),
        }
    }

    #[test]
    fn malformed_is_cleared() {
        let (store, persistence, timeline) = setup();
        store.set(KEY, "{not json").unwrap();
        assert_eq!(
            persistence.load(&timeline, 0, MAX_AGE),
            LoadOutcome::Rejected(Rejection::Malformed)
        );
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn stale_flow_is_cleared() {
        let (store, current, timeline) = setup();
        let old = SessionPersistence::new(SessionRepository::new(store.clone(), KEY), "flow-3-30");
        old.save(&in_progress(0, 2)).unwrap();

        assert_eq!(
            current.load(&timeline, 10, MAX_AGE),
            LoadOutcome::Rejected(Rejection::StaleFlow)
        );
        assert_eq!(store.get(KEY).unwrap(), None);
    }

    #[test]
    fn expired_is_cleared() {
        let (store, persistence, timeline) = setup();
        let now = 10 * MAX_AGE;
        persistence.save(&in_progress(now - MAX_AGE - 1, 3)).unwrap();
        assert_eq!(
            persistence.load(&timeline, now, MAX_AGE),
            LoadOutcome::Rejected(Rejection::Expired)
        );
        assert!(store.is_empty());
    }

    #[test]
    fn out_of_range_index_is_cleared() {
        let (store, persistence, timeline) = setup();
        persistence.save(&in_progress(0, timeline.len())).unwrap();
        assert_eq!(
            persistence.load(&timeline, 1, MAX_AGE),
            LoadOutcome::Rejected(Rejection::InvalidIndex)
        );
        assert!(store.is_empty());

        store
            .set(KEY, r#"{"nodeIndex":-1,"startedAtEpochMs":0,"flowVersion":"flow-4-38"}"#)
            .unwrap();
        assert_eq!(
            persistence.load(&timeline, 1, MAX_AGE),
            LoadOutcome::Rejected(Rejection::InvalidIndex)
        );
    }

    #[test]
    fn missing_start_is_rejected() {
        let (store, persistence, timeline) = setup();
        store
            .set(KEY, r#"{"status":"in_progress","nodeIndex":4,"flowVersion":"flow-4-38"}"#)
            .unwrap();
        assert_eq!(
            persistence.load(&timeline, 1, MAX_AGE),
            LoadOutcome::Rejected(Rejection::MissingStart)
        );
    }

    #[test]
    fn sparse_payload_gets_defaults() {
        let (store, persistence, timeline) = setup();
        store
            .set(
                KEY,
                r#"{"status":"in_progress","nodeIndex":3,"startedAtEpochMs":500,"flowVersion":"flow-4-38"}"#,
            )
            .unwrap();

        let LoadOutcome::Resumed(session) = persistence.load(&timeline, 600, MAX_AGE) else {
            panic!("expected resume");
        };
        assert_eq!(session.status, SessionStatus::InProgress);
        assert_eq!(session.node_index, Some(3));
        assert_eq!(session.updated_at_epoch_ms, Some(500));
        assert!(session.active_round_id.is_some());
        assert!(session.node_progress.is_empty());
    }

    #[test]
    fn mismatched_progress_is_dropped() {
        let (_, persistence, timeline) = setup();
        let mut session = in_progress(0, 5);
        // 0 is a load node, 1 is the creed (stanza), 3 is the invitatory (vr)
        session.node_progress.insert(0, ProgressRecord::new(ProgressMode::Default));
        session.node_progress.insert(1, ProgressRecord::new(ProgressMode::Vr));
        session.node_progress.insert(3, ProgressRecord::new(ProgressMode::Vr));
        persistence.save(&session).unwrap();

        let LoadOutcome::Resumed(loaded) = persistence.load(&timeline, 1, MAX_AGE) else {
            panic!("expected resume");
        };
        assert_eq!(loaded.node_progress.keys().copied().collect::<Vec<_>>(), vec![3]);
    }

    #[test]
    fn early_dwell_deadline_is_dropped() {
        let (_, persistence, timeline) = setup();
        let mut session = in_progress(0, 1);
        session.node_progress.insert(
            1,
            ProgressRecord {
                step: RevealStep::Stanza { stanza_index: 3 },
                next_visible_at_epoch_ms: Some(2_000),
            },
        );
        session.node_progress.insert(
            3,
            ProgressRecord {
                step: RevealStep::Vr {
                    pair_index: 0,
                    phase: rosary_api::VrPhase::AwaitResponse,
                },
                next_visible_at_epoch_ms: Some(2_000),
            },
        );
        persistence.save(&session).unwrap();

        let LoadOutcome::Resumed(loaded) = persistence.load(&timeline, 1, MAX_AGE) else {
            panic!("expected resume");
        };
        assert!(loaded.node_progress.is_empty());
    }
}
