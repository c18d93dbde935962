//! Persisted session schema and repository

use rosary_api::{ProgressRecord, Session, SessionStatus};
use rosary_util::{EpochMs, RoundId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::{KeyValueStore, StoreResult};

/// The JSON blob stored under the session key.
///
/// Optional fields default when absent so that blobs written by older
/// builds still parse; whether they are usable is decided by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSession {
    #[serde(default)]
    pub status: SessionStatus,

    pub node_index: i64,

    #[serde(default)]
    pub started_at_epoch_ms: Option<EpochMs>,

    #[serde(default)]
    pub updated_at_epoch_ms: Option<EpochMs>,

    #[serde(default)]
    pub active_round_id: Option<RoundId>,

    /// Keyed by node index; JSON object keys are the index as a string
    #[serde(default)]
    pub node_progress: BTreeMap<usize, ProgressRecord>,

    /// Timeline fingerprint at the time of writing
    #[serde(default)]
    pub flow_version: String,
}

impl PersistedSession {
    pub fn from_session(session: &Session, flow_version: &str) -> Self {
        Self {
            status: session.status,
            node_index: session.wire_node_index(),
            started_at_epoch_ms: session.started_at_epoch_ms,
            updated_at_epoch_ms: session.updated_at_epoch_ms,
            active_round_id: session.active_round_id.clone(),
            node_progress: session.node_progress.clone(),
            flow_version: flow_version.to_string(),
        }
    }
}

/// Reads and writes the session blob under a single key
#[derive(Clone)]
pub struct SessionRepository {
    store: Arc<dyn KeyValueStore>,
    key: String,
}

impl SessionRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Serialize and store the session
    pub fn save(&self, persisted: &PersistedSession) -> StoreResult<()> {
        let json = serde_json::to_string(persisted)?;
        self.store.set(&self.key, &json)?;
        debug!(
            key = %self.key,
            node_index = persisted.node_index,
            "Session saved"
        );
        Ok(())
    }

    /// Read the stored session.
    ///
    /// Returns `Ok(None)` when nothing is stored and a
    /// `StoreError::Serialization` when the blob does not parse.
    pub fn load(&self) -> StoreResult<Option<PersistedSession>> {
        match self.store.get(&self.key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Remove the stored session
    pub fn clear(&self) -> StoreResult<()> {
        self.store.remove(&self.key)?;
        debug!(key = %self.key, "Session cleared");
        Ok(())
    }

    /// Whether anything is stored under the key
    pub fn exists(&self) -> StoreResult<bool> {
        Ok(self.store.get(&self.key)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MemoryStore, StoreError};
    use rosary_api::{ProgressMode, RevealStep};

    fn repo() -> (Arc<MemoryStore>, SessionRepository) {
        let store = Arc::new(MemoryStore::new());
        let repo = SessionRepository::new(store.clone(), "session");
        (store, repo)
    }

    #[test]
    fn wire_format_matches_schema() {
        let mut session = Session::begin(RoundId::from("round-1"), 1_000);
        session.node_index = Some(3);
        session.node_progress.insert(
            3,
            ProgressRecord {
                step: RevealStep::Stanza { stanza_index: 2 },
                next_visible_at_epoch_ms: None,
            },
        );

        let persisted = PersistedSession::from_session(&session, "flow-4-38");
        let value = serde_json::to_value(&persisted).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "status": "in_progress",
                "nodeIndex": 3,
                "startedAtEpochMs": 1000,
                "updatedAtEpochMs": 1000,
                "activeRoundId": "round-1",
                "nodeProgress": {
                    "3": { "mode": "stanza", "stanzaIndex": 2, "nextVisibleAtEpochMs": null }
                },
                "flowVersion": "flow-4-38"
            })
        );
    }

    #[test]
    fn save_load_clear() {
        let (_store, repo) = repo();
        assert!(repo.load().unwrap().is_none());

        let mut session = Session::begin(RoundId::new(), 5_000);
        session
            .node_progress
            .insert(1, ProgressRecord::new(ProgressMode::Vr));
        let persisted = PersistedSession::from_session(&session, "flow-4-38");

        repo.save(&persisted).unwrap();
        assert!(repo.exists().unwrap());
        assert_eq!(repo.load().unwrap(), Some(persisted));

        repo.clear().unwrap();
        assert!(!repo.exists().unwrap());
    }

    #[test]
    fn malformed_blob_is_serialization_error() {
        let (store, repo) = repo();
        store.set("session", "{not json").unwrap();

        assert!(matches!(repo.load(), Err(StoreError::Serialization(_))));
    }

    #[test]
    fn sparse_legacy_blob_parses() {
        let (store, repo) = repo();
        store
            .set("session", r#"{"status":"in_progress","nodeIndex":4,"startedAtEpochMs":10}"#)
            .unwrap();

        let loaded = repo.load().unwrap().unwrap();
        assert_eq!(loaded.node_index, 4);
        assert_eq!(loaded.updated_at_epoch_ms, None);
        assert_eq!(loaded.active_round_id, None);
        assert!(loaded.node_progress.is_empty());
        assert_eq!(loaded.flow_version, "");
    }
}
