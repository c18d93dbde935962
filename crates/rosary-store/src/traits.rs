//! Store trait definitions

use crate::StoreResult;

/// Durable string key-value store
pub trait KeyValueStore: Send + Sync {
    /// Read the value under `key`
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Write `value` under `key`, replacing any previous value
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Check if store is healthy
    fn is_healthy(&self) -> bool;
}
