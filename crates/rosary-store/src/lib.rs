//! Persistence layer for the rosary flow
//!
//! Provides:
//! - A string key-value store (SQLite-backed, or in-memory)
//! - The versioned JSON schema of the persisted session
//! - A repository reading and writing that blob under a single key

mod memory;
mod session;
mod sqlite;
mod traits;

pub use memory::*;
pub use session::*;
pub use sqlite::*;
pub use traits::*;

use thiserror::Error;

/// Store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(e: rusqlite::Error) -> Self {
        StoreError::Database(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
