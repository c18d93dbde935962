//! Error types shared across rosary crates

use thiserror::Error;

/// Cross-cutting error type for rosary operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RosaryError {
    #[error("No round in progress")]
    NoActiveRound,

    #[error("Node index {index} out of range (timeline has {len} nodes)")]
    NodeOutOfRange { index: usize, len: usize },
}

pub type Result<T> = std::result::Result<T, RosaryError>;
