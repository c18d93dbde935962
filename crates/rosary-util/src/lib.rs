//! Shared utilities for the rosary flow
//!
//! This crate provides:
//! - ID types (RoundId)
//! - Time utilities (epoch milliseconds, mock time, countdown helpers)
//! - Error types
//! - Default paths for config and data directories

mod error;
mod ids;
mod paths;
mod time;

pub use error::*;
pub use ids::*;
pub use paths::*;
pub use time::*;
