//! Shared data model for the rosary flow
//!
//! This crate defines the types exchanged between the core state machine,
//! the persistence layer and the rendering glue:
//! - Timeline nodes (load / prayer)
//! - Session and per-node progress records (also the persisted shape)
//! - Render frames and animation inputs

mod types;
mod view;

pub use types::*;
pub use view::*;
