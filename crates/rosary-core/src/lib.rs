//! Core state machines for the rosary flow
//!
//! This crate is the heart of the flow, containing:
//! - The timeline builder (fixed sequence of load and prayer nodes)
//! - Per-node reveal progress (plain, stanza, versicle/response)
//! - The session state machine (start -> in_progress -> start)
//! - Timer slots with cancel-before-schedule semantics
//! - Validation of persisted sessions on resume

mod engine;
mod events;
mod liturgy;
mod persistence;
mod progress;
mod timeline;
mod timers;

pub use engine::*;
pub use events::*;
pub use liturgy::*;
pub use persistence::*;
pub use progress::*;
pub use timeline::*;
pub use timers::*;
