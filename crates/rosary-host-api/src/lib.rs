//! Collaborator interfaces for the rosary flow
//!
//! This crate defines the boundary between the core state machine and the
//! host that paints screens and talks to devices. It contains no platform
//! code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
