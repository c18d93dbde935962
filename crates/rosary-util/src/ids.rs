//! Strongly-typed identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Opaque token identifying one traversal of the timeline.
///
/// A fresh value is minted for every round start and never reused. Stored
/// as a plain string so payloads written by older builds (which used a
/// `<millis>-<random>` format) still deserialize.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(String);

impl RoundId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RoundId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RoundId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RoundId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}
