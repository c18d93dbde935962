//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Pacing of the prayer flow
    #[serde(default)]
    pub flow: RawFlowConfig,

    /// Where progress is persisted
    #[serde(default)]
    pub storage: RawStorageConfig,

    /// Terminal shell options
    #[serde(default)]
    pub shell: RawShellConfig,
}

/// Flow pacing. Every field falls back to a built-in default.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawFlowConfig {
    /// Auto-advance delay of load nodes
    pub load_duration_ms: Option<u64>,

    /// Wait after the final stanza/pair before advancing is allowed
    pub dwell_ms: Option<u64>,

    /// Rounds older than this are discarded
    pub session_max_age_minutes: Option<u64>,

    /// Period of the expiry watcher
    pub expiry_check_interval_ms: Option<u64>,

    /// How long the finale screen shows; 0 disables it
    pub finale_ms: Option<u64>,
}

/// Storage settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawStorageConfig {
    /// Directory holding the database
    pub data_dir: Option<PathBuf>,

    /// Key under which the session blob is stored
    pub session_key: Option<String>,
}

/// Shell settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawShellConfig {
    /// Enable skip and back-to-start commands
    pub dev_controls: Option<bool>,
}
