//! Validated settings

use crate::schema::{RawConfig, RawFlowConfig, RawShellConfig, RawStorageConfig};
use rosary_util::{EpochMs, default_data_dir, duration_to_ms};
use std::path::PathBuf;
use std::time::Duration;

/// Load node auto-advance delay (half of it is one breathing pulse)
pub const DEFAULT_LOAD_DURATION_MS: u64 = 7140;

/// Dwell after the final stanza or pair before advancing unlocks
pub const DEFAULT_DWELL_MS: u64 = 1500;

/// Rounds older than two hours are discarded
pub const DEFAULT_SESSION_MAX_AGE_MINUTES: u64 = 120;

pub const DEFAULT_EXPIRY_CHECK_INTERVAL_MS: u64 = 1000;

pub const DEFAULT_FINALE_MS: u64 = 3000;

/// Storage key of the session blob
pub const DEFAULT_SESSION_KEY: &str = "anglican_rosary_session_v1";

/// Validated settings ready for use by the engine and shell
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Settings {
    pub flow: FlowTiming,
    pub storage: StorageConfig,
    pub shell: ShellConfig,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            flow: FlowTiming::from_raw(raw.flow),
            storage: StorageConfig::from_raw(raw.storage),
            shell: ShellConfig::from_raw(raw.shell),
        }
    }
}

/// Pacing constants of the flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowTiming {
    pub load_duration: Duration,
    pub dwell: Duration,
    pub session_max_age: Duration,
    pub expiry_check_interval: Duration,
    /// Zero means the finale screen is skipped
    pub finale: Duration,
}

impl FlowTiming {
    fn from_raw(raw: RawFlowConfig) -> Self {
        let defaults = Self::default();
        Self {
            load_duration: raw
                .load_duration_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.load_duration),
            dwell: raw
                .dwell_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.dwell),
            session_max_age: raw
                .session_max_age_minutes
                .map(|m| Duration::from_secs(m.saturating_mul(60)))
                .unwrap_or(defaults.session_max_age),
            expiry_check_interval: raw
                .expiry_check_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.expiry_check_interval),
            finale: raw
                .finale_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.finale),
        }
    }

    pub fn load_duration_ms(&self) -> u64 {
        self.load_duration.as_millis() as u64
    }

    pub fn dwell_ms(&self) -> EpochMs {
        duration_to_ms(self.dwell)
    }

    pub fn max_age_ms(&self) -> EpochMs {
        duration_to_ms(self.session_max_age)
    }

    pub fn expiry_check_ms(&self) -> EpochMs {
        duration_to_ms(self.expiry_check_interval)
    }

    pub fn finale_ms(&self) -> EpochMs {
        duration_to_ms(self.finale)
    }
}

impl Default for FlowTiming {
    fn default() -> Self {
        Self {
            load_duration: Duration::from_millis(DEFAULT_LOAD_DURATION_MS),
            dwell: Duration::from_millis(DEFAULT_DWELL_MS),
            session_max_age: Duration::from_secs(DEFAULT_SESSION_MAX_AGE_MINUTES * 60),
            expiry_check_interval: Duration::from_millis(DEFAULT_EXPIRY_CHECK_INTERVAL_MS),
            finale: Duration::from_millis(DEFAULT_FINALE_MS),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub session_key: String,
}

impl StorageConfig {
    fn from_raw(raw: RawStorageConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
            session_key: raw
                .session_key
                .unwrap_or_else(|| DEFAULT_SESSION_KEY.to_string()),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

/// Shell configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShellConfig {
    pub dev_controls: bool,
}

impl ShellConfig {
    fn from_raw(raw: RawShellConfig) -> Self {
        Self {
            dev_controls: raw.dev_controls.unwrap_or(true),
        }
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self { dev_controls: true }
    }
}
