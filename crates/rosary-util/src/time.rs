//! Time utilities for the rosary flow
//!
//! The state machine works in wall-clock epoch milliseconds because every
//! timestamp it keeps must survive a reload: expiry is measured from
//! `startedAtEpochMs` as persisted, not from process start.
//!
//! # Mock Time for Development
//!
//! In debug builds, the `ROSARY_MOCK_TIME` environment variable can be set
//! to shift the wall clock. Useful for exercising expiry without waiting
//! two hours.
//!
//! Format: `YYYY-MM-DD HH:MM:SS` (e.g., `2025-12-25 14:30:00`)

use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use std::sync::OnceLock;
use std::time::Duration;

/// Milliseconds since the Unix epoch
pub type EpochMs = i64;

/// Environment variable name for mock time (debug builds only)
pub const MOCK_TIME_ENV_VAR: &str = "ROSARY_MOCK_TIME";

/// Format accepted by [`MOCK_TIME_ENV_VAR`]
pub const MOCK_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static MOCK_TIME_OFFSET: OnceLock<Option<chrono::Duration>> = OnceLock::new();

#[allow(clippy::disallowed_methods)] // wraps Local::now()
fn get_mock_time_offset() -> Option<chrono::Duration> {
    *MOCK_TIME_OFFSET.get_or_init(|| {
        #[cfg(debug_assertions)]
        {
            if let Ok(mock_time_str) = std::env::var(MOCK_TIME_ENV_VAR) {
                match parse_mock_time(&mock_time_str) {
                    Some(mock_dt) => {
                        let offset = mock_dt.signed_duration_since(chrono::Local::now());
                        tracing::info!(
                            mock_time = %mock_time_str,
                            offset_secs = offset.num_seconds(),
                            "Mock time enabled"
                        );
                        return Some(offset);
                    }
                    None => {
                        tracing::warn!(
                            mock_time = %mock_time_str,
                            expected_format = MOCK_TIME_FORMAT,
                            "Invalid mock time"
                        );
                    }
                }
            }
            None
        }
        #[cfg(not(debug_assertions))]
        {
            None
        }
    })
}

fn parse_mock_time(s: &str) -> Option<DateTime<Local>> {
    let naive = NaiveDateTime::parse_from_str(s, MOCK_TIME_FORMAT).ok()?;
    Local.from_local_datetime(&naive).single()
}

/// Returns whether mock time is currently active.
pub fn is_mock_time_active() -> bool {
    get_mock_time_offset().is_some()
}

/// Current local time, respecting mock time in debug builds.
#[allow(clippy::disallowed_methods)]
pub fn now() -> DateTime<Local> {
    let real_now = chrono::Local::now();

    match get_mock_time_offset() {
        Some(offset) => real_now + offset,
        None => real_now,
    }
}

/// Current time as epoch milliseconds
pub fn now_epoch_ms() -> EpochMs {
    now().timestamp_millis()
}

/// Convert epoch milliseconds to local time for display/logging
pub fn epoch_ms_to_local(ms: EpochMs) -> Option<DateTime<Local>> {
    Local.timestamp_millis_opt(ms).single()
}

/// Convert a duration to whole milliseconds, saturating at `i64::MAX`
pub fn duration_to_ms(d: Duration) -> EpochMs {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

/// Whole seconds shown by a countdown label, rounding up.
///
/// `countdown_seconds(7140)` is 8, so a label never reads "0s" while time
/// remains.
pub fn countdown_seconds(remaining_ms: EpochMs) -> u64 {
    if remaining_ms <= 0 {
        return 0;
    }
    (remaining_ms as u64).div_ceil(1000)
}

/// Fraction of `duration_ms` elapsed since `started_at`, clamped to 0..=1.
pub fn ramp_fraction(started_at: EpochMs, duration_ms: u64, now: EpochMs) -> f64 {
    if duration_ms == 0 {
        return 1.0;
    }
    let elapsed = (now - started_at).max(0) as f64;
    (elapsed / duration_ms as f64).clamp(0.0, 1.0)
}

/// Format a timestamp with full date and time
pub fn format_datetime_full(dt: &DateTime<Local>) -> String {
    dt.format("%Y-%m-%d %H:%M:%S").to_string()
}
