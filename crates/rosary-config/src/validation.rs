//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

/// Longest accepted expiry watcher period
pub const MAX_EXPIRY_CHECK_INTERVAL_MS: u64 = 60_000;

/// Longest accepted round lifetime (one week)
pub const MAX_SESSION_AGE_MINUTES: u64 = 7 * 24 * 60;

/// Validation error
#[derive(Debug, Clone, Error)]
pub enum ValidationError {
    #[error("flow.{field} must be greater than zero")]
    ZeroDuration { field: &'static str },

    #[error("flow.expiry_check_interval_ms {value} exceeds {max}")]
    IntervalTooLong { value: u64, max: u64 },

    #[error("flow.session_max_age_minutes {value} exceeds {max}")]
    MaxAgeTooLong { value: u64, max: u64 },

    #[error("storage.session_key cannot be empty")]
    EmptySessionKey,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let flow = &config.flow;

    let positive = [
        ("load_duration_ms", flow.load_duration_ms),
        ("dwell_ms", flow.dwell_ms),
        ("session_max_age_minutes", flow.session_max_age_minutes),
        ("expiry_check_interval_ms", flow.expiry_check_interval_ms),
    ];
    for (field, value) in positive {
        if value == Some(0) {
            errors.push(ValidationError::ZeroDuration { field });
        }
    }

    if let Some(value) = flow.expiry_check_interval_ms
        && value > MAX_EXPIRY_CHECK_INTERVAL_MS
    {
        errors.push(ValidationError::IntervalTooLong {
            value,
            max: MAX_EXPIRY_CHECK_INTERVAL_MS,
        });
    }

    if let Some(value) = flow.session_max_age_minutes
        && value > MAX_SESSION_AGE_MINUTES
    {
        errors.push(ValidationError::MaxAgeTooLong {
            value,
            max: MAX_SESSION_AGE_MINUTES,
        });
    }

    if let Some(key) = &config.storage.session_key
        && key.trim().is_empty()
    {
        errors.push(ValidationError::EmptySessionKey);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{RawFlowConfig, RawStorageConfig};

    fn raw(flow: RawFlowConfig) -> RawConfig {
        RawConfig {
            config_version: 1,
            flow,
            storage: Default::default(),
            shell: Default::default(),
        }
    }

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&raw(RawFlowConfig::default())).is_empty());
    }

    #[test]
    fn zero_finale_is_allowed() {
        let config = raw(RawFlowConfig {
            finale_ms: Some(0),
            ..Default::default()
        });
        assert!(validate_config(&config).is_empty());
    }

    #[test]
    fn zero_dwell_rejected() {
        let config = raw(RawFlowConfig {
            dwell_ms: Some(0),
            ..Default::default()
        });
        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::ZeroDuration { field: "dwell_ms" }]
        ));
    }

    #[test]
    fn long_interval_rejected() {
        let config = raw(RawFlowConfig {
            expiry_check_interval_ms: Some(120_000),
            ..Default::default()
        });
        let errors = validate_config(&config);
        assert!(errors
            .iter()
            .any(|e| matches!(e, ValidationError::IntervalTooLong { value: 120_000, .. })));
    }

    #[test]
    fn huge_max_age_rejected() {
        let config = raw(RawFlowConfig {
            session_max_age_minutes: Some(u64::MAX / 2),
            ..Default::default()
        });
        let errors = validate_config(&config);
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::MaxAgeTooLong { .. }]
        ));

        let week = raw(RawFlowConfig {
            session_max_age_minutes: Some(MAX_SESSION_AGE_MINUTES),
            ..Default::default()
        });
        assert!(validate_config(&week).is_empty());
    }

    #[test]
    fn blank_session_key_rejected() {
        let mut config = raw(RawFlowConfig::default());
        config.storage = RawStorageConfig {
            data_dir: None,
            session_key: Some("  ".into()),
        };
        let errors = validate_config(&config);
        assert!(matches!(errors.as_slice(), [ValidationError::EmptySessionKey]));
    }
}
