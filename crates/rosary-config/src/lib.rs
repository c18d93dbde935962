//! Configuration parsing and validation for the rosary flow
//!
//! Supports TOML configuration with:
//! - Versioned schema
//! - Flow pacing (load duration, dwell delay, expiry age, finale)
//! - Storage location and key
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported config version: {0}")]
    UnsupportedVersion(u32),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Current supported config version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

/// Load and validate configuration from a TOML file
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Load configuration, falling back to defaults when the file does not exist.
///
/// Any other failure (unreadable, malformed, invalid) is still an error.
pub fn load_config_or_default(path: impl AsRef<Path>) -> ConfigResult<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!(config_path = %path.display(), "No config file, using defaults");
        return Ok(Settings::default());
    }
    load_config(path)
}

/// Parse and validate configuration from a TOML string
pub fn parse_config(content: &str) -> ConfigResult<Settings> {
    let raw: RawConfig = toml::from_str(content)?;

    if raw.config_version != CURRENT_CONFIG_VERSION {
        return Err(ConfigError::UnsupportedVersion(raw.config_version));
    }

    let errors = validate_config(&raw);
    if !errors.is_empty() {
        return Err(ConfigError::ValidationFailed { errors });
    }

    Ok(Settings::from_raw(raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn parse_minimal_config() {
        let settings = parse_config("config_version = 1").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn parse_flow_overrides() {
        let config = r#"
            config_version = 1

            [flow]
            load_duration_ms = 5000
            dwell_ms = 2000
            session_max_age_minutes = 30
            finale_ms = 0

            [shell]
            dev_controls = false
        "#;

        let settings = parse_config(config).unwrap();
        assert_eq!(settings.flow.load_duration, Duration::from_millis(5000));
        assert_eq!(settings.flow.dwell, Duration::from_millis(2000));
        assert_eq!(settings.flow.session_max_age, Duration::from_secs(30 * 60));
        assert_eq!(settings.flow.finale, Duration::ZERO);
        assert_eq!(
            settings.flow.expiry_check_interval,
            Duration::from_millis(DEFAULT_EXPIRY_CHECK_INTERVAL_MS)
        );
        assert!(!settings.shell.dev_controls);
    }

    #[test]
    fn reject_wrong_version() {
        let result = parse_config("config_version = 99");
        assert!(matches!(result, Err(ConfigError::UnsupportedVersion(99))));
    }

    #[test]
    fn reject_invalid_values() {
        let config = r#"
            config_version = 1

            [flow]
            load_duration_ms = 0
            session_max_age_minutes = 0
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn oversized_max_age_is_a_validation_error() {
        let config = r#"
            config_version = 1

            [flow]
            session_max_age_minutes = 9223372036854775807
        "#;

        match parse_config(config) {
            Err(ConfigError::ValidationFailed { errors }) => assert!(matches!(
                errors.as_slice(),
                [ValidationError::MaxAgeTooLong { .. }]
            )),
            other => panic!("expected validation failure, got {:?}", other),
        }
    }

    #[test]
    fn missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = load_config_or_default(dir.path().join("absent.toml")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "config_version = 1\n[flow]\ndwell_ms = 900\n").unwrap();

        let settings = load_config_or_default(&path).unwrap();
        assert_eq!(settings.flow.dwell, Duration::from_millis(900));
    }
}
