//! Default paths for the rosary shell
//!
//! Paths are user-writable by default:
//! - Config: `$XDG_CONFIG_HOME/rosary/config.toml` or `~/.config/rosary/config.toml`
//! - Data: `$XDG_DATA_HOME/rosary` or `~/.local/share/rosary`

use std::path::PathBuf;

/// Environment variable for overriding the data directory
pub const ROSARY_DATA_DIR_ENV: &str = "ROSARY_DATA_DIR";

/// Application subdirectory name
const APP_DIR: &str = "rosary";

/// Config filename within the config directory
const CONFIG_FILENAME: &str = "config.toml";

/// Database filename within the data directory
pub const DATABASE_FILENAME: &str = "rosary.db";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/rosary/config.toml`
/// 2. `~/.config/rosary/config.toml`
/// 3. `/tmp/rosary/config.toml` (last resort)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home).join(APP_DIR).join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/tmp").join(APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$ROSARY_DATA_DIR`
/// 2. `$XDG_DATA_HOME/rosary`
/// 3. `~/.local/share/rosary`
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(ROSARY_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking `ROSARY_DATA_DIR`.
/// Used where the env var is resolved separately (e.g. by clap).
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_path_ends_with_config_toml() {
        let path = default_config_path();
        assert!(path.ends_with("rosary/config.toml"));
    }

    #[test]
    fn data_dir_contains_rosary() {
        let path = data_dir_without_env();
        assert!(path.to_string_lossy().contains("rosary"));
    }
}
