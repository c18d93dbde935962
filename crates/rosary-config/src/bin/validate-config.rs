//! Config validation CLI tool
//!
//! Validates a rosary configuration file and reports any errors.

use rosary_util::default_config_path;
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();

    let config_path = match args.get(1) {
        Some(path) => PathBuf::from(path),
        None => {
            let default_path = default_config_path();
            eprintln!("Usage: validate-config [config-file]");
            eprintln!();
            eprintln!("Validates a rosary configuration file.");
            eprintln!();
            eprintln!("If no path is provided, uses: {}", default_path.display());
            return ExitCode::from(2);
        }
    };

    if !config_path.exists() {
        eprintln!("Error: Configuration file not found: {}", config_path.display());
        return ExitCode::from(1);
    }

    match rosary_config::load_config(&config_path) {
        Ok(settings) => {
            let flow = &settings.flow;
            println!("✓ Configuration is valid");
            println!();
            println!("Summary:");
            println!("  Config version: {}", rosary_config::CURRENT_CONFIG_VERSION);
            println!("  Load duration: {} ms", flow.load_duration_ms());
            println!("  Dwell delay: {} ms", flow.dwell_ms());
            println!("  Session max age: {} min", flow.session_max_age.as_secs() / 60);
            println!("  Expiry check: every {} ms", flow.expiry_check_ms());
            if flow.finale.is_zero() {
                println!("  Finale: disabled");
            } else {
                println!("  Finale: {} ms", flow.finale_ms());
            }
            println!("  Data dir: {}", settings.storage.data_dir.display());
            println!("  Session key: {}", settings.storage.session_key);
            println!("  Dev controls: {}", settings.shell.dev_controls);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("✗ Configuration validation failed");
            eprintln!();
            match &e {
                rosary_config::ConfigError::ReadError(io_err) => {
                    eprintln!("Failed to read file: {}", io_err);
                }
                rosary_config::ConfigError::ParseError(parse_err) => {
                    eprintln!("TOML parse error:");
                    eprintln!("  {}", parse_err);
                }
                rosary_config::ConfigError::ValidationFailed { errors } => {
                    eprintln!("Validation errors ({}):", errors.len());
                    for err in errors {
                        eprintln!("  - {}", err);
                    }
                }
                rosary_config::ConfigError::UnsupportedVersion(ver) => {
                    eprintln!(
                        "Unsupported config version: {} (expected {})",
                        ver,
                        rosary_config::CURRENT_CONFIG_VERSION
                    );
                }
            }
            ExitCode::from(1)
        }
    }
}
