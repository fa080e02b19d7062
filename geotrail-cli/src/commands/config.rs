//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, and `config path`
//! for viewing and modifying settings from the command line.

use std::path::Path;

use clap::Subcommand;
use geotrail::config::ConfigKey;

use super::common::load_config;
use crate::error::CliError;

/// Placeholder shown instead of secret values in listings.
const MASKED: &str = "********";

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., tracking.min_interval_secs)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., remote.endpoint)
        key: String,

        /// Value to set (empty clears optional settings)
        value: String,
    },

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against the file at `path`.
pub fn run(command: ConfigCommands, path: &Path) -> Result<(), CliError> {
    match command {
        ConfigCommands::Get { key } => run_get(&key, path),
        ConfigCommands::Set { key, value } => run_set(&key, &value, path),
        ConfigCommands::List => run_list(path),
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'geotrail config list' to see available keys.",
            key
        ))
    })
}

fn run_get(key: &str, path: &Path) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = load_config(path)?;
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }
    Ok(())
}

fn run_set(key: &str, value: &str, path: &Path) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let mut config = load_config(path)?;
    config_key.set(&mut config, value)?;

    // Reject combinations the tracker would refuse to start with
    config.tracking_config()?;
    config.save_to(path)?;

    let shown = if config_key.is_secret() { MASKED } else { value };
    println!("Set {} = {}", config_key.name(), shown);
    Ok(())
}

fn run_list(path: &Path) -> Result<(), CliError> {
    let config = load_config(path)?;

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";
    for key in ConfigKey::all() {
        let section = key.section();
        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key());
        } else if key.is_secret() {
            println!("  {} = {}", key.key(), MASKED);
        } else {
            println!("  {} = {}", key.key(), value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotrail::config::ConfigFile;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_set_persists_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        run(
            ConfigCommands::Set {
                key: "tracking.min_interval_secs".to_string(),
                value: "45".to_string(),
            },
            &path,
        )
        .unwrap();

        let config = ConfigFile::load_from(&path).unwrap();
        assert_eq!(config.tracking.min_interval, Duration::from_secs(45));
    }

    #[test]
    fn test_set_rejects_inconsistent_intervals() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.ini");

        let result = run(
            ConfigCommands::Set {
                key: "tracking.max_interval_secs".to_string(),
                value: "1".to_string(),
            },
            &path,
        );
        assert!(matches!(result, Err(CliError::Config(_))));
        assert!(!path.exists());
    }

    #[test]
    fn test_unknown_key() {
        let dir = TempDir::new().unwrap();
        let result = run(
            ConfigCommands::Get {
                key: "tracking.nope".to_string(),
            },
            &dir.path().join("config.ini"),
        );
        assert!(matches!(result, Err(CliError::Config(msg)) if msg.contains("tracking.nope")));
    }
}
