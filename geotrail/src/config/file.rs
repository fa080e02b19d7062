//! INI configuration file.
//!
//! ```ini
//! [tracking]
//! min_interval_secs = 60
//! max_interval_secs = 900
//! distance_threshold_m = 25
//!
//! [remote]
//! endpoint = https://tracker.example.org/api
//! timeout_secs = 20
//!
//! [storage]
//! stats_file = /home/me/.local/share/geotrail/stats.json
//!
//! [logging]
//! level = info
//! ```
//!
//! Every key is optional; absent keys keep their defaults. Reading and
//! writing goes through [`ConfigKey`] so the file format and the CLI
//! `config get|set` commands can't drift apart.

use std::fs;
use std::path::{Path, PathBuf};

use ini::Ini;

use super::{ConfigError, ConfigKey, TrackingConfig};

/// Directory name under the platform config/data directories.
const APP_DIR: &str = "geotrail";

/// Config file name inside [`config_directory`].
const CONFIG_FILE_NAME: &str = "config.ini";

/// Statistics file name inside the data directory.
const STATS_FILE_NAME: &str = "stats.json";

/// Default request timeout for the remote store (20 seconds).
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 20;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Remote store connection settings.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSettings {
    /// Base URL of the location endpoint.
    pub endpoint: Option<String>,
    /// Bearer token sent with every request.
    pub token: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: None,
            token: None,
            timeout_secs: DEFAULT_REMOTE_TIMEOUT_SECS,
        }
    }
}

/// Local persistence settings.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// Where the statistics counters are persisted.
    pub stats_file: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            stats_file: default_stats_path(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for daily-rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: None,
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// The complete contents of `config.ini`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub tracking: TrackingConfig,
    pub remote: RemoteSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location, or defaults if the file doesn't exist.
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_file_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            let value = ini
                .section(Some(key.section()))
                .and_then(|props| props.get(key.key()));
            if let Some(value) = value {
                key.set(&mut config, value)?;
            }
        }

        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path()?)
    }

    /// Save to an explicit path, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section())).set(key.key(), value);
            }
        }

        ini.write_to_file(path).map_err(write_err)
    }

    /// The tracking configuration, validated.
    pub fn tracking_config(&self) -> Result<TrackingConfig, ConfigError> {
        self.tracking.validate()?;
        Ok(self.tracking.clone())
    }
}

/// `~/.config/geotrail` (or the platform equivalent).
pub fn config_directory() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDirectory)
}

/// Full path of `config.ini`.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Default statistics file, under the local data directory.
///
/// Falls back to the working directory on platforms without one.
pub fn default_stats_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
        .join(STATS_FILE_NAME)
}
