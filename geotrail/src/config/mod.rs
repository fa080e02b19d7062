//! Configuration for tracking sessions.
//!
//! Two layers:
//!
//! - [`TrackingConfig`]: the immutable value the upload controller is built
//!   with. A session reads it but never changes it; a new session may use a
//!   different one.
//! - [`ConfigFile`]: the on-disk INI file (`~/.config/geotrail/config.ini`)
//!   the CLI loads, with [`ConfigKey`] for `config get|set` access.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use geotrail::config::TrackingConfig;
//!
//! let config = TrackingConfig::default()
//!     .with_intervals(Duration::from_secs(30), Duration::from_secs(300))
//!     .with_distance_threshold_m(10.0);
//! assert!(config.validate().is_ok());
//! ```

mod error;
mod file;
mod keys;
mod tracking;

pub use error::ConfigError;
pub use file::{
    config_directory, config_file_path, default_stats_path, ConfigFile, LoggingSettings,
    RemoteSettings, StorageSettings,
};
pub use keys::ConfigKey;
pub use tracking::{
    TrackingConfig, DEFAULT_DISTANCE_THRESHOLD_M, DEFAULT_IDLE_INCREMENT_SECS,
    DEFAULT_LOCATION_VALIDITY_SECS, DEFAULT_MAX_INTERVAL_SECS, DEFAULT_MAX_OFFLINE_SAMPLES,
    DEFAULT_MAX_OFFLINE_SYNC_SECS, DEFAULT_MIN_INTERVAL_SECS, DEFAULT_MULTI_UPLOAD_CHUNK_SIZE,
    DEFAULT_RETRY_INTERVAL_SECS,
};
