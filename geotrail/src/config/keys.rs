//! Typed `section.key` access to [`ConfigFile`] values.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use super::{ConfigError, ConfigFile};

/// A configuration setting addressable as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    TrackingMinIntervalSecs,
    TrackingMaxIntervalSecs,
    TrackingIdleIncrementSecs,
    TrackingLocationValiditySecs,
    TrackingDistanceThresholdM,
    TrackingRetryIntervalSecs,
    TrackingMaxOfflineSamples,
    TrackingMaxOfflineSyncSecs,
    TrackingMultiUploadChunkSize,
    RemoteEndpoint,
    RemoteToken,
    RemoteTimeoutSecs,
    StorageStatsFile,
    LoggingDirectory,
    LoggingLevel,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            TrackingMinIntervalSecs,
            TrackingMaxIntervalSecs,
            TrackingIdleIncrementSecs,
            TrackingLocationValiditySecs,
            TrackingDistanceThresholdM,
            TrackingRetryIntervalSecs,
            TrackingMaxOfflineSamples,
            TrackingMaxOfflineSyncSecs,
            TrackingMultiUploadChunkSize,
            RemoteEndpoint,
            RemoteToken,
            RemoteTimeoutSecs,
            StorageStatsFile,
            LoggingDirectory,
            LoggingLevel,
        ]
    }

    /// INI section name.
    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            TrackingMinIntervalSecs
            | TrackingMaxIntervalSecs
            | TrackingIdleIncrementSecs
            | TrackingLocationValiditySecs
            | TrackingDistanceThresholdM
            | TrackingRetryIntervalSecs
            | TrackingMaxOfflineSamples
            | TrackingMaxOfflineSyncSecs
            | TrackingMultiUploadChunkSize => "tracking",
            RemoteEndpoint | RemoteToken | RemoteTimeoutSecs => "remote",
            StorageStatsFile => "storage",
            LoggingDirectory | LoggingLevel => "logging",
        }
    }

    /// INI key name within the section.
    pub fn key(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            TrackingMinIntervalSecs => "min_interval_secs",
            TrackingMaxIntervalSecs => "max_interval_secs",
            TrackingIdleIncrementSecs => "idle_increment_secs",
            TrackingLocationValiditySecs => "location_validity_secs",
            TrackingDistanceThresholdM => "distance_threshold_m",
            TrackingRetryIntervalSecs => "retry_interval_secs",
            TrackingMaxOfflineSamples => "max_offline_samples",
            TrackingMaxOfflineSyncSecs => "max_offline_sync_secs",
            TrackingMultiUploadChunkSize => "multi_upload_chunk_size",
            RemoteEndpoint => "endpoint",
            RemoteToken => "token",
            RemoteTimeoutSecs => "timeout_secs",
            StorageStatsFile => "stats_file",
            LoggingDirectory => "directory",
            LoggingLevel => "level",
        }
    }

    /// Full `section.key` name.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key())
    }

    /// Whether the value should be masked when displayed.
    pub fn is_secret(&self) -> bool {
        matches!(self, ConfigKey::RemoteToken)
    }

    /// Current value as a string; empty when unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        let t = &config.tracking;
        match self {
            TrackingMinIntervalSecs => t.min_interval.as_secs().to_string(),
            TrackingMaxIntervalSecs => t.max_interval.as_secs().to_string(),
            TrackingIdleIncrementSecs => t.idle_increment.as_secs().to_string(),
            TrackingLocationValiditySecs => t.location_validity.as_secs().to_string(),
            TrackingDistanceThresholdM => t.distance_threshold_m.to_string(),
            TrackingRetryIntervalSecs => t.retry_interval.as_secs().to_string(),
            TrackingMaxOfflineSamples => t.max_offline_samples.to_string(),
            TrackingMaxOfflineSyncSecs => t.max_offline_sync_time.as_secs().to_string(),
            TrackingMultiUploadChunkSize => t.multi_upload_chunk_size.to_string(),
            RemoteEndpoint => config.remote.endpoint.clone().unwrap_or_default(),
            RemoteToken => config.remote.token.clone().unwrap_or_default(),
            RemoteTimeoutSecs => config.remote.timeout_secs.to_string(),
            StorageStatsFile => config.storage.stats_file.display().to_string(),
            LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Parse `value` and store it. An empty value clears optional settings.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        let t = &mut config.tracking;
        match self {
            TrackingMinIntervalSecs => t.min_interval = self.parse_secs(value)?,
            TrackingMaxIntervalSecs => t.max_interval = self.parse_secs(value)?,
            TrackingIdleIncrementSecs => t.idle_increment = self.parse_secs(value)?,
            TrackingLocationValiditySecs => t.location_validity = self.parse_secs(value)?,
            TrackingDistanceThresholdM => t.distance_threshold_m = self.parse(value)?,
            TrackingRetryIntervalSecs => t.retry_interval = self.parse_secs(value)?,
            TrackingMaxOfflineSamples => t.max_offline_samples = self.parse(value)?,
            TrackingMaxOfflineSyncSecs => t.max_offline_sync_time = self.parse_secs(value)?,
            TrackingMultiUploadChunkSize => t.multi_upload_chunk_size = self.parse(value)?,
            RemoteEndpoint => config.remote.endpoint = non_empty(value),
            RemoteToken => config.remote.token = non_empty(value),
            RemoteTimeoutSecs => config.remote.timeout_secs = self.parse(value)?,
            StorageStatsFile => {
                if value.is_empty() {
                    return Err(self.invalid(value, "path must not be empty"));
                }
                config.storage.stats_file = PathBuf::from(value);
            }
            LoggingDirectory => config.logging.directory = non_empty(value).map(PathBuf::from),
            LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "level must not be empty"));
                }
                config.logging.level = value.to_string();
            }
        }
        Ok(())
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value
            .parse::<T>()
            .map_err(|e| self.invalid(value, &e.to_string()))
    }

    fn parse_secs(&self, value: &str) -> Result<Duration, ConfigError> {
        self.parse::<u64>(value).map(Duration::from_secs)
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.section(), self.key())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
