//! Tracking session configuration.

use std::time::Duration;

use super::ConfigError;

// =============================================================================
// Defaults
// =============================================================================

/// Default shortest polling interval (1 minute).
pub const DEFAULT_MIN_INTERVAL_SECS: u64 = 60;

/// Default longest polling interval (15 minutes).
pub const DEFAULT_MAX_INTERVAL_SECS: u64 = 900;

/// Default growth of the interval per idle tick (1 minute).
pub const DEFAULT_IDLE_INCREMENT_SECS: u64 = 60;

/// Default age after which remote entries are considered stale (24 hours).
pub const DEFAULT_LOCATION_VALIDITY_SECS: u64 = 24 * 60 * 60;

/// Default movement threshold in metres.
pub const DEFAULT_DISTANCE_THRESHOLD_M: f64 = 25.0;

/// Default first retry delay after an upload failure (30 seconds).
pub const DEFAULT_RETRY_INTERVAL_SECS: u64 = 30;

/// Default offline buffer capacity in samples.
pub const DEFAULT_MAX_OFFLINE_SAMPLES: usize = 1000;

/// Default wall-clock budget for one drain of the offline buffer (30 seconds).
pub const DEFAULT_MAX_OFFLINE_SYNC_SECS: u64 = 30;

/// Default number of samples per batch upload.
pub const DEFAULT_MULTI_UPLOAD_CHUNK_SIZE: usize = 50;

/// Configuration for one tracking session.
///
/// Passed to the upload controller at construction and read-only afterwards.
/// Call [`validate`](Self::validate) before use; the controller relies on
/// `min_interval <= max_interval` and non-zero sizes.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingConfig {
    /// Shortest delay between samples, used after every successful upload.
    pub min_interval: Duration,
    /// Longest delay between samples; caps both idle growth and back-off.
    pub max_interval: Duration,
    /// Added to the interval on each tick without significant movement.
    pub idle_increment: Duration,
    /// Remote entries older than the sample time minus this are removed.
    pub location_validity: Duration,
    /// Movement below this many metres counts as staying put.
    pub distance_threshold_m: f64,
    /// First retry delay after an upload failure; doubles on each further failure.
    pub retry_interval: Duration,
    /// Maximum number of samples held while the remote store is unreachable.
    pub max_offline_samples: usize,
    /// Wall-clock budget for draining the offline buffer in one tick.
    pub max_offline_sync_time: Duration,
    /// Maximum samples per batch upload.
    pub multi_upload_chunk_size: usize,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            min_interval: Duration::from_secs(DEFAULT_MIN_INTERVAL_SECS),
            max_interval: Duration::from_secs(DEFAULT_MAX_INTERVAL_SECS),
            idle_increment: Duration::from_secs(DEFAULT_IDLE_INCREMENT_SECS),
            location_validity: Duration::from_secs(DEFAULT_LOCATION_VALIDITY_SECS),
            distance_threshold_m: DEFAULT_DISTANCE_THRESHOLD_M,
            retry_interval: Duration::from_secs(DEFAULT_RETRY_INTERVAL_SECS),
            max_offline_samples: DEFAULT_MAX_OFFLINE_SAMPLES,
            max_offline_sync_time: Duration::from_secs(DEFAULT_MAX_OFFLINE_SYNC_SECS),
            multi_upload_chunk_size: DEFAULT_MULTI_UPLOAD_CHUNK_SIZE,
        }
    }
}

impl TrackingConfig {
    /// Set the polling interval bounds.
    pub fn with_intervals(mut self, min: Duration, max: Duration) -> Self {
        self.min_interval = min;
        self.max_interval = max;
        self
    }

    /// Set the idle increment.
    pub fn with_idle_increment(mut self, increment: Duration) -> Self {
        self.idle_increment = increment;
        self
    }

    /// Set the remote entry validity window.
    pub fn with_location_validity(mut self, validity: Duration) -> Self {
        self.location_validity = validity;
        self
    }

    /// Set the movement threshold in metres.
    pub fn with_distance_threshold_m(mut self, metres: f64) -> Self {
        self.distance_threshold_m = metres;
        self
    }

    /// Set the base retry interval.
    pub fn with_retry_interval(mut self, retry: Duration) -> Self {
        self.retry_interval = retry;
        self
    }

    /// Set the offline buffer capacity.
    pub fn with_max_offline_samples(mut self, capacity: usize) -> Self {
        self.max_offline_samples = capacity;
        self
    }

    /// Set the drain time budget.
    pub fn with_max_offline_sync_time(mut self, budget: Duration) -> Self {
        self.max_offline_sync_time = budget;
        self
    }

    /// Set the batch upload chunk size.
    pub fn with_multi_upload_chunk_size(mut self, size: usize) -> Self {
        self.multi_upload_chunk_size = size;
        self
    }

    /// Check the constraints the upload controller depends on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "min_interval must be greater than zero".to_string(),
            ));
        }
        if self.min_interval > self.max_interval {
            return Err(ConfigError::Invalid(format!(
                "min_interval ({}s) exceeds max_interval ({}s)",
                self.min_interval.as_secs(),
                self.max_interval.as_secs()
            )));
        }
        if self.retry_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "retry_interval must be greater than zero".to_string(),
            ));
        }
        if !self.distance_threshold_m.is_finite() || self.distance_threshold_m < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "distance_threshold_m must be a non-negative number, got {}",
                self.distance_threshold_m
            )));
        }
        if self.max_offline_samples == 0 {
            return Err(ConfigError::Invalid(
                "max_offline_samples must be at least 1".to_string(),
            ));
        }
        if self.multi_upload_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "multi_upload_chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
