//! Tracking statistics.
//!
//! The upload controller keeps four counters (checks, updates, errors, total
//! distance) and mirrors every change into a [`StatisticsSink`]. Sinks are
//! expected to persist durably: a session restarted after a crash seeds its
//! counters from [`StatisticsSink::load`] and carries on counting.
//!
//! Sinks only record. Pushing changes to a UI is left to whoever reads them.
//!
//! # Implementations
//!
//! - [`MemoryStatsSink`]: process-local, for tests and simulations
//! - [`FileStatsSink`]: JSON document on disk, written atomically

mod file;
mod memory;

pub use file::FileStatsSink;
pub use memory::MemoryStatsSink;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from statistics persistence.
#[derive(Debug, Error)]
pub enum StatsError {
    /// Reading or writing the statistics file failed.
    #[error("statistics I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The statistics file exists but isn't valid.
    #[error("statistics file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Serializing the statistics failed.
    #[error("failed to serialize statistics: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Point-in-time copy of all tracking counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingStats {
    /// Samples examined.
    pub checks: u64,
    /// Fix time of the most recent check (epoch ms).
    pub last_check_ms: Option<i64>,
    /// Samples that moved far enough to trigger an upload.
    pub updates: u64,
    /// Fix time of the most recent update (epoch ms).
    pub last_update_ms: Option<i64>,
    /// Distance covered by the most recent update, in metres.
    pub last_distance_m: f64,
    /// Cumulative distance over all updates, in metres.
    pub total_distance_m: f64,
    /// Failed upload attempts.
    pub errors: u64,
    /// Time of the most recent failure (epoch ms).
    pub last_error_ms: Option<i64>,
}

impl TrackingStats {
    pub(crate) fn apply_check(&mut self, timestamp_ms: i64, count: u64) {
        self.checks = count;
        self.last_check_ms = Some(timestamp_ms);
    }

    pub(crate) fn apply_update(
        &mut self,
        timestamp_ms: i64,
        count: u64,
        distance_delta_m: f64,
        total_distance_m: f64,
    ) {
        self.updates = count;
        self.last_update_ms = Some(timestamp_ms);
        self.last_distance_m = distance_delta_m;
        self.total_distance_m = total_distance_m;
    }

    pub(crate) fn apply_error(&mut self, timestamp_ms: i64, count: u64) {
        self.errors = count;
        self.last_error_ms = Some(timestamp_ms);
    }

    /// Fraction of checks that led to an update attempt (0.0 when idle).
    pub fn update_ratio(&self) -> f64 {
        if self.checks == 0 {
            0.0
        } else {
            self.updates as f64 / self.checks as f64
        }
    }
}

/// Durable destination for tracking counters.
///
/// Each `record_*` call carries the new absolute count (not a delta), so a
/// sink that missed a write converges on the next one.
pub trait StatisticsSink: Send + Sync {
    /// Counters persisted by a previous session, or zeros.
    fn load(&self) -> Result<TrackingStats, StatsError>;

    /// A sample was examined.
    fn record_check(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError>;

    /// A sample moved far enough to be uploaded.
    fn record_update(
        &self,
        timestamp_ms: i64,
        count: u64,
        distance_delta_m: f64,
        total_distance_m: f64,
    ) -> Result<(), StatsError>;

    /// An upload attempt failed.
    fn record_error(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError>;

    /// Clear all counters.
    fn reset(&self) -> Result<(), StatsError>;
}
