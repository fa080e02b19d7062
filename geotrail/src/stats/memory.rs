//! In-memory statistics sink.

use parking_lot::Mutex;

use super::{StatisticsSink, StatsError, TrackingStats};

/// Statistics held in process memory.
///
/// Nothing survives a restart; seed it with [`with_stats`](Self::with_stats)
/// to emulate a resumed session.
#[derive(Debug, Default)]
pub struct MemoryStatsSink {
    stats: Mutex<TrackingStats>,
}

impl MemoryStatsSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a sink pre-loaded with counters.
    pub fn with_stats(stats: TrackingStats) -> Self {
        Self {
            stats: Mutex::new(stats),
        }
    }

    /// Current counters.
    pub fn snapshot(&self) -> TrackingStats {
        self.stats.lock().clone()
    }
}

impl StatisticsSink for MemoryStatsSink {
    fn load(&self) -> Result<TrackingStats, StatsError> {
        Ok(self.snapshot())
    }

    fn record_check(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError> {
        self.stats.lock().apply_check(timestamp_ms, count);
        Ok(())
    }

    fn record_update(
        &self,
        timestamp_ms: i64,
        count: u64,
        distance_delta_m: f64,
        total_distance_m: f64,
    ) -> Result<(), StatsError> {
        self.stats
            .lock()
            .apply_update(timestamp_ms, count, distance_delta_m, total_distance_m);
        Ok(())
    }

    fn record_error(&self, timestamp_ms: i64, count: u64) -> Result<(), StatsError> {
        self.stats.lock().apply_error(timestamp_ms, count);
        Ok(())
    }

    fn reset(&self) -> Result<(), StatsError> {
        *self.stats.lock() = TrackingStats::default();
        Ok(())
    }
}
