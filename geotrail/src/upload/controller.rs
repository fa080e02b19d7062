//! The adaptive upload controller.
//!
//! One call to [`UploadController::handle_upload`] per location sample. The
//! controller decides whether the wearer moved, uploads (directly or by
//! draining the offline buffer) when they did, and returns how long the
//! caller should wait before taking the next sample.
//!
//! # State Machine
//!
//! ```text
//!                 distance < threshold
//!   tick ─────────────────────────────────► Idle:   delay = interval
//!    │                                              interval += increment (≤ max)
//!    │ distance ≥ threshold
//!    ▼
//!   upload ──ok──► interval = min,   retry = base
//!    │
//!    └─fail──────► interval = retry, retry = 2 × retry (≤ max)
//! ```
//!
//! Distance rules:
//!
//! - no fresh fix (`original` is `None`): distance is the threshold, so a
//!   sensor failure uploads instead of being mistaken for standing still
//! - no previous location (first fix of the session): the fix becomes the
//!   baseline and distance is 0, so the first sample never uploads
//!
//! # Concurrency
//!
//! `handle_upload` takes `&mut self`: exactly one owner drives the
//! controller, one sample at a time, each call (including its network I/O)
//! finishing before the next begins. See [`crate::session`] for the task
//! that owns it in a running tracker.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::buffer::{Admission, BoundedOfflineBuffer};
use super::policy::{clamp_interval, double_capped, grow_idle_interval, is_significant_move};
use crate::clock::Clock;
use crate::config::{ConfigError, TrackingConfig};
use crate::location::{haversine_distance_m, LocationSample};
use crate::stats::{StatisticsSink, TrackingStats};
use crate::store::RemoteStore;

/// Mutable controller state.
///
/// Owned by the controller and changed only by its methods. The four
/// counters mirror what has been written to the statistics sink.
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    /// Position the next fix is compared against.
    pub last_location: Option<LocationSample>,
    /// Delay the controller is currently working with; always within
    /// `[min_interval, max_interval]`.
    pub current_interval: Duration,
    /// Delay to use after the next failure.
    pub retry_interval: Duration,
    /// Failed uploads since the last success.
    pub consecutive_failures: u32,
    /// Samples examined.
    pub checks: u64,
    /// Samples that triggered an upload attempt.
    pub updates: u64,
    /// Failed upload attempts.
    pub errors: u64,
    /// Cumulative distance over all updates, in metres.
    pub total_distance_m: f64,
}

/// How an upload attempt reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadPath {
    /// Single add; the offline buffer was empty.
    Direct,
    /// Batch drain of the offline buffer.
    Drain,
}

/// What the controller did with a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickDecision {
    /// First fix of the session, stored as the comparison baseline.
    Baseline,
    /// No significant movement; nothing uploaded.
    Idle,
    /// Movement detected and the upload succeeded.
    Uploaded(UploadPath),
    /// Movement detected and the upload failed.
    Failed(UploadPath),
}

impl fmt::Display for TickDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickDecision::Baseline => write!(f, "baseline"),
            TickDecision::Idle => write!(f, "idle"),
            TickDecision::Uploaded(UploadPath::Direct) => write!(f, "uploaded"),
            TickDecision::Uploaded(UploadPath::Drain) => write!(f, "uploaded (drain)"),
            TickDecision::Failed(UploadPath::Direct) => write!(f, "failed"),
            TickDecision::Failed(UploadPath::Drain) => write!(f, "failed (drain)"),
        }
    }
}

/// Summary of the most recent `handle_upload` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub decision: TickDecision,
    /// Distance used for the movement decision, in metres.
    pub distance_m: f64,
    /// Delay returned to the caller.
    pub delay: Duration,
    /// Samples left in the offline buffer afterwards.
    pub pending: usize,
}

/// Adaptive tracking and upload state machine.
pub struct UploadController {
    config: TrackingConfig,
    store: Arc<dyn RemoteStore>,
    clock: Arc<dyn Clock>,
    stats: Arc<dyn StatisticsSink>,
    buffer: BoundedOfflineBuffer,
    state: ControllerState,
    last_tick: Option<TickReport>,
}

impl fmt::Debug for UploadController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadController")
            .field("config", &self.config)
            .field("store", &self.store.name())
            .field("pending", &self.buffer.len())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl UploadController {
    /// Create a controller for one tracking session.
    ///
    /// Counters are seeded from the statistics sink so a restarted session
    /// continues where the previous one stopped. If the sink can't be read
    /// the counters start at zero.
    pub fn new(
        config: TrackingConfig,
        store: Arc<dyn RemoteStore>,
        clock: Arc<dyn Clock>,
        stats: Arc<dyn StatisticsSink>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let persisted = stats.load().unwrap_or_else(|e| {
            warn!(error = %e, "Failed to load persisted statistics, starting from zero");
            TrackingStats::default()
        });

        let state = ControllerState {
            last_location: None,
            current_interval: config.min_interval,
            retry_interval: config.retry_interval,
            consecutive_failures: 0,
            checks: persisted.checks,
            updates: persisted.updates,
            errors: persisted.errors,
            total_distance_m: persisted.total_distance_m,
        };

        Ok(Self {
            buffer: BoundedOfflineBuffer::new(config.max_offline_samples),
            config,
            store,
            clock,
            stats,
            state,
            last_tick: None,
        })
    }

    /// The session configuration.
    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }

    /// Current state.
    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    /// The offline buffer.
    pub fn buffer(&self) -> &BoundedOfflineBuffer {
        &self.buffer
    }

    /// Samples waiting in the offline buffer.
    pub fn pending_uploads(&self) -> usize {
        self.buffer.len()
    }

    /// What happened on the most recent call.
    pub fn last_tick(&self) -> Option<TickReport> {
        self.last_tick
    }

    /// Process one sample and return the delay before the next one.
    ///
    /// `sample` is what gets uploaded. `original` is the fresh fix used for
    /// movement detection; `None` means acquiring a fix failed and `sample`
    /// is a fallback (e.g. the last known position).
    ///
    /// Never fails: store errors become retry back-off, statistics errors are
    /// logged.
    pub async fn handle_upload(
        &mut self,
        sample: &LocationSample,
        original: Option<&LocationSample>,
    ) -> Duration {
        self.record_check(sample.timestamp_ms);

        let had_baseline = self.state.last_location.is_some();
        let distance_m = self.measure_movement(original);
        let threshold_m = self.config.distance_threshold_m;

        if !is_significant_move(distance_m, threshold_m) {
            let decision = if had_baseline {
                TickDecision::Idle
            } else {
                TickDecision::Baseline
            };
            return self.idle_transition(decision, distance_m);
        }

        if let Some(original) = original {
            self.state.last_location = Some(*original);
        }
        self.record_update(sample.timestamp_ms, distance_m);

        let (path, success) = self.persist(sample).await;
        let delay = self.active_transition(success);

        let decision = if success {
            TickDecision::Uploaded(path)
        } else {
            TickDecision::Failed(path)
        };
        self.finish_tick(decision, distance_m, delay)
    }

    /// Distance to use for the movement decision.
    fn measure_movement(&mut self, original: Option<&LocationSample>) -> f64 {
        let Some(original) = original else {
            debug!("No fresh fix, forcing upload");
            return self.config.distance_threshold_m;
        };

        match self.state.last_location {
            Some(last) => haversine_distance_m(&last, original),
            None => {
                self.state.last_location = Some(*original);
                0.0
            }
        }
    }

    fn idle_transition(&mut self, decision: TickDecision, distance_m: f64) -> Duration {
        let delay = self.state.current_interval;
        self.state.current_interval = grow_idle_interval(
            delay,
            self.config.idle_increment,
            self.config.max_interval,
        );
        self.finish_tick(decision, distance_m, delay)
    }

    fn active_transition(&mut self, success: bool) -> Duration {
        if success {
            if self.state.consecutive_failures > 0 {
                info!(
                    failures = self.state.consecutive_failures,
                    pending = self.buffer.len(),
                    "Upload recovered"
                );
            }
            self.state.consecutive_failures = 0;
            self.state.current_interval = self.config.min_interval;
            self.state.retry_interval = self.config.retry_interval;
        } else {
            self.record_error();
            self.state.consecutive_failures = self.state.consecutive_failures.saturating_add(1);
            self.state.current_interval = clamp_interval(
                self.state.retry_interval,
                self.config.min_interval,
                self.config.max_interval,
            );
            self.state.retry_interval =
                double_capped(self.state.retry_interval, self.config.max_interval);
        }
        self.state.current_interval
    }

    fn finish_tick(&mut self, decision: TickDecision, distance_m: f64, delay: Duration) -> Duration {
        let report = TickReport {
            decision,
            distance_m,
            delay,
            pending: self.buffer.len(),
        };
        debug!(
            decision = %decision,
            distance_m = format!("{:.1}", distance_m),
            delay_secs = delay.as_secs(),
            pending = report.pending,
            "Tracking tick"
        );
        self.last_tick = Some(report);
        delay
    }

    // ─────────────────────────────────────────────────────────────────────
    // Uploads
    // ─────────────────────────────────────────────────────────────────────

    async fn persist(&mut self, sample: &LocationSample) -> (UploadPath, bool) {
        match self.buffer.can_upload_directly(sample) {
            Admission::Direct => (UploadPath::Direct, self.upload_single(sample).await),
            Admission::Queued { evicted } => {
                self.log_eviction(evicted);
                (UploadPath::Drain, self.drain_offline_buffer().await)
            }
        }
    }

    fn log_eviction(&self, evicted: Option<LocationSample>) {
        if let Some(evicted) = evicted {
            warn!(
                evicted = %evicted,
                capacity = self.buffer.capacity(),
                "Offline buffer full, dropped oldest sample"
            );
        }
    }

    async fn upload_single(&mut self, sample: &LocationSample) -> bool {
        let validity_ms = i64::try_from(self.config.location_validity.as_millis()).unwrap_or(i64::MAX);
        let cutoff_ms = sample.timestamp_ms.saturating_sub(validity_ms);
        match self.store.remove_outdated(cutoff_ms).await {
            Ok(removed) => debug!(cutoff_ms, ?removed, "Removed outdated locations"),
            Err(e) => warn!(error = %e, cutoff_ms, "Failed to remove outdated locations"),
        }

        match self.store.add_location(sample).await {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, store = self.store.name(), "Upload failed, buffering sample");
                let evicted = self.buffer.store_failed_upload(*sample);
                self.log_eviction(evicted);
                false
            }
        }
    }

    /// Upload the backlog chunk by chunk until it is empty, a batch fails,
    /// or the sync budget runs out.
    async fn drain_offline_buffer(&mut self) -> bool {
        let started = self.clock.now();
        let budget = self.config.max_offline_sync_time;
        let chunk_size = self.config.multi_upload_chunk_size;
        let mut uploaded = 0usize;

        loop {
            let chunk = self.buffer.next_upload_chunk(chunk_size);
            if chunk.is_empty() {
                return true;
            }

            let count = chunk.len();
            let result = self.store.add_locations(&chunk).await;
            if let Err(e) = &result {
                warn!(
                    error = %e,
                    chunk = count,
                    pending = self.buffer.len() + count,
                    "Batch upload failed, re-queuing chunk"
                );
            } else {
                uploaded += count;
            }

            let progress = self.buffer.handle_multi_upload_result(chunk, result.is_ok());
            if !progress.can_continue {
                debug!(uploaded, pending = self.buffer.len(), "Offline drain stopped");
                return !progress.is_error;
            }

            if self.clock.elapsed_since(started) >= budget {
                debug!(
                    uploaded,
                    pending = self.buffer.len(),
                    budget_secs = budget.as_secs(),
                    "Offline sync budget exhausted"
                );
                return !progress.is_error;
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Statistics
    // ─────────────────────────────────────────────────────────────────────

    fn record_check(&mut self, timestamp_ms: i64) {
        self.state.checks += 1;
        if let Err(e) = self.stats.record_check(timestamp_ms, self.state.checks) {
            warn!(error = %e, "Failed to record check");
        }
    }

    fn record_update(&mut self, timestamp_ms: i64, distance_m: f64) {
        self.state.updates += 1;
        self.state.total_distance_m += distance_m;
        if let Err(e) = self.stats.record_update(
            timestamp_ms,
            self.state.updates,
            distance_m,
            self.state.total_distance_m,
        ) {
            warn!(error = %e, "Failed to record update");
        }
    }

    fn record_error(&mut self) {
        self.state.errors += 1;
        let now_ms = self.clock.now().timestamp_millis();
        if let Err(e) = self.stats.record_error(now_ms, self.state.errors) {
            warn!(error = %e, "Failed to record error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::stats::MemoryStatsSink;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    /// Metres per degree of latitude at R = 6 371 km.
    const M_PER_DEG_LAT: f64 = 111_194.93;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn test_config() -> TrackingConfig {
        TrackingConfig::default()
            .with_intervals(secs(30), secs(300))
            .with_idle_increment(secs(60))
            .with_distance_threshold_m(10.0)
            .with_retry_interval(secs(40))
            .with_max_offline_samples(100)
            .with_multi_upload_chunk_size(10)
    }

    struct Harness {
        controller: UploadController,
        store: Arc<MemoryStore>,
        clock: Arc<ManualClock>,
        stats: Arc<MemoryStatsSink>,
    }

    fn harness(config: TrackingConfig) -> Harness {
        let store = Arc::new(MemoryStore::new());
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let stats = Arc::new(MemoryStatsSink::new());
        let controller = UploadController::new(
            config,
            Arc::clone(&store) as Arc<dyn RemoteStore>,
            Arc::clone(&clock) as Arc<dyn Clock>,
            Arc::clone(&stats) as Arc<dyn StatisticsSink>,
        )
        .unwrap();
        Harness {
            controller,
            store,
            clock,
            stats,
        }
    }

    /// A sample `north_m` metres north of the origin.
    fn at_north(north_m: f64, ts: i64) -> LocationSample {
        LocationSample::new(north_m / M_PER_DEG_LAT, 0.0, ts)
    }

    async fn tick(h: &mut Harness, sample: LocationSample) -> Duration {
        h.controller.handle_upload(&sample, Some(&sample)).await
    }

    #[test]
    fn test_rejects_invalid_config() {
        let store: Arc<dyn RemoteStore> = Arc::new(MemoryStore::new());
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::at_millis(0));
        let stats: Arc<dyn StatisticsSink> = Arc::new(MemoryStatsSink::new());
        let config = test_config().with_intervals(secs(500), secs(10));
        assert!(UploadController::new(config, store, clock, stats).is_err());
    }

    #[tokio::test]
    async fn test_first_sample_is_baseline_and_never_uploads() {
        let mut h = harness(test_config());
        let delay = tick(&mut h, at_north(0.0, 0)).await;

        assert_eq!(delay, secs(30));
        assert!(h.store.is_empty());
        assert_eq!(h.store.single_calls(), 0);
        assert_eq!(h.controller.last_tick().unwrap().decision, TickDecision::Baseline);
        assert_eq!(h.controller.state().last_location, Some(at_north(0.0, 0)));
        assert_eq!(h.controller.state().checks, 1);
        assert_eq!(h.controller.state().updates, 0);
    }

    #[tokio::test]
    async fn test_idle_growth_is_capped() {
        let mut h = harness(test_config());
        let mut delays = Vec::new();
        for i in 0..8 {
            delays.push(tick(&mut h, at_north(1.0, i)).await.as_secs());
        }
        assert_eq!(delays, vec![30, 90, 150, 210, 270, 300, 300, 300]);
        assert!(h.store.is_empty());
    }

    #[tokio::test]
    async fn test_movement_uploads_and_resets_interval() {
        let mut h = harness(test_config());
        tick(&mut h, at_north(0.0, 0)).await;
        tick(&mut h, at_north(5.0, 1)).await;

        let delay = tick(&mut h, at_north(55.0, 2)).await;
        assert_eq!(delay, secs(30));
        assert_eq!(h.store.len(), 1);
        assert_eq!(
            h.controller.last_tick().unwrap().decision,
            TickDecision::Uploaded(UploadPath::Direct)
        );
        // Distance is measured from the baseline, not the idle sample
        let distance = h.stats.snapshot().last_distance_m;
        assert!((distance - 55.0).abs() < 0.1, "got {}", distance);
        assert_eq!(h.controller.state().last_location, Some(at_north(55.0, 2)));
    }

    #[tokio::test]
    async fn test_missing_fix_forces_upload() {
        let mut h = harness(test_config());
        tick(&mut h, at_north(0.0, 0)).await;

        let fallback = at_north(0.0, 5);
        let delay = h.controller.handle_upload(&fallback, None).await;

        assert_eq!(delay, secs(30));
        assert_eq!(h.store.samples(), vec![fallback]);
        assert_eq!(h.controller.last_tick().unwrap().distance_m, 10.0);
        // Baseline unchanged when there was no fresh fix
        assert_eq!(h.controller.state().last_location, Some(at_north(0.0, 0)));
    }

    #[tokio::test]
    async fn test_missing_fix_on_first_call_uploads() {
        let mut h = harness(test_config());
        let fallback = at_north(0.0, 0);
        h.controller.handle_upload(&fallback, None).await;

        assert_eq!(h.store.len(), 1);
        assert!(h.controller.state().last_location.is_none());
    }

    #[tokio::test]
    async fn test_failures_back_off_exponentially() {
        let mut h = harness(test_config());
        h.store.set_offline(true);
        tick(&mut h, at_north(0.0, 0)).await;

        let mut delays = Vec::new();
        for i in 1..=5 {
            delays.push(tick(&mut h, at_north(100.0 * i as f64, i)).await.as_secs());
        }
        assert_eq!(delays, vec![40, 80, 160, 300, 300]);
        assert_eq!(h.controller.state().retry_interval, secs(300));
        assert_eq!(h.controller.state().errors, 5);
        assert_eq!(h.stats.snapshot().errors, 5);
        assert_eq!(
            h.stats.snapshot().last_error_ms,
            Some(h.clock.now().timestamp_millis())
        );
    }

    #[tokio::test]
    async fn test_retry_below_min_is_clamped() {
        let config = test_config().with_retry_interval(secs(5));
        let mut h = harness(config);
        h.store.set_offline(true);
        tick(&mut h, at_north(0.0, 0)).await;

        let delay = tick(&mut h, at_north(100.0, 1)).await;
        assert_eq!(delay, secs(30));
        assert_eq!(h.controller.state().retry_interval, secs(10));
    }

    #[tokio::test]
    async fn test_recovery_resets_back_off() {
        let mut h = harness(test_config());
        h.store.set_offline(true);
        tick(&mut h, at_north(0.0, 0)).await;
        tick(&mut h, at_north(100.0, 1)).await;
        tick(&mut h, at_north(200.0, 2)).await;
        assert_eq!(h.controller.state().consecutive_failures, 2);

        h.store.set_offline(false);
        let delay = tick(&mut h, at_north(300.0, 3)).await;
        assert_eq!(delay, secs(30));
        assert_eq!(h.controller.state().retry_interval, secs(40));
        assert_eq!(h.controller.state().consecutive_failures, 0);
    }

    #[tokio::test]
    async fn test_failed_sample_is_buffered_then_drained_in_order() {
        let mut h = harness(test_config());
        tick(&mut h, at_north(0.0, 0)).await;

        h.store.set_offline(true);
        tick(&mut h, at_north(100.0, 1)).await;
        tick(&mut h, at_north(200.0, 2)).await;
        assert_eq!(h.controller.pending_uploads(), 2);
        assert_eq!(
            h.controller.last_tick().unwrap().decision,
            TickDecision::Failed(UploadPath::Drain)
        );

        h.store.set_offline(false);
        let delay = tick(&mut h, at_north(300.0, 3)).await;
        assert_eq!(delay, secs(30));
        assert_eq!(h.controller.pending_uploads(), 0);

        let uploaded: Vec<i64> = h.store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(uploaded, vec![1, 2, 3]);
        assert_eq!(
            h.controller.last_tick().unwrap().decision,
            TickDecision::Uploaded(UploadPath::Drain)
        );
    }

    #[tokio::test]
    async fn test_drain_uses_chunks() {
        let config = test_config().with_multi_upload_chunk_size(2);
        let mut h = harness(config);
        tick(&mut h, at_north(0.0, 0)).await;

        h.store.set_offline(true);
        for i in 1..=4 {
            tick(&mut h, at_north(100.0 * i as f64, i)).await;
        }
        h.store.set_offline(false);
        let batches_before = h.store.batch_calls();

        tick(&mut h, at_north(500.0, 5)).await;
        // 5 pending samples in chunks of 2
        assert_eq!(h.store.batch_calls() - batches_before, 3);
        assert_eq!(h.store.len(), 5);
    }

    #[tokio::test]
    async fn test_drain_failing_on_later_chunk_backs_off_and_requeues() {
        let config = test_config().with_multi_upload_chunk_size(2);
        let mut h = harness(config);
        tick(&mut h, at_north(0.0, 0)).await;

        h.store.set_offline(true);
        for i in 1..=3 {
            tick(&mut h, at_north(100.0 * i as f64, i)).await;
        }
        assert_eq!(h.controller.state().retry_interval, secs(300));

        // First batch lands, second batch fails
        h.store.set_offline(false);
        h.store.script([true, false]);
        let delay = tick(&mut h, at_north(400.0, 4)).await;

        assert_eq!(delay, secs(300));
        assert_eq!(
            h.controller.last_tick().unwrap().decision,
            TickDecision::Failed(UploadPath::Drain)
        );
        let stored: Vec<i64> = h.store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stored, vec![1, 2]);
        let pending: Vec<i64> = h.controller.buffer().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(pending, vec![3, 4]);
        assert_eq!(h.controller.state().errors, 4);
        assert_eq!(h.controller.state().consecutive_failures, 4);
        assert_eq!(h.stats.snapshot().errors, 4);
    }

    #[tokio::test]
    async fn test_sample_behind_full_backlog_evicts_oldest() {
        let config = test_config()
            .with_max_offline_samples(3)
            .with_multi_upload_chunk_size(2);
        let mut h = harness(config);
        tick(&mut h, at_north(0.0, 0)).await;

        h.store.set_offline(true);
        for i in 1..=3 {
            tick(&mut h, at_north(100.0 * i as f64, i)).await;
        }
        assert_eq!(h.controller.pending_uploads(), 3);

        h.store.set_offline(false);
        tick(&mut h, at_north(400.0, 4)).await;

        let stored: Vec<i64> = h.store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(stored, vec![2, 3, 4]);
        assert_eq!(h.controller.pending_uploads(), 0);
        assert_eq!(
            h.controller.last_tick().unwrap().decision,
            TickDecision::Uploaded(UploadPath::Drain)
        );
    }

    #[tokio::test]
    async fn test_direct_upload_removes_outdated_first() {
        let config = test_config().with_location_validity(secs(60));
        let mut h = harness(config);
        h.store.add_location(&at_north(0.0, 0)).await.unwrap();

        tick(&mut h, at_north(0.0, 1_000)).await;
        tick(&mut h, at_north(100.0, 120_000)).await;

        assert_eq!(h.store.remove_calls(), 1);
        let remaining: Vec<i64> = h.store.samples().iter().map(|s| s.timestamp_ms).collect();
        assert_eq!(remaining, vec![120_000]);
    }

    #[tokio::test]
    async fn test_counters_resume_from_sink() {
        let stats = Arc::new(MemoryStatsSink::with_stats(TrackingStats {
            checks: 10,
            updates: 4,
            errors: 1,
            total_distance_m: 400.0,
            ..Default::default()
        }));
        let mut controller = UploadController::new(
            test_config(),
            Arc::new(MemoryStore::new()),
            Arc::new(ManualClock::at_millis(0)),
            Arc::clone(&stats) as Arc<dyn StatisticsSink>,
        )
        .unwrap();

        let s = at_north(0.0, 0);
        controller.handle_upload(&s, Some(&s)).await;
        assert_eq!(controller.state().checks, 11);
        assert_eq!(stats.snapshot().checks, 11);
        assert_eq!(stats.snapshot().last_check_ms, Some(0));
    }

    proptest! {
        #[test]
        fn prop_idle_interval_monotonic_and_bounded(
            jitter in prop::collection::vec(0.0f64..4.0, 1..40),
        ) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let mut h = harness(test_config());
                let mut previous = h.controller.state().current_interval;
                for (i, north) in jitter.iter().enumerate() {
                    tick(&mut h, at_north(*north, i as i64)).await;
                    let current = h.controller.state().current_interval;
                    prop_assert!(current >= previous);
                    prop_assert!(current <= secs(300));
                    previous = current;
                }
                prop_assert!(h.store.is_empty());
                Ok(())
            })?;
        }

        #[test]
        fn prop_back_off_growth(failures in 1u32..12) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let mut h = harness(test_config());
                h.store.set_offline(true);
                tick(&mut h, at_north(0.0, 0)).await;
                for i in 1..=failures {
                    tick(&mut h, at_north(100.0 * i as f64, i as i64)).await;
                }
                let expected = secs(40)
                    .saturating_mul(2u32.saturating_pow(failures))
                    .min(secs(300));
                prop_assert_eq!(h.controller.state().retry_interval, expected);
                Ok(())
            })?;
        }

        #[test]
        fn prop_success_always_resets(failures in 0u32..8) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let mut h = harness(test_config());
                h.store.set_offline(true);
                tick(&mut h, at_north(0.0, 0)).await;
                for i in 1..=failures {
                    tick(&mut h, at_north(100.0 * i as f64, i as i64)).await;
                }
                h.store.set_offline(false);
                let n = failures as i64 + 1;
                tick(&mut h, at_north(100.0 * n as f64, n)).await;
                prop_assert_eq!(h.controller.state().current_interval, secs(30));
                prop_assert_eq!(h.controller.state().retry_interval, secs(40));
                Ok(())
            })?;
        }
    }
}
