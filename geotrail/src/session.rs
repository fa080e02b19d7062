//! Tracking session: the task that owns an [`UploadController`].
//!
//! The controller must be driven by exactly one owner, one sample at a time.
//! A session is that owner: a single tokio task that loops
//!
//! ```text
//! source.next_reading() ──► controller.handle_upload() ──► sleep(delay) ──┐
//!        ▲                                                                │
//!        └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Because the next reading is only requested after the previous delay has
//! elapsed, there is never more than one call in flight.
//!
//! # Cancellation
//!
//! [`SessionHandle::cancel`] stops the loop at the next wait point (while
//! acquiring a fix or sleeping). An upload that is already running always
//! completes; there is no mid-call cancellation.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::location::LocationSample;
use crate::source::{LocationSource, Reading};
use crate::upload::{TickReport, UploadController};

/// Errors from waiting on a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The tracking task panicked or was aborted.
    #[error("tracking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Stopped through the handle.
    Cancelled,
    /// The location source has no more readings.
    SourceExhausted,
}

/// Point-in-time view of a running session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionStatus {
    /// Completed ticks.
    pub ticks: u64,
    /// Ticks where no fix could be acquired.
    pub missed_fixes: u64,
    /// Outcome of the most recent tick.
    pub last_tick: Option<TickReport>,
    /// Samples waiting in the offline buffer.
    pub pending: usize,
    /// Set once the loop has exited.
    pub stopped: Option<StopReason>,
}

impl SessionStatus {
    /// Whether the loop is still running.
    pub fn is_running(&self) -> bool {
        self.stopped.is_none()
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    status: Arc<Mutex<SessionStatus>>,
    cancellation: CancellationToken,
    join: JoinHandle<UploadController>,
}

impl SessionHandle {
    /// Current status snapshot.
    pub fn status(&self) -> SessionStatus {
        self.status.lock().clone()
    }

    /// Ask the session to stop at its next wait point.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// A token that stops the session when cancelled.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Whether the tracking task has exited.
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Cancel and wait for the task, returning the controller.
    pub async fn stop(self) -> Result<UploadController, SessionError> {
        self.cancel();
        self.join().await
    }

    /// Wait for the session to end on its own, returning the controller.
    pub async fn join(self) -> Result<UploadController, SessionError> {
        Ok(self.join.await?)
    }
}

/// Drives an [`UploadController`] from a [`LocationSource`].
pub struct TrackingSession<S> {
    controller: UploadController,
    source: S,
    status: Arc<Mutex<SessionStatus>>,
    cancellation: CancellationToken,
}

impl<S: LocationSource + 'static> TrackingSession<S> {
    /// Spawn the tracking task on `runtime`.
    ///
    /// The session takes ownership of the controller; it is handed back by
    /// [`SessionHandle::stop`] or [`SessionHandle::join`].
    pub fn start(controller: UploadController, source: S, runtime: &Handle) -> SessionHandle {
        let status = Arc::new(Mutex::new(SessionStatus::default()));
        let cancellation = CancellationToken::new();

        let session = Self {
            controller,
            source,
            status: Arc::clone(&status),
            cancellation: cancellation.clone(),
        };
        let join = runtime.spawn(session.run());

        SessionHandle {
            status,
            cancellation,
            join,
        }
    }

    async fn run(mut self) -> UploadController {
        info!(
            min_interval_secs = self.controller.config().min_interval.as_secs(),
            max_interval_secs = self.controller.config().max_interval.as_secs(),
            "Tracking session started"
        );

        let reason = loop {
            let reading = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => None,
                reading = self.source.next_reading() => Some(reading),
            };
            let Some(reading) = reading else {
                break StopReason::Cancelled;
            };

            let Some(delay) = self.process(reading).await else {
                break StopReason::SourceExhausted;
            };

            let cancelled = tokio::select! {
                biased;
                _ = self.cancellation.cancelled() => true,
                _ = tokio::time::sleep(delay) => false,
            };
            if cancelled {
                break StopReason::Cancelled;
            }
        };

        self.status.lock().stopped = Some(reason);
        info!(reason = ?reason, pending = self.controller.pending_uploads(), "Tracking session stopped");
        self.controller
    }

    /// Handle one reading; `None` when the source is exhausted.
    async fn process(&mut self, reading: Reading) -> Option<Duration> {
        let last_known = self.source.last_known();
        let fed = feed_reading(&mut self.controller, reading, last_known).await?;

        let mut status = self.status.lock();
        status.ticks += 1;
        if fed.missed_fix {
            status.missed_fixes += 1;
        }
        status.last_tick = self.controller.last_tick();
        status.pending = self.controller.pending_uploads();
        Some(fed.delay)
    }
}

/// Result of feeding one reading to a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FedReading {
    /// Delay before the next reading.
    pub delay: Duration,
    /// No fresh fix was available for this tick.
    pub missed_fix: bool,
}

/// Feed one reading to `controller`.
///
/// A missed fix falls back to `last_known` (the source's most recent
/// position), uploaded without a fresh fix to compare against. With no known
/// position at all the tick is skipped and the current interval is
/// returned. `None` means the source is exhausted.
pub async fn feed_reading(
    controller: &mut UploadController,
    reading: Reading,
    last_known: Option<LocationSample>,
) -> Option<FedReading> {
    let (delay, missed_fix) = match reading {
        Reading::Exhausted => return None,
        Reading::Fix(fix) => (controller.handle_upload(&fix, Some(&fix)).await, false),
        Reading::NoFix => match last_known {
            Some(fallback) => {
                warn!(fallback = %fallback, "No location fix, using last known position");
                (controller.handle_upload(&fallback, None).await, true)
            }
            None => {
                warn!("No location fix and no known position, skipping tick");
                (controller.state().current_interval, true)
            }
        },
    };
    Some(FedReading { delay, missed_fix })
}
