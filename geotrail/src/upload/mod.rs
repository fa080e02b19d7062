//! Adaptive tracking and upload control.
//!
//! This is the decision core of the tracker:
//!
//! - [`UploadController`]: per-sample state machine (idle growth, upload,
//!   exponential retry back-off)
//! - [`BoundedOfflineBuffer`]: drop-oldest FIFO of samples waiting for the
//!   remote store to come back
//! - [`policy`]: the interval arithmetic both rely on
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use geotrail::clock::SystemClock;
//! use geotrail::config::TrackingConfig;
//! use geotrail::location::LocationSample;
//! use geotrail::stats::MemoryStatsSink;
//! use geotrail::store::MemoryStore;
//! use geotrail::upload::UploadController;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let config = TrackingConfig::default()
//!     .with_intervals(Duration::from_secs(30), Duration::from_secs(300));
//! let mut controller = UploadController::new(
//!     config,
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(SystemClock),
//!     Arc::new(MemoryStatsSink::new()),
//! )?;
//!
//! let fix = LocationSample::new(53.55, 9.99, 1_700_000_000_000);
//! let delay = controller.handle_upload(&fix, Some(&fix)).await;
//! assert_eq!(delay, Duration::from_secs(30));
//! # Ok::<(), geotrail::config::ConfigError>(())
//! # }).unwrap();
//! ```

mod buffer;
mod controller;
pub mod policy;

pub use buffer::{Admission, BoundedOfflineBuffer, MultiUploadProgress};
pub use controller::{ControllerState, TickDecision, TickReport, UploadController, UploadPath};
