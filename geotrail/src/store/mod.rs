//! Remote location storage.
//!
//! The [`RemoteStore`] trait is the seam between the upload controller and
//! wherever locations end up. The store is append-only from the client's
//! point of view: single adds, all-or-nothing batch adds, and removal of
//! entries older than a cutoff. Authentication, wire format and per-request
//! timeouts belong to the implementation.
//!
//! # Design Principles
//!
//! - **Errors are typed here, booleans above**: implementations report
//!   [`StoreError`]; the controller turns every failure into a plain
//!   success flag and never propagates it
//! - **Batch adds are atomic**: a failed batch must not have stored any
//!   sample, otherwise re-queued chunks would be uploaded twice
//! - **Dyn-compatible**: async methods return [`BoxFuture`] so stores can be
//!   held as `Arc<dyn RemoteStore>`
//!
//! # Implementations
//!
//! - [`HttpStore`]: JSON over HTTPS via `reqwest`
//! - [`MemoryStore`]: in-process, with failure injection for tests

mod http;
mod memory;

pub use http::HttpStore;
pub use memory::MemoryStore;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::location::LocationSample;

/// Boxed future type for dyn-compatible async methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Errors that can occur talking to the remote store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("remote store unreachable: {0}")]
    Unreachable(String),

    /// The request did not finish in time.
    #[error("remote store request timed out")]
    Timeout,

    /// The store answered with a non-success status.
    #[error("remote store rejected request: HTTP {status}")]
    Status { status: u16 },

    /// The store could not be configured.
    #[error("invalid remote store configuration: {0}")]
    Config(String),

    /// Any other failure.
    #[error("remote store error: {0}")]
    Other(String),
}

/// Append-only remote location store.
pub trait RemoteStore: Send + Sync {
    /// Store a single sample.
    fn add_location<'a>(&'a self, sample: &'a LocationSample) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Store a batch of samples, all or nothing.
    fn add_locations<'a>(
        &'a self,
        samples: &'a [LocationSample],
    ) -> BoxFuture<'a, Result<(), StoreError>>;

    /// Remove entries with a fix time strictly before `before_ms`.
    ///
    /// Returns how many entries were removed, when the store knows.
    fn remove_outdated(&self, before_ms: i64) -> BoxFuture<'_, Result<Option<u64>, StoreError>>;

    /// Short identifier for logs.
    fn name(&self) -> &str;
}
