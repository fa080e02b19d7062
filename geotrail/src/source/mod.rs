//! Location sample sources.
//!
//! A [`LocationSource`] is asked for one fix per tracking tick. Getting a
//! fix can fail (no GPS, no permission, timeout); that is a normal reading
//! ([`Reading::NoFix`]), not an error, and the session falls back to the
//! source's last known position.

mod replay;

pub use replay::ReplaySource;

use std::path::PathBuf;

use thiserror::Error;

use crate::location::LocationSample;
use crate::store::BoxFuture;

/// Errors from constructing a source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The track file could not be read.
    #[error("failed to read track {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A line of the track file is not a sample or `null`.
    #[error("invalid track entry on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },

    /// A line of the track file holds coordinates outside the valid range.
    #[error("invalid coordinates on line {line}: {sample}")]
    OutOfRange { line: usize, sample: LocationSample },
}

/// Result of asking a source for a fix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reading {
    /// A fresh position.
    Fix(LocationSample),
    /// Acquiring a position failed this time.
    NoFix,
    /// The source will never produce another reading.
    Exhausted,
}

/// Something that produces location fixes on demand.
pub trait LocationSource: Send {
    /// Try to acquire a fresh fix.
    fn next_reading(&mut self) -> BoxFuture<'_, Reading>;

    /// The most recent position known to the source, however old.
    fn last_known(&self) -> Option<LocationSample> {
        None
    }
}
