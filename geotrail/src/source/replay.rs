//! Replay of recorded tracks.

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use super::{LocationSource, Reading, SourceError};
use crate::clock::Clock;
use crate::location::LocationSample;
use crate::store::BoxFuture;

/// Plays back a fixed list of readings, then reports [`Reading::Exhausted`].
///
/// Track files are JSON lines, one reading per line:
///
/// ```text
/// # comments and blank lines are ignored
/// {"latitude": 53.5511, "longitude": 9.9937, "timestamp_ms": 1700000000000}
/// null
/// {"latitude": 53.5520, "longitude": 9.9940, "timestamp_ms": 1700000060000}
/// ```
///
/// `null` stands for a failed fix.
pub struct ReplaySource {
    readings: VecDeque<Option<LocationSample>>,
    last_known: Option<LocationSample>,
    restamp: Option<Arc<dyn Clock>>,
}

impl std::fmt::Debug for ReplaySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplaySource")
            .field("remaining", &self.readings.len())
            .field("last_known", &self.last_known)
            .field("restamp", &self.restamp.is_some())
            .finish()
    }
}

impl ReplaySource {
    /// Replay readings from memory; `None` entries are failed fixes.
    pub fn new(readings: impl IntoIterator<Item = Option<LocationSample>>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
            last_known: None,
            restamp: None,
        }
    }

    /// Load a JSON-lines track file.
    pub fn from_path(path: &Path) -> Result<Self, SourceError> {
        let contents = fs::read_to_string(path).map_err(|source| SourceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Parse JSON-lines track text.
    ///
    /// Fixes with non-finite or out-of-range coordinates are rejected.
    pub fn parse(text: &str) -> Result<Self, SourceError> {
        let mut readings = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let reading: Option<LocationSample> =
                serde_json::from_str(line).map_err(|source| SourceError::Parse {
                    line: index + 1,
                    source,
                })?;
            if let Some(sample) = reading.filter(|s| !s.is_valid()) {
                return Err(SourceError::OutOfRange {
                    line: index + 1,
                    sample,
                });
            }
            readings.push(reading);
        }
        Ok(Self::new(readings))
    }

    /// Stamp each fix with the clock's current time instead of the
    /// recorded one, for replaying an old track as if it were live.
    pub fn restamped(mut self, clock: Arc<dyn Clock>) -> Self {
        self.restamp = Some(clock);
        self
    }

    /// Readings not yet played.
    pub fn remaining(&self) -> usize {
        self.readings.len()
    }
}

impl LocationSource for ReplaySource {
    fn next_reading(&mut self) -> BoxFuture<'_, Reading> {
        Box::pin(async move {
            match self.readings.pop_front() {
                None => Reading::Exhausted,
                Some(None) => Reading::NoFix,
                Some(Some(mut sample)) => {
                    if let Some(clock) = &self.restamp {
                        sample.timestamp_ms = clock.now().timestamp_millis();
                    }
                    self.last_known = Some(sample);
                    Reading::Fix(sample)
                }
            }
        })
    }

    fn last_known(&self) -> Option<LocationSample> {
        self.last_known
    }
}
