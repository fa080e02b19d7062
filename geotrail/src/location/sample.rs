//! The location sample value type.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A single position reading.
///
/// Samples are immutable values: a latitude/longitude pair in degrees plus
/// the time the fix was taken, in milliseconds since the Unix epoch. The
/// timestamp belongs to the fix, not to the moment it was processed, and is
/// what the statistics and stale-entry cleanup are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Latitude in degrees (-90..=90).
    pub latitude: f64,
    /// Longitude in degrees (-180..=180).
    pub longitude: f64,
    /// Fix time in milliseconds since the Unix epoch.
    pub timestamp_ms: i64,
}

impl LocationSample {
    /// Create a new sample.
    pub fn new(latitude: f64, longitude: f64, timestamp_ms: i64) -> Self {
        Self {
            latitude,
            longitude,
            timestamp_ms,
        }
    }

    /// Create a sample stamped with the given wall-clock time.
    pub fn at(latitude: f64, longitude: f64, time: DateTime<Utc>) -> Self {
        Self::new(latitude, longitude, time.timestamp_millis())
    }

    /// The fix time as a UTC datetime.
    ///
    /// Returns `None` for timestamps chrono cannot represent.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp_ms).single()
    }

    /// Whether both coordinates are finite and inside their valid ranges.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl fmt::Display for LocationSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.6}, {:.6}) @ {}",
            self.latitude, self.longitude, self.timestamp_ms
        )
    }
}
