//! Location samples and geodesic distance.
//!
//! A [`LocationSample`] is the unit of work for the whole crate: the location
//! source produces one per tick, the upload controller decides what to do with
//! it, and the offline buffer holds it while the remote store is unreachable.
//!
//! # Example
//!
//! ```
//! use geotrail::location::{haversine_distance_m, LocationSample};
//!
//! let home = LocationSample::new(53.5511, 9.9937, 1_700_000_000_000);
//! let shop = LocationSample::new(53.5520, 9.9937, 1_700_000_060_000);
//!
//! let metres = haversine_distance_m(&home, &shop);
//! assert!(metres > 90.0 && metres < 110.0);
//! ```

mod distance;
mod sample;

pub use distance::{haversine_distance_m, EARTH_RADIUS_M};
pub use sample::LocationSample;
