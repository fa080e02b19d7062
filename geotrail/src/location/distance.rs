//! Great-circle distance between samples.

use super::LocationSample;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distance in metres between two samples using the haversine formula.
///
/// Accurate to well under a metre at the distances the movement threshold
/// cares about (tens to hundreds of metres).
pub fn haversine_distance_m(from: &LocationSample, to: &LocationSample) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlat = (to.latitude - from.latitude).to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(lat: f64, lon: f64) -> LocationSample {
        LocationSample::new(lat, lon, 0)
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let p = at(53.55, 9.99);
        assert_eq!(haversine_distance_m(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_one_degree_latitude() {
        // One degree of latitude is ~111.2 km everywhere
        let d = haversine_distance_m(&at(10.0, 20.0), &at(11.0, 20.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = at(53.55, 9.99);
        let b = at(48.14, 11.58);
        let ab = haversine_distance_m(&a, &b);
        let ba = haversine_distance_m(&b, &a);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn test_distance_across_antimeridian() {
        let d = haversine_distance_m(&at(0.0, 179.9995), &at(0.0, -179.9995));
        assert!(d < 200.0, "antimeridian hop should be short, got {}", d);
    }

    #[test]
    fn test_distance_hamburg_munich() {
        let d = haversine_distance_m(&at(53.5511, 9.9937), &at(48.1351, 11.5820));
        // ~612 km
        assert!((d / 1000.0 - 612.0).abs() < 5.0, "got {} km", d / 1000.0);
    }
}
