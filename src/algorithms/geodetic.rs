//! Geodetic to local Cartesian transforms
//!
//! Places GPS-tagged objects relative to a zero anchor using two
//! single-axis haversine distances:
//! - x: distance along the zero anchor's parallel, positive east
//! - y: altitude difference
//! - z: distance along the zero anchor's meridian, positive south
//!
//! This approximates a local tangent plane without an ellipsoid model and
//! is intended for separations of tens to low hundreds of meters.

use crate::core::{GeoCoordinate, LocalPoint, ZeroAnchor, EARTH_RADIUS_M};

/// Great-circle distance in meters (haversine, spherical Earth)
pub fn distance_meters(a: &GeoCoordinate, b: &GeoCoordinate) -> f64 {
    let d_lon = (b.longitude - a.longitude).to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos() * b.latitude.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    angle * EARTH_RADIUS_M
}

/// Offset of `coord` from the zero anchor in the local frame
pub fn to_local(zero: &ZeroAnchor, coord: &GeoCoordinate) -> LocalPoint {
    let origin = zero.coordinate();

    let along_parallel = GeoCoordinate::new(origin.latitude, coord.longitude);
    let x = distance_meters(origin, &along_parallel)
        * if coord.longitude > origin.longitude { 1.0 } else { -1.0 };

    let along_meridian = GeoCoordinate::new(coord.latitude, origin.longitude);
    let z = distance_meters(origin, &along_meridian)
        * if coord.latitude > origin.latitude { -1.0 } else { 1.0 };

    LocalPoint::new(x, coord.altitude - origin.altitude, z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn zero_at(lat: f64, lon: f64) -> ZeroAnchor {
        ZeroAnchor::new(GeoCoordinate::new(lat, lon))
    }

    #[test]
    fn test_coincident_points() {
        let a = GeoCoordinate::new(21.046306, 105.7937535).with_altitude(12.0);
        assert_eq!(distance_meters(&a, &a), 0.0);

        let local = to_local(&ZeroAnchor::new(a), &a);
        assert_abs_diff_eq!(local.x, 0.0);
        assert_abs_diff_eq!(local.y, 0.0);
        assert_abs_diff_eq!(local.z, 0.0);
    }

    #[test]
    fn test_one_millidegree_of_latitude() {
        let a = GeoCoordinate::new(21.0, 105.0);
        let b = GeoCoordinate::new(21.001, 105.0);

        // R * 0.001° in radians
        let expected = EARTH_RADIUS_M * 0.001_f64.to_radians();
        assert_relative_eq!(distance_meters(&a, &b), expected, max_relative = 1e-9);
        assert_relative_eq!(distance_meters(&a, &b), distance_meters(&b, &a), max_relative = 1e-12);
    }

    #[test]
    fn test_due_north_sample() {
        let zero = zero_at(21.0, 105.0);
        let sample = GeoCoordinate::new(21.001, 105.0);

        let local = to_local(&zero, &sample);
        let distance = distance_meters(zero.coordinate(), &sample);

        assert_abs_diff_eq!(local.x, 0.0, epsilon = 1e-9);
        assert_eq!(local.y, 0.0);
        assert!(local.z < 0.0);
        assert!((local.z.abs() - distance).abs() / distance < 0.01);
    }

    #[test]
    fn test_sign_conventions() {
        let zero = zero_at(21.0, 105.0);

        assert!(to_local(&zero, &GeoCoordinate::new(21.0, 105.0005)).x > 0.0);
        assert!(to_local(&zero, &GeoCoordinate::new(21.0, 104.9995)).x < 0.0);
        assert!(to_local(&zero, &GeoCoordinate::new(21.0005, 105.0)).z < 0.0);
        assert!(to_local(&zero, &GeoCoordinate::new(20.9995, 105.0)).z > 0.0);
    }

    #[test]
    fn test_altitude_is_a_plain_difference() {
        let zero = ZeroAnchor::new(GeoCoordinate::new(48.85, 2.35).with_altitude(35.25));
        let p = GeoCoordinate::new(48.851, 2.352).with_altitude(-4.5);

        assert_eq!(to_local(&zero, &p).y, -4.5 - 35.25);
    }

    #[test]
    fn test_decomposition_tracks_direct_distance() {
        let zero = zero_at(21.046306, 105.7937535);
        let p = GeoCoordinate::new(21.046309, 105.794953);

        let local = to_local(&zero, &p);
        let planar = (local.x * local.x + local.z * local.z).sqrt();
        let direct = distance_meters(zero.coordinate(), &p);

        assert!((planar - direct).abs() < 0.01, "planar {} vs direct {}", planar, direct);
    }
}
