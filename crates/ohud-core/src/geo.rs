// SPDX-License-Identifier: MIT
// Copyright (c) 2026 StarTuz

//! Great-circle distance, initial bearing and angle arithmetic on a spherical earth.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Mean earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True when both coordinates are finite and inside the WGS84 ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon)
    }
}

/// Haversine distance in meters.
pub fn distance(p1: GeoPoint, p2: GeoPoint) -> f64 {
    if p1 == p2 {
        return 0.0;
    }
    let d_lat = (p2.lat - p1.lat).to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + p1.lat.to_radians().cos() * p2.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` past 1 for near-antipodal points
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}

/// Initial bearing from `p1` to `p2` in degrees, `[0, 360)`.
///
/// Coincident points have no defined bearing; `0.0` is returned for them.
pub fn bearing(p1: GeoPoint, p2: GeoPoint) -> f64 {
    if p1 == p2 {
        return 0.0;
    }
    let phi1 = p1.lat.to_radians();
    let phi2 = p2.lat.to_radians();
    let d_lon = (p2.lon - p1.lon).to_radians();
    let y = d_lon.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * d_lon.cos();
    if y == 0.0 && x == 0.0 {
        return 0.0;
    }
    normalize(y.atan2(x).to_degrees())
}

/// Reduces an angle to `[0, 360)`.
pub fn normalize(angle: f64) -> f64 {
    let r = angle.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 {
        0.0
    } else {
        r
    }
}

/// Signed shortest rotation from `b` to `a`, in `(-180, 180]`.
pub fn angular_diff(a: f64, b: f64) -> f64 {
    let d = normalize(a - b);
    if d > 180.0 {
        d - 360.0
    } else {
        d
    }
}

/// Point reached by travelling `distance_m` from `origin` along `bearing_deg`.
pub fn destination_point(origin: GeoPoint, bearing_deg: f64, distance_m: f64) -> GeoPoint {
    let delta = distance_m / EARTH_RADIUS_M;
    let theta = bearing_deg.to_radians();
    let phi1 = origin.lat.to_radians();
    let lambda1 = origin.lon.to_radians();

    let phi2 = (phi1.sin() * delta.cos() + phi1.cos() * delta.sin() * theta.cos()).asin();
    let lambda2 = lambda1
        + (theta.sin() * delta.sin() * phi1.cos()).atan2(delta.cos() - phi1.sin() * phi2.sin());

    let lon = (lambda2.to_degrees() + 540.0).rem_euclid(360.0) - 180.0;
    GeoPoint::new(phi2.to_degrees(), lon)
}

/// Uniformly random point within `max_distance_m` of `origin`
/// (uniform in distance and bearing, not in area).
pub fn random_offset<R: Rng + ?Sized>(origin: GeoPoint, max_distance_m: f64, rng: &mut R) -> GeoPoint {
    let d = rng.gen::<f64>() * max_distance_m.max(0.0);
    let brng = rng.gen_range(0.0..360.0);
    destination_point(origin, brng, d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TARTU: GeoPoint = GeoPoint {
        lat: 58.377679,
        lon: 26.717398,
    };

    #[test]
    fn test_distance_zero_for_same_point() {
        assert_eq!(distance(TARTU, TARTU), 0.0);
        let p = GeoPoint::new(-33.9, 151.2);
        assert_eq!(distance(p, p), 0.0);
    }

    #[test]
    fn test_distance_known_value() {
        // One degree of latitude along a meridian
        let d = distance(GeoPoint::new(0.0, 0.0), GeoPoint::new(1.0, 0.0));
        assert!((d - 111_194.9).abs() < 1.0, "got {}", d);
    }

    #[test]
    fn test_antipodal_distance_is_finite() {
        let mut rng = StdRng::seed_from_u64(19);
        let half_circumference = std::f64::consts::PI * EARTH_RADIUS_M;
        for _ in 0..2000 {
            let lat: f64 = rng.gen_range(-90.0..=90.0);
            let lon: f64 = rng.gen_range(0.0..=180.0);
            let p = GeoPoint::new(lat, lon);
            let q = GeoPoint::new(-lat, lon - 180.0);
            let d = distance(p, q);
            assert!(d.is_finite(), "NaN between {:?} and {:?}", p, q);
            assert!(d <= half_circumference + 1e-6, "{} exceeds half circumference", d);
        }
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let o = GeoPoint::new(0.0, 0.0);
        assert!(bearing(o, GeoPoint::new(1.0, 0.0)).abs() < 1e-9);
        assert!((bearing(o, GeoPoint::new(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing(o, GeoPoint::new(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing(o, GeoPoint::new(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_coincident_is_sentinel() {
        let b = bearing(TARTU, TARTU);
        assert_eq!(b, 0.0);
        assert!(!b.is_nan());
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize(0.0), 0.0);
        assert_eq!(normalize(360.0), 0.0);
        assert_eq!(normalize(-10.0), 350.0);
        assert_eq!(normalize(725.0), 5.0);
        let tiny = normalize(-1e-17);
        assert!((0.0..360.0).contains(&tiny));
    }

    #[test]
    fn test_angular_diff_basics() {
        assert_eq!(angular_diff(10.0, 10.0), 0.0);
        assert_eq!(angular_diff(10.0, 350.0), 20.0);
        assert_eq!(angular_diff(350.0, 10.0), -20.0);
        assert_eq!(angular_diff(180.0, 0.0), 180.0);
        assert_eq!(angular_diff(0.0, 180.0), 180.0);
    }

    #[test]
    fn test_angular_diff_properties_sweep() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..2000 {
            let a: f64 = rng.gen_range(-720.0..720.0);
            let b: f64 = rng.gen_range(-720.0..720.0);
            let d = angular_diff(a, b);
            assert!(d > -180.0 && d <= 180.0, "out of range: {}", d);
            assert_eq!(angular_diff(a, a), 0.0);
            let back = angular_diff(b, a);
            if d.abs() < 179.999 {
                assert!((d + back).abs() < 1e-9, "a={} b={} d={} back={}", a, b, d, back);
            }
        }
    }

    #[test]
    fn test_destination_point_round_trips_through_distance_and_bearing() {
        let p = destination_point(TARTU, 130.0, 150.0);
        assert!((distance(TARTU, p) - 150.0).abs() < 0.01);
        assert!((bearing(TARTU, p) - 130.0).abs() < 0.01);
    }

    #[test]
    fn test_random_offset_stays_in_radius() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let p = random_offset(TARTU, 1000.0, &mut rng);
            assert!(p.is_valid());
            assert!(distance(TARTU, p) <= 1000.0 + 1e-6);
        }
    }

    #[test]
    fn test_geo_point_validity() {
        assert!(TARTU.is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, -180.5).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, f64::INFINITY).is_valid());
    }
}
