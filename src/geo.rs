//! Coordinates and great-circle distance.
//!
//! Distances use the haversine formula on a sphere of mean Earth radius.
//! Accuracy is ~0.5% against the WGS84 ellipsoid, which is plenty for
//! nearest-city selection.

use crate::error::{Error, Result};
use serde::Serialize;
use std::f64::consts::PI;

const DEG: f64 = PI / 180.0;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A validated WGS84 position with optional observer elevation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    elevation: Option<f64>,
}

impl Coordinate {
    /// Build a coordinate, rejecting out-of-range or non-finite values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(Error::InvalidCoordinate { latitude, longitude });
        }
        Ok(Self { latitude, longitude, elevation: None })
    }

    /// Attach an observer elevation in meters above sea level.
    pub fn with_elevation(self, meters: f64) -> Result<Self> {
        if !meters.is_finite() {
            return Err(Error::InvalidElevation(meters));
        }
        Ok(Self { elevation: Some(meters), ..self })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn elevation(&self) -> Option<f64> {
        self.elevation
    }
}

/// Great-circle distance in meters between two coordinates.
///
/// Elevation is ignored. The haversine term is clamped to `[0, 1]` so
/// rounding never pushes `asin` out of its domain for antipodal or
/// coincident points.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    haversine_m(a.latitude, a.longitude, b.latitude, b.longitude)
}

pub(crate) fn haversine_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1) * DEG;
    let d_lon = (lon2 - lon1) * DEG;
    let h = (d_lat / 2.0).sin().powi(2)
        + (lat1 * DEG).cos() * (lat2 * DEG).cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Human-readable coordinate pair, e.g. `59.3293°N, 18.0686°E`.
pub fn format_coords(lat: f64, lon: f64) -> String {
    let ns = if lat >= 0.0 { 'N' } else { 'S' };
    let ew = if lon >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}\u{00B0}{}, {:.4}\u{00B0}{}", lat.abs(), ns, lon.abs(), ew)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert!(matches!(Coordinate::new(91.0, 0.0), Err(Error::InvalidCoordinate { .. })));
        assert!(matches!(Coordinate::new(0.0, -180.5), Err(Error::InvalidCoordinate { .. })));
        assert!(matches!(Coordinate::new(f64::NAN, 0.0), Err(Error::InvalidCoordinate { .. })));
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn test_rejects_nan_elevation() {
        let res = c(10.0, 10.0).with_elevation(f64::NAN);
        assert!(matches!(res, Err(Error::InvalidElevation(_))));
        assert_eq!(c(10.0, 10.0).with_elevation(120.0).unwrap().elevation(), Some(120.0));
    }

    #[test]
    fn test_one_degree_longitude_at_equator() {
        let d = distance(&c(0.0, 0.0), &c(0.0, 1.0));
        assert!((d - 111_320.0).abs() / 111_320.0 < 0.01, "got {d}");
    }

    #[test]
    fn test_identical_points_are_zero() {
        let p = c(59.3293, 18.0686);
        assert_eq!(distance(&p, &p), 0.0);
    }

    #[test]
    fn test_antipodal_is_half_circumference() {
        let d = distance(&c(0.0, 0.0), &c(0.0, 180.0));
        assert_relative_eq!(d, PI * EARTH_RADIUS_M, max_relative = 1e-9);
        let d = distance(&c(90.0, 0.0), &c(-90.0, 0.0));
        assert_relative_eq!(d, PI * EARTH_RADIUS_M, max_relative = 1e-9);
    }

    #[test]
    fn test_stockholm_oslo() {
        let d = distance(&c(59.3293, 18.0686), &c(59.9139, 10.7522));
        assert!((d - 416_000.0).abs() < 5_000.0, "got {d}");
    }

    #[test]
    fn test_format_coords() {
        assert_eq!(format_coords(59.3293, 18.0686), "59.3293\u{00B0}N, 18.0686\u{00B0}E");
        assert_eq!(format_coords(-33.8688, -70.0), "33.8688\u{00B0}S, 70.0000\u{00B0}W");
    }

    proptest! {
        #[test]
        fn prop_distance_is_symmetric(
            lat1 in -90.0f64..=90.0, lon1 in -180.0f64..=180.0,
            lat2 in -90.0f64..=90.0, lon2 in -180.0f64..=180.0,
        ) {
            let (a, b) = (c(lat1, lon1), c(lat2, lon2));
            prop_assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-6);
            prop_assert!(distance(&a, &b) <= PI * EARTH_RADIUS_M + 1e-6);
        }

        #[test]
        fn prop_distance_to_self_is_zero(lat in -90.0f64..=90.0, lon in -180.0f64..=180.0) {
            let p = c(lat, lon);
            prop_assert_eq!(distance(&p, &p), 0.0);
        }
    }
}
