//! Geographic coordinates and their quantized cache keys.

use serde::{Deserialize, Serialize};

/// Quantization step for coordinate keys (1e-6 degrees ≈ 11 cm).
const KEY_SCALE: f64 = 1e6;

/// A location given as latitude and longitude.
///
/// For planar instances (e.g. Solomon benchmarks) `lon` carries the x
/// coordinate and `lat` the y coordinate.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::Coordinate;
///
/// let a = Coordinate::new(37.5665, 126.9780);
/// assert_eq!(a.lat(), 37.5665);
/// assert_eq!(a.key(), Coordinate::new(37.5665000001, 126.9780).key());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    lat: f64,
    lon: f64,
}

impl Coordinate {
    /// Creates a coordinate from latitude and longitude.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Creates a coordinate from planar `(x, y)`.
    pub fn planar(x: f64, y: f64) -> Self {
        Self { lat: y, lon: x }
    }

    /// Latitude (or y).
    pub fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude (or x).
    pub fn lon(&self) -> f64 {
        self.lon
    }

    /// Returns `true` if both components are finite.
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }

    /// Quantized, hashable key for cache lookups.
    pub fn key(&self) -> CoordKey {
        CoordKey(
            (self.lat * KEY_SCALE).round() as i64,
            (self.lon * KEY_SCALE).round() as i64,
        )
    }

    /// Euclidean distance in coordinate units.
    pub fn euclidean(&self, other: &Coordinate) -> f64 {
        let dx = self.lon - other.lon;
        let dy = self.lat - other.lat;
        (dx * dx + dy * dy).sqrt()
    }

    /// Great-circle distance in kilometers (haversine).
    pub fn haversine_km(&self, other: &Coordinate) -> f64 {
        const EARTH_RADIUS_KM: f64 = 6371.0;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
    }
}

/// A coordinate quantized to 1e-6 degrees, usable as a hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CoordKey(pub i64, pub i64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_quantization() {
        let a = Coordinate::new(1.0000001, 2.0);
        let b = Coordinate::new(1.0000002, 2.0);
        assert_eq!(a.key(), b.key());
        let c = Coordinate::new(1.000002, 2.0);
        assert_ne!(a.key(), c.key());
    }

    #[test]
    fn test_euclidean() {
        let a = Coordinate::planar(0.0, 0.0);
        let b = Coordinate::planar(3.0, 4.0);
        assert!((a.euclidean(&b) - 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_haversine_one_degree_latitude() {
        let a = Coordinate::new(0.0, 0.0);
        let b = Coordinate::new(1.0, 0.0);
        // 2πR/360 ≈ 111.195 km
        assert!((a.haversine_km(&b) - 111.195).abs() < 0.01);
        assert!((a.haversine_km(&b) - b.haversine_km(&a)).abs() < 1e-12);
    }

    #[test]
    fn test_haversine_same_point() {
        let a = Coordinate::new(37.5, 127.0);
        assert_eq!(a.haversine_km(&a), 0.0);
    }
}
