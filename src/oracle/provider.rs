//! Distance and elevation providers.
//!
//! A provider is the raw data source behind a [`CachedOracle`](super::CachedOracle):
//! a routing service, a closed-form metric, or a test double. Providers
//! may fail; the oracle owns retries, fallback, and caching.

use crate::models::Coordinate;

/// Source of travel distances between coordinates.
///
/// Returned values must be non-negative; `f64::INFINITY` marks an
/// unreachable pair.
pub trait DistanceProvider: Send + Sync {
    /// Distance matrix `sources × destinations` in one request.
    fn table(
        &self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
    ) -> anyhow::Result<Vec<Vec<f64>>>;

    /// Distance for a single pair.
    fn route(&self, from: Coordinate, to: Coordinate) -> anyhow::Result<f64>;

    /// Whether `d(a, b) == d(b, a)` may be assumed.
    fn is_symmetric(&self) -> bool {
        true
    }
}

/// Source of terrain elevations (meters above sea level).
pub trait ElevationSource: Send + Sync {
    /// Elevation for each point, in input order.
    fn elevations(&self, points: &[Coordinate]) -> anyhow::Result<Vec<f64>>;
}

/// Straight-line distance in coordinate units.
///
/// Intended for planar benchmark instances.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::Coordinate;
/// use u_tabu_routing::oracle::{DistanceProvider, PlanarProvider};
///
/// let d = PlanarProvider
///     .route(Coordinate::planar(0.0, 0.0), Coordinate::planar(3.0, 4.0))
///     .unwrap();
/// assert!((d - 5.0).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanarProvider;

impl DistanceProvider for PlanarProvider {
    fn table(
        &self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
    ) -> anyhow::Result<Vec<Vec<f64>>> {
        Ok(metric_table(sources, destinations, Coordinate::euclidean))
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> anyhow::Result<f64> {
        Ok(from.euclidean(&to))
    }
}

/// Great-circle distance in kilometers.
///
/// A network-free stand-in for a road routing service.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeodesicProvider;

impl DistanceProvider for GeodesicProvider {
    fn table(
        &self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
    ) -> anyhow::Result<Vec<Vec<f64>>> {
        Ok(metric_table(sources, destinations, Coordinate::haversine_km))
    }

    fn route(&self, from: Coordinate, to: Coordinate) -> anyhow::Result<f64> {
        Ok(from.haversine_km(&to))
    }
}

fn metric_table(
    sources: &[Coordinate],
    destinations: &[Coordinate],
    metric: fn(&Coordinate, &Coordinate) -> f64,
) -> Vec<Vec<f64>> {
    sources
        .iter()
        .map(|s| destinations.iter().map(|d| metric(s, d)).collect())
        .collect()
}
