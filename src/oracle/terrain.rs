//! Load- and grade-aware cost model.
//!
//! Travel cost is distance scaled by a gross-weight factor, plus a climb
//! penalty for the ascent between the two endpoints:
//!
//! ```text
//! g    = 1 + load_factor · load
//! cost = g · (distance + climb_weight · ascent_m / 1000)
//! ```
//!
//! With non-negative factors, `cost ≥ distance` and `cost` is
//! non-decreasing in `distance` for a fixed load and ascent. Descents are
//! not credited.

use rustc_hash::FxHashMap;

use super::provider::ElevationSource;
use crate::models::{CoordKey, Coordinate};

/// Elevation change between two points, in meters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ElevationProfile {
    pub ascent: f64,
    pub descent: f64,
}

/// Terrain model folded into [`CostOracle::cost`](super::CostOracle::cost).
///
/// Elevations are fetched once per point during precompute; points with
/// no known elevation contribute no climb.
pub struct TerrainModel {
    source: Box<dyn ElevationSource>,
    load_factor: f64,
    climb_weight: f64,
    elevations: FxHashMap<CoordKey, f64>,
}

impl std::fmt::Debug for TerrainModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TerrainModel")
            .field("load_factor", &self.load_factor)
            .field("climb_weight", &self.climb_weight)
            .field("elevations", &self.elevations.len())
            .finish()
    }
}

impl TerrainModel {
    /// Creates a model with `load_factor = 0.001` per demand unit and
    /// `climb_weight = 10` (one meter of ascent costs ten meters of travel).
    pub fn new(source: impl ElevationSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            load_factor: 0.001,
            climb_weight: 10.0,
            elevations: FxHashMap::default(),
        }
    }

    /// Sets the gross-weight factor per unit of load. Negative values clamp to 0.
    pub fn with_load_factor(mut self, factor: f64) -> Self {
        self.load_factor = factor.max(0.0);
        self
    }

    /// Sets the weight of ascent relative to distance. Negative values clamp to 0.
    pub fn with_climb_weight(mut self, weight: f64) -> Self {
        self.climb_weight = weight.max(0.0);
        self
    }

    pub fn load_factor(&self) -> f64 {
        self.load_factor
    }

    pub fn climb_weight(&self) -> f64 {
        self.climb_weight
    }

    /// Fetches elevations for points not yet known. Returns how many are known afterwards.
    pub(crate) fn prefetch(&mut self, points: &[Coordinate]) -> anyhow::Result<usize> {
        let missing: Vec<Coordinate> = points
            .iter()
            .filter(|p| !self.elevations.contains_key(&p.key()))
            .copied()
            .collect();
        if !missing.is_empty() {
            let values = self.source.elevations(&missing)?;
            anyhow::ensure!(
                values.len() == missing.len(),
                "elevation source returned {} values for {} points",
                values.len(),
                missing.len()
            );
            for (p, v) in missing.iter().zip(values) {
                if v.is_finite() {
                    self.elevations.insert(p.key(), v);
                }
            }
        }
        Ok(points
            .iter()
            .filter(|p| self.elevations.contains_key(&p.key()))
            .count())
    }

    /// Elevation at `p`, if known.
    pub fn elevation(&self, p: Coordinate) -> Option<f64> {
        self.elevations.get(&p.key()).copied()
    }

    /// Ascent and descent from `a` to `b`. Unknown elevations yield zero.
    pub fn profile(&self, a: Coordinate, b: Coordinate) -> ElevationProfile {
        match (self.elevation(a), self.elevation(b)) {
            (Some(ea), Some(eb)) => {
                let diff = eb - ea;
                ElevationProfile {
                    ascent: diff.max(0.0),
                    descent: (-diff).max(0.0),
                }
            }
            _ => ElevationProfile::default(),
        }
    }

    /// Cost of travelling `distance` from `a` to `b` carrying `load`.
    pub fn cost(&self, distance: f64, a: Coordinate, b: Coordinate, load: f64) -> f64 {
        let gross = 1.0 + self.load_factor * load.max(0.0);
        let climb = self.climb_weight * self.profile(a, b).ascent / 1000.0;
        gross * (distance + climb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Elevation equals latitude × 100 m.
    struct Slope;

    impl ElevationSource for Slope {
        fn elevations(&self, points: &[Coordinate]) -> anyhow::Result<Vec<f64>> {
            Ok(points.iter().map(|p| p.lat() * 100.0).collect())
        }
    }

    struct Broken;

    impl ElevationSource for Broken {
        fn elevations(&self, _points: &[Coordinate]) -> anyhow::Result<Vec<f64>> {
            anyhow::bail!("service down")
        }
    }

    fn points() -> (Coordinate, Coordinate) {
        (Coordinate::new(0.0, 0.0), Coordinate::new(2.0, 0.0))
    }

    #[test]
    fn test_profile_uphill_and_downhill() {
        let (low, high) = points();
        let mut model = TerrainModel::new(Slope);
        assert_eq!(model.prefetch(&[low, high]).expect("fetch"), 2);
        let up = model.profile(low, high);
        assert!((up.ascent - 200.0).abs() < 1e-9);
        assert_eq!(up.descent, 0.0);
        let down = model.profile(high, low);
        assert_eq!(down.ascent, 0.0);
        assert!((down.descent - 200.0).abs() < 1e-9);
    }

    #[test]
    fn test_cost_at_least_distance_and_monotone() {
        let (low, high) = points();
        let mut model = TerrainModel::new(Slope)
            .with_load_factor(0.01)
            .with_climb_weight(5.0);
        model.prefetch(&[low, high]).expect("fetch");
        for load in [0.0, 10.0, 100.0] {
            let mut prev = 0.0;
            for d in [0.0, 0.5, 1.0, 10.0, 250.0] {
                let c = model.cost(d, low, high, load);
                assert!(c >= d);
                assert!(c >= prev);
                prev = c;
            }
        }
    }

    #[test]
    fn test_zero_factors_equal_distance() {
        let (low, high) = points();
        let mut model = TerrainModel::new(Slope)
            .with_load_factor(0.0)
            .with_climb_weight(0.0);
        model.prefetch(&[low, high]).expect("fetch");
        assert_eq!(model.cost(12.5, low, high, 40.0), 12.5);
    }

    #[test]
    fn test_negative_factors_clamped() {
        let model = TerrainModel::new(Slope)
            .with_load_factor(-1.0)
            .with_climb_weight(-3.0);
        assert_eq!(model.load_factor(), 0.0);
        assert_eq!(model.climb_weight(), 0.0);
    }

    #[test]
    fn test_unknown_elevation_means_no_climb() {
        let (low, high) = points();
        let mut model = TerrainModel::new(Broken).with_load_factor(0.0);
        assert!(model.prefetch(&[low, high]).is_err());
        assert_eq!(model.cost(3.0, low, high, 0.0), 3.0);
    }

    proptest! {
        #[test]
        fn prop_cost_non_decreasing_in_distance(
            d1 in 0.0f64..1e4,
            d2 in 0.0f64..1e4,
            load in 0.0f64..500.0,
            load_factor in 0.0f64..0.1,
            climb_weight in 0.0f64..50.0,
            lat_a in -5.0f64..5.0,
            lat_b in -5.0f64..5.0,
        ) {
            let (a, b) = (Coordinate::new(lat_a, 0.0), Coordinate::new(lat_b, 1.0));
            let mut model = TerrainModel::new(Slope)
                .with_load_factor(load_factor)
                .with_climb_weight(climb_weight);
            model.prefetch(&[a, b]).expect("fetch");

            let (near, far) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            prop_assert!(model.cost(near, a, b, load) <= model.cost(far, a, b, load));
            prop_assert!(model.cost(near, a, b, load) >= near);
        }
    }
}
