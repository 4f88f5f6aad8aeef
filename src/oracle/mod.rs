//! Cost oracle: distance and cost lookups between coordinates.
//!
//! The search only ever talks to a [`CostOracle`]. All network I/O is
//! front-loaded into [`CostOracle::precompute`], so lookups inside the
//! search loop are pure cache reads. A pair that cannot be resolved
//! costs `f64::INFINITY`, which every consumer treats as infeasible.
//!
//! - [`CachedOracle`] — cache + bulk precompute + retry/fallback over any
//!   [`DistanceProvider`]
//! - [`PlanarProvider`], [`GeodesicProvider`] — closed-form metrics
//! - [`TerrainModel`] — optional load and grade effects folded into `cost`
//! - `OsrmProvider`, `OpenElevationProvider` — HTTP services (feature `http`)

mod cache;
mod cached;
#[cfg(feature = "http")]
mod http;
mod provider;
mod terrain;

pub use cache::CostCache;
pub use cached::{CachedOracle, OracleConfig};
#[cfg(feature = "http")]
pub use http::{OpenElevationProvider, OsrmProvider};
pub use provider::{DistanceProvider, ElevationSource, GeodesicProvider, PlanarProvider};
pub use terrain::{ElevationProfile, TerrainModel};

use crate::models::{Coordinate, ProblemInstance};

/// Distance/cost provider used by the search.
///
/// Implementations must be safe to query from many threads at once; the
/// parallel evaluator shares one oracle across its workers.
pub trait CostOracle: Send + Sync {
    /// Travel distance from `a` to `b`, or `f64::INFINITY` if unknown or
    /// unreachable.
    fn distance(&self, a: Coordinate, b: Coordinate) -> f64;

    /// Travel cost from `a` to `b` carrying `load`.
    ///
    /// Must be `>= distance(a, b)`, non-decreasing in distance for a fixed
    /// load, and equal to `distance` when no terrain model applies.
    fn cost(&self, a: Coordinate, b: Coordinate, load: f64) -> f64 {
        let _ = load;
        self.distance(a, b)
    }

    /// Resolves every pair of the instance's locations ahead of the search.
    ///
    /// Returns `false` if no distances could be obtained at all; the caller
    /// must not optimize in that case.
    fn precompute(&mut self, instance: &ProblemInstance) -> bool;
}
