//! Shared fixtures for unit tests.

use crate::models::{Coordinate, Customer, ProblemInstance};
use crate::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};

/// Planar instance with the depot at the origin; `customers` are `(x, y, demand)`.
pub(crate) fn planar_instance(
    customers: &[(f64, f64, f64)],
    capacity: f64,
    fleet: usize,
) -> ProblemInstance {
    let customers = customers
        .iter()
        .enumerate()
        .map(|(i, &(x, y, d))| Customer::new(i + 1, Coordinate::planar(x, y), d))
        .collect();
    ProblemInstance::new(Coordinate::planar(0.0, 0.0), customers, capacity, fleet)
        .expect("valid instance")
}

/// Customers on a ring of the given radius, unit demand each.
pub(crate) fn ring_instance(n: usize, radius: f64, capacity: f64, fleet: usize) -> ProblemInstance {
    let points: Vec<(f64, f64, f64)> = (0..n)
        .map(|i| {
            let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
            (radius * angle.cos(), radius * angle.sin(), 1.0)
        })
        .collect();
    planar_instance(&points, capacity, fleet)
}

/// Euclidean oracle with every pair of `instance` precomputed.
pub(crate) fn planar_oracle(instance: &ProblemInstance) -> CachedOracle<PlanarProvider> {
    let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
    assert!(oracle.precompute(instance));
    oracle
}
