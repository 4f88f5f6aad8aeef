//! End-to-end runs of the optimizer against in-process providers.

use std::sync::atomic::{AtomicUsize, Ordering};

use proptest::prelude::*;
use u_tabu_routing::error::OptimizeError;
use u_tabu_routing::models::{is_permutation, Coordinate, Customer, ProblemInstance};
use u_tabu_routing::oracle::{CachedOracle, CostOracle, DistanceProvider, OracleConfig, PlanarProvider};
use u_tabu_routing::search::{optimize, SearchConfig, SearchController};

fn instance(points: &[(f64, f64, f64)], capacity: f64, fleet: usize) -> ProblemInstance {
    let customers = points
        .iter()
        .enumerate()
        .map(|(i, &(x, y, d))| Customer::new(i + 1, Coordinate::planar(x, y), d))
        .collect();
    ProblemInstance::new(Coordinate::planar(0.0, 0.0), customers, capacity, fleet)
        .expect("valid instance")
}

fn planar_oracle() -> CachedOracle<PlanarProvider> {
    CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay())
}

fn config(seed: u64) -> SearchConfig {
    SearchConfig::default()
        .with_max_generations(120)
        .with_threads(2)
        .with_seed(seed)
}

#[test]
fn test_four_customers_fit_one_route() {
    let inst = instance(
        &[(2.0, 1.0, 3.0), (-1.0, 2.0, 3.0), (-2.0, -1.0, 3.0), (1.0, -2.0, 3.0)],
        100.0,
        3,
    );
    let mut oracle = planar_oracle();
    let outcome = optimize(&inst, &mut oracle, &config(1)).expect("feasible");

    assert_eq!(outcome.solution.num_routes(), 1);
    let mut served = outcome.solution.routes()[0].customers().to_vec();
    served.sort_unstable();
    assert_eq!(served, vec![1, 2, 3, 4]);
}

#[test]
fn test_six_customers_need_two_routes() {
    // Total demand 30 with capacity 15: at least two vehicles, and two
    // groups of three customers fill them exactly.
    let inst = instance(
        &[
            (5.0, 1.0, 5.0),
            (6.0, 0.0, 5.0),
            (5.0, -1.0, 5.0),
            (-5.0, 1.0, 5.0),
            (-6.0, 0.0, 5.0),
            (-5.0, -1.0, 5.0),
        ],
        15.0,
        4,
    );
    let mut oracle = planar_oracle();
    let outcome = optimize(&inst, &mut oracle, &config(2)).expect("feasible");

    assert_eq!(outcome.solution.num_routes(), 2);
    for route in outcome.solution.routes() {
        let load: f64 = route.customers().iter().map(|&id| inst.demand(id)).sum();
        assert!(load <= inst.vehicle_capacity());
        assert_eq!(load, route.load());
    }
    assert_eq!(outcome.solution.num_served(), 6);
}

#[test]
fn test_fleet_below_minimum_has_no_solution() {
    let inst = instance(
        &[(1.0, 0.0, 8.0), (2.0, 0.0, 8.0), (3.0, 0.0, 8.0), (4.0, 0.0, 8.0)],
        10.0,
        3,
    );
    let mut oracle = planar_oracle();
    let err = optimize(&inst, &mut oracle, &config(3)).expect_err("fleet too small");
    assert!(matches!(err, OptimizeError::NoFeasibleSolution { .. }));
    assert!(err.remediation().contains("capacity"));
}

#[test]
fn test_no_split_fits_fleet_fails_after_search() {
    // Total demand 18 needs two vehicles of capacity 10, but no two of
    // these customers share a vehicle, so every split uses three.
    let inst = instance(&[(1.0, 0.0, 6.0), (0.0, 1.0, 6.0), (-1.0, 0.0, 6.0)], 10.0, 2);
    assert_eq!(inst.min_vehicles(), 2);

    let mut oracle = planar_oracle();
    let config = config(5).with_max_generations(40);
    let err = optimize(&inst, &mut oracle, &config).expect_err("no split fits");
    match err {
        OptimizeError::NoFeasibleSolution { reason } => assert!(reason.contains("generations")),
        other => panic!("expected NoFeasibleSolution, got {other:?}"),
    }
}

/// A provider that is reachable but knows no routes.
struct Outage;

impl DistanceProvider for Outage {
    fn table(
        &self,
        sources: &[Coordinate],
        destinations: &[Coordinate],
    ) -> anyhow::Result<Vec<Vec<f64>>> {
        Ok(vec![vec![f64::INFINITY; destinations.len()]; sources.len()])
    }

    fn route(&self, _from: Coordinate, _to: Coordinate) -> anyhow::Result<f64> {
        Ok(f64::INFINITY)
    }
}

/// A provider whose every request fails.
struct Unreachable;

impl DistanceProvider for Unreachable {
    fn table(&self, _: &[Coordinate], _: &[Coordinate]) -> anyhow::Result<Vec<Vec<f64>>> {
        anyhow::bail!("connection refused")
    }

    fn route(&self, _: Coordinate, _: Coordinate) -> anyhow::Result<f64> {
        anyhow::bail!("connection refused")
    }
}

/// Counts lookups made after precompute.
struct Counting<O> {
    inner: O,
    lookups: AtomicUsize,
}

impl<O: CostOracle> CostOracle for Counting<O> {
    fn distance(&self, a: Coordinate, b: Coordinate) -> f64 {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        self.inner.distance(a, b)
    }

    fn precompute(&mut self, instance: &ProblemInstance) -> bool {
        self.inner.precompute(instance)
    }
}

#[test]
fn test_oracle_outage_aborts_before_search() {
    let inst = instance(&[(1.0, 0.0, 1.0), (2.0, 0.0, 1.0), (3.0, 0.0, 1.0)], 10.0, 1);

    let mut outage = Counting {
        inner: CachedOracle::new(Outage).with_config(OracleConfig::no_delay()),
        lookups: AtomicUsize::new(0),
    };
    let err = optimize(&inst, &mut outage, &config(4)).expect_err("no distances");
    assert!(matches!(err, OptimizeError::OracleUnavailable));
    assert_eq!(outage.lookups.load(Ordering::Relaxed), 0);

    let mut down = CachedOracle::new(Unreachable).with_config(OracleConfig::no_delay());
    assert!(!down.precompute(&inst));
    let err = optimize(&inst, &mut down, &config(4)).expect_err("no distances");
    assert!(matches!(err, OptimizeError::OracleUnavailable));
}

fn twenty_customers() -> ProblemInstance {
    let points: Vec<(f64, f64, f64)> = (0..20)
        .map(|i| {
            let angle = i as f64 * 2.4;
            let radius = 5.0 + (i % 7) as f64 * 3.0;
            (radius * angle.cos(), radius * angle.sin(), 1.0 + (i % 4) as f64)
        })
        .collect();
    instance(&points, 15.0, 6)
}

#[test]
fn test_same_seed_same_solution() {
    let inst = twenty_customers();
    let mut oracle = planar_oracle();
    assert!(oracle.precompute(&inst));

    let first = SearchController::new(&inst, &oracle, config(2024))
        .expect("valid")
        .run()
        .expect("feasible");
    let second = SearchController::new(&inst, &oracle, config(2024))
        .expect("valid")
        .run()
        .expect("feasible");
    assert_eq!(first.solution, second.solution);
    assert_eq!(first.objective, second.objective);
    assert_eq!(first.history, second.history);

    // Worker count does not change the result.
    let wide = SearchController::new(&inst, &oracle, config(2024).with_threads(4))
        .expect("valid")
        .run()
        .expect("feasible");
    assert_eq!(first.solution, wide.solution);
}

#[test]
fn test_best_never_worsens() {
    let inst = twenty_customers();
    let mut oracle = planar_oracle();
    let outcome = optimize(&inst, &mut oracle, &config(8)).expect("feasible");
    assert!(!outcome.history.is_empty());
    for pair in outcome.history.windows(2) {
        assert!(pair[1] <= pair[0]);
    }
    assert!(is_permutation(&outcome.tour, 20));
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn prop_solutions_respect_capacity_and_fleet(
        demands in prop::collection::vec(1u32..=6, 3..12),
        seed in 0u64..1000,
    ) {
        let points: Vec<(f64, f64, f64)> = demands
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                let angle = i as f64 * 1.3;
                (8.0 * angle.cos(), 8.0 * angle.sin(), d as f64)
            })
            .collect();
        let capacity = 10.0;
        // One vehicle per customer always fits, since no demand exceeds capacity.
        let fleet = points.len();
        let inst = instance(&points, capacity, fleet);

        let mut oracle = planar_oracle();
        let config = SearchConfig::default()
            .with_max_generations(25)
            .with_threads(1)
            .with_seed(seed);
        let outcome = optimize(&inst, &mut oracle, &config).expect("feasible");

        prop_assert!(outcome.solution.num_routes() <= fleet);
        prop_assert_eq!(outcome.solution.num_served(), points.len());
        prop_assert!(is_permutation(&outcome.tour, points.len()));
        for route in outcome.solution.routes() {
            prop_assert!(route.load() <= capacity + 1e-9);
        }
    }
}
