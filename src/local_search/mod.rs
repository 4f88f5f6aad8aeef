//! k-opt descent over giant tours.
//!
//! - [`two_opt`] — segment reversal, O(n²) moves per scan
//! - [`three_opt`] — four segment reconnections, O(n³) moves per scan
//!
//! Both score every move with the full decoded objective. Path-length
//! deltas only decide the order in which moves are tried.

mod three_opt;
mod two_opt;

use crate::decoder::RouteDecoder;
use crate::distance::DistanceMatrix;
use crate::models::{ProblemInstance, Tour};
use crate::oracle::CostOracle;

/// Result of one refinement call.
#[derive(Debug, Clone, PartialEq)]
pub struct Refinement {
    /// The refined tour (the input tour if nothing improved).
    pub tour: Tour,
    /// Objective of `tour`.
    pub objective: f64,
    /// Number of applied moves.
    pub moves: usize,
}

/// First-improvement k-opt refiner.
///
/// `k <= 2` runs 2-opt, anything larger runs 3-opt. The refined tour is
/// always a permutation of the input and never scores worse.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::decoder::RouteDecoder;
/// use u_tabu_routing::local_search::LocalSearchRefiner;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};
///
/// let customers = (1..=4)
///     .map(|i| Customer::new(i, Coordinate::planar(i as f64, 0.0), 1.0))
///     .collect();
/// let instance =
///     ProblemInstance::new(Coordinate::planar(0.0, 0.0), customers, 10.0, 1).unwrap();
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
/// assert!(oracle.precompute(&instance));
///
/// let refiner = LocalSearchRefiner::new(RouteDecoder::default());
/// let refined = refiner.refine(&[1, 3, 2, 4], &instance, &oracle, 2);
/// let decoder = RouteDecoder::default();
/// assert!(
///     decoder.evaluate(&refined, &instance, &oracle)
///         < decoder.evaluate(&[1, 3, 2, 4], &instance, &oracle)
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LocalSearchRefiner {
    decoder: RouteDecoder,
}

impl LocalSearchRefiner {
    /// Creates a refiner scoring tours with `decoder`.
    pub fn new(decoder: RouteDecoder) -> Self {
        Self { decoder }
    }

    /// Refines `tour` with k-opt descent and returns the improved tour.
    pub fn refine<O: CostOracle + ?Sized>(
        &self,
        tour: &[usize],
        instance: &ProblemInstance,
        oracle: &O,
        k: usize,
    ) -> Tour {
        let start = self.decoder.evaluate(tour, instance, oracle);
        self.refine_scored(tour, start, instance, oracle, k).tour
    }

    /// Like [`refine`](Self::refine), starting from a known objective.
    #[tracing::instrument(level = "debug", skip_all, fields(n = tour.len(), k = k))]
    pub fn refine_scored<O: CostOracle + ?Sized>(
        &self,
        tour: &[usize],
        objective: f64,
        instance: &ProblemInstance,
        oracle: &O,
        k: usize,
    ) -> Refinement {
        let dm = DistanceMatrix::from_oracle(instance, oracle);
        let decoder = self.decoder;
        let mut evaluate = |t: &[usize]| decoder.evaluate(t, instance, oracle);

        let (tour, value, moves) = if k <= 2 {
            two_opt::two_opt_descent(tour, objective, &dm, &mut evaluate)
        } else {
            three_opt::three_opt_descent(tour, objective, &dm, &mut evaluate)
        };

        if moves > 0 {
            tracing::debug!(moves, before = objective, after = value, "k-opt improved tour");
        }
        Refinement {
            tour,
            objective: value,
            moves,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::is_permutation;
    use crate::test_support::{planar_instance, planar_oracle, ring_instance};
    use proptest::prelude::*;

    /// Eight customers with mixed demands, so tours split into several routes.
    fn mixed_demand_instance() -> ProblemInstance {
        planar_instance(
            &[
                (4.0, 1.0, 3.0),
                (-2.0, 5.0, 5.0),
                (6.0, -3.0, 2.0),
                (-5.0, -4.0, 4.0),
                (1.0, 7.0, 1.0),
                (-7.0, 2.0, 5.0),
                (3.0, -6.0, 3.0),
                (8.0, 4.0, 4.0),
            ],
            10.0,
            8,
        )
    }

    fn best_reversal(tour: &[usize], inst: &ProblemInstance, oracle: &impl CostOracle) -> f64 {
        let decoder = RouteDecoder::default();
        let mut best = f64::INFINITY;
        for i in 0..tour.len() {
            for j in i + 1..tour.len() {
                let mut moved = tour.to_vec();
                moved[i..=j].reverse();
                best = best.min(decoder.evaluate(&moved, inst, oracle));
            }
        }
        best
    }

    #[test]
    fn test_refine_improves_scrambled_ring() {
        let inst = ring_instance(12, 10.0, 100.0, 1);
        let oracle = planar_oracle(&inst);
        let refiner = LocalSearchRefiner::default();
        let decoder = RouteDecoder::default();

        let scrambled = vec![1, 7, 2, 8, 3, 9, 4, 10, 5, 11, 6, 12];
        let before = decoder.evaluate(&scrambled, &inst, &oracle);
        for k in [2, 3] {
            let refined = refiner.refine_scored(&scrambled, before, &inst, &oracle, k);
            assert!(refined.objective < before, "k={k}");
            assert!(is_permutation(&refined.tour, 12));
            assert!((decoder.evaluate(&refined.tour, &inst, &oracle) - refined.objective).abs() < 1e-9);
        }
    }

    #[test]
    fn test_refine_empty_and_single() {
        let inst = ring_instance(1, 1.0, 10.0, 1);
        let oracle = planar_oracle(&inst);
        let refiner = LocalSearchRefiner::default();
        assert_eq!(refiner.refine(&[1], &inst, &oracle, 3), vec![1]);

        let empty = ring_instance(0, 1.0, 10.0, 1);
        let oracle = planar_oracle(&empty);
        assert!(refiner.refine(&[], &empty, &oracle, 2).is_empty());
    }

    #[test]
    fn test_refine_never_worsens_multi_route() {
        let inst = ring_instance(10, 5.0, 3.0, 4);
        let oracle = planar_oracle(&inst);
        let refiner = LocalSearchRefiner::default();
        let decoder = RouteDecoder::default();
        let tour = vec![5, 1, 9, 3, 7, 2, 10, 4, 8, 6];
        let before = decoder.evaluate(&tour, &inst, &oracle);
        let refined = refiner.refine(&tour, &inst, &oracle, 3);
        assert!(decoder.evaluate(&refined, &inst, &oracle) <= before);
    }

    #[test]
    fn test_refined_multi_route_tour_has_no_improving_reversal() {
        let inst = mixed_demand_instance();
        let oracle = planar_oracle(&inst);
        let refiner = LocalSearchRefiner::default();
        let tour = vec![4, 1, 3, 5, 8, 6, 2, 7];
        let start = RouteDecoder::default().evaluate(&tour, &inst, &oracle);
        for k in [2, 3] {
            let refined = refiner.refine_scored(&tour, start, &inst, &oracle, k);
            assert!(refined.objective.is_finite());
            assert!(
                best_reversal(&refined.tour, &inst, &oracle) >= refined.objective,
                "k={k}: {:?} still has an improving reversal",
                refined.tour
            );
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        #[test]
        fn prop_two_opt_leaves_no_improving_reversal(perm in Just((1..=8).collect::<Vec<usize>>()).prop_shuffle()) {
            let inst = mixed_demand_instance();
            let oracle = planar_oracle(&inst);
            let refined = LocalSearchRefiner::default().refine(&perm, &inst, &oracle, 2);
            let value = RouteDecoder::default().evaluate(&refined, &inst, &oracle);
            prop_assert!(best_reversal(&refined, &inst, &oracle) >= value);
        }

        #[test]
        fn prop_refine_preserves_permutation(perm in Just((1..=9).collect::<Vec<usize>>()).prop_shuffle(), k in 2usize..=3) {
            let inst = ring_instance(9, 4.0, 4.0, 3);
            let oracle = planar_oracle(&inst);
            let decoder = RouteDecoder::default();
            let refined = LocalSearchRefiner::default().refine(&perm, &inst, &oracle, k);
            prop_assert!(is_permutation(&refined, 9));
            prop_assert!(
                decoder.evaluate(&refined, &inst, &oracle) <= decoder.evaluate(&perm, &inst, &oracle)
            );
        }
    }
}
