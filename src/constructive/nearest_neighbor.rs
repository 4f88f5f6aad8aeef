//! Greedy giant-tour constructions: nearest-neighbor, farthest-first and
//! load-balanced.
//!
//! All three walk from the depot, always extending the current route with
//! the nearest unvisited customer that still fits the vehicle. They differ
//! in how a route is seeded and when it is closed:
//!
//! | Heuristic        | Route seed                   | Route closed when            |
//! |------------------|------------------------------|------------------------------|
//! | nearest-neighbor | nearest to the depot         | nothing else fits            |
//! | farthest-first   | farthest from the depot      | nothing else fits            |
//! | balanced         | nearest to the depot         | load reaches total / routes  |
//!
//! Concatenating the routes gives the giant tour. Ties go to the lowest id,
//! so the result depends only on the instance.
//!
//! # Complexity
//!
//! O(n²) where n = number of customers.

use crate::distance::DistanceMatrix;
use crate::models::{ProblemInstance, Tour};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteSeed {
    Nearest,
    Farthest,
}

/// Giant tour built by capacity-aware nearest-neighbor.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::constructive::nearest_neighbor;
/// use u_tabu_routing::distance::DistanceMatrix;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(1, Coordinate::planar(3.0, 0.0), 1.0),
///         Customer::new(2, Coordinate::planar(1.0, 0.0), 1.0),
///         Customer::new(3, Coordinate::planar(2.0, 0.0), 1.0),
///     ],
///     10.0,
///     1,
/// )
/// .unwrap();
/// let mut dm = DistanceMatrix::new(4);
/// let xs: [f64; 4] = [0.0, 3.0, 1.0, 2.0];
/// for i in 0..4 {
///     for j in 0..4 {
///         dm.set(i, j, (xs[i] - xs[j]).abs());
///     }
/// }
///
/// assert_eq!(nearest_neighbor(&instance, &dm), vec![2, 3, 1]);
/// ```
pub fn nearest_neighbor(instance: &ProblemInstance, distances: &DistanceMatrix) -> Tour {
    greedy_tour(instance, distances, RouteSeed::Nearest, f64::INFINITY)
}

/// Giant tour whose routes each start at the farthest unvisited customer.
pub fn farthest_first(instance: &ProblemInstance, distances: &DistanceMatrix) -> Tour {
    greedy_tour(instance, distances, RouteSeed::Farthest, f64::INFINITY)
}

/// Nearest-neighbor with routes closed once they carry an even share of
/// the total demand.
///
/// The share is `total_demand / m` with `m` the minimum vehicle count,
/// clamped to the fleet bound.
pub fn balanced(instance: &ProblemInstance, distances: &DistanceMatrix) -> Tour {
    let routes = instance
        .min_vehicles()
        .clamp(1, instance.max_vehicle_count().max(1));
    let share = instance.total_demand() / routes as f64;
    let limit = if share > 0.0 { share } else { f64::INFINITY };
    greedy_tour(instance, distances, RouteSeed::Nearest, limit)
}

fn greedy_tour(
    instance: &ProblemInstance,
    distances: &DistanceMatrix,
    seed: RouteSeed,
    load_limit: f64,
) -> Tour {
    let n = instance.num_customers();
    let capacity = instance.vehicle_capacity();
    let mut visited = vec![false; n + 1];
    let mut tour = Vec::with_capacity(n);
    let mut current = 0;
    let mut load = 0.0;

    while tour.len() < n {
        let next = if current == 0 && seed == RouteSeed::Farthest {
            farthest_unvisited(distances, &visited)
        } else {
            nearest_fitting(instance, distances, &visited, current, capacity - load)
        };

        match next {
            Some(id) => {
                visited[id] = true;
                tour.push(id);
                load += instance.demand(id);
                current = id;
                if load >= load_limit {
                    current = 0;
                    load = 0.0;
                }
            }
            // Nothing fits: back to the depot with an empty vehicle. Every
            // demand fits an empty vehicle, so the next pick succeeds.
            None => {
                current = 0;
                load = 0.0;
            }
        }
    }
    tour
}

fn nearest_fitting(
    instance: &ProblemInstance,
    distances: &DistanceMatrix,
    visited: &[bool],
    from: usize,
    room: f64,
) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for id in 1..visited.len() {
        if visited[id] || instance.demand(id) > room {
            continue;
        }
        let d = distances.get(from, id);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((id, d)),
        }
    }
    best.map(|(id, _)| id)
}

fn farthest_unvisited(distances: &DistanceMatrix, visited: &[bool]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for id in 1..visited.len() {
        if visited[id] {
            continue;
        }
        // Unreachable customers rank last rather than farthest.
        let d = distances.get(0, id);
        let d = if d.is_finite() { d } else { -1.0 };
        match best {
            Some((_, best_d)) if d <= best_d => {}
            _ => best = Some((id, d)),
        }
    }
    best.map(|(id, _)| id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RouteDecoder;
    use crate::models::is_permutation;
    use crate::test_support::{planar_instance, planar_oracle, ring_instance};

    fn matrix(instance: &ProblemInstance) -> DistanceMatrix {
        DistanceMatrix::from_oracle(instance, &planar_oracle(instance))
    }

    #[test]
    fn test_nn_line_order() {
        let inst = planar_instance(
            &[(3.0, 0.0, 1.0), (1.0, 0.0, 1.0), (2.0, 0.0, 1.0)],
            10.0,
            1,
        );
        assert_eq!(nearest_neighbor(&inst, &matrix(&inst)), vec![2, 3, 1]);
    }

    #[test]
    fn test_nn_respects_capacity_boundaries() {
        // Customer 2 is nearest after 1 but does not fit; 3 does.
        let inst = planar_instance(
            &[(1.0, 0.0, 6.0), (2.0, 0.0, 6.0), (3.0, 0.0, 4.0)],
            10.0,
            2,
        );
        let tour = nearest_neighbor(&inst, &matrix(&inst));
        assert_eq!(tour, vec![1, 3, 2]);
        let solution = RouteDecoder::default().decode(&tour, &inst).expect("fits fleet");
        assert_eq!(solution.num_routes(), 2);
    }

    #[test]
    fn test_farthest_first_starts_far() {
        let inst = planar_instance(
            &[(1.0, 0.0, 5.0), (9.0, 0.0, 5.0), (8.0, 0.0, 5.0)],
            10.0,
            2,
        );
        let tour = farthest_first(&inst, &matrix(&inst));
        assert_eq!(tour[0], 2);
        assert!(is_permutation(&tour, 3));
    }

    #[test]
    fn test_balanced_closes_at_share() {
        // Total 8, capacity 10, fleet 2 -> one route needed, share 8.
        let inst = ring_instance(8, 5.0, 10.0, 2);
        let tour = balanced(&inst, &matrix(&inst));
        assert!(is_permutation(&tour, 8));

        // Total 8, capacity 4 -> two routes of share 4.
        let tight = ring_instance(8, 5.0, 4.0, 2);
        let tour = balanced(&tight, &matrix(&tight));
        let solution = RouteDecoder::default().decode(&tour, &tight).expect("fits fleet");
        assert_eq!(solution.num_routes(), 2);
    }

    #[test]
    fn test_all_heuristics_deterministic_and_valid() {
        let inst = ring_instance(25, 10.0, 6.0, 6);
        let dm = matrix(&inst);
        for build in [nearest_neighbor, farthest_first, balanced] {
            let a = build(&inst, &dm);
            let b = build(&inst, &dm);
            assert_eq!(a, b);
            assert!(is_permutation(&a, 25));
        }
    }

    #[test]
    fn test_empty_instance() {
        let inst = planar_instance(&[], 10.0, 1);
        assert!(nearest_neighbor(&inst, &matrix(&inst)).is_empty());
        assert!(balanced(&inst, &matrix(&inst)).is_empty());
    }
}
