//! Giant-tour decoding and scoring.
//!
//! # Algorithm
//!
//! The tour is walked left to right; a route is closed whenever the next
//! customer would push its load past the vehicle capacity. This greedy
//! split is O(n) and keeps every route capacity-feasible by construction.
//! A split that needs more routes than the fleet bound is rejected.
//!
//! # Objective
//!
//! ```text
//! fitness = vehicle_weight · |routes| + Σ route_cost(route)
//! ```
//!
//! `route_cost` sums `oracle.cost` along depot → c1 → … → cn → depot,
//! with the load on board decreasing as deliveries are made. Any
//! unreachable leg makes the whole fitness `+INF`. `vehicle_weight` is
//! large so that fewer vehicles always beats shorter distance.

use crate::models::{is_permutation, ProblemInstance, Route, Solution};
use crate::oracle::CostOracle;

/// Default per-vehicle weight in the objective.
pub const DEFAULT_VEHICLE_WEIGHT: f64 = 10_000.0;

/// Splits tours into routes and scores solutions.
///
/// Stateless apart from the vehicle weight; every method takes all its
/// inputs explicitly and can be called from any thread.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::decoder::RouteDecoder;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(1, Coordinate::planar(1.0, 0.0), 6.0),
///         Customer::new(2, Coordinate::planar(2.0, 0.0), 6.0),
///     ],
///     10.0,
///     2,
/// )
/// .unwrap();
///
/// let decoder = RouteDecoder::default();
/// let solution = decoder.decode(&[1, 2], &instance).unwrap();
/// assert_eq!(solution.num_routes(), 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteDecoder {
    vehicle_weight: f64,
}

impl Default for RouteDecoder {
    fn default() -> Self {
        Self::new(DEFAULT_VEHICLE_WEIGHT)
    }
}

impl RouteDecoder {
    /// Creates a decoder with the given per-vehicle weight.
    pub fn new(vehicle_weight: f64) -> Self {
        Self { vehicle_weight }
    }

    pub fn vehicle_weight(&self) -> f64 {
        self.vehicle_weight
    }

    /// Greedy capacity split, ignoring the fleet bound.
    ///
    /// The tour must be a permutation of the instance's customer ids.
    pub fn split(tour: &[usize], instance: &ProblemInstance) -> Solution {
        let capacity = instance.vehicle_capacity();
        let mut solution = Solution::new();
        let mut current: Vec<usize> = Vec::new();
        let mut load = 0.0;

        for &id in tour {
            let demand = instance.demand(id);
            if !current.is_empty() && load + demand > capacity {
                solution.add_route(Route::new(std::mem::take(&mut current), load));
                load = 0.0;
            }
            current.push(id);
            load += demand;
        }
        if !current.is_empty() {
            solution.add_route(Route::new(current, load));
        }
        solution
    }

    /// Splits `tour` into routes.
    ///
    /// Returns `None` if the tour is not a permutation of the customers or
    /// if the split needs more than `max_vehicle_count` routes.
    pub fn decode(&self, tour: &[usize], instance: &ProblemInstance) -> Option<Solution> {
        if !is_permutation(tour, instance.num_customers()) {
            return None;
        }
        let solution = Self::split(tour, instance);
        if solution.num_routes() > instance.max_vehicle_count() {
            return None;
        }
        Some(solution)
    }

    /// Cost of one route, including the legs to and from the depot.
    pub fn route_cost<O: CostOracle + ?Sized>(
        route: &Route,
        instance: &ProblemInstance,
        oracle: &O,
    ) -> f64 {
        if route.is_empty() {
            return 0.0;
        }
        let mut load = route.load();
        let mut prev = instance.depot();
        let mut total = 0.0;
        for &id in route.customers() {
            let next = instance.location(id);
            let leg = oracle.cost(prev, next, load);
            if !leg.is_finite() {
                return f64::INFINITY;
            }
            total += leg;
            load = (load - instance.demand(id)).max(0.0);
            prev = next;
        }
        let back = oracle.cost(prev, instance.depot(), load);
        if !back.is_finite() {
            return f64::INFINITY;
        }
        total + back
    }

    /// Sum of route costs, without the vehicle term.
    pub fn travel_cost<O: CostOracle + ?Sized>(
        solution: &Solution,
        instance: &ProblemInstance,
        oracle: &O,
    ) -> f64 {
        let mut total = 0.0;
        for route in solution.routes() {
            let c = Self::route_cost(route, instance, oracle);
            if !c.is_finite() {
                return f64::INFINITY;
            }
            total += c;
        }
        total
    }

    /// Full objective of a decoded solution.
    ///
    /// Solutions over the fleet bound score `+INF`.
    pub fn score<O: CostOracle + ?Sized>(
        &self,
        solution: &Solution,
        instance: &ProblemInstance,
        oracle: &O,
    ) -> f64 {
        if solution.num_routes() > instance.max_vehicle_count() {
            return f64::INFINITY;
        }
        let travel = Self::travel_cost(solution, instance, oracle);
        if !travel.is_finite() {
            return f64::INFINITY;
        }
        self.vehicle_weight * solution.num_routes() as f64 + travel
    }

    /// Decodes and scores a tour; `+INF` if it is infeasible.
    pub fn evaluate<O: CostOracle + ?Sized>(
        &self,
        tour: &[usize],
        instance: &ProblemInstance,
        oracle: &O,
    ) -> f64 {
        match self.decode(tour, instance) {
            Some(solution) => self.score(&solution, instance, oracle),
            None => f64::INFINITY,
        }
    }
}
