//! # u-tabu-routing
//!
//! Capacitated vehicle routing with adaptive tabu search over giant tours.
//! Distances come from a pluggable, cached cost oracle whose network I/O is
//! done once before the search starts.
//!
//! ## Modules
//!
//! - [`models`] — Coordinates, customers, the validated instance, tours, routes, solutions
//! - [`oracle`] — Cost oracle trait, cache, retrying precompute, providers, terrain costs
//! - [`distance`] — Dense distance snapshots for hot loops
//! - [`decoder`] — Greedy capacity split and the fleet-aware objective
//! - [`constructive`] — Initial tours (nearest-neighbor, farthest-first, sweep, balanced)
//! - [`neighborhood`] — Move operators, stratified downselection, diversification
//! - [`tabu`] — Adaptive tabu memory with aspiration, frequency and recency rules
//! - [`local_search`] — 2-opt / 3-opt refinement
//! - [`evaluation`] — Parallel candidate scoring
//! - [`search`] — The search controller and [`search::optimize`]
//! - [`error`] — Error types

pub mod constructive;
pub mod decoder;
pub mod distance;
pub mod error;
pub mod evaluation;
pub mod local_search;
pub mod models;
pub mod neighborhood;
pub mod oracle;
pub mod search;
pub mod tabu;

#[cfg(test)]
mod test_support;
