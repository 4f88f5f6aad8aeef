//! Domain model types for capacitated vehicle routing.
//!
//! Provides coordinates, customers with demands, the validated problem
//! instance, the giant-tour encoding the search operates on, and the
//! routes and solutions it decodes into.

mod coordinate;
mod customer;
mod instance;
pub mod loader;
mod route;
mod solution;
mod tour;

pub use coordinate::{CoordKey, Coordinate};
pub use customer::Customer;
pub use instance::ProblemInstance;
pub use route::Route;
pub use solution::Solution;
pub use tour::{is_permutation, Tour};
