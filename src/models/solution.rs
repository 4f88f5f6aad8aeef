//! Solution type.

use serde::{Deserialize, Serialize};

use super::Route;

/// A complete set of routes covering every customer.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Route, Solution};
///
/// let solution = Solution::from_routes(vec![
///     Route::new(vec![1, 2], 5.0),
///     Route::new(vec![3], 4.0),
/// ]);
/// assert_eq!(solution.num_routes(), 2);
/// assert_eq!(solution.num_served(), 3);
/// assert_eq!(solution.to_tour(), vec![1, 2, 3]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    routes: Vec<Route>,
}

impl Solution {
    /// Creates an empty solution.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a solution from routes.
    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Appends a route.
    pub fn add_route(&mut self, route: Route) {
        self.routes.push(route);
    }

    /// All routes in order.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes (vehicles used).
    pub fn num_routes(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no routes.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Total number of customers served.
    pub fn num_served(&self) -> usize {
        self.routes.iter().map(Route::len).sum()
    }

    /// Concatenates all routes back into a giant tour.
    pub fn to_tour(&self) -> Vec<usize> {
        self.routes
            .iter()
            .flat_map(|r| r.customers().iter().copied())
            .collect()
    }
}
