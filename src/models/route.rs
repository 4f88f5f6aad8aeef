//! Route type.

use serde::{Deserialize, Serialize};

/// An ordered run of customers served by one vehicle.
///
/// The route starts and ends at the depot, which is not stored.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::Route;
///
/// let route = Route::new(vec![3, 1], 7.5);
/// assert_eq!(route.len(), 2);
/// assert_eq!(route.load(), 7.5);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    customers: Vec<usize>,
    load: f64,
}

impl Route {
    /// Creates a route from its customer sequence and total load.
    pub fn new(customers: Vec<usize>, load: f64) -> Self {
        Self { customers, load }
    }

    /// Ordered customer ids (excluding the depot).
    pub fn customers(&self) -> &[usize] {
        &self.customers
    }

    /// Total demand carried.
    pub fn load(&self) -> f64 {
        self.load
    }

    /// Number of customers visited.
    pub fn len(&self) -> usize {
        self.customers.len()
    }

    /// Returns `true` if no customers are visited.
    pub fn is_empty(&self) -> bool {
        self.customers.is_empty()
    }
}
