//! Customer type.

use serde::{Deserialize, Serialize};

use super::Coordinate;

/// A customer with a location and a delivery demand.
///
/// Ids start at 1; id 0 is reserved for the depot.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Coordinate, Customer};
///
/// let c = Customer::new(1, Coordinate::planar(41.0, 49.0), 10.0);
/// assert_eq!(c.id(), 1);
/// assert_eq!(c.demand(), 10.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    id: usize,
    coordinate: Coordinate,
    demand: f64,
}

impl Customer {
    /// Creates a new customer.
    pub fn new(id: usize, coordinate: Coordinate, demand: f64) -> Self {
        Self {
            id,
            coordinate,
            demand,
        }
    }

    /// Customer ID (≥ 1).
    pub fn id(&self) -> usize {
        self.id
    }

    /// Location of this customer.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Units to deliver.
    pub fn demand(&self) -> f64 {
        self.demand
    }
}
