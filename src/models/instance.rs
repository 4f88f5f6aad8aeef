//! Problem instance: depot, customers, capacity, and fleet bound.

use serde::Serialize;

use super::{Coordinate, Customer};
use crate::error::InstanceError;

/// An immutable, validated CVRP instance.
///
/// Customers are stored in id order so that customer `id` lives at index
/// `id - 1`; location index 0 is the depot. Construction fails fast on
/// any inconsistency, so every component downstream can index without
/// further checks.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(2, Coordinate::planar(2.0, 0.0), 4.0),
///         Customer::new(1, Coordinate::planar(1.0, 0.0), 3.0),
///     ],
///     10.0,
///     2,
/// )
/// .unwrap();
///
/// assert_eq!(instance.num_customers(), 2);
/// assert_eq!(instance.customer(1).unwrap().demand(), 3.0);
/// assert_eq!(instance.location(0), Coordinate::planar(0.0, 0.0));
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ProblemInstance {
    name: Option<String>,
    depot: Coordinate,
    customers: Vec<Customer>,
    vehicle_capacity: f64,
    max_vehicle_count: usize,
}

impl ProblemInstance {
    /// Validates and builds an instance.
    ///
    /// Customers may be given in any order; ids must be exactly `1..=N`.
    pub fn new(
        depot: Coordinate,
        mut customers: Vec<Customer>,
        vehicle_capacity: f64,
        max_vehicle_count: usize,
    ) -> Result<Self, InstanceError> {
        if !vehicle_capacity.is_finite() || vehicle_capacity <= 0.0 {
            return Err(InstanceError::NonPositiveCapacity(vehicle_capacity));
        }
        if max_vehicle_count == 0 {
            return Err(InstanceError::ZeroFleet);
        }
        if !depot.is_finite() {
            return Err(InstanceError::InvalidCoordinate { id: 0 });
        }

        customers.sort_by_key(|c| c.id());
        for (idx, customer) in customers.iter().enumerate() {
            let expected = idx + 1;
            if idx > 0 && customers[idx - 1].id() == customer.id() {
                return Err(InstanceError::DuplicateCustomer(customer.id()));
            }
            if customer.id() != expected {
                return Err(InstanceError::NonDenseIds {
                    expected,
                    found: customer.id(),
                });
            }
            if !customer.coordinate().is_finite() {
                return Err(InstanceError::InvalidCoordinate { id: customer.id() });
            }
            let demand = customer.demand();
            if !demand.is_finite() || demand < 0.0 {
                return Err(InstanceError::InvalidDemand {
                    id: customer.id(),
                    demand,
                });
            }
            if demand > vehicle_capacity {
                return Err(InstanceError::DemandExceedsCapacity {
                    id: customer.id(),
                    demand,
                    capacity: vehicle_capacity,
                });
            }
        }

        Ok(Self {
            name: None,
            depot,
            customers,
            vehicle_capacity,
            max_vehicle_count,
        })
    }

    /// Attaches a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Depot location.
    pub fn depot(&self) -> Coordinate {
        self.depot
    }

    /// Customers in id order.
    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    /// Number of customers (excluding the depot).
    pub fn num_customers(&self) -> usize {
        self.customers.len()
    }

    /// Looks up a customer by id.
    pub fn customer(&self, id: usize) -> Option<&Customer> {
        id.checked_sub(1).and_then(|i| self.customers.get(i))
    }

    /// Location of `id`, where 0 is the depot.
    ///
    /// # Panics
    ///
    /// Panics if `id > num_customers()`.
    pub fn location(&self, id: usize) -> Coordinate {
        if id == 0 {
            self.depot
        } else {
            self.customers[id - 1].coordinate()
        }
    }

    /// All locations, depot first.
    pub fn locations(&self) -> Vec<Coordinate> {
        std::iter::once(self.depot)
            .chain(self.customers.iter().map(Customer::coordinate))
            .collect()
    }

    /// Demand of `id` (0 for the depot).
    ///
    /// # Panics
    ///
    /// Panics if `id > num_customers()`.
    pub fn demand(&self, id: usize) -> f64 {
        if id == 0 {
            0.0
        } else {
            self.customers[id - 1].demand()
        }
    }

    /// Per-vehicle capacity.
    pub fn vehicle_capacity(&self) -> f64 {
        self.vehicle_capacity
    }

    /// Maximum number of vehicles (routes).
    pub fn max_vehicle_count(&self) -> usize {
        self.max_vehicle_count
    }

    /// Sum of all customer demands.
    pub fn total_demand(&self) -> f64 {
        self.customers.iter().map(Customer::demand).sum()
    }

    /// Lower bound on the number of routes any feasible solution needs.
    pub fn min_vehicles(&self) -> usize {
        (self.total_demand() / self.vehicle_capacity - 1e-9).ceil().max(0.0) as usize
    }

    /// Customer ids `1..=N` in order.
    pub fn customer_ids(&self) -> Vec<usize> {
        (1..=self.customers.len()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customers(demands: &[f64]) -> Vec<Customer> {
        demands
            .iter()
            .enumerate()
            .map(|(i, &d)| Customer::new(i + 1, Coordinate::planar(i as f64, 0.0), d))
            .collect()
    }

    fn origin() -> Coordinate {
        Coordinate::planar(0.0, 0.0)
    }

    #[test]
    fn test_valid_instance() {
        let inst = ProblemInstance::new(origin(), customers(&[1.0, 2.0, 3.0]), 10.0, 2)
            .expect("valid");
        assert_eq!(inst.num_customers(), 3);
        assert_eq!(inst.total_demand(), 6.0);
        assert_eq!(inst.min_vehicles(), 1);
        assert_eq!(inst.customer_ids(), vec![1, 2, 3]);
        assert_eq!(inst.locations().len(), 4);
        assert_eq!(inst.demand(0), 0.0);
        assert_eq!(inst.demand(2), 2.0);
    }

    #[test]
    fn test_empty_instance_is_valid() {
        let inst = ProblemInstance::new(origin(), vec![], 10.0, 1).expect("valid");
        assert_eq!(inst.num_customers(), 0);
        assert_eq!(inst.min_vehicles(), 0);
    }

    #[test]
    fn test_customers_sorted_by_id() {
        let cs = vec![
            Customer::new(2, Coordinate::planar(2.0, 0.0), 1.0),
            Customer::new(1, Coordinate::planar(1.0, 0.0), 1.0),
        ];
        let inst = ProblemInstance::new(origin(), cs, 10.0, 1).expect("valid");
        assert_eq!(inst.customers()[0].id(), 1);
        assert_eq!(inst.location(2), Coordinate::planar(2.0, 0.0));
    }

    #[test]
    fn test_rejects_non_positive_capacity() {
        let err = ProblemInstance::new(origin(), customers(&[1.0]), 0.0, 1).unwrap_err();
        assert!(matches!(err, InstanceError::NonPositiveCapacity(_)));
    }

    #[test]
    fn test_rejects_zero_fleet() {
        let err = ProblemInstance::new(origin(), customers(&[1.0]), 5.0, 0).unwrap_err();
        assert_eq!(err, InstanceError::ZeroFleet);
    }

    #[test]
    fn test_rejects_oversized_demand() {
        let err = ProblemInstance::new(origin(), customers(&[1.0, 11.0]), 10.0, 3).unwrap_err();
        assert!(matches!(
            err,
            InstanceError::DemandExceedsCapacity { id: 2, .. }
        ));
    }

    #[test]
    fn test_rejects_negative_demand() {
        let err = ProblemInstance::new(origin(), customers(&[-1.0]), 10.0, 1).unwrap_err();
        assert!(matches!(err, InstanceError::InvalidDemand { id: 1, .. }));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let cs = vec![
            Customer::new(1, origin(), 1.0),
            Customer::new(1, origin(), 1.0),
        ];
        let err = ProblemInstance::new(origin(), cs, 10.0, 1).unwrap_err();
        assert_eq!(err, InstanceError::DuplicateCustomer(1));
    }

    #[test]
    fn test_rejects_gap_in_ids() {
        let cs = vec![
            Customer::new(1, origin(), 1.0),
            Customer::new(3, origin(), 1.0),
        ];
        let err = ProblemInstance::new(origin(), cs, 10.0, 1).unwrap_err();
        assert_eq!(
            err,
            InstanceError::NonDenseIds {
                expected: 2,
                found: 3
            }
        );
    }

    #[test]
    fn test_min_vehicles_rounds_up() {
        let inst = ProblemInstance::new(origin(), customers(&[6.0, 6.0, 6.0]), 10.0, 5)
            .expect("valid");
        assert_eq!(inst.min_vehicles(), 2);
    }
}
