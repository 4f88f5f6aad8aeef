//! Sweep giant-tour construction.
//!
//! # Algorithm
//!
//! Sorts customers by polar angle around the depot and starts the sweep
//! just after the widest angular gap, so the cut between the last and the
//! first route falls where customers are sparsest. The greedy split of the
//! decoder then packs consecutive angular sectors into routes.
//!
//! # Complexity
//!
//! O(n log n) where n = number of customers (dominated by angle sorting).
//!
//! # Reference
//!
//! Gillett, B.E. & Miller, L.R. (1974). "A Heuristic Algorithm for the
//! Vehicle-Dispatch Problem", *Operations Research* 22(2), 340-349.

use std::f64::consts::TAU;

use crate::models::{ProblemInstance, Tour};

/// Giant tour ordered by polar angle around the depot.
///
/// Angles use longitude as the x axis and latitude as the y axis. Equal
/// angles are ordered by id.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::constructive::sweep;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(1, Coordinate::planar(1.0, 1.0), 1.0),
///         Customer::new(2, Coordinate::planar(-1.0, 1.0), 1.0),
///         Customer::new(3, Coordinate::planar(-1.0, -1.0), 1.0),
///         Customer::new(4, Coordinate::planar(1.0, -1.0), 1.0),
///     ],
///     10.0,
///     1,
/// )
/// .unwrap();
///
/// let tour = sweep(&instance);
/// assert_eq!(tour.len(), 4);
/// ```
pub fn sweep(instance: &ProblemInstance) -> Tour {
    let depot = instance.depot();

    let mut angle_order: Vec<(usize, f64)> = instance
        .customers()
        .iter()
        .map(|c| {
            let dx = c.coordinate().lon() - depot.lon();
            let dy = c.coordinate().lat() - depot.lat();
            let angle = dy.atan2(dx);
            (c.id(), if angle < 0.0 { angle + TAU } else { angle })
        })
        .collect();

    angle_order.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let n = angle_order.len();
    if n < 2 {
        return angle_order.into_iter().map(|(id, _)| id).collect();
    }

    // Gap before position i; position 0 wraps around from the last angle.
    let mut start = 0;
    let mut widest = angle_order[0].1 + TAU - angle_order[n - 1].1;
    for i in 1..n {
        let gap = angle_order[i].1 - angle_order[i - 1].1;
        if gap > widest {
            widest = gap;
            start = i;
        }
    }
    angle_order.rotate_left(start);

    angle_order.into_iter().map(|(id, _)| id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::RouteDecoder;
    use crate::models::is_permutation;
    use crate::test_support::{planar_instance, ring_instance};

    #[test]
    fn test_sweep_orders_by_angle() {
        let inst = planar_instance(
            &[
                (1.0, 1.0, 1.0),
                (-1.0, 1.0, 1.0),
                (-1.0, -1.0, 1.0),
                (1.0, -0.2, 1.0),
            ],
            10.0,
            1,
        );
        // 45°, 135°, 225°, 348.7°: the widest gap ends at customer 4.
        assert_eq!(sweep(&inst), vec![4, 1, 2, 3]);
    }

    #[test]
    fn test_sweep_starts_after_widest_gap() {
        // Angles 10°, 20°, 200°: the widest gap is 20° → 200°.
        let deg = |d: f64| (d.to_radians().cos(), d.to_radians().sin(), 1.0);
        let inst = planar_instance(&[deg(10.0), deg(20.0), deg(200.0)], 10.0, 1);
        assert_eq!(sweep(&inst), vec![3, 1, 2]);
    }

    #[test]
    fn test_sweep_splits_into_sectors() {
        let inst = ring_instance(12, 10.0, 3.0, 4);
        let tour = sweep(&inst);
        assert!(is_permutation(&tour, 12));
        let solution = RouteDecoder::default().decode(&tour, &inst).expect("fits fleet");
        assert_eq!(solution.num_routes(), 4);
    }

    #[test]
    fn test_sweep_small() {
        assert!(sweep(&planar_instance(&[], 10.0, 1)).is_empty());
        assert_eq!(sweep(&planar_instance(&[(1.0, 2.0, 1.0)], 10.0, 1)), vec![1]);
    }
}
