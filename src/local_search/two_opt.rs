//! Giant-tour 2-opt descent.
//!
//! # Algorithm
//!
//! The tour is treated as one open path `depot → t[0] → … → t[n-1] → depot`.
//! For each pair of positions `i < j`, reversing `t[i..=j]` changes two
//! path edges:
//!
//! ```text
//! delta = d(prev, t[j]) + d(t[i], next) - d(prev, t[i]) - d(t[j], next)
//! ```
//!
//! The path ignores route boundaries and load, so `delta` only orders the
//! scan: every reversal is decoded and scored, most promising first, and
//! the first one that strictly improves the objective is applied before
//! the scan restarts. The descent ends after a full scan with no
//! improvement, so no single reversal improves the returned tour.
//!
//! # Complexity
//!
//! O(n²) decodes of O(n) each per scan.
//!
//! # Reference
//!
//! Croes, G.A. (1958). "A method for solving traveling salesman problems",
//! *Operations Research* 6(6), 791-812.

use crate::distance::DistanceMatrix;
use crate::models::Tour;

/// Path-length change from reversing `tour[i..=j]`.
pub(crate) fn two_opt_delta(tour: &[usize], dm: &DistanceMatrix, i: usize, j: usize) -> f64 {
    let n = tour.len();
    let prev = if i == 0 { 0 } else { tour[i - 1] };
    let next = if j == n - 1 { 0 } else { tour[j + 1] };

    let old_cost = dm.get(prev, tour[i]) + dm.get(tour[j], next);
    let new_cost = dm.get(prev, tour[j]) + dm.get(tour[i], next);
    new_cost - old_cost
}

/// Runs 2-opt descent from `tour`, whose objective is `objective_value`.
///
/// Returns the improved tour, its objective and the number of applied moves.
pub(crate) fn two_opt_descent<F>(
    tour: &[usize],
    objective_value: f64,
    dm: &DistanceMatrix,
    objective: &mut F,
) -> (Tour, f64, usize)
where
    F: FnMut(&[usize]) -> f64,
{
    let mut current = tour.to_vec();
    let mut current_value = objective_value;
    let mut moves = 0;
    let n = current.len();
    if n < 2 {
        return (current, current_value, moves);
    }

    let mut improved = true;
    while improved {
        improved = false;

        let mut order = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n - 1 {
            for j in i + 1..n {
                order.push((two_opt_delta(&current, dm, i, j), i, j));
            }
        }
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, i, j) in order {
            current[i..=j].reverse();
            let value = objective(&current);
            if value < current_value {
                current_value = value;
                moves += 1;
                improved = true;
                break;
            }
            current[i..=j].reverse();
        }
    }

    (current, current_value, moves)
}
