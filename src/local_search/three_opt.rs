//! Giant-tour 3-opt descent.
//!
//! # Algorithm
//!
//! Positions `i < j < k` cut the tour into `A = t[..i]`, `B = t[i..j]`,
//! `C = t[j..k]` and `D = t[k..]`. Four reconnections are tried:
//!
//! | Variant               | Result      |
//! |-----------------------|-------------|
//! | reversed-reversed     | A B' C' D   |
//! | forward-reversed      | A B  C' D   |
//! | reversed-forward      | A B' C  D   |
//! | full-span reversal    | A C' B' D   |
//!
//! Every variant is decoded and scored, in order of its change in
//! open-path length. The first one that strictly improves the objective
//! is applied and the scan restarts. Each variant is its own inverse, so
//! rejected moves are undone in place.
//!
//! # Complexity
//!
//! O(n³) decodes of O(n) each per scan.
//!
//! # Reference
//!
//! Lin, S. (1965). "Computer Solutions of the Traveling Salesman Problem",
//! *Bell System Technical Journal* 44(10), 2245-2269.

use crate::distance::DistanceMatrix;
use crate::models::Tour;

/// A 3-opt reconnection of the middle segments `B` and `C`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Reconnection {
    ReversedReversed,
    ForwardReversed,
    ReversedForward,
    FullSpan,
}

impl Reconnection {
    pub(crate) const ALL: [Reconnection; 4] = [
        Reconnection::ReversedReversed,
        Reconnection::ForwardReversed,
        Reconnection::ReversedForward,
        Reconnection::FullSpan,
    ];

    /// Applies the reconnection in place. Applying it twice restores the tour.
    pub(crate) fn apply(self, tour: &mut [usize], i: usize, j: usize, k: usize) {
        match self {
            Reconnection::ReversedReversed => {
                tour[i..j].reverse();
                tour[j..k].reverse();
            }
            Reconnection::ForwardReversed => tour[j..k].reverse(),
            Reconnection::ReversedForward => tour[i..j].reverse(),
            Reconnection::FullSpan => tour[i..k].reverse(),
        }
    }

    /// Path-length change of applying this reconnection at `(i, j, k)`.
    pub(crate) fn delta(self, tour: &[usize], dm: &DistanceMatrix, i: usize, j: usize, k: usize) -> f64 {
        let a = if i == 0 { 0 } else { tour[i - 1] };
        let (b_start, b_end) = (tour[i], tour[j - 1]);
        let (c_start, c_end) = (tour[j], tour[k - 1]);
        let d = if k == tour.len() { 0 } else { tour[k] };

        let old_cost = dm.get(a, b_start) + dm.get(b_end, c_start) + dm.get(c_end, d);
        let new_cost = match self {
            Reconnection::ReversedReversed => {
                dm.get(a, b_end) + dm.get(b_start, c_end) + dm.get(c_start, d)
            }
            Reconnection::ForwardReversed => {
                dm.get(a, b_start) + dm.get(b_end, c_end) + dm.get(c_start, d)
            }
            Reconnection::ReversedForward => {
                dm.get(a, b_end) + dm.get(b_start, c_start) + dm.get(c_end, d)
            }
            Reconnection::FullSpan => {
                dm.get(a, c_end) + dm.get(c_start, b_end) + dm.get(b_start, d)
            }
        };
        new_cost - old_cost
    }
}

/// Runs 3-opt descent from `tour`, whose objective is `objective_value`.
///
/// Returns the improved tour, its objective and the number of applied moves.
pub(crate) fn three_opt_descent<F>(
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
    if n < 3 {
        return (current, current_value, moves);
    }

    let mut improved = true;
    while improved {
        improved = false;

        let mut order = Vec::new();
        for i in 0..n - 1 {
            for j in i + 1..n {
                for k in j + 1..=n {
                    for variant in Reconnection::ALL {
                        order.push((variant.delta(&current, dm, i, j, k), variant, i, j, k));
                    }
                }
            }
        }
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        for (_, variant, i, j, k) in order {
            variant.apply(&mut current, i, j, k);
            let value = objective(&current);
            if value < current_value {
                current_value = value;
                moves += 1;
                improved = true;
                break;
            }
            variant.apply(&mut current, i, j, k);
        }
    }

    (current, current_value, moves)
}
