//! Giant-tour representation.

/// A permutation of all customer ids `1..=N`, before capacity splitting.
pub type Tour = Vec<usize>;

/// Returns `true` if `tour` contains every id in `1..=n` exactly once.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::is_permutation;
///
/// assert!(is_permutation(&[3, 1, 2], 3));
/// assert!(!is_permutation(&[3, 3, 2], 3));
/// assert!(!is_permutation(&[1, 2], 3));
/// ```
pub fn is_permutation(tour: &[usize], n: usize) -> bool {
    if tour.len() != n {
        return false;
    }
    let mut seen = vec![false; n + 1];
    for &id in tour {
        if id == 0 || id > n || seen[id] {
            return false;
        }
        seen[id] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_permutation_of_zero() {
        assert!(is_permutation(&[], 0));
    }

    #[test]
    fn test_depot_id_rejected() {
        assert!(!is_permutation(&[0, 1], 2));
    }

    #[test]
    fn test_out_of_range_rejected() {
        assert!(!is_permutation(&[1, 4, 2], 3));
    }
}
