//! Dense distance snapshot over an instance's locations.

use crate::models::ProblemInstance;
use crate::oracle::CostOracle;

/// A dense n×n distance matrix stored in row-major order.
///
/// Index 0 is the depot and index `id` is customer `id`, matching
/// [`ProblemInstance::location`]. Built once from a [`CostOracle`] so that
/// tight inner loops (construction, k-opt screening) avoid hashing.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::distance::DistanceMatrix;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(1, Coordinate::planar(3.0, 4.0), 1.0),
///         Customer::new(2, Coordinate::planar(6.0, 8.0), 1.0),
///     ],
///     10.0,
///     1,
/// )
/// .unwrap();
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
/// assert!(oracle.precompute(&instance));
///
/// let dm = DistanceMatrix::from_oracle(&instance, &oracle);
/// assert!((dm.get(0, 1) - 5.0).abs() < 1e-10);
/// assert_eq!(dm.size(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Creates a distance matrix of the given size, initialized to zero.
    pub fn new(size: usize) -> Self {
        Self {
            data: vec![0.0; size * size],
            size,
        }
    }

    /// Snapshots `oracle.distance` for every ordered pair of locations.
    ///
    /// Pairs the oracle cannot resolve are stored as `f64::INFINITY`.
    pub fn from_oracle<O: CostOracle + ?Sized>(instance: &ProblemInstance, oracle: &O) -> Self {
        let locations = instance.locations();
        let n = locations.len();
        let mut dm = Self::new(n);
        for i in 0..n {
            for j in 0..n {
                if i != j {
                    dm.set(i, j, oracle.distance(locations[i], locations[j]));
                }
            }
        }
        dm
    }

    /// Creates a distance matrix from an explicit n×n grid.
    ///
    /// Returns `None` if the data length doesn't match `size * size`.
    pub fn from_data(size: usize, data: Vec<f64>) -> Option<Self> {
        if data.len() != size * size {
            return None;
        }
        Some(Self { data, size })
    }

    /// Returns the distance from location `from` to location `to`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Sets the distance from location `from` to location `to`.
    pub fn set(&mut self, from: usize, to: usize, distance: f64) {
        self.data[from * self.size + to] = distance;
    }

    /// Number of locations in this matrix.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Length of the open path `depot → tour[0] → … → tour[n-1] → depot`.
    pub fn path_length(&self, tour: &[usize]) -> f64 {
        let mut prev = 0;
        let mut total = 0.0;
        for &id in tour {
            total += self.get(prev, id);
            prev = id;
        }
        total + self.get(prev, 0)
    }

    /// Returns the nearest neighbor of `from` among the given candidates.
    ///
    /// Ties go to the earliest candidate. Returns `None` if `candidates`
    /// is empty.
    pub fn nearest_neighbor(&self, from: usize, candidates: &[usize]) -> Option<usize> {
        candidates
            .iter()
            .copied()
            .reduce(|best, c| {
                if self.get(from, c) < self.get(from, best) {
                    c
                } else {
                    best
                }
            })
    }
}
