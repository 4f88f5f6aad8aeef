//! Constructive heuristics for the initial giant tour.
//!
//! - [`nearest_neighbor`] — capacity-aware nearest-neighbor, O(n²)
//! - [`farthest_first`] — routes seeded at the farthest customer, O(n²)
//! - [`balanced`] — nearest-neighbor closing routes at an even load share, O(n²)
//! - [`sweep`] — polar-angle sweep (Gillett & Miller, 1974), O(n log n)
//!
//! Every heuristic is deterministic and returns a permutation of the
//! instance's customer ids.

mod nearest_neighbor;
mod sweep;

pub use nearest_neighbor::{balanced, farthest_first, nearest_neighbor};
pub use sweep::sweep;

use serde::{Deserialize, Serialize};

use crate::distance::DistanceMatrix;
use crate::models::{ProblemInstance, Tour};

/// Which heuristic builds the initial tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Construction {
    #[default]
    NearestNeighbor,
    FarthestFirst,
    Sweep,
    Balanced,
}

impl Construction {
    pub const ALL: [Construction; 4] = [
        Construction::NearestNeighbor,
        Construction::FarthestFirst,
        Construction::Sweep,
        Construction::Balanced,
    ];

    /// Builds the initial tour.
    pub fn build(self, instance: &ProblemInstance, distances: &DistanceMatrix) -> Tour {
        match self {
            Construction::NearestNeighbor => nearest_neighbor(instance, distances),
            Construction::FarthestFirst => farthest_first(instance, distances),
            Construction::Sweep => sweep(instance),
            Construction::Balanced => balanced(instance, distances),
        }
    }
}
