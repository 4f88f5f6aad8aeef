//! Distance snapshots.
//!
//! The oracle answers one pair at a time through a hash lookup; hot loops
//! that need every pair take a dense [`DistanceMatrix`] copy instead.

mod matrix;

pub use matrix::DistanceMatrix;
