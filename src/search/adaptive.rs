//! Self-tuning of the search meta-parameters.

use rand::Rng;
use serde::Serialize;

use super::config::{Bound, MetaBounds, SearchConfig};

/// The meta-parameters the controller adjusts while it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetaParams {
    pub tabu_size: usize,
    pub neighbors: usize,
    pub stagnation: usize,
}

impl MetaParams {
    pub(crate) fn from_config(config: &SearchConfig) -> Self {
        Self {
            tabu_size: config.tabu_size,
            neighbors: config.neighbors_per_iteration,
            stagnation: config.stagnation_threshold,
        }
    }

    /// Moves every parameter by a random delta in `-step..=step`, clamped
    /// to its bounds.
    pub(crate) fn perturb<R: Rng>(&mut self, bounds: &MetaBounds, rng: &mut R) {
        self.tabu_size = nudge(self.tabu_size, &bounds.tabu_size, rng);
        self.neighbors = nudge(self.neighbors, &bounds.neighbors, rng);
        self.stagnation = nudge(self.stagnation, &bounds.stagnation, rng);
    }
}

fn nudge<R: Rng>(value: usize, bound: &Bound, rng: &mut R) -> usize {
    let step = bound.step as i64;
    let delta = if step == 0 { 0 } else { rng.random_range(-step..=step) };
    let moved = (value as i64 + delta).clamp(bound.min as i64, bound.max as i64);
    moved as usize
}

/// Counts consecutive generations whose best objective stayed within
/// `epsilon` of a reference value.
#[derive(Debug, Clone)]
pub(crate) struct UnchangedRun {
    epsilon: f64,
    reference: f64,
    run: usize,
}

impl UnchangedRun {
    pub(crate) fn new(epsilon: f64, initial: f64) -> Self {
        Self {
            epsilon,
            reference: initial,
            run: 0,
        }
    }

    /// Observes the best objective after a generation and returns the
    /// current run length.
    pub(crate) fn observe(&mut self, best: f64) -> usize {
        let unchanged = if best.is_finite() && self.reference.is_finite() {
            (best - self.reference).abs() <= self.epsilon
        } else {
            best.is_infinite() && self.reference.is_infinite()
        };
        if unchanged {
            self.run += 1;
        } else {
            self.reference = best;
            self.run = 0;
        }
        self.run
    }

    pub(crate) fn reset(&mut self) {
        self.run = 0;
    }
}
