//! Search configuration.

use serde::{Deserialize, Serialize};

use crate::constructive::Construction;
use crate::decoder::DEFAULT_VEHICLE_WEIGHT;
use crate::tabu::TabuConfig;

/// Inclusive range a self-tuned meta-parameter may move in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bound {
    pub min: usize,
    pub max: usize,
    /// Largest change applied by one perturbation.
    pub step: usize,
}

impl Bound {
    pub const fn new(min: usize, max: usize, step: usize) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: usize) -> bool {
        (self.min..=self.max).contains(&value)
    }

    fn validate(&self, name: &str) -> Result<(), String> {
        if self.min == 0 || self.min > self.max {
            return Err(format!("{name} bounds must satisfy 1 <= min <= max"));
        }
        Ok(())
    }
}

/// Bounds for the meta-parameters the controller perturbs when the best
/// objective stalls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetaBounds {
    pub tabu_size: Bound,
    pub neighbors: Bound,
    pub stagnation: Bound,
}

impl Default for MetaBounds {
    fn default() -> Self {
        Self {
            tabu_size: Bound::new(5, 40, 3),
            neighbors: Bound::new(20, 150, 10),
            stagnation: Bound::new(15, 80, 5),
        }
    }
}

/// ALNS-style operator scoring used to weight the move mix.
///
/// At each generation the operator that produced the chosen candidate
/// scores `score_new_best`, `score_improved` or `score_accepted`. Every
/// `segment_length` generations each weight is smoothed towards its
/// average segment score with `reaction_factor` and floored at
/// `min_weight`.
///
/// # Reference
///
/// Ropke & Pisinger (2006), "An Adaptive Large Neighborhood Search
/// Heuristic for the Pickup and Delivery Problem with Time Windows",
/// *Transportation Science* 40(4), 455-472.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperatorConfig {
    pub segment_length: usize,
    pub score_new_best: f64,
    pub score_improved: f64,
    pub score_accepted: f64,
    pub reaction_factor: f64,
    pub min_weight: f64,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            segment_length: 20,
            score_new_best: 33.0,
            score_improved: 9.0,
            score_accepted: 3.0,
            reaction_factor: 0.1,
            min_weight: 0.1,
        }
    }
}

impl OperatorConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.segment_length == 0 {
            return Err("segment_length must be >= 1".into());
        }
        if !(self.reaction_factor > 0.0 && self.reaction_factor <= 1.0) {
            return Err("reaction_factor must be in (0, 1]".into());
        }
        if !(self.min_weight > 0.0) {
            return Err("min_weight must be > 0".into());
        }
        if [self.score_new_best, self.score_improved, self.score_accepted]
            .iter()
            .any(|s| !(s.is_finite() && *s >= 0.0))
        {
            return Err("operator scores must be finite and >= 0".into());
        }
        Ok(())
    }
}

/// Configuration for [`SearchController`](super::SearchController).
///
/// # Examples
///
/// ```
/// use u_tabu_routing::constructive::Construction;
/// use u_tabu_routing::search::SearchConfig;
///
/// let config = SearchConfig::default()
///     .with_max_generations(200)
///     .with_construction(Construction::Sweep)
///     .with_seed(7);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.early_stop, 150);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Generation budget.
    pub max_generations: usize,
    /// Generations without a new best before the run stops.
    pub early_stop: usize,
    /// Generations without a new best before diversifying (initial value).
    pub stagnation_threshold: usize,
    /// Candidates generated per generation (initial value).
    pub neighbors_per_iteration: usize,
    /// Tabu ring capacity (initial value).
    pub tabu_size: usize,
    /// Capacity the tabu ring may grow to.
    pub tabu_max_size: usize,
    /// Objective weight per vehicle used.
    pub vehicle_weight: f64,
    /// Run k-opt refinement every this many generations; 0 disables it.
    pub refine_interval: usize,
    /// Largest tour refined with 3-opt; longer tours use 2-opt.
    pub three_opt_max_len: usize,
    /// Best-objective change below which a generation counts as unchanged.
    pub unchanged_epsilon: f64,
    /// Unchanged generations in a row that trigger meta-parameter perturbation.
    pub unchanged_run: usize,
    pub construction: Construction,
    pub tabu: TabuConfig,
    pub bounds: MetaBounds,
    pub operators: OperatorConfig,
    /// Evaluator worker threads; `None` uses half the logical cores.
    pub threads: Option<usize>,
    /// Random seed; `None` uses 42.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_generations: 500,
            early_stop: 150,
            stagnation_threshold: 40,
            neighbors_per_iteration: 60,
            tabu_size: 20,
            tabu_max_size: 40,
            vehicle_weight: DEFAULT_VEHICLE_WEIGHT,
            refine_interval: 25,
            three_opt_max_len: 60,
            unchanged_epsilon: 0.01,
            unchanged_run: 5,
            construction: Construction::default(),
            tabu: TabuConfig::default(),
            bounds: MetaBounds::default(),
            operators: OperatorConfig::default(),
            threads: None,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn with_max_generations(mut self, n: usize) -> Self {
        self.max_generations = n;
        self
    }

    pub fn with_early_stop(mut self, n: usize) -> Self {
        self.early_stop = n;
        self
    }

    pub fn with_stagnation_threshold(mut self, n: usize) -> Self {
        self.stagnation_threshold = n;
        self
    }

    pub fn with_neighbors_per_iteration(mut self, n: usize) -> Self {
        self.neighbors_per_iteration = n;
        self
    }

    /// Sets the initial and maximum tabu ring capacity.
    pub fn with_tabu_size(mut self, size: usize, max_size: usize) -> Self {
        self.tabu_size = size;
        self.tabu_max_size = max_size;
        self
    }

    pub fn with_vehicle_weight(mut self, weight: f64) -> Self {
        self.vehicle_weight = weight;
        self
    }

    pub fn with_refine_interval(mut self, n: usize) -> Self {
        self.refine_interval = n;
        self
    }

    pub fn with_construction(mut self, construction: Construction) -> Self {
        self.construction = construction;
        self
    }

    pub fn with_tabu(mut self, tabu: TabuConfig) -> Self {
        self.tabu = tabu;
        self
    }

    pub fn with_bounds(mut self, bounds: MetaBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_operators(mut self, operators: OperatorConfig) -> Self {
        self.operators = operators;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.early_stop == 0 {
            return Err("early_stop must be >= 1".into());
        }
        if self.unchanged_run == 0 {
            return Err("unchanged_run must be >= 1".into());
        }
        if !(self.vehicle_weight.is_finite() && self.vehicle_weight >= 0.0) {
            return Err("vehicle_weight must be finite and >= 0".into());
        }
        if !(self.unchanged_epsilon.is_finite() && self.unchanged_epsilon >= 0.0) {
            return Err("unchanged_epsilon must be finite and >= 0".into());
        }
        if self.threads == Some(0) {
            return Err("threads must be >= 1".into());
        }
        if self.tabu_size == 0 || self.tabu_size > self.tabu_max_size {
            return Err("need 1 <= tabu_size <= tabu_max_size".into());
        }

        self.bounds.tabu_size.validate("tabu_size")?;
        self.bounds.neighbors.validate("neighbors")?;
        self.bounds.stagnation.validate("stagnation")?;
        if self.bounds.tabu_size.max > self.tabu_max_size {
            return Err("tabu_size bound exceeds tabu_max_size".into());
        }
        if !self.bounds.tabu_size.contains(self.tabu_size) {
            return Err("tabu_size outside its bounds".into());
        }
        if !self.bounds.neighbors.contains(self.neighbors_per_iteration) {
            return Err("neighbors_per_iteration outside its bounds".into());
        }
        if !self.bounds.stagnation.contains(self.stagnation_threshold) {
            return Err("stagnation_threshold outside its bounds".into());
        }

        self.tabu.validate()?;
        self.operators.validate()
    }
}
