//! Adaptive tabu search over giant tours.
//!
//! # Algorithm
//!
//! 1. **Initializing**: build the initial tour with the configured
//!    construction (falling back to the others if it does not fit the
//!    fleet) and score it as the first best.
//! 2. **Searching**, once per generation:
//!    a. draw a mixed batch of candidates, apportioned by operator weight
//!    b. score the batch in parallel, dropping infeasible candidates
//!    c. take the lowest-objective candidate that tabu memory admits, or
//!       the lowest overall if every candidate is forbidden
//!    d. record it in tabu memory and update the best
//!    e. every `refine_interval` generations, run k-opt on the current tour
//! 3. **Diversifying**: after `stagnation` generations without a new best,
//!    perturb the current tour heavily and clear tabu memory.
//! 4. When the best objective stays within `unchanged_epsilon` for
//!    `unchanged_run` generations, nudge tabu size, batch size and the
//!    stagnation threshold within their bounds.
//! 5. **Terminated**: after the generation budget, `early_stop`
//!    generations without a new best, or cancellation.
//!
//! # Reference
//!
//! Glover, F. (1989). "Tabu Search—Part I", *ORSA Journal on Computing* 1(3), 190-206.
//! Battiti, R. & Tecchiolli, G. (1994). "The Reactive Tabu Search",
//! *ORSA Journal on Computing* 6(2), 126-140.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::constructive::Construction;
use crate::decoder::RouteDecoder;
use crate::distance::DistanceMatrix;
use crate::error::OptimizeError;
use crate::evaluation::ParallelEvaluator;
use crate::local_search::LocalSearchRefiner;
use crate::models::{ProblemInstance, Solution, Tour};
use crate::neighborhood::{diversify, MoveKind, NeighborhoodGenerator};
use crate::oracle::CostOracle;
use crate::tabu::TabuMemory;

use super::adaptive::{MetaParams, UnchangedRun};
use super::config::SearchConfig;
use super::operators::{OperatorWeights, Outcome};

const DEFAULT_SEED: u64 = 42;

/// Controller lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SearchState {
    Initializing,
    Searching,
    Diversifying,
    Terminated,
}

/// Why the search stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// `max_generations` generations ran.
    GenerationBudget,
    /// `early_stop` generations passed without a new best, or the tour
    /// has no neighbors at all.
    EarlyStop,
    /// The cancellation flag was raised.
    Cancelled,
}

/// Result of a successful search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Decoded best tour.
    pub solution: Solution,
    /// Best giant tour.
    pub tour: Tour,
    /// Objective of `tour` (vehicle term included).
    pub objective: f64,
    /// Travel cost of `solution` alone.
    pub travel_cost: f64,
    /// Generations completed.
    pub generations: usize,
    /// Generation in which the best was found (0 for the initial tour).
    pub best_generation: usize,
    pub diversifications: usize,
    pub meta_adjustments: usize,
    pub termination: Termination,
    /// Meta-parameters in effect at the end of the run.
    pub params: MetaParams,
    /// Final operator weights.
    pub operator_weights: Vec<(MoveKind, f64)>,
    /// Best objective after each generation; non-increasing.
    pub history: Vec<f64>,
}

/// Best tour seen so far.
struct Incumbent {
    tour: Tour,
    objective: f64,
    generation: usize,
}

impl Incumbent {
    /// Replaces the incumbent if `objective` is strictly better.
    fn offer(&mut self, tour: &[usize], objective: f64, generation: usize) -> bool {
        if objective < self.objective {
            self.tour = tour.to_vec();
            self.objective = objective;
            self.generation = generation;
            true
        } else {
            false
        }
    }
}

/// Runs adaptive tabu search on one instance.
///
/// The generation loop is single-threaded; only candidate scoring runs on
/// the evaluator's worker pool. Results depend only on the instance, the
/// cached oracle data and the configured seed.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};
/// use u_tabu_routing::search::{SearchConfig, SearchController};
///
/// let customers = (1..=8)
///     .map(|i| {
///         let angle = i as f64 * 0.7;
///         Customer::new(i, Coordinate::planar(10.0 * angle.cos(), 10.0 * angle.sin()), 3.0)
///     })
///     .collect();
/// let instance =
///     ProblemInstance::new(Coordinate::planar(0.0, 0.0), customers, 12.0, 3).unwrap();
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
/// assert!(oracle.precompute(&instance));
///
/// let config = SearchConfig::default().with_max_generations(50).with_threads(2);
/// let mut controller = SearchController::new(&instance, &oracle, config).unwrap();
/// let outcome = controller.run().unwrap();
/// assert_eq!(outcome.solution.num_served(), 8);
/// assert!(outcome.solution.num_routes() <= 3);
/// ```
pub struct SearchController<'a, O: CostOracle + ?Sized> {
    instance: &'a ProblemInstance,
    oracle: &'a O,
    config: SearchConfig,
    decoder: RouteDecoder,
    generator: NeighborhoodGenerator,
    refiner: LocalSearchRefiner,
    evaluator: ParallelEvaluator,
    state: SearchState,
}

impl<'a, O: CostOracle + ?Sized> SearchController<'a, O> {
    /// Validates `config` and starts the evaluator pool.
    ///
    /// `oracle` must already be precomputed for `instance`.
    pub fn new(
        instance: &'a ProblemInstance,
        oracle: &'a O,
        config: SearchConfig,
    ) -> Result<Self, OptimizeError> {
        config.validate().map_err(OptimizeError::InvalidConfig)?;
        let decoder = RouteDecoder::new(config.vehicle_weight);
        let evaluator = ParallelEvaluator::new(config.threads)?;
        Ok(Self {
            instance,
            oracle,
            config,
            decoder,
            generator: NeighborhoodGenerator::default(),
            refiner: LocalSearchRefiner::new(decoder),
            evaluator,
            state: SearchState::Initializing,
        })
    }

    /// Replaces the default neighborhood generator.
    pub fn with_generator(mut self, generator: NeighborhoodGenerator) -> Self {
        self.generator = generator;
        self
    }

    pub fn state(&self) -> SearchState {
        self.state
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Runs the search to completion.
    pub fn run(&mut self) -> Result<SearchOutcome, OptimizeError> {
        self.run_with_cancel(None)
    }

    /// Runs the search, checking `cancel` before every generation.
    ///
    /// On cancellation the best tour found so far is returned with
    /// [`Termination::Cancelled`].
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(customers = self.instance.num_customers(), seed = self.config.seed.unwrap_or(DEFAULT_SEED))
    )]
    pub fn run_with_cancel(
        &mut self,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Result<SearchOutcome, OptimizeError> {
        self.state = SearchState::Initializing;
        let instance = self.instance;
        let n = instance.num_customers();

        let needed = instance.min_vehicles();
        if needed > instance.max_vehicle_count() {
            self.state = SearchState::Terminated;
            tracing::warn!(needed, fleet = instance.max_vehicle_count(), "fleet too small");
            return Err(OptimizeError::NoFeasibleSolution {
                reason: format!(
                    "total demand {:.2} needs at least {} vehicles of capacity {:.2}, fleet has {}",
                    instance.total_demand(),
                    needed,
                    instance.vehicle_capacity(),
                    instance.max_vehicle_count()
                ),
            });
        }

        let mut rng = u_numflow::random::create_rng(self.config.seed.unwrap_or(DEFAULT_SEED));
        let distances = DistanceMatrix::from_oracle(instance, self.oracle);
        let (mut current, mut current_obj) = self.initial_tour(&distances);

        let mut params = MetaParams::from_config(&self.config);
        let mut tabu = TabuMemory::new(
            params.tabu_size,
            self.config.tabu_max_size,
            self.config.tabu.clone(),
        );
        let mut weights = OperatorWeights::new(self.config.operators.clone());
        if current_obj.is_finite() {
            tabu.record_elite(&current, current_obj);
        }
        tabu.add(&current);

        let mut best = Incumbent {
            tour: current.clone(),
            objective: current_obj,
            generation: 0,
        };
        let mut history = Vec::with_capacity(self.config.max_generations);
        let mut no_improvement = 0;
        let mut stagnation = 0;
        let mut unchanged = UnchangedRun::new(self.config.unchanged_epsilon, best.objective);
        let mut diversifications = 0;
        let mut meta_adjustments = 0;
        let mut termination = Termination::GenerationBudget;
        let k = if n <= self.config.three_opt_max_len { 3 } else { 2 };

        tracing::info!(
            customers = n,
            construction = ?self.config.construction,
            initial = current_obj,
            "search started"
        );
        self.state = SearchState::Searching;

        for generation in 0..self.config.max_generations {
            if cancel.as_ref().is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                termination = Termination::Cancelled;
                break;
            }

            let batch = self.generator.generate_mixed(
                &current,
                &weights.weights(),
                params.neighbors,
                &mut rng,
            );
            if batch.is_empty() {
                termination = Termination::EarlyStop;
                break;
            }

            let mut scored = self.evaluator.evaluate(batch, instance, self.oracle, &self.decoder);
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));

            let admitted = scored
                .iter()
                .position(|(candidate, objective)| !tabu.forbidden(&candidate.tour, *objective, best.objective));
            let chosen = match admitted {
                Some(i) => Some(i),
                None if !scored.is_empty() => {
                    tracing::trace!(generation, "every candidate is tabu; taking the best one");
                    Some(0)
                }
                None => None,
            };

            let mut improved = false;
            if let Some(i) = chosen {
                let (candidate, objective) = scored.swap_remove(i);
                let outcome = if objective < best.objective {
                    Outcome::NewBest
                } else if objective < current_obj {
                    Outcome::Improved
                } else {
                    Outcome::Accepted
                };
                weights.record(candidate.kind, outcome);
                current = candidate.tour;
                current_obj = objective;
                tabu.add(&current);
                if best.offer(&current, current_obj, generation) {
                    tabu.record_elite(&current, current_obj);
                    improved = true;
                }
            }

            let refine_due = self.config.refine_interval > 0
                && (generation + 1) % self.config.refine_interval == 0;
            if refine_due && current_obj.is_finite() {
                let refined =
                    self.refiner
                        .refine_scored(&current, current_obj, instance, self.oracle, k);
                if refined.moves > 0 {
                    current = refined.tour;
                    current_obj = refined.objective;
                    tabu.add(&current);
                    if best.offer(&current, current_obj, generation) {
                        tabu.record_elite(&current, current_obj);
                        improved = true;
                    }
                }
            }

            weights.end_generation();
            history.push(best.objective);

            if improved {
                tracing::debug!(generation, best = best.objective, "new best");
                no_improvement = 0;
                stagnation = 0;
            } else {
                no_improvement += 1;
                stagnation += 1;
            }

            if unchanged.observe(best.objective) >= self.config.unchanged_run {
                params.perturb(&self.config.bounds, &mut rng);
                tabu.resize(params.tabu_size);
                unchanged.reset();
                meta_adjustments += 1;
                tracing::debug!(
                    generation,
                    tabu_size = params.tabu_size,
                    neighbors = params.neighbors,
                    stagnation = params.stagnation,
                    "meta-parameters perturbed"
                );
            }

            if no_improvement >= self.config.early_stop {
                termination = Termination::EarlyStop;
                break;
            }

            if stagnation >= params.stagnation {
                self.state = SearchState::Diversifying;
                current = diversify(&current, &mut rng);
                current_obj = self.decoder.evaluate(&current, instance, self.oracle);
                tabu.clear();
                tabu.resize(params.tabu_size);
                tabu.add(&current);
                stagnation = 0;
                diversifications += 1;
                tracing::debug!(generation, objective = current_obj, "diversified");
                self.state = SearchState::Searching;
            }
        }

        self.state = SearchState::Terminated;

        if !best.objective.is_finite() {
            return Err(OptimizeError::NoFeasibleSolution {
                reason: format!(
                    "no tour fits {} vehicles after {} generations",
                    instance.max_vehicle_count(),
                    history.len()
                ),
            });
        }
        let solution = self.decoder.decode(&best.tour, instance).ok_or_else(|| {
            OptimizeError::NoFeasibleSolution {
                reason: "best tour no longer decodes within the fleet bound".into(),
            }
        })?;
        let travel_cost = RouteDecoder::travel_cost(&solution, instance, self.oracle);

        tracing::info!(
            objective = best.objective,
            routes = solution.num_routes(),
            travel_cost,
            generations = history.len(),
            best_generation = best.generation,
            diversifications,
            termination = ?termination,
            "search finished"
        );

        Ok(SearchOutcome {
            solution,
            tour: best.tour,
            objective: best.objective,
            travel_cost,
            generations: history.len(),
            best_generation: best.generation,
            diversifications,
            meta_adjustments,
            termination,
            params,
            operator_weights: weights.snapshot(),
            history,
        })
    }

    /// Builds the configured initial tour; if it does not fit the fleet,
    /// tries the other constructions and keeps the best.
    fn initial_tour(&self, distances: &DistanceMatrix) -> (Tour, f64) {
        let score = |tour: &Tour| self.decoder.evaluate(tour, self.instance, self.oracle);

        let tour = self.config.construction.build(self.instance, distances);
        let objective = score(&tour);
        if objective.is_finite() {
            return (tour, objective);
        }

        let mut best = (tour, objective);
        for construction in Construction::ALL {
            if construction == self.config.construction {
                continue;
            }
            let tour = construction.build(self.instance, distances);
            let objective = score(&tour);
            tracing::debug!(?construction, objective, "fallback construction");
            if objective < best.1 {
                best = (tour, objective);
            }
        }
        if !best.1.is_finite() {
            tracing::warn!("no construction fits the fleet; searching from an infeasible tour");
        }
        best
    }
}
