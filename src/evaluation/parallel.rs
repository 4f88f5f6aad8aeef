//! Batch scoring of candidate tours on a dedicated worker pool.

use std::panic::{catch_unwind, AssertUnwindSafe};

use rayon::prelude::*;

use crate::decoder::RouteDecoder;
use crate::error::OptimizeError;
use crate::models::ProblemInstance;
use crate::oracle::CostOracle;

/// Default worker count: half the logical cores, at least one.
pub fn default_threads() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get() / 2)
        .unwrap_or(1)
        .max(1)
}

/// Scores candidate batches in parallel.
///
/// Owns a rayon pool that lives as long as the evaluator, so one search
/// run reuses the same workers for every generation. Workers only read
/// the instance and the oracle cache.
///
/// Candidates that score `+INF` or panic while scoring are dropped; the
/// rest come back in their input order.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::decoder::RouteDecoder;
/// use u_tabu_routing::evaluation::ParallelEvaluator;
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, CostOracle, OracleConfig, PlanarProvider};
///
/// let instance = ProblemInstance::new(
///     Coordinate::planar(0.0, 0.0),
///     vec![
///         Customer::new(1, Coordinate::planar(1.0, 0.0), 6.0),
///         Customer::new(2, Coordinate::planar(2.0, 0.0), 6.0),
///     ],
///     10.0,
///     1,
/// )
/// .unwrap();
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
/// assert!(oracle.precompute(&instance));
///
/// let evaluator = ParallelEvaluator::new(Some(2)).unwrap();
/// // Both customers cannot share one vehicle: every tour needs 2 routes.
/// let scored = evaluator.evaluate(
///     vec![vec![1, 2], vec![2, 1]],
///     &instance,
///     &oracle,
///     &RouteDecoder::default(),
/// );
/// assert!(scored.is_empty());
/// ```
pub struct ParallelEvaluator {
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for ParallelEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelEvaluator")
            .field("threads", &self.threads())
            .finish()
    }
}

impl ParallelEvaluator {
    /// Builds the worker pool; `None` uses [`default_threads`].
    pub fn new(threads: Option<usize>) -> Result<Self, OptimizeError> {
        let threads = match threads {
            Some(0) => {
                return Err(OptimizeError::InvalidConfig(
                    "evaluator thread count must be at least 1".into(),
                ))
            }
            Some(n) => n,
            None => default_threads(),
        };
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("tabu-eval-{i}"))
            .build()
            .map_err(|e| OptimizeError::InvalidConfig(format!("cannot start evaluator pool: {e}")))?;
        tracing::debug!(threads, "evaluator pool started");
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Scores every candidate and keeps the feasible ones.
    pub fn evaluate<T, O>(
        &self,
        candidates: Vec<T>,
        instance: &ProblemInstance,
        oracle: &O,
        decoder: &RouteDecoder,
    ) -> Vec<(T, f64)>
    where
        T: AsRef<[usize]> + Send,
        O: CostOracle + ?Sized,
    {
        let submitted = candidates.len();
        let scored: Vec<(T, f64)> = self.pool.install(|| {
            candidates
                .into_par_iter()
                .filter_map(|candidate| {
                    let outcome = catch_unwind(AssertUnwindSafe(|| {
                        decoder.evaluate(candidate.as_ref(), instance, oracle)
                    }));
                    match outcome {
                        Ok(objective) if objective.is_finite() => Some((candidate, objective)),
                        Ok(_) => None,
                        Err(_) => {
                            tracing::warn!(
                                len = candidate.as_ref().len(),
                                "candidate evaluation failed; dropping it"
                            );
                            None
                        }
                    }
                })
                .collect()
        });
        if scored.len() < submitted {
            tracing::trace!(submitted, kept = scored.len(), "dropped infeasible candidates");
        }
        scored
    }
}
