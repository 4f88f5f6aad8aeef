//! Search orchestration.
//!
//! - [`SearchController`] — the adaptive tabu search state machine
//! - [`SearchConfig`] — budgets, initial meta-parameters and their bounds
//! - [`optimize`] — precompute the oracle, then run the controller

mod adaptive;
mod config;
mod controller;
mod operators;

pub use adaptive::MetaParams;
pub use config::{Bound, MetaBounds, OperatorConfig, SearchConfig};
pub use controller::{SearchController, SearchOutcome, SearchState, Termination};

use crate::error::OptimizeError;
use crate::models::ProblemInstance;
use crate::oracle::CostOracle;

/// Precomputes `oracle` for `instance` and runs a search.
///
/// Fails with [`OptimizeError::OracleUnavailable`] without searching if
/// the oracle could not resolve any distance.
///
/// # Examples
///
/// ```
/// use u_tabu_routing::models::{Coordinate, Customer, ProblemInstance};
/// use u_tabu_routing::oracle::{CachedOracle, OracleConfig, PlanarProvider};
/// use u_tabu_routing::search::{optimize, SearchConfig};
///
/// let customers = vec![
///     Customer::new(1, Coordinate::planar(1.0, 1.0), 2.0),
///     Customer::new(2, Coordinate::planar(-1.0, 1.0), 2.0),
///     Customer::new(3, Coordinate::planar(-1.0, -1.0), 2.0),
///     Customer::new(4, Coordinate::planar(1.0, -1.0), 2.0),
/// ];
/// let instance =
///     ProblemInstance::new(Coordinate::planar(0.0, 0.0), customers, 10.0, 1).unwrap();
/// let mut oracle = CachedOracle::new(PlanarProvider).with_config(OracleConfig::no_delay());
///
/// let config = SearchConfig::default().with_max_generations(30).with_threads(1);
/// let outcome = optimize(&instance, &mut oracle, &config).unwrap();
/// assert_eq!(outcome.solution.num_routes(), 1);
/// ```
pub fn optimize<O: CostOracle + ?Sized>(
    instance: &ProblemInstance,
    oracle: &mut O,
    config: &SearchConfig,
) -> Result<SearchOutcome, OptimizeError> {
    config.validate().map_err(OptimizeError::InvalidConfig)?;
    if !oracle.precompute(instance) {
        tracing::error!(
            customers = instance.num_customers(),
            "cost oracle could not resolve any distance"
        );
        return Err(OptimizeError::OracleUnavailable);
    }
    SearchController::new(instance, &*oracle, config.clone())?.run()
}
