//! Error taxonomy.
//!
//! Three layers of failure are kept apart so that callers can give
//! different advice for each:
//!
//! - [`InstanceError`] — the problem data itself is invalid; raised at
//!   construction and never reaches the search loop.
//! - [`LoadError`] — an instance file could not be read or parsed.
//! - [`OptimizeError`] — a run could not produce a usable result: the
//!   configuration is invalid, the cost oracle could not be populated,
//!   or no feasible solution exists under the fleet bound.

/// Validation failure while building a [`ProblemInstance`](crate::models::ProblemInstance).
#[derive(Debug, Clone, PartialEq)]
pub enum InstanceError {
    /// Vehicle capacity is zero, negative, or not finite.
    NonPositiveCapacity(f64),
    /// The fleet bound is zero.
    ZeroFleet,
    /// A customer demand is negative or not finite.
    InvalidDemand { id: usize, demand: f64 },
    /// A single customer demand exceeds the vehicle capacity.
    DemandExceedsCapacity { id: usize, demand: f64, capacity: f64 },
    /// Two customers share an id.
    DuplicateCustomer(usize),
    /// Customer ids are not exactly `1..=N`.
    NonDenseIds { expected: usize, found: usize },
    /// A coordinate component is not finite.
    InvalidCoordinate { id: usize },
}

impl std::fmt::Display for InstanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceError::NonPositiveCapacity(c) => {
                write!(f, "vehicle capacity must be positive, got {c}")
            }
            InstanceError::ZeroFleet => write!(f, "maximum vehicle count must be at least 1"),
            InstanceError::InvalidDemand { id, demand } => {
                write!(f, "customer {id} has invalid demand {demand}")
            }
            InstanceError::DemandExceedsCapacity {
                id,
                demand,
                capacity,
            } => write!(
                f,
                "customer {id} demand {demand} exceeds vehicle capacity {capacity}"
            ),
            InstanceError::DuplicateCustomer(id) => write!(f, "duplicate customer id {id}"),
            InstanceError::NonDenseIds { expected, found } => write!(
                f,
                "customer ids must be dense in 1..=N: expected id {expected}, found {found}"
            ),
            InstanceError::InvalidCoordinate { id } => {
                write!(f, "location {id} has a non-finite coordinate")
            }
        }
    }
}

impl std::error::Error for InstanceError {}

/// Failure while loading an instance from text.
#[derive(Debug)]
pub enum LoadError {
    Io(std::io::Error),
    Parse { line: usize, message: String },
    MissingDepot,
    MissingFleet,
    Instance(InstanceError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoadError::Io(err) => write!(f, "failed to read instance: {err}"),
            LoadError::Parse { line, message } => write!(f, "line {line}: {message}"),
            LoadError::MissingDepot => write!(f, "instance has no depot row (id 0)"),
            LoadError::MissingFleet => {
                write!(f, "instance has no vehicle line (count and capacity)")
            }
            LoadError::Instance(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(err) => Some(err),
            LoadError::Instance(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(err: std::io::Error) -> Self {
        LoadError::Io(err)
    }
}

impl From<InstanceError> for LoadError {
    fn from(err: InstanceError) -> Self {
        LoadError::Instance(err)
    }
}

/// Failure of an optimization run.
#[derive(Debug, Clone, PartialEq)]
pub enum OptimizeError {
    /// The search configuration failed validation.
    InvalidConfig(String),
    /// The cost oracle could not compute any distances.
    OracleUnavailable,
    /// Distances are known but no route plan fits the fleet bound.
    NoFeasibleSolution { reason: String },
}

impl OptimizeError {
    /// Advice to present to the user for this failure.
    pub fn remediation(&self) -> &'static str {
        match self {
            OptimizeError::InvalidConfig(_) => "fix the search configuration and retry",
            OptimizeError::OracleUnavailable => {
                "check network connectivity and the distance provider, then retry"
            }
            OptimizeError::NoFeasibleSolution { .. } => {
                "reduce the number of customers, raise vehicle capacity, or allow more vehicles"
            }
        }
    }
}

impl std::fmt::Display for OptimizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptimizeError::InvalidConfig(msg) => write!(f, "invalid search configuration: {msg}"),
            OptimizeError::OracleUnavailable => {
                write!(f, "cost oracle unavailable: distance precomputation failed")
            }
            OptimizeError::NoFeasibleSolution { reason } => {
                write!(f, "no feasible solution: {reason}")
            }
        }
    }
}

impl std::error::Error for OptimizeError {}
