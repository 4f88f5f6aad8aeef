//! Candidate evaluation.
//!
//! [`ParallelEvaluator`] decodes and scores one generation's candidates on
//! a bounded worker pool, dropping those that are infeasible, unreachable,
//! or fail while scoring.

mod parallel;

pub use parallel::{default_threads, ParallelEvaluator};
