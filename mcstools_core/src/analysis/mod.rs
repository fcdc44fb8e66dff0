//! Constraint based analyses of metabolic models
//!
//! All analyses solve linear problems built with
//! [`Model::to_problem`](crate::metabolic_model::model::Model::to_problem), using
//! [`ClarabelSolver`](crate::optimize::solvers::clarabel::ClarabelSolver) unless a solver is
//! passed explicitly.
use thiserror::Error;

use crate::metabolic_model::medium::MediumError;
use crate::optimize::problem::ProblemError;
use crate::optimize::solvers::SolverError;
use crate::optimize::OptimizationStatus;

pub mod carbon_sources;
pub mod consistency;
pub mod fba;
pub mod fva;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Unable to build the optimization problem: {0}")]
    Problem(#[from] ProblemError),
    #[error("Solver failed: {0}")]
    Solver(#[from] SolverError),
    #[error("Optimization finished with status {0:?}")]
    NotOptimal(OptimizationStatus),
    #[error("Reaction {0} is not part of the model")]
    UnknownReaction(String),
    #[error("Objective changed from {original} to {consistent}")]
    ObjectiveDrift { original: f64, consistent: f64 },
    #[error(transparent)]
    Medium(#[from] MediumError),
    #[error("Unable to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
