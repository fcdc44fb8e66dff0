//! Interfaces to the solvers able to optimize a [`Problem`]
use thiserror::Error;

use crate::optimize::problem::Problem;
use crate::optimize::ProblemSolution;

pub mod clarabel;

/// A solver for linear problems with continuous variables
///
/// Implementations must be shareable between threads, flux variability analysis solves problems
/// in parallel with a single solver.
pub trait Solver: Send + Sync {
    /// Optimize `problem`
    ///
    /// An infeasible or unbounded problem is not an error, it is reported through the status of
    /// the returned [`ProblemSolution`].
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError>;
}

/// Errors raised while setting up a solver
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SolverError {
    #[error("Problem has no variables to optimize")]
    EmptyProblem,
    #[error("Invalid solver settings: {0}")]
    InvalidSettings(String),
}
