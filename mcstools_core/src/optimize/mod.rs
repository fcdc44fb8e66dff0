//! Module for constructing and solving optimization problems

pub mod constraint;
pub mod objective;
pub mod problem;
pub mod solvers;
pub mod variable;

use indexmap::IndexMap;

/// Outcome of solving a [`problem::Problem`]
#[derive(Debug, Clone, PartialEq)]
pub struct ProblemSolution {
    pub status: OptimizationStatus,
    /// Objective value, only set for usable statuses
    pub objective_value: Option<f64>,
    /// Variable values keyed by variable id, only set for usable statuses
    pub variable_values: Option<IndexMap<String, f64>>,
}

impl ProblemSolution {
    /// A solution without values, for problems which could not be solved
    pub fn failed(status: OptimizationStatus) -> Self {
        ProblemSolution {
            status,
            objective_value: None,
            variable_values: None,
        }
    }
}

/// Termination status reported by a solver
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum OptimizationStatus {
    /// Solved to the requested tolerances
    Optimal,
    /// Solved to reduced tolerances
    AlmostOptimal,
    /// Objective can grow without bound
    Unbounded,
    /// No point satisfies all constraints
    Infeasible,
    /// A numerical error occurred during solving
    NumericalError,
    /// Iteration or time limit reached, or the solver stalled
    SolverHalted,
}

impl OptimizationStatus {
    /// Whether the solution values can be used
    pub fn is_usable(&self) -> bool {
        matches!(
            self,
            OptimizationStatus::Optimal | OptimizationStatus::AlmostOptimal
        )
    }
}
