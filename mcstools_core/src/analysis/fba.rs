//! Flux balance analysis
use indexmap::IndexMap;
use log::debug;

use crate::analysis::AnalysisError;
use crate::metabolic_model::model::Model;
use crate::optimize::solvers::clarabel::ClarabelSolver;
use crate::optimize::solvers::Solver;

/// Optimal objective value together with the fluxes achieving it
#[derive(Debug, Clone, PartialEq)]
pub struct FluxSolution {
    pub objective_value: f64,
    pub fluxes: IndexMap<String, f64>,
}

impl Model {
    /// Optimal value of the model objective
    ///
    /// # Errors
    /// [`AnalysisError::NotOptimal`] when the problem is infeasible or can't be solved
    pub fn optimize(&self) -> Result<f64, AnalysisError> {
        Ok(self.flux_balance_analysis(&ClarabelSolver::default())?.objective_value)
    }

    /// Solve the flux balance problem of the model with `solver`
    pub fn flux_balance_analysis<S: Solver + ?Sized>(
        &self,
        solver: &S,
    ) -> Result<FluxSolution, AnalysisError> {
        let solution = self.to_problem()?.solve(solver)?;
        debug!("FBA finished with status {:?}", solution.status);
        match (solution.objective_value, solution.variable_values) {
            (Some(objective_value), Some(fluxes)) if solution.status.is_usable() => {
                Ok(FluxSolution {
                    objective_value,
                    fluxes,
                })
            }
            _ => Err(AnalysisError::NotOptimal(solution.status)),
        }
    }

    /// Whether the model reaches an objective value above `tolerance`
    ///
    /// Infeasible models are not viable, solver failures are still errors.
    pub fn is_viable(&self, tolerance: f64) -> Result<bool, AnalysisError> {
        match self.optimize() {
            Ok(value) => Ok(value > tolerance),
            Err(AnalysisError::NotOptimal(status)) => {
                debug!("Model is not viable, optimization status {:?}", status);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }
}
