//! Implements a solver interface for Clarabel
//!
//! Clarabel solves `min 1/2 x'Px + q'x` subject to `Ax + s = b`, `s` in a product of cones.
//! Equalities (and fixed variables) become rows of the zero cone, finite inequality and
//! variable bounds become rows of the nonnegative cone.
use clarabel::algebra::CscMatrix as ClarabelCscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, NonnegativeConeT, SolverStatus,
    SupportedConeT, ZeroConeT,
};
use indexmap::IndexMap;
use log::debug;
use nalgebra_sparse::{CooMatrix, CscMatrix};

use crate::optimize::constraint::{Constraint, ConstraintTerm};
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::Problem;
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::{OptimizationStatus, ProblemSolution};

/// Interior point solver backed by Clarabel
#[derive(Debug, Clone)]
pub struct ClarabelSolver {
    /// Maximum number of interior point iterations
    pub max_iter: u32,
    /// Feasibility and duality gap tolerance
    pub tolerance: f64,
}

impl Default for ClarabelSolver {
    fn default() -> Self {
        ClarabelSolver {
            max_iter: 200,
            tolerance: 1e-9,
        }
    }
}

/// Rows of one cone block of the constraint matrix
#[derive(Default)]
struct ConeRows {
    entries: Vec<(usize, usize, f64)>,
    rhs: Vec<f64>,
}

impl ConeRows {
    fn push<I: IntoIterator<Item = (usize, f64)>>(&mut self, terms: I, rhs: f64) {
        let row = self.rhs.len();
        self.entries
            .extend(terms.into_iter().map(|(col, val)| (row, col, val)));
        self.rhs.push(rhs);
    }

    fn push_terms(&mut self, terms: &[ConstraintTerm], scale: f64, rhs: f64) {
        self.push(
            terms.iter().map(|t| (t.variable, scale * t.coefficient)),
            rhs,
        )
    }

    fn len(&self) -> usize {
        self.rhs.len()
    }
}

impl ClarabelSolver {
    fn cone_rows(problem: &Problem) -> (ConeRows, ConeRows) {
        let mut zero = ConeRows::default();
        let mut nonnegative = ConeRows::default();

        for (_, constraint) in problem.constraints() {
            match constraint {
                Constraint::Equality { terms, equals } => zero.push_terms(terms, 1., *equals),
                Constraint::Inequality {
                    terms,
                    lower_bound,
                    upper_bound,
                } => {
                    if lower_bound == upper_bound {
                        zero.push_terms(terms, 1., *upper_bound);
                        continue;
                    }
                    if upper_bound.is_finite() {
                        nonnegative.push_terms(terms, 1., *upper_bound);
                    }
                    if lower_bound.is_finite() {
                        nonnegative.push_terms(terms, -1., -lower_bound);
                    }
                }
            }
        }

        for (idx, variable) in problem.variables().enumerate() {
            if variable.is_fixed() {
                zero.push([(idx, 1.)], variable.upper_bound);
                continue;
            }
            if variable.upper_bound.is_finite() {
                nonnegative.push([(idx, 1.)], variable.upper_bound);
            }
            if variable.lower_bound.is_finite() {
                nonnegative.push([(idx, -1.)], -variable.lower_bound);
            }
        }
        (zero, nonnegative)
    }

    fn constraint_matrix(
        zero: &ConeRows,
        nonnegative: &ConeRows,
        num_variables: usize,
    ) -> ClarabelCscMatrix<f64> {
        let num_rows = zero.len() + nonnegative.len();
        let mut coo = CooMatrix::new(num_rows, num_variables);
        for (row, col, val) in &zero.entries {
            coo.push(*row, *col, *val);
        }
        for (row, col, val) in &nonnegative.entries {
            coo.push(zero.len() + row, *col, *val);
        }
        let csc = CscMatrix::from(&coo);
        ClarabelCscMatrix::new(
            num_rows,
            num_variables,
            csc.col_offsets().to_vec(),
            csc.row_indices().to_vec(),
            csc.values().to_vec(),
        )
    }
}

impl Solver for ClarabelSolver {
    fn solve(&self, problem: &Problem) -> Result<ProblemSolution, SolverError> {
        let num_variables = problem.num_variables();
        if num_variables == 0 {
            return Err(SolverError::EmptyProblem);
        }

        let (zero, nonnegative) = ClarabelSolver::cone_rows(problem);
        let a = ClarabelSolver::constraint_matrix(&zero, &nonnegative, num_variables);
        let b: Vec<f64> = zero
            .rhs
            .iter()
            .chain(nonnegative.rhs.iter())
            .copied()
            .collect();

        // Clarabel minimizes
        let sign = match problem.objective().sense() {
            ObjectiveSense::Maximize => -1.,
            ObjectiveSense::Minimize => 1.,
        };
        let mut q = vec![0.; num_variables];
        for term in problem.objective().terms() {
            q[term.variable] += sign * term.coefficient;
        }
        let p = ClarabelCscMatrix::<f64>::zeros((num_variables, num_variables));

        let mut cones: Vec<SupportedConeT<f64>> = Vec::with_capacity(2);
        if zero.len() > 0 {
            cones.push(ZeroConeT(zero.len()));
        }
        if nonnegative.len() > 0 {
            cones.push(NonnegativeConeT(nonnegative.len()));
        }

        let settings = DefaultSettingsBuilder::<f64>::default()
            .verbose(false)
            .max_iter(self.max_iter)
            .tol_feas(self.tolerance)
            .tol_gap_abs(self.tolerance)
            .tol_gap_rel(self.tolerance)
            .build()
            .map_err(|err| SolverError::InvalidSettings(err.to_string()))?;

        let mut solver = DefaultSolver::new(&p, &q, &a, &b, &cones, settings);
        solver.solve();

        let status = match solver.solution.status {
            SolverStatus::Solved => OptimizationStatus::Optimal,
            SolverStatus::AlmostSolved => OptimizationStatus::AlmostOptimal,
            SolverStatus::PrimalInfeasible | SolverStatus::AlmostPrimalInfeasible => {
                OptimizationStatus::Infeasible
            }
            SolverStatus::DualInfeasible | SolverStatus::AlmostDualInfeasible => {
                OptimizationStatus::Unbounded
            }
            SolverStatus::NumericalError => OptimizationStatus::NumericalError,
            _ => OptimizationStatus::SolverHalted,
        };
        debug!(
            "Clarabel finished with {:?} after {} iterations",
            solver.solution.status, solver.solution.iterations
        );
        if !status.is_usable() {
            return Ok(ProblemSolution::failed(status));
        }

        let x = &solver.solution.x;
        let variable_values: IndexMap<String, f64> = problem
            .variables()
            .zip(x.iter())
            .map(|(var, val)| (var.id.clone(), *val))
            .collect();
        Ok(ProblemSolution {
            status,
            objective_value: Some(problem.objective().evaluate(x)),
            variable_values: Some(variable_values),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maximize_bounded_sum() {
        // max x + y, x + y <= 4, 0 <= x <= 3, 0 <= y <= 3
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 3.).unwrap();
        problem.add_new_variable("y", 0., 3.).unwrap();
        problem
            .add_new_inequality_constraint_by_id(
                "cap",
                &["x", "y"],
                &[1., 1.],
                f64::NEG_INFINITY,
                4.,
            )
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        problem.add_new_linear_objective_term_by_id("y", 1.).unwrap();

        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        assert!(solution.status.is_usable());
        assert!((solution.objective_value.unwrap() - 4.).abs() < 1e-6);
    }

    #[test]
    fn minimize_with_equality() {
        // min x, x - y = 2, 1 <= y <= 5
        let mut problem = Problem::new_minimization();
        problem.add_new_variable("x", -10., 10.).unwrap();
        problem.add_new_variable("y", 1., 5.).unwrap();
        problem
            .add_new_equality_constraint_by_id("diff", &["x", "y"], &[1., -1.], 2.)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();

        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        let values = solution.variable_values.unwrap();
        assert!((values["x"] - 3.).abs() < 1e-6);
        assert!((values["y"] - 1.).abs() < 1e-6);
    }

    #[test]
    fn fixed_variable() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 2., 2.).unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        assert!((solution.objective_value.unwrap() - 2.).abs() < 1e-6);
    }

    #[test]
    fn infeasible_problem() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem
            .add_new_equality_constraint_by_id("impossible", &["x"], &[1.], 5.)
            .unwrap();
        problem.add_new_linear_objective_term_by_id("x", 1.).unwrap();
        let solution = problem.solve(&ClarabelSolver::default()).unwrap();
        assert_eq!(solution.status, OptimizationStatus::Infeasible);
        assert!(solution.objective_value.is_none());
    }

    #[test]
    fn empty_problem() {
        let problem = Problem::new_maximization();
        assert_eq!(
            problem.solve(&ClarabelSolver::default()),
            Err(SolverError::EmptyProblem)
        );
    }
}
