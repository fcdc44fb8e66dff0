//! Provides struct representing an optimization problem
use indexmap::IndexMap;
use thiserror::Error;

use crate::optimize::constraint::Constraint;
use crate::optimize::objective::{Objective, ObjectiveSense, ObjectiveTerm};
use crate::optimize::solvers::{Solver, SolverError};
use crate::optimize::variable::Variable;
use crate::optimize::ProblemSolution;

/// A linear optimization problem with continuous variables
#[derive(Debug, Clone, PartialEq)]
pub struct Problem {
    /// Objective to optimize
    objective: Objective,
    /// Variables of the optimization problem, in column order
    variables: IndexMap<String, Variable>,
    /// Constraints of the optimization problem
    constraints: IndexMap<String, Constraint>,
}

impl Problem {
    // region Creation Functions
    /// Create a new optimization problem
    pub fn new(objective_sense: ObjectiveSense) -> Self {
        Self {
            objective: Objective::new(objective_sense),
            variables: IndexMap::new(),
            constraints: IndexMap::new(),
        }
    }

    /// Create a new maximization problem
    pub fn new_maximization() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new minimization problem
    pub fn new_minimization() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }
    // endregion Creation Functions

    // region Accessors
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.variables.values()
    }

    pub fn constraints(&self) -> impl Iterator<Item = (&str, &Constraint)> {
        self.constraints.iter().map(|(id, cons)| (id.as_str(), cons))
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Column index of the variable `id`
    pub fn variable_index(&self, id: &str) -> Option<usize> {
        self.variables.get_index_of(id)
    }
    // endregion Accessors

    /// Update the objective sense of the problem
    pub fn update_objective_sense(&mut self, sense: ObjectiveSense) {
        self.objective.set_sense(sense);
    }

    // region Adding Variables
    /// Add a variable to the optimization problem
    ///
    /// # Returns
    /// The column index of the new variable
    pub fn add_variable(&mut self, variable: Variable) -> Result<usize, ProblemError> {
        if self.variables.contains_key(&variable.id) {
            return Err(ProblemError::VariableIdAlreadyExists(variable.id));
        }
        if variable.lower_bound > variable.upper_bound {
            return Err(ProblemError::InvalidVariableBounds(variable.id));
        }
        let (index, _) = self.variables.insert_full(variable.id.clone(), variable);
        Ok(index)
    }

    /// Create a new variable and add it to the optimization problem
    pub fn add_new_variable(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<usize, ProblemError> {
        self.add_variable(Variable {
            id: id.to_string(),
            name: None,
            lower_bound,
            upper_bound,
        })
    }

    /// Update the bounds of a variable
    pub fn update_variable_bounds(
        &mut self,
        id: &str,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        if lower_bound > upper_bound {
            return Err(ProblemError::InvalidVariableBounds(id.to_string()));
        }
        match self.variables.get_mut(id) {
            Some(var) => {
                var.lower_bound = lower_bound;
                var.upper_bound = upper_bound;
                Ok(())
            }
            None => Err(ProblemError::NonExistentVariable(id.to_string())),
        }
    }
    // endregion Adding Variables

    // region Adding Constraints
    /// Add a constraint to the problem
    pub fn add_constraint(&mut self, id: &str, constraint: Constraint) -> Result<(), ProblemError> {
        if self.constraints.contains_key(id) {
            return Err(ProblemError::ConstraintAlreadyExists(id.to_string()));
        }
        if let Constraint::Inequality {
            lower_bound,
            upper_bound,
            ..
        } = &constraint
        {
            if lower_bound > upper_bound {
                return Err(ProblemError::InvalidConstraintBounds(id.to_string()));
            }
        }
        if constraint
            .terms()
            .iter()
            .any(|term| term.variable >= self.variables.len())
        {
            return Err(ProblemError::NonExistentVariablesInConstraint(
                id.to_string(),
            ));
        }
        self.constraints.insert(id.to_string(), constraint);
        Ok(())
    }

    /// Create a new equality constraint using variable ids, and add it to the problem
    pub fn add_new_equality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        equals: f64,
    ) -> Result<(), ProblemError> {
        let indices = self.indices_of(id, variables)?;
        self.add_constraint(id, Constraint::new_equality(&indices, coefficients, equals))
    }

    /// Create a new inequality constraint using variable ids, and add it to the problem
    pub fn add_new_inequality_constraint_by_id(
        &mut self,
        id: &str,
        variables: &[&str],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Result<(), ProblemError> {
        let indices = self.indices_of(id, variables)?;
        self.add_constraint(
            id,
            Constraint::new_inequality(&indices, coefficients, lower_bound, upper_bound),
        )
    }

    /// Remove a constraint (by id) from the problem
    pub fn remove_constraint(&mut self, constraint_id: &str) -> Option<Constraint> {
        self.constraints.shift_remove(constraint_id)
    }

    fn indices_of(&self, constraint: &str, variables: &[&str]) -> Result<Vec<usize>, ProblemError> {
        variables
            .iter()
            .map(|v| {
                self.variable_index(v).ok_or_else(|| {
                    ProblemError::NonExistentVariablesInConstraint(constraint.to_string())
                })
            })
            .collect()
    }
    // endregion Adding Constraints

    // region Objective Terms
    /// Add a new linear term to the objective using the variable id
    pub fn add_new_linear_objective_term_by_id(
        &mut self,
        variable_id: &str,
        coefficient: f64,
    ) -> Result<(), ProblemError> {
        let variable = self
            .variable_index(variable_id)
            .ok_or_else(|| ProblemError::NonExistentVariablesInObjective(variable_id.to_string()))?;
        self.objective
            .add_term(ObjectiveTerm::new(variable, coefficient));
        Ok(())
    }

    /// Remove all terms from the objective
    pub fn remove_all_objective_terms(&mut self) {
        self.objective.remove_all_terms();
    }
    // endregion Objective Terms

    /// Solve the problem with `solver`
    pub fn solve<S: Solver + ?Sized>(&self, solver: &S) -> Result<ProblemSolution, SolverError> {
        solver.solve(self)
    }
}

/// Errors associated with the Problem
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProblemError {
    /// Error when trying to add a variable with the same id as an existing variable
    #[error("Tried to add variable {0} which already exists")]
    VariableIdAlreadyExists(String),
    /// Error when trying to add variable with invalid bounds
    #[error("Variable {0} has lower_bound > upper_bound")]
    InvalidVariableBounds(String),
    /// Error when trying to add a constraint with the same id as an existing constraint
    #[error("Tried to add constraint {0} which already exists")]
    ConstraintAlreadyExists(String),
    /// Error when trying to add a constraint with invalid bounds
    #[error("Inequality constraint {0} has lower_bound > upper_bound")]
    InvalidConstraintBounds(String),
    /// Error when trying to add a constraint that contains variables not in the problem
    #[error("Constraint {0} references variables not in the problem")]
    NonExistentVariablesInConstraint(String),
    /// Error when trying to add an objective term which includes variables not in the problem
    #[error("Objective term references variable {0} which is not in the problem")]
    NonExistentVariablesInObjective(String),
    /// Error when trying to perform an update on a variable that doesn't exist
    #[error("Tried to access variable {0} which doesn't exist")]
    NonExistentVariable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_problem() {
        let max_problem = Problem::new_maximization();
        assert_eq!(max_problem.objective.sense(), ObjectiveSense::Maximize);

        let mut min_problem = Problem::new_minimization();
        assert_eq!(min_problem.objective.sense(), ObjectiveSense::Minimize);
        min_problem.update_objective_sense(ObjectiveSense::Maximize);
        assert_eq!(min_problem.objective.sense(), ObjectiveSense::Maximize);
    }

    #[test]
    fn add_variables() {
        let mut problem = Problem::new_maximization();
        assert_eq!(problem.add_new_variable("x", 64., 100.).unwrap(), 0);
        assert_eq!(problem.add_new_variable("y", 0., 1.).unwrap(), 1);
        assert_eq!(problem.variable_index("y"), Some(1));
        match problem.add_new_variable("x", 0., 1.) {
            Err(ProblemError::VariableIdAlreadyExists(id)) => assert_eq!(id, "x"),
            _ => panic!("Duplicate variable not caught"),
        }
        if let Err(ProblemError::InvalidVariableBounds(_)) =
            problem.add_new_variable("z", 100., 64.)
        {
        } else {
            panic!("Invalid variable bounds not caught")
        }
        problem.update_variable_bounds("x", -1., 1.).unwrap();
        let x = problem.variables().next().unwrap();
        assert!((x.lower_bound + 1.).abs() < 1e-25);
        assert!(problem.update_variable_bounds("w", 0., 1.).is_err());
    }

    #[test]
    fn add_constraint() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 64., 100.).unwrap();
        problem.add_new_variable("y", 64., 100.).unwrap();

        problem
            .add_new_equality_constraint_by_id("balance", &["x", "y"], &[2., 3.], 200.)
            .unwrap();
        problem
            .add_new_inequality_constraint_by_id("limit", &["x", "y"], &[2., 3.], 100., 200.)
            .unwrap();
        assert_eq!(problem.num_constraints(), 2);

        let (id, cons) = problem.constraints().next().unwrap();
        assert_eq!(id, "balance");
        match cons {
            Constraint::Equality { equals, .. } => assert!((equals - 200.).abs() < 1e-25),
            Constraint::Inequality { .. } => panic!("Incorrect constraint type added"),
        }

        assert!(matches!(
            problem.add_new_inequality_constraint_by_id("bad", &["x", "y"], &[2., 3.], 200., 100.),
            Err(ProblemError::InvalidConstraintBounds(_))
        ));
        assert!(matches!(
            problem.add_new_equality_constraint_by_id("limit", &["x"], &[1.], 0.),
            Err(ProblemError::ConstraintAlreadyExists(_))
        ));
        assert!(matches!(
            problem.add_new_equality_constraint_by_id("unknown", &["q"], &[1.], 0.),
            Err(ProblemError::NonExistentVariablesInConstraint(_))
        ));

        assert!(problem.remove_constraint("limit").is_some());
        assert_eq!(problem.num_constraints(), 1);
    }

    #[test]
    fn objective_terms() {
        let mut problem = Problem::new_maximization();
        problem.add_new_variable("x", 0., 1.).unwrap();
        problem.add_new_linear_objective_term_by_id("x", 2.).unwrap();
        assert!(problem.add_new_linear_objective_term_by_id("y", 1.).is_err());
        assert_eq!(problem.objective().terms().len(), 1);
        problem.remove_all_objective_terms();
        assert!(problem.objective().terms().is_empty());
    }
}
