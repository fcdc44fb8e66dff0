//! Provides struct for representing a constraint in an optimization problem

/// A variable (by index in the problem) together with its coefficient
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstraintTerm {
    pub variable: usize,
    pub coefficient: f64,
}

/// Represents a linear constraint in an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Represents an equality constraint, where `terms` = `equals`
    Equality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The right hand side of the equality constraint
        equals: f64,
    },
    /// Represents an inequality constraint, `lower_bound` <= `terms` <= `upper_bound`
    ///
    /// Either bound may be infinite.
    Inequality {
        /// Linear terms which are added together, see [`ConstraintTerm`] for more
        terms: Vec<ConstraintTerm>,
        /// The lowest value the sum of the terms can take
        lower_bound: f64,
        /// The highest value the sum of the terms can take
        upper_bound: f64,
    },
}

impl Constraint {
    /// Create a new equality constraint
    ///
    /// # Parameters
    /// - `variables`: Indices of the variables
    /// - `coefficients`: A slice of coefficients for the variables
    /// - `equals`: The right hand side of the equality
    ///
    /// # Examples
    /// ```rust
    /// use mcstools_core::optimize::constraint::Constraint;
    /// // Create a constraint representing 3*x_0 + 2*x_1 = 6
    /// let new_constraint = Constraint::new_equality(&[0, 1], &[3.0, 2.0], 6.);
    /// assert_eq!(new_constraint.terms().len(), 2);
    /// ```
    pub fn new_equality(variables: &[usize], coefficients: &[f64], equals: f64) -> Self {
        Constraint::Equality {
            terms: Constraint::zip_into_terms(variables, coefficients),
            equals,
        }
    }

    /// Create a new inequality constraint
    pub fn new_inequality(
        variables: &[usize],
        coefficients: &[f64],
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Constraint::Inequality {
            terms: Constraint::zip_into_terms(variables, coefficients),
            lower_bound,
            upper_bound,
        }
    }

    pub fn terms(&self) -> &[ConstraintTerm] {
        match self {
            Constraint::Equality { terms, .. } => terms,
            Constraint::Inequality { terms, .. } => terms,
        }
    }

    fn zip_into_terms(variables: &[usize], coefficients: &[f64]) -> Vec<ConstraintTerm> {
        variables
            .iter()
            .zip(coefficients)
            .map(|(variable, coefficient)| ConstraintTerm {
                variable: *variable,
                coefficient: *coefficient,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inequality_terms() {
        let cons = Constraint::new_inequality(&[0, 2], &[1., -1.], f64::NEG_INFINITY, 4.);
        match cons {
            Constraint::Inequality {
                ref terms,
                lower_bound,
                upper_bound,
            } => {
                assert_eq!(terms.len(), 2);
                assert_eq!(terms[1].variable, 2);
                assert!((terms[1].coefficient + 1.).abs() < 1e-25);
                assert!(lower_bound.is_infinite());
                assert!((upper_bound - 4.).abs() < 1e-25);
            }
            Constraint::Equality { .. } => panic!("Incorrect constraint type created"),
        }
    }
}
