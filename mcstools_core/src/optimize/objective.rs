//! Provides struct for representing an optimization problem's objective

/// Represents the linear objective of an optimization problem
#[derive(Debug, Clone, PartialEq)]
pub struct Objective {
    /// Terms included in the objective (See [`ObjectiveTerm`])
    terms: Vec<ObjectiveTerm>,
    /// Sense of the objective (maximize, or minimize), see [`ObjectiveSense`]
    sense: ObjectiveSense,
}

impl Objective {
    /// Create a new empty objective, with a given sense
    pub fn new(sense: ObjectiveSense) -> Self {
        Self {
            terms: Vec::new(),
            sense,
        }
    }

    /// Create a new empty maximization objective
    pub fn new_maximize() -> Self {
        Self::new(ObjectiveSense::Maximize)
    }

    /// Create a new empty minimization objective
    pub fn new_minimize() -> Self {
        Self::new(ObjectiveSense::Minimize)
    }

    /// Change the sense of the objective
    pub fn set_sense(&mut self, sense: ObjectiveSense) {
        self.sense = sense;
    }

    pub fn sense(&self) -> ObjectiveSense {
        self.sense
    }

    /// Add a new term to the objective, coefficients of the same variable add up
    pub fn add_term(&mut self, term: ObjectiveTerm) {
        match self.terms.iter_mut().find(|t| t.variable == term.variable) {
            Some(existing) => existing.coefficient += term.coefficient,
            None => self.terms.push(term),
        }
    }

    pub fn terms(&self) -> &[ObjectiveTerm] {
        &self.terms
    }

    pub fn remove_all_terms(&mut self) {
        self.terms.clear();
    }

    /// Value of the objective for the variable values `x`
    pub fn evaluate(&self, x: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|term| term.coefficient * x[term.variable])
            .sum()
    }
}

/// Represents the sense of the objective, whether it should be maximized or minimized
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveSense {
    /// The objective should be minimized
    Minimize,
    /// The objective should be maximized
    Maximize,
}

/// A linear term in the objective
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectiveTerm {
    /// Index of the variable in the problem
    pub variable: usize,
    /// Coefficient for linear term
    pub coefficient: f64,
}

impl ObjectiveTerm {
    pub fn new(variable: usize, coefficient: f64) -> Self {
        ObjectiveTerm {
            variable,
            coefficient,
        }
    }
}
