//! Module providing representation of optimization problem variables
use std::fmt::{Display, Formatter};

use derive_builder::Builder;

use crate::configuration::Configuration;

/// A continuous variable of an optimization problem
///
/// Either bound may be infinite.
#[derive(Builder, Debug, Clone, PartialEq)]
#[builder(setter(into))]
pub struct Variable {
    /// Used to identify the variable
    pub id: String,
    #[builder(default = "None")]
    pub name: Option<String>,
    #[builder(default = "Configuration::current().lower_bound")]
    pub lower_bound: f64,
    #[builder(default = "Configuration::current().upper_bound")]
    pub upper_bound: f64,
}

impl Variable {
    /// Whether the variable is fixed to a single value
    pub fn is_fixed(&self) -> bool {
        self.lower_bound == self.upper_bound
    }
}

impl Display for Variable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{} <= {} <= {}", self.lower_bound, name, self.upper_bound),
            None => write!(f, "{} <= {} <= {}", self.lower_bound, self.id, self.upper_bound),
        }
    }
}
