//! This module provides a struct for representing reactions
use derive_builder::Builder;
use indexmap::IndexMap;
use serde_json::Value;

use crate::configuration::Configuration;
use crate::metabolic_model::gene::Gpr;

/// Represents a reaction in the metabolic model
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Reaction {
    /// Used to identify the reaction
    pub id: String,
    /// Metabolite stoichiometry of the reaction, negative for reactants
    #[builder(default = "IndexMap::new()")]
    pub metabolites: IndexMap<String, f64>,
    /// Human-readable reaction name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Gene Protein Reaction rule
    #[builder(default = "None")]
    pub gpr: Option<Gpr>,
    /// Lower flux bound
    #[builder(default = "Configuration::current().lower_bound")]
    pub lower_bound: f64,
    /// Upper flux bound
    #[builder(default = "Configuration::current().upper_bound")]
    pub upper_bound: f64,
    /// Reaction subsystem
    #[builder(default = "None")]
    pub subsystem: Option<String>,
    /// Notes about the reaction
    #[builder(default = "None")]
    pub notes: Option<Value>,
    /// Reaction Annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Reaction {
    /// Whether flux can run in both directions (`lower_bound < 0 < upper_bound`)
    pub fn reversibility(&self) -> bool {
        self.lower_bound < 0. && self.upper_bound > 0.
    }

    /// Reactions with a single metabolite exchange mass with the outside of the system
    pub fn is_boundary(&self) -> bool {
        self.metabolites.len() == 1
    }

    /// Metabolites consumed in the forward direction
    pub fn reactants(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef < 0.)
            .map(|(met, _)| met.as_str())
    }

    /// Metabolites produced in the forward direction
    pub fn products(&self) -> impl Iterator<Item = &str> {
        self.metabolites
            .iter()
            .filter(|(_, coef)| **coef > 0.)
            .map(|(met, _)| met.as_str())
    }

    /// The GPR rule as a string, empty when the reaction has no rule
    pub fn gene_reaction_rule(&self) -> String {
        self.gpr
            .as_ref()
            .map(|rule| rule.to_string_id())
            .unwrap_or_default()
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower_bound, self.upper_bound)
    }

    pub fn set_bounds(&mut self, lower_bound: f64, upper_bound: f64) {
        self.lower_bound = lower_bound;
        self.upper_bound = upper_bound;
    }
}
