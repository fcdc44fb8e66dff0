//! This module provides the Model struct for representing an entire metabolic model
use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};

use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::reaction::Reaction;
use crate::optimize::objective::ObjectiveSense;
use crate::optimize::problem::{Problem, ProblemError};

/// Represents a Genome Scale Metabolic Model
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    /// Map of reaction ids to Reactions
    pub reactions: IndexMap<String, Reaction>,
    /// Map of gene ids to Genes
    pub genes: IndexMap<String, Gene>,
    /// Map of metabolite ids to Metabolites
    pub metabolites: IndexMap<String, Metabolite>,
    /// Map of reaction ids to objective function coefficients
    pub objective: IndexMap<String, f64>,
    /// Whether the objective is maximized or minimized
    pub objective_sense: ObjectiveSense,
    /// Id associated with the Model
    pub id: Option<String>,
    /// Human readable name of the Model
    pub name: Option<String>,
    /// Compartments in the model
    ///
    /// An IndexMap<String, String> of {short name: long name}
    pub compartments: Option<IndexMap<String, String>>,
    /// A version identifier for the Model, stored as a string
    pub version: Option<String>,
}

impl Model {
    pub fn new_empty() -> Self {
        Model {
            reactions: IndexMap::new(),
            genes: IndexMap::new(),
            metabolites: IndexMap::new(),
            objective: IndexMap::new(),
            objective_sense: ObjectiveSense::Maximize,
            id: None,
            name: None,
            compartments: None,
            version: None,
        }
    }

    /// Add a reaction to the model
    ///
    /// Metabolites and genes referenced by the reaction which are not yet part of the model are
    /// added with only their id set.
    ///
    /// # Parameters
    /// - reaction: Reaction to add
    ///
    /// # Examples
    /// ```rust
    /// use mcstools_core::metabolic_model::model::Model;
    /// use mcstools_core::metabolic_model::reaction::ReactionBuilder;
    /// use indexmap::IndexMap;
    /// let mut model = Model::new_empty();
    /// let mut metabolites = IndexMap::new();
    /// metabolites.insert("glc__D_e".to_string(), -1.);
    /// let new_reaction = ReactionBuilder::default()
    ///     .id("EX_glc__D_e".to_string())
    ///     .metabolites(metabolites)
    ///     .build()
    ///     .unwrap();
    /// model.add_reaction(new_reaction);
    /// assert!(model.metabolites.contains_key("glc__D_e"));
    /// ```
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for met in reaction.metabolites.keys() {
            if !self.metabolites.contains_key(met) {
                debug!("Adding metabolite {} referenced by {}", met, reaction.id);
                self.metabolites.insert(met.clone(), Metabolite::new(met));
            }
        }
        if let Some(gpr) = &reaction.gpr {
            for gene in gpr.genes() {
                if !self.genes.contains_key(gene) {
                    self.genes.insert(gene.to_string(), Gene::new(gene));
                }
            }
        }
        self.reactions.insert(reaction.id.clone(), reaction);
    }

    /// Add a metabolite to the model, replacing any metabolite with the same id
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        self.metabolites.insert(metabolite.id.clone(), metabolite);
    }

    /// Add a gene to the model
    ///
    /// # Examples
    /// ```rust
    /// use mcstools_core::metabolic_model::gene::GeneBuilder;
    /// use mcstools_core::metabolic_model::model::Model;
    /// let mut model = Model::new_empty();
    /// let new_gene = GeneBuilder::default().id("new_gene".to_string()).build().unwrap();
    /// model.add_gene(new_gene);
    /// ```
    pub fn add_gene(&mut self, gene: Gene) {
        self.genes.insert(gene.id.clone(), gene);
    }

    /// Remove reactions (and their objective coefficients) from the model
    ///
    /// Metabolites and genes are kept, see [`Model::prune_unused_metabolites`]. Ids which are not
    /// part of the model are skipped with a warning.
    ///
    /// # Returns
    /// The removed reactions
    pub fn remove_reactions<S: AsRef<str>>(&mut self, reaction_ids: &[S]) -> Vec<Reaction> {
        let mut removed = Vec::with_capacity(reaction_ids.len());
        for id in reaction_ids {
            let id = id.as_ref();
            match self.reactions.shift_remove(id) {
                Some(reaction) => {
                    self.objective.shift_remove(id);
                    removed.push(reaction);
                }
                None => warn!("Reaction {} not in model, nothing removed", id),
            }
        }
        removed
    }

    /// Remove every metabolite which no reaction references
    ///
    /// # Returns
    /// The removed metabolites
    pub fn prune_unused_metabolites(&mut self) -> Vec<Metabolite> {
        let used: IndexSet<&str> = self
            .reactions
            .values()
            .flat_map(|r| r.metabolites.keys().map(|m| m.as_str()))
            .collect();
        let unused: Vec<String> = self
            .metabolites
            .keys()
            .filter(|m| !used.contains(m.as_str()))
            .cloned()
            .collect();
        unused
            .iter()
            .filter_map(|m| self.metabolites.shift_remove(m))
            .collect()
    }

    /// Model id, or `default` when the model has none
    pub fn id_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.id.as_deref().unwrap_or(default)
    }

    // region Optimization
    /// Build the flux balance problem of the model
    ///
    /// One variable per reaction (bounded by the reaction bounds), one steady state constraint
    /// `S v = 0` per metabolite and the model objective.
    pub fn to_problem(&self) -> Result<Problem, ProblemError> {
        let mut problem = Problem::new(self.objective_sense);
        for reaction in self.reactions.values() {
            problem.add_new_variable(&reaction.id, reaction.lower_bound, reaction.upper_bound)?;
        }

        let mut balances: IndexMap<&str, (Vec<&str>, Vec<f64>)> = self
            .metabolites
            .keys()
            .map(|m| (m.as_str(), (Vec::new(), Vec::new())))
            .collect();
        for reaction in self.reactions.values() {
            for (met, coef) in &reaction.metabolites {
                let (variables, coefficients) = balances.entry(met.as_str()).or_default();
                variables.push(reaction.id.as_str());
                coefficients.push(*coef);
            }
        }
        for (met, (variables, coefficients)) in balances {
            if variables.is_empty() {
                continue;
            }
            problem.add_new_equality_constraint_by_id(met, &variables, &coefficients, 0.)?;
        }

        for (reaction, coef) in &self.objective {
            problem.add_new_linear_objective_term_by_id(reaction, *coef)?;
        }
        Ok(problem)
    }
    // endregion Optimization
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metabolic_model::gene::Gpr;
    use crate::metabolic_model::reaction::ReactionBuilder;

    fn reaction(id: &str, stoichiometry: &[(&str, f64)]) -> Reaction {
        ReactionBuilder::default()
            .id(id.to_string())
            .metabolites(
                stoichiometry
                    .iter()
                    .map(|(m, c)| (m.to_string(), *c))
                    .collect(),
            )
            .lower_bound(0.)
            .upper_bound(10.)
            .build()
            .unwrap()
    }

    fn chain() -> Model {
        let mut model = Model::new_empty();
        model.add_reaction(reaction("EX_a", &[("a", -1.)]));
        model.add_reaction(reaction("R1", &[("a", 1.), ("b", -1.)]));
        model.add_reaction(reaction("R2", &[("b", 1.), ("c", -1.)]));
        model.objective.insert("R2".to_string(), 1.);
        model
    }

    #[test]
    fn add_reaction_registers_entities() {
        let mut model = chain();
        assert_eq!(
            model.metabolites.keys().collect::<Vec<_>>(),
            vec!["a", "b", "c"]
        );
        let mut with_gpr = reaction("R3", &[("c", 1.)]);
        with_gpr.gpr = Some(Gpr::new_and(
            Gpr::new_gene_node("g1"),
            Gpr::new_gene_node("g2"),
        ));
        model.add_reaction(with_gpr);
        assert_eq!(model.genes.keys().collect::<Vec<_>>(), vec!["g1", "g2"]);
    }

    #[test]
    fn remove_and_prune() {
        let mut model = chain();
        let removed = model.remove_reactions(&["R2", "missing"]);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, "R2");
        assert!(model.objective.is_empty());
        let pruned = model.prune_unused_metabolites();
        assert_eq!(pruned.len(), 1);
        assert_eq!(pruned[0].id, "c");
        assert_eq!(model.metabolites.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn problem_dimensions() {
        let model = chain();
        let problem = model.to_problem().unwrap();
        assert_eq!(problem.num_variables(), 3);
        assert_eq!(problem.num_constraints(), 3);
        assert_eq!(problem.objective().terms().len(), 1);
    }
}
