//! Removal of reactions which can't carry flux
use std::fmt::{Display, Formatter};

use log::info;

use crate::analysis::AnalysisError;
use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;

/// Fraction of the optimum the objective is held at when looking for unused reactions
const OPTIMUM_FRACTION: f64 = 0.99;

/// Which reactions [`Model::make_consistent`] removes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsistencyMode {
    /// Reactions unable to carry flux at all
    Blocked,
    /// Reactions unable to carry flux while the objective stays near its optimum
    Optimum { processes: usize },
}

/// Size and objective value of a model before and after [`Model::make_consistent`]
#[derive(Debug, Clone, PartialEq)]
pub struct ConsistencySummary {
    pub original_reactions: usize,
    pub original_metabolites: usize,
    pub original_objective: f64,
    pub reactions: usize,
    pub metabolites: usize,
    pub objective: f64,
    pub removed_reactions: Vec<String>,
    pub removed_metabolites: Vec<String>,
}

impl Display for ConsistencySummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} rxns, {} mets, obj: {} --> {} rxns, {} mets, obj: {}",
            self.original_reactions,
            self.original_metabolites,
            self.original_objective,
            self.reactions,
            self.metabolites,
            self.objective
        )
    }
}

/// Whether the objective value `consistent` of a reduced model matches `original`
///
/// [`ConsistencyMode::Blocked`] allows a drift of `original * tolerance`, so a negative original
/// objective never matches and a zero one only without any drift. [`ConsistencyMode::Optimum`]
/// allows an absolute drift of `tolerance`.
pub fn objective_preserved(
    mode: ConsistencyMode,
    original: f64,
    consistent: f64,
    tolerance: f64,
) -> bool {
    let allowed = match mode {
        ConsistencyMode::Blocked => original * tolerance,
        ConsistencyMode::Optimum { .. } => tolerance,
    };
    (original - consistent).abs() <= allowed
}

impl Model {
    /// Reactions which can't carry any flux, within the configured tolerance
    pub fn find_blocked_reactions(&self) -> Result<Vec<String>, AnalysisError> {
        let config = Configuration::current();
        let reactions: Vec<&str> = self.reactions.keys().map(String::as_str).collect();
        let ranges = self.flux_variability_analysis(&reactions, 0., config.processes)?;
        Ok(ranges
            .into_iter()
            .filter(|(_, range)| range.is_blocked(config.tolerance))
            .map(|(id, _)| id)
            .collect())
    }

    /// Remove reactions which can't carry flux, then the metabolites left unused
    ///
    /// The model is only changed when the objective value of the reduced model matches the
    /// original one: relative to the original value in [`ConsistencyMode::Blocked`], absolutely
    /// in [`ConsistencyMode::Optimum`].
    ///
    /// # Errors
    /// [`AnalysisError::ObjectiveDrift`] when the objective value changed
    pub fn make_consistent(
        &mut self,
        mode: ConsistencyMode,
    ) -> Result<ConsistencySummary, AnalysisError> {
        let tolerance = Configuration::current().tolerance;
        let original_objective = self.optimize()?;

        let removable: Vec<String> = match mode {
            ConsistencyMode::Blocked => self.find_blocked_reactions()?,
            ConsistencyMode::Optimum { processes } => {
                let reactions: Vec<&str> = self.reactions.keys().map(String::as_str).collect();
                self.flux_variability_analysis(&reactions, OPTIMUM_FRACTION, processes)?
                    .into_iter()
                    .filter(|(_, range)| range.minimum.abs() + range.maximum.abs() < tolerance)
                    .map(|(id, _)| id)
                    .collect()
            }
        };

        self.remove_if_objective_kept(&removable, mode, original_objective, tolerance)
    }

    /// Remove `removable` and the metabolites left unused, unless the objective value drifts
    /// from `original_objective`
    fn remove_if_objective_kept(
        &mut self,
        removable: &[String],
        mode: ConsistencyMode,
        original_objective: f64,
        tolerance: f64,
    ) -> Result<ConsistencySummary, AnalysisError> {
        let mut consistent = self.clone();
        let removed_reactions: Vec<String> = consistent
            .remove_reactions(removable)
            .into_iter()
            .map(|r| r.id)
            .collect();
        let removed_metabolites: Vec<String> = consistent
            .prune_unused_metabolites()
            .into_iter()
            .map(|m| m.id)
            .collect();
        info!(
            "Removing {} reactions and {} metabolites",
            removed_reactions.len(),
            removed_metabolites.len()
        );

        let objective = consistent.optimize()?;
        if !objective_preserved(mode, original_objective, objective, tolerance) {
            return Err(AnalysisError::ObjectiveDrift {
                original: original_objective,
                consistent: objective,
            });
        }

        let summary = ConsistencySummary {
            original_reactions: self.reactions.len(),
            original_metabolites: self.metabolites.len(),
            original_objective,
            reactions: consistent.reactions.len(),
            metabolites: consistent.metabolites.len(),
            objective,
            removed_reactions,
            removed_metabolites,
        };
        *self = consistent;
        Ok(summary)
    }
}
