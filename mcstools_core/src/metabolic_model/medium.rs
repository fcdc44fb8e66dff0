//! The growth medium of a model, expressed through the bounds of its exchange reactions
//!
//! A medium maps exchange reaction ids to the maximum import flux. Whether import means a
//! negative lower bound or a positive upper bound depends on which side of the exchange the
//! metabolite sits on.
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use thiserror::Error;

use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::Reaction;

const DEFAULT_EXTERNAL_COMPARTMENT: &str = "e";

impl Model {
    /// Compartment holding the metabolites exchanged with the environment
    ///
    /// `e` when the model has such a compartment, otherwise the compartment containing most
    /// metabolites of boundary reactions.
    pub fn external_compartment(&self) -> Option<String> {
        let declared = self
            .compartments
            .as_ref()
            .is_some_and(|c| c.contains_key(DEFAULT_EXTERNAL_COMPARTMENT));
        let used = self
            .metabolites
            .values()
            .any(|m| m.compartment.as_deref() == Some(DEFAULT_EXTERNAL_COMPARTMENT));
        if declared || used {
            return Some(DEFAULT_EXTERNAL_COMPARTMENT.to_string());
        }

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for reaction in self.reactions.values().filter(|r| r.is_boundary()) {
            for met in reaction.metabolites.keys() {
                if let Some(compartment) = self
                    .metabolites
                    .get(met)
                    .and_then(|m| m.compartment.as_deref())
                {
                    *counts.entry(compartment).or_insert(0) += 1;
                }
            }
        }
        // first compartment wins ties
        let mut best: Option<(&str, usize)> = None;
        for (compartment, count) in counts {
            if best.map_or(true, |(_, most)| count > most) {
                best = Some((compartment, count));
            }
        }
        best.map(|(compartment, _)| compartment.to_string())
    }

    /// Boundary reactions exchanging a metabolite of the external compartment
    pub fn exchanges(&self) -> Vec<&Reaction> {
        let Some(external) = self.external_compartment() else {
            return Vec::new();
        };
        self.reactions
            .values()
            .filter(|r| r.is_boundary())
            .filter(|r| {
                r.metabolites.keys().all(|met| {
                    self.metabolites
                        .get(met)
                        .and_then(|m| m.compartment.as_deref())
                        == Some(external.as_str())
                })
            })
            .collect()
    }

    /// Exchanges which currently allow import, mapped to their import bound
    ///
    /// # Examples
    /// ```rust
    /// use indexmap::IndexMap;
    /// use mcstools_core::metabolic_model::metabolite::Metabolite;
    /// use mcstools_core::metabolic_model::model::Model;
    /// use mcstools_core::metabolic_model::reaction::ReactionBuilder;
    /// let mut model = Model::new_empty();
    /// let mut glucose = Metabolite::new("glc__D_e");
    /// glucose.compartment = Some("e".to_string());
    /// model.add_metabolite(glucose);
    /// let mut metabolites = IndexMap::new();
    /// metabolites.insert("glc__D_e".to_string(), -1.);
    /// model.add_reaction(
    ///     ReactionBuilder::default()
    ///         .id("EX_glc__D_e".to_string())
    ///         .metabolites(metabolites)
    ///         .lower_bound(-10.)
    ///         .build()
    ///         .unwrap(),
    /// );
    /// assert_eq!(model.medium()["EX_glc__D_e"], 10.);
    /// ```
    pub fn medium(&self) -> IndexMap<String, f64> {
        self.exchanges()
            .into_iter()
            .filter_map(|reaction| {
                let has_reactants = reaction.reactants().next().is_some();
                let has_products = reaction.products().next().is_some();
                if has_reactants && reaction.lower_bound < 0. {
                    Some((reaction.id.clone(), -reaction.lower_bound))
                } else if has_products && reaction.upper_bound > 0. {
                    Some((reaction.id.clone(), reaction.upper_bound))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Replace the medium of the model
    ///
    /// Listed reactions get their import bound set to the given value, every other exchange
    /// has its import closed. Export bounds are left untouched.
    ///
    /// # Errors
    /// [`MediumError::UnknownReaction`] when a listed reaction is not part of the model, the
    /// model is unchanged in that case.
    pub fn set_medium(&mut self, medium: &IndexMap<String, f64>) -> Result<(), MediumError> {
        if let Some(missing) = medium.keys().find(|id| !self.reactions.contains_key(*id)) {
            return Err(MediumError::UnknownReaction(missing.clone()));
        }

        let exchange_ids: Vec<String> = self.exchanges().iter().map(|r| r.id.clone()).collect();
        for (id, bound) in medium {
            if !exchange_ids.contains(id) {
                warn!("{} is not an exchange reaction, setting its import bound anyway", id);
            }
            if let Some(reaction) = self.reactions.get_mut(id) {
                set_active_bound(reaction, *bound);
            }
        }

        for id in exchange_ids.iter().filter(|id| !medium.contains_key(*id)) {
            if let Some(reaction) = self.reactions.get_mut(id) {
                let is_export = reaction.reactants().next().is_some()
                    && reaction.products().next().is_none();
                let import = if is_export {
                    -reaction.lower_bound
                } else {
                    reaction.upper_bound
                };
                debug!("Closing import through {}", id);
                set_active_bound(reaction, import.min(0.));
            }
        }
        Ok(())
    }
}

/// Set the bound limiting import through `reaction`
fn set_active_bound(reaction: &mut Reaction, bound: f64) {
    if reaction.reactants().next().is_some() {
        reaction.lower_bound = -bound;
    } else if reaction.products().next().is_some() {
        reaction.upper_bound = bound;
    }
}

/// Read a medium stored as a JSON object of `{reaction id: import bound}`
pub fn read_medium<P: AsRef<Path>>(path: P) -> Result<IndexMap<String, f64>, MediumError> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

#[derive(Error, Debug)]
pub enum MediumError {
    #[error("Reaction {0} is not part of the model")]
    UnknownReaction(String),
    #[error("Unable to read medium file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid medium file: {0}")]
    InvalidMedium(#[from] serde_json::Error),
}
