//! Opening every exchange able to replace the main carbon source
use log::{debug, info, warn};

use crate::analysis::AnalysisError;
use crate::configuration::Configuration;
use crate::metabolic_model::model::Model;

impl Model {
    /// Exchange reactions of at least one carbon containing metabolite
    pub fn carbon_exchanges(&self) -> Vec<String> {
        self.exchanges()
            .into_iter()
            .filter(|reaction| {
                reaction.metabolites.keys().any(|met| {
                    self.metabolites
                        .get(met)
                        .is_some_and(|m| m.contains_element("C"))
                })
            })
            .map(|reaction| reaction.id.clone())
            .collect()
    }

    /// Open import of every carbon source supporting a positive objective on its own
    ///
    /// Each carbon exchange is tried as replacement of `base_carbon_source` (closed for the
    /// trial) with an import bound of `uptake`. Afterwards the original medium is restored and
    /// every viable source is opened at `uptake` on top of it.
    ///
    /// # Returns
    /// Ids of the viable carbon sources
    pub fn all_carbon_sources(
        &mut self,
        base_carbon_source: &str,
        uptake: f64,
    ) -> Result<Vec<String>, AnalysisError> {
        let tolerance = Configuration::current().tolerance;
        let original_medium = self.medium();
        let has_base = self.reactions.contains_key(base_carbon_source);
        if !has_base {
            warn!(
                "Base carbon source {} not in model, testing carbon sources on the full medium",
                base_carbon_source
            );
        }

        let mut viable = Vec::new();
        for candidate in self.carbon_exchanges() {
            let mut medium = original_medium.clone();
            if has_base {
                medium.insert(base_carbon_source.to_string(), 0.);
            }
            medium.insert(candidate.clone(), uptake);
            self.set_medium(&medium)?;
            let is_viable = self.is_viable(tolerance)?;
            debug!("{} viable as carbon source: {}", candidate, is_viable);
            if is_viable {
                viable.push(candidate);
            }
        }

        let mut medium = original_medium;
        for source in &viable {
            medium.insert(source.clone(), uptake);
        }
        self.set_medium(&medium)?;
        info!("Found {} viable carbon sources", viable.len());
        Ok(viable)
    }
}
