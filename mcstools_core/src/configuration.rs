//! Process wide modeling defaults
use std::sync::{LazyLock, RwLock};

/// Defaults used when building model entities and running analyses
pub static CONFIGURATION: LazyLock<RwLock<Configuration>> =
    LazyLock::new(|| RwLock::new(Configuration::default()));

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    /// Lower bound given to reactions which don't specify one
    pub lower_bound: f64,
    /// Upper bound given to reactions which don't specify one
    pub upper_bound: f64,
    /// Numerical tolerance for deciding whether a flux or objective value is zero
    pub tolerance: f64,
    /// Number of worker threads used for flux variability analysis
    pub processes: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Configuration {
            lower_bound: -1000.,
            upper_bound: 1000.,
            tolerance: 1e-07,
            processes: 1,
        }
    }
}

impl Configuration {
    /// Snapshot of the current global configuration
    ///
    /// A poisoned lock still yields the stored values.
    pub fn current() -> Configuration {
        match CONFIGURATION.read() {
            Ok(config) => config.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
