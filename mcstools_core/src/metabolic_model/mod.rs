//! Module providing the Model struct for representing a metabolic model, together with the
//! medium and stoichiometric matrix views of it.

pub mod gene;
pub mod medium;
pub mod metabolite;
pub mod model;
pub mod reaction;
pub mod stoichiometry;
