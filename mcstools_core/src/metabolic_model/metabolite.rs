//! This module provides the metabolite struct representing a metabolite

use derive_builder::Builder;
use serde_json::Value;

/// Represents a metabolite
#[derive(Builder, Debug, Clone, PartialEq)]
pub struct Metabolite {
    /// Used to identify the metabolite (must be unique)
    pub id: String,
    /// Human Readable name of the metabolite
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Which compartment the metabolite is in
    #[builder(default = "None")]
    pub compartment: Option<String>,
    /// Electrical charge of the Metabolite
    #[builder(default = "0")]
    pub charge: i32,
    /// Chemical Formula of the metabolite
    #[builder(default = "None")]
    pub formula: Option<String>,
    /// Notes about the metabolite
    #[builder(default = "None")]
    pub notes: Option<Value>,
    /// Metabolite annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Metabolite {
    /// Create a metabolite which only carries an id
    pub fn new(id: &str) -> Metabolite {
        Metabolite {
            id: id.to_string(),
            name: None,
            compartment: None,
            charge: 0,
            formula: None,
            notes: None,
            annotation: None,
        }
    }

    /// Whether the chemical formula contains `element`
    ///
    /// Element symbols are matched whole, so `Cl` and `Ca` don't count as carbon.
    pub fn contains_element(&self, element: &str) -> bool {
        match &self.formula {
            Some(formula) => formula_elements(formula).any(|symbol| symbol == element),
            None => false,
        }
    }
}

/// Element symbols appearing in a chemical formula, e.g. `C`, `H`, `O` for `C6H12O6`
fn formula_elements(formula: &str) -> impl Iterator<Item = &str> {
    formula.char_indices().filter_map(move |(start, c)| {
        if !c.is_ascii_uppercase() {
            return None;
        }
        let len = formula[start + 1..]
            .chars()
            .take_while(|c| c.is_ascii_lowercase())
            .count();
        Some(&formula[start..start + 1 + len])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_detection() {
        let mut glucose = MetaboliteBuilder::default()
            .id("glc__D_e".to_string())
            .formula(Some("C6H12O6".to_string()))
            .compartment(Some("e".to_string()))
            .build()
            .unwrap();
        assert!(glucose.contains_element("C"));
        assert!(glucose.contains_element("O"));
        assert!(!glucose.contains_element("N"));

        glucose.formula = Some("Cl".to_string());
        assert!(!glucose.contains_element("C"));
        glucose.formula = Some("CaCO3".to_string());
        assert!(glucose.contains_element("C"));
        glucose.formula = None;
        assert!(!glucose.contains_element("C"));
    }
}
