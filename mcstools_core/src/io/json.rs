//! Module providing JSON IO for Models, using the cobra JSON schema
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::io::gpr::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::Gene;
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};

// region JSON Model
/// Represents a JSON serialized model, used for reading and writing models in json format
#[derive(Serialize, Deserialize)]
struct JsonModel {
    metabolites: Vec<JsonMetabolite>,
    reactions: Vec<JsonReaction>,
    genes: Vec<JsonGene>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartments: Option<IndexMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct JsonMetabolite {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    compartment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    charge: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonReaction {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    metabolites: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    gene_reaction_rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    objective_coefficient: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    subsystem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}

#[derive(Serialize, Deserialize)]
struct JsonGene {
    id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    annotation: Option<Value>,
}
// endregion JSON Model

// region Conversions
impl From<JsonGene> for Gene {
    fn from(g: JsonGene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes,
            annotation: g.annotation,
        }
    }
}

impl From<JsonMetabolite> for Metabolite {
    fn from(m: JsonMetabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: m.charge.unwrap_or_default(),
            formula: m.formula,
            notes: m.notes,
            annotation: m.annotation,
        }
    }
}

impl From<Gene> for JsonGene {
    fn from(g: Gene) -> Self {
        Self {
            id: g.id,
            name: g.name,
            notes: g.notes,
            annotation: g.annotation,
        }
    }
}

impl From<Metabolite> for JsonMetabolite {
    fn from(m: Metabolite) -> Self {
        Self {
            id: m.id,
            name: m.name,
            compartment: m.compartment,
            charge: Some(m.charge),
            formula: m.formula,
            notes: m.notes,
            annotation: m.annotation,
        }
    }
}

impl Model {
    /// Read a model in cobra JSON format
    pub fn read_json<P: AsRef<Path>>(path: P) -> Result<Model, JsonError> {
        let model_str = fs::read_to_string(path)?;
        Model::from_json_str(&model_str)
    }

    /// Parse a model from a cobra JSON string
    pub fn from_json_str(model_str: &str) -> Result<Model, JsonError> {
        let json_model = serde_json::from_str::<JsonModel>(model_str)?;
        Model::from_json(json_model)
    }

    /// Write the model in cobra JSON format
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), JsonError> {
        let model_string = self.to_json_string()?;
        fs::write(path, model_string)?;
        Ok(())
    }

    pub fn to_json_string(&self) -> Result<String, JsonError> {
        Ok(serde_json::to_string_pretty(&self.to_json())?)
    }

    fn from_json(json_model: JsonModel) -> Result<Self, JsonError> {
        let mut model = Model::new_empty();
        model.id = json_model.id;
        model.name = json_model.name;
        model.compartments = json_model.compartments;
        model.version = json_model.version;

        // Genes and metabolites first, so reactions find them registered
        for g in json_model.genes {
            model.add_gene(Gene::from(g));
        }
        for m in json_model.metabolites {
            model.add_metabolite(Metabolite::from(m));
        }

        for rxn in json_model.reactions {
            let gpr = if rxn.gene_reaction_rule.trim().is_empty() {
                None
            } else {
                Some(parse_gpr(&rxn.gene_reaction_rule, &mut model.genes)?)
            };
            let new_reaction = ReactionBuilder::default()
                .id(rxn.id.clone())
                .metabolites(rxn.metabolites)
                .name(rxn.name)
                .gpr(gpr)
                .lower_bound(rxn.lower_bound)
                .upper_bound(rxn.upper_bound)
                .subsystem(rxn.subsystem)
                .notes(rxn.notes)
                .annotation(rxn.annotation)
                .build()?;
            model.add_reaction(new_reaction);
            // Add the reaction to the objective function if desired
            if let Some(coef) = rxn.objective_coefficient {
                if coef != 0. {
                    model.objective.insert(rxn.id, coef);
                }
            }
        }
        Ok(model)
    }

    fn to_json(&self) -> JsonModel {
        let reactions = self
            .reactions
            .values()
            .map(|r| JsonReaction {
                id: r.id.clone(),
                name: r.name.clone(),
                metabolites: r.metabolites.clone(),
                lower_bound: r.lower_bound,
                upper_bound: r.upper_bound,
                gene_reaction_rule: r.gene_reaction_rule(),
                objective_coefficient: self.objective.get(&r.id).copied(),
                subsystem: r.subsystem.clone(),
                notes: r.notes.clone(),
                annotation: r.annotation.clone(),
            })
            .collect();

        JsonModel {
            metabolites: self.metabolites.values().cloned().map(Into::into).collect(),
            reactions,
            genes: self.genes.values().cloned().map(Into::into).collect(),
            id: self.id.clone(),
            name: self.name.clone(),
            compartments: self.compartments.clone(),
            version: self.version.clone(),
        }
    }
}

#[derive(Error, Debug)]
pub enum JsonError {
    #[error("Unable to parse a GPR rule during conversion from JSON: {0}")]
    GprParserError(#[from] GprParseError),
    #[error("Unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Invalid model JSON: {0}")]
    SerdeJsonParseError(#[from] serde_json::Error),
    #[error("Unable to read or write file: {0}")]
    Io(#[from] std::io::Error),
}
// endregion Conversions

#[cfg(test)]
mod json_tests {
    use super::*;

    #[test]
    fn json_metabolite() {
        let data = r#"{
"id":"glc__D_e",
"name":"D-Glucose",
"compartment":"e",
"charge":0,
"formula":"C6H12O6",
"notes":{
"original_bigg_ids":[
"glc_D_e"
]
},
"annotation":{
"bigg.metabolite":[
"glc__D"
],
"kegg.compound":[
"C00031"
],
"sbo":"SBO:0000247"
}
}"#;
        let met: JsonMetabolite = serde_json::from_str(data).unwrap();
        let model_met = Metabolite::from(met);
        assert_eq!(model_met.id, "glc__D_e");
        assert_eq!(model_met.name.unwrap(), "D-Glucose");
        assert_eq!(model_met.compartment.unwrap(), "e");
        assert_eq!(model_met.charge, 0);
        assert_eq!(model_met.formula.unwrap(), "C6H12O6");
        assert_eq!(
            model_met.annotation.unwrap()["sbo"],
            Value::String("SBO:0000247".to_string())
        );
    }

    #[test]
    fn json_reaction() {
        let data = r#"{
"id":"PFK",
"name":"Phosphofructokinase",
"metabolites":{
"adp_c":1.0,
"atp_c":-1.0,
"f6p_c":-1.0,
"fdp_c":1.0,
"h_c":1.0
},
"lower_bound":0.0,
"upper_bound":1000.0,
"gene_reaction_rule":"b3916 or b1723",
"subsystem":"Glycolysis/Gluconeogenesis"
}"#;
        let reaction: JsonReaction = serde_json::from_str(data).unwrap();
        assert_eq!(reaction.id, "PFK");
        assert_eq!(reaction.name.unwrap(), "Phosphofructokinase");
        assert_eq!(
            reaction.metabolites.keys().collect::<Vec<_>>(),
            vec!["adp_c", "atp_c", "f6p_c", "fdp_c", "h_c"]
        );
        assert!((reaction.metabolites["atp_c"] + 1.0).abs() < 1e-25);
        assert!((reaction.lower_bound - 0.0).abs() < 1e-25);
        assert!((reaction.upper_bound - 1000.0).abs() < 1e-25);
        assert_eq!(reaction.gene_reaction_rule, "b3916 or b1723");
        assert!(reaction.objective_coefficient.is_none());
        assert_eq!(reaction.subsystem.unwrap(), "Glycolysis/Gluconeogenesis");
    }

    #[test]
    fn json_gene() {
        let data = r#"{"id":"b1241","name":"adhE","annotation":{"sbo":"SBO:0000243"}}"#;
        let gene = Gene::from(serde_json::from_str::<JsonGene>(data).unwrap());
        assert_eq!(gene.id, "b1241");
        assert_eq!(gene.name.unwrap(), "adhE");
        assert!(gene.notes.is_none());
    }
}

#[cfg(test)]
mod model_tests {
    use super::*;
    use crate::metabolic_model::gene::Gpr;
    use crate::test_utils::toy_model_path;

    #[test]
    fn read_json() {
        let model = Model::read_json(toy_model_path()).unwrap();
        assert_eq!(model.id.clone().unwrap(), "toy_model");
        assert_eq!(model.version.clone().unwrap(), "1");
        assert_eq!(model.reactions.len(), 8);
        assert_eq!(model.metabolites.len(), 6);

        let (_, met) = model.metabolites.first().unwrap();
        assert_eq!(met.id, "glc__D_e");
        assert_eq!(met.formula.clone().unwrap(), "C6H12O6");
        assert_eq!(met.compartment.clone().unwrap(), "e");

        let upt = &model.reactions["UPT"];
        assert_eq!(
            upt.gpr,
            Some(Gpr::new_or(
                Gpr::new_gene_node("b0001"),
                Gpr::new_gene_node("b0002")
            ))
        );
        assert!((upt.metabolites["glc__D_c"] - 1.).abs() < 1e-25);
        assert_eq!(model.genes.len(), 4);
        assert!((model.objective["BIOMASS"] - 1.).abs() < 1e-25);
        assert_eq!(model.objective.len(), 1);

        let mut expected_compartments: IndexMap<String, String> = IndexMap::new();
        expected_compartments.insert("c".to_string(), "cytosol".to_string());
        expected_compartments.insert("e".to_string(), "extracellular space".to_string());
        assert_eq!(model.compartments.clone().unwrap(), expected_compartments);
    }

    #[test]
    fn write_and_read_back() {
        let model = Model::read_json(toy_model_path()).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toy.json");
        model.write_json(&path).unwrap();
        let reread = Model::read_json(&path).unwrap();
        assert_eq!(model, reread);

        let json: Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["reactions"][1]["id"], Value::String("UPT".to_string()));
        assert_eq!(
            json["reactions"][1]["gene_reaction_rule"],
            Value::String("b0001 or b0002".to_string())
        );
        assert!(json["reactions"][1]["metabolites"]["glc__D_e"].is_number());
    }

    #[test]
    fn undeclared_metabolites_are_added() {
        let data = r#"{"metabolites":[],"genes":[],"reactions":[
            {"id":"R1","metabolites":{"a":-1.0,"b":1.0},"lower_bound":0.0,"upper_bound":5.0,
             "gene_reaction_rule":"g1 and g2","objective_coefficient":1.0}]}"#;
        let model = Model::from_json_str(data).unwrap();
        assert_eq!(model.metabolites.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(model.genes.keys().collect::<Vec<_>>(), vec!["g1", "g2"]);
        assert!(model.id.is_none());
    }

    #[test]
    fn invalid_json() {
        assert!(matches!(
            Model::from_json_str("{\"metabolites\": 3}"),
            Err(JsonError::SerdeJsonParseError(_))
        ));
        let bad_rule = r#"{"metabolites":[],"genes":[],"reactions":[
            {"id":"R1","metabolites":{},"lower_bound":0.0,"upper_bound":5.0,
             "gene_reaction_rule":"(g1 or"}]}"#;
        assert!(matches!(
            Model::from_json_str(bad_rule),
            Err(JsonError::GprParserError(_))
        ));
    }
}
