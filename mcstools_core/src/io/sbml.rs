//! Module providing SBML IO for Models
//!
//! Reading understands SBML Level 3 with the flux balance constraints package (FBC version 1
//! and 2) as well as the older COBRA Level 2 convention, where bounds and objective
//! coefficients are kinetic law parameters and GPR rules live in the reaction notes.
//! Writing always produces Level 3 Version 1 with FBC version 2.
//!
//! SBML ids carry type prefixes (`M_` for species, `R_` for reactions, `G_` for gene
//! products); they are removed on reading and added back on writing.
use std::collections::{HashMap, HashSet};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use log::{debug, warn};
use roxmltree::{Document, Node};
use thiserror::Error;

use crate::configuration::Configuration;
use crate::io::gpr::{parse_gpr, GprParseError};
use crate::metabolic_model::gene::{Gene, Gpr, GprOperation};
use crate::metabolic_model::metabolite::Metabolite;
use crate::metabolic_model::model::Model;
use crate::metabolic_model::reaction::{ReactionBuilder, ReactionBuilderError};
use crate::optimize::objective::ObjectiveSense;

const FBC_NS: &str = "http://www.sbml.org/sbml/level3/version1/fbc";
const FBC_V2_NS: &str = "http://www.sbml.org/sbml/level3/version1/fbc/version2";
const SBML_L3V1_NS: &str = "http://www.sbml.org/sbml/level3/version1/core";
const XHTML_NS: &str = "http://www.w3.org/1999/xhtml";

const SPECIES_PREFIX: &str = "M_";
const REACTION_PREFIX: &str = "R_";
const GENE_PREFIX: &str = "G_";

impl Model {
    /// Read a model from an SBML file
    pub fn read_sbml<P: AsRef<Path>>(path: P) -> Result<Model, SbmlError> {
        let content = fs::read_to_string(path)?;
        Model::from_sbml_str(&content)
    }

    /// Parse a model from an SBML document
    pub fn from_sbml_str(content: &str) -> Result<Model, SbmlError> {
        let doc = Document::parse(content)?;
        let model_node = child(doc.root_element(), "model").ok_or(SbmlError::MissingModel)?;
        read_model(model_node)
    }

    /// Write the model as SBML Level 3 Version 1 with FBC version 2
    pub fn write_sbml<P: AsRef<Path>>(&self, path: P) -> Result<(), SbmlError> {
        fs::write(path, self.to_sbml_string()?)?;
        Ok(())
    }

    pub fn to_sbml_string(&self) -> Result<String, SbmlError> {
        let mut out = String::new();
        write_document(self, &mut out)?;
        Ok(out)
    }
}

// region Reading
fn read_model(model_node: Node) -> Result<Model, SbmlError> {
    let mut model = Model::new_empty();
    model.id = model_node.attribute("id").map(str::to_string);
    model.name = model_node.attribute("name").map(str::to_string);

    let compartments: IndexMap<String, String> =
        list_items(model_node, "listOfCompartments", "compartment")
            .filter_map(|c| {
                let id = c.attribute("id")?;
                Some((id.to_string(), c.attribute("name").unwrap_or(id).to_string()))
            })
            .collect();
    if !compartments.is_empty() {
        model.compartments = Some(compartments);
    }

    let mut parameters: HashMap<&str, f64> = HashMap::new();
    for parameter in list_items(model_node, "listOfParameters", "parameter") {
        if let (Some(id), Some(value)) = (parameter.attribute("id"), parameter.attribute("value")) {
            parameters.insert(id, parse_number(value)?);
        }
    }

    // fbc:id of a gene product -> gene id
    let mut gene_products: HashMap<String, String> = HashMap::new();
    for product in list_items(model_node, "listOfGeneProducts", "geneProduct") {
        let product_id = fbc_attribute(product, "id")
            .ok_or_else(|| SbmlError::missing("geneProduct", "fbc:id"))?;
        let gene_id = fbc_attribute(product, "label")
            .unwrap_or_else(|| strip_prefix(product_id, GENE_PREFIX));
        let mut gene = Gene::new(gene_id);
        gene.name = fbc_attribute(product, "name").map(str::to_string);
        gene_products.insert(product_id.to_string(), gene.id.clone());
        model.add_gene(gene);
    }

    let mut boundary_species: HashSet<&str> = HashSet::new();
    for species in list_items(model_node, "listOfSpecies", "species") {
        let raw_id = species
            .attribute("id")
            .ok_or_else(|| SbmlError::missing("species", "id"))?;
        if species.attribute("boundaryCondition") == Some("true") {
            debug!("Ignoring boundary species {}", raw_id);
            boundary_species.insert(raw_id);
            continue;
        }
        model.add_metabolite(read_species(species, raw_id)?);
    }

    let flux_bounds = read_fbc_v1_bounds(model_node)?;
    let config = Configuration::current();
    for reaction in list_items(model_node, "listOfReactions", "reaction") {
        let raw_id = reaction
            .attribute("id")
            .ok_or_else(|| SbmlError::missing("reaction", "id"))?;
        let id = strip_prefix(raw_id, REACTION_PREFIX).to_string();
        let reversible = reaction
            .attribute("reversible")
            .map_or(true, |v| v == "true" || v == "1");
        let kinetic_parameters = read_kinetic_law_parameters(reaction)?;
        let notes = notes_entries(reaction);

        let bound = |fbc_name: &str,
                     v1: Option<f64>,
                     kinetic_name: &str|
         -> Result<Option<f64>, SbmlError> {
            if let Some(parameter) = fbc_attribute(reaction, fbc_name) {
                return match parameters.get(parameter) {
                    Some(value) => Ok(Some(*value)),
                    None => Err(SbmlError::UnknownParameter {
                        reaction: id.clone(),
                        parameter: parameter.to_string(),
                    }),
                };
            }
            Ok(v1.or_else(|| kinetic_parameters.get(kinetic_name).copied()))
        };
        let (v1_lower, v1_upper) = flux_bounds.get(raw_id).copied().unwrap_or((None, None));
        let lower_bound = bound("lowerFluxBound", v1_lower, "LOWER_BOUND")?
            .unwrap_or(if reversible { config.lower_bound } else { 0. });
        let upper_bound = bound("upperFluxBound", v1_upper, "UPPER_BOUND")?
            .unwrap_or(config.upper_bound);

        let mut metabolites: IndexMap<String, f64> = IndexMap::new();
        for (list, sign) in [("listOfReactants", -1.), ("listOfProducts", 1.)] {
            for reference in list_items(reaction, list, "speciesReference") {
                let species = reference
                    .attribute("species")
                    .ok_or_else(|| SbmlError::missing("speciesReference", "species"))?;
                if boundary_species.contains(species) {
                    continue;
                }
                let stoichiometry = match reference.attribute("stoichiometry") {
                    Some(value) => parse_number(value)?,
                    None => 1.,
                };
                *metabolites
                    .entry(strip_prefix(species, SPECIES_PREFIX).to_string())
                    .or_insert(0.) += sign * stoichiometry;
            }
        }

        let gpr = match child(reaction, "geneProductAssociation").and_then(first_element) {
            Some(association) => Some(association_to_gpr(
                association,
                &gene_products,
                &mut model.genes,
            )?),
            None => match notes
                .get("GENE_ASSOCIATION")
                .or_else(|| notes.get("GPR_ASSOCIATION"))
            {
                Some(rule) if !rule.is_empty() => Some(parse_gpr(rule, &mut model.genes)?),
                _ => None,
            },
        };

        let new_reaction = ReactionBuilder::default()
            .id(id.clone())
            .name(reaction.attribute("name").map(str::to_string))
            .metabolites(metabolites)
            .lower_bound(finite_or(lower_bound, config.lower_bound, config.upper_bound))
            .upper_bound(finite_or(upper_bound, config.lower_bound, config.upper_bound))
            .gpr(gpr)
            .subsystem(notes.get("SUBSYSTEM").filter(|s| !s.is_empty()).cloned())
            .build()?;
        model.add_reaction(new_reaction);

        if let Some(coef) = kinetic_parameters.get("OBJECTIVE_COEFFICIENT") {
            if *coef != 0. {
                model.objective.insert(id, *coef);
            }
        }
    }

    read_fbc_objective(model_node, &mut model)?;
    Ok(model)
}

fn read_species(species: Node, raw_id: &str) -> Result<Metabolite, SbmlError> {
    let notes = notes_entries(species);
    let mut metabolite = Metabolite::new(strip_prefix(raw_id, SPECIES_PREFIX));
    metabolite.name = species.attribute("name").map(str::to_string);
    metabolite.compartment = species.attribute("compartment").map(str::to_string);
    metabolite.formula = fbc_attribute(species, "chemicalFormula")
        .map(str::to_string)
        .or_else(|| notes.get("FORMULA").filter(|f| !f.is_empty()).cloned());
    let charge = fbc_attribute(species, "charge")
        .or_else(|| species.attribute("charge"))
        .or_else(|| notes.get("CHARGE").map(String::as_str));
    if let Some(charge) = charge {
        metabolite.charge = parse_number(charge)?.round() as i32;
    }
    Ok(metabolite)
}

/// Bounds given as FBC version 1 `fluxBound` elements, keyed by the raw reaction id
fn read_fbc_v1_bounds<'a>(
    model_node: Node<'a, '_>,
) -> Result<HashMap<&'a str, (Option<f64>, Option<f64>)>, SbmlError> {
    let mut bounds: HashMap<&str, (Option<f64>, Option<f64>)> = HashMap::new();
    for flux_bound in list_items(model_node, "listOfFluxBounds", "fluxBound") {
        let reaction = fbc_attribute(flux_bound, "reaction")
            .ok_or_else(|| SbmlError::missing("fluxBound", "fbc:reaction"))?;
        let value = parse_number(
            fbc_attribute(flux_bound, "value")
                .ok_or_else(|| SbmlError::missing("fluxBound", "fbc:value"))?,
        )?;
        let entry = bounds.entry(reaction).or_default();
        match fbc_attribute(flux_bound, "operation") {
            Some("greaterEqual") => entry.0 = Some(value),
            Some("lessEqual") => entry.1 = Some(value),
            Some("equal") => *entry = (Some(value), Some(value)),
            other => warn!("Ignoring flux bound with operation {:?}", other),
        }
    }
    Ok(bounds)
}

fn read_kinetic_law_parameters(reaction: Node) -> Result<HashMap<String, f64>, SbmlError> {
    let mut parameters = HashMap::new();
    if let Some(kinetic_law) = child(reaction, "kineticLaw") {
        let local = list_items(kinetic_law, "listOfParameters", "parameter").chain(list_items(
            kinetic_law,
            "listOfLocalParameters",
            "localParameter",
        ));
        for parameter in local {
            if let (Some(id), Some(value)) =
                (parameter.attribute("id"), parameter.attribute("value"))
            {
                parameters.insert(id.to_string(), parse_number(value)?);
            }
        }
    }
    Ok(parameters)
}

fn read_fbc_objective(model_node: Node, model: &mut Model) -> Result<(), SbmlError> {
    let Some(list) = child(model_node, "listOfObjectives") else {
        return Ok(());
    };
    let active = fbc_attribute(list, "activeObjective");
    let objectives: Vec<Node> = children(list, "objective").collect();
    let objective = objectives
        .iter()
        .find(|o| active.is_some() && fbc_attribute(**o, "id") == active)
        .or_else(|| objectives.first());
    let Some(objective) = objective else {
        return Ok(());
    };

    model.objective_sense = match fbc_attribute(*objective, "type") {
        Some("minimize") => ObjectiveSense::Minimize,
        _ => ObjectiveSense::Maximize,
    };
    model.objective.clear();
    for flux_objective in list_items(*objective, "listOfFluxObjectives", "fluxObjective") {
        let reaction = fbc_attribute(flux_objective, "reaction")
            .ok_or_else(|| SbmlError::missing("fluxObjective", "fbc:reaction"))?;
        let reaction = strip_prefix(reaction, REACTION_PREFIX);
        let coefficient = match fbc_attribute(flux_objective, "coefficient") {
            Some(value) => parse_number(value)?,
            None => 1.,
        };
        if !model.reactions.contains_key(reaction) {
            warn!("Objective references unknown reaction {}", reaction);
            continue;
        }
        if coefficient != 0. {
            model.objective.insert(reaction.to_string(), coefficient);
        }
    }
    Ok(())
}

fn association_to_gpr(
    node: Node,
    gene_products: &HashMap<String, String>,
    genes: &mut IndexMap<String, Gene>,
) -> Result<Gpr, SbmlError> {
    match node.tag_name().name() {
        "geneProductRef" => {
            let product = fbc_attribute(node, "geneProduct")
                .ok_or_else(|| SbmlError::missing("geneProductRef", "fbc:geneProduct"))?;
            let gene = match gene_products.get(product) {
                Some(gene) => gene.clone(),
                None => strip_prefix(product, GENE_PREFIX).to_string(),
            };
            if !genes.contains_key(&gene) {
                genes.insert(gene.clone(), Gene::new(&gene));
            }
            Ok(Gpr::GeneNode(gene))
        }
        operator @ ("and" | "or") => {
            let mut combined: Option<Gpr> = None;
            for operand in node.children().filter(|n| n.is_element()) {
                let operand = association_to_gpr(operand, gene_products, genes)?;
                combined = Some(match combined {
                    None => operand,
                    Some(left) if operator == "and" => Gpr::new_and(left, operand),
                    Some(left) => Gpr::new_or(left, operand),
                });
            }
            combined.ok_or_else(|| SbmlError::InvalidAssociation(format!("empty fbc:{}", operator)))
        }
        other => Err(SbmlError::InvalidAssociation(other.to_string())),
    }
}
// endregion Reading

// region XML helpers
fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    name: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

fn child<'a, 'input: 'a>(node: Node<'a, 'input>, name: &'a str) -> Option<Node<'a, 'input>> {
    children(node, name).next()
}

fn first_element<'a, 'input: 'a>(node: Node<'a, 'input>) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.is_element())
}

/// Items of a `listOf...` element, empty when the list is missing
fn list_items<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    list: &'a str,
    item: &'a str,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    child(node, list)
        .into_iter()
        .flat_map(move |l| children(l, item))
}

/// Attribute of the FBC package, any package version
fn fbc_attribute<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attributes()
        .find(|a| a.name() == name && a.namespace().is_some_and(|ns| ns.starts_with(FBC_NS)))
        .map(|a| a.value())
}

/// `KEY: value` paragraphs of the notes of an element, keys upper cased
fn notes_entries(node: Node) -> HashMap<String, String> {
    let mut entries = HashMap::new();
    if let Some(notes) = child(node, "notes") {
        for paragraph in notes
            .descendants()
            .filter(|n| n.is_element() && n.tag_name().name() == "p")
        {
            let text: String = paragraph
                .descendants()
                .filter(|n| n.is_text())
                .filter_map(|n| n.text())
                .collect();
            if let Some((key, value)) = text.split_once(':') {
                entries.insert(key.trim().to_uppercase(), value.trim().to_string());
            }
        }
    }
    entries
}

fn strip_prefix<'s>(id: &'s str, prefix: &str) -> &'s str {
    id.strip_prefix(prefix).unwrap_or(id)
}

fn parse_number(value: &str) -> Result<f64, SbmlError> {
    match value.trim() {
        "INF" | "inf" | "Infinity" => Ok(f64::INFINITY),
        "-INF" | "-inf" | "-Infinity" => Ok(f64::NEG_INFINITY),
        v => v
            .parse::<f64>()
            .map_err(|_| SbmlError::InvalidNumber(value.to_string())),
    }
}

/// Infinite bounds are replaced by the configured default bounds
fn finite_or(value: f64, lower: f64, upper: f64) -> f64 {
    if value == f64::INFINITY {
        upper
    } else if value == f64::NEG_INFINITY {
        lower
    } else {
        value
    }
}

fn escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
// endregion XML helpers

// region Writing
fn write_document(model: &Model, out: &mut String) -> std::fmt::Result {
    writeln!(out, r#"<?xml version="1.0" encoding="UTF-8"?>"#)?;
    writeln!(
        out,
        r#"<sbml xmlns="{}" xmlns:fbc="{}" level="3" version="1" fbc:required="false">"#,
        SBML_L3V1_NS, FBC_V2_NS
    )?;
    write!(out, r#"  <model id="{}""#, escape(model.id_or("model")))?;
    if let Some(name) = &model.name {
        write!(out, r#" name="{}""#, escape(name))?;
    }
    writeln!(out, r#" fbc:strict="true">"#)?;

    write_compartments(model, out)?;
    write_species(model, out)?;
    write_bound_parameters(model, out)?;
    write_reactions(model, out)?;
    write_objective(model, out)?;
    write_gene_products(model, out)?;

    writeln!(out, "  </model>")?;
    writeln!(out, "</sbml>")
}

fn write_compartments(model: &Model, out: &mut String) -> std::fmt::Result {
    let mut compartments: IndexMap<&str, &str> = model
        .compartments
        .iter()
        .flatten()
        .map(|(id, name)| (id.as_str(), name.as_str()))
        .collect();
    for compartment in model.metabolites.values().filter_map(|m| m.compartment.as_deref()) {
        compartments.entry(compartment).or_insert(compartment);
    }
    if compartments.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <listOfCompartments>")?;
    for (id, name) in compartments {
        writeln!(
            out,
            r#"      <compartment id="{}" name="{}" constant="true"/>"#,
            escape(id),
            escape(name)
        )?;
    }
    writeln!(out, "    </listOfCompartments>")
}

fn write_species(model: &Model, out: &mut String) -> std::fmt::Result {
    if model.metabolites.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <listOfSpecies>")?;
    for met in model.metabolites.values() {
        write!(out, r#"      <species id="{}{}""#, SPECIES_PREFIX, escape(&met.id))?;
        if let Some(name) = &met.name {
            write!(out, r#" name="{}""#, escape(name))?;
        }
        if let Some(compartment) = &met.compartment {
            write!(out, r#" compartment="{}""#, escape(compartment))?;
        }
        write!(
            out,
            r#" hasOnlySubstanceUnits="false" boundaryCondition="false" constant="false" fbc:charge="{}""#,
            met.charge
        )?;
        if let Some(formula) = &met.formula {
            write!(out, r#" fbc:chemicalFormula="{}""#, escape(formula))?;
        }
        writeln!(out, "/>")?;
    }
    writeln!(out, "    </listOfSpecies>")
}

fn lower_bound_parameter(reaction_id: &str) -> String {
    format!("{}{}_lower_bound", REACTION_PREFIX, reaction_id)
}

fn upper_bound_parameter(reaction_id: &str) -> String {
    format!("{}{}_upper_bound", REACTION_PREFIX, reaction_id)
}

fn write_bound_parameters(model: &Model, out: &mut String) -> std::fmt::Result {
    if model.reactions.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <listOfParameters>")?;
    for reaction in model.reactions.values() {
        for (id, value) in [
            (lower_bound_parameter(&reaction.id), reaction.lower_bound),
            (upper_bound_parameter(&reaction.id), reaction.upper_bound),
        ] {
            writeln!(
                out,
                r#"      <parameter id="{}" value="{}" constant="true" sboTerm="SBO:0000625"/>"#,
                escape(&id),
                value
            )?;
        }
    }
    writeln!(out, "    </listOfParameters>")
}

fn write_reactions(model: &Model, out: &mut String) -> std::fmt::Result {
    if model.reactions.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <listOfReactions>")?;
    for reaction in model.reactions.values() {
        write!(
            out,
            r#"      <reaction id="{}{}""#,
            REACTION_PREFIX,
            escape(&reaction.id)
        )?;
        if let Some(name) = &reaction.name {
            write!(out, r#" name="{}""#, escape(name))?;
        }
        writeln!(
            out,
            r#" reversible="{}" fast="false" fbc:lowerFluxBound="{}" fbc:upperFluxBound="{}">"#,
            reaction.reversibility(),
            escape(&lower_bound_parameter(&reaction.id)),
            escape(&upper_bound_parameter(&reaction.id))
        )?;

        // FBC associations can't express negation, such rules are kept in the notes
        let note_rule = reaction.gpr.as_ref().filter(|gpr| contains_not(gpr));
        if reaction.subsystem.is_some() || note_rule.is_some() {
            writeln!(out, r#"        <notes>"#)?;
            writeln!(out, r#"          <body xmlns="{}">"#, XHTML_NS)?;
            if let Some(subsystem) = &reaction.subsystem {
                writeln!(out, "            <p>SUBSYSTEM: {}</p>", escape(subsystem))?;
            }
            if let Some(rule) = note_rule {
                writeln!(
                    out,
                    "            <p>GENE_ASSOCIATION: {}</p>",
                    escape(&rule.to_string())
                )?;
            }
            writeln!(out, "          </body>")?;
            writeln!(out, "        </notes>")?;
        }

        for (list, reactants) in [("listOfReactants", true), ("listOfProducts", false)] {
            let references: Vec<(&String, f64)> = reaction
                .metabolites
                .iter()
                .filter(|(_, coef)| if reactants { **coef < 0. } else { **coef > 0. })
                .map(|(met, coef)| (met, coef.abs()))
                .collect();
            if references.is_empty() {
                continue;
            }
            writeln!(out, "        <{}>", list)?;
            for (met, stoichiometry) in references {
                writeln!(
                    out,
                    r#"          <speciesReference species="{}{}" stoichiometry="{}" constant="true"/>"#,
                    SPECIES_PREFIX,
                    escape(met),
                    stoichiometry
                )?;
            }
            writeln!(out, "        </{}>", list)?;
        }

        if let Some(gpr) = reaction.gpr.as_ref().filter(|gpr| !contains_not(gpr)) {
            writeln!(out, "        <fbc:geneProductAssociation>")?;
            write_association(gpr, out, 10)?;
            writeln!(out, "        </fbc:geneProductAssociation>")?;
        }
        writeln!(out, "      </reaction>")?;
    }
    writeln!(out, "    </listOfReactions>")
}

fn contains_not(gpr: &Gpr) -> bool {
    match gpr {
        Gpr::GeneNode(_) => false,
        Gpr::Operation(GprOperation::Not { .. }) => true,
        Gpr::Operation(GprOperation::And { left, right })
        | Gpr::Operation(GprOperation::Or { left, right }) => {
            contains_not(left) || contains_not(right)
        }
    }
}

/// Operands of nested operations of the same kind, `(a or b) or c` gives `[a, b, c]`
fn flatten_operands<'g>(gpr: &'g Gpr, conjunction: bool, operands: &mut Vec<&'g Gpr>) {
    match gpr {
        Gpr::Operation(GprOperation::And { left, right }) if conjunction => {
            flatten_operands(left, conjunction, operands);
            flatten_operands(right, conjunction, operands);
        }
        Gpr::Operation(GprOperation::Or { left, right }) if !conjunction => {
            flatten_operands(left, conjunction, operands);
            flatten_operands(right, conjunction, operands);
        }
        _ => operands.push(gpr),
    }
}

fn write_association(gpr: &Gpr, out: &mut String, indent: usize) -> std::fmt::Result {
    let pad = " ".repeat(indent);
    let conjunction = match gpr {
        Gpr::GeneNode(gene) => {
            return writeln!(
                out,
                r#"{}<fbc:geneProductRef fbc:geneProduct="{}{}"/>"#,
                pad,
                GENE_PREFIX,
                escape(gene)
            );
        }
        Gpr::Operation(GprOperation::And { .. }) => true,
        Gpr::Operation(GprOperation::Or { .. }) => false,
        Gpr::Operation(GprOperation::Not { .. }) => return Err(std::fmt::Error),
    };
    let tag = if conjunction { "fbc:and" } else { "fbc:or" };
    let mut operands = Vec::new();
    flatten_operands(gpr, conjunction, &mut operands);
    writeln!(out, "{}<{}>", pad, tag)?;
    for operand in operands {
        write_association(operand, out, indent + 2)?;
    }
    writeln!(out, "{}</{}>", pad, tag)
}

fn write_objective(model: &Model, out: &mut String) -> std::fmt::Result {
    let sense = match model.objective_sense {
        ObjectiveSense::Maximize => "maximize",
        ObjectiveSense::Minimize => "minimize",
    };
    writeln!(out, r#"    <fbc:listOfObjectives fbc:activeObjective="obj">"#)?;
    writeln!(out, r#"      <fbc:objective fbc:id="obj" fbc:type="{}">"#, sense)?;
    writeln!(out, "        <fbc:listOfFluxObjectives>")?;
    for (reaction, coefficient) in &model.objective {
        writeln!(
            out,
            r#"          <fbc:fluxObjective fbc:reaction="{}{}" fbc:coefficient="{}"/>"#,
            REACTION_PREFIX,
            escape(reaction),
            coefficient
        )?;
    }
    writeln!(out, "        </fbc:listOfFluxObjectives>")?;
    writeln!(out, "      </fbc:objective>")?;
    writeln!(out, "    </fbc:listOfObjectives>")
}

fn write_gene_products(model: &Model, out: &mut String) -> std::fmt::Result {
    if model.genes.is_empty() {
        return Ok(());
    }
    writeln!(out, "    <fbc:listOfGeneProducts>")?;
    for gene in model.genes.values() {
        write!(
            out,
            r#"      <fbc:geneProduct fbc:id="{}{}" fbc:label="{}""#,
            GENE_PREFIX,
            escape(&gene.id),
            escape(&gene.id)
        )?;
        if let Some(name) = &gene.name {
            write!(out, r#" fbc:name="{}""#, escape(name))?;
        }
        writeln!(out, "/>")?;
    }
    writeln!(out, "    </fbc:listOfGeneProducts>")
}
// endregion Writing

#[derive(Error, Debug)]
pub enum SbmlError {
    #[error("Unable to read or write file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid XML: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("SBML document contains no model element")]
    MissingModel,
    #[error("Element {element} is missing attribute {attribute}")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
    #[error("Invalid number {0}")]
    InvalidNumber(String),
    #[error("Reaction {reaction} references undefined parameter {parameter}")]
    UnknownParameter { reaction: String, parameter: String },
    #[error("Invalid gene product association: {0}")]
    InvalidAssociation(String),
    #[error("Unable to parse GPR rule: {0}")]
    Gpr(#[from] GprParseError),
    #[error("Unable to build reaction: {0}")]
    UnableToBuildReaction(#[from] ReactionBuilderError),
    #[error("Unable to format SBML document")]
    Format(#[from] std::fmt::Error),
}

impl SbmlError {
    fn missing(element: &'static str, attribute: &'static str) -> SbmlError {
        SbmlError::MissingAttribute { element, attribute }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::toy_model;

    #[test]
    fn round_trip() {
        let model = toy_model();
        let sbml = model.to_sbml_string().unwrap();
        let reread = Model::from_sbml_str(&sbml).unwrap();

        assert_eq!(reread.id, model.id);
        assert_eq!(
            reread.reactions.keys().collect::<Vec<_>>(),
            model.reactions.keys().collect::<Vec<_>>()
        );
        for (id, reaction) in &model.reactions {
            let other = &reread.reactions[id];
            assert_eq!(other.metabolites, reaction.metabolites, "{}", id);
            assert!((other.lower_bound - reaction.lower_bound).abs() < 1e-25);
            assert!((other.upper_bound - reaction.upper_bound).abs() < 1e-25);
            assert_eq!(other.gpr, reaction.gpr, "{}", id);
            assert_eq!(other.subsystem, reaction.subsystem);
            assert_eq!(other.name, reaction.name);
        }
        assert_eq!(reread.objective, model.objective);
        assert_eq!(reread.objective_sense, ObjectiveSense::Maximize);
        assert_eq!(
            reread.genes.keys().collect::<Vec<_>>(),
            model.genes.keys().collect::<Vec<_>>()
        );
        assert_eq!(reread.genes["b0003"].name.as_deref(), Some("actP"));
        let glucose = &reread.metabolites["glc__D_e"];
        assert_eq!(glucose.formula.as_deref(), Some("C6H12O6"));
        assert_eq!(glucose.compartment.as_deref(), Some("e"));
        assert_eq!(reread.metabolites["ac_e"].charge, -1);
    }

    #[test]
    fn written_ids_are_prefixed() {
        let sbml = toy_model().to_sbml_string().unwrap();
        assert!(sbml.contains(r#"<species id="M_glc__D_e""#));
        assert!(sbml.contains(r#"<reaction id="R_UPT""#));
        assert!(sbml.contains(r#"fbc:geneProduct="G_b0001""#));
        assert!(sbml.contains(r#"<fbc:or>"#));
    }

    #[test]
    fn negated_rules_survive_in_notes() {
        let mut model = toy_model();
        model.reactions["DEAD"].gpr = Some(Gpr::new_and(
            Gpr::new_gene_node("b0004"),
            Gpr::new_not(Gpr::new_gene_node("b0001")),
        ));
        let reread = Model::from_sbml_str(&model.to_sbml_string().unwrap()).unwrap();
        assert_eq!(reread.reactions["DEAD"].gpr, model.reactions["DEAD"].gpr);
    }

    #[test]
    fn level2_cobra_document() {
        let sbml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level2/version4" level="2" version="4">
  <model id="legacy">
    <listOfCompartments>
      <compartment id="c" name="cytosol"/>
    </listOfCompartments>
    <listOfSpecies>
      <species id="M_a_c" name="A" compartment="c" charge="-2">
        <notes><html:p xmlns:html="http://www.w3.org/1999/xhtml">FORMULA: C2H4</html:p></notes>
      </species>
      <species id="M_b_c" name="B" compartment="c"/>
      <species id="M_a_b" compartment="c" boundaryCondition="true"/>
    </listOfSpecies>
    <listOfReactions>
      <reaction id="R_IN" reversible="false">
        <listOfReactants><speciesReference species="M_a_b"/></listOfReactants>
        <listOfProducts><speciesReference species="M_a_c"/></listOfProducts>
        <kineticLaw>
          <listOfParameters>
            <parameter id="LOWER_BOUND" value="0"/>
            <parameter id="UPPER_BOUND" value="5"/>
          </listOfParameters>
        </kineticLaw>
      </reaction>
      <reaction id="R_CONV" reversible="true">
        <notes><body xmlns="http://www.w3.org/1999/xhtml"><p>GENE_ASSOCIATION: (g1 and g2) or g3</p><p>SUBSYSTEM: Core</p></body></notes>
        <listOfReactants><speciesReference species="M_a_c" stoichiometry="2"/></listOfReactants>
        <listOfProducts><speciesReference species="M_b_c"/></listOfProducts>
        <kineticLaw>
          <listOfParameters>
            <parameter id="LOWER_BOUND" value="-INF"/>
            <parameter id="UPPER_BOUND" value="INF"/>
            <parameter id="OBJECTIVE_COEFFICIENT" value="1"/>
          </listOfParameters>
        </kineticLaw>
      </reaction>
    </listOfReactions>
  </model>
</sbml>"#;
        let model = Model::from_sbml_str(sbml).unwrap();
        assert_eq!(model.id.as_deref(), Some("legacy"));
        assert_eq!(model.metabolites.len(), 2);
        assert_eq!(model.metabolites["a_c"].formula.as_deref(), Some("C2H4"));
        assert_eq!(model.metabolites["a_c"].charge, -2);

        let inflow = &model.reactions["IN"];
        assert_eq!(inflow.metabolites.len(), 1);
        assert!((inflow.upper_bound - 5.).abs() < 1e-25);

        let conv = &model.reactions["CONV"];
        assert!((conv.metabolites["a_c"] + 2.).abs() < 1e-25);
        assert!((conv.lower_bound + 1000.).abs() < 1e-25);
        assert!((conv.upper_bound - 1000.).abs() < 1e-25);
        assert_eq!(conv.gene_reaction_rule(), "g1 and g2 or g3");
        assert_eq!(conv.subsystem.as_deref(), Some("Core"));
        assert_eq!(model.genes.len(), 3);
        assert!((model.objective["CONV"] - 1.).abs() < 1e-25);
    }

    #[test]
    fn fbc_version1_bounds() {
        let sbml = r#"<?xml version="1.0" encoding="UTF-8"?>
<sbml xmlns="http://www.sbml.org/sbml/level3/version1/core"
      xmlns:fbc="http://www.sbml.org/sbml/level3/version1/fbc/version1" level="3" version="1">
  <model id="v1">
    <listOfSpecies>
      <species id="M_a_e" compartment="e"/>
    </listOfSpecies>
    <listOfReactions>
      <reaction id="R_EX_a_e" reversible="true">
        <listOfReactants><speciesReference species="M_a_e" stoichiometry="1"/></listOfReactants>
      </reaction>
    </listOfReactions>
    <fbc:listOfFluxBounds>
      <fbc:fluxBound fbc:reaction="R_EX_a_e" fbc:operation="greaterEqual" fbc:value="-7"/>
      <fbc:fluxBound fbc:reaction="R_EX_a_e" fbc:operation="lessEqual" fbc:value="3"/>
    </fbc:listOfFluxBounds>
    <fbc:listOfObjectives fbc:activeObjective="o2">
      <fbc:objective fbc:id="o1" fbc:type="maximize">
        <fbc:listOfFluxObjectives>
          <fbc:fluxObjective fbc:reaction="R_EX_a_e" fbc:coefficient="2"/>
        </fbc:listOfFluxObjectives>
      </fbc:objective>
      <fbc:objective fbc:id="o2" fbc:type="minimize">
        <fbc:listOfFluxObjectives>
          <fbc:fluxObjective fbc:reaction="R_EX_a_e" fbc:coefficient="1"/>
        </fbc:listOfFluxObjectives>
      </fbc:objective>
    </fbc:listOfObjectives>
  </model>
</sbml>"#;
        let model = Model::from_sbml_str(sbml).unwrap();
        let exchange = &model.reactions["EX_a_e"];
        assert!((exchange.lower_bound + 7.).abs() < 1e-25);
        assert!((exchange.upper_bound - 3.).abs() < 1e-25);
        assert_eq!(model.objective_sense, ObjectiveSense::Minimize);
        assert!((model.objective["EX_a_e"] - 1.).abs() < 1e-25);
    }

    #[test]
    fn malformed_documents() {
        assert!(matches!(
            Model::from_sbml_str("<sbml><model"),
            Err(SbmlError::Xml(_))
        ));
        assert!(matches!(
            Model::from_sbml_str("<sbml/>"),
            Err(SbmlError::MissingModel)
        ));
        let unknown_parameter = r#"<sbml xmlns:fbc="http://www.sbml.org/sbml/level3/version1/fbc/version2">
  <model><listOfReactions><reaction id="R_x" fbc:lowerFluxBound="missing"/></listOfReactions></model>
</sbml>"#;
        match Model::from_sbml_str(unknown_parameter) {
            Err(SbmlError::UnknownParameter { reaction, parameter }) => {
                assert_eq!(reaction, "x");
                assert_eq!(parameter, "missing");
            }
            _ => panic!("Unknown parameter not caught"),
        }
    }
}
