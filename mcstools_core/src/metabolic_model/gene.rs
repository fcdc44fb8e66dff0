//! This module provides the Gene struct, representing a gene, and the Gpr enum, representing a
//! gene protein reaction rule
use std::fmt::{Display, Formatter};

use derive_builder::Builder;
use indexmap::IndexSet;
use serde_json::Value;

/// Structure Representing a Gene
#[derive(Builder, Clone, Debug, PartialEq)]
pub struct Gene {
    /// Used to identify the gene
    pub id: String,
    /// Human Readable Gene Name
    #[builder(default = "None")]
    pub name: Option<String>,
    /// Notes about the gene
    #[builder(default = "None")]
    pub notes: Option<Value>,
    /// Gene Annotations
    #[builder(default = "None")]
    pub annotation: Option<Value>,
}

impl Gene {
    /// Create a gene which only carries an id
    pub fn new(id: &str) -> Gene {
        Gene {
            id: id.to_string(),
            name: None,
            notes: None,
            annotation: None,
        }
    }
}

impl Display for Gene {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

// region GPR
/// Representation of a Gene Protein Reaction Rule as an AST
#[derive(Clone, Debug, PartialEq)]
pub enum Gpr {
    /// Operation on genes (see [`GprOperation`])
    Operation(GprOperation),
    /// A terminal gene node, holding the gene id
    GeneNode(String),
}

/// Possible operations on genes
#[derive(Clone, Debug, PartialEq)]
pub enum GprOperation {
    Or { left: Box<Gpr>, right: Box<Gpr> },
    And { left: Box<Gpr>, right: Box<Gpr> },
    Not { val: Box<Gpr> },
}

impl Gpr {
    pub fn new_gene_node(gene: &str) -> Gpr {
        Gpr::GeneNode(gene.to_string())
    }

    pub fn new_or(left: Gpr, right: Gpr) -> Gpr {
        Gpr::Operation(GprOperation::Or {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn new_and(left: Gpr, right: Gpr) -> Gpr {
        Gpr::Operation(GprOperation::And {
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn new_not(val: Gpr) -> Gpr {
        Gpr::Operation(GprOperation::Not { val: Box::new(val) })
    }

    /// Ids of all genes referenced by the rule, in order of first appearance
    pub fn genes(&self) -> IndexSet<&str> {
        let mut genes = IndexSet::new();
        self.collect_genes(&mut genes);
        genes
    }

    fn collect_genes<'a>(&'a self, genes: &mut IndexSet<&'a str>) {
        match self {
            Gpr::GeneNode(gene) => {
                genes.insert(gene.as_str());
            }
            Gpr::Operation(GprOperation::Or { left, right })
            | Gpr::Operation(GprOperation::And { left, right }) => {
                left.collect_genes(genes);
                right.collect_genes(genes);
            }
            Gpr::Operation(GprOperation::Not { val }) => val.collect_genes(genes),
        }
    }

    /// Generate a GPR string with gene ids from the GPR AST
    ///
    /// Parentheses are only written where the precedence of `and` over `or` requires them, so
    /// `a and (b or c)` keeps its parentheses while `(a and b) or c` is written `a and b or c`.
    pub fn to_string_id(&self) -> String {
        match self {
            Gpr::GeneNode(gene) => gene.clone(),
            Gpr::Operation(GprOperation::Or { left, right }) => {
                format!("{} or {}", left.to_string_id(), right.to_string_id())
            }
            Gpr::Operation(GprOperation::And { left, right }) => {
                format!("{} and {}", left.and_operand(), right.and_operand())
            }
            Gpr::Operation(GprOperation::Not { val }) => match **val {
                Gpr::GeneNode(ref gene) => format!("not {}", gene),
                _ => format!("not ({})", val.to_string_id()),
            },
        }
    }

    fn and_operand(&self) -> String {
        match self {
            Gpr::Operation(GprOperation::Or { .. }) => format!("({})", self.to_string_id()),
            _ => self.to_string_id(),
        }
    }
}

impl Display for Gpr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_string_id())
    }
}
// endregion GPR
