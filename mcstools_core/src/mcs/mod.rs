//! Minimal cut set (MCS) post-processing
//!
//! An MCS is handled either as text (reaction identifiers) or in binary form, a fixed width
//! string of `0`/`1` characters where position `i` marks membership of the `i`-th reaction of a
//! [`reaction_list::ReactionList`].
use std::fmt::{Display, Formatter};
use std::io::BufRead;

use thiserror::Error;

pub mod compressed;
pub mod encode;
pub mod pof;
pub mod reaction_list;
pub mod split;

/// A minimal cut set in binary form
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BinaryMcs {
    bits: String,
}

impl BinaryMcs {
    /// Parse a line of a binary MCS file
    ///
    /// # Parameters
    /// - `line`: line content, trailing whitespace (including the newline) is ignored
    /// - `line_number`: 1-based line number, used in error messages
    pub fn parse(line: &str, line_number: usize) -> Result<BinaryMcs, McsError> {
        let bits = line.trim_end();
        if let Some(character) = bits.chars().find(|c| *c != '0' && *c != '1') {
            return Err(McsError::InvalidBinaryCharacter {
                character,
                line: line_number,
            });
        }
        Ok(BinaryMcs {
            bits: bits.to_string(),
        })
    }

    /// Build the binary form from a membership mask
    pub fn from_membership(membership: &[bool]) -> BinaryMcs {
        BinaryMcs {
            bits: membership
                .iter()
                .map(|member| if *member { '1' } else { '0' })
                .collect(),
        }
    }

    /// Number of reactions in the cut set
    pub fn cardinality(&self) -> usize {
        self.bits.bytes().filter(|b| *b == b'1').count()
    }

    /// Number of reactions the encoding covers
    pub fn width(&self) -> usize {
        self.bits.len()
    }

    /// Indices of the reactions contained in the cut set
    pub fn active_reactions(&self) -> Vec<usize> {
        self.bits
            .bytes()
            .enumerate()
            .filter_map(|(idx, b)| (b == b'1').then_some(idx))
            .collect()
    }

    pub fn as_str(&self) -> &str {
        &self.bits
    }
}

impl Display for BinaryMcs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.bits)
    }
}

/// Iterator over the cut sets of a binary MCS file
///
/// Blank lines are skipped. Every line must have the width of the first non-blank line.
pub struct BinaryMcsReader<R: BufRead> {
    lines: std::io::Lines<R>,
    line_number: usize,
    width: Option<usize>,
}

impl<R: BufRead> BinaryMcsReader<R> {
    pub fn new(reader: R) -> Self {
        BinaryMcsReader {
            lines: reader.lines(),
            line_number: 0,
            width: None,
        }
    }

    /// Line number of the most recently returned cut set
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for BinaryMcsReader<R> {
    type Item = Result<BinaryMcs, McsError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(err) => return Some(Err(McsError::Io(err))),
            };
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }
            let mcs = match BinaryMcs::parse(&line, self.line_number) {
                Ok(mcs) => mcs,
                Err(err) => return Some(Err(err)),
            };
            match self.width {
                None => self.width = Some(mcs.width()),
                Some(expected) if expected != mcs.width() => {
                    return Some(Err(McsError::WidthMismatch {
                        line: self.line_number,
                        expected,
                        found: mcs.width(),
                    }))
                }
                Some(_) => {}
            }
            return Some(Ok(mcs));
        }
    }
}

/// Errors raised while encoding or partitioning minimal cut sets
#[derive(Error, Debug)]
pub enum McsError {
    #[error("Reaction {0} appears more than once in the reaction list")]
    DuplicateReaction(String),
    #[error("Unknown reaction identifier {reaction} on line {line}")]
    UnknownReaction { reaction: String, line: usize },
    #[error("Invalid character {character:?} on line {line}, binary MCS may only contain 0 and 1")]
    InvalidBinaryCharacter { character: char, line: usize },
    #[error("Line {line} encodes {found} reactions, expected {expected}")]
    WidthMismatch {
        line: usize,
        expected: usize,
        found: usize,
    },
    #[error(
        "Decreasing cardinalities encountered on line {line} ({previous} -> {current}). \
         Is the input a valid binary MCS file and sorted properly?"
    )]
    DecreasingCardinality {
        line: usize,
        previous: usize,
        current: usize,
    },
    #[error("No cut sets given")]
    NoCutSets,
    #[error("Cut set {0} contains no reaction")]
    EmptyCutSet(usize),
    #[error("Invalid compressed reaction count {0:?}, expected a positive integer")]
    InvalidCount(String),
    #[error("{found} compressed reaction counts given, cut sets encode {expected} reactions")]
    CountMismatch { expected: usize, found: usize },
    #[error("{given} reactions given, the compressed reactions stand for {required}")]
    TooFewReactions { given: usize, required: usize },
    #[error("Unable to start worker threads: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
