//! Ordered list of reaction identifiers defining the bit positions of binary cut sets
use std::fs;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexSet;

use crate::mcs::McsError;

/// Reaction identifiers in file order
///
/// The position of a reaction in the list is the position of its bit in a
/// [`BinaryMcs`](crate::mcs::BinaryMcs).
///
/// # Examples
/// ```rust
/// use mcstools_core::mcs::reaction_list::ReactionList;
/// let reactions: ReactionList = "\"r1\" \"r2\" \"r3\"".parse().unwrap();
/// assert_eq!(reactions.index_of("r2"), Some(1));
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReactionList {
    reactions: IndexSet<String>,
}

impl ReactionList {
    /// Read a whitespace separated reaction file, double quotes around identifiers are removed
    pub fn read<P: AsRef<Path>>(path: P) -> Result<ReactionList, McsError> {
        fs::read_to_string(path)?.parse()
    }

    /// Position of `reaction` in the list
    pub fn index_of(&self, reaction: &str) -> Option<usize> {
        self.reactions.get_index_of(reaction)
    }

    pub fn len(&self) -> usize {
        self.reactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactions.is_empty()
    }
}

impl FromStr for ReactionList {
    type Err = McsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut reactions = IndexSet::new();
        for token in s.split_whitespace() {
            let id = token.replace('"', "");
            if id.is_empty() {
                continue;
            }
            if !reactions.insert(id.clone()) {
                return Err(McsError::DuplicateReaction(id));
            }
        }
        Ok(ReactionList { reactions })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_file_order() {
        let reactions: ReactionList = "PGI PFK\nFBA  TPI\t\"GAPD\"\n".parse().unwrap();
        assert_eq!(reactions.len(), 5);
        let positions: Vec<Option<usize>> = ["PGI", "PFK", "FBA", "TPI", "GAPD"]
            .into_iter()
            .map(|id| reactions.index_of(id))
            .collect();
        assert_eq!(positions, vec![Some(0), Some(1), Some(2), Some(3), Some(4)]);
        assert_eq!(reactions.index_of("ENO"), None);
    }

    #[test]
    fn empty_list() {
        let reactions: ReactionList = " \n\"\"\n".parse().unwrap();
        assert!(reactions.is_empty());
        assert_eq!(reactions.index_of(""), None);
    }

    #[test]
    fn duplicate_reaction() {
        match "r1 r2 \"r1\"".parse::<ReactionList>() {
            Err(McsError::DuplicateReaction(id)) => assert_eq!(id, "r1"),
            _ => panic!("Duplicate reaction not caught"),
        }
    }

    #[test]
    fn read_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.rfile");
        fs::write(&path, "r1 r2 r3").unwrap();
        let reactions = ReactionList::read(&path).unwrap();
        assert_eq!(reactions.len(), 3);
        assert!(ReactionList::read(dir.path().join("missing")).is_err());
    }
}
