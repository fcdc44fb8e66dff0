//! Member counts of compressed reactions
//!
//! Network compression merges reactions into a single identifier joined with `%`, e.g.
//! `PGI%PFK%FBA`. The counts let cut sets of the compressed network be weighted by the number of
//! original reactions they stand for.
use std::fs;
use std::path::Path;

use log::info;

use crate::mcs::McsError;

/// Number of original reactions behind every whitespace separated compressed reaction
pub fn compressed_reaction_counts(content: &str) -> Vec<usize> {
    content
        .split_whitespace()
        .map(|reaction| reaction.matches('%').count() + 1)
        .collect()
}

/// Read compressed reactions from `input` and write their member counts as a single line
pub fn count_compressed_reactions<P, Q>(input: P, output: Q) -> Result<Vec<usize>, McsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let counts = compressed_reaction_counts(&fs::read_to_string(input)?);
    let line = counts
        .iter()
        .map(|count| count.to_string())
        .collect::<Vec<_>>()
        .join(" ");
    fs::write(output, format!("{}\n", line))?;
    info!("Counted members of {} compressed reactions", counts.len());
    Ok(counts)
}

/// Parse a line of member counts as written by [`count_compressed_reactions`]
pub fn parse_reaction_counts(content: &str) -> Result<Vec<usize>, McsError> {
    content
        .split_whitespace()
        .map(|token| match token.parse::<usize>() {
            Ok(count) if count > 0 => Ok(count),
            _ => Err(McsError::InvalidCount(token.to_string())),
        })
        .collect()
}

/// Read a member count file
pub fn read_reaction_counts<P: AsRef<Path>>(path: P) -> Result<Vec<usize>, McsError> {
    parse_reaction_counts(&fs::read_to_string(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn counts() {
        assert_eq!(compressed_reaction_counts("a b%c d%e%f"), vec![1, 2, 3]);
        assert_eq!(compressed_reaction_counts("\n  R1%R2\nR3\n"), vec![2, 1]);
        assert!(compressed_reaction_counts("").is_empty());
    }

    #[test]
    fn count_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("compressed.rfile");
        let output = dir.path().join("counts.txt");
        fs::write(&input, "a b%c d%e%f\n").unwrap();
        let counts = count_compressed_reactions(&input, &output).unwrap();
        assert_eq!(counts, vec![1, 2, 3]);
        assert_eq!(fs::read_to_string(&output).unwrap(), "1 2 3\n");
        assert_eq!(read_reaction_counts(&output).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn invalid_counts() {
        assert_eq!(parse_reaction_counts(" 4 1\n").unwrap(), vec![4, 1]);
        for content in ["1 x 2", "1 0", "-1"] {
            assert!(matches!(
                parse_reaction_counts(content),
                Err(McsError::InvalidCount(_))
            ));
        }
    }
}
