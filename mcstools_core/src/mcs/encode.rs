//! Conversion of text minimal cut sets into their binary form
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::{debug, info, warn};

use crate::mcs::reaction_list::ReactionList;
use crate::mcs::{BinaryMcs, McsError};

/// Split a text MCS line into reaction identifiers
///
/// Identifiers are separated by single spaces if the line contains a space, by commas otherwise.
/// Surrounding double quotes and empty fields are dropped.
pub fn split_mcs_line(line: &str) -> Vec<&str> {
    let line = line.trim();
    let separator = if line.contains(' ') { ' ' } else { ',' };
    line.split(separator)
        .map(|token| token.trim().trim_matches('"'))
        .filter(|token| !token.is_empty())
        .collect()
}

/// Encode a single text MCS against `reactions`
///
/// Returns `Ok(None)` for blank lines.
pub fn encode_mcs(
    line: &str,
    line_number: usize,
    reactions: &ReactionList,
) -> Result<Option<BinaryMcs>, McsError> {
    let members = split_mcs_line(line);
    if members.is_empty() {
        return Ok(None);
    }
    let mut membership = vec![false; reactions.len()];
    for reaction in members {
        match reactions.index_of(reaction) {
            Some(idx) => membership[idx] = true,
            None => {
                return Err(McsError::UnknownReaction {
                    reaction: reaction.to_string(),
                    line: line_number,
                })
            }
        }
    }
    Ok(Some(BinaryMcs::from_membership(&membership)))
}

/// Encode every MCS read from `reader`, writing one binary line per MCS to `writer`
///
/// Returns the number of encoded cut sets.
pub fn encode_mcs_stream<R: BufRead, W: Write>(
    reader: R,
    writer: &mut W,
    reactions: &ReactionList,
) -> Result<usize, McsError> {
    let mut encoded = 0usize;
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        match encode_mcs(&line, idx + 1, reactions)? {
            Some(mcs) => {
                writeln!(writer, "{}", mcs)?;
                encoded += 1;
            }
            None => debug!("Skipping blank line {}", idx + 1),
        }
    }
    Ok(encoded)
}

/// Encode the text MCS file `mcs_path` against the reaction list in `reactions_path`
///
/// The output file is created (or truncated) once the reaction list has been read. A cut set
/// referencing an unknown reaction aborts the run, lines encoded before it stay in the output.
pub fn encode_mcs_file<P, Q, O>(
    mcs_path: P,
    reactions_path: Q,
    output_path: O,
) -> Result<usize, McsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    O: AsRef<Path>,
{
    let reactions = ReactionList::read(reactions_path)?;
    if reactions.is_empty() {
        warn!("Reaction list is empty, every cut set will reference an unknown reaction");
    } else {
        info!("Read {} reactions", reactions.len());
    }
    let reader = BufReader::new(File::open(mcs_path)?);
    let mut writer = BufWriter::new(File::create(output_path)?);
    let encoded = encode_mcs_stream(reader, &mut writer, &reactions)?;
    writer.flush()?;
    info!("Encoded {} minimal cut sets", encoded);
    Ok(encoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use std::io::Cursor;

    fn reactions() -> ReactionList {
        "r1 r2 r3".parse().unwrap()
    }

    #[test]
    fn separator_detection() {
        assert_eq!(split_mcs_line("r1 r3\n"), vec!["r1", "r3"]);
        assert_eq!(split_mcs_line("r1,r3\n"), vec!["r1", "r3"]);
        assert_eq!(split_mcs_line("\"r1\",\"r3\""), vec!["r1", "r3"]);
        assert_eq!(split_mcs_line("r1  r3"), vec!["r1", "r3"]);
        assert!(split_mcs_line("   \n").is_empty());
    }

    #[test]
    fn encodes_members() {
        let mcs = encode_mcs("r1 r3", 1, &reactions()).unwrap().unwrap();
        assert_eq!(mcs.as_str(), "101");
        let mcs = encode_mcs("r2", 2, &reactions()).unwrap().unwrap();
        assert_eq!(mcs.as_str(), "010");
    }

    #[test]
    fn unknown_reaction() {
        match encode_mcs("r1,r4", 7, &reactions()) {
            Err(McsError::UnknownReaction { reaction, line }) => {
                assert_eq!(reaction, "r4");
                assert_eq!(line, 7);
            }
            _ => panic!("Unknown reaction not caught"),
        }
    }

    #[test]
    fn stream() {
        let input = "r1 r3\nr2,r3\n\n\"r1\",\"r2\",\"r3\"\n";
        let mut output: Vec<u8> = Vec::new();
        let encoded = encode_mcs_stream(Cursor::new(input), &mut output, &reactions()).unwrap();
        assert_eq!(encoded, 3);
        assert_eq!(String::from_utf8(output).unwrap(), "101\n011\n111\n");
    }

    #[test]
    fn encode_file() {
        let dir = tempfile::tempdir().unwrap();
        let rxns = dir.path().join("model.rfile");
        let mcs = dir.path().join("mcs.txt");
        let out = dir.path().join("mcs.bin");
        fs::write(&rxns, "\"r1\" \"r2\" \"r3\"").unwrap();
        fs::write(&mcs, "r1 r3\nr2\n").unwrap();
        let encoded = encode_mcs_file(&mcs, &rxns, &out).unwrap();
        assert_eq!(encoded, 2);
        assert_eq!(fs::read_to_string(&out).unwrap(), "101\n010\n");
    }

    #[test]
    fn file_unknown_reaction_fails() {
        let dir = tempfile::tempdir().unwrap();
        let rxns = dir.path().join("model.rfile");
        let mcs = dir.path().join("mcs.txt");
        let out = dir.path().join("mcs.bin");
        fs::write(&rxns, "r1 r2 r3").unwrap();
        fs::write(&mcs, "r1 r3\nr1 EX_glc\n").unwrap();
        assert!(matches!(
            encode_mcs_file(&mcs, &rxns, &out),
            Err(McsError::UnknownReaction { line: 2, .. })
        ));
    }

    #[test]
    fn empty_reaction_list() {
        let dir = tempfile::tempdir().unwrap();
        let rxns = dir.path().join("model.rfile");
        let mcs = dir.path().join("mcs.txt");
        let out = dir.path().join("mcs.bin");
        fs::write(&rxns, "\n").unwrap();
        fs::write(&mcs, "\nr1\n").unwrap();
        assert!(matches!(
            encode_mcs_file(&mcs, &rxns, &out),
            Err(McsError::UnknownReaction { line: 2, .. })
        ));
    }
}
