//! Partitioning of binary MCS files by cardinality
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;

use crate::mcs::{BinaryMcs, BinaryMcsReader, McsError};

/// An output file written by one of the splitters
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Partition {
    /// Cardinality the file is named after
    pub cardinality: usize,
    /// Location of the file, `{prefix}{cardinality}`
    pub path: PathBuf,
    /// Number of cut sets in the file
    pub lines: usize,
}

/// Path of the partition file for `cardinality`
///
/// The prefix is used verbatim, so `out/mcs_d` and cardinality 3 gives `out/mcs_d3`.
pub fn partition_path<P: AsRef<Path>>(prefix: P, cardinality: usize) -> PathBuf {
    let mut name = OsString::from(prefix.as_ref().as_os_str());
    name.push(cardinality.to_string());
    PathBuf::from(name)
}

fn write_partition(path: &Path, cut_sets: &[BinaryMcs]) -> Result<(), McsError> {
    let mut writer = BufWriter::new(File::create(path)?);
    for mcs in cut_sets {
        writeln!(writer, "{}", mcs)?;
    }
    writer.flush()?;
    Ok(())
}

/// Write every cut set of `input` into `{prefix}{cardinality}`
///
/// The input is validated completely before any output is written. Every partition file is
/// created from scratch, so content from earlier runs never survives, and cut sets keep their
/// input order within a partition.
///
/// Returns the written partitions in increasing cardinality.
pub fn split_by_cardinality<P, Q>(input: P, prefix: Q) -> Result<Vec<Partition>, McsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let reader = BinaryMcsReader::new(BufReader::new(File::open(input)?));
    let mut groups: BTreeMap<usize, Vec<BinaryMcs>> = BTreeMap::new();
    for mcs in reader {
        let mcs = mcs?;
        groups.entry(mcs.cardinality()).or_default().push(mcs);
    }

    let mut partitions = Vec::with_capacity(groups.len());
    for (cardinality, cut_sets) in groups {
        let path = partition_path(&prefix, cardinality);
        write_partition(&path, &cut_sets)?;
        info!("d={}: {} MCS", cardinality, cut_sets.len());
        partitions.push(Partition {
            cardinality,
            path,
            lines: cut_sets.len(),
        });
    }
    Ok(partitions)
}

/// Write cumulative snapshots of a cardinality sorted binary MCS file
///
/// For each cardinality `d` in the input, `{prefix}{d}` receives every cut set from the start of
/// the input up to the last one with cardinality `d`. The input must be sorted by non-decreasing
/// cardinality. On the first decrease the run stops with
/// [`McsError::DecreasingCardinality`]; files written for earlier cardinalities are kept and no
/// further file is written.
pub fn split_by_cardinality_accumulated<P, Q>(
    input: P,
    prefix: Q,
) -> Result<Vec<Partition>, McsError>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
{
    let mut reader = BinaryMcsReader::new(BufReader::new(File::open(input)?));
    let mut seen: Vec<BinaryMcs> = Vec::new();
    let mut partitions = Vec::new();
    let mut current: Option<usize> = None;

    while let Some(mcs) = reader.next() {
        let mcs = mcs?;
        let cardinality = mcs.cardinality();
        if let Some(previous) = current {
            if cardinality < previous {
                return Err(McsError::DecreasingCardinality {
                    line: reader.line_number(),
                    previous,
                    current: cardinality,
                });
            }
            if cardinality > previous {
                partitions.push(write_snapshot(&prefix, previous, &seen)?);
            }
        }
        current = Some(cardinality);
        seen.push(mcs);
    }

    if let Some(last) = current {
        partitions.push(write_snapshot(&prefix, last, &seen)?);
    }
    Ok(partitions)
}

fn write_snapshot<Q: AsRef<Path>>(
    prefix: Q,
    cardinality: usize,
    cut_sets: &[BinaryMcs],
) -> Result<Partition, McsError> {
    let path = partition_path(prefix, cardinality);
    write_partition(&path, cut_sets)?;
    info!("d<={}: done", cardinality);
    Ok(Partition {
        cardinality,
        path,
        lines: cut_sets.len(),
    })
}
