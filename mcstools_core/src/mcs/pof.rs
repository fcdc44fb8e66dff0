//! Probability of failure (PoF) of a network from its low cardinality minimal cut sets
//!
//! `F(d)` is the fraction of all sets of `d` deleted reactions which contain at least one MCS.
//! It is obtained by inclusion-exclusion over unions of cut sets, collected in a table of
//! counts keyed by the cardinality `|Mj|` of a union and the number `a` of reactions whose
//! deletion next to it would already be lethal earlier in the order ("plus one" reactions).
//! Each entry contributes the probability that a random `d`-set contains the `|Mj|` reactions
//! while avoiding the `a` reactions.
//!
//! Cut sets of a compressed network are resolved into the cut sets of the original network
//! through the number of original reactions behind every compressed reaction.
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::{debug, info};
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;

use crate::mcs::compressed::read_reaction_counts;
use crate::mcs::{BinaryMcs, BinaryMcsReader, McsError};

/// Inclusion-exclusion counts, keyed by `(|Mj|, a)`
#[derive(Clone, Debug, PartialEq)]
pub struct CdTable {
    reactions: usize,
    max_d: usize,
    counts: BTreeMap<(usize, usize), i128>,
}

impl CdTable {
    fn new(reactions: usize, max_d: usize) -> Self {
        CdTable {
            reactions,
            max_d,
            counts: BTreeMap::new(),
        }
    }

    fn add(&mut self, cardinality: usize, plus_one: usize, count: i128) {
        *self.counts.entry((cardinality, plus_one)).or_insert(0) += count;
    }

    fn merge(mut self, other: CdTable) -> Self {
        for (key, count) in other.counts {
            *self.counts.entry(key).or_insert(0) += count;
        }
        self
    }

    /// Number of reactions of the (uncompressed) network
    pub fn reactions(&self) -> usize {
        self.reactions
    }

    /// Largest number of deletions the table is complete for
    pub fn max_d(&self) -> usize {
        self.max_d
    }

    /// Non-zero entries as `(|Mj|, a, count)`, ordered by `|Mj|` then `a`
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize, i128)> + '_ {
        self.counts
            .iter()
            .filter(|(_, count)| **count != 0)
            .map(|((cardinality, plus_one), count)| (*cardinality, *plus_one, *count))
    }

    /// Fraction of the sets of `d` deleted reactions containing a cut set
    pub fn probability_of_failure(&self, d: usize) -> f64 {
        self.iter()
            .map(|(cardinality, plus_one, count)| {
                count as f64 * failure_score(self.reactions, plus_one, cardinality, d)
            })
            .sum()
    }

    /// `(d, F(d))` for `d` in `1..=max_d`
    pub fn probabilities_of_failure(&self) -> Vec<(usize, f64)> {
        (1..=self.max_d)
            .map(|d| (d, self.probability_of_failure(d)))
            .collect()
    }
}

impl Display for CdTable {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "|Mj|\ta\t#")?;
        for (cardinality, plus_one, count) in self.iter() {
            writeln!(f, "{}\t{}\t{}", cardinality, plus_one, count)?;
        }
        Ok(())
    }
}

/// Probability that a random set of `d` out of `reactions` deletions contains `cardinality`
/// given reactions and none of `plus_one` other given reactions
pub fn failure_score(reactions: usize, plus_one: usize, cardinality: usize, d: usize) -> f64 {
    if cardinality > d || plus_one + d > reactions {
        return 0.;
    }
    let contained: f64 = (0..cardinality)
        .map(|k| (d - k) as f64 / (reactions - plus_one - k) as f64)
        .product();
    let avoided: f64 = (0..plus_one)
        .map(|i| (reactions - d - i) as f64 / (reactions - i) as f64)
        .product();
    contained * avoided
}

/// Computes the [`CdTable`] of a set of minimal cut sets
#[derive(Clone, Debug)]
pub struct PofCalculator {
    /// Reactions of the (uncompressed) network
    reactions: usize,
    /// Cut sets of cardinality above one, sorted by cardinality, single reactions removed
    cut_sets: Vec<Vec<usize>>,
    /// Weight of the single reaction cut sets
    single_weight: usize,
    /// Members of each compressed reaction, single reactions removed
    compressed_counts: Option<Vec<usize>>,
}

impl PofCalculator {
    /// Calculator for cut sets of an uncompressed network
    pub fn new(cut_sets: &[BinaryMcs]) -> Result<Self, McsError> {
        Self::build(cut_sets, None, None)
    }

    /// Calculator for cut sets of a compressed network
    ///
    /// # Parameters
    /// - `counts`: number of original reactions behind each compressed reaction
    /// - `reactions`: reactions of the uncompressed network, defaults to the sum of `counts`
    pub fn compressed(
        cut_sets: &[BinaryMcs],
        counts: &[usize],
        reactions: Option<usize>,
    ) -> Result<Self, McsError> {
        Self::build(cut_sets, Some(counts), reactions)
    }

    /// Read a binary MCS file of an uncompressed network
    pub fn read<P: AsRef<Path>>(mcs_path: P) -> Result<Self, McsError> {
        Self::new(&read_binary_mcs(mcs_path)?)
    }

    /// Read a binary MCS file of a compressed network and its member count file
    pub fn read_compressed<P, Q>(
        mcs_path: P,
        counts_path: Q,
        reactions: Option<usize>,
    ) -> Result<Self, McsError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let counts = read_reaction_counts(counts_path)?;
        Self::compressed(&read_binary_mcs(mcs_path)?, &counts, reactions)
    }

    fn build(
        cut_sets: &[BinaryMcs],
        counts: Option<&[usize]>,
        reactions: Option<usize>,
    ) -> Result<Self, McsError> {
        let width = cut_sets.first().ok_or(McsError::NoCutSets)?.width();
        let mut sets = Vec::with_capacity(cut_sets.len());
        for (idx, mcs) in cut_sets.iter().enumerate() {
            if mcs.width() != width {
                return Err(McsError::WidthMismatch {
                    line: idx + 1,
                    expected: width,
                    found: mcs.width(),
                });
            }
            let members = mcs.active_reactions();
            if members.is_empty() {
                return Err(McsError::EmptyCutSet(idx + 1));
            }
            sets.push(members);
        }
        sets.sort_by_key(Vec::len);

        let mut singles: Vec<usize> = sets
            .iter()
            .take_while(|set| set.len() == 1)
            .map(|set| set[0])
            .collect();
        let first_multiple = singles.len();
        singles.sort_unstable();
        singles.dedup();
        if !singles.is_empty() {
            info!("Reducing cut sets by {} single reactions", singles.len());
        }

        // a superset of a single reaction cut set adds nothing to the table
        let reduced: Vec<Vec<usize>> = sets[first_multiple..]
            .iter()
            .filter(|set| !intersects(set, &singles))
            .map(|set| {
                set.iter()
                    .map(|r| r - singles.partition_point(|single| single < r))
                    .collect()
            })
            .collect();
        if reduced.len() + first_multiple < sets.len() {
            debug!(
                "Dropped {} cut sets containing a single reaction cut set",
                sets.len() - first_multiple - reduced.len()
            );
        }

        match counts {
            None => Ok(PofCalculator {
                reactions: width,
                cut_sets: reduced,
                single_weight: singles.len(),
                compressed_counts: None,
            }),
            Some(counts) => {
                if counts.len() != width {
                    return Err(McsError::CountMismatch {
                        expected: width,
                        found: counts.len(),
                    });
                }
                if counts.contains(&0) {
                    return Err(McsError::InvalidCount("0".to_string()));
                }
                let required: usize = counts.iter().sum();
                let reactions = match reactions {
                    Some(given) if given < required => {
                        return Err(McsError::TooFewReactions { given, required })
                    }
                    Some(given) => given,
                    None => required,
                };
                let single_weight = singles.iter().map(|&r| counts[r]).sum();
                let remaining = counts
                    .iter()
                    .enumerate()
                    .filter(|(r, _)| singles.binary_search(r).is_err())
                    .map(|(_, count)| *count)
                    .collect();
                Ok(PofCalculator {
                    reactions,
                    cut_sets: reduced,
                    single_weight,
                    compressed_counts: Some(remaining),
                })
            }
        }
    }

    /// Number of reactions of the (uncompressed) network
    pub fn reactions(&self) -> usize {
        self.reactions
    }

    /// Build the table for up to `max_d` deletions on `processes` threads
    ///
    /// A `max_d` of zero or above the number of reactions covers all reactions. Cut sets of
    /// (compressed) cardinality above `max_d` are left out.
    pub fn cd_table(&self, max_d: usize, processes: usize) -> Result<CdTable, McsError> {
        let max_d = if max_d == 0 || max_d > self.reactions {
            self.reactions
        } else {
            max_d
        };
        let mut table = CdTable::new(self.reactions, max_d);
        for plus_one in 0..self.single_weight {
            table.add(1, plus_one, 1);
        }
        let considered = self
            .cut_sets
            .iter()
            .position(|set| set.len() > max_d)
            .unwrap_or(self.cut_sets.len());
        if considered == 0 {
            info!("No cut sets of cardinality 2 to {} to combine", max_d);
            return Ok(table);
        }

        let pool = ThreadPoolBuilder::new()
            .num_threads(processes.max(1))
            .build()?;
        info!(
            "Combining {} cut sets up to cardinality {} on {} threads",
            considered,
            max_d,
            processes.max(1)
        );
        let combined = pool.install(|| {
            (0..considered)
                .into_par_iter()
                .map(|idx| {
                    let mut partial = CdTable::new(self.reactions, max_d);
                    self.combine(idx, &self.cut_sets[idx], max_d, 1, Vec::new(), &mut partial);
                    partial
                })
                .reduce(|| CdTable::new(self.reactions, max_d), CdTable::merge)
        });
        Ok(table.merge(combined))
    }

    /// Add the union `cut_set` of the cut set at `index` with others of higher index, and all
    /// its unions with cut sets of lower index, to `table`
    fn combine(
        &self,
        index: usize,
        cut_set: &[usize],
        max_d: usize,
        depth: usize,
        mut plus_one: Vec<usize>,
        table: &mut CdTable,
    ) {
        let mut to_combine = Vec::new();
        for (idx, other) in self.cut_sets[..index].iter().enumerate() {
            if intersects(other, &plus_one) {
                continue;
            }
            match extra_reactions(cut_set, other) {
                Extra::One(reaction) => {
                    if let Err(pos) = plus_one.binary_search(&reaction) {
                        plus_one.insert(pos, reaction);
                    }
                }
                Extra::Many => to_combine.push(idx),
                // covered by the union with the earlier cut set
                Extra::None => return,
            }
        }
        let plus_one_weight = self.weight(&plus_one) + self.single_weight;

        if cut_set.len() < max_d {
            for idx in to_combine {
                let other = &self.cut_sets[idx];
                if intersects(other, &plus_one) {
                    continue;
                }
                let combined = union(cut_set, other);
                if combined.len() <= max_d {
                    self.combine(idx, &combined, max_d, depth + 1, plus_one.clone(), table);
                }
            }
        }

        match &self.compressed_counts {
            None => table.add(cut_set.len(), plus_one_weight, sign(depth)),
            Some(counts) => {
                let members: Vec<usize> = cut_set.iter().map(|&r| counts[r]).collect();
                for (cardinality, count) in resolve_compressed(&members, max_d)
                    .into_iter()
                    .enumerate()
                    .filter(|(_, count)| *count != 0)
                {
                    let exponent = depth + cardinality - cut_set.len();
                    table.add(cardinality, plus_one_weight, sign(exponent) * count);
                }
            }
        }
    }

    fn weight(&self, reactions: &[usize]) -> usize {
        match &self.compressed_counts {
            None => reactions.len(),
            Some(counts) => reactions.iter().map(|&r| counts[r]).sum(),
        }
    }
}

/// Read every cut set of a binary MCS file
pub fn read_binary_mcs<P: AsRef<Path>>(path: P) -> Result<Vec<BinaryMcs>, McsError> {
    BinaryMcsReader::new(BufReader::new(File::open(path)?)).collect()
}

fn sign(depth: usize) -> i128 {
    if depth % 2 == 1 {
        1
    } else {
        -1
    }
}

/// Number of uncompressed cut sets of each cardinality up to `max_d` hitting every one of the
/// compressed reactions with the given member counts
///
/// Coefficients of `prod_i ((1 + x)^n_i - 1)`, indexed by cardinality.
fn resolve_compressed(members: &[usize], max_d: usize) -> Vec<i128> {
    let mut coefficients = vec![1i128];
    for &n in members {
        let degree = (coefficients.len() - 1 + n).min(max_d);
        let mut next = vec![0i128; degree + 1];
        for (k, coefficient) in coefficients.iter().enumerate() {
            let mut binomial = 1i128;
            for selected in 1..=n {
                binomial = binomial * (n - selected + 1) as i128 / selected as i128;
                if k + selected > degree {
                    break;
                }
                next[k + selected] += coefficient * binomial;
            }
        }
        coefficients = next;
    }
    coefficients
}

#[derive(Debug, PartialEq)]
enum Extra {
    None,
    One(usize),
    Many,
}

/// Reactions of `other` missing from `cut_set`
fn extra_reactions(cut_set: &[usize], other: &[usize]) -> Extra {
    let mut extra = other.iter().filter(|r| cut_set.binary_search(r).is_err());
    match (extra.next(), extra.next()) {
        (None, _) => Extra::None,
        (Some(reaction), None) => Extra::One(*reaction),
        _ => Extra::Many,
    }
}

fn intersects(a: &[usize], b: &[usize]) -> bool {
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => return true,
        }
    }
    false
}

fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut merged = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                merged.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                merged.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                merged.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    merged.extend_from_slice(&a[i..]);
    merged.extend_from_slice(&b[j..]);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn cut_sets(lines: &[&str]) -> Vec<BinaryMcs> {
        lines
            .iter()
            .enumerate()
            .map(|(idx, line)| BinaryMcs::parse(line, idx + 1).unwrap())
            .collect()
    }

    fn entries(table: &CdTable) -> Vec<(usize, usize, i128)> {
        table.iter().collect()
    }

    fn assert_probabilities(table: &CdTable, expected: &[f64]) {
        let found = table.probabilities_of_failure();
        assert_eq!(found.len(), expected.len());
        for ((d, probability), expected) in found.into_iter().zip(expected) {
            assert!(
                (probability - expected).abs() < 1e-12,
                "F({}) = {}, expected {}",
                d,
                probability,
                expected
            );
        }
    }

    #[test]
    fn scores() {
        // one of the 6 pairs out of 4 reactions
        assert!((failure_score(4, 0, 2, 2) - 1. / 6.).abs() < 1e-15);
        // both of two given, avoiding one other, 2 out of 5: 3 of 10 pairs
        assert!((failure_score(5, 1, 2, 2) - 0.1).abs() < 1e-15);
        assert!((failure_score(5, 0, 1, 5) - 1.).abs() < 1e-15);
        assert_eq!(failure_score(5, 0, 3, 2), 0.);
        assert_eq!(failure_score(5, 2, 1, 4), 0.);
    }

    #[test]
    fn disjoint_pairs() {
        let calculator = PofCalculator::new(&cut_sets(&["1100", "0011"])).unwrap();
        let table = calculator.cd_table(0, 1).unwrap();
        assert_eq!(table.max_d(), 4);
        assert_eq!(entries(&table), vec![(2, 0, 2), (4, 0, -1)]);
        // 2 of 6 pairs, every triple holds a pair
        assert_probabilities(&table, &[0., 1. / 3., 1., 1.]);
    }

    #[test]
    fn limited_cardinality() {
        let calculator = PofCalculator::new(&cut_sets(&["1100", "0011"])).unwrap();
        let table = calculator.cd_table(2, 1).unwrap();
        assert_eq!(entries(&table), vec![(2, 0, 2)]);
        assert_probabilities(&table, &[0., 1. / 3.]);

        let table = calculator.cd_table(1, 1).unwrap();
        assert!(entries(&table).is_empty());
        assert_probabilities(&table, &[0.]);
        assert_eq!(calculator.cd_table(9, 1).unwrap().max_d(), 4);
    }

    #[test]
    fn single_reactions_and_plus_one() {
        let mcs = cut_sets(&["10000", "01100", "01010", "00110"]);
        let calculator = PofCalculator::new(&mcs).unwrap();
        assert_eq!(calculator.reactions(), 5);
        let table = calculator.cd_table(0, 1).unwrap();
        assert_eq!(entries(&table), vec![(1, 0, 1), (2, 1, 1), (2, 2, 2)]);
        // 7 of 10 pairs hold reaction 0 or two of 1, 2, 3
        assert_probabilities(&table, &[0.2, 0.7, 1., 1., 1.]);
        assert_eq!(calculator.cd_table(0, 3).unwrap(), table);
    }

    #[test]
    fn unsorted_input() {
        let sorted = PofCalculator::new(&cut_sets(&["10000", "01100", "01010", "00110"]))
            .unwrap()
            .cd_table(0, 1)
            .unwrap();
        let unsorted = PofCalculator::new(&cut_sets(&["01100", "10000", "01010", "00110"]))
            .unwrap()
            .cd_table(0, 1)
            .unwrap();
        assert_eq!(sorted, unsorted);
    }

    #[test]
    fn only_single_reactions() {
        let table = PofCalculator::new(&cut_sets(&["100", "010"]))
            .unwrap()
            .cd_table(0, 2)
            .unwrap();
        assert_eq!(entries(&table), vec![(1, 0, 1), (1, 1, 1)]);
        assert_probabilities(&table, &[2. / 3., 1., 1.]);
    }

    #[test]
    fn supersets_add_nothing() {
        let table = PofCalculator::new(&cut_sets(&["1100", "1110"]))
            .unwrap()
            .cd_table(0, 1)
            .unwrap();
        assert_eq!(entries(&table), vec![(2, 0, 1)]);
    }

    #[test]
    fn compressed_members() {
        // compressed reaction 0 stands for a and b: cut sets {a, c} and {b, c}
        let calculator = PofCalculator::compressed(&cut_sets(&["11"]), &[2, 1], None).unwrap();
        assert_eq!(calculator.reactions(), 3);
        let table = calculator.cd_table(0, 1).unwrap();
        assert_eq!(entries(&table), vec![(2, 0, 2), (3, 0, -1)]);
        assert_probabilities(&table, &[0., 2. / 3., 1.]);

        let table = calculator.cd_table(2, 1).unwrap();
        assert_eq!(entries(&table), vec![(2, 0, 2)]);
    }

    #[test]
    fn compressed_single_reaction() {
        // cut sets {a}, {b} and {c, d}
        let calculator =
            PofCalculator::compressed(&cut_sets(&["100", "011"]), &[2, 1, 1], None).unwrap();
        let table = calculator.cd_table(0, 2).unwrap();
        assert_eq!(entries(&table), vec![(1, 0, 1), (1, 1, 1), (2, 2, 1)]);
        assert_probabilities(&table, &[0.5, 1., 1., 1.]);
    }

    #[test]
    fn compressed_resolution() {
        assert_eq!(resolve_compressed(&[2, 1], 5), vec![0, 0, 2, 1]);
        assert_eq!(resolve_compressed(&[2, 2], 5), vec![0, 0, 4, 4, 1]);
        assert_eq!(resolve_compressed(&[3], 2), vec![0, 3, 3]);
    }

    #[test]
    fn compressed_reaction_total() {
        let mcs = cut_sets(&["11"]);
        let calculator = PofCalculator::compressed(&mcs, &[2, 1], Some(10)).unwrap();
        assert_eq!(calculator.reactions(), 10);
        assert!(matches!(
            PofCalculator::compressed(&mcs, &[2, 1], Some(2)),
            Err(McsError::TooFewReactions {
                given: 2,
                required: 3
            })
        ));
        assert!(matches!(
            PofCalculator::compressed(&mcs, &[2, 1, 1], None),
            Err(McsError::CountMismatch {
                expected: 2,
                found: 3
            })
        ));
    }

    #[test]
    fn invalid_cut_sets() {
        assert!(matches!(PofCalculator::new(&[]), Err(McsError::NoCutSets)));
        assert!(matches!(
            PofCalculator::new(&cut_sets(&["110", "000"])),
            Err(McsError::EmptyCutSet(2))
        ));
        assert!(matches!(
            PofCalculator::new(&cut_sets(&["110", "0110"])),
            Err(McsError::WidthMismatch { line: 2, .. })
        ));
    }

    #[test]
    fn read_files() {
        let dir = tempfile::tempdir().unwrap();
        let mcs_path = dir.path().join("mcs.bin");
        let counts_path = dir.path().join("counts.txt");
        fs::write(&mcs_path, "100\n011\n").unwrap();
        fs::write(&counts_path, "2 1 1\n").unwrap();

        let table = PofCalculator::read_compressed(&mcs_path, &counts_path, None)
            .unwrap()
            .cd_table(0, 1)
            .unwrap();
        assert_eq!(table.reactions(), 4);
        assert_eq!(table.to_string(), "|Mj|\ta\t#\n1\t0\t1\n1\t1\t1\n2\t2\t1\n");

        let table = PofCalculator::read(&mcs_path).unwrap().cd_table(0, 1).unwrap();
        assert_probabilities(&table, &[1. / 3., 1., 1.]);
    }

    #[test]
    fn set_helpers() {
        assert_eq!(extra_reactions(&[1, 2], &[1]), Extra::None);
        assert_eq!(extra_reactions(&[1, 2], &[2, 4]), Extra::One(4));
        assert_eq!(extra_reactions(&[1, 2], &[3, 4]), Extra::Many);
        assert!(intersects(&[1, 5, 7], &[2, 7]));
        assert!(!intersects(&[1, 5], &[2, 7]));
        assert_eq!(union(&[1, 5, 7], &[2, 5]), vec![1, 2, 5, 7]);
    }
}
