//! Command line interface of mcstools
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::info;

use mcstools_core::analysis::consistency::ConsistencyMode;
use mcstools_core::analysis::AnalysisError;
use mcstools_core::configuration::Configuration;
use mcstools_core::io::{read_model, write_model};
use mcstools_core::mcs::compressed::count_compressed_reactions;
use mcstools_core::mcs::encode::encode_mcs_file;
use mcstools_core::mcs::pof::PofCalculator;
use mcstools_core::mcs::split::{split_by_cardinality, split_by_cardinality_accumulated};
use mcstools_core::metabolic_model::medium::read_medium;

/// Post-processing of minimal cut sets and preparation of metabolic models
#[derive(Parser, Debug)]
#[command(name = "mcstools", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode text MCS as 0/1 strings over a reaction list
    #[command(name = "mcs2binary")]
    Mcs2Binary(Mcs2BinaryArgs),
    /// Split binary MCS into one file per cardinality
    SplitBinaryMcs(SplitArgs),
    /// Split binary MCS into cumulative files, all MCS up to each cardinality
    SplitBinaryMcsAccumulated(SplitArgs),
    /// Count the reactions merged into each compressed reaction
    CountCompressed(CountCompressedArgs),
    /// Probability of failure F(d) for d random reaction deletions, from binary MCS
    Pof(PofArgs),
    /// Write the stoichiometric matrix, metabolites, reactions and reversibilities of a model
    Extract(ModelArgs),
    /// Print the medium of a model
    GetMedium(ModelArgs),
    /// Replace the medium of a model
    OverwriteMedium(OverwriteMediumArgs),
    /// Remove reactions which can't carry flux
    MakeConsistent(MakeConsistentArgs),
    /// Open every exchange which can serve as sole carbon source
    AllCarbonSources(AllCarbonSourcesArgs),
    /// Convert a model to SBML
    Convert(ConvertArgs),
}

#[derive(Args, Debug)]
struct Mcs2BinaryArgs {
    /// MCS file, one cut set of reaction ids per line
    mcs_file: PathBuf,
    /// Reaction list defining the bit positions
    reactions_file: PathBuf,
    /// Output file of binary MCS
    out_file: PathBuf,
}

#[derive(Args, Debug)]
struct SplitArgs {
    /// Binary MCS file, sorted by cardinality for the accumulated split
    binary_mcs_file: PathBuf,
    /// Prefix of the output files, the cardinality is appended
    prefix: PathBuf,
}

#[derive(Args, Debug)]
struct CountCompressedArgs {
    /// Compressed reactions, members joined with '%'
    in_file: PathBuf,
    /// Output file of counts
    out_file: PathBuf,
}

#[derive(Args, Debug)]
struct PofArgs {
    /// Binary MCS file
    binary_mcs_file: PathBuf,
    /// Member counts of the compressed reactions, for MCS of a compressed network
    #[arg(short, long)]
    compressed: Option<PathBuf>,
    /// Reactions of the uncompressed network, defaults to the sum of the member counts
    #[arg(short, long, requires = "compressed")]
    reactions: Option<usize>,
    /// Largest number of deletions, 0 for all reactions
    #[arg(short = 'd', long, default_value_t = 0)]
    max_d: usize,
    /// Number of threads
    #[arg(short, long)]
    threads: Option<usize>,
    /// Also print the inclusion-exclusion counts
    #[arg(long)]
    table: bool,
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model file (.json, .xml or .sbml)
    model: PathBuf,
}

#[derive(Args, Debug)]
struct OverwriteMediumArgs {
    /// Model file (.json, .xml or .sbml)
    model: PathBuf,
    /// JSON object mapping exchange reaction ids to import bounds
    medium: PathBuf,
}

#[derive(Args, Debug)]
struct MakeConsistentArgs {
    /// Model file (.json, .xml or .sbml)
    model: PathBuf,
    /// Remove reactions unused near the optimum instead of blocked reactions
    #[arg(long)]
    optimum: bool,
    /// Number of threads for flux variability analysis
    #[arg(short, long)]
    processes: Option<usize>,
}

#[derive(Args, Debug)]
struct AllCarbonSourcesArgs {
    /// Model file (.json, .xml or .sbml)
    model: PathBuf,
    /// Output model, defaults to {model id}_all_C_sources.xml
    out: Option<PathBuf>,
    /// Exchange of the carbon source replaced while testing
    #[arg(long, default_value = "EX_glc__D_e")]
    base: String,
    /// Import bound of each opened carbon source
    #[arg(long, default_value_t = 10.)]
    uptake: f64,
}

#[derive(Args, Debug)]
struct ConvertArgs {
    /// Model file (.json, .xml or .sbml)
    model: PathBuf,
    /// Output SBML file, defaults to the model path with a .sbml extension
    out: Option<PathBuf>,
}

impl Command {
    fn run(self) -> Result<()> {
        match self {
            Command::Mcs2Binary(args) => {
                encode_mcs_file(&args.mcs_file, &args.reactions_file, &args.out_file)
                    .with_context(|| format!("Failed to encode {}", args.mcs_file.display()))?;
            }
            Command::SplitBinaryMcs(args) => {
                split_by_cardinality(&args.binary_mcs_file, &args.prefix).with_context(|| {
                    format!("Failed to split {}", args.binary_mcs_file.display())
                })?;
            }
            Command::SplitBinaryMcsAccumulated(args) => {
                split_by_cardinality_accumulated(&args.binary_mcs_file, &args.prefix)
                    .with_context(|| {
                        format!("Failed to split {}", args.binary_mcs_file.display())
                    })?;
            }
            Command::CountCompressed(args) => {
                count_compressed_reactions(&args.in_file, &args.out_file).with_context(|| {
                    format!("Failed to count reactions of {}", args.in_file.display())
                })?;
            }
            Command::Pof(args) => pof(&args)?,
            Command::Extract(args) => extract(&args)?,
            Command::GetMedium(args) => get_medium(&args)?,
            Command::OverwriteMedium(args) => overwrite_medium(&args)?,
            Command::MakeConsistent(args) => make_consistent(&args)?,
            Command::AllCarbonSources(args) => all_carbon_sources(&args)?,
            Command::Convert(args) => convert(&args)?,
        }
        Ok(())
    }
}

fn load(path: &Path) -> Result<mcstools_core::metabolic_model::model::Model> {
    read_model(path).with_context(|| format!("Failed to read model {}", path.display()))
}

/// Model path without its extension, used to name outputs and in reports
fn model_name(path: &Path) -> PathBuf {
    path.with_extension("")
}

/// `{dir}/{prefix}{file name}` for an input `{dir}/{file name}`
fn prefixed_sibling(path: &Path, prefix: &str) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .with_context(|| format!("{} is not a file path", path.display()))?;
    let mut name = OsString::from(prefix);
    name.push(file_name);
    Ok(path.with_file_name(name))
}

fn pof(args: &PofArgs) -> Result<()> {
    let calculator = match &args.compressed {
        Some(counts) => {
            PofCalculator::read_compressed(&args.binary_mcs_file, counts, args.reactions)
        }
        None => PofCalculator::read(&args.binary_mcs_file),
    }
    .with_context(|| format!("Failed to read {}", args.binary_mcs_file.display()))?;

    let threads = args
        .threads
        .unwrap_or_else(|| Configuration::current().processes);
    let table = calculator
        .cd_table(args.max_d, threads)
        .context("Failed to combine cut sets")?;
    for (d, probability) in table.probabilities_of_failure() {
        println!("d={}\t{:.18}", d, probability);
    }
    if args.table {
        print!("{}", table);
    }
    Ok(())
}

fn extract(args: &ModelArgs) -> Result<()> {
    let model = load(&args.model)?;
    let paths = model
        .write_flat_files(model_name(&args.model))
        .context("Failed to write stoichiometric files")?;
    for path in paths {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn get_medium(args: &ModelArgs) -> Result<()> {
    let model = load(&args.model)?;
    let name = model_name(&args.model);
    for (reaction, bound) in model.medium() {
        println!("{} {} {}", name.display(), reaction, bound);
    }
    println!();
    Ok(())
}

fn overwrite_medium(args: &OverwriteMediumArgs) -> Result<()> {
    let mut model = load(&args.model)?;
    let medium = read_medium(&args.medium)
        .with_context(|| format!("Failed to read medium {}", args.medium.display()))?;
    model.set_medium(&medium).context("Failed to apply medium")?;

    let out = prefixed_sibling(&args.model, "minimal_medium_")?;
    write_model(&model, &out).with_context(|| format!("Failed to write {}", out.display()))?;

    let tolerance = Configuration::current().tolerance;
    let viability = if model.is_viable(tolerance)? {
        "still viable"
    } else {
        "no longer viable"
    };
    println!(
        "overwritten medium for {} - {}",
        model_name(&args.model).display(),
        viability
    );
    Ok(())
}

fn make_consistent(args: &MakeConsistentArgs) -> Result<()> {
    let mut model = load(&args.model)?;
    let mode = if args.optimum {
        ConsistencyMode::Optimum {
            processes: args
                .processes
                .unwrap_or_else(|| Configuration::current().processes),
        }
    } else {
        ConsistencyMode::Blocked
    };

    let summary = match model.make_consistent(mode) {
        Err(err @ AnalysisError::ObjectiveDrift { .. }) => {
            return Err(err).with_context(|| {
                format!(
                    "{}: difference in FBA objective is too large",
                    args.model.display()
                )
            })
        }
        result => result.context("Failed to make model consistent")?,
    };

    let out = prefixed_sibling(&args.model, "consistent_")?;
    write_model(&model, &out).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("{}:\n{}\n", model_name(&args.model).display(), summary);
    Ok(())
}

fn all_carbon_sources(args: &AllCarbonSourcesArgs) -> Result<()> {
    let mut model = load(&args.model)?;
    let sources = model
        .all_carbon_sources(&args.base, args.uptake)
        .context("Failed to test carbon sources")?;

    let out = match &args.out {
        Some(out) => out.clone(),
        None => PathBuf::from(format!("{}_all_C_sources.xml", model.id_or("model"))),
    };
    write_model(&model, &out).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("{}: {} C-sources", model.id_or("model"), sources.len());
    Ok(())
}

fn convert(args: &ConvertArgs) -> Result<()> {
    let model = load(&args.model)?;
    let out = match &args.out {
        Some(out) => out.clone(),
        None => args.model.with_extension("sbml"),
    };
    model
        .write_sbml(&out)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    info!("Wrote {}", out.display());
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    match cli.command.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("ERROR: {:#}", err);
            ExitCode::FAILURE
        }
    }
}
