//! gff-window: sliding-window and locus scoring of GFF records.
//!
//! Usage: gff-window [OPTIONS] <INPUT>

use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::process;

use gff_window::commands::{ScoreCommand, ScoreStats};
use gff_window::config::{ScoreConfig, DEFAULT_STEP, DEFAULT_TAG, DEFAULT_WIDTH};
use gff_window::genome::{GenomeTable, ReferenceGenome};
use gff_window::gff::GffError;
use gff_window::scoring::Scheme;

#[derive(Parser)]
#[command(name = "gff-window")]
#[command(version)]
#[command(about = "Score GFF records over sliding windows or annotation loci", long_about = None)]
struct Cli {
    /// Input GFF file
    input: PathBuf,

    /// Window width
    #[arg(short = 'w', long, default_value_t = DEFAULT_WIDTH)]
    width: u64,

    /// Step between window starts
    #[arg(short = 's', long, default_value_t = DEFAULT_STEP)]
    step: u64,

    /// Scoring scheme: meth, average, sum or seq
    #[arg(short = 'm', long = "scoring", default_value = "meth")]
    scheme: Scheme,

    /// Sum scoring: report the record count as the score and the sum as n
    #[arg(short = 'r', long)]
    reverse: bool,

    /// Annotation GFF file; score one window per locus
    #[arg(short = 'g', long)]
    annotation: Option<PathBuf>,

    /// Attribute tag holding the locus id of annotation records
    #[arg(short = 'k', long, default_value = DEFAULT_TAG)]
    tag: String,

    /// Fold this annotation feature onto its parent locus (e.g. exon)
    #[arg(short = 't', long, requires = "annotation")]
    merge: Option<String>,

    /// Output feature column (default: w<width>, or locus with --annotation)
    #[arg(short = 'f', long)]
    feature: Option<String>,

    /// Do not sort; re-scan the input for every window (input must be sorted)
    #[arg(short = 'n', long = "no-sort", visible_alias = "assume-sorted")]
    no_sort: bool,

    /// Also report windows without data
    #[arg(short = 'z', long)]
    no_skip: bool,

    /// Bound windows by the sequence lengths of a built-in genome
    #[arg(short = 'a', long)]
    absolute: Option<ReferenceGenome>,

    /// Bound windows by the sequence lengths in a file
    #[arg(long, conflicts_with = "absolute")]
    genome_file: Option<PathBuf>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(stats) => info!(
            "{} sequences, {} windows, {} empty, {} lines written",
            stats.sequences, stats.windows, stats.empty, stats.lines
        ),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Warn by default; `-v` raises the level and `RUST_LOG` overrides it.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);
    if let Ok(filters) = std::env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }
    builder.init();
}

fn run(cli: Cli) -> Result<ScoreStats, GffError> {
    let mut config = ScoreConfig::new()
        .with_width(cli.width)
        .with_step(cli.step)
        .with_scheme(cli.scheme)
        .with_reverse(cli.reverse)
        .with_tag(cli.tag)
        .with_sort(!cli.no_sort)
        .with_no_skip(cli.no_skip);

    if let Some(path) = cli.annotation {
        config = config.with_annotation(path);
    }
    if let Some(feature) = cli.merge {
        config = config.with_merge(feature);
    }
    if let Some(label) = cli.feature {
        config = config.with_feature(label);
    }

    let lengths = match (cli.genome_file, cli.absolute) {
        (Some(path), _) => Some(GenomeTable::from_file(path)?),
        (None, Some(genome)) => Some(genome.table()),
        (None, None) => None,
    };
    if let Some(lengths) = lengths {
        info!(
            "sequence lengths: {} ({} sequences)",
            lengths.organism().unwrap_or("custom"),
            lengths.len()
        );
        config = config.with_lengths(lengths);
    }

    let cmd = ScoreCommand::new(config)?;

    match cli.output {
        Some(path) => {
            let file = File::create(&path).map_err(|source| GffError::File {
                path: path.clone(),
                source,
            })?;
            cmd.run(&cli.input, file)
        }
        None => {
            let stdout = io::stdout();
            let handle = stdout.lock();
            cmd.run(&cli.input, handle)
        }
    }
}
