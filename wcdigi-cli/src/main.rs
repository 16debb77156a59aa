//! wcdigi command-line interface.
//!
//! Extracts per-event digitized-hit tables from simulation event stores.
#![allow(clippy::uninlined_format_args, clippy::cast_precision_loss)]

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use wcdigi_core::{RunStatistics, Subsystem};
use wcdigi_io::{inspect_event_store, merge_outputs, process_file, StoreConfig, StoreInfo};

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    WcdigiIo(#[from] wcdigi_io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Digitized-hit extraction for hybrid water-Cherenkov simulations.
#[derive(Parser, Debug)]
#[command(name = "wcdigi")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// JSON store configuration (table and branch names, output options)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Extract hit tables from a simulation event store
    Process {
        /// Input event store
        #[arg(default_value = "wcsim.h5")]
        input: PathBuf,

        /// Output file path
        #[arg(default_value = "Hits.h5")]
        output: PathBuf,
    },
    /// Show information about an event store
    Info {
        /// Input event store
        #[arg(default_value = "wcsim.h5")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Concatenate output files
    Merge {
        /// Output files to merge, in order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Merged output file path
        #[arg(short, long)]
        output: PathBuf,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Commands::Process {
            input: PathBuf::from("wcsim.h5"),
            output: PathBuf::from("Hits.h5"),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => StoreConfig::from_file(path)?,
        None => StoreConfig::default(),
    };

    match cli.command.unwrap_or_default() {
        Commands::Process { input, output } => {
            let start = Instant::now();
            let stats = process_file(&input, &output, &config)?;
            print_statistics(&output, &stats, start.elapsed().as_secs_f64());
        }
        Commands::Info { input, json } => {
            let info = inspect_event_store(&input, &config.input)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                print_info(&input, &info);
            }
        }
        Commands::Merge { inputs, output } => {
            let start = Instant::now();
            let stats = merge_outputs(inputs.as_slice(), &output, &config.output)?;
            println!("Merged {} files", inputs.len());
            print_statistics(&output, &stats, start.elapsed().as_secs_f64());
        }
    }

    Ok(())
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn print_statistics(output: &Path, stats: &RunStatistics, seconds: f64) {
    println!(
        "Processed {} events in {:.2}s",
        stats.n_events, seconds
    );
    for subsystem in Subsystem::ALL {
        println!(
            "Tree_{} hits: {}",
            subsystem.suffix(),
            stats.hits(subsystem)
        );
    }
    println!("Output: {}", output.display());
}

fn print_info(input: &Path, info: &StoreInfo) {
    println!("File: {}", input.display());
    println!("Events: {}", info.n_events);
    println!("Geometry records: {}", info.n_geometry_records);
    println!("PMTs (ID/OD): {} / {}", info.num_pmt_inner, info.num_pmt_outer);
    println!(
        "ID triggers: {}, digi hits: {}",
        info.inner.n_triggers, info.inner.n_digi_hits
    );
    println!(
        "OD triggers: {}, digi hits: {}",
        info.outer.n_triggers, info.outer.n_digi_hits
    );
    if info.n_events > 0 {
        let hits = info.inner.n_digi_hits + info.outer.n_digi_hits;
        println!("Mean digi hits per event: {:.1}", hits as f64 / info.n_events as f64);
    }
}
