#![warn(missing_docs)]
//! Cadence CLI Library
//!
//! CLI infrastructure for suite binaries. Build a [`Suite`] and hand it to
//! [`run`] from your binary's main function to get the full Cadence CLI
//! experience: selection flags, `cadence.toml` layering, a live progress
//! bar and report output.
//!
//! # Example
//!
//! ```ignore
//! use cadence::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let gen = Gen::new(|size| vec![0u8; size as usize]);
//!     let mut builder = Suite::builder();
//!     builder.group("Checksum", |g| {
//!         g.measure("crc32", &gen, |data: &Vec<u8>| {
//!             let _ = checksum(data);
//!         });
//!     });
//!     cadence::run(&builder.build()?)
//! }
//! ```

mod config;
mod observer;
mod select;

pub use config::{CadenceConfig, OutputConfig, RunnerConfig};
pub use select::parse_pattern;

use cadence_core::{RunConfig, Suite};
use cadence_engine::{RunController, RunStatus, build_plan};
use cadence_report::{OutputFormat, build_report, format_human_output, generate_csv_report,
    generate_json_report};
use clap::{Parser, Subcommand};
use observer::CliObserver;
use std::io::Write;
use std::path::PathBuf;

/// Cadence CLI arguments
#[derive(Parser, Debug)]
#[command(name = "cadence")]
#[command(author, version, about = "Cadence - hierarchical measurement harness")]
pub struct Cli {
    /// Optional subcommand (List, Run); defaults to Run
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Structural selection pattern, repeatable.
    /// Segments separated by '/': '*' matches any name, '{a,b}' matches a
    /// set, anything else matches exactly. Example: 'Encoding/*/pack'
    #[arg(long)]
    pub select: Vec<String>,

    /// Filter leaves by regex over slash-joined paths
    #[arg(long)]
    pub filter: Option<String>,

    /// Candidate data sizes, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub sizes: Option<Vec<u64>>,

    /// Synthetic data units generated per size
    #[arg(long)]
    pub units: Option<u32>,

    /// Target invocations per series
    #[arg(long)]
    pub series_size: Option<u32>,

    /// Timed series per leaf per size
    #[arg(long)]
    pub series_count: Option<u32>,

    /// Settle delay between series, in milliseconds
    #[arg(long)]
    pub delay: Option<u64>,

    /// Issue a GC hint before each series
    #[arg(long, action = clap::ArgAction::Set)]
    pub force_gc: Option<bool>,

    /// Memory-sampling passes per leaf per size (omit to skip memory)
    #[arg(long)]
    pub memory: Option<u32>,

    /// Output format: json, csv, human
    #[arg(long)]
    pub format: Option<String>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Dry run - list units without executing
    #[arg(long)]
    pub dry_run: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Internal: Absorb cargo bench's --bench flag
    #[arg(long, hide = true)]
    pub bench: bool,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List all registered units
    List,
    /// Run the suite (default)
    Run,
}

/// Run the Cadence CLI against a suite. This is the main entry point for
/// suite binaries.
pub fn run(suite: &Suite) -> anyhow::Result<()> {
    let cli = Cli::parse();
    run_with_cli(suite, cli)
}

/// Run the Cadence CLI with pre-parsed arguments.
pub fn run_with_cli(suite: &Suite, cli: Cli) -> anyhow::Result<()> {
    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("cadence=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("cadence=info")
            .init();
    }

    // Discover cadence.toml configuration (CLI flags override)
    let file_config = CadenceConfig::discover().unwrap_or_default();

    match cli.command {
        Some(Commands::List) => list_units(suite),
        Some(Commands::Run) => run_suite(suite, &cli, &file_config),
        None => {
            if cli.dry_run {
                list_units(suite)
            } else {
                run_suite(suite, &cli, &file_config)
            }
        }
    }
}

fn list_units(suite: &Suite) -> anyhow::Result<()> {
    println!("Cadence Plan:");

    let mut current_owner: Option<String> = None;
    let mut total = 0;
    for path in select::leaf_paths(suite) {
        let owner = if path.len() > 1 {
            path[..path.len() - 1].join("/")
        } else {
            path[0].clone()
        };
        if current_owner.as_deref() != Some(owner.as_str()) {
            println!("├── group: {}", owner);
            current_owner = Some(owner);
        }
        println!("│   ├── {}", path.join("/"));
        total += 1;
    }

    println!("{} units found.", total);
    Ok(())
}

fn run_suite(suite: &Suite, cli: &Cli, file_config: &CadenceConfig) -> anyhow::Result<()> {
    let format: OutputFormat = cli
        .format
        .as_deref()
        .unwrap_or(&file_config.output.format)
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let selected_paths = select::build_selected_paths(suite, &cli.select, cli.filter.as_deref())?;
    if let Some(patterns) = &selected_paths {
        if patterns.is_empty() {
            println!("No units selected.");
            return Ok(());
        }
    }

    let defaults = file_config.defaults();
    let run_config = RunConfig {
        selected_paths,
        data_unit_sizes: cli.sizes.clone(),
        data_units_count: cli.units,
        series_size: cli.series_size,
        series_count: cli.series_count,
        delay: cli.delay,
        force_gc: cli.force_gc,
        memory_measurements_count: cli.memory.or(file_config.runner.memory_measurements_count),
    };

    let resolved = run_config.resolve(&defaults);
    let plan = build_plan(suite.root(), &resolved);
    if plan.groups.is_empty() {
        println!("No units selected.");
        return Ok(());
    }
    println!(
        "Running {} units over {} data sizes...\n",
        plan.leaf_count(),
        resolved.data_unit_sizes.len()
    );

    let controller = RunController::new(suite).defaults(defaults);
    let mut observer = CliObserver::new();
    let summary = controller.start(&run_config, &mut observer);
    observer.finish();

    let report = build_report(&observer.events(), &summary, &resolved);
    let output = match format {
        OutputFormat::Json => generate_json_report(&report)?,
        OutputFormat::Csv => generate_csv_report(&report),
        OutputFormat::Human => format_human_output(&report),
    };

    if let Some(ref path) = cli.output {
        let mut file = std::fs::File::create(path)?;
        file.write_all(output.as_bytes())?;
        println!("Report written to: {}", path.display());
    } else {
        print!("{}", output);
    }

    if summary.status == RunStatus::Failed {
        if let Some(error) = &summary.error {
            eprintln!("\nRun failed: {}", error);
        }
        std::process::exit(1);
    }

    Ok(())
}
