//! crestmap - anchor-term corpus scanner.
//!
//! Usage:
//!   crestmap scan               Scan the corpus and write reports
//!   crestmap scan --csv-only    Write only the raw CSV
//!   crestmap validate           Check the config and exit
//!   crestmap --help             Show help

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use crestmap_analyze::Aggregator;
use crestmap_core::{ScanConfig, reports};
use crestmap_scan::{FileWalker, ScanEngine, ScanProgress};

#[derive(Parser)]
#[command(
    name = "crestmap",
    version,
    about = "Anchor-term corpus scanner with tiered word maps",
    long_about = "crestmap scans configured source-tree roots for anchor terms, \
                  buckets each file via hint patterns, and ranks terms into \
                  Crest/Slopes/Base tiers.\n\n\
                  Run `crestmap scan` against a YAML config to produce the \
                  word-map table, raw CSV and summary reports."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan the corpus and write reports
    Scan {
        /// Config file
        #[arg(short, long, default_value = "config/crestmap.yaml")]
        config: PathBuf,

        /// Report output directory
        #[arg(short, long, default_value = "docs")]
        out_dir: PathBuf,

        /// Worker threads (0 = auto-detect)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Scan only the first N discovered files (0 = all)
        #[arg(long, default_value = "0")]
        sample: usize,

        /// Write only the raw CSV report
        #[arg(long)]
        csv_only: bool,

        /// Output format; json prints the word map to stdout instead of
        /// writing report files
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Suppress the progress line
        #[arg(long)]
        no_progress: bool,
    },

    /// Load and validate a config, then exit
    Validate {
        /// Config file
        #[arg(short, long, default_value = "config/crestmap.yaml")]
        config: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Scan {
            config,
            out_dir,
            threads,
            sample,
            csv_only,
            format,
            no_progress,
        } => run_scan(
            &config,
            out_dir,
            threads,
            sample,
            csv_only,
            format,
            no_progress,
        ),
        Command::Validate { config } => run_validate(&config),
    }
}

/// Run a full scan: discover, scan, aggregate, report.
fn run_scan(
    config_path: &PathBuf,
    out_dir: PathBuf,
    threads: Option<usize>,
    sample: usize,
    csv_only: bool,
    format: OutputFormat,
    no_progress: bool,
) -> Result<()> {
    let mut config = ScanConfig::from_yaml_file(config_path)
        .wrap_err_with(|| format!("loading config {}", config_path.display()))?;
    config.output_dir = Some(out_dir.clone());
    if let Some(threads) = threads {
        config.threads = threads;
    }

    eprintln!(
        "Discovering files under {} include root(s)...",
        config.include_roots.len()
    );
    let walk = FileWalker::new(&config).discover();
    let mut files = walk.files;
    if sample > 0 && files.len() > sample {
        files.truncate(sample);
    }
    eprintln!("Files to scan: {}", files.len());

    let engine = ScanEngine::new();
    let cancel = CancellationToken::new();
    let progress =
        (!no_progress && !files.is_empty()).then(|| spawn_progress_printer(engine.subscribe()));

    let outcome = engine.scan(&config, files, &cancel)?;
    drop(engine);
    if let Some(handle) = progress {
        let _ = handle.join();
    }

    let warning_count = walk.warnings.len() + outcome.warnings.len();
    if warning_count > 0 {
        eprintln!("{warning_count} warning(s) during scan");
    }

    let map = Aggregator::from_config(&config).aggregate(outcome.records);
    if map.is_empty() {
        println!("No anchor term matches found.");
        return Ok(());
    }

    match format {
        OutputFormat::Text => {
            let written = if csv_only {
                std::fs::create_dir_all(&out_dir)?;
                let csv = out_dir.join(reports::RAW_CSV_FILE);
                crestmap_report::write_raw_csv_file(&csv, &map.records)?;
                vec![csv]
            } else {
                crestmap_report::write_all(&out_dir, &map)?
            };

            println!(
                "{} hits across {} term(s) in {} file(s)",
                map.records.len(),
                map.tiers.len(),
                outcome.files_scanned
            );
            for path in written {
                println!("Wrote {}", path.display());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&map)?);
        }
    }

    Ok(())
}

/// Load and validate a config, reporting what it resolved to.
fn run_validate(config_path: &PathBuf) -> Result<()> {
    let config = ScanConfig::from_yaml_file(config_path)
        .wrap_err_with(|| format!("loading config {}", config_path.display()))?;

    println!(
        "Config OK: {} root(s), {} extension(s), {} anchor term(s)",
        config.include_roots.len(),
        config.extensions.len(),
        config.anchor_terms.len()
    );
    Ok(())
}

/// Render a single progress line from the engine's broadcast channel.
fn spawn_progress_printer(
    mut rx: broadcast::Receiver<ScanProgress>,
) -> std::thread::JoinHandle<()> {
    std::thread::spawn(move || {
        loop {
            match rx.blocking_recv() {
                Ok(progress) => {
                    eprint!(
                        "\rScanning {}/{} ({:.0}%)   ",
                        progress.files_processed,
                        progress.total_files,
                        progress.percent()
                    );
                    if progress.is_complete() {
                        break;
                    }
                }
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
        eprintln!();
    })
}
