//! # Harmonicity - Command-line front end
//!
//! Measures the harmonicity series of one or more WAV recordings and prints
//! the result as JSON, keyed by recording id.
//!
//! ## Architecture
//! - **Discovery**: files and directories given on the command line are
//!   expanded into a list of `.wav` files
//! - **Configuration**: defaults, then an optional JSON config file, then
//!   command-line overrides
//! - **Analysis**: `harmonicity_core::run_batch` on a pool of worker threads
//! - **Output**: JSON mapping on stdout, progress and failures on stderr

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use log::{LevelFilter, debug, error, info, warn};
use walkdir::WalkDir;

use harmonicity_core::{AnalysisConfig, BatchReport, TotalEnergyPolicy, run_batch, tuning};

#[derive(Parser, Debug)]
#[command(name = "harmonicity", version, about = "Per-frame harmonic energy ratio of recorded tones")]
struct Cli {
    /// WAV files or directories containing WAV files
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// Descend into subdirectories when scanning directories
    #[arg(short, long)]
    recursive: bool,

    /// JSON file with analysis settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective settings to this JSON file
    #[arg(long)]
    write_config: Option<PathBuf>,

    /// Half-width of each partial window in cents
    #[arg(long)]
    cents: Option<f32>,

    /// Which bins count toward a frame's total energy
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    /// Lowest fundamental, as a note name ("G3") or in Hz
    #[arg(long)]
    fmin: Option<String>,

    /// Highest fundamental, as a note name ("E7") or in Hz
    #[arg(long)]
    fmax: Option<String>,

    /// Samples per analysis frame
    #[arg(long)]
    frame_size: Option<usize>,

    /// Samples between frame starts
    #[arg(long)]
    hop_size: Option<usize>,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Print only the measure values instead of full series points
    #[arg(long)]
    values_only: bool,

    /// Pretty-print the JSON output
    #[arg(long)]
    pretty: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Every bin of the frame
    Full,
    /// Bins from the fundamental's window upward
    AboveFundamental,
}

impl From<PolicyArg> for TotalEnergyPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Full => TotalEnergyPolicy::FullSpectrum,
            PolicyArg::AboveFundamental => TotalEnergyPolicy::AboveFundamental,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let default_level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();

    if let Err(e) = run(cli) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = build_config(&cli)?;

    if let Some(path) = &cli.write_config {
        config
            .save(path)
            .with_context(|| format!("writing config to {}", path.display()))?;
        info!("[MAIN] Settings written to {}", path.display());
    }

    let files = discover_files(&cli.paths, cli.recursive)?;
    if files.is_empty() {
        bail!("no .wav files found");
    }
    debug!("[MAIN] Found {} recording(s)", files.len());

    let workers = cli.workers.unwrap_or_else(|| {
        std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
    });
    let report = run_batch(&files, &config, workers)?;

    print_report(&report, cli.values_only, cli.pretty)?;

    if report.series.is_empty() {
        bail!("none of the {} recording(s) could be analyzed", files.len());
    }
    Ok(())
}

/// Defaults, then the config file, then command-line overrides.
fn build_config(cli: &Cli) -> Result<AnalysisConfig> {
    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => AnalysisConfig::default(),
    };

    if let Some(cents) = cli.cents {
        config.cents = cents;
    }
    if let Some(policy) = cli.policy {
        config.policy = policy.into();
    }
    if let Some(fmin) = &cli.fmin {
        config.fmin = tuning::parse_frequency(fmin).context("parsing --fmin")?;
    }
    if let Some(fmax) = &cli.fmax {
        config.fmax = tuning::parse_frequency(fmax).context("parsing --fmax")?;
    }
    if let Some(frame_size) = cli.frame_size {
        config.frame_size = frame_size;
    }
    if let Some(hop_size) = cli.hop_size {
        config.hop_size = hop_size;
    }

    config.validate().context("invalid analysis settings")?;
    Ok(config)
}

/// Expands the command-line paths into a sorted list of `.wav` files.
fn discover_files(paths: &[PathBuf], recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for path in paths {
        if path.is_dir() {
            scan_dir(path, recursive, &mut files)?;
        } else {
            // Explicit files are passed through; unreadable ones become batch failures.
            files.push(path.clone());
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

/// Collects the `.wav` files under `dir`. Symlinks are not followed, so a
/// link back to an ancestor cannot make the walk loop.
fn scan_dir(dir: &Path, recursive: bool, files: &mut Vec<PathBuf>) -> Result<()> {
    let max_depth = if recursive { usize::MAX } else { 1 };
    let walker = WalkDir::new(dir).follow_links(false).max_depth(max_depth);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            // The root itself must be readable; deeper failures are skipped.
            Err(e) if e.depth() == 0 => {
                return Err(e).with_context(|| format!("reading directory {}", dir.display()));
            }
            Err(e) => {
                warn!("[MAIN] Skipping unreadable entry: {e}");
                continue;
            }
        };
        if entry.file_type().is_file() && is_wav(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(())
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"))
}

fn print_report(report: &BatchReport, values_only: bool, pretty: bool) -> Result<()> {
    let json = if values_only {
        let values: BTreeMap<&str, Vec<f32>> = report
            .series
            .iter()
            .map(|(id, series)| (id.as_str(), series.values()))
            .collect();
        to_json(&values, pretty)?
    } else {
        to_json(&report.series, pretty)?
    };

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}
