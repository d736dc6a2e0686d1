//! # Batch Module
//!
//! Analyzes many recordings on a pool of worker threads.
//!
//! Recordings are handed to the workers through a job channel and results
//! come back on a second channel. A recording that fails to decode or
//! analyze is reported as a failure and leaves no entry in the result map;
//! the remaining recordings are unaffected.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::thread;

use crossbeam_channel::unbounded;
use log::{info, warn};
use serde::Serialize;

use crate::analysis::analyze_recording_with;
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::series::HarmonicitySeries;
use crate::threshold::ThresholdCache;

/// A recording that could not be analyzed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
    pub id: String,
    pub path: PathBuf,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Series of every successful recording, keyed by recording id.
    pub series: BTreeMap<String, HarmonicitySeries>,
    /// Recordings that failed, in completion order.
    pub failures: Vec<BatchFailure>,
}

/// Derives one id per path: the file stem, or the full path when two
/// files share a stem.
pub fn recording_ids(paths: &[PathBuf]) -> Vec<String> {
    let stem = |path: &Path| {
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string())
    };

    let mut counts: HashMap<String, usize> = HashMap::new();
    for path in paths {
        *counts.entry(stem(path)).or_default() += 1;
    }

    paths
        .iter()
        .map(|path| {
            let id = stem(path);
            if counts[&id] > 1 { path.display().to_string() } else { id }
        })
        .collect()
}

/// Analyzes every recording in `paths` with `workers` threads.
///
/// # Arguments
/// * `paths` - WAV files to analyze
/// * `config` - Analysis settings shared by every recording
/// * `workers` - Number of worker threads (at least one is used)
///
/// # Returns
/// * `Err(e)` - Only when `config` is invalid; per-recording errors are
///   collected in [`BatchReport::failures`]
pub fn run_batch(paths: &[PathBuf], config: &AnalysisConfig, workers: usize) -> Result<BatchReport> {
    config.validate()?;

    let (job_tx, job_rx) = unbounded::<(String, PathBuf)>();
    let (result_tx, result_rx) = unbounded::<(String, PathBuf, Result<HarmonicitySeries>)>();

    for job in recording_ids(paths).into_iter().zip(paths.iter().cloned()) {
        // The receiver is alive until the workers exit.
        let _ = job_tx.send(job);
    }
    drop(job_tx);

    let workers = workers.max(1).min(paths.len().max(1));
    info!("[BATCH] Analyzing {} recording(s) on {} worker(s)", paths.len(), workers);

    let mut report = BatchReport::default();
    thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                // One cache per worker, shared by all of its recordings.
                let mut cache = ThresholdCache::new();
                for (id, path) in job_rx.iter() {
                    let result = analyze_recording_with(&path, config, &mut cache);
                    if result_tx.send((id, path, result)).is_err() {
                        break;
                    }
                }
            });
        }
        drop(result_tx);

        for (id, path, result) in result_rx.iter() {
            match result {
                Ok(series) => {
                    report.series.insert(id, series);
                }
                Err(e) => {
                    warn!("[BATCH] Skipping {}: {}", path.display(), e);
                    report.failures.push(BatchFailure {
                        id,
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }
    });

    info!(
        "[BATCH] Finished: {} succeeded, {} failed",
        report.series.len(),
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_use_file_stems() {
        let paths = vec![PathBuf::from("a/violin_g.wav"), PathBuf::from("b/violin_a.wav")];
        assert_eq!(recording_ids(&paths), vec!["violin_g", "violin_a"]);
    }

    #[test]
    fn test_duplicate_stems_use_full_paths() {
        let paths = vec![
            PathBuf::from("take1/open.wav"),
            PathBuf::from("take2/open.wav"),
            PathBuf::from("take2/stopped.wav"),
        ];
        let ids = recording_ids(&paths);
        assert_eq!(ids[0], PathBuf::from("take1/open.wav").display().to_string());
        assert_eq!(ids[1], PathBuf::from("take2/open.wav").display().to_string());
        assert_eq!(ids[2], "stopped");
    }

    #[test]
    fn test_missing_files_are_failures() {
        let paths = vec![
            PathBuf::from("/nonexistent/one.wav"),
            PathBuf::from("/nonexistent/two.wav"),
        ];
        let report = run_batch(&paths, &AnalysisConfig::default(), 4).unwrap();
        assert!(report.series.is_empty());
        assert_eq!(report.failures.len(), 2);
    }

    #[test]
    fn test_empty_batch() {
        let report = run_batch(&[], &AnalysisConfig::default(), 0).unwrap();
        assert!(report.series.is_empty());
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig { fmin: 0.0, ..Default::default() };
        assert!(run_batch(&[], &config, 1).is_err());
    }
}
