//! # Analysis Module
//!
//! Runs the full pipeline for one recording: decode, pitch tracking,
//! short-time spectrum and the harmonicity series.

use std::path::Path;

use log::{debug, info};

use crate::audio::load_recording;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::fft::Spectrogram;
use crate::pitch::pitch_series;
use crate::series::{Fundamental, HarmonicitySeries, build_indexed_series_with};
use crate::threshold::ThresholdCache;
use crate::tuning::{cents_between, find_nearest_note};

/// Computes the harmonicity series of a decoded mono signal.
///
/// # Arguments
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Analysis settings
///
/// # Returns
/// * `Ok(series)` - One point per voiced frame with energy in the measured band
/// * `Err(e)` - Invalid settings, or the signal is shorter than one frame
pub fn analyze_samples(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Result<HarmonicitySeries> {
    analyze_samples_with(samples, sample_rate, config, &mut ThresholdCache::new())
}

/// [`analyze_samples`] with a caller-owned window cache, reused across
/// recordings analyzed with the same settings.
pub fn analyze_samples_with(
    samples: &[f32],
    sample_rate: u32,
    config: &AnalysisConfig,
    cache: &mut ThresholdCache,
) -> Result<HarmonicitySeries> {
    config.validate()?;
    if sample_rate == 0 {
        return Err(AnalysisError::InvalidParameter("sample rate must be positive".to_string()));
    }

    let spectrogram = Spectrogram::compute(
        samples,
        sample_rate,
        config.frame_size,
        config.hop_size,
        config.top_db,
    )?;
    let f0_series = pitch_series(samples, sample_rate, config);

    let voiced: Vec<f32> = f0_series.iter().filter_map(Fundamental::hz).collect();
    if voiced.is_empty() {
        debug!("[ANALYSIS] No voiced frames in {} frames", f0_series.len());
    } else {
        let mean_f0 = voiced.iter().sum::<f32>() / voiced.len() as f32;
        let (note, note_freq) = find_nearest_note(mean_f0);
        debug!(
            "[ANALYSIS] {} of {} frames voiced, mean f0 {:.1} Hz ({} {:+.0} cents)",
            voiced.len(),
            f0_series.len(),
            mean_f0,
            note,
            cents_between(mean_f0, note_freq)
        );
    }

    let indexed = build_indexed_series_with(
        &f0_series,
        &spectrogram.frequencies,
        &spectrogram.frames,
        config.cents,
        config.policy,
        cache,
    );

    Ok(HarmonicitySeries::from_indexed(
        spectrogram.len(),
        config.seconds_per_frame(sample_rate),
        indexed,
    ))
}

/// Loads a WAV file and computes its harmonicity series.
pub fn analyze_recording<P: AsRef<Path>>(path: P, config: &AnalysisConfig) -> Result<HarmonicitySeries> {
    analyze_recording_with(path, config, &mut ThresholdCache::new())
}

/// [`analyze_recording`] with a caller-owned window cache.
pub fn analyze_recording_with<P: AsRef<Path>>(
    path: P,
    config: &AnalysisConfig,
    cache: &mut ThresholdCache,
) -> Result<HarmonicitySeries> {
    let path = path.as_ref();
    let recording = load_recording(path)?;
    let series = analyze_samples_with(&recording.samples, recording.sample_rate, config, cache)?;

    info!(
        "[ANALYSIS] {}: {:.2}s, {} of {} frames measured, mean {}",
        path.display(),
        recording.duration(),
        series.len(),
        series.frame_count,
        series
            .mean()
            .map(|m| format!("{m:.3}"))
            .unwrap_or_else(|| "n/a".to_string())
    );
    Ok(series)
}
