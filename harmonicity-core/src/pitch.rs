//! # Pitch Detection Module
//!
//! Per-frame fundamental frequency estimation for the harmonicity series.
//!
//! ## Features
//! - YIN pitch detection restricted to a configurable `fmin..fmax` range
//! - Octave error prevention by taking the first dip close to the global minimum
//! - Noise rejection using an RMS gate and a clarity check
//! - Parabolic interpolation for sub-sample accuracy
//!
//! Frames use the same grid as [`crate::fft::Spectrogram`], so the n-th
//! pitch estimate belongs to the n-th spectrum.

use crate::config::AnalysisConfig;
use crate::fft::frame_count;
use crate::series::Fundamental;

/// Largest normalized difference accepted as a clear period.
const CLARITY_THRESHOLD: f32 = 0.1;

/// How far above the global minimum the first accepted dip may lie.
const DIP_TOLERANCE: f32 = 0.05;

/// Estimates the fundamental of one frame with the YIN algorithm.
///
/// # Arguments
/// * `signal` - One analysis frame
/// * `sample_rate` - Sample rate in Hz
/// * `amplitude_threshold` - Minimum RMS amplitude for pitch detection
/// * `fmin` - Lowest fundamental searched for, in Hz
/// * `fmax` - Highest fundamental searched for, in Hz
///
/// # Returns
/// * `Some(frequency)` - Detected frequency in Hz
/// * `None` - No pitch detected (silence, noise, or no period within `fmin..=fmax`)
pub fn detect_pitch_yin(
    signal: &[f32],
    sample_rate: u32,
    amplitude_threshold: f32,
    fmin: f32,
    fmax: f32,
) -> Option<f32> {
    let frame_size = signal.len();
    let half = frame_size / 2;
    if half < 4 || sample_rate == 0 || !(fmin > 0.0) || !(fmax > fmin) {
        return None;
    }

    // --- Noise Gate: Calculate RMS to filter out silence/noise ---
    let rms = (signal.iter().map(|&s| s * s).sum::<f32>() / frame_size as f32).sqrt();
    if rms < amplitude_threshold {
        return None;
    }

    // Lag range for the requested pitch range, leaving one lag of margin on
    // each side for interpolation.
    let tau_min = ((sample_rate as f32 / fmax).floor() as usize).max(2);
    let tau_max = ((sample_rate as f32 / fmin).ceil() as usize).min(half - 2);
    if tau_min >= tau_max {
        return None;
    }
    let tau_limit = tau_max + 1;
    let mut yin_buffer = vec![0.0; tau_limit + 1];

    // --- Difference function ---
    for tau in 1..=tau_limit {
        let mut diff = 0.0;
        for i in 0..half {
            let delta = signal[i] - signal[i + tau];
            diff += delta * delta;
        }
        yin_buffer[tau] = diff;
    }

    // --- Cumulative mean normalized difference ---
    let mut running_sum = 0.0;
    yin_buffer[0] = 1.0;
    for tau in 1..=tau_limit {
        running_sum += yin_buffer[tau];
        if running_sum != 0.0 {
            yin_buffer[tau] *= tau as f32 / running_sum;
        } else {
            yin_buffer[tau] = 1.0;
        }
    }

    // --- First dip close to the global minimum, walked down to its bottom ---
    let min_val = yin_buffer[tau_min..=tau_max]
        .iter()
        .cloned()
        .fold(f32::INFINITY, f32::min);
    let threshold = min_val + DIP_TOLERANCE;

    let mut period = (tau_min..=tau_max).find(|&tau| yin_buffer[tau] < threshold)?;
    while period < tau_max && yin_buffer[period + 1] < yin_buffer[period] {
        period += 1;
    }

    // --- Clarity Check to Reject Noise ---
    if yin_buffer[period] > CLARITY_THRESHOLD {
        return None;
    }

    // --- Parabolic interpolation for better precision ---
    let y1 = yin_buffer[period - 1];
    let y2 = yin_buffer[period];
    let y3 = yin_buffer[period + 1];

    let curvature = y1 - 2.0 * y2 + y3;
    let period_float = if curvature != 0.0 {
        let peak_shift = (y1 - y3) / (2.0 * curvature);
        period as f32 + peak_shift.clamp(-1.0, 1.0)
    } else {
        period as f32
    };

    // The lag bounds are rounded outwards, so the estimate can land just
    // past either end of the range.
    let frequency = sample_rate as f32 / period_float;
    if frequency.is_finite() && frequency >= fmin && frequency <= fmax {
        Some(frequency)
    } else {
        None
    }
}

/// Estimates the fundamental of every frame of a recording.
///
/// # Arguments
/// * `samples` - Mono audio samples
/// * `sample_rate` - Sample rate in Hz
/// * `config` - Frame grid, pitch range and amplitude gate
///
/// # Returns
/// * One [`Fundamental`] per full frame; frames without a clear period are
///   [`Fundamental::Unvoiced`]
pub fn pitch_series(samples: &[f32], sample_rate: u32, config: &AnalysisConfig) -> Vec<Fundamental> {
    let count = frame_count(samples.len(), config.frame_size, config.hop_size);
    (0..count)
        .map(|t| {
            let start = t * config.hop_size;
            let frame = &samples[start..start + config.frame_size];
            Fundamental::from_estimate(detect_pitch_yin(
                frame,
                sample_rate,
                config.amplitude_threshold,
                config.fmin,
                config.fmax,
            ))
        })
        .collect()
}
