//! # Short-Time Spectrum Module
//!
//! Computes the per-frame log-magnitude spectra that the harmonicity measure
//! integrates over.
//!
//! ## Features
//! - Frames of `frame_size` samples every `hop_size` samples
//! - DC offset removal and Hann windowing per frame
//! - Forward FFT using RustFFT, one planned transform per recording
//! - Magnitudes converted to dB relative to the loudest bin of the recording,
//!   floored at `-top_db` and shifted up by `top_db` so intensities are
//!   never negative

use rustfft::{FftPlanner, num_complex::Complex};

use crate::error::{AnalysisError, Result};

/// Smallest magnitude considered before taking a logarithm.
const AMIN: f32 = 1e-10;

/// Removes the DC offset from a signal by making its average value zero.
fn remove_dc_offset(signal: &mut [f32]) {
    let len = signal.len();
    if len == 0 { return; }
    let avg = signal.iter().sum::<f32>() / len as f32;
    if avg.abs() > 1e-6 {
        for sample in signal.iter_mut() {
            *sample -= avg;
        }
    }
}

/// Hann window coefficients of length `n`.
fn hann_window(n: usize) -> Vec<f32> {
    if n < 2 {
        return vec![1.0; n];
    }
    let n_minus_1 = (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n_minus_1).cos()))
        .collect()
}

/// Number of full frames of `frame_size` samples, `hop_size` apart, in a
/// signal of `len` samples.
pub fn frame_count(len: usize, frame_size: usize, hop_size: usize) -> usize {
    if frame_size == 0 || hop_size == 0 || len < frame_size {
        return 0;
    }
    1 + (len - frame_size) / hop_size
}

/// Center frequency of each FFT bin from DC up to Nyquist.
pub fn bin_frequencies(frame_size: usize, sample_rate: u32) -> Vec<f32> {
    let resolution = sample_rate as f32 / frame_size as f32;
    (0..=frame_size / 2).map(|k| k as f32 * resolution).collect()
}

/// Per-frame spectra of a recording on a fixed frequency axis.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// Bin frequencies in Hz, ascending, shared by every frame.
    pub frequencies: Vec<f32>,
    /// One intensity array per frame, aligned with `frequencies`.
    pub frames: Vec<Vec<f32>>,
}

impl Spectrogram {
    /// Computes the shifted log-magnitude spectrogram of `samples`.
    ///
    /// # Arguments
    /// * `samples` - Mono audio samples
    /// * `sample_rate` - Sample rate in Hz
    /// * `frame_size` - FFT length in samples
    /// * `hop_size` - Distance between frame starts in samples
    /// * `top_db` - Dynamic range kept below the loudest bin
    ///
    /// # Returns
    /// * `Err(AnalysisError::RecordingTooShort)` - Not a single full frame fits
    pub fn compute(
        samples: &[f32],
        sample_rate: u32,
        frame_size: usize,
        hop_size: usize,
        top_db: f32,
    ) -> Result<Self> {
        if frame_size < 2 || hop_size == 0 {
            return Err(AnalysisError::InvalidParameter(format!(
                "frame size {frame_size} and hop size {hop_size} must be positive"
            )));
        }
        let count = frame_count(samples.len(), frame_size, hop_size);
        if count == 0 {
            return Err(AnalysisError::RecordingTooShort {
                samples: samples.len(),
                frame_size,
            });
        }

        let magnitudes = magnitude_frames(samples, frame_size, hop_size, count);
        Ok(Self {
            frequencies: bin_frequencies(frame_size, sample_rate),
            frames: amplitude_to_shifted_db(magnitudes, top_db),
        })
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

/// Linear magnitude spectrum (`frame_size / 2 + 1` bins) of each frame.
fn magnitude_frames(samples: &[f32], frame_size: usize, hop_size: usize, count: usize) -> Vec<Vec<f32>> {
    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(frame_size);
    let window = hann_window(frame_size);
    let mut frame = vec![0.0; frame_size];
    let mut buffer = vec![Complex { re: 0.0, im: 0.0 }; frame_size];

    (0..count)
        .map(|t| {
            let start = t * hop_size;
            frame.copy_from_slice(&samples[start..start + frame_size]);
            remove_dc_offset(&mut frame);

            for ((slot, &sample), &w) in buffer.iter_mut().zip(&frame).zip(&window) {
                *slot = Complex { re: sample * w, im: 0.0 };
            }
            fft.process(&mut buffer);

            buffer
                .iter()
                .take(frame_size / 2 + 1)
                .map(|c| c.norm()) // .norm() is sqrt(re^2 + im^2)
                .collect::<Vec<f32>>()
        })
        .collect()
}

/// Converts magnitudes to dB against the loudest bin of all frames, clips
/// at `-top_db` and shifts the result into `[0, top_db]`.
fn amplitude_to_shifted_db(mut frames: Vec<Vec<f32>>, top_db: f32) -> Vec<Vec<f32>> {
    let reference = frames
        .iter()
        .flatten()
        .fold(AMIN, |acc, &m| acc.max(m));
    let reference_db = 20.0 * reference.log10();
    let top_db = top_db.max(0.0);

    for frame in frames.iter_mut() {
        for value in frame.iter_mut() {
            let db = 20.0 * value.max(AMIN).log10() - reference_db;
            *value = db.max(-top_db) + top_db;
        }
    }
    frames
}
