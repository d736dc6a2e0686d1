//! # Audio Loading Module
//!
//! Decodes recordings into a mono sample buffer for analysis.
//!
//! ## Features
//! - WAV decoding through `hound` (8/16/24/32-bit integer and 32-bit float)
//! - Integer formats normalized to [-1.0, 1.0]
//! - Multi-channel files mixed down to mono by averaging
//! - The file's native sample rate is kept as-is

use std::path::Path;

use log::debug;

use crate::error::Result;

/// A decoded mono recording.
#[derive(Debug, Clone)]
pub struct Recording {
    /// Mono samples, nominally in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
}

impl Recording {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self { samples, sample_rate }
    }

    /// Duration of the recording in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Loads a WAV file as a mono recording.
///
/// # Arguments
/// * `path` - Path to the WAV file
///
/// # Returns
/// * `Ok(recording)` - Mono samples and the file's sample rate
/// * `Err(AnalysisError::AudioRead)` - The file is missing or not a readable WAV
pub fn load_recording<P: AsRef<Path>>(path: P) -> Result<Recording> {
    let path = path.as_ref();
    let reader = hound::WavReader::open(path)?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<std::result::Result<_, _>>()?
        }
    };

    let samples = mix_to_mono(&interleaved, spec.channels as usize);
    debug!(
        "[AUDIO] Loaded {}: {} Hz, {} channel(s), {} samples",
        path.display(),
        spec.sample_rate,
        spec.channels,
        samples.len()
    );

    Ok(Recording::new(samples, spec.sample_rate))
}

/// Averages interleaved channels into one. A trailing partial frame is dropped.
fn mix_to_mono(interleaved: &[f32], channels: usize) -> Vec<f32> {
    if channels <= 1 {
        return interleaved.to_vec();
    }
    interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_to_mono_averages_channels() {
        let stereo = [1.0, 0.0, 0.5, 0.5, -1.0, 1.0, 0.25];
        assert_eq!(mix_to_mono(&stereo, 2), vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn test_mix_to_mono_passes_mono_through() {
        let mono = [0.1, -0.2, 0.3];
        assert_eq!(mix_to_mono(&mono, 1), mono.to_vec());
    }

    #[test]
    fn test_duration() {
        assert_eq!(Recording::new(vec![0.0; 22050], 44100).duration(), 0.5);
        assert_eq!(Recording::new(vec![0.0; 10], 0).duration(), 0.0);
    }

    #[test]
    fn test_missing_file_is_error() {
        assert!(load_recording("/nonexistent/definitely-not-here.wav").is_err());
    }
}
