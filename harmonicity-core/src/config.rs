//! # Configuration Module
//!
//! Analysis settings shared by the pitch tracker, the spectrum and the
//! harmonicity measure. Settings can be saved to and loaded from JSON so a
//! batch can be re-run with exactly the same parameters; fields missing from
//! a file take their default values.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::measure::TotalEnergyPolicy;
use crate::threshold::DEFAULT_CENTS;
use crate::tuning::{VIOLIN_MAX_MIDI, VIOLIN_MIN_MIDI, midi_to_hz};

/// Default FFT and pitch frame size (2048 samples = ~46ms at 44.1kHz)
pub const DEFAULT_FRAME_SIZE: usize = 2048;

/// Default hop size (512 samples = ~11.6ms at 44.1kHz, 75% overlap)
pub const DEFAULT_HOP_SIZE: usize = 512;

/// Minimum RMS amplitude for a frame to be considered pitched.
pub const DEFAULT_AMPLITUDE_THRESHOLD: f32 = 0.01;

/// Dynamic range of the log-magnitude spectrum in dB.
pub const DEFAULT_TOP_DB: f32 = 80.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Half-width of each partial window in cents.
    pub cents: f32,
    /// Which bins make up a frame's total energy.
    pub policy: TotalEnergyPolicy,
    /// Samples per analysis frame.
    pub frame_size: usize,
    /// Samples between consecutive frame starts.
    pub hop_size: usize,
    /// Lowest fundamental searched for, in Hz.
    pub fmin: f32,
    /// Highest fundamental searched for, in Hz.
    pub fmax: f32,
    /// RMS level below which a frame is treated as unvoiced.
    pub amplitude_threshold: f32,
    /// Dynamic range of the spectrum in dB.
    pub top_db: f32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            cents: DEFAULT_CENTS,
            policy: TotalEnergyPolicy::default(),
            frame_size: DEFAULT_FRAME_SIZE,
            hop_size: DEFAULT_HOP_SIZE,
            fmin: midi_to_hz(VIOLIN_MIN_MIDI),
            fmax: midi_to_hz(VIOLIN_MAX_MIDI),
            amplitude_threshold: DEFAULT_AMPLITUDE_THRESHOLD,
            top_db: DEFAULT_TOP_DB,
        }
    }
}

impl AnalysisConfig {
    /// Checks that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(AnalysisError::InvalidParameter(msg));

        if !self.cents.is_finite() {
            return invalid(format!("cents must be finite, got {}", self.cents));
        }
        if self.frame_size < 4 {
            return invalid(format!("frame_size must be at least 4, got {}", self.frame_size));
        }
        if self.hop_size == 0 {
            return invalid("hop_size must be positive".to_string());
        }
        if !(self.fmin > 0.0) || !self.fmax.is_finite() || self.fmin >= self.fmax {
            return invalid(format!(
                "pitch range must satisfy 0 < fmin < fmax, got {}..{}",
                self.fmin, self.fmax
            ));
        }
        if !(self.amplitude_threshold >= 0.0) {
            return invalid(format!(
                "amplitude_threshold must be non-negative, got {}",
                self.amplitude_threshold
            ));
        }
        if !(self.top_db > 0.0) || !self.top_db.is_finite() {
            return invalid(format!("top_db must be positive, got {}", self.top_db));
        }
        Ok(())
    }

    /// Duration of one hop in seconds at `sample_rate`.
    pub fn seconds_per_frame(&self, sample_rate: u32) -> f64 {
        if sample_rate == 0 {
            return 0.0;
        }
        self.hop_size as f64 / sample_rate as f64
    }

    /// Loads and validates a configuration from a JSON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut data = String::new();
        file.read_to_string(&mut data)?;
        let config: AnalysisConfig = serde_json::from_str(&data)?;
        config.validate()?;
        Ok(config)
    }

    /// Saves the configuration to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json_string = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json_string.as_bytes())?;
        Ok(())
    }
}
