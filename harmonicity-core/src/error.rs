//! # Error Module
//!
//! Error types for the harmonicity analysis pipeline. Failures that make a
//! whole recording unusable (decoding, configuration, too little audio) are
//! reported through [`AnalysisError`]; per-frame conditions such as silence
//! are recovered by the series builder and never reach the caller.

use thiserror::Error;

/// Result type alias using [`AnalysisError`].
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors that can occur while analyzing a recording.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The WAV file could not be opened or decoded.
    #[error("Failed to read audio file: {0}")]
    AudioRead(#[from] hound::Error),

    /// General file system error (config files, directories).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration file could not be parsed or written.
    #[error("Invalid configuration file: {0}")]
    Config(#[from] serde_json::Error),

    /// A parameter is outside its valid range.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The recording holds fewer samples than a single analysis frame.
    #[error("Recording too short: {samples} samples, need at least {frame_size}")]
    RecordingTooShort { samples: usize, frame_size: usize },

    /// The frame carries no energy in the measured band, so the
    /// harmonicity ratio is undefined.
    #[error("Frame has zero total energy")]
    ZeroEnergy,

    /// A note name could not be parsed.
    #[error("Unknown note name: {0}")]
    UnknownNote(String),
}
