// harmonicity-core/src/lib.rs

//! The core logic for measuring how much of a tone's energy sits on its
//! harmonic series.
//! This crate is responsible for audio decoding, pitch tracking, the
//! short-time spectrum and the partial-energy integration that turns them
//! into a per-frame harmonicity series. It is completely headless and
//! contains no command-line code.

pub mod analysis;
pub mod audio;
pub mod batch;
pub mod config;
pub mod error;
pub mod fft;
pub mod measure;
pub mod partials;
pub mod pitch;
pub mod series;
pub mod threshold;
pub mod tuning;

pub use analysis::{analyze_recording, analyze_recording_with, analyze_samples, analyze_samples_with};
pub use batch::{BatchFailure, BatchReport, run_batch};
pub use config::AnalysisConfig;
pub use error::{AnalysisError, Result};
pub use measure::{TotalEnergyPolicy, frame_measure};
pub use partials::integrate_partials;
pub use series::{
    Fundamental, HarmonicitySeries, SeriesPoint, build_indexed_series, build_indexed_series_with,
    build_series,
};
pub use threshold::{DEFAULT_CENTS, ThresholdCache, Window, threshold};
