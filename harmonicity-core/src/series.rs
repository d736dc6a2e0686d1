//! # Series Module
//!
//! Builds the harmonicity time series of a recording from its per-frame
//! fundamental estimates and spectra.
//!
//! Frames without a pitch estimate are dropped, as are frames whose measured
//! band carries no energy at all. The output is therefore shorter than the
//! frame count whenever anything was dropped; [`build_indexed_series`] keeps
//! the frame index of every value for callers that need to realign.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;
use crate::measure::{TotalEnergyPolicy, frame_measure_with_ratios};
use crate::threshold::ThresholdCache;

/// Pitch estimate of one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fundamental {
    /// The frame is pitched, at this frequency in Hz.
    Voiced(f32),
    /// No pitch was found for this frame.
    Unvoiced,
}

impl Fundamental {
    /// Maps an optional estimate; NaN and infinite estimates count as unvoiced.
    pub fn from_estimate(estimate: Option<f32>) -> Self {
        match estimate {
            Some(hz) if hz.is_finite() => Fundamental::Voiced(hz),
            _ => Fundamental::Unvoiced,
        }
    }

    pub fn hz(&self) -> Option<f32> {
        match *self {
            Fundamental::Voiced(hz) => Some(hz),
            Fundamental::Unvoiced => None,
        }
    }

    pub fn is_voiced(&self) -> bool {
        matches!(self, Fundamental::Voiced(_))
    }
}

/// One measured frame of a series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Index of the frame in the analysis grid.
    pub frame: usize,
    /// Start of the frame in seconds.
    pub time: f64,
    /// Harmonicity measure of the frame.
    pub value: f32,
}

/// The harmonicity series of one recording.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HarmonicitySeries {
    /// Number of frames analyzed, voiced or not.
    pub frame_count: usize,
    /// Measured frames in time order.
    pub points: Vec<SeriesPoint>,
}

impl HarmonicitySeries {
    /// Wraps indexed values, stamping each with its frame start time.
    pub fn from_indexed(frame_count: usize, seconds_per_frame: f64, indexed: Vec<(usize, f32)>) -> Self {
        let points = indexed
            .into_iter()
            .map(|(frame, value)| SeriesPoint {
                frame,
                time: frame as f64 * seconds_per_frame,
                value,
            })
            .collect();
        Self { frame_count, points }
    }

    pub fn values(&self) -> Vec<f32> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Mean measure over the measured frames, `None` for an empty series.
    pub fn mean(&self) -> Option<f32> {
        if self.points.is_empty() {
            return None;
        }
        Some(self.points.iter().map(|p| p.value).sum::<f32>() / self.points.len() as f32)
    }
}

/// Computes the measure of every voiced frame, tagged with its frame index.
///
/// # Arguments
/// * `f0_series` - Pitch estimate per frame
/// * `frequencies` - Bin frequencies shared by every frame, sorted ascending
/// * `spectra` - One intensity array per frame, aligned with `frequencies`
/// * `cents` - Half-width of each partial window in cents
/// * `policy` - How each frame's total energy is summed
///
/// Frames beyond the shorter of `f0_series` and `spectra` are ignored, as
/// are frames voiced at a non-finite frequency.
pub fn build_indexed_series<S: AsRef<[f32]>>(
    f0_series: &[Fundamental],
    frequencies: &[f32],
    spectra: &[S],
    cents: f32,
    policy: TotalEnergyPolicy,
) -> Vec<(usize, f32)> {
    build_indexed_series_with(f0_series, frequencies, spectra, cents, policy, &mut ThresholdCache::new())
}

/// [`build_indexed_series`] drawing the window ratios from a caller-owned
/// cache, so consecutive recordings with the same `cents` share them.
pub fn build_indexed_series_with<S: AsRef<[f32]>>(
    f0_series: &[Fundamental],
    frequencies: &[f32],
    spectra: &[S],
    cents: f32,
    policy: TotalEnergyPolicy,
    cache: &mut ThresholdCache,
) -> Vec<(usize, f32)> {
    let ratios = cache.ratios(cents);

    let mut series = Vec::with_capacity(f0_series.len().min(spectra.len()));
    for (t, (fundamental, spectrum)) in f0_series.iter().zip(spectra).enumerate() {
        let f0 = match *fundamental {
            Fundamental::Voiced(f0) if f0.is_finite() => f0,
            Fundamental::Voiced(f0) => {
                debug!("[SERIES] Skipping frame {t}: non-finite f0={f0}");
                continue;
            }
            Fundamental::Unvoiced => continue,
        };
        match frame_measure_with_ratios(f0, frequencies, spectrum.as_ref(), ratios, policy) {
            Ok(value) => series.push((t, value)),
            Err(AnalysisError::ZeroEnergy) => {
                debug!("[SERIES] Skipping frame {t}: zero total energy at f0={f0:.2} Hz");
            }
            Err(e) => debug!("[SERIES] Skipping frame {t}: {e}"),
        }
    }
    series
}

/// Computes the harmonicity series of one recording.
///
/// Same as [`build_indexed_series`] without the frame indices.
pub fn build_series<S: AsRef<[f32]>>(
    f0_series: &[Fundamental],
    frequencies: &[f32],
    spectra: &[S],
    cents: f32,
    policy: TotalEnergyPolicy,
) -> Vec<f32> {
    build_indexed_series(f0_series, frequencies, spectra, cents, policy)
        .into_iter()
        .map(|(_, value)| value)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const FREQUENCIES: [f32; 5] = [0.0, 220.0, 440.0, 660.0, 880.0];

    fn spectra() -> Vec<Vec<f32>> {
        vec![
            vec![0.0, 0.0, 1.0, 0.0, 1.0],
            vec![0.0, 0.0, 1.0, 2.0, 1.0],
            vec![0.0, 0.0, 0.0, 0.0, 0.0],
            vec![0.0, 1.0, 1.0, 1.0, 1.0],
        ]
    }

    #[test]
    fn test_fundamental_from_estimate() {
        assert_eq!(Fundamental::from_estimate(Some(440.0)), Fundamental::Voiced(440.0));
        assert_eq!(Fundamental::from_estimate(Some(f32::NAN)), Fundamental::Unvoiced);
        assert_eq!(Fundamental::from_estimate(Some(f32::INFINITY)), Fundamental::Unvoiced);
        assert_eq!(Fundamental::from_estimate(None), Fundamental::Unvoiced);
        assert_eq!(Fundamental::Voiced(0.0).hz(), Some(0.0));
    }

    #[test]
    fn test_all_voiced_keeps_every_frame() {
        let f0 = [Fundamental::Voiced(440.0); 2];
        let spectra = &spectra()[..2];
        let series = build_series(&f0, &FREQUENCIES, spectra, 50.0, TotalEnergyPolicy::FullSpectrum);
        assert_eq!(series.len(), 2);
        assert_relative_eq!(series[0], 1.0);
        assert_relative_eq!(series[1], 0.5);
    }

    #[test]
    fn test_unvoiced_and_silent_frames_are_skipped() {
        let f0 = [
            Fundamental::Voiced(440.0),
            Fundamental::Unvoiced,
            Fundamental::Voiced(440.0),
            Fundamental::Voiced(220.0),
        ];
        let indexed =
            build_indexed_series(&f0, &FREQUENCIES, &spectra(), 50.0, TotalEnergyPolicy::FullSpectrum);
        let frames: Vec<usize> = indexed.iter().map(|(t, _)| *t).collect();
        assert_eq!(frames, vec![0, 3]);
        // 220 Hz has partials at 220, 440, 660 and 880.
        assert_relative_eq!(indexed[1].1, 1.0);
    }

    #[test]
    fn test_all_unvoiced_is_empty() {
        let f0 = [Fundamental::Unvoiced; 4];
        let series = build_series(&f0, &FREQUENCIES, &spectra(), 50.0, TotalEnergyPolicy::default());
        assert!(series.is_empty());
    }

    #[test]
    fn test_length_never_exceeds_frames() {
        let f0 = [Fundamental::Voiced(440.0); 10];
        let series = build_series(&f0, &FREQUENCIES, &spectra(), 50.0, TotalEnergyPolicy::default());
        // Four spectra, one of them silent.
        assert_eq!(series.len(), 3);
    }

    #[test]
    fn test_non_finite_voiced_frames_are_skipped() {
        let f0 = [
            Fundamental::Voiced(f32::NAN),
            Fundamental::Voiced(440.0),
            Fundamental::Voiced(f32::INFINITY),
            Fundamental::Voiced(f32::NEG_INFINITY),
        ];
        for policy in [TotalEnergyPolicy::FullSpectrum, TotalEnergyPolicy::AboveFundamental] {
            let indexed = build_indexed_series(&f0, &FREQUENCIES, &spectra(), 50.0, policy);
            let frames: Vec<usize> = indexed.iter().map(|(t, _)| *t).collect();
            assert_eq!(frames, vec![1], "{policy:?}");
        }
    }

    #[test]
    fn test_shared_cache_matches_fresh_cache() {
        let f0 = [
            Fundamental::Voiced(440.0),
            Fundamental::Voiced(440.0),
            Fundamental::Unvoiced,
            Fundamental::Voiced(220.0),
        ];
        let policy = TotalEnergyPolicy::default();
        let mut cache = ThresholdCache::new();

        // Seed the cache with another tolerance, as a previous recording would.
        let wide = build_indexed_series_with(&f0, &FREQUENCIES, &spectra(), 1200.0, policy, &mut cache);
        assert_eq!(wide, build_indexed_series(&f0, &FREQUENCIES, &spectra(), 1200.0, policy));

        for _ in 0..2 {
            let cached = build_indexed_series_with(&f0, &FREQUENCIES, &spectra(), 50.0, policy, &mut cache);
            assert_eq!(cached, build_indexed_series(&f0, &FREQUENCIES, &spectra(), 50.0, policy));
        }
    }

    #[test]
    fn test_series_wrapper() {
        let series = HarmonicitySeries::from_indexed(8, 0.5, vec![(1, 0.25), (4, 0.75)]);
        assert_eq!(series.len(), 2);
        assert_eq!(series.points[1].time, 2.0);
        assert_eq!(series.values(), vec![0.25, 0.75]);
        assert_relative_eq!(series.mean().unwrap(), 0.5);
        assert_eq!(HarmonicitySeries::default().mean(), None);
    }
}
