//! # Frame Measure Module
//!
//! Turns one frame's harmonic energy into a ratio against the frame's total
//! energy. The ratio is the harmonicity measure: 1.0 when every bit of
//! counted energy sits on a partial, approaching 0.0 for noise.

use serde::{Deserialize, Serialize};

use crate::error::{AnalysisError, Result};
use crate::partials::integrate_with_ratios;
use crate::threshold::ToleranceRatios;

/// Which bins make up the denominator of the harmonicity ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TotalEnergyPolicy {
    /// Every bin of the frame.
    FullSpectrum,
    /// Only bins at or above the lower bound of the fundamental's window,
    /// so DC and sub-fundamental rumble do not dilute the ratio.
    #[default]
    AboveFundamental,
}

/// Computes the harmonicity measure of a single frame.
///
/// # Arguments
/// * `f0` - Fundamental frequency of the frame in Hz
/// * `frequencies` - Bin frequencies in Hz, sorted ascending
/// * `spectrum` - Non-negative bin intensities aligned with `frequencies`
/// * `cents` - Half-width of each partial window in cents
/// * `policy` - How the total energy is summed
///
/// # Returns
/// * `Ok(ratio)` - Harmonic energy over total energy
/// * `Err(AnalysisError::ZeroEnergy)` - The total is zero and the ratio is undefined
pub fn frame_measure(
    f0: f32,
    frequencies: &[f32],
    spectrum: &[f32],
    cents: f32,
    policy: TotalEnergyPolicy,
) -> Result<f32> {
    frame_measure_with_ratios(f0, frequencies, spectrum, ToleranceRatios::from_cents(cents), policy)
}

pub(crate) fn frame_measure_with_ratios(
    f0: f32,
    frequencies: &[f32],
    spectrum: &[f32],
    ratios: ToleranceRatios,
    policy: TotalEnergyPolicy,
) -> Result<f32> {
    let peaks = integrate_with_ratios(f0, frequencies, spectrum, ratios);
    let total = total_energy(f0, frequencies, spectrum, ratios, policy);

    if total == 0.0 {
        return Err(AnalysisError::ZeroEnergy);
    }
    Ok(peaks / total)
}

fn total_energy(
    f0: f32,
    frequencies: &[f32],
    spectrum: &[f32],
    ratios: ToleranceRatios,
    policy: TotalEnergyPolicy,
) -> f32 {
    match policy {
        TotalEnergyPolicy::FullSpectrum => spectrum.iter().sum(),
        TotalEnergyPolicy::AboveFundamental => {
            let low = ratios.window(f0.max(0.0)).low;
            let len = frequencies.len().min(spectrum.len());
            let start = frequencies[..len].partition_point(|&f| f < low);
            spectrum[start..len].iter().sum()
        }
    }
}
