//! # Partial Integration Module
//!
//! Sums the spectral energy that lies inside the tolerance windows of the
//! harmonic series `1·f0, 2·f0, 3·f0, ...` of one frame.
//!
//! The scan walks the frequency bins exactly once. A single cursor is shared
//! by all partials and only ever moves forward: bins below the current
//! partial's window belong to the gap between partials and are skipped, bins
//! inside it are added, and the next partial picks up where the previous one
//! stopped. The series ends when the frequency axis is exhausted.

use crate::threshold::ToleranceRatios;

/// Sums the energy of every harmonic window of `f0` in one frame.
///
/// # Arguments
/// * `f0` - Fundamental frequency of the frame in Hz
/// * `frequencies` - Bin frequencies in Hz, sorted ascending
/// * `spectrum` - Bin intensities, index-aligned with `frequencies`
/// * `cents` - Half-width of each partial window in cents
///
/// # Returns
/// * Total intensity inside all partial windows, in the units of `spectrum`
///
/// Unsorted `frequencies` give an unspecified (but finite) result; the order
/// is not checked on this hot path. Bins beyond the shorter of the two
/// slices are ignored.
pub fn integrate_partials(f0: f32, frequencies: &[f32], spectrum: &[f32], cents: f32) -> f32 {
    integrate_with_ratios(f0, frequencies, spectrum, ToleranceRatios::from_cents(cents))
}

/// Same scan as [`integrate_partials`], using pre-computed window ratios.
pub fn integrate_with_ratios(
    f0: f32,
    frequencies: &[f32],
    spectrum: &[f32],
    ratios: ToleranceRatios,
) -> f32 {
    // Every window collapses onto 0 Hz, which would never advance the scan.
    if !(f0 > 0.0) || !f0.is_finite() {
        return 0.0;
    }

    let len = frequencies.len().min(spectrum.len());
    let mut integral = 0.0;
    let mut i = 0;
    let mut n: u32 = 1;

    while i < len {
        let window = ratios.window(n as f32 * f0);

        while i < len && frequencies[i] < window.low {
            i += 1;
        }
        while i < len && window.contains(frequencies[i]) {
            integral += spectrum[i];
            i += 1;
        }

        if i >= len || n == u32::MAX {
            break;
        }

        // Partials whose whole window lies below the cursor bin add nothing.
        let reachable = (frequencies[i] / (f0 * ratios.high)).floor() as u32;
        n = (n + 1).max(reachable);
    }

    integral
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::threshold::DEFAULT_CENTS;
    use approx::assert_relative_eq;

    fn integrate_default(f0: f32, frequencies: &[f32], spectrum: &[f32]) -> f32 {
        integrate_partials(f0, frequencies, spectrum, DEFAULT_CENTS)
    }

    /// Steps through the partials one at a time with the shared cursor,
    /// without jumping ahead.
    fn integrate_stepwise(f0: f32, frequencies: &[f32], spectrum: &[f32], cents: f32) -> f32 {
        let ratios = ToleranceRatios::from_cents(cents);
        let len = frequencies.len().min(spectrum.len());
        let mut integral = 0.0;
        let mut i = 0;
        let mut n: u32 = 1;
        while i < len {
            let window = ratios.window(n as f32 * f0);
            while i < len && frequencies[i] < window.low {
                i += 1;
            }
            while i < len && frequencies[i] <= window.high {
                integral += spectrum[i];
                i += 1;
            }
            n += 1;
        }
        integral
    }

    fn fundamentals() -> Vec<f32> {
        let mut f0 = 20.0_f32;
        let mut sweep = Vec::new();
        while f0 < 4000.0 {
            sweep.push(f0);
            f0 *= 1.037;
        }
        sweep
    }

    #[test]
    fn test_zero_fundamental_is_zero() {
        let frequencies = [0.0, 0.0, 100.0];
        let spectrum = [5.0, 5.0, 5.0];
        assert_eq!(integrate_partials(0.0, &frequencies, &spectrum, 50.0), 0.0);
        assert_eq!(integrate_partials(-10.0, &frequencies, &spectrum, 50.0), 0.0);
        assert_eq!(integrate_partials(f32::NAN, &frequencies, &spectrum, 50.0), 0.0);
    }

    #[test]
    fn test_empty_input_is_zero() {
        assert_eq!(integrate_partials(440.0, &[], &[], 50.0), 0.0);
    }

    #[test]
    fn test_single_bin_on_partial() {
        assert_eq!(integrate_default(440.0, &[440.0], &[1.0]), 1.0);
    }

    #[test]
    fn test_off_center_bins_inside_window() {
        let frequencies = [430.0, 435.0, 440.0, 445.0, 450.0];
        let spectrum = [0.0, 1.0, 2.0, 4.0, 0.0];
        assert_relative_eq!(integrate_default(440.0, &frequencies, &spectrum), 7.0);
    }

    #[test]
    fn test_bins_outside_window_are_ignored() {
        // Window around 440 Hz at 50 cents is roughly 427.47..452.89 Hz.
        let frequencies = [420.0, 427.0, 440.0, 453.0, 460.0];
        let spectrum = [8.0, 8.0, 1.0, 8.0, 8.0];
        assert_relative_eq!(integrate_default(440.0, &frequencies, &spectrum), 1.0);
    }

    #[test]
    fn test_bin_exactly_on_upper_bound_counts() {
        let window = crate::threshold::threshold(440.0, 50.0);
        let frequencies = [440.0, window.high];
        let spectrum = [1.0, 2.0];
        assert_relative_eq!(integrate_default(440.0, &frequencies, &spectrum), 3.0);
    }

    #[test]
    fn test_two_partials_sum() {
        let frequencies = [440.0, 880.0];
        let spectrum = [1.0, 2.0];
        assert_relative_eq!(integrate_default(440.0, &frequencies, &spectrum), 3.0);
    }

    #[test]
    fn test_gap_bins_between_partials_are_skipped() {
        let frequencies: Vec<f32> = (0..=40).map(|k| k as f32 * 50.0).collect();
        let spectrum = vec![1.0; frequencies.len()];
        // Partials of 500 Hz at 50 cents: only bins 500, 1000, 1500, 2000 fall inside.
        assert_relative_eq!(integrate_default(500.0, &frequencies, &spectrum), 4.0);
    }

    #[test]
    fn test_high_bins_far_above_fundamental() {
        // A sparse axis with a large jump still finds the distant partial.
        let frequencies = [100.0, 10_000.0, 20_000.0];
        let spectrum = [1.0, 2.0, 4.0];
        assert_relative_eq!(integrate_default(100.0, &frequencies, &spectrum), 7.0);
    }

    #[test]
    fn test_tiny_fundamental_terminates() {
        let frequencies = [1.0e-3, 1.0e6];
        let spectrum = [1.0, 1.0];
        let integral = integrate_default(1.0e-3, &frequencies, &spectrum);
        assert!(integral >= 1.0);
    }

    #[test]
    fn test_mismatched_lengths_use_shorter() {
        assert_eq!(integrate_default(440.0, &[440.0, 880.0], &[1.0]), 1.0);
    }

    #[test]
    fn test_idempotent() {
        let frequencies: Vec<f32> = (0..1025).map(|k| k as f32 * 21.533).collect();
        let spectrum: Vec<f32> = (0..1025).map(|k| ((k * 7919) % 80) as f32).collect();
        let first = integrate_partials(261.63, &frequencies, &spectrum, 35.0);
        let second = integrate_partials(261.63, &frequencies, &spectrum, 35.0);
        assert_eq!(first, second);
    }

    #[test]
    fn test_matches_stepwise_scan_on_fft_axes() {
        for sample_rate in [22050.0_f32, 44100.0, 48000.0] {
            for frame_size in [1024_usize, 2048, 4096] {
                let resolution = sample_rate / frame_size as f32;
                let frequencies: Vec<f32> =
                    (0..=frame_size / 2).map(|k| k as f32 * resolution).collect();
                let spectrum: Vec<f32> =
                    (0..frequencies.len()).map(|k| ((k * 7919) % 80) as f32).collect();

                for cents in [1.0, 25.0, 50.0, 600.0, 1200.0] {
                    for f0 in fundamentals() {
                        assert_eq!(
                            integrate_partials(f0, &frequencies, &spectrum, cents),
                            integrate_stepwise(f0, &frequencies, &spectrum, cents),
                            "sample_rate={sample_rate} frame_size={frame_size} cents={cents} f0={f0}"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_matches_stepwise_scan_on_irregular_axis() {
        // Ascending bins with uneven gaps, some much wider than a partial spacing.
        let mut state: u64 = 12345;
        let mut next = || {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            (state >> 40) as f32 / (1u64 << 24) as f32
        };
        let mut frequencies = Vec::new();
        let mut spectrum = Vec::new();
        let mut f = 0.0_f32;
        while f < 22050.0 {
            frequencies.push(f);
            spectrum.push(next() * 80.0);
            let r = next();
            f += if r < 0.9 { r * 30.0 } else { r * 900.0 };
        }

        for cents in [1.0, 25.0, 50.0, 600.0, 1200.0] {
            for f0 in fundamentals() {
                assert_eq!(
                    integrate_partials(f0, &frequencies, &spectrum, cents),
                    integrate_stepwise(f0, &frequencies, &spectrum, cents),
                    "cents={cents} f0={f0}"
                );
            }
        }
    }
}
