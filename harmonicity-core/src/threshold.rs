//! # Threshold Module
//!
//! Converts a partial frequency and a tolerance in cents into the frequency
//! window that counts as "on" that partial.
//!
//! Windows are symmetric in log-frequency: a tolerance of `c` cents spans
//! `f · 2^(−c/1200) ..= f · 2^(c/1200)`, so 1200 cents reaches one octave to
//! either side.

/// Default half-width of a partial window in cents.
pub const DEFAULT_CENTS: f32 = 50.0;

/// A frequency window `(low, high)` in Hz around one partial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    pub low: f32,
    pub high: f32,
}

impl Window {
    /// True when `frequency` falls inside the window, both bounds included.
    pub fn contains(&self, frequency: f32) -> bool {
        frequency >= self.low && frequency <= self.high
    }
}

/// The two multipliers `2^(∓cents/1200)` that turn a partial frequency into
/// its window bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToleranceRatios {
    pub low: f32,
    pub high: f32,
}

impl ToleranceRatios {
    /// Negative tolerances collapse to a point window.
    pub fn from_cents(cents: f32) -> Self {
        let half_width = cents.max(0.0);
        Self {
            low: 2.0_f32.powf(-half_width / 1200.0),
            high: 2.0_f32.powf(half_width / 1200.0),
        }
    }

    pub fn window(&self, partial_frequency: f32) -> Window {
        Window {
            low: partial_frequency * self.low,
            high: partial_frequency * self.high,
        }
    }
}

/// Computes the tolerance window around `partial_frequency`.
///
/// # Arguments
/// * `partial_frequency` - Frequency of the partial in Hz (`n · f0`)
/// * `cents` - Half-width of the window in cents
///
/// # Returns
/// * `Window` with `low ≤ high`; `(0, 0)` for a partial at 0 Hz
pub fn threshold(partial_frequency: f32, cents: f32) -> Window {
    ToleranceRatios::from_cents(cents).window(partial_frequency)
}

/// Caller-owned cache of the tolerance ratios for one cents value.
///
/// Every window of every partial in every frame is a linear scaling of the
/// same two ratios, so a series only needs them computed once. Asking for a
/// different `cents` replaces the cached entry.
#[derive(Debug, Clone, Default)]
pub struct ThresholdCache {
    entry: Option<(f32, ToleranceRatios)>,
}

impl ThresholdCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ratios(&mut self, cents: f32) -> ToleranceRatios {
        match self.entry {
            Some((cached_cents, ratios)) if cached_cents == cents => ratios,
            _ => {
                let ratios = ToleranceRatios::from_cents(cents);
                self.entry = Some((cents, ratios));
                ratios
            }
        }
    }
}
