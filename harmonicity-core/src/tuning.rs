//! # Musical Tuning Module
//!
//! Note-name and cent conversions used to configure the analysis range and
//! to describe results.
//!
//! ## Features
//! - Scientific pitch notation parsing ("G3", "C#5", "Bb2")
//! - Equal temperament frequencies with A4 = 440 Hz
//! - Cent distance between two frequencies
//! - Nearest-note lookup over the MIDI range

use once_cell::sync::Lazy;

use crate::error::{AnalysisError, Result};

/// MIDI number of G3, the lowest note of the default analysis range
/// (violin open G string).
pub const VIOLIN_MIN_MIDI: i32 = 55;
/// MIDI number of E7, the highest note of the default analysis range.
pub const VIOLIN_MAX_MIDI: i32 = 100;

const A4_FREQUENCY: f32 = 440.0;
const A4_MIDI: i32 = 69;

/// Represents a single musical note with its name and frequency.
#[derive(Debug, Clone)]
pub struct Note {
    /// Note name (e.g., "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

/// Equal-tempered notes for MIDI numbers 0 to 127 (C-1 to G9), named with sharps.
static NOTES: Lazy<Vec<Note>> = Lazy::new(|| {
    const NOTE_NAMES: [&str; 12] = [
        "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
    ];
    (0..128)
        .map(|midi: i32| {
            let octave = midi / 12 - 1;
            Note {
                name: format!("{}{}", NOTE_NAMES[(midi % 12) as usize], octave),
                frequency: midi_to_hz(midi),
            }
        })
        .collect()
});

/// Equal-tempered frequency of a MIDI note number.
pub fn midi_to_hz(midi: i32) -> f32 {
    A4_FREQUENCY * 2.0_f32.powf((midi - A4_MIDI) as f32 / 12.0)
}

/// Converts a note name in scientific pitch notation to its frequency.
///
/// Accepts a letter `A`-`G` (either case), any number of `#` or `b`
/// accidentals, and an integer octave where C4 is middle C.
///
/// # Arguments
/// * `name` - Note name (e.g., "A4", "C#3", "Bb2", "C-1")
///
/// # Returns
/// * `Ok(frequency)` - Equal-tempered frequency in Hz
/// * `Err(AnalysisError::UnknownNote)` - The name could not be parsed
pub fn note_to_hz(name: &str) -> Result<f32> {
    let unknown = || AnalysisError::UnknownNote(name.to_string());
    let trimmed = name.trim();
    let mut chars = trimmed.chars();

    let pitch_class = match chars.next().map(|c| c.to_ascii_uppercase()) {
        Some('C') => 0,
        Some('D') => 2,
        Some('E') => 4,
        Some('F') => 5,
        Some('G') => 7,
        Some('A') => 9,
        Some('B') => 11,
        _ => return Err(unknown()),
    };

    let rest = chars.as_str();
    let octave_start = rest
        .find(|c: char| c != '#' && c != 'b')
        .ok_or_else(unknown)?;
    let (accidentals, octave) = rest.split_at(octave_start);
    let shift: i32 = accidentals
        .chars()
        .map(|c| if c == '#' { 1 } else { -1 })
        .sum();
    let octave: i32 = octave.parse().map_err(|_| unknown())?;

    Ok(midi_to_hz(12 * (octave + 1) + pitch_class + shift))
}

/// Parses either a plain frequency in Hz ("196", "261.6") or a note name.
pub fn parse_frequency(value: &str) -> Result<f32> {
    match value.trim().parse::<f32>() {
        Ok(hz) if hz.is_finite() && hz > 0.0 => Ok(hz),
        Ok(_) => Err(AnalysisError::InvalidParameter(format!(
            "frequency must be positive, got {value}"
        ))),
        Err(_) => note_to_hz(value),
    }
}

/// Finds the closest equal-tempered note to a given frequency.
///
/// # Returns
/// * `(note_name, target_frequency)` - Closest note name and its frequency
pub fn find_nearest_note(freq: f32) -> (String, f32) {
    let closest = NOTES
        .iter()
        .min_by(|a, b| {
            let diff_a = (a.frequency - freq).abs();
            let diff_b = (b.frequency - freq).abs();
            diff_a.total_cmp(&diff_b)
        })
        .unwrap_or(&NOTES[A4_MIDI as usize]);

    (closest.name.clone(), closest.frequency)
}

/// Calculates the distance from `target_freq` to `freq` in cents.
///
/// 100 cents is one semitone and 1200 cents one octave; positive values
/// mean `freq` is sharp of the target.
pub fn cents_between(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
