//! # Musical Tuning Module
//!
//! Canonical note frequencies for the bounce arena. The table covers every
//! chromatic note from octave 0 up to a configurable top octave and backs
//! all note detection and replay synthesis.
//!
//! ## Features
//! - Equal temperament frequency table (A4 reference = 440 Hz)
//! - Closest-note lookup with a deterministic tie-break
//! - Lenient and strict name-to-frequency conversions
//! - MIDI number calculation
//! - Cent deviation measurement
//!
//! ## Compatibility note
//! Table construction reproduces the original game's MIDI formula exactly,
//! including its octave-boundary quirk: `midi = (octave + 1) * 12 + index`,
//! then `midi -= 12` for pitch indices >= 3 (D# and above). Notes from D#
//! upward therefore sound one octave below their nominal name ("A4" maps to
//! 220 Hz and the 440 Hz entry is named "A5"). Recorded sequences and saved
//! exports depend on these exact name/frequency pairs.

use std::collections::BTreeMap;

use log::warn;

use crate::error::{CoreError, CoreResult};

/// The twelve pitch names, in table order.
pub const PITCH_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// Fallback frequency returned by lenient lookups: concert A reference.
pub const FALLBACK_FREQUENCY: f32 = 440.0;

/// A single musical note with its name and frequency.
#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    /// Note name (e.g. "A4", "C#3")
    pub name: String,
    /// Frequency in Hz
    pub frequency: f32,
}

/// Frequency table for every note from octave 0 through `octave_range`.
///
/// Built once at session start; all lookups afterwards are read-only.
#[derive(Debug, Clone)]
pub struct PitchTable {
    /// All notes, sorted by ascending frequency. The sort gives closest-note
    /// scans a deterministic iteration order: on an exact-distance tie the
    /// lower-frequency note wins.
    notes: Vec<Note>,
    /// Name -> index into `notes` for O(log n) lookups.
    index: BTreeMap<String, usize>,
}

impl PitchTable {
    /// Builds the table for octaves `0..=octave_range`.
    ///
    /// The table always has `12 * (octave_range + 1)` entries, and the
    /// quirked MIDI numbers form one contiguous run so every frequency is
    /// unique.
    pub fn new(octave_range: u32) -> Self {
        let count = 12 * (octave_range as usize + 1);
        let mut notes = Vec::with_capacity(count);

        for octave in 0..=octave_range {
            for (pitch_index, pitch) in PITCH_NAMES.iter().enumerate() {
                let midi = quirked_midi_number(octave, pitch_index);
                let frequency = frequency_for_midi(midi);
                notes.push(Note {
                    name: format!("{}{}", pitch, octave),
                    frequency,
                });
            }
        }

        notes.sort_by(|a, b| a.frequency.partial_cmp(&b.frequency).unwrap());

        let index = notes
            .iter()
            .enumerate()
            .map(|(i, note)| (note.name.clone(), i))
            .collect();

        PitchTable { notes, index }
    }

    /// Number of notes in the table.
    pub fn len(&self) -> usize {
        self.notes.len()
    }

    /// Returns true if the table is empty (never the case after `new`).
    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    /// All notes in ascending frequency order.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    /// Returns true if `name` is a note this table knows about.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Finds the note closest in frequency to `freq`.
    ///
    /// Linear scan over the whole table; with strict `<` comparison over
    /// the ascending-frequency order, an exact-distance tie keeps the
    /// lower-frequency note.
    pub fn closest_note(&self, freq: f32) -> &Note {
        let mut closest = &self.notes[0];
        let mut smallest_diff = f32::MAX;

        for note in &self.notes {
            let diff = (note.frequency - freq).abs();
            if diff < smallest_diff {
                smallest_diff = diff;
                closest = note;
            }
        }

        closest
    }

    /// Looks up the frequency of a note by name.
    ///
    /// Lenient: an unknown name logs a warning and falls back to
    /// [`FALLBACK_FREQUENCY`] so gameplay never stalls on a bad lookup.
    /// Use [`PitchTable::try_frequency_of`] to surface the error instead.
    pub fn frequency_of(&self, name: &str) -> f32 {
        match self.try_frequency_of(name) {
            Ok(freq) => freq,
            Err(_) => {
                warn!("note not found: {}, falling back to A reference", name);
                FALLBACK_FREQUENCY
            }
        }
    }

    /// Strict variant of [`PitchTable::frequency_of`].
    pub fn try_frequency_of(&self, name: &str) -> CoreResult<f32> {
        self.index
            .get(name)
            .map(|&i| self.notes[i].frequency)
            .ok_or_else(|| CoreError::NoteNotFound(name.to_string()))
    }

    /// Computes the MIDI number of a note name using the same formula the
    /// table is built from.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidNoteName`] if the name does not parse as
    /// `<pitch>[#]<octave>` with a pitch from [`PITCH_NAMES`], and
    /// [`CoreError::NoteNotFound`] for a well-formed name outside this
    /// table's octave range.
    pub fn midi_number(&self, name: &str) -> CoreResult<i32> {
        let (pitch, octave) = parse_note_name(name)?;
        let pitch_index = PITCH_NAMES
            .iter()
            .position(|&p| p == pitch)
            .ok_or_else(|| CoreError::InvalidNoteName(name.to_string()))?;
        if !self.contains(name) {
            return Err(CoreError::NoteNotFound(name.to_string()));
        }
        Ok(quirked_midi_number(octave, pitch_index))
    }
}

/// MIDI number formula shared by table construction and name parsing.
///
/// Keeps the original octave-boundary quirk: the adjustment intended to make
/// C the start of each octave subtracts 12 from pitch index 3 (D#) upward.
fn quirked_midi_number(octave: u32, pitch_index: usize) -> i32 {
    let mut midi = (octave as i32 + 1) * 12 + pitch_index as i32;
    if pitch_index >= 3 {
        midi -= 12;
    }
    midi
}

/// Equal temperament: `f = 440 * 2^((midi - 69) / 12)`, A4 = MIDI 69.
fn frequency_for_midi(midi: i32) -> f32 {
    440.0 * 2.0_f32.powf((midi as f32 - 69.0) / 12.0)
}

/// Splits a note name into its pitch part and octave number.
fn parse_note_name(name: &str) -> CoreResult<(&str, u32)> {
    let digit_start = name
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| CoreError::InvalidNoteName(name.to_string()))?;
    let (pitch, octave_str) = name.split_at(digit_start);
    let octave = octave_str
        .parse::<u32>()
        .map_err(|_| CoreError::InvalidNoteName(name.to_string()))?;
    Ok((pitch, octave))
}

/// Calculates the deviation of `freq` from `target_freq` in cents.
///
/// 100 cents = 1 semitone; positive values are sharp, negative flat.
pub fn cents_deviation(freq: f32, target_freq: f32) -> f32 {
    1200.0 * (freq / target_freq).log2()
}
