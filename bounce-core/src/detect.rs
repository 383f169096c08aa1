//! # Note Detection Module
//!
//! Quantizes measured frequencies to the nearest canonical pitch. Detection
//! is tolerance-gated: a candidate note only qualifies when the measured
//! frequency is within a configurable percentage of the note's frequency,
//! and the closest qualifier wins. When nothing qualifies the detector
//! falls back to a default note instead of failing, so a stray frequency
//! can never break a game round.

use log::{debug, warn};

use crate::spectrum::{SpectrumAnalyzer, SpectrumFrame};
use crate::tuning::{self, PitchTable};

/// Note reported when no table entry qualifies within tolerance.
pub const FALLBACK_NOTE: &str = "C4";

/// Lower clamp for the detection tolerance, in percent.
pub const MIN_TOLERANCE: f32 = 0.1;
/// Upper clamp for the detection tolerance, in percent.
pub const MAX_TOLERANCE: f32 = 50.0;

/// Maps frequencies and spectra to musical note names.
#[derive(Debug, Clone)]
pub struct NoteDetector {
    table: PitchTable,
    tolerance_percentage: f32,
}

impl NoteDetector {
    /// Creates a detector over a fresh pitch table.
    ///
    /// # Arguments
    /// * `octave_range` - Highest octave of the underlying table
    /// * `tolerance_percentage` - Detection tolerance, clamped to [0.1, 50]
    pub fn new(octave_range: u32, tolerance_percentage: f32) -> Self {
        Self {
            table: PitchTable::new(octave_range),
            tolerance_percentage: tolerance_percentage.clamp(MIN_TOLERANCE, MAX_TOLERANCE),
        }
    }

    /// The pitch table this detector quantizes against.
    pub fn table(&self) -> &PitchTable {
        &self.table
    }

    /// Current tolerance in percent.
    pub fn tolerance(&self) -> f32 {
        self.tolerance_percentage
    }

    /// Updates the tolerance, clamping to the supported range.
    pub fn set_tolerance(&mut self, tolerance_percentage: f32) {
        self.tolerance_percentage = tolerance_percentage.clamp(MIN_TOLERANCE, MAX_TOLERANCE);
    }

    /// Detects the note closest to `freq` within tolerance.
    ///
    /// Scans the table in ascending frequency order; among entries whose
    /// percentage distance `|freq - note| / note * 100` is within the
    /// tolerance, the smallest absolute difference wins. Falls back to
    /// [`FALLBACK_NOTE`] (with a warning) when nothing qualifies, which
    /// also covers non-positive input.
    pub fn detect_from_frequency(&self, freq: f32) -> String {
        let mut closest: Option<&str> = None;
        let mut smallest_diff = f32::MAX;

        for note in self.table.notes() {
            let diff = (freq - note.frequency).abs();
            let percentage_diff = diff / note.frequency * 100.0;

            if percentage_diff <= self.tolerance_percentage && diff < smallest_diff {
                smallest_diff = diff;
                closest = Some(&note.name);
            }
        }

        match closest {
            Some(name) => name.to_string(),
            None => {
                warn!(
                    "no note within {}% of {} Hz, defaulting to {}",
                    self.tolerance_percentage, freq, FALLBACK_NOTE
                );
                FALLBACK_NOTE.to_string()
            }
        }
    }

    /// Detects the note of a spectrum's dominant frequency.
    pub fn detect_from_spectrum(&self, frame: &SpectrumFrame) -> String {
        let dominant = SpectrumAnalyzer::dominant_frequency(frame);
        debug!("dominant frequency: {:.2} Hz", dominant);
        self.detect_from_frequency(dominant)
    }

    /// Finds spectral peak frequencies above `threshold`.
    ///
    /// A bin counts as a peak when its magnitude is strictly greater than
    /// both neighbours on each side (5-wide window). Peaks are returned in
    /// ascending bin order.
    pub fn find_peaks(&self, frame: &SpectrumFrame, threshold: f32) -> Vec<f32> {
        let magnitudes = &frame.magnitudes;
        let resolution = frame.frequency_resolution();
        let mut peaks = Vec::new();

        if magnitudes.len() < 5 {
            return peaks;
        }

        for i in 2..magnitudes.len() - 2 {
            let current = magnitudes[i];
            if current > threshold
                && current > magnitudes[i - 1]
                && current > magnitudes[i + 1]
                && current > magnitudes[i - 2]
                && current > magnitudes[i + 2]
            {
                peaks.push(i as f32 * resolution);
            }
        }

        peaks
    }

    /// Detects every distinct note among the spectral peaks above
    /// `threshold`, in order of first appearance.
    pub fn detect_multiple(&self, frame: &SpectrumFrame, threshold: f32) -> Vec<String> {
        let mut detected = Vec::new();
        for freq in self.find_peaks(frame, threshold) {
            let note = self.detect_from_frequency(freq);
            if !detected.contains(&note) {
                detected.push(note);
            }
        }
        detected
    }

    /// Detects the nearest note and reports the deviation from it in cents.
    pub fn nearest_note_with_cents(&self, freq: f32) -> (String, f32) {
        let name = self.detect_from_frequency(freq);
        let target = self.table.frequency_of(&name);
        (name, tuning::cents_deviation(freq, target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> NoteDetector {
        NoteDetector::new(8, 5.0)
    }

    #[test]
    fn exact_table_frequencies_detect_as_themselves() {
        let detector = detector();
        for i in 0..detector.table().len() {
            let note = detector.table().notes()[i].clone();
            assert_eq!(detector.detect_from_frequency(note.frequency), note.name);
        }
    }

    #[test]
    fn concert_pitch_is_named_a5_in_the_quirked_table() {
        // The table's octave quirk puts 440 Hz on "A5" (see tuning module)
        assert_eq!(detector().detect_from_frequency(440.0), "A5");
        assert_eq!(detector().detect_from_frequency(220.0), "A4");
    }

    #[test]
    fn out_of_tolerance_input_falls_back_to_c4() {
        let detector = detector();
        // Far above the top of the table
        assert_eq!(detector.detect_from_frequency(100_000.0), FALLBACK_NOTE);
        // Non-positive input can never be within a percentage tolerance
        assert_eq!(detector.detect_from_frequency(0.0), FALLBACK_NOTE);
        assert_eq!(detector.detect_from_frequency(-50.0), FALLBACK_NOTE);
    }

    #[test]
    fn slightly_sharp_input_still_detects() {
        let detector = detector();
        let target = detector.table().frequency_of("A5");
        assert_eq!(detector.detect_from_frequency(target * 1.02), "A5");
    }

    #[test]
    fn tolerance_is_clamped() {
        let mut detector = NoteDetector::new(8, 500.0);
        assert_eq!(detector.tolerance(), MAX_TOLERANCE);
        detector.set_tolerance(0.0);
        assert_eq!(detector.tolerance(), MIN_TOLERANCE);
        detector.set_tolerance(5.0);
        assert_eq!(detector.tolerance(), 5.0);
    }

    #[test]
    fn spectrum_of_a_pure_tone_detects_its_note() {
        let detector = detector();
        let sample_rate = 44100;
        let freq = detector.table().frequency_of("B5"); // ~493.88 Hz in the quirked table
        let samples: Vec<f32> = (0..8192)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                (std::f32::consts::TAU * freq * t).sin()
            })
            .collect();

        let frame = SpectrumAnalyzer::new().analyze(&samples, sample_rate, 8192);
        assert_eq!(detector.detect_from_spectrum(&frame), "B5");
    }

    #[test]
    fn silent_spectrum_falls_back_to_c4() {
        let detector = detector();
        let frame = SpectrumFrame {
            magnitudes: vec![0.0_f32; 512],
            sample_rate: 44100,
        };
        // Dominant of an empty frame is 0 Hz, which never qualifies
        assert_eq!(detector.detect_from_spectrum(&frame), FALLBACK_NOTE);
    }

    #[test]
    fn peaks_require_a_five_wide_local_maximum() {
        let detector = detector();
        let mut magnitudes = vec![0.0_f32; 64];
        magnitudes[10] = 1.0; // isolated peak
        magnitudes[20] = 0.8;
        magnitudes[21] = 0.9; // plateau shoulder, 21 is the peak
        let frame = SpectrumFrame {
            magnitudes,
            sample_rate: 12800,
        };
        let resolution = frame.frequency_resolution();

        let peaks = detector.find_peaks(&frame, 0.5);
        assert_eq!(peaks.len(), 2);
        assert!((peaks[0] - 10.0 * resolution).abs() < 1e-3);
        assert!((peaks[1] - 21.0 * resolution).abs() < 1e-3);
    }

    #[test]
    fn peaks_below_threshold_are_ignored() {
        let detector = detector();
        let mut magnitudes = vec![0.0_f32; 32];
        magnitudes[8] = 0.05;
        let frame = SpectrumFrame {
            magnitudes,
            sample_rate: 44100,
        };
        assert!(detector.find_peaks(&frame, 0.1).is_empty());
    }

    #[test]
    fn detect_multiple_deduplicates_notes() {
        let detector = detector();
        let mut magnitudes = vec![0.0_f32; 512];
        // Two peaks in adjacent-but-separated bins that quantize to the
        // same note, plus one clearly different peak.
        magnitudes[100] = 1.0;
        magnitudes[103] = 0.9;
        magnitudes[200] = 0.8;
        let frame = SpectrumFrame {
            magnitudes,
            sample_rate: 44100,
        };

        let notes = detector.detect_multiple(&frame, 0.5);
        let unique: std::collections::BTreeSet<_> = notes.iter().collect();
        assert_eq!(notes.len(), unique.len());
        assert!(!notes.is_empty());
    }

    #[test]
    fn cents_are_reported_against_the_detected_note() {
        let detector = detector();
        let (note, cents) = detector.nearest_note_with_cents(440.0);
        assert_eq!(note, "A5");
        assert!(cents.abs() < 0.5);

        let sharp = 440.0 * 2.0_f32.powf(20.0 / 1200.0); // +20 cents
        let (note, cents) = detector.nearest_note_with_cents(sharp);
        assert_eq!(note, "A5");
        assert!((cents - 20.0).abs() < 0.5);
    }
}
