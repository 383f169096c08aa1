//! # Configuration Module
//!
//! Recognized options for the audio core, with the defaults the game ships
//! with. The struct is serde-enabled so a front end can persist user
//! settings as JSON and load them back.

use serde::{Deserialize, Serialize};

/// ADSR envelope breakpoints used by the tone synthesizer.
///
/// The release phase is expressed as a fraction of the total note duration
/// rather than an absolute time, matching the original envelope shape.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdsrConfig {
    /// Attack time in seconds (linear ramp 0 -> 1).
    pub attack: f32,
    /// Decay time in seconds (linear ramp 1 -> sustain).
    pub decay: f32,
    /// Sustain level (0.0 to 1.0).
    pub sustain: f32,
    /// Release window as a fraction of the note duration.
    pub release_fraction: f32,
}

impl Default for AdsrConfig {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.2,
            sustain: 0.7,
            release_fraction: 0.3,
        }
    }
}

/// Top-level configuration for a game session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Audio sample rate in Hz.
    pub sample_rate: u32,
    /// FFT window size in samples for spectrum analysis.
    pub fft_size: usize,
    /// Highest octave in the pitch table (table spans octaves 0..=octave_range).
    pub octave_range: u32,
    /// Note detection tolerance as a percentage of the candidate frequency.
    /// Clamped to [0.1, 50] when applied.
    pub tolerance_percentage: f32,
    /// Beats per minute, recorded in exports. Display-only; synthesis timing
    /// is driven by real collision timestamps.
    pub bpm: f32,
    /// Duration of each synthesized note in seconds.
    pub note_duration: f32,
    /// Envelope breakpoints.
    pub adsr: AdsrConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 1024,
            octave_range: 8,
            tolerance_percentage: 5.0,
            bpm: 120.0,
            note_duration: 0.5,
            adsr: AdsrConfig::default(),
        }
    }
}
