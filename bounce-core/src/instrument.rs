//! # Instrument Profile Module
//!
//! Static timbre data for the six playable instrument blocks. Each
//! instrument is described by a set of harmonic amplitudes (fundamental
//! first) and the frequency range its block maps impact positions onto.
//!
//! The table is process-wide constant data: callers look profiles up
//! directly instead of instantiating anything.

use std::collections::BTreeMap;
use std::fmt;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// The playable instrument kinds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum InstrumentType {
    Piano,
    Guitar,
    Drums,
    Violin,
    Flute,
    Trumpet,
}

impl InstrumentType {
    /// All instruments, in block-palette order.
    pub const ALL: [InstrumentType; 6] = [
        InstrumentType::Piano,
        InstrumentType::Guitar,
        InstrumentType::Drums,
        InstrumentType::Violin,
        InstrumentType::Flute,
        InstrumentType::Trumpet,
    ];

    /// Looks up this instrument's static profile.
    pub fn profile(self) -> &'static InstrumentProfile {
        &PROFILES[&self]
    }
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Variant names appear verbatim in sequence exports.
        write!(f, "{:?}", self)
    }
}

/// Harmonic amplitudes and playable frequency range for one instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentProfile {
    /// Amplitude of each harmonic, fundamental first (harmonic h has
    /// frequency `f0 * (h + 1)`).
    pub harmonics: Vec<f32>,
    /// Lowest playable frequency in Hz.
    pub min_freq: f32,
    /// Highest playable frequency in Hz.
    pub max_freq: f32,
}

/// Static profile table, built once on first access.
static PROFILES: Lazy<BTreeMap<InstrumentType, InstrumentProfile>> = Lazy::new(|| {
    use InstrumentType::*;

    let mut profiles = BTreeMap::new();
    profiles.insert(
        Piano,
        InstrumentProfile {
            harmonics: vec![1.0, 0.5, 0.3, 0.2, 0.1],
            min_freq: 27.5, // A0 to C8
            max_freq: 4186.0,
        },
    );
    profiles.insert(
        Guitar,
        InstrumentProfile {
            harmonics: vec![1.0, 0.7, 0.4, 0.3, 0.15],
            min_freq: 82.4, // E2 to E6
            max_freq: 1320.0,
        },
    );
    profiles.insert(
        Drums,
        InstrumentProfile {
            // Stronger upper partials for a noisier timbre
            harmonics: vec![1.0, 0.3, 0.6, 0.2, 0.4],
            min_freq: 60.0,
            max_freq: 200.0,
        },
    );
    profiles.insert(
        Violin,
        InstrumentProfile {
            harmonics: vec![1.0, 0.8, 0.6, 0.4, 0.3],
            min_freq: 196.0, // G3 to A7
            max_freq: 3520.0,
        },
    );
    profiles.insert(
        Flute,
        InstrumentProfile {
            // Nearly pure tone
            harmonics: vec![1.0, 0.2, 0.1, 0.05, 0.02],
            min_freq: 262.0, // C4 to C7
            max_freq: 2093.0,
        },
    );
    profiles.insert(
        Trumpet,
        InstrumentProfile {
            harmonics: vec![1.0, 0.6, 0.8, 0.5, 0.3],
            min_freq: 165.0, // E3 to D6
            max_freq: 1175.0,
        },
    );
    profiles
});
