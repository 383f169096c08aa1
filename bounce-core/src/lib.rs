// bounce-core/src/lib.rs

//! The audio core for the bounce music game: a ball striking instrument
//! blocks turns collisions into synthesized notes. This crate maps impact
//! positions to frequencies, synthesizes harmonic tones with an ADSR
//! envelope, analyzes their spectra, quantizes frequencies to musical
//! notes and records the resulting sequence for replay and export. It is
//! completely headless and contains no rendering, physics or UI code.

pub mod config;
pub mod detect;
pub mod error;
pub mod instrument;
pub mod playback;
pub mod sequence;
pub mod session;
pub mod spectrum;
pub mod synth;
pub mod tuning;

pub use config::{AdsrConfig, CoreConfig};
pub use detect::NoteDetector;
pub use error::{CoreError, CoreResult};
pub use instrument::{InstrumentProfile, InstrumentType};
pub use playback::SequencePlayer;
pub use sequence::{NoteEvent, NoteSequence};
pub use session::{GameSession, NoteReport};
pub use spectrum::{SpectrumAnalyzer, SpectrumFrame};
pub use synth::{ToneSynthesizer, WaveformBuffer};
pub use tuning::{Note, PitchTable};
