//! # Game Session Module
//!
//! Wires the audio core together for one play session. The session owns
//! one of each component (pitch table via the detector, synthesizer,
//! analyzer, sequence, player) and passes them explicitly; there is no
//! global registry to look instances up in.
//!
//! External collaborators interact through a narrow surface: physics
//! reports collisions via [`GameSession::handle_collision`], the UI reads
//! the returned [`NoteReport`] (note name plus the spectrum feed), and the
//! menu layer drives rounds, replay and export.

use std::path::{Path, PathBuf};
use std::time::Instant;

use crossbeam_channel::Receiver;
use log::debug;
use rand::Rng;

use crate::config::CoreConfig;
use crate::detect::NoteDetector;
use crate::error::CoreResult;
use crate::instrument::InstrumentType;
use crate::playback::SequencePlayer;
use crate::sequence::{NoteEvent, NoteSequence};
use crate::spectrum::{SpectrumAnalyzer, SpectrumFrame};
use crate::synth::{ToneSynthesizer, WaveformBuffer};

/// Everything the core derives from a single collision.
#[derive(Debug, Clone)]
pub struct NoteReport {
    /// Detected (quantized) note name.
    pub note_name: String,
    /// Synthesized target frequency in Hz, after position mapping and jitter.
    pub frequency: f32,
    /// Strongest frequency found in the synthesized tone's spectrum.
    pub dominant_frequency: f32,
    /// Magnitude spectrum of the tone, for the spectrogram display.
    pub spectrum: SpectrumFrame,
}

/// One play session's component graph and round state.
pub struct GameSession {
    config: CoreConfig,
    detector: NoteDetector,
    synthesizer: ToneSynthesizer,
    analyzer: SpectrumAnalyzer,
    sequence: NoteSequence,
    player: SequencePlayer,
    round_started_at: Option<Instant>,
}

impl GameSession {
    /// Builds a session from configuration.
    pub fn new(config: CoreConfig) -> Self {
        let detector = NoteDetector::new(config.octave_range, config.tolerance_percentage);
        let synthesizer = ToneSynthesizer::new(config.sample_rate, config.adsr);
        let sequence = NoteSequence::new(config.bpm);

        Self {
            config,
            detector,
            synthesizer,
            analyzer: SpectrumAnalyzer::new(),
            sequence,
            player: SequencePlayer::new(),
            round_started_at: None,
        }
    }

    /// The configuration this session was built from.
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// The session's note detector (and through it, the pitch table).
    pub fn detector(&self) -> &NoteDetector {
        &self.detector
    }

    /// The recorded sequence for the current/last round.
    pub fn sequence(&self) -> &NoteSequence {
        &self.sequence
    }

    /// Starts a new round: stops any active playback, clears the sequence
    /// and begins recording timestamps from now.
    pub fn start_round(&mut self) {
        self.player.stop();
        self.sequence.start(0.0);
        self.round_started_at = Some(Instant::now());
        debug!("round started");
    }

    /// Stops recording. The sequence stays available for replay and export.
    pub fn finish_round(&mut self) {
        self.round_started_at = None;
        debug!("round finished with {} notes", self.sequence.len());
    }

    /// Returns true while collisions are being recorded.
    pub fn is_recording(&self) -> bool {
        self.round_started_at.is_some()
    }

    /// Processes a ball collision: maps the impact height to a frequency,
    /// synthesizes the tone, analyzes its spectrum and quantizes the
    /// frequency to a note. During a round the note is appended to the
    /// sequence at the elapsed round time.
    ///
    /// The note is detected from the synthesized target frequency; the
    /// spectral path is reported alongside for the display feed (coarse
    /// FFT bins would misquantize low-pitched instruments).
    pub fn handle_collision(
        &mut self,
        instrument: InstrumentType,
        normalized_y: f32,
    ) -> NoteReport {
        self.handle_collision_with(instrument, normalized_y, &mut rand::thread_rng())
    }

    /// Like [`GameSession::handle_collision`] with a caller-supplied RNG
    /// for the position jitter.
    pub fn handle_collision_with<R: Rng>(
        &mut self,
        instrument: InstrumentType,
        normalized_y: f32,
        rng: &mut R,
    ) -> NoteReport {
        let frequency =
            self.synthesizer
                .frequency_from_position_with(instrument, normalized_y, rng);
        let buffer =
            self.synthesizer
                .synthesize(frequency, instrument, self.config.note_duration);

        let spectrum = self.analyzer.analyze(
            &buffer.samples,
            buffer.sample_rate,
            self.config.fft_size,
        );
        let dominant_frequency = SpectrumAnalyzer::dominant_frequency(&spectrum);
        debug!(
            "collision: {} at y={:.2} -> {:.2} Hz (dominant {:.2} Hz)",
            instrument, normalized_y, frequency, dominant_frequency
        );

        let note_name = self.detector.detect_from_frequency(frequency);

        if let Some(started_at) = self.round_started_at {
            let elapsed = started_at.elapsed().as_secs_f32();
            self.sequence.append(&note_name, elapsed, instrument);
        }

        NoteReport {
            note_name,
            frequency,
            dominant_frequency,
            spectrum,
        }
    }

    /// Re-synthesizes a recorded event from its note name (no re-detection).
    pub fn resynthesize(&self, event: &NoteEvent) -> WaveformBuffer {
        let frequency = self.detector.table().frequency_of(&event.note_name);
        self.synthesizer
            .synthesize(frequency, event.instrument, self.config.note_duration)
    }

    /// Replays the recorded sequence, delivering each event to `on_note`
    /// on its original timing. Restarting while a playback is active
    /// cancels the previous one first.
    pub fn replay<F>(&mut self, on_note: F) -> CoreResult<()>
    where
        F: FnMut(NoteEvent) + Send + 'static,
    {
        self.player.play(self.sequence.events().to_vec(), on_note)
    }

    /// Channel variant of [`GameSession::replay`].
    pub fn replay_channel(&mut self) -> CoreResult<Receiver<NoteEvent>> {
        self.player.play_channel(self.sequence.events().to_vec())
    }

    /// Returns true while a replay is delivering events.
    pub fn is_playing(&self) -> bool {
        self.player.is_playing()
    }

    /// Cancels any active replay and waits for it to terminate.
    pub fn stop_playback(&mut self) {
        self.player.stop();
    }

    /// Exports the recorded sequence as a text file under `directory`.
    pub fn export(&self, directory: &Path) -> CoreResult<PathBuf> {
        self.sequence.export_to_file(directory)
    }
}
