//! # Note Sequence Module
//!
//! The append-only log of detected notes for one game round, plus the text
//! export the game writes at the end of a session. Events are recorded with
//! timestamps relative to the round start and replayed later by the
//! playback scheduler.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::instrument::InstrumentType;

/// One detected note, immutable once recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteEvent {
    /// Detected note name (e.g. "A5").
    pub note_name: String,
    /// Seconds since the start of the sequence.
    pub timestamp: f32,
    /// Instrument block that produced the note.
    pub instrument: InstrumentType,
}

/// An ordered, timestamped log of the notes played in one round.
///
/// Mutated only by appending; cleared when a new round starts. Timestamps
/// are expected to be non-decreasing since collisions arrive in real time;
/// an out-of-order append is kept but logged, the ordering is advisory.
#[derive(Debug, Clone)]
pub struct NoteSequence {
    events: Vec<NoteEvent>,
    start_time: f32,
    bpm: f32,
}

impl NoteSequence {
    /// Creates an empty sequence. `bpm` is recorded in exports only.
    pub fn new(bpm: f32) -> Self {
        Self {
            events: Vec::new(),
            start_time: 0.0,
            bpm,
        }
    }

    /// Resets the log and marks `at_time` as the round start.
    pub fn start(&mut self, at_time: f32) {
        self.events.clear();
        self.start_time = at_time;
        debug!("sequence started at t={:.2}s", at_time);
    }

    /// Appends a detected note hit at absolute time `at_time`.
    pub fn append(&mut self, note_name: &str, at_time: f32, instrument: InstrumentType) {
        let relative = at_time - self.start_time;

        if let Some(last) = self.events.last() {
            if relative < last.timestamp {
                warn!(
                    "note {} at {:.2}s arrives before previous event at {:.2}s",
                    note_name, relative, last.timestamp
                );
            }
        }

        debug!(
            "note added: {} - {} at {:.2}s",
            instrument, note_name, relative
        );
        self.events.push(NoteEvent {
            note_name: note_name.to_string(),
            timestamp: relative,
            instrument,
        });
    }

    /// The recorded events, in insertion order.
    pub fn events(&self) -> &[NoteEvent] {
        &self.events
    }

    /// Number of recorded notes.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns true when nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Discards all recorded notes.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Renders the export text with the given generation timestamp.
    ///
    /// The layout is fixed for compatibility with previously exported
    /// files (headers are Spanish, tab-separated data lines, 2-decimal
    /// timestamps). Rendering is deterministic for a given `now`, so two
    /// calls over an unmodified sequence are byte-identical.
    ///
    /// # Errors
    /// [`CoreError::EmptySequence`] when no notes have been recorded.
    pub fn render_export(&self, now: DateTime<Local>) -> CoreResult<String> {
        if self.events.is_empty() {
            return Err(CoreError::EmptySequence);
        }

        let mut content = String::new();
        content.push_str("=== SECUENCIA MUSICAL GENERADA ===\n");
        content.push_str(&format!("BPM: {}\n", self.bpm));
        content.push_str(&format!("Fecha: {}\n", now.format("%Y-%m-%d %H:%M:%S")));
        content.push_str(&format!("Total de notas: {}\n", self.events.len()));
        content.push('\n');
        content.push_str("Tiempo(s)\tInstrumento\tNota\n");
        content.push_str("-------------------------------\n");

        for event in &self.events {
            content.push_str(&format!(
                "{:.2}\t{}\t{}\n",
                event.timestamp, event.instrument, event.note_name
            ));
        }

        Ok(content)
    }

    /// Writes the export to `MusicSequence_<yyyyMMdd_HHmmss>.txt` under
    /// `directory`, creating it if needed. Returns the file path.
    pub fn export_to_file(&self, directory: &Path) -> CoreResult<PathBuf> {
        let now = Local::now();
        let content = self.render_export(now)?;

        fs::create_dir_all(directory)?;
        let file_name = format!("MusicSequence_{}.txt", now.format("%Y%m%d_%H%M%S"));
        let path = directory.join(file_name);
        fs::write(&path, content)?;

        debug!("sequence exported to {}", path.display());
        Ok(path)
    }
}
