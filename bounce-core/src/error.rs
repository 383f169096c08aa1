//! Error types for the bounce music core.
//!
//! The gameplay-facing entry points are deliberately lenient: a wrong or
//! missing note must never crash a session, so they log a warning and fall
//! back to a safe default. The `try_*` variants and the export/file paths
//! surface these errors properly for callers that want them.

use thiserror::Error;

/// Errors that can occur in the bounce music core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A note name was not present in the pitch table.
    #[error("note not found in pitch table: {0}")]
    NoteNotFound(String),

    /// A note name could not be parsed (e.g. "H9x").
    #[error("invalid note name: {0}")]
    InvalidNoteName(String),

    /// Export or playback was requested on a sequence with no events.
    #[error("sequence has no recorded notes")]
    EmptySequence,

    /// An I/O error while writing an export file.
    #[error("export I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result alias used throughout the crate.
pub type CoreResult<T> = Result<T, CoreError>;
