//! Error types for timeline editing.

use clearcut_core::ClearCutError;
use std::fmt;
use thiserror::Error;

use crate::context::ContextId;

/// Which history stack an undo/redo request targeted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

impl fmt::Display for HistoryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undo => f.write_str("undo"),
            Self::Redo => f.write_str("redo"),
        }
    }
}

/// Reasons an editing operation was rejected.
///
/// A rejected operation never mutates the timeline and never records history.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EditError {
    #[error("Invalid range {start:.3}..{end:.3} (timeline is {total:.3}s long)")]
    InvalidRange { start: f64, end: f64, total: f64 },

    #[error("No segment content between {start:.3} and {end:.3}")]
    NothingSelected { start: f64, end: f64 },

    #[error("Clipboard is empty")]
    ClipboardEmpty,

    #[error("Nothing to {0}")]
    HistoryExhausted(HistoryDirection),

    #[error("Invalid segment {start:.3}..{end:.3}")]
    InvalidSegment { start: f64, end: f64 },

    #[error("Segment {index} has no source file")]
    MissingSource { index: usize },

    #[error("Unknown editing context {0}")]
    UnknownContext(ContextId),
}

impl From<EditError> for ClearCutError {
    fn from(err: EditError) -> Self {
        ClearCutError::Timeline(err.to_string())
    }
}

/// Result type alias for editing operations.
pub type EditResult<T> = std::result::Result<T, EditError>;
