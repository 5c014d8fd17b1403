//! Undo/redo history.
//!
//! Snapshot based: every mutation pushes a deep copy of the pre-mutation
//! timeline. Segment lists are small, so whole copies are cheap enough and
//! make undo trivially exact.

use crate::segment::Segment;

/// A restorable copy of a timeline's content.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineSnapshot {
    pub segments: Vec<Segment>,
    pub source_file: Option<String>,
    pub source_duration: f64,
    /// Content revision, so undoing back to a saved state reads as clean.
    pub revision: u64,
}

/// Undo/redo history stack.
#[derive(Debug)]
pub struct History {
    /// States before each executed edit (most recent last).
    undo: Vec<TimelineSnapshot>,
    /// States before each undone edit was reverted (most recent last).
    redo: Vec<TimelineSnapshot>,
    /// Maximum history depth.
    max_depth: usize,
}

impl History {
    /// Create a new history with the given maximum depth.
    pub fn new(max_depth: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    /// Record the state from before an edit.
    /// Clears the redo stack (new action invalidates redo history).
    pub fn push(&mut self, before: TimelineSnapshot) {
        self.redo.clear();
        self.undo.push(before);
        if self.undo.len() > self.max_depth {
            self.undo.remove(0);
        }
    }

    /// Step back. `current` is parked on the redo stack and the state to
    /// restore is returned.
    pub fn undo(&mut self, current: TimelineSnapshot) -> Option<TimelineSnapshot> {
        let previous = self.undo.pop()?;
        self.redo.push(current);
        Some(previous)
    }

    /// Step forward again. Mirror image of [`undo`](Self::undo).
    pub fn redo(&mut self, current: TimelineSnapshot) -> Option<TimelineSnapshot> {
        let next = self.redo.pop()?;
        self.undo.push(current);
        Some(next)
    }

    /// Check if undo is available.
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    /// Check if redo is available.
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Clear all history.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.undo.len()
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.redo.len()
    }

    /// Maximum number of undo steps kept.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(200)
    }
}
