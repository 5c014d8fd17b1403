//! Segment type for the timeline.

use clearcut_core::{TimeRange, TIME_EPSILON};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{EditError, EditResult};

/// One contiguous slice of one source file.
///
/// `start` and `end` are in the source file's own time, half-open. Where the
/// slice plays in the output is decided only by its position in the
/// timeline's segment list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    /// Source in point (seconds)
    pub start: f64,
    /// Source out point (seconds, exclusive)
    pub end: f64,
    /// Source media; `None` means the timeline's default source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl Segment {
    /// Create a segment on the timeline's default source.
    pub fn new(start: f64, end: f64) -> EditResult<Self> {
        let segment = Self {
            start,
            end,
            source_file: None,
        };
        segment.validate()?;
        Ok(segment)
    }

    /// Create a segment on an explicit source file.
    pub fn with_source(start: f64, end: f64, source: impl Into<String>) -> EditResult<Self> {
        let mut segment = Self::new(start, end)?;
        segment.source_file = Some(source.into());
        Ok(segment)
    }

    /// Check `0 <= start < end` with finite bounds.
    pub fn validate(&self) -> EditResult<()> {
        if self.start.is_finite() && self.end.is_finite() && self.start >= 0.0 && self.start < self.end
        {
            Ok(())
        } else {
            Err(EditError::InvalidSegment {
                start: self.start,
                end: self.end,
            })
        }
    }

    /// Length of the slice in seconds.
    #[inline]
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Get the source time range.
    pub fn source_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }

    /// Source file this segment plays, falling back to the timeline default.
    pub fn effective_source<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.source_file.as_deref().or(default)
    }

    /// True when this segment plays from `file`, given the timeline default.
    pub fn is_from(&self, file: &str, default: Option<&str>) -> bool {
        self.effective_source(default) == Some(file)
    }

    /// Sub-slice covering `[from, to)` measured from the segment's own
    /// start (i.e. timeline-relative offsets inside this segment).
    ///
    /// Offsets within [`TIME_EPSILON`] of either edge snap to that edge.
    /// Returns `None` when the result would be shorter than the tolerance.
    pub fn slice(&self, from: f64, to: f64) -> Option<Self> {
        let from = snap_offset(from, self.duration());
        let to = snap_offset(to, self.duration());
        if to - from < TIME_EPSILON {
            return None;
        }
        Some(Self {
            start: self.start + from,
            end: self.start + to,
            source_file: self.source_file.clone(),
        })
    }

    /// Split at `offset` seconds from the segment start.
    ///
    /// An offset on (or within tolerance of) an edge leaves the segment
    /// whole, so no zero-length piece is ever produced.
    pub fn split_at(&self, offset: f64) -> SmallVec<[Self; 2]> {
        let duration = self.duration();
        let offset = snap_offset(offset, duration);
        let mut pieces = SmallVec::new();
        if offset <= 0.0 || offset >= duration {
            pieces.push(self.clone());
            return pieces;
        }
        pieces.extend(self.slice(0.0, offset));
        pieces.extend(self.slice(offset, duration));
        pieces
    }
}

/// Clamp `offset` into `[0, duration]`, snapping to an edge within tolerance.
fn snap_offset(offset: f64, duration: f64) -> f64 {
    if offset <= TIME_EPSILON {
        0.0
    } else if offset >= duration - TIME_EPSILON {
        duration
    } else {
        offset
    }
}
