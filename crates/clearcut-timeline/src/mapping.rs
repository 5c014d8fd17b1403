//! Coordinate mapping between timeline time and source time.
//!
//! Detected silences and markers are recorded against the original media.
//! After edits they must be re-projected onto the current sequence; a
//! position whose source material was cut away maps to `None`.

use clearcut_core::{TimeRange, TIME_EPSILON};
use serde::{Deserialize, Serialize};

use crate::segment::Segment;
use crate::timeline::Timeline;

/// A point inside a specific source file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePosition {
    /// `None` only when the timeline itself has no default source.
    pub source_file: Option<String>,
    pub time: f64,
}

/// A marker in timeline time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub time: f64,
}

/// A selected range in timeline time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub start: f64,
    pub end: f64,
}

/// Source anchors for both ends of a [`Selection`].
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionAnchor {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// Translates between timeline and source time for one timeline state.
///
/// Borrows the timeline, so a mapper can never be used across an edit.
#[derive(Debug)]
pub struct CoordinateMapper<'a> {
    timeline: &'a Timeline,
    spans: Vec<TimeRange>,
}

impl Timeline {
    /// Build a mapper for the current segment list.
    pub fn mapper(&self) -> CoordinateMapper<'_> {
        CoordinateMapper {
            timeline: self,
            spans: self.segment_spans().map(|(_, span)| span).collect(),
        }
    }
}

impl<'a> CoordinateMapper<'a> {
    /// Timeline position of a time in the default source, or `None` if that
    /// moment no longer exists in the edited output.
    pub fn source_to_timeline(&self, source_time: f64) -> Option<f64> {
        self.project(self.timeline.source_file(), source_time)
    }

    /// Timeline position of a time in an explicitly named source.
    pub fn source_to_timeline_in(&self, source_file: &str, source_time: f64) -> Option<f64> {
        self.project(Some(source_file), source_time)
    }

    /// Project a default-source range (e.g. a detected silence) onto the
    /// timeline.
    ///
    /// Returns one timeline range per segment still showing part of that
    /// material, in timeline order. Other files never contribute, even where
    /// they sit between the projected ends.
    pub fn source_range_to_timeline(&self, start: f64, end: f64) -> Vec<TimeRange> {
        let default = self.timeline.source_file();
        if default.is_none() {
            return Vec::new();
        }
        let wanted = TimeRange::new(start, end);
        self.segments()
            .filter(|(segment, _)| segment.effective_source(default) == default)
            .filter_map(|(segment, span)| {
                let hit = segment.source_range().intersection(wanted)?;
                let range = hit.offset(span.start - segment.start);
                (!range.is_empty()).then_some(range)
            })
            .collect()
    }

    /// Source position playing at `timeline_time`.
    ///
    /// A time on a boundary resolves to the segment that starts there; the
    /// very end of the timeline resolves to the last segment's out point.
    pub fn timeline_to_source(&self, timeline_time: f64) -> Option<SourcePosition> {
        self.locate(timeline_time, false)
    }

    /// Anchor a marker to the source position under it.
    pub fn anchor_marker(&self, marker: Marker) -> Option<SourcePosition> {
        self.timeline_to_source(marker.time)
    }

    /// Re-project previously anchored markers, dropping any whose source
    /// position was cut away.
    pub fn reproject_markers(&self, anchors: &[SourcePosition]) -> Vec<Marker> {
        anchors
            .iter()
            .filter_map(|anchor| self.reproject(anchor))
            .map(|time| Marker { time })
            .collect()
    }

    /// Anchor both ends of a selection. The end anchors to the material just
    /// before it, so a selection ending on a cut keeps its own content.
    pub fn anchor_selection(&self, selection: Selection) -> Option<SelectionAnchor> {
        Some(SelectionAnchor {
            start: self.locate(selection.start, false)?,
            end: self.locate(selection.end, true)?,
        })
    }

    /// Re-project an anchored selection; `None` if either end disappeared
    /// or the ends no longer enclose anything.
    pub fn reproject_selection(&self, anchor: &SelectionAnchor) -> Option<Selection> {
        let start = self.reproject(&anchor.start)?;
        let end = self.reproject(&anchor.end)?;
        (end - start >= TIME_EPSILON).then_some(Selection { start, end })
    }

    /// Timeline position of an anchored source position.
    pub fn reproject(&self, anchor: &SourcePosition) -> Option<f64> {
        self.project(anchor.source_file.as_deref(), anchor.time)
    }

    fn segments(&self) -> impl Iterator<Item = (&'a Segment, &TimeRange)> + '_ {
        self.timeline.segments().iter().zip(self.spans.iter())
    }

    /// Exact half-open containment first; only if that misses, accept a
    /// match within tolerance (inclusive end) and clamp into the span.
    fn project(&self, file: Option<&str>, source_time: f64) -> Option<f64> {
        if !source_time.is_finite() {
            return None;
        }
        let default = self.timeline.source_file();
        let from_file =
            |segment: &Segment| segment.effective_source(default) == file;

        let exact = self.segments().find(|&(segment, _)| {
            from_file(segment) && segment.source_range().contains(source_time)
        });
        let (segment, span) = match exact {
            Some(hit) => hit,
            None => self.segments().find(|&(segment, _)| {
                from_file(segment) && segment.source_range().contains_approx(source_time)
            })?,
        };
        let time = span.start + (source_time - segment.start);
        Some(time.clamp(span.start, span.end))
    }

    /// Find the source position at `timeline_time`. With `end_biased`, a
    /// time on a boundary belongs to the segment ending there.
    fn locate(&self, timeline_time: f64, end_biased: bool) -> Option<SourcePosition> {
        let total = self.spans.last().map_or(0.0, |span| span.end);
        if !timeline_time.is_finite()
            || timeline_time < -TIME_EPSILON
            || timeline_time > total + TIME_EPSILON
            || self.spans.is_empty()
        {
            return None;
        }
        let t = timeline_time.clamp(0.0, total);
        let default = self.timeline.source_file();

        let hit = self.segments().find(|&(_, span)| {
            if end_biased {
                t > span.start && t <= span.end
            } else {
                t >= span.start && t < span.end
            }
        });
        let (segment, span) = match hit {
            Some(hit) => hit,
            // Only the edges fall through: t == total, or t == 0 end-biased.
            None if end_biased => self.segments().next()?,
            None => self.segments().last()?,
        };
        Some(SourcePosition {
            source_file: segment.effective_source(default).map(String::from),
            time: segment.start + (t - span.start).clamp(0.0, segment.duration()),
        })
    }
}
