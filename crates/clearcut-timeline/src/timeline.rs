//! The editing timeline: an ordered list of source ranges laid end to end.

use clearcut_core::{approx_eq, TimeRange, TIME_EPSILON};
use tracing::debug;

use crate::clipboard::ClipboardContent;
use crate::edit::TimelineSnapshot;
use crate::error::{EditError, EditResult};
use crate::segment::Segment;

/// What the final video will contain.
///
/// Segment order is playback order, so a segment's position in timeline time
/// is the sum of the durations before it. Mutators are crate-private: edits
/// go through [`EditingContext`](crate::EditingContext), which records
/// history for each of them.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    segments: Vec<Segment>,
    source_file: Option<String>,
    source_duration: f64,
    /// Identifies the current content; restored along with snapshots.
    revision: u64,
    /// Revision at the last save/export.
    saved_revision: u64,
    next_revision: u64,
}

impl Timeline {
    /// Create an empty timeline with no source loaded.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a timeline covering the whole of a freshly opened file.
    pub fn with_source(path: impl Into<String>, duration: f64) -> EditResult<Self> {
        let mut timeline = Self::new();
        timeline.load_source(path, duration)?;
        Ok(timeline)
    }

    // ── Queries ────────────────────────────────────────────────

    /// Segments in playback order.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Default source for segments that do not name their own.
    pub fn source_file(&self) -> Option<&str> {
        self.source_file.as_deref()
    }

    /// Duration of the default source.
    pub fn source_duration(&self) -> f64 {
        self.source_duration
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// True when there are no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total output duration. Always recomputed from the segment list.
    pub fn total_duration(&self) -> f64 {
        self.segments.iter().map(Segment::duration).sum()
    }

    /// Get the timeline start time of the segment at the given index.
    pub fn segment_start_time(&self, index: usize) -> f64 {
        self.segments[..index.min(self.segments.len())]
            .iter()
            .map(Segment::duration)
            .sum()
    }

    /// Timeline-time span of every segment, in order.
    pub fn segment_spans(&self) -> impl Iterator<Item = (&Segment, TimeRange)> + '_ {
        let mut offset = 0.0;
        self.segments.iter().map(move |segment| {
            let span = TimeRange::new(offset, offset + segment.duration());
            offset = span.end;
            (segment, span)
        })
    }

    /// Find which segment plays at `time`. Returns (index, time_within_segment).
    pub fn segment_at_time(&self, time: f64) -> Option<(usize, f64)> {
        self.segment_spans()
            .enumerate()
            .find(|(_, (_, span))| span.contains(time))
            .map(|(i, (_, span))| (i, time - span.start))
    }

    /// True when the timeline is exactly the whole default source, unedited.
    pub fn is_whole_source(&self) -> bool {
        match self.segments.as_slice() {
            [only] => {
                self.source_file.is_some()
                    && only.effective_source(self.source_file()) == self.source_file()
                    && approx_eq(only.start, 0.0)
                    && approx_eq(only.end, self.source_duration)
            }
            _ => false,
        }
    }

    /// True when the content differs from the last save/export.
    pub fn has_changes(&self) -> bool {
        self.revision != self.saved_revision
    }

    /// Record that the current content has been saved or exported.
    pub fn mark_saved(&mut self) {
        self.saved_revision = self.revision;
    }

    /// Current content revision.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Copy the segments covering `[start, end)` without mutating anything.
    ///
    /// Every copied segment names its source explicitly, so the content can
    /// be pasted into a timeline with a different default source.
    pub fn copy_range(&self, start: f64, end: f64) -> EditResult<ClipboardContent> {
        let (start, end) = self.clamp_range(start, end)?;
        let mut segments = self.slice_range(start, end);
        if segments.is_empty() {
            return Err(EditError::NothingSelected { start, end });
        }
        if let Some(default) = &self.source_file {
            for segment in &mut segments {
                segment
                    .source_file
                    .get_or_insert_with(|| default.clone());
            }
        }
        Ok(ClipboardContent::new(self.source_file.clone(), segments))
    }

    // ── Mutations (crate-private, history is recorded by the caller) ──

    /// Replace the timeline with one whole-file segment of a new source.
    pub(crate) fn load_source(&mut self, path: impl Into<String>, duration: f64) -> EditResult<()> {
        let whole = Segment::new(0.0, duration)?;
        self.segments = vec![whole];
        self.source_file = Some(path.into());
        self.source_duration = duration;
        self.bump_revision();
        self.mark_saved();
        Ok(())
    }

    /// Drop everything and return to the empty state.
    pub(crate) fn reset(&mut self) {
        self.segments.clear();
        self.source_file = None;
        self.source_duration = 0.0;
        self.bump_revision();
        self.mark_saved();
    }

    /// Wholesale replacement from persisted state. The result is clean.
    pub(crate) fn restore_state(
        &mut self,
        segments: Vec<Segment>,
        source_file: Option<String>,
        source_duration: f64,
    ) -> EditResult<()> {
        if !source_duration.is_finite() || source_duration < 0.0 {
            return Err(EditError::InvalidSegment {
                start: 0.0,
                end: source_duration,
            });
        }
        for segment in &segments {
            segment.validate()?;
            check_source_bounds(segment, source_file.as_deref(), source_duration)?;
        }
        self.segments = segments;
        self.source_file = source_file;
        self.source_duration = source_duration;
        self.bump_revision();
        self.mark_saved();
        Ok(())
    }

    /// Ripple delete `[start, end)`. Returns the removed duration.
    pub(crate) fn delete_range(&mut self, start: f64, end: f64) -> EditResult<f64> {
        let (start, end) = self.clamp_range(start, end)?;
        let total = self.total_duration();

        let mut kept = self.slice_range(0.0, start);
        kept.extend(self.slice_range(end, total));

        let removed = total - kept.iter().map(Segment::duration).sum::<f64>();
        if removed < TIME_EPSILON {
            return Err(EditError::NothingSelected { start, end });
        }

        self.segments = kept;
        self.bump_revision();
        debug!(
            start,
            end,
            removed,
            segments = self.segments.len(),
            "Deleted range"
        );
        Ok(removed)
    }

    /// Ripple insert `content` at timeline position `at`.
    pub(crate) fn paste_content(&mut self, at: f64, content: &ClipboardContent) -> EditResult<()> {
        if content.is_empty() {
            return Err(EditError::ClipboardEmpty);
        }
        let resolved = content.resolved();
        let default = self.source_file.as_deref();
        let incoming = resolved
            .segments
            .into_iter()
            .map(|mut segment| {
                if segment.source_file.as_deref() == default {
                    segment.source_file = None;
                }
                segment
            })
            .collect();
        self.insert_segments(at, incoming)
    }

    /// Bodily insert one external segment at `position`.
    pub(crate) fn insert_segment_at_position(
        &mut self,
        position: f64,
        segment: Segment,
    ) -> EditResult<()> {
        self.insert_segments(position, vec![segment])
    }

    /// Splice `incoming` in at `at`, splitting the occupant segment.
    ///
    /// Segments away from `at` are left untouched.
    fn insert_segments(&mut self, at: f64, incoming: Vec<Segment>) -> EditResult<()> {
        let at = self.clamp_position(at)?;
        for segment in &incoming {
            segment.validate()?;
            check_source_bounds(segment, self.source_file(), self.source_duration)?;
        }
        let inserted: f64 = incoming.iter().map(Segment::duration).sum();

        let index = match self.segment_at_time(at) {
            None => self.segments.len(),
            Some((i, offset)) => {
                let pieces = self.segments[i].split_at(offset);
                if pieces.len() == 2 {
                    self.segments.splice(i..=i, pieces);
                    i + 1
                } else if offset <= self.segments[i].duration() / 2.0 {
                    i
                } else {
                    i + 1
                }
            }
        };
        self.segments.splice(index..index, incoming);
        self.bump_revision();
        debug!(
            at,
            inserted,
            segments = self.segments.len(),
            "Inserted segments"
        );
        Ok(())
    }

    /// Capture everything needed to restore the current state.
    pub(crate) fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            segments: self.segments.clone(),
            source_file: self.source_file.clone(),
            source_duration: self.source_duration,
            revision: self.revision,
        }
    }

    /// Restore a snapshot taken by [`snapshot`](Self::snapshot).
    pub(crate) fn apply_snapshot(&mut self, snapshot: TimelineSnapshot) {
        self.segments = snapshot.segments;
        self.source_file = snapshot.source_file;
        self.source_duration = snapshot.source_duration;
        self.revision = snapshot.revision;
    }

    // ── Helpers ────────────────────────────────────────────────

    fn bump_revision(&mut self) {
        self.next_revision += 1;
        self.revision = self.next_revision;
    }

    /// Validate a caller range against `[0, total]`, clamping ends that fall
    /// within tolerance outside it.
    fn clamp_range(&self, start: f64, end: f64) -> EditResult<(f64, f64)> {
        let total = self.total_duration();
        let invalid = EditError::InvalidRange { start, end, total };
        if !start.is_finite() || !end.is_finite() {
            return Err(invalid);
        }
        if start < -TIME_EPSILON || end > total + TIME_EPSILON {
            return Err(invalid);
        }
        let (start, end) = (start.max(0.0), end.min(total));
        if end - start < TIME_EPSILON {
            return Err(invalid);
        }
        Ok((start, end))
    }

    fn clamp_position(&self, at: f64) -> EditResult<f64> {
        let total = self.total_duration();
        if !at.is_finite() || at < -TIME_EPSILON || at > total + TIME_EPSILON {
            return Err(EditError::InvalidRange {
                start: at,
                end: at,
                total,
            });
        }
        Ok(at.clamp(0.0, total))
    }

    /// Segments (split at the edges) covering timeline `[start, end)`.
    ///
    /// Segments lying wholly inside the range are kept as they are; only
    /// the two edge segments are cut.
    fn slice_range(&self, start: f64, end: f64) -> Vec<Segment> {
        self.segment_spans()
            .filter(|(_, span)| span.end > start && span.start < end)
            .filter_map(|(segment, span)| {
                if span.start >= start && span.end <= end {
                    Some(segment.clone())
                } else {
                    segment.slice(start - span.start, end - span.start)
                }
            })
            .collect()
    }
}

/// Reject a default-source segment that reaches past the end of the source.
fn check_source_bounds(
    segment: &Segment,
    default: Option<&str>,
    source_duration: f64,
) -> EditResult<()> {
    if default.is_some()
        && segment.source_file.is_none()
        && segment.end > source_duration + TIME_EPSILON
    {
        return Err(EditError::InvalidSegment {
            start: segment.start,
            end: segment.end,
        });
    }
    Ok(())
}
