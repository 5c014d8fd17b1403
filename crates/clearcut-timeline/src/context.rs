//! Editing contexts and the registry that owns them.
//!
//! One context per open tab/project: a timeline, its history and a local
//! clipboard. Every mutating operation lives here so that it records exactly
//! one history entry, or none when it fails.

use std::fmt;

use clearcut_core::TimeRange;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::clipboard::{Clipboard, ClipboardContent};
use crate::edit::History;
use crate::error::{EditError, EditResult, HistoryDirection};
use crate::segment::Segment;
use crate::timeline::Timeline;

/// Lifecycle state of an editing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EditState {
    /// No source loaded.
    Empty,
    /// Content matches the last load/save/export.
    Loaded,
    /// Content has unsaved edits.
    Edited,
}

/// An independent timeline + history + local clipboard.
#[derive(Debug)]
pub struct EditingContext {
    /// Stable identity, written into project files.
    pub id: Uuid,
    /// Display name (tab title)
    pub name: String,
    timeline: Timeline,
    history: History,
    clipboard: Clipboard,
}

impl EditingContext {
    /// Create an empty context.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_history_depth(name, History::default().max_depth())
    }

    /// Create an empty context keeping at most `depth` undo steps.
    pub fn with_history_depth(name: impl Into<String>, depth: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            timeline: Timeline::new(),
            history: History::new(depth),
            clipboard: Clipboard::new(),
        }
    }

    /// Read access to the timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Read access to the history.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// The local clipboard.
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EditState {
        if self.timeline.is_empty() && self.timeline.source_file().is_none() {
            EditState::Empty
        } else if self.timeline.has_changes() {
            EditState::Edited
        } else {
            EditState::Loaded
        }
    }

    /// Record a successful save or export.
    pub fn mark_saved(&mut self) {
        self.timeline.mark_saved();
    }

    // ── Whole-timeline transitions (no history entry) ──────────

    /// Open a media file: one whole-file segment, fresh history.
    pub fn load_media(&mut self, path: impl Into<String>, duration: f64) -> EditResult<()> {
        let path = path.into();
        self.timeline.load_source(path.clone(), duration)?;
        self.history.clear();
        info!(context = %self.name, path = %path, duration, "Loaded media");
        Ok(())
    }

    /// New project: back to the empty state.
    pub fn reset(&mut self) {
        self.timeline.reset();
        self.history.clear();
        info!(context = %self.name, "Reset to empty project");
    }

    /// Wholesale replacement from a loaded project. The loaded state becomes
    /// the undo baseline.
    pub fn restore_state(
        &mut self,
        segments: Vec<Segment>,
        source_file: Option<String>,
        source_duration: f64,
    ) -> EditResult<()> {
        self.timeline
            .restore_state(segments, source_file, source_duration)?;
        self.history.clear();
        info!(
            context = %self.name,
            segments = self.timeline.segment_count(),
            "Restored timeline state"
        );
        Ok(())
    }

    // ── Editing operations ─────────────────────────────────────

    /// Copy `[start, end)` into the local clipboard. Returns the content so
    /// callers can publish it more widely.
    pub fn copy(&mut self, start: f64, end: f64) -> EditResult<ClipboardContent> {
        let content = self.timeline.copy_range(start, end).map_err(|e| {
            warn!(start, end, error = %e, "Copy rejected");
            e
        })?;
        self.clipboard.set(content.clone());
        debug!(start, end, duration = content.duration, "Copied range");
        Ok(content)
    }

    /// Copy then ripple-delete `[start, end)` as one undoable step.
    pub fn cut(&mut self, start: f64, end: f64) -> EditResult<ClipboardContent> {
        let content = self.copy(start, end)?;
        self.delete_range(start, end)?;
        Ok(content)
    }

    /// Ripple-delete `[start, end)`.
    pub fn delete_range(&mut self, start: f64, end: f64) -> EditResult<()> {
        self.record(|timeline| timeline.delete_range(start, end).map(|_| ()))
    }

    /// Paste the local clipboard at `at`.
    pub fn paste(&mut self, at: f64) -> EditResult<()> {
        self.paste_with_fallback(at, None)
    }

    /// Paste the local clipboard at `at`, or `fallback` when the local one is
    /// empty.
    pub fn paste_with_fallback(
        &mut self,
        at: f64,
        fallback: Option<&ClipboardContent>,
    ) -> EditResult<()> {
        let content = self
            .clipboard
            .resolve(fallback)
            .cloned()
            .ok_or_else(|| {
                warn!(at, "Paste rejected: clipboard is empty");
                EditError::ClipboardEmpty
            })?;
        self.record(|timeline| timeline.paste_content(at, &content))
    }

    /// Insert an external segment (e.g. another video) at `position`.
    pub fn insert_segment_at_position(&mut self, position: f64, segment: Segment) -> EditResult<()> {
        self.record(|timeline| timeline.insert_segment_at_position(position, segment))
    }

    /// Append an external segment at the end of the timeline.
    pub fn append_segment(&mut self, segment: Segment) -> EditResult<()> {
        let end = self.timeline.total_duration();
        self.insert_segment_at_position(end, segment)
    }

    /// Remove ranges given in default-source time (e.g. detected silences).
    ///
    /// Only default-source material inside each range is removed; a range
    /// split by an edit is removed piece by piece and material from other
    /// files between the pieces stays. Ranges that no longer exist in the
    /// edited output are skipped. All removals form a single undo step.
    /// Returns how many timeline ranges were removed.
    pub fn delete_source_ranges(&mut self, ranges: &[TimeRange]) -> EditResult<usize> {
        let mut projected: Vec<TimeRange> = {
            let mapper = self.timeline.mapper();
            ranges
                .iter()
                .flat_map(|r| mapper.source_range_to_timeline(r.start, r.end))
                .collect()
        };
        if projected.is_empty() {
            return Err(EditError::NothingSelected {
                start: ranges.first().map_or(0.0, |r| r.start),
                end: ranges.last().map_or(0.0, |r| r.end),
            });
        }
        // Back to front, so earlier positions stay valid.
        projected.sort_by(|a, b| b.start.total_cmp(&a.start));

        let count = projected.len();
        self.record(|timeline| {
            let mut removed = 0;
            let mut floor = f64::INFINITY;
            for range in &projected {
                // Overlapping projections: only the part before what was
                // already removed is still addressable.
                let end = range.end.min(floor);
                if timeline.delete_range(range.start, end).is_ok() {
                    removed += 1;
                }
                floor = floor.min(range.start);
            }
            if removed == 0 {
                Err(EditError::NothingSelected {
                    start: projected[count - 1].start,
                    end: projected[0].end,
                })
            } else {
                Ok(removed)
            }
        })
    }

    /// Step back one edit.
    pub fn undo(&mut self) -> EditResult<()> {
        let restored = self
            .history
            .undo(self.timeline.snapshot())
            .ok_or(EditError::HistoryExhausted(HistoryDirection::Undo))?;
        self.timeline.apply_snapshot(restored);
        debug!(undo_left = self.history.undo_count(), "Undo");
        Ok(())
    }

    /// Re-apply the last undone edit.
    pub fn redo(&mut self) -> EditResult<()> {
        let restored = self
            .history
            .redo(self.timeline.snapshot())
            .ok_or(EditError::HistoryExhausted(HistoryDirection::Redo))?;
        self.timeline.apply_snapshot(restored);
        debug!(redo_left = self.history.redo_count(), "Redo");
        Ok(())
    }

    /// Run `edit`; on success push the pre-edit snapshot, on failure put it
    /// back so the edit leaves no trace.
    fn record<T>(&mut self, edit: impl FnOnce(&mut Timeline) -> EditResult<T>) -> EditResult<T> {
        let before = self.timeline.snapshot();
        match edit(&mut self.timeline) {
            Ok(value) => {
                self.history.push(before);
                Ok(value)
            }
            Err(e) => {
                self.timeline.apply_snapshot(before);
                warn!(context = %self.name, error = %e, "Edit rejected");
                Err(e)
            }
        }
    }
}

// ── Registry ────────────────────────────────────────────────────

/// Index of a context inside a [`ContextRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContextId(usize);

impl ContextId {
    /// Raw slot index.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ContextId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Arena of open editing contexts plus the cross-context clipboard.
#[derive(Debug)]
pub struct ContextRegistry {
    slots: Vec<Option<EditingContext>>,
    active: Option<ContextId>,
    clipboard: Clipboard,
    history_depth: usize,
}

impl ContextRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::with_history_depth(History::default().max_depth())
    }

    /// Create a registry whose contexts keep at most `depth` undo steps.
    pub fn with_history_depth(depth: usize) -> Self {
        Self {
            slots: Vec::new(),
            active: None,
            clipboard: Clipboard::new(),
            history_depth: depth,
        }
    }

    /// Open a new empty context and make it active.
    pub fn open(&mut self, name: impl Into<String>) -> ContextId {
        let context = EditingContext::with_history_depth(name, self.history_depth);
        self.insert(context)
    }

    /// Adopt an existing context and make it active.
    pub fn insert(&mut self, context: EditingContext) -> ContextId {
        // Slots are never reused, so a closed id stays dead.
        let id = ContextId(self.slots.len());
        info!(context = %context.name, id = %id, "Opened editing context");
        self.slots.push(Some(context));
        self.active = Some(id);
        id
    }

    /// Close a context and return it.
    pub fn close(&mut self, id: ContextId) -> EditResult<EditingContext> {
        let context = self
            .slots
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EditError::UnknownContext(id))?;
        if self.active == Some(id) {
            self.active = self.ids().last();
        }
        info!(context = %context.name, id = %id, "Closed editing context");
        Ok(context)
    }

    /// Look up a context.
    pub fn get(&self, id: ContextId) -> EditResult<&EditingContext> {
        self.slots
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(EditError::UnknownContext(id))
    }

    /// Look up a context mutably.
    pub fn get_mut(&mut self, id: ContextId) -> EditResult<&mut EditingContext> {
        self.slots
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(EditError::UnknownContext(id))
    }

    /// Ids of all open contexts in opening order.
    pub fn ids(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| ContextId(i))
    }

    /// All open contexts.
    pub fn iter(&self) -> impl Iterator<Item = (ContextId, &EditingContext)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|c| (ContextId(i), c)))
    }

    /// Number of open contexts.
    pub fn len(&self) -> usize {
        self.ids().count()
    }

    /// True when no context is open.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Switch the active context.
    pub fn set_active(&mut self, id: ContextId) -> EditResult<()> {
        self.get(id)?;
        self.active = Some(id);
        Ok(())
    }

    /// Id of the active context.
    pub fn active_id(&self) -> Option<ContextId> {
        self.active
    }

    /// The active context.
    pub fn active(&self) -> Option<&EditingContext> {
        self.active.and_then(|id| self.get(id).ok())
    }

    /// The active context, mutably.
    pub fn active_mut(&mut self) -> Option<&mut EditingContext> {
        let id = self.active?;
        self.get_mut(id).ok()
    }

    /// The cross-context clipboard.
    pub fn clipboard(&self) -> &Clipboard {
        &self.clipboard
    }

    /// Copy in context `id`, publishing to the global clipboard.
    pub fn copy(&mut self, id: ContextId, start: f64, end: f64) -> EditResult<()> {
        let content = self.get_mut(id)?.copy(start, end)?;
        self.clipboard.set(content);
        Ok(())
    }

    /// Cut in context `id`, publishing to the global clipboard.
    pub fn cut(&mut self, id: ContextId, start: f64, end: f64) -> EditResult<()> {
        let content = self.get_mut(id)?.cut(start, end)?;
        self.clipboard.set(content);
        Ok(())
    }

    /// Paste into context `id`, falling back to the global clipboard when
    /// the context has never copied anything itself.
    pub fn paste(&mut self, id: ContextId, at: f64) -> EditResult<()> {
        let fallback = self.clipboard.content().cloned();
        self.get_mut(id)?
            .paste_with_fallback(at, fallback.as_ref())
    }
}

impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}
