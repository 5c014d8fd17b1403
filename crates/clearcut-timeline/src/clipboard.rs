//! Clipboard for cut/copy/paste.
//!
//! Each editing context owns a local clipboard; the
//! [`ContextRegistry`](crate::ContextRegistry) keeps one more at global
//! scope so content copied in one context can be pasted into another.

use serde::{Deserialize, Serialize};

use crate::segment::Segment;

/// The result of a cut or copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClipboardContent {
    /// Default source of the timeline the content was copied from.
    pub source_file: Option<String>,
    /// Copied segments in playback order.
    pub segments: Vec<Segment>,
    /// Sum of the segment durations.
    pub duration: f64,
}

impl ClipboardContent {
    /// Build clipboard content, computing its duration.
    pub fn new(source_file: Option<String>, segments: Vec<Segment>) -> Self {
        let duration = segments.iter().map(Segment::duration).sum();
        Self {
            source_file,
            segments,
            duration,
        }
    }

    /// True when there is nothing to paste.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Copy with every segment naming its source.
    ///
    /// Segments without an explicit source inherit the originating
    /// timeline's default, so a different timeline never mistakes them for
    /// its own default source.
    pub fn resolved(&self) -> Self {
        let segments = self
            .segments
            .iter()
            .cloned()
            .map(|mut segment| {
                if segment.source_file.is_none() {
                    segment.source_file = self.source_file.clone();
                }
                segment
            })
            .collect();
        Self {
            source_file: self.source_file.clone(),
            segments,
            duration: self.duration,
        }
    }
}

/// A single clipboard slot.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    content: Option<ClipboardContent>,
}

impl Clipboard {
    /// Create an empty clipboard.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the clipboard.
    pub fn set(&mut self, content: ClipboardContent) {
        self.content = Some(content);
    }

    /// Current content, if any.
    pub fn content(&self) -> Option<&ClipboardContent> {
        self.content.as_ref().filter(|c| !c.is_empty())
    }

    /// True when there is nothing to paste.
    pub fn is_empty(&self) -> bool {
        self.content().is_none()
    }

    /// Empty the clipboard.
    pub fn clear(&mut self) {
        self.content = None;
    }

    /// Pick the content to paste: this clipboard first, then `fallback`
    /// (the global clipboard).
    pub fn resolve<'a>(
        &'a self,
        fallback: Option<&'a ClipboardContent>,
    ) -> Option<&'a ClipboardContent> {
        self.content()
            .or_else(|| fallback.filter(|c| !c.is_empty()))
    }
}
