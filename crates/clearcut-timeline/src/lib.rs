//! ClearCut Timeline - non-destructive editing model
//!
//! Implements the edit list behind an accessible video editor:
//! - Segments: source-file ranges laid end to end in playback order
//! - Ripple cut/copy/paste/delete/insert with snapshot undo/redo
//! - Per-context and cross-context clipboards
//! - Mapping between timeline time and source time
//! - Export plans and versioned project files

pub mod clipboard;
pub mod context;
pub mod edit;
pub mod error;
pub mod export;
pub mod mapping;
pub mod segment;
pub mod serialization;
pub mod timeline;

pub use clipboard::{Clipboard, ClipboardContent};
pub use context::{ContextId, ContextRegistry, EditState, EditingContext};
pub use edit::{History, TimelineSnapshot};
pub use error::{EditError, EditResult, HistoryDirection};
pub use export::{ExportPlan, ExportRange};
pub use mapping::{CoordinateMapper, Marker, Selection, SelectionAnchor, SourcePosition};
pub use segment::Segment;
pub use serialization::{ProjectFile, TimelineState, CURRENT_VERSION};
pub use timeline::Timeline;
