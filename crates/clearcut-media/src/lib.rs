//! ClearCut Media - the media backend boundary
//!
//! This crate handles:
//! - Media file probing through ffprobe
//! - Rendering export plans through ffmpeg
//! - Running exports on a worker thread with progress and cancellation

pub mod backend;
pub mod export;
pub mod probe;
pub mod worker;

pub use backend::{FfmpegBackend, MediaBackend};
pub use export::{
    AudioCodec, ExportCancel, ExportFormat, ExportJob, ExportProgress, ProgressParser, VideoCodec,
};
pub use probe::MediaProbe;
pub use worker::{spawn_export, ExportEvent, ExportHandle};
