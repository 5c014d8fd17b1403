//! The media backend boundary.
//!
//! The timeline never touches media bytes; it asks a [`MediaBackend`] for
//! durations and hands it finished [`ExportJob`]s.

use clearcut_core::Result;
use std::path::{Path, PathBuf};

use crate::export::{ExportCancel, ExportJob, ExportProgress};
use crate::probe::MediaProbe;

/// Decoding/encoding service used by the editor.
pub trait MediaBackend: Send + Sync {
    /// Duration of a media file in seconds.
    fn probe_duration(&self, path: &Path) -> Result<f64>;

    /// Render `job`, reporting progress until done, failed or cancelled.
    fn export(
        &self,
        job: &ExportJob,
        on_progress: &mut dyn FnMut(ExportProgress),
        cancel: &ExportCancel,
    ) -> Result<()>;
}

/// Backend that shells out to the `ffmpeg` and `ffprobe` binaries.
#[derive(Debug, Clone)]
pub struct FfmpegBackend {
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
}

impl FfmpegBackend {
    pub fn new(ffmpeg_path: impl Into<PathBuf>, ffprobe_path: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg_path: ffmpeg_path.into(),
            ffprobe_path: ffprobe_path.into(),
        }
    }

    /// Full probe report for `path`.
    pub fn probe(&self, path: &Path) -> Result<MediaProbe> {
        MediaProbe::probe(&self.ffprobe_path, path)
    }
}

impl Default for FfmpegBackend {
    /// Binaries resolved through `PATH`.
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

impl MediaBackend for FfmpegBackend {
    fn probe_duration(&self, path: &Path) -> Result<f64> {
        Ok(self.probe(path)?.duration)
    }

    fn export(
        &self,
        job: &ExportJob,
        on_progress: &mut dyn FnMut(ExportProgress),
        cancel: &ExportCancel,
    ) -> Result<()> {
        job.run(&self.ffmpeg_path, on_progress, cancel)
    }
}
