//! User settings, stored as JSON in the platform config directory.

use clearcut_core::{ClearCutError, Result};
use clearcut_media::{ExportFormat, FfmpegBackend};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Undo steps kept per context.
    pub history_depth: usize,
    pub ffmpeg_path: PathBuf,
    pub ffprobe_path: PathBuf,
    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Encoder settings for re-encoded exports.
    pub export: ExportFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            history_depth: 200,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            ffprobe_path: PathBuf::from("ffprobe"),
            log_filter: "info".to_string(),
            export: ExportFormat::default(),
        }
    }
}

impl Settings {
    /// `<config dir>/clearcut/settings.json`, if the platform has one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("clearcut").join("settings.json"))
    }

    /// Load from `explicit`, or from the default location.
    ///
    /// A missing default file yields defaults; a missing explicit file is
    /// an error.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ClearCutError::Config(format!(
                        "Settings file not found: {}",
                        path.display()
                    )));
                }
                Self::load_from_file(path)
            }
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Parse a settings file.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let settings: Self = serde_json::from_slice(&data).map_err(|e| {
            ClearCutError::Config(format!("Malformed settings {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Write settings, creating the parent directory.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| ClearCutError::Config(format!("Failed to serialize settings: {}", e)))?;
        std::fs::write(path, data)?;
        Ok(())
    }

    /// Media backend configured from these settings.
    pub fn backend(&self) -> FfmpegBackend {
        FfmpegBackend::new(&self.ffmpeg_path, &self.ffprobe_path)
    }
}
