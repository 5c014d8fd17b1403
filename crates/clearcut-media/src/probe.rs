//! Media file probing to get metadata without full decode.

use clearcut_core::{ClearCutError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Information about a media file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaProbe {
    /// File path
    pub path: String,
    /// Duration in seconds
    pub duration: f64,
    /// Container format
    pub format: String,
    /// Codec names of the video streams
    pub video_streams: Vec<String>,
    /// Codec names of the audio streams
    pub audio_streams: Vec<String>,
}

// Subset of `ffprobe -of json -show_format -show_streams`.

#[derive(Deserialize)]
struct FfprobeOutput {
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    codec_name: Option<String>,
}

impl MediaProbe {
    /// Probe a media file by running `ffprobe`.
    pub fn probe<P: AsRef<Path>>(ffprobe: &Path, path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        // Check if file exists
        if !path.exists() {
            return Err(ClearCutError::NotFound(format!(
                "File not found: {}",
                path_str
            )));
        }

        let output = Command::new(ffprobe)
            .args(["-v", "error", "-show_format", "-show_streams", "-of", "json"])
            .arg(path)
            .output()
            .map_err(|e| ClearCutError::Media(format!("Failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(ClearCutError::Media(format!(
                "ffprobe failed on {}: {}",
                path_str,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let probe = Self::from_ffprobe_json(path_str, &output.stdout)?;
        debug!(path = %probe.path, duration = probe.duration, "Probed media");
        Ok(probe)
    }

    /// Parse ffprobe's JSON report.
    pub fn from_ffprobe_json(path: impl Into<String>, json: &[u8]) -> Result<Self> {
        let path = path.into();
        let parsed: FfprobeOutput = serde_json::from_slice(json)
            .map_err(|e| ClearCutError::Media(format!("Unreadable ffprobe output: {e}")))?;

        let format = parsed
            .format
            .ok_or_else(|| ClearCutError::Media(format!("No container info for {}", path)))?;

        let duration = format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d > 0.0)
            .ok_or_else(|| ClearCutError::Media(format!("Unknown duration for {}", path)))?;

        let mut video_streams = Vec::new();
        let mut audio_streams = Vec::new();
        for stream in parsed.streams {
            let codec = stream.codec_name.unwrap_or_default();
            match stream.codec_type.as_deref() {
                Some("video") => video_streams.push(codec),
                Some("audio") => audio_streams.push(codec),
                _ => {}
            }
        }

        Ok(Self {
            path,
            duration,
            format: format.format_name.unwrap_or_default(),
            video_streams,
            audio_streams,
        })
    }

    /// Check if the file has video.
    pub fn has_video(&self) -> bool {
        !self.video_streams.is_empty()
    }

    /// Check if the file has audio.
    pub fn has_audio(&self) -> bool {
        !self.audio_streams.is_empty()
    }
}
