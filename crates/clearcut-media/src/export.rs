//! Export jobs: turn an [`ExportPlan`] into an ffmpeg invocation.
//!
//! An unedited single-file plan is stream-copied. Anything else is trimmed
//! per range and joined with a `concat` filter graph. Progress is read from
//! ffmpeg's `-progress pipe:1` key/value stream.

use clearcut_core::{ClearCutError, Result};
use clearcut_timeline::{ExportPlan, Timeline};
use crossbeam_channel::{unbounded, RecvTimeoutError};
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

// ── Format presets ──────────────────────────────────────────────

/// Video codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    H265,
    Vp9,
}

impl VideoCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::H264 => "libx264",
            Self::H265 => "libx265",
            Self::Vp9 => "libvpx-vp9",
        }
    }

    /// File extension for this codec.
    pub fn extension(self) -> &'static str {
        match self {
            Self::H264 | Self::H265 => "mp4",
            Self::Vp9 => "webm",
        }
    }
}

/// Audio codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioCodec {
    Aac,
    Opus,
}

impl AudioCodec {
    /// FFmpeg encoder name.
    pub fn ffmpeg_encoder(self) -> &'static str {
        match self {
            Self::Aac => "aac",
            Self::Opus => "libopus",
        }
    }
}

/// Encoder settings used when a plan has to be re-encoded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportFormat {
    pub video_codec: VideoCodec,
    pub audio_codec: AudioCodec,
    /// CRF value (lower = better).
    pub crf: Option<u32>,
    /// Audio bitrate in kbps.
    pub audio_bitrate: u32,
    /// Whether the sources carry an audio stream worth keeping.
    pub audio: bool,
}

impl ExportFormat {
    /// H.264 + AAC in MP4.
    pub fn h264() -> Self {
        Self {
            video_codec: VideoCodec::H264,
            audio_codec: AudioCodec::Aac,
            crf: Some(18),
            audio_bitrate: 192,
            audio: true,
        }
    }

    /// Web-optimized VP9 + Opus.
    pub fn vp9_web() -> Self {
        Self {
            video_codec: VideoCodec::Vp9,
            audio_codec: AudioCodec::Opus,
            crf: Some(30),
            audio_bitrate: 128,
            audio: true,
        }
    }
}

impl Default for ExportFormat {
    fn default() -> Self {
        Self::h264()
    }
}

// ── Progress & cancellation ─────────────────────────────────────

/// Export progress information.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportProgress {
    /// Seconds of output written so far.
    pub out_time: f64,
    /// Expected output duration in seconds.
    pub total: f64,
    /// Encoding speed relative to realtime, when ffmpeg reports one.
    pub speed: Option<f64>,
}

impl ExportProgress {
    /// Completion fraction (0.0 to 1.0).
    pub fn fraction(&self) -> f64 {
        if self.total <= 0.0 {
            return 0.0;
        }
        (self.out_time / self.total).clamp(0.0, 1.0)
    }
}

/// Accumulates ffmpeg `-progress` lines into [`ExportProgress`] reports.
///
/// ffmpeg emits one block of `key=value` lines per tick, closed by a
/// `progress=continue` or `progress=end` line.
#[derive(Debug, Clone)]
pub struct ProgressParser {
    current: ExportProgress,
}

impl ProgressParser {
    pub fn new(total: f64) -> Self {
        Self {
            current: ExportProgress {
                out_time: 0.0,
                total,
                speed: None,
            },
        }
    }

    /// Feed one line; returns a report when a block completes.
    pub fn feed(&mut self, line: &str) -> Option<ExportProgress> {
        let (key, value) = line.trim().split_once('=')?;
        let value = value.trim();
        match key {
            // Both keys carry microseconds.
            "out_time_us" | "out_time_ms" => {
                if let Ok(us) = value.parse::<i64>() {
                    self.current.out_time = us.max(0) as f64 / 1_000_000.0;
                }
            }
            "speed" => {
                self.current.speed = value.trim_end_matches('x').trim().parse().ok();
            }
            "progress" => {
                if value == "end" {
                    self.current.out_time = self.current.total;
                }
                return Some(self.current);
            }
            _ => {}
        }
        None
    }
}

/// Handle for cancelling an in-progress export.
#[derive(Debug, Clone)]
pub struct ExportCancel(Arc<AtomicBool>);

impl ExportCancel {
    /// Create a new cancel handle.
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Signal cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Check if cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

impl Default for ExportCancel {
    fn default() -> Self {
        Self::new()
    }
}

/// How often a running export checks its cancel flag.
pub const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(100);

// ── Export job ───────────────────────────────────────────────────

/// An export job: what to render, where, and how.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportJob {
    /// Output file path.
    pub output_path: PathBuf,
    /// Export format.
    pub format: ExportFormat,
    /// Ranges to render, in output order.
    pub plan: ExportPlan,
    /// Copy streams instead of re-encoding.
    pub stream_copy: bool,
}

impl ExportJob {
    /// Create a job that re-encodes `plan`.
    pub fn new(plan: ExportPlan, output_path: impl Into<PathBuf>, format: ExportFormat) -> Self {
        Self {
            output_path: output_path.into(),
            format,
            plan,
            stream_copy: false,
        }
    }

    /// Snapshot `timeline` into a job, stream-copying an unedited file.
    pub fn from_timeline(
        timeline: &Timeline,
        output_path: impl Into<PathBuf>,
        format: ExportFormat,
    ) -> Result<Self> {
        let plan = timeline.export_plan()?;
        let stream_copy = timeline
            .source_file()
            .is_some_and(|source| plan.is_passthrough(source, timeline.source_duration()));
        Ok(Self {
            stream_copy,
            ..Self::new(plan, output_path, format)
        })
    }

    /// Expected output duration in seconds.
    pub fn total_duration(&self) -> f64 {
        self.plan.total_duration()
    }

    /// Build the FFmpeg command arguments.
    pub fn ffmpeg_args(&self) -> Vec<String> {
        let mut args: Vec<String> = vec!["-y".into(), "-nostdin".into()];

        if self.stream_copy {
            if let Some(source) = self.plan.sources().first() {
                args.extend_from_slice(&["-i".into(), (*source).to_string()]);
            }
            args.extend_from_slice(&["-c".into(), "copy".into()]);
        } else {
            let sources = self.plan.sources();
            for source in &sources {
                args.extend_from_slice(&["-i".into(), (*source).to_string()]);
            }
            args.extend_from_slice(&["-filter_complex".into(), self.filter_graph(&sources)]);
            args.extend_from_slice(&["-map".into(), "[outv]".into()]);
            if self.format.audio {
                args.extend_from_slice(&["-map".into(), "[outa]".into()]);
            }

            args.extend_from_slice(&[
                "-c:v".into(),
                self.format.video_codec.ffmpeg_encoder().into(),
            ]);
            if let Some(crf) = self.format.crf {
                args.extend_from_slice(&["-crf".into(), crf.to_string()]);
            }
            args.extend_from_slice(&["-pix_fmt".into(), "yuv420p".into()]);

            if self.format.audio {
                args.extend_from_slice(&[
                    "-c:a".into(),
                    self.format.audio_codec.ffmpeg_encoder().into(),
                    "-b:a".into(),
                    format!("{}k", self.format.audio_bitrate),
                ]);
            }
        }

        args.extend_from_slice(&["-progress".into(), "pipe:1".into(), "-nostats".into()]);

        // Output
        args.push(self.output_path.to_string_lossy().into_owned());

        args
    }

    /// `trim`/`atrim` every range out of its input, then `concat` them.
    fn filter_graph(&self, sources: &[&str]) -> String {
        let mut graph = String::new();
        let mut pads = String::new();

        for (i, range) in self.plan.ranges.iter().enumerate() {
            let input = sources
                .iter()
                .position(|s| *s == range.source_file)
                .unwrap_or(0);
            graph.push_str(&format!(
                "[{input}:v]trim=start={:.3}:end={:.3},setpts=PTS-STARTPTS[v{i}];",
                range.start, range.end
            ));
            pads.push_str(&format!("[v{i}]"));
            if self.format.audio {
                graph.push_str(&format!(
                    "[{input}:a]atrim=start={:.3}:end={:.3},asetpts=PTS-STARTPTS[a{i}];",
                    range.start, range.end
                ));
                pads.push_str(&format!("[a{i}]"));
            }
        }

        let audio_streams = u8::from(self.format.audio);
        graph.push_str(&pads);
        graph.push_str(&format!(
            "concat=n={}:v=1:a={}[outv]",
            self.plan.ranges.len(),
            audio_streams
        ));
        if self.format.audio {
            graph.push_str("[outa]");
        }
        graph
    }

    /// Run the export through the `ffmpeg` binary at `ffmpeg`.
    ///
    /// * `on_progress` – called once per ffmpeg progress block.
    /// * `cancel` – polled every [`CANCEL_POLL_INTERVAL`] whether or not
    ///   ffmpeg is writing; if set, ffmpeg is killed.
    pub fn run(
        &self,
        ffmpeg: &Path,
        on_progress: &mut dyn FnMut(ExportProgress),
        cancel: &ExportCancel,
    ) -> Result<()> {
        let args = self.ffmpeg_args();
        info!(
            output = %self.output_path.display(),
            ranges = self.plan.ranges.len(),
            stream_copy = self.stream_copy,
            "Starting export"
        );
        debug!(?args, "ffmpeg arguments");

        let mut child = Command::new(ffmpeg)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ClearCutError::Encoder(format!("Failed to spawn ffmpeg: {e}")))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ClearCutError::Encoder("Failed to open ffmpeg stdout".into()))?;

        // Read stdout off-thread; cancel is polled between lines and timeouts.
        let (tx, rx) = unbounded();
        let reader = thread::Builder::new()
            .name("clearcut-ffmpeg-progress".into())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });
        let reader = match reader {
            Ok(reader) => reader,
            Err(e) => {
                stop(&mut child);
                return Err(e.into());
            }
        };

        let mut parser = ProgressParser::new(self.total_duration());
        loop {
            if cancel.is_cancelled() {
                stop(&mut child);
                warn!(output = %self.output_path.display(), "Export cancelled");
                return Err(ClearCutError::Cancelled);
            }
            match rx.recv_timeout(CANCEL_POLL_INTERVAL) {
                Ok(Ok(line)) => {
                    if let Some(progress) = parser.feed(&line) {
                        on_progress(progress);
                    }
                }
                Ok(Err(e)) => {
                    stop(&mut child);
                    return Err(e.into());
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        let _ = reader.join();

        let status = child
            .wait()
            .map_err(|e| ClearCutError::Encoder(format!("Failed to wait for ffmpeg: {e}")))?;

        if cancel.is_cancelled() {
            return Err(ClearCutError::Cancelled);
        }
        if !status.success() {
            return Err(ClearCutError::Encoder(format!(
                "ffmpeg exited with status: {}",
                status
            )));
        }

        info!(output = %self.output_path.display(), "Export finished");
        Ok(())
    }
}

/// Kill ffmpeg and reap it.
fn stop(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
