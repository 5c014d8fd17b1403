//! Integration tests for handing edited timelines to the media backend.

use clearcut_core::{ClearCutError, Result};
use clearcut_media::{
    spawn_export, ExportCancel, ExportEvent, ExportFormat, ExportJob, ExportProgress, MediaBackend,
};
use clearcut_timeline::{EditingContext, Segment};
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Records the jobs it is given and reports completion immediately.
#[derive(Default)]
struct RecordingBackend {
    jobs: Mutex<Vec<ExportJob>>,
}

impl MediaBackend for RecordingBackend {
    fn probe_duration(&self, path: &Path) -> Result<f64> {
        match path.to_str() {
            Some("talk.mp4") => Ok(100.0),
            _ => Err(ClearCutError::NotFound(path.display().to_string())),
        }
    }

    fn export(
        &self,
        job: &ExportJob,
        on_progress: &mut dyn FnMut(ExportProgress),
        _cancel: &ExportCancel,
    ) -> Result<()> {
        on_progress(ExportProgress {
            out_time: job.total_duration(),
            total: job.total_duration(),
            speed: Some(4.0),
        });
        if let Ok(mut jobs) = self.jobs.lock() {
            jobs.push(job.clone());
        }
        Ok(())
    }
}

fn edited() -> EditingContext {
    let backend = RecordingBackend::default();
    let duration = backend.probe_duration(Path::new("talk.mp4")).unwrap();

    let mut ctx = EditingContext::new("export");
    ctx.load_media("talk.mp4", duration).unwrap();
    ctx.cut(30.0, 40.0).unwrap();
    ctx.append_segment(Segment::with_source(2.0, 7.0, "outro.mp4").unwrap())
        .unwrap();
    ctx
}

#[test]
fn export_sees_the_state_at_call_time() {
    let mut ctx = edited();
    let job = ExportJob::from_timeline(ctx.timeline(), "/tmp/out.mp4", ExportFormat::default())
        .unwrap();

    let backend = Arc::new(RecordingBackend::default());
    let handle = spawn_export(backend.clone(), job).unwrap();

    // Keep editing while the worker runs.
    ctx.delete_range(0.0, 50.0).unwrap();

    handle.wait(|_| {}).unwrap();
    let jobs = backend.jobs.lock().unwrap();
    let ranges: Vec<(&str, f64, f64)> = jobs[0]
        .plan
        .ranges
        .iter()
        .map(|r| (r.source_file.as_str(), r.start, r.end))
        .collect();
    assert_eq!(
        ranges,
        vec![
            ("talk.mp4", 0.0, 30.0),
            ("talk.mp4", 40.0, 100.0),
            ("outro.mp4", 2.0, 7.0),
        ]
    );
    assert_eq!(ctx.timeline().total_duration(), 45.0);
}

#[test]
fn worker_reports_progress_before_finishing() {
    let job = ExportJob::from_timeline(edited().timeline(), "/tmp/out.mp4", ExportFormat::default())
        .unwrap();
    let handle = spawn_export(Arc::new(RecordingBackend::default()), job).unwrap();

    let events: Vec<ExportEvent> = handle.events().iter().collect();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], ExportEvent::Progress(p) if p.fraction() == 1.0));
    assert_eq!(events[1], ExportEvent::Finished);
}

#[test]
fn unedited_and_restored_timelines_stream_copy() {
    let mut ctx = edited();
    while ctx.undo().is_ok() {}

    let job = ExportJob::from_timeline(ctx.timeline(), "/tmp/out.mp4", ExportFormat::default())
        .unwrap();
    assert!(job.stream_copy);
    assert_eq!(job.ffmpeg_args()[..4], ["-y", "-nostdin", "-i", "talk.mp4"]);
}

#[test]
fn empty_timeline_cannot_be_exported() {
    let ctx = EditingContext::new("empty");
    let err = ExportJob::from_timeline(ctx.timeline(), "/tmp/out.mp4", ExportFormat::default())
        .unwrap_err();
    assert!(matches!(err, ClearCutError::Timeline(_)));
}

#[test]
fn whole_foreign_clip_is_reencoded() {
    let mut ctx = EditingContext::new("swap");
    ctx.load_media("talk.mp4", 100.0).unwrap();
    ctx.insert_segment_at_position(0.0, Segment::with_source(0.0, 100.0, "other.mp4").unwrap())
        .unwrap();
    ctx.delete_range(100.0, 200.0).unwrap();

    let job = ExportJob::from_timeline(ctx.timeline(), "/tmp/out.mp4", ExportFormat::default())
        .unwrap();
    assert!(!job.stream_copy);
    assert_eq!(job.plan.sources(), vec!["other.mp4"]);
    assert!(job.ffmpeg_args().contains(&"-filter_complex".to_string()));
}
