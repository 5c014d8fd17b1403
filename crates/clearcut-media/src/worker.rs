//! Background export worker.
//!
//! The job is owned by the worker thread, so the caller may keep editing
//! its timeline while the export runs.

use clearcut_core::{ClearCutError, Result};
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{error, info};

use crate::backend::MediaBackend;
use crate::export::{ExportCancel, ExportJob, ExportProgress};

/// Messages sent from the worker thread.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    Progress(ExportProgress),
    Finished,
    Cancelled,
    Failed(String),
}

impl ExportEvent {
    /// True for the last event a worker sends.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Progress(_))
    }
}

/// Handle to a running export.
pub struct ExportHandle {
    events: Receiver<ExportEvent>,
    cancel: ExportCancel,
    thread: Option<JoinHandle<()>>,
}

impl ExportHandle {
    /// Receiver for progress and completion events.
    pub fn events(&self) -> &Receiver<ExportEvent> {
        &self.events
    }

    /// Ask the backend to stop.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the export ends, forwarding progress to `on_progress`.
    pub fn wait(mut self, mut on_progress: impl FnMut(ExportProgress)) -> Result<()> {
        let outcome = loop {
            match self.events.recv_timeout(Duration::from_millis(250)) {
                Ok(ExportEvent::Progress(progress)) => on_progress(progress),
                Ok(ExportEvent::Finished) => break Ok(()),
                Ok(ExportEvent::Cancelled) => break Err(ClearCutError::Cancelled),
                Ok(ExportEvent::Failed(message)) => break Err(ClearCutError::Encoder(message)),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    break Err(ClearCutError::Encoder(
                        "Export worker stopped without reporting".into(),
                    ))
                }
            }
        };
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
        outcome
    }
}

/// Run `job` on `backend` in a new thread.
pub fn spawn_export(backend: Arc<dyn MediaBackend>, job: ExportJob) -> Result<ExportHandle> {
    let (tx, rx) = unbounded();
    let cancel = ExportCancel::new();
    let worker_cancel = cancel.clone();

    let thread = thread::Builder::new()
        .name("clearcut-export".into())
        .spawn(move || {
            let progress_tx = tx.clone();
            let result = backend.export(
                &job,
                &mut |progress| {
                    let _ = progress_tx.send(ExportEvent::Progress(progress));
                },
                &worker_cancel,
            );
            let event = match result {
                Ok(()) => {
                    info!(output = %job.output_path.display(), "Export complete");
                    ExportEvent::Finished
                }
                Err(ClearCutError::Cancelled) => ExportEvent::Cancelled,
                Err(e) => {
                    error!(output = %job.output_path.display(), error = %e, "Export failed");
                    ExportEvent::Failed(e.to_string())
                }
            };
            let _ = tx.send(event);
        })?;

    Ok(ExportHandle {
        events: rx,
        cancel,
        thread: Some(thread),
    })
}
