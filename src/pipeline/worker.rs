use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use super::{RenderJob, RenderOutcome, run_preview_job};
use crate::diagram::DiagramRenderer;
use crate::export::{ExportError, ExportRequest, ExportedFile, export_diagram};

/// Result delivered back to the event loop.
#[derive(Debug)]
pub enum WorkerEvent {
    Preview(RenderOutcome),
    Export(Result<ExportedFile, ExportError>),
}

/// Background threads that own all renderer calls.
///
/// Preview and export run on separate threads so an export is never stuck
/// behind a slow preview. Threads exit when the worker is dropped.
pub struct RenderWorker {
    preview_tx: Sender<RenderJob>,
    export_tx: Sender<ExportRequest>,
    events: Receiver<WorkerEvent>,
}

impl RenderWorker {
    /// Start both worker threads.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS refuses to spawn a thread.
    pub fn spawn(renderer: Arc<dyn DiagramRenderer>) -> std::io::Result<Self> {
        let (event_tx, events) = mpsc::channel();
        let (preview_tx, preview_rx) = mpsc::channel::<RenderJob>();
        let (export_tx, export_rx) = mpsc::channel::<ExportRequest>();

        let preview_renderer = Arc::clone(&renderer);
        let preview_events = event_tx.clone();
        std::thread::Builder::new()
            .name("mermedit-preview".into())
            .spawn(move || {
                while let Ok(mut job) = preview_rx.recv() {
                    // Only the newest queued job can still be current.
                    while let Ok(newer) = preview_rx.try_recv() {
                        crate::perf::log_event(
                            "worker.preview.skip",
                            format!("seq={} superseded by {}", job.seq, newer.seq),
                        );
                        job = newer;
                    }
                    let outcome = run_preview_job(preview_renderer.as_ref(), job);
                    if preview_events.send(WorkerEvent::Preview(outcome)).is_err() {
                        break;
                    }
                }
            })?;

        std::thread::Builder::new()
            .name("mermedit-export".into())
            .spawn(move || {
                while let Ok(request) = export_rx.recv() {
                    let result = export_diagram(renderer.as_ref(), &request);
                    if event_tx.send(WorkerEvent::Export(result)).is_err() {
                        break;
                    }
                }
            })?;

        Ok(Self {
            preview_tx,
            export_tx,
            events,
        })
    }

    /// Queue a preview render. Returns `false` if the worker has stopped.
    pub fn submit_preview(&self, job: RenderJob) -> bool {
        self.preview_tx.send(job).is_ok()
    }

    /// Queue an export. Returns `false` if the worker has stopped.
    pub fn submit_export(&self, request: ExportRequest) -> bool {
        crate::perf::log_event("worker.export.submit", request.out_dir.display().to_string());
        self.export_tx.send(request).is_ok()
    }

    pub fn try_recv(&self) -> Option<WorkerEvent> {
        self.events.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<WorkerEvent> {
        self.events.recv_timeout(timeout).ok()
    }
}

impl std::fmt::Debug for RenderWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderWorker").finish_non_exhaustive()
    }
}
