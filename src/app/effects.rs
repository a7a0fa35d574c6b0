use crate::app::{App, Message, Model, update};
use crate::export::ExportError;
use crate::pipeline::{RenderWorker, WorkerEvent};

use super::update::ExportStatus;

impl App {
    pub(super) fn handle_message_side_effects(
        model: &mut Model,
        worker: &RenderWorker,
        msg: &Message,
    ) {
        if matches!(msg, Message::RequestExport)
            && let Some(request) = model.pending_export.take()
            && !worker.submit_export(request)
        {
            tracing::error!("export worker stopped");
            *model = update(
                std::mem::take(model),
                Message::ExportFinished(ExportStatus::Failed(
                    "Export failed: export worker stopped".to_string(),
                )),
            );
        }
    }

    pub(super) fn handle_worker_event(model: &mut Model, event: WorkerEvent) {
        match event {
            WorkerEvent::Preview(outcome) => {
                let seq = outcome.seq;
                if !model.apply_preview_outcome(outcome) {
                    crate::perf::log_event("app.preview.dropped", format!("seq={seq}"));
                }
            }
            WorkerEvent::Export(result) => {
                let status = export_status(result);
                *model = update(std::mem::take(model), Message::ExportFinished(status));
            }
        }
    }
}

fn export_status(result: Result<crate::export::ExportedFile, ExportError>) -> ExportStatus {
    match result {
        Ok(file) => ExportStatus::Saved {
            path: file.path,
            bytes: file.bytes,
        },
        Err(err) => {
            tracing::warn!(error = %err, "export failed");
            ExportStatus::Failed(err.to_string())
        }
    }
}
