use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mermedit::diagram::{
    Background, DiagramId, DiagramRenderer, ExportConfig, RenderError, RendererConfig, ThemeId,
};
use mermedit::export::svg::root_attribute;
use mermedit::export::{EXPORT_FILENAME, ExportError, ExportRequest, export_diagram};
use mermedit::pipeline::{RenderWorker, WorkerEvent};

const FIXED_SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="100%" style="max-width: 300px;" viewBox="0 0 300 120"><rect width="50" height="20" stroke-width="1"/></svg>"#;

/// Renderer that accepts anything starting with `graph` and returns a
/// fixed SVG.
#[derive(Default)]
struct FixedRenderer {
    calls: AtomicUsize,
}

impl DiagramRenderer for FixedRenderer {
    fn validate(&self, source: &str) -> Result<(), RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if source.trim_start().starts_with("graph") {
            Ok(())
        } else {
            Err(RenderError::Validation(
                "No diagram type detected".to_string(),
            ))
        }
    }

    fn render(
        &self,
        _id: &DiagramId,
        _source: &str,
        config: &RendererConfig,
    ) -> Result<String, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        assert!(
            !config.flowchart.use_max_width,
            "exports keep the natural diagram size"
        );
        Ok(FIXED_SVG.to_string())
    }
}

fn request(source: &str, dir: &std::path::Path, settings: ExportConfig) -> ExportRequest {
    ExportRequest {
        source: source.to_string(),
        theme: ThemeId::Neutral,
        settings,
        out_dir: dir.to_path_buf(),
    }
}

#[test]
fn test_export_writes_sized_svg_with_background() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FixedRenderer::default();
    let settings = ExportConfig {
        width: Some(1200),
        height: Some(480),
        background: Background::DarkGray,
    };

    let file = export_diagram(&renderer, &request("graph LR\n  A --> B", dir.path(), settings))
        .unwrap();
    assert_eq!(file.path, dir.path().join(EXPORT_FILENAME));

    let svg = std::fs::read_to_string(&file.path).unwrap();
    assert_eq!(file.bytes, svg.len());
    assert_eq!(root_attribute(&svg, "width").as_deref(), Some("1200"));
    assert_eq!(root_attribute(&svg, "height").as_deref(), Some("480"));
    assert_eq!(
        root_attribute(&svg, "style").as_deref(),
        Some("max-width: 300px; background-color: #343a40")
    );
    assert!(svg.contains(r#"<rect width="50" height="20" stroke-width="1"/>"#));
}

#[test]
fn test_auto_size_and_transparent_keep_renderer_output() {
    let dir = tempfile::tempdir().unwrap();
    let settings = ExportConfig {
        width: None,
        height: None,
        background: Background::Transparent,
    };
    let file = export_diagram(
        &FixedRenderer::default(),
        &request("graph TD\n  A", dir.path(), settings),
    )
    .unwrap();
    assert_eq!(std::fs::read_to_string(file.path).unwrap(), FIXED_SVG);
}

#[test]
fn test_blank_source_never_reaches_renderer() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FixedRenderer::default();
    let err = export_diagram(
        &renderer,
        &request(" \n\t\n", dir.path(), ExportConfig::default()),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::EmptySource));
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 0);
    assert!(!dir.path().join(EXPORT_FILENAME).exists());
}

#[test]
fn test_invalid_source_reports_renderer_message() {
    let dir = tempfile::tempdir().unwrap();
    let err = export_diagram(
        &FixedRenderer::default(),
        &request("flowchart?", dir.path(), ExportConfig::default()),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "Export failed: No diagram type detected");
    assert!(!dir.path().join(EXPORT_FILENAME).exists());
}

#[test]
fn test_second_export_replaces_first() {
    let dir = tempfile::tempdir().unwrap();
    let renderer = FixedRenderer::default();
    let small = ExportConfig {
        width: Some(200),
        ..ExportConfig::default()
    };
    export_diagram(&renderer, &request("graph TD", dir.path(), small)).unwrap();
    export_diagram(
        &renderer,
        &request("graph TD", dir.path(), ExportConfig::default()),
    )
    .unwrap();

    let svg = std::fs::read_to_string(dir.path().join(EXPORT_FILENAME)).unwrap();
    assert_eq!(root_attribute(&svg, "width").as_deref(), Some("800"));
    let entries = std::fs::read_dir(dir.path()).unwrap().count();
    assert_eq!(entries, 1, "no temporary files are left behind");
}

#[test]
fn test_worker_runs_export_off_thread() {
    let dir = tempfile::tempdir().unwrap();
    let worker = RenderWorker::spawn(Arc::new(FixedRenderer::default())).unwrap();
    assert!(worker.submit_export(request(
        "graph TD\n  A --> B",
        dir.path(),
        ExportConfig::default()
    )));

    let event = worker
        .recv_timeout(Duration::from_secs(5))
        .expect("worker reports back");
    let WorkerEvent::Export(result) = event else {
        panic!("expected an export event");
    };
    let file = result.unwrap();
    assert!(file.path.exists());
}
