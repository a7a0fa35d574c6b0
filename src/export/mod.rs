//! SVG export.
//!
//! Re-renders the current source with export layout, applies the chosen
//! size and background to the root element, and writes the result as
//! `mermaid-chart.svg`.

mod download;
pub mod svg;

use std::path::PathBuf;

pub use download::write_download;

use crate::diagram::{DiagramId, DiagramRenderer, ExportConfig, RenderError, RendererConfig, ThemeId};

pub const EXPORT_FILENAME: &str = "mermaid-chart.svg";
pub const EXPORT_MIME: &str = "image/svg+xml";

/// Why an export did not produce a file.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Please enter diagram code first")]
    EmptySource,
    #[error("Export failed: {0}")]
    Render(#[from] RenderError),
    #[error("Export failed: could not write file: {0}")]
    Io(#[from] std::io::Error),
}

/// Snapshot of everything an export needs, taken when the user triggers it.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    pub source: String,
    pub theme: ThemeId,
    pub settings: ExportConfig,
    pub out_dir: PathBuf,
}

/// A finished export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Validate, render, post-process and write one diagram.
///
/// Blank sources are rejected before the renderer is touched.
///
/// # Errors
///
/// See [`ExportError`]. Nothing is written unless every earlier step
/// succeeded.
pub fn export_diagram(
    renderer: &dyn DiagramRenderer,
    request: &ExportRequest,
) -> Result<ExportedFile, ExportError> {
    let _scope = crate::perf::scope("export.total");
    if request.source.trim().is_empty() {
        return Err(ExportError::EmptySource);
    }

    renderer.validate(&request.source)?;
    let id = DiagramId::fresh("mermaid-export");
    let config = RendererConfig::export(request.theme);
    let raw = renderer.render(&id, &request.source, &config)?;
    let svg = svg::postprocess(&raw, &request.settings);

    let path = write_download(&request.out_dir, EXPORT_FILENAME, svg.as_bytes())?;
    crate::perf::log_event(
        "export.written",
        format!("{} ({} bytes, {EXPORT_MIME})", path.display(), svg.len()),
    );
    Ok(ExportedFile {
        path,
        bytes: svg.len(),
    })
}
