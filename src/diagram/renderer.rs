use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use super::ThemeId;

/// Failure reported by a [`DiagramRenderer`].
///
/// The display form is the renderer's message verbatim so it can be shown
/// to the user unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    /// The source does not conform to the declared diagram grammar.
    #[error("{0}")]
    Validation(String),
    /// Any other renderer fault.
    #[error("{0}")]
    Render(String),
}

impl RenderError {
    pub fn message(&self) -> &str {
        match self {
            Self::Validation(msg) | Self::Render(msg) => msg,
        }
    }
}

/// Unique identifier handed to the renderer for each render call.
///
/// Derived from wall-clock milliseconds plus a process-wide counter so
/// overlapping calls never collide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiagramId(String);

static NEXT_ID: AtomicU64 = AtomicU64::new(0);

impl DiagramId {
    pub fn fresh(prefix: &str) -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        let seq = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        Self(format!("{prefix}-{millis}-{seq}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowchartOptions {
    pub use_max_width: bool,
    pub html_labels: bool,
    pub curve: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SequenceOptions {
    pub diagram_margin_x: u32,
    pub diagram_margin_y: u32,
    pub actor_margin: u32,
    pub width: u32,
    pub height: u32,
    pub box_margin: u32,
    pub box_text_margin: u32,
    pub note_margin: u32,
    pub message_margin: u32,
    pub mirror_actors: bool,
    pub bottom_margin_adj: u32,
    pub use_max_width: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GanttOptions {
    pub title_top_margin: u32,
    pub bar_height: u32,
    pub font_size: u32,
    pub grid_line_start_padding: u32,
    pub left_padding: u32,
    pub top_padding: u32,
    pub right_padding: u32,
}

/// Theme plus the fixed per-family layout constants.
///
/// Serialized into a Mermaid `init` directive. None of the layout values
/// are user-configurable; only `theme` and `use_max_width` vary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RendererConfig {
    pub theme: ThemeId,
    pub font_family: &'static str,
    pub font_size: u32,
    pub flowchart: FlowchartOptions,
    pub sequence: SequenceOptions,
    pub gantt: GanttOptions,
}

impl RendererConfig {
    /// Layout for the live preview: diagrams shrink to the available width.
    pub fn preview(theme: ThemeId) -> Self {
        Self::with_max_width(theme, true)
    }

    /// Layout for SVG export: diagrams keep their natural size.
    pub fn export(theme: ThemeId) -> Self {
        Self::with_max_width(theme, false)
    }

    fn with_max_width(theme: ThemeId, use_max_width: bool) -> Self {
        Self {
            theme,
            font_family: "Arial, sans-serif",
            font_size: 14,
            flowchart: FlowchartOptions {
                use_max_width,
                html_labels: true,
                curve: "basis",
            },
            sequence: SequenceOptions {
                diagram_margin_x: 50,
                diagram_margin_y: 10,
                actor_margin: 50,
                width: 150,
                height: 65,
                box_margin: 10,
                box_text_margin: 5,
                note_margin: 10,
                message_margin: 35,
                mirror_actors: true,
                bottom_margin_adj: 1,
                use_max_width,
            },
            gantt: GanttOptions {
                title_top_margin: 25,
                bar_height: 20,
                font_size: 11,
                grid_line_start_padding: 35,
                left_padding: 75,
                top_padding: 50,
                right_padding: 75,
            },
        }
    }

    /// Render this configuration as a `%%{init: ...}%%` directive line.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Render`] if serialization fails.
    pub fn init_directive(&self) -> Result<String, RenderError> {
        let json =
            serde_json::to_string(self).map_err(|err| RenderError::Render(err.to_string()))?;
        Ok(format!("%%{{init: {json}}}%%"))
    }
}

/// The external diagram renderer.
///
/// Implementations own all syntax validation and layout. Calls may block;
/// the editor only ever invokes them from worker threads.
pub trait DiagramRenderer: Send + Sync {
    /// Check `source` against the grammar of the diagram type it declares.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Validation`] for invalid syntax, or
    /// [`RenderError::Render`] for any other failure.
    fn validate(&self, source: &str) -> Result<(), RenderError>;

    /// Render `source` to an SVG string whose root element is keyed by `id`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] when rendering fails for any reason.
    fn render(
        &self,
        id: &DiagramId,
        source: &str,
        config: &RendererConfig,
    ) -> Result<String, RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique_within_same_millisecond() {
        let a = DiagramId::fresh("mermaid");
        let b = DiagramId::fresh("mermaid");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("mermaid-"));
    }

    #[test]
    fn test_preview_and_export_differ_only_in_max_width() {
        let preview = RendererConfig::preview(ThemeId::Dark);
        let export = RendererConfig::export(ThemeId::Dark);
        assert!(preview.flowchart.use_max_width);
        assert!(preview.sequence.use_max_width);
        assert!(!export.flowchart.use_max_width);
        assert!(!export.sequence.use_max_width);
        assert_eq!(preview.gantt, export.gantt);
        assert_eq!(preview.flowchart.curve, "basis");
    }

    #[test]
    fn test_init_directive_carries_theme_and_layout() {
        let directive = RendererConfig::export(ThemeId::Forest)
            .init_directive()
            .unwrap();
        assert!(directive.starts_with("%%{init: {"));
        assert!(directive.ends_with("}%%"));
        assert!(directive.contains("\"theme\":\"forest\""));
        assert!(directive.contains("\"useMaxWidth\":false"));
        assert!(directive.contains("\"diagramMarginX\":50"));
        assert!(directive.contains("\"gridLineStartPadding\":35"));
    }

    #[test]
    fn test_render_error_displays_message_verbatim() {
        let err = RenderError::Validation("Parse error on line 2".to_string());
        assert_eq!(err.to_string(), "Parse error on line 2");
        assert_eq!(err.message(), "Parse error on line 2");
    }
}
