//! Diagram data model and the renderer seam.
//!
//! Everything the editor knows about diagrams lives here: which theme is
//! selected, how an export should be sized, and the [`DiagramRenderer`]
//! trait through which all parsing and layout is delegated.

mod config;
mod renderer;
mod theme;

pub use config::{
    Background, DEFAULT_EXPORT_HEIGHT, DEFAULT_EXPORT_WIDTH, ExportConfig, MAX_EXPORT_DIMENSION,
    MIN_EXPORT_DIMENSION, parse_dimension,
};
pub use renderer::{
    DiagramId, DiagramRenderer, FlowchartOptions, GanttOptions, RenderError, RendererConfig,
    SequenceOptions,
};
pub use theme::{Palette, ThemeId};

#[cfg(test)]
pub(crate) mod stub;
