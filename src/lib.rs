// Only allow lints that are either transitive-dependency noise or
// genuinely opinionated style choices that don't indicate real issues.
#![allow(
    // Transitive dependency version mismatches we can't control
    clippy::multiple_crate_versions,
    // module_name_repetitions is pure style preference (e.g. export::ExportError)
    clippy::module_name_repetitions
)]

//! # Mermedit
//!
//! A terminal editor for Mermaid diagrams with a live preview.
//!
//! Mermedit puts the diagram source on the left and a rendered preview on
//! the right:
//! - Syntax-highlighted Mermaid source
//! - Debounced live rendering off the UI thread
//! - Theme picker and starter templates
//! - SVG export with custom size and background
//!
//! ## Architecture
//!
//! Mermedit uses The Elm Architecture (TEA) pattern:
//! - **Model**: Application state
//! - **Message**: Events and actions
//! - **Update**: Pure state transitions
//! - **View**: Render to terminal
//!
//! ## Modules
//!
//! - [`app`]: Main application loop and state
//! - [`editor`]: Source text buffer and cursor
//! - [`diagram`]: Renderer contract, themes and export settings
//! - [`mermaid`]: The Mermaid renderer and SVG rasterizing
//! - [`pipeline`]: Debounced preview rendering and the render worker
//! - [`export`]: SVG post-processing and file output
//! - [`templates`]: Built-in starter diagrams
//! - [`ui`]: Terminal UI components
//! - [`highlight`]: Mermaid syntax highlighting
//! - [`image`]: Terminal graphics helpers
//! - [`config`]: Saved command-line defaults

pub mod app;
pub mod config;
pub mod diagram;
pub mod editor;
pub mod export;
pub mod highlight;
pub mod image;
pub mod mermaid;
pub mod perf;
pub mod pipeline;
pub mod templates;
pub mod ui;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::app::{App, Message, Model};
    pub use crate::diagram::{Background, DiagramRenderer, ExportConfig, ThemeId};
    pub use crate::editor::SourceBuffer;
    pub use crate::pipeline::{RenderPipeline, RenderState};
}
