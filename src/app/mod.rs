//! Application state and main event loop.
//!
//! This module implements The Elm Architecture (TEA):
//! - [`Model`]: The complete application state
//! - [`Message`]: All possible events and actions
//! - [`update`]: Pure function for state transitions
//! - [`App::run`]: Main event loop with rendering
//!
//! Renderer calls never happen on the UI thread. The loop feeds the
//! debounced [`crate::pipeline::RenderPipeline`] and hands its jobs to a
//! [`crate::pipeline::RenderWorker`].

mod effects;
mod event_loop;
mod input;
mod model;
mod update;

pub use model::{ExportField, ExportForm, Model, NarrowPane, Overlay, ToastLevel};
pub use update::{ExportStatus, Message, update};

use std::path::PathBuf;
use std::sync::Arc;

use crate::diagram::{DiagramRenderer, ExportConfig, ThemeId};
use crate::mermaid::MermaidRenderer;

/// Main application struct that owns the terminal and runs the event loop.
pub struct App {
    source: String,
    theme: ThemeId,
    export_config: ExportConfig,
    out_dir: PathBuf,
    images_enabled: bool,
    force_half_cell: bool,
    renderer: Arc<dyn DiagramRenderer>,
    config_global_path: Option<PathBuf>,
    config_local_path: Option<PathBuf>,
}

impl App {
    /// Create a new application editing `source`.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            theme: ThemeId::default(),
            export_config: ExportConfig::default(),
            out_dir: PathBuf::from("."),
            images_enabled: true,
            force_half_cell: false,
            renderer: Arc::new(MermaidRenderer),
            config_global_path: None,
            config_local_path: None,
        }
    }

    /// Initial renderer theme.
    #[must_use]
    pub const fn with_theme(mut self, theme: ThemeId) -> Self {
        self.theme = theme;
        self
    }

    /// Initial export size and background.
    #[must_use]
    pub const fn with_export_config(mut self, config: ExportConfig) -> Self {
        self.export_config = config;
        self
    }

    /// Directory exported files are written to.
    #[must_use]
    pub fn with_out_dir(mut self, dir: PathBuf) -> Self {
        self.out_dir = dir;
        self
    }

    /// Enable or disable image rendering in the preview.
    #[must_use]
    pub const fn with_images_enabled(mut self, enabled: bool) -> Self {
        self.images_enabled = enabled;
        self
    }

    /// Force the half-block image fallback instead of probing the terminal.
    #[must_use]
    pub const fn with_force_half_cell(mut self, force: bool) -> Self {
        self.force_half_cell = force;
        self
    }

    /// Swap the diagram renderer.
    #[must_use]
    pub fn with_renderer(mut self, renderer: Arc<dyn DiagramRenderer>) -> Self {
        self.renderer = renderer;
        self
    }

    /// Set config paths to show in help.
    #[must_use]
    pub fn with_config_paths(
        mut self,
        global_path: Option<PathBuf>,
        local_path: Option<PathBuf>,
    ) -> Self {
        self.config_global_path = global_path;
        self.config_local_path = local_path;
        self
    }
}
