use std::path::PathBuf;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui_image::picker::Picker;
use ratatui_image::protocol::StatefulProtocol;

use crate::diagram::{
    Background, DEFAULT_EXPORT_HEIGHT, DEFAULT_EXPORT_WIDTH, ExportConfig, ThemeId,
    parse_dimension,
};
use crate::editor::SourceBuffer;
use crate::export::ExportRequest;
use crate::pipeline::{RenderInput, RenderOutcome, RenderPipeline, RenderState};

const TOAST_DURATION: Duration = Duration::from_secs(4);

/// Backdrop the preview raster is flattened onto for each theme.
const LIGHT_BACKDROP: [u8; 3] = [0xff, 0xff, 0xff];
const DARK_BACKDROP: [u8; 3] = [0x33, 0x33, 0x33];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
struct Toast {
    level: ToastLevel,
    message: String,
    expires_at: Instant,
}

/// Field with keyboard focus in the export settings form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExportField {
    #[default]
    Width,
    Height,
    Background,
}

impl ExportField {
    pub const fn next(self) -> Self {
        match self {
            Self::Width => Self::Height,
            Self::Height => Self::Background,
            Self::Background => Self::Width,
        }
    }

    pub const fn prev(self) -> Self {
        match self {
            Self::Width => Self::Background,
            Self::Height => Self::Width,
            Self::Background => Self::Height,
        }
    }
}

/// Editable copy of the export settings. Changes only take effect when the
/// form is confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportForm {
    pub focus: ExportField,
    pub width: String,
    pub height: String,
    pub background: Background,
}

impl ExportForm {
    pub fn from_config(config: &ExportConfig) -> Self {
        let text = |d: Option<u32>| d.map(|v| v.to_string()).unwrap_or_default();
        Self {
            focus: ExportField::Width,
            width: text(config.width),
            height: text(config.height),
            background: config.background,
        }
    }

    /// Resolve the typed fields. Empty means auto, garbage falls back to
    /// the defaults and numbers are clamped.
    pub fn to_config(&self) -> ExportConfig {
        ExportConfig {
            width: parse_dimension(&self.width, DEFAULT_EXPORT_WIDTH),
            height: parse_dimension(&self.height, DEFAULT_EXPORT_HEIGHT),
            background: self.background,
        }
    }

    /// Text of the focused field, if it is a text field.
    pub fn focused_text_mut(&mut self) -> Option<&mut String> {
        match self.focus {
            ExportField::Width => Some(&mut self.width),
            ExportField::Height => Some(&mut self.height),
            ExportField::Background => None,
        }
    }
}

/// Pane shown on its own when the terminal is too narrow for both.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum NarrowPane {
    #[default]
    Editor,
    Preview,
}

impl NarrowPane {
    pub const fn toggle(self) -> Self {
        match self {
            Self::Editor => Self::Preview,
            Self::Preview => Self::Editor,
        }
    }
}

/// Popup currently covering the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    Help { scroll: u16 },
    ThemePicker { selected: usize },
    TemplatePicker { selected: usize },
    ExportSettings(ExportForm),
}

/// Inputs of the last scheduled render, used to detect changes.
type RenderKey = (u64, ThemeId, Option<u32>);

/// The complete application state.
///
/// All state lives here - no global or scattered state.
pub struct Model {
    /// Diagram source being edited
    pub buffer: SourceBuffer,
    /// First visible editor line
    pub editor_scroll_offset: usize,
    /// First visible display column in the editor
    pub editor_hscroll: usize,
    /// Selected renderer theme
    pub theme: ThemeId,
    /// Size and background applied on export
    pub export_config: ExportConfig,
    /// Directory exports are written to
    pub out_dir: PathBuf,
    /// Debounced live preview
    pub pipeline: RenderPipeline,
    /// Pane kept on screen below the split width
    pub narrow_pane: NarrowPane,
    /// Open popup, if any
    pub overlay: Option<Overlay>,
    /// Blocking notice; any key dismisses it
    pub alert: Option<String>,
    toast: Option<Toast>,
    /// An export job is running on the worker
    pub export_in_flight: bool,
    /// Export snapshot waiting to be handed to the worker
    pub(super) pending_export: Option<ExportRequest>,
    /// Terminal size (width, height)
    pub terminal_size: (u16, u16),
    /// Image picker for terminal graphics
    pub picker: Option<Picker>,
    /// Whether the preview may draw images at all
    pub images_enabled: bool,
    /// Graphics protocol state for the rendered preview
    pub preview_protocol: Option<StatefulProtocol>,
    /// Global config path shown in help
    pub config_global_path: Option<PathBuf>,
    /// Local override path shown in help
    pub config_local_path: Option<PathBuf>,
    /// Whether the app should quit
    pub should_quit: bool,
    last_render_key: Option<RenderKey>,
}

impl Model {
    /// Create a model editing `source`.
    pub fn new(source: &str, terminal_size: (u16, u16)) -> Self {
        Self {
            buffer: SourceBuffer::from_text(source),
            terminal_size,
            ..Self::default()
        }
    }

    /// Set the image picker.
    #[must_use]
    pub fn with_picker(mut self, picker: Option<Picker>) -> Self {
        self.picker = picker;
        self
    }

    pub const fn terminal_area(&self) -> Rect {
        Rect::new(0, 0, self.terminal_size.0, self.terminal_size.1)
    }

    pub fn screen_layout(&self) -> crate::ui::ScreenLayout {
        crate::ui::screen_layout(self.terminal_area(), self.narrow_pane)
    }

    /// Rows available for source text.
    pub fn editor_view_height(&self) -> usize {
        crate::ui::editor_text_area(self.screen_layout().editor).height as usize
    }

    /// Columns available for source text, excluding the gutter.
    pub fn editor_text_width(&self) -> usize {
        let layout = self.screen_layout();
        let text = crate::ui::editor_text_area(layout.editor);
        let gutter = crate::ui::gutter_width(self.buffer.line_count());
        text.width.saturating_sub(gutter) as usize
    }

    /// Pixel width the preview should be rasterized at, or `None` when the
    /// preview cannot show images.
    ///
    /// A hidden preview is sized as if it were shown, so switching panes on
    /// a narrow terminal never forces a re-render.
    pub fn preview_target_width_px(&self) -> Option<u32> {
        if !self.images_enabled {
            return None;
        }
        let picker = self.picker.as_ref()?;
        let layout = crate::ui::screen_layout(self.terminal_area(), NarrowPane::Preview);
        let inner = crate::ui::preview_image_area(layout.preview);
        Some(crate::image::preview_width_px(inner.width, picker.font_size()))
    }

    pub fn render_input(&self) -> RenderInput {
        RenderInput {
            source: self.buffer.text(),
            theme: self.theme,
            target_width_px: self.preview_target_width_px(),
        }
    }

    /// Schedule a preview render if the source, theme or pane width changed
    /// since the last one. Returns whether anything was scheduled.
    pub fn sync_render_schedule(&mut self, now_ms: u64) -> bool {
        let key = (
            self.buffer.revision(),
            self.theme,
            self.preview_target_width_px(),
        );
        if self.last_render_key == Some(key) {
            return false;
        }
        self.last_render_key = Some(key);
        let input = self.render_input();
        self.pipeline.schedule(input, now_ms);
        true
    }

    /// Apply a worker outcome. Stale outcomes are dropped and leave the
    /// preview untouched.
    pub fn apply_preview_outcome(&mut self, outcome: RenderOutcome) -> bool {
        if !self.pipeline.complete(outcome) {
            return false;
        }
        self.refresh_preview_protocol();
        true
    }

    /// Rebuild the graphics protocol from the current render state.
    pub fn refresh_preview_protocol(&mut self) {
        self.preview_protocol = None;
        if !self.images_enabled {
            return;
        }
        let RenderState::Rendered(diagram) = self.pipeline.state() else {
            return;
        };
        let (Some(image), Some(picker)) = (diagram.image.as_ref(), self.picker.as_ref()) else {
            return;
        };
        let _scope = crate::perf::scope("app.preview_protocol");
        let flat = crate::image::flatten_onto(image, self.preview_backdrop());
        self.preview_protocol = Some(picker.new_resize_protocol(flat));
    }

    pub const fn preview_backdrop(&self) -> [u8; 3] {
        match self.theme {
            ThemeId::Dark => DARK_BACKDROP,
            _ => LIGHT_BACKDROP,
        }
    }

    /// Snapshot everything an export needs.
    pub fn export_request(&self) -> ExportRequest {
        ExportRequest {
            source: self.buffer.text(),
            theme: self.theme,
            settings: self.export_config,
            out_dir: self.out_dir.clone(),
        }
    }

    /// Keep the cursor inside the editor's visible rows and columns.
    pub fn ensure_cursor_visible(&mut self) {
        let cursor = self.buffer.cursor();
        let height = self.editor_view_height().max(1);
        if cursor.line < self.editor_scroll_offset {
            self.editor_scroll_offset = cursor.line;
        } else if cursor.line >= self.editor_scroll_offset + height {
            self.editor_scroll_offset = cursor.line + 1 - height;
        }

        let width = self.editor_text_width().max(1);
        let line = self.buffer.line_at(cursor.line).unwrap_or_default();
        let col = crate::ui::display_width_to(&line, cursor.col);
        if col < self.editor_hscroll {
            self.editor_hscroll = col;
        } else if col >= self.editor_hscroll + width {
            self.editor_hscroll = col + 1 - width;
        }
    }

    /// Scroll the editor view without moving the cursor.
    pub fn scroll_editor(&mut self, delta: isize) {
        let max = self.buffer.line_count().saturating_sub(1);
        self.editor_scroll_offset = self
            .editor_scroll_offset
            .saturating_add_signed(delta)
            .min(max);
    }

    pub(super) fn show_toast(&mut self, level: ToastLevel, message: impl Into<String>) {
        self.toast = Some(Toast {
            level,
            message: message.into(),
            expires_at: Instant::now() + TOAST_DURATION,
        });
    }

    pub(super) fn expire_toast(&mut self, now: Instant) -> bool {
        if self
            .toast
            .as_ref()
            .is_some_and(|toast| toast.expires_at <= now)
        {
            self.toast = None;
            return true;
        }
        false
    }

    pub fn active_toast(&self) -> Option<(&str, ToastLevel)> {
        self.toast
            .as_ref()
            .map(|toast| (toast.message.as_str(), toast.level))
    }
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("revision", &self.buffer.revision())
            .field("theme", &self.theme)
            .field("export_config", &self.export_config)
            .field("render_state", &self.pipeline.state().label())
            .field("overlay", &self.overlay)
            .field("alert", &self.alert)
            .field("export_in_flight", &self.export_in_flight)
            .field("terminal_size", &self.terminal_size)
            .finish_non_exhaustive()
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            buffer: SourceBuffer::empty(),
            editor_scroll_offset: 0,
            editor_hscroll: 0,
            theme: ThemeId::default(),
            export_config: ExportConfig::default(),
            out_dir: PathBuf::from("."),
            pipeline: RenderPipeline::default(),
            narrow_pane: NarrowPane::default(),
            overlay: None,
            alert: None,
            toast: None,
            export_in_flight: false,
            pending_export: None,
            terminal_size: (80, 24),
            picker: None,
            images_enabled: true,
            preview_protocol: None,
            config_global_path: None,
            config_local_path: None,
            should_quit: false,
            last_render_key: None,
        }
    }
}
