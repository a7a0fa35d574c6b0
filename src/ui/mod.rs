//! Terminal UI components.
//!
//! The screen is a toolbar row, the source editor on the left, the live
//! preview on the right and a status bar. Popups (help, pickers, export
//! settings, alerts) are drawn over everything else.
//!
//! Layout helpers are shared with mouse handling so clicks map onto the
//! same cells that were drawn.

pub mod style;

mod overlays;
mod preview;
mod render;
mod status;

pub use overlays::overlay_rect;
pub use render::render;

use ratatui::layout::{Constraint, Layout, Rect};
use unicode_width::UnicodeWidthChar;

use crate::app::{NarrowPane, Overlay};

pub const EDITOR_WIDTH_PERCENT: u16 = 50;

/// Narrowest terminal that still shows editor and preview side by side.
/// Below it only the [`NarrowPane`] is drawn, across the full width.
pub const SPLIT_MIN_WIDTH: u16 = 80;

/// Regions of the main screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenLayout {
    pub toolbar: Rect,
    pub editor: Rect,
    pub preview: Rect,
    /// Row toasts are drawn on, over the bottom edge of both panes.
    pub toast: Rect,
    pub status: Rect,
}

pub const fn is_split(width: u16) -> bool {
    width >= SPLIT_MIN_WIDTH
}

/// Split the screen. A hidden pane gets a zero-width rect.
pub fn screen_layout(area: Rect, narrow_pane: NarrowPane) -> ScreenLayout {
    let [toolbar, main, status] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(area);
    let [editor, preview] = if is_split(main.width) {
        Layout::horizontal([
            Constraint::Percentage(EDITOR_WIDTH_PERCENT),
            Constraint::Percentage(100 - EDITOR_WIDTH_PERCENT),
        ])
        .areas(main)
    } else {
        let hidden = Rect::new(main.x, main.y, 0, main.height);
        match narrow_pane {
            NarrowPane::Editor => [main, hidden],
            NarrowPane::Preview => [hidden, main],
        }
    };
    let toast = Rect::new(
        main.x,
        main.bottom().saturating_sub(1),
        main.width,
        main.height.min(1),
    );
    ScreenLayout {
        toolbar,
        editor,
        preview,
        toast,
        status,
    }
}

/// Inside of a bordered pane.
const fn bordered_inner(area: Rect) -> Rect {
    Rect::new(
        area.x.saturating_add(1),
        area.y.saturating_add(1),
        area.width.saturating_sub(2),
        area.height.saturating_sub(2),
    )
}

/// Cells inside the editor border, gutter included.
pub const fn editor_text_area(editor: Rect) -> Rect {
    bordered_inner(editor)
}

/// Cells inside the preview border.
pub const fn preview_image_area(preview: Rect) -> Rect {
    bordered_inner(preview)
}

/// Width of the line-number gutter, trailing space included.
#[allow(clippy::cast_possible_truncation)]
pub fn gutter_width(line_count: usize) -> u16 {
    let digits = line_count.max(1).ilog10() as u16 + 1;
    digits.max(2) + 1
}

/// Display width of `line` up to byte column `col`.
pub fn display_width_to(line: &str, col: usize) -> usize {
    line.char_indices()
        .take_while(|(idx, _)| *idx < col)
        .map(|(_, ch)| ch.width().unwrap_or(0))
        .sum()
}

/// Byte column of the character drawn at `display_col`, or the end of the
/// line when the column lies past it.
pub fn byte_col_at_display(line: &str, display_col: usize) -> usize {
    let mut width = 0;
    for (idx, ch) in line.char_indices() {
        let w = ch.width().unwrap_or(0);
        if width + w > display_col {
            return idx;
        }
        width += w;
    }
    line.len()
}

/// Whether any popup currently covers the panes.
pub const fn popup_open(overlay: Option<&Overlay>, alert: bool) -> bool {
    overlay.is_some() || alert
}
