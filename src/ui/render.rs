use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use unicode_width::UnicodeWidthChar;

use crate::app::{Model, Overlay};
use crate::highlight::{Highlighter, TokenStyle};

use super::{overlays, preview, status, style};

/// Render the complete UI.
pub fn render(model: &mut Model, frame: &mut Frame) {
    let _scope = crate::perf::scope("ui.render");
    let area = frame.area();
    let layout = super::screen_layout(area, model.narrow_pane);

    status::render_toolbar(model, frame, layout.toolbar);
    if !layout.editor.is_empty() {
        render_editor(model, frame, layout.editor);
    }
    if !layout.preview.is_empty() {
        preview::render_preview(model, frame, layout.preview);
    }
    status::render_status_bar(model, frame, layout.status);
    status::render_toast_bar(model, frame, layout.toast);

    match &model.overlay {
        Some(Overlay::Help { scroll }) => overlays::render_help_overlay(model, *scroll, frame, area),
        Some(Overlay::ThemePicker { selected }) => {
            overlays::render_theme_picker(model, *selected, frame, area);
        }
        Some(Overlay::TemplatePicker { selected }) => {
            overlays::render_template_picker(*selected, frame, area);
        }
        Some(Overlay::ExportSettings(form)) => {
            overlays::render_export_settings(form, frame, area);
        }
        None => {}
    }
    if let Some(message) = &model.alert {
        overlays::render_alert(message, frame, area);
    }
}

fn render_editor(model: &Model, frame: &mut Frame, area: Rect) {
    let focused = !super::popup_open(model.overlay.as_ref(), model.alert.is_some());
    let block = Block::default()
        .title(" Mermaid source ")
        .borders(Borders::ALL)
        .border_style(style::pane_border_style(focused));
    frame.render_widget(block, area);

    let text_area = super::editor_text_area(area);
    if text_area.is_empty() {
        return;
    }
    let line_count = model.buffer.line_count();
    let gutter = super::gutter_width(line_count);
    let text_width = text_area.width.saturating_sub(gutter) as usize;
    let cursor = model.buffer.cursor();
    let start = model.editor_scroll_offset.min(line_count.saturating_sub(1));
    let end = (start + text_area.height as usize).min(line_count);

    // The highlighter carries state between lines, so lines above the
    // viewport still have to be fed through it.
    let mut highlighter = Highlighter::new();
    let mut lines: Vec<Line> = Vec::with_capacity(end - start);
    for idx in 0..end {
        let text = model.buffer.line_at(idx).unwrap_or_default();
        let runs = highlighter.line(&text);
        if idx < start {
            continue;
        }
        let number = format!("{:>width$} ", idx + 1, width = gutter as usize - 1);
        let mut spans = vec![Span::styled(number, style::gutter_style(idx == cursor.line))];
        spans.extend(clip_runs(&runs, model.editor_hscroll, text_width));
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), text_area);

    if focused && (start..end).contains(&cursor.line) {
        let line = model.buffer.line_at(cursor.line).unwrap_or_default();
        let col = super::display_width_to(&line, cursor.col);
        if let Some(visible_col) = col.checked_sub(model.editor_hscroll)
            && visible_col < text_width
        {
            let x = text_area.x + gutter + u16::try_from(visible_col).unwrap_or(u16::MAX);
            let y = text_area.y + u16::try_from(cursor.line - start).unwrap_or(u16::MAX);
            frame.set_cursor_position(Position::new(x, y));
        }
    }
}

/// Cut highlighted runs down to the display columns `skip..skip + width`.
/// Wide characters straddling either edge are dropped.
pub(super) fn clip_runs(
    runs: &[(TokenStyle, String)],
    skip: usize,
    width: usize,
) -> Vec<Span<'static>> {
    let limit = skip + width;
    let mut col = 0;
    let mut spans = Vec::new();
    for (token, text) in runs {
        let mut visible = String::new();
        for ch in text.chars() {
            let w = ch.width().unwrap_or(0);
            if col >= skip && col + w <= limit {
                visible.push(ch);
            }
            col += w;
        }
        if !visible.is_empty() {
            spans.push(Span::styled(visible, style::token_style(*token)));
        }
        if col >= limit {
            break;
        }
    }
    spans
}
