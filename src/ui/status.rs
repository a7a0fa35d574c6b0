use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::app::{Model, NarrowPane, ToastLevel};
use crate::pipeline::RenderState;

use super::style;

pub fn render_toolbar(model: &Model, frame: &mut Frame, area: Rect) {
    let export = if model.export_in_flight {
        Span::styled(
            " Exporting... ",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        )
    } else if model.buffer.is_blank() {
        Span::styled(" ^E Export ", style::dim_style())
    } else {
        Span::raw(" ^E Export ")
    };
    let mut spans = vec![Span::styled(
        " mermedit ",
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )];
    if !super::is_split(area.width) {
        let other = match model.narrow_pane {
            NarrowPane::Editor => "Preview",
            NarrowPane::Preview => "Editor",
        };
        spans.push(Span::styled(format!(" F5 {other} "), style::section_style()));
    }
    spans.extend([
        Span::raw(format!(" F2 Theme: {} ", model.theme.label())),
        Span::raw(" F3 Templates "),
        Span::raw(format!(
            " F4 Size: {} Bg: {} ",
            model.export_config.size_label(),
            model.export_config.background.label()
        )),
        export,
        Span::raw(" F1 Help "),
    ]);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(style::bar_style()),
        area,
    );
}

pub fn render_status_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let cursor = model.buffer.cursor();
    let line = model.buffer.line_at(cursor.line).unwrap_or_default();
    let col = super::display_width_to(&line, cursor.col) + 1;
    let state = match model.pipeline.state() {
        RenderState::Error(_) => "syntax error",
        other => other.label(),
    };
    let pending = if model.pipeline.is_pending() {
        " (typing)"
    } else {
        ""
    };
    let status = format!(
        " Ln {}, Col {}  {} lines  preview: {state}{pending}  Ctrl+Q quit",
        cursor.line + 1,
        col,
        model.buffer.line_count(),
    );
    frame.render_widget(Paragraph::new(status).style(style::bar_style()), area);
}

pub fn render_toast_bar(model: &Model, frame: &mut Frame, area: Rect) {
    let Some((message, level)) = model.active_toast() else {
        return;
    };
    let (prefix, style) = match level {
        ToastLevel::Info => ("[info]", Style::default().bg(Color::Blue).fg(Color::White)),
        ToastLevel::Warning => (
            "[warn]",
            Style::default().bg(Color::Yellow).fg(Color::Black),
        ),
        ToastLevel::Error => ("[error]", Style::default().bg(Color::Red).fg(Color::White)),
    };
    let toast = Paragraph::new(format!("{prefix} {message}")).style(style);
    frame.render_widget(toast, area);
}
