use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui_image::protocol::StatefulProtocolType;
use ratatui_image::{Resize, StatefulImage};

use crate::app::Model;
use crate::pipeline::{RenderState, RenderedDiagram};

use super::style;

pub fn render_preview(model: &mut Model, frame: &mut Frame, area: Rect) {
    let popup = super::popup_open(model.overlay.as_ref(), model.alert.is_some());
    let block = Block::default()
        .title(format!(" Preview [{}] ", model.theme.label()))
        .borders(Borders::ALL)
        .border_style(style::pane_border_style(false));
    frame.render_widget(block, area);

    let inner = super::preview_image_area(area);
    if inner.is_empty() {
        return;
    }

    match model.pipeline.state() {
        RenderState::Empty => {
            let lines = vec![
                Line::styled(
                    "Start writing Mermaid code",
                    Style::default().add_modifier(Modifier::BOLD),
                ),
                Line::styled("The live preview appears here as you type", style::dim_style()),
                Line::styled("F3 picks a starter template", style::dim_style()),
            ];
            render_centered(frame, inner, lines);
        }
        RenderState::Loading => {
            let line = Line::styled(
                "Rendering...",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            );
            render_centered(frame, inner, vec![line]);
        }
        RenderState::Error(message) => {
            let lines = vec![
                Line::styled(
                    "Syntax error",
                    style::error_style().add_modifier(Modifier::BOLD),
                ),
                Line::raw(""),
                Line::styled(message.clone(), style::error_style()),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), inner);
        }
        RenderState::Rendered(diagram) => match model.preview_protocol.as_mut() {
            // Graphics protocols can bleed through popups, so hold the image
            // back while one is open.
            Some(protocol) if !popup => {
                let halfblocks = matches!(
                    protocol.protocol_type(),
                    StatefulProtocolType::Halfblocks(_)
                );
                let resize = if halfblocks {
                    Resize::Fit(Some(image::imageops::FilterType::CatmullRom))
                } else {
                    Resize::Fit(None)
                };
                frame.render_stateful_widget(StatefulImage::default().resize(resize), inner, protocol);
                if halfblocks && !crate::image::supports_truecolor_terminal() {
                    index_colours(frame.buffer_mut(), inner);
                }
            }
            _ => {
                let lines = summary_lines(diagram, model.images_enabled, popup);
                frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
            }
        },
    }
}

/// Text shown instead of the image.
fn summary_lines(diagram: &RenderedDiagram, images_enabled: bool, popup: bool) -> Vec<Line<'static>> {
    let size = match (
        crate::export::svg::root_attribute(&diagram.svg, "width"),
        crate::export::svg::root_attribute(&diagram.svg, "height"),
    ) {
        (Some(w), Some(h)) => format!("{w} x {h}"),
        _ => "unsized".to_string(),
    };
    let hint = if popup {
        "Preview hidden while a dialog is open"
    } else if images_enabled {
        "This terminal cannot display images; Ctrl+E exports the SVG"
    } else {
        "Images are disabled (--no-images); Ctrl+E exports the SVG"
    };
    vec![
        Line::styled(
            "Diagram rendered",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        Line::raw(""),
        Line::raw(format!("id    {}", diagram.id)),
        Line::raw(format!("size  {size}")),
        Line::raw(format!("svg   {} bytes", diagram.svg.len())),
        Line::raw(""),
        Line::styled(hint, style::dim_style()),
    ]
}

fn render_centered(frame: &mut Frame, area: Rect, lines: Vec<Line<'static>>) {
    let height = u16::try_from(lines.len()).unwrap_or(u16::MAX).min(area.height);
    let top = area.y + area.height.saturating_sub(height) / 2;
    let target = Rect::new(area.x, top, area.width, height);
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        target,
    );
}

/// Terminal.app and other non-truecolor terminals behave better with
/// indexed colours than with truecolor half-block cells.
fn index_colours(buf: &mut Buffer, area: Rect) {
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            let cell = &mut buf[(x, y)];
            if let Color::Rgb(r, g, b) = cell.fg {
                cell.fg = Color::Indexed(crate::image::rgb_to_xterm_256(r, g, b));
            }
            if let Color::Rgb(r, g, b) = cell.bg {
                cell.bg = Color::Indexed(crate::image::rgb_to_xterm_256(r, g, b));
            }
        }
    }
}
