use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Padding, Paragraph, Wrap};

use crate::app::{ExportField, ExportForm, Model, Overlay};
use crate::diagram::{MAX_EXPORT_DIMENSION, MIN_EXPORT_DIMENSION, ThemeId};
use crate::templates::TEMPLATES;

use super::style;

const PICKER_WIDTH: u16 = 44;
const EXPORT_FORM_WIDTH: u16 = 48;
const EXPORT_FORM_HEIGHT: u16 = 11;
const ALERT_WIDTH: u16 = 50;

/// Screen rectangle a popup occupies. Mouse handling uses this to tell
/// clicks inside a popup from clicks outside it.
pub fn overlay_rect(area: Rect, overlay: &Overlay) -> Rect {
    match overlay {
        Overlay::Help { .. } => help_rect(area),
        Overlay::ThemePicker { .. } => picker_rect(area, ThemeId::ALL.len()),
        Overlay::TemplatePicker { .. } => picker_rect(area, TEMPLATES.len()),
        Overlay::ExportSettings(_) => {
            centered_popup_rect(EXPORT_FORM_WIDTH, EXPORT_FORM_HEIGHT, area)
        }
    }
}

fn help_rect(area: Rect) -> Rect {
    let popup_width = area.width.saturating_sub(12).max(48);
    let popup_height = area.height.saturating_sub(6).max(12);
    centered_popup_rect(popup_width, popup_height, area)
}

/// List popups: one row per item between the borders, plus a hint row.
#[allow(clippy::cast_possible_truncation)]
fn picker_rect(area: Rect, items_len: usize) -> Rect {
    centered_popup_rect(PICKER_WIDTH, items_len as u16 + 3, area)
}

pub fn render_theme_picker(model: &Model, selected: usize, frame: &mut Frame, area: Rect) {
    let items = ThemeId::ALL
        .iter()
        .map(|theme| {
            let marker = if *theme == model.theme { "*" } else { " " };
            format!("{marker} {:<10} {}", theme.label(), theme.as_str())
        })
        .collect::<Vec<_>>();
    render_picker(" Theme ", &items, selected, frame, picker_rect(area, items.len()));
}

pub fn render_template_picker(selected: usize, frame: &mut Frame, area: Rect) {
    let items = TEMPLATES
        .iter()
        .map(|template| format!("  {:<10} {}", template.name, template.header()))
        .collect::<Vec<_>>();
    render_picker(" Template ", &items, selected, frame, picker_rect(area, items.len()));
}

fn render_picker(title: &str, items: &[String], selected: usize, frame: &mut Frame, popup: Rect) {
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .style(style::popup_style());
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let inner = Rect::new(
        popup.x + 1,
        popup.y + 1,
        popup.width.saturating_sub(2),
        popup.height.saturating_sub(2),
    );
    let mut lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| {
            let text = format!("{} {item}", idx + 1);
            if idx == selected {
                Line::styled(text, style::selected_style())
            } else {
                Line::raw(text)
            }
        })
        .collect();
    lines.push(Line::styled("Enter picks \u{2502} Esc cancels", style::dim_style()));
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_export_settings(form: &ExportForm, frame: &mut Frame, area: Rect) {
    let popup = centered_popup_rect(EXPORT_FORM_WIDTH, EXPORT_FORM_HEIGHT, area);
    let block = Block::default()
        .title(" Export settings ")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(style::popup_style());
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let field = |label: &str, value: String, focused: bool| {
        let value_style = if focused {
            style::selected_style()
        } else {
            Style::default().add_modifier(Modifier::UNDERLINED)
        };
        Line::from(vec![
            Span::raw(format!("{label:<12}")),
            Span::styled(format!(" {value:<8} "), value_style),
        ])
    };
    let auto = |text: &str| {
        if text.is_empty() {
            "auto".to_string()
        } else {
            text.to_string()
        }
    };
    let background = format!("< {} >", form.background.label());

    let lines = vec![
        Line::styled("Size (pixels)", style::section_style()),
        field("Width", auto(&form.width), form.focus == ExportField::Width),
        field("Height", auto(&form.height), form.focus == ExportField::Height),
        Line::raw(""),
        Line::styled("Background", style::section_style()),
        field("Fill", background, form.focus == ExportField::Background),
        Line::raw(""),
        Line::styled(
            format!("{MIN_EXPORT_DIMENSION}-{MAX_EXPORT_DIMENSION} px, empty keeps the diagram size"),
            style::dim_style(),
        ),
        Line::styled("Tab next \u{2502} Left/Right fill \u{2502} Enter saves", style::dim_style()),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

pub fn render_alert(message: &str, frame: &mut Frame, area: Rect) {
    let text_width = ALERT_WIDTH.saturating_sub(4).max(1);
    #[allow(clippy::cast_possible_truncation)]
    let wrapped_rows = (message.chars().count() as u16).div_ceil(text_width).max(1);
    let popup = centered_popup_rect(ALERT_WIDTH, wrapped_rows + 5, area);
    let block = Block::default()
        .title(" Notice ")
        .borders(Borders::ALL)
        .padding(Padding::horizontal(1))
        .style(Style::default().bg(Color::Black).fg(Color::Red));
    let inner = block.inner(popup);
    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    let lines = vec![
        Line::raw(""),
        Line::styled(message.to_string(), Style::default().fg(Color::White)),
        Line::raw(""),
        Line::styled("Press any key", style::dim_style()),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
}

pub fn render_help_overlay(model: &Model, scroll: u16, frame: &mut Frame, area: Rect) {
    let popup = help_rect(area);

    let global_cfg = model
        .config_global_path
        .as_ref()
        .map_or_else(|| "<unknown>".to_string(), |p| p.display().to_string());
    let local_cfg = model
        .config_local_path
        .as_ref()
        .map_or_else(|| "<none>".to_string(), |p| p.display().to_string());

    let section_style = style::section_style();
    let mut all_lines: Vec<Line> = Vec::new();

    all_lines.push(Line::styled("Editing", section_style));
    all_lines.push(Line::raw("  Type                Edit the diagram source"));
    all_lines.push(Line::raw("  Tab                 Indent two spaces"));
    all_lines.push(Line::raw("  Arrows, Home/End    Move the cursor"));
    all_lines.push(Line::raw("  Ctrl+Left/Right     Word movement"));
    all_lines.push(Line::raw("  Ctrl+Home/End       Buffer start / end"));
    all_lines.push(Line::raw("  PageUp/PageDown     Page through the source"));
    all_lines.push(Line::raw("  Mouse               Click places cursor, wheel scrolls"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Diagram", section_style));
    all_lines.push(Line::raw("  F2                  Choose theme"));
    all_lines.push(Line::raw("  F3                  Load a template (replaces the source)"));
    all_lines.push(Line::raw("  F4                  Export size and background"));
    all_lines.push(Line::raw("  Ctrl+E              Export SVG"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Other", section_style));
    all_lines.push(Line::raw("  F1                  Toggle help"));
    all_lines.push(Line::raw(format!(
        "  F5                  Editor / preview below {} columns",
        super::SPLIT_MIN_WIDTH
    )));
    all_lines.push(Line::raw("  Ctrl+Q / Ctrl+C     Quit"));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Export", section_style));
    all_lines.push(Line::raw(format!("  Directory: {}", model.out_dir.display())));
    all_lines.push(Line::raw(format!("  File: {}", crate::export::EXPORT_FILENAME)));
    all_lines.push(Line::raw(""));

    all_lines.push(Line::styled("Config", section_style));
    all_lines.push(Line::raw(format!("  Global: {global_cfg}")));
    all_lines.push(Line::raw(format!("  Local override: {local_cfg}")));

    let block = Block::default()
        .title("Help")
        .borders(Borders::ALL)
        .padding(Padding::uniform(1))
        .style(style::popup_style());

    frame.render_widget(Clear, popup);
    frame.render_widget(block, popup);

    // Inner area: border(1) + padding(1) on each side = 4
    let inner = Rect::new(
        popup.x + 2,
        popup.y + 2,
        popup.width.saturating_sub(4),
        popup.height.saturating_sub(4),
    );

    // Reserve 1 row at bottom for footer hint
    let content_height_u16 = inner.height.saturating_sub(1);
    let content_height = content_height_u16 as usize;
    let max_scroll = all_lines.len().saturating_sub(content_height);
    let scroll = (scroll as usize).min(max_scroll);

    let end = (scroll + content_height).min(all_lines.len());
    let visible: Vec<Line> = all_lines[scroll..end].to_vec();

    let content_area = Rect::new(inner.x, inner.y, inner.width, content_height_u16);
    frame.render_widget(Paragraph::new(visible), content_area);

    let footer_area = Rect::new(inner.x, inner.y + content_height_u16, inner.width, 1);
    let footer = Line::styled("Up/Down scroll \u{2502} any key closes", style::dim_style());
    frame.render_widget(Paragraph::new(footer), footer_area);
}

fn centered_popup_rect(width: u16, height: u16, area: Rect) -> Rect {
    let w = width.min(area.width);
    let h = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(w) / 2);
    let y = area.y + (area.height.saturating_sub(h) / 2);
    Rect::new(x, y, w, h)
}
