use crossterm::event::{
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::layout::Rect;

use crate::app::{App, Message, Model};
use crate::editor::Direction;

use super::event_loop::ResizeDebouncer;
use super::model::Overlay;

/// Lines scrolled per mouse wheel notch.
const WHEEL_LINES: isize = 3;

impl App {
    pub(super) fn handle_event(
        event: &Event,
        model: &Model,
        now_ms: u64,
        resize_debouncer: &mut ResizeDebouncer,
    ) -> Option<Message> {
        match event {
            Event::Key(key) if key.kind != KeyEventKind::Release => Self::handle_key(*key, model),
            Event::Mouse(mouse) => Self::handle_mouse(*mouse, model),
            Event::Paste(text) if model.overlay.is_none() && model.alert.is_none() => {
                Some(Message::Paste(text.clone()))
            }
            Event::Resize(w, h) => {
                crate::perf::log_event("event.resize.queue", format!("width={w} height={h}"));
                resize_debouncer.queue(*w, *h, now_ms);
                None
            }
            _ => None,
        }
    }

    pub(super) fn handle_key(key: KeyEvent, model: &Model) -> Option<Message> {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if ctrl && matches!(key.code, KeyCode::Char('q' | 'c')) {
            return Some(Message::Quit);
        }

        if model.alert.is_some() {
            return Some(Message::DismissAlert);
        }

        match &model.overlay {
            Some(Overlay::Help { .. }) => return Some(help_key(key)),
            Some(Overlay::ThemePicker { .. } | Overlay::TemplatePicker { .. }) => {
                return picker_key(key);
            }
            Some(Overlay::ExportSettings(_)) => return export_form_key(key),
            None => {}
        }

        let alt = key.modifiers.contains(KeyModifiers::ALT);
        match key.code {
            KeyCode::F(1) => Some(Message::ToggleHelp),
            KeyCode::F(2) => Some(Message::OpenThemePicker),
            KeyCode::F(3) => Some(Message::OpenTemplatePicker),
            KeyCode::F(4) => Some(Message::OpenExportSettings),
            KeyCode::F(5) => Some(Message::TogglePane),
            KeyCode::Char('e') if ctrl => Some(Message::RequestExport),
            KeyCode::Char(c) if !ctrl && !alt => Some(Message::InsertChar(c)),
            KeyCode::Enter => Some(Message::NewLine),
            KeyCode::Tab => Some(Message::InsertTab),
            KeyCode::Backspace => Some(Message::Backspace),
            KeyCode::Delete => Some(Message::Delete),
            KeyCode::Left if ctrl => Some(Message::CursorWordLeft),
            KeyCode::Right if ctrl => Some(Message::CursorWordRight),
            KeyCode::Left => Some(Message::CursorMove(Direction::Left)),
            KeyCode::Right => Some(Message::CursorMove(Direction::Right)),
            KeyCode::Up => Some(Message::CursorMove(Direction::Up)),
            KeyCode::Down => Some(Message::CursorMove(Direction::Down)),
            KeyCode::Home if ctrl => Some(Message::CursorBufferStart),
            KeyCode::End if ctrl => Some(Message::CursorBufferEnd),
            KeyCode::Home => Some(Message::CursorHome),
            KeyCode::End => Some(Message::CursorEnd),
            KeyCode::PageUp => Some(Message::PageUp),
            KeyCode::PageDown => Some(Message::PageDown),
            _ => None,
        }
    }

    pub(super) fn handle_mouse(mouse: MouseEvent, model: &Model) -> Option<Message> {
        let area = model.terminal_area();

        if model.alert.is_some() {
            return matches!(mouse.kind, MouseEventKind::Down(_)).then_some(Message::DismissAlert);
        }

        if let Some(overlay) = &model.overlay {
            let popup = crate::ui::overlay_rect(area, overlay);
            return match mouse.kind {
                MouseEventKind::Down(MouseButton::Left) => {
                    if !point_in_rect(mouse.column, mouse.row, popup) {
                        return Some(Message::CloseOverlay);
                    }
                    let list_top = popup.y + 1;
                    match overlay {
                        Overlay::ThemePicker { .. } | Overlay::TemplatePicker { .. }
                            if mouse.row >= list_top =>
                        {
                            Some(Message::OverlaySelect((mouse.row - list_top) as usize))
                        }
                        _ => None,
                    }
                }
                MouseEventKind::ScrollUp => Some(Message::OverlayUp),
                MouseEventKind::ScrollDown => Some(Message::OverlayDown),
                _ => None,
            };
        }

        let layout = model.screen_layout();
        let text_area = crate::ui::editor_text_area(layout.editor);
        if !point_in_rect(mouse.column, mouse.row, layout.editor) {
            return None;
        }
        match mouse.kind {
            MouseEventKind::ScrollUp => Some(Message::ScrollEditor(-WHEEL_LINES)),
            MouseEventKind::ScrollDown => Some(Message::ScrollEditor(WHEEL_LINES)),
            MouseEventKind::Down(MouseButton::Left)
                if point_in_rect(mouse.column, mouse.row, text_area) =>
            {
                let line = model.editor_scroll_offset + (mouse.row - text_area.y) as usize;
                if line >= model.buffer.line_count() {
                    return Some(Message::CursorBufferEnd);
                }
                let gutter = crate::ui::gutter_width(model.buffer.line_count());
                let display_col = (mouse.column - text_area.x).saturating_sub(gutter) as usize
                    + model.editor_hscroll;
                let text = model.buffer.line_at(line).unwrap_or_default();
                let col = crate::ui::byte_col_at_display(&text, display_col);
                Some(Message::CursorTo { line, col })
            }
            _ => None,
        }
    }
}

fn help_key(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Up => Message::OverlayUp,
        KeyCode::Down => Message::OverlayDown,
        _ => Message::CloseOverlay,
    }
}

fn picker_key(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => Some(Message::OverlayUp),
        KeyCode::Down | KeyCode::Char('j') => Some(Message::OverlayDown),
        KeyCode::Enter => Some(Message::OverlayConfirm),
        KeyCode::Esc | KeyCode::F(2 | 3) | KeyCode::Char('q') => Some(Message::CloseOverlay),
        KeyCode::Char(c @ '1'..='9') => Some(Message::OverlaySelect(
            c.to_digit(10).map_or(0, |d| d as usize - 1),
        )),
        _ => None,
    }
}

fn export_form_key(key: KeyEvent) -> Option<Message> {
    match key.code {
        KeyCode::Tab | KeyCode::Down => Some(Message::FormNextField),
        KeyCode::BackTab | KeyCode::Up => Some(Message::FormPrevField),
        KeyCode::Left => Some(Message::OverlayLeft),
        KeyCode::Right | KeyCode::Char(' ') => Some(Message::OverlayRight),
        KeyCode::Char(c) if c.is_ascii_digit() => Some(Message::FormInput(c)),
        KeyCode::Backspace => Some(Message::FormBackspace),
        KeyCode::Enter => Some(Message::OverlayConfirm),
        KeyCode::Esc | KeyCode::F(4) => Some(Message::CloseOverlay),
        _ => None,
    }
}

const fn point_in_rect(col: u16, row: u16, rect: Rect) -> bool {
    col >= rect.x
        && col < rect.x.saturating_add(rect.width)
        && row >= rect.y
        && row < rect.y.saturating_add(rect.height)
}
