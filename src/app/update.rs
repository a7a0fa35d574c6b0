use std::path::PathBuf;

use crate::diagram::ThemeId;
use crate::editor::Direction;
use crate::templates::TEMPLATES;

use super::model::{ExportForm, Model, Overlay, ToastLevel};

/// How a finished export turned out, as reported back to the model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportStatus {
    Saved { path: PathBuf, bytes: usize },
    Failed(String),
}

/// All possible events and actions in the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    // Editing
    /// Insert a typed character at the cursor
    InsertChar(char),
    /// Insert one indent step
    InsertTab,
    /// Insert pasted text
    Paste(String),
    /// Break the line at the cursor
    NewLine,
    /// Delete the character before the cursor
    Backspace,
    /// Delete the character under the cursor
    Delete,

    // Cursor
    CursorMove(Direction),
    CursorHome,
    CursorEnd,
    CursorWordLeft,
    CursorWordRight,
    CursorBufferStart,
    CursorBufferEnd,
    /// Move the cursor one editor page up
    PageUp,
    /// Move the cursor one editor page down
    PageDown,
    /// Place the cursor at a byte column of a line (mouse click)
    CursorTo { line: usize, col: usize },
    /// Scroll the editor view by lines without moving the cursor
    ScrollEditor(isize),

    /// Swap the editor and preview on a narrow terminal
    TogglePane,

    // Overlays
    ToggleHelp,
    OpenThemePicker,
    OpenTemplatePicker,
    OpenExportSettings,
    CloseOverlay,
    OverlayUp,
    OverlayDown,
    /// Cycle a choice backwards (export background)
    OverlayLeft,
    /// Cycle a choice forwards (export background)
    OverlayRight,
    /// Pick a list entry directly and apply it
    OverlaySelect(usize),
    /// Apply the highlighted entry or the form
    OverlayConfirm,
    FormNextField,
    FormPrevField,
    FormInput(char),
    FormBackspace,

    // Actions
    /// Export the current diagram as SVG
    RequestExport,
    /// The export worker finished
    ExportFinished(ExportStatus),
    /// Close the alert popup
    DismissAlert,
    /// Terminal resized (debounced)
    Resize(u16, u16),
    /// Quit the application
    Quit,
}

/// Pure state transition. Side effects (worker submission) happen in the
/// event loop after this returns.
pub fn update(mut model: Model, msg: Message) -> Model {
    let _scope = crate::perf::scope("app.update");
    match msg {
        Message::InsertChar(ch) => {
            model.buffer.insert_char(ch);
            model.ensure_cursor_visible();
        }
        Message::InsertTab => {
            model.buffer.indent();
            model.ensure_cursor_visible();
        }
        Message::Paste(text) => {
            model.buffer.insert_str(&text.replace('\t', crate::editor::INDENT));
            model.ensure_cursor_visible();
        }
        Message::NewLine => {
            model.buffer.split_line();
            model.ensure_cursor_visible();
        }
        Message::Backspace => {
            model.buffer.delete_back();
            model.ensure_cursor_visible();
        }
        Message::Delete => {
            model.buffer.delete_forward();
            model.ensure_cursor_visible();
        }

        Message::CursorMove(direction) => {
            model.buffer.move_cursor(direction);
            model.ensure_cursor_visible();
        }
        Message::CursorHome => {
            model.buffer.move_home();
            model.ensure_cursor_visible();
        }
        Message::CursorEnd => {
            model.buffer.move_end();
            model.ensure_cursor_visible();
        }
        Message::CursorWordLeft => {
            model.buffer.move_word_left();
            model.ensure_cursor_visible();
        }
        Message::CursorWordRight => {
            model.buffer.move_word_right();
            model.ensure_cursor_visible();
        }
        Message::CursorBufferStart => {
            model.buffer.move_to_start();
            model.ensure_cursor_visible();
        }
        Message::CursorBufferEnd => {
            model.buffer.move_to_end();
            model.ensure_cursor_visible();
        }
        Message::PageUp => {
            let page = isize::try_from(model.editor_view_height()).unwrap_or(1);
            model.buffer.move_lines(-page.max(1));
            model.ensure_cursor_visible();
        }
        Message::PageDown => {
            let page = isize::try_from(model.editor_view_height()).unwrap_or(1);
            model.buffer.move_lines(page.max(1));
            model.ensure_cursor_visible();
        }
        Message::CursorTo { line, col } => {
            model.buffer.move_to(line, col);
            model.ensure_cursor_visible();
        }
        Message::ScrollEditor(delta) => model.scroll_editor(delta),

        Message::TogglePane => model.narrow_pane = model.narrow_pane.toggle(),
        Message::ToggleHelp => {
            model.overlay = match model.overlay {
                Some(Overlay::Help { .. }) => None,
                _ => Some(Overlay::Help { scroll: 0 }),
            };
        }
        Message::OpenThemePicker => {
            model.overlay = Some(Overlay::ThemePicker {
                selected: model.theme.index(),
            });
        }
        Message::OpenTemplatePicker => {
            model.overlay = Some(Overlay::TemplatePicker { selected: 0 });
        }
        Message::OpenExportSettings => {
            model.overlay = Some(Overlay::ExportSettings(ExportForm::from_config(
                &model.export_config,
            )));
        }
        Message::CloseOverlay => model.overlay = None,
        Message::OverlayUp => overlay_step(&mut model, -1),
        Message::OverlayDown => overlay_step(&mut model, 1),
        Message::OverlayLeft => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut() {
                form.background = form.background.prev();
            }
        }
        Message::OverlayRight => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut() {
                form.background = form.background.next();
            }
        }
        Message::OverlaySelect(idx) => {
            match model.overlay.as_mut() {
                Some(Overlay::ThemePicker { selected }) if idx < ThemeId::ALL.len() => {
                    *selected = idx;
                }
                Some(Overlay::TemplatePicker { selected }) if idx < TEMPLATES.len() => {
                    *selected = idx;
                }
                _ => return model,
            }
            confirm_overlay(&mut model);
        }
        Message::OverlayConfirm => confirm_overlay(&mut model),
        Message::FormNextField => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut() {
                form.focus = form.focus.next();
            }
        }
        Message::FormPrevField => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut() {
                form.focus = form.focus.prev();
            }
        }
        Message::FormInput(ch) => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut()
                && ch.is_ascii_digit()
                && let Some(text) = form.focused_text_mut()
                && text.len() < 5
            {
                text.push(ch);
            }
        }
        Message::FormBackspace => {
            if let Some(Overlay::ExportSettings(form)) = model.overlay.as_mut()
                && let Some(text) = form.focused_text_mut()
            {
                text.pop();
            }
        }

        Message::RequestExport => {
            if model.export_in_flight {
                model.show_toast(ToastLevel::Warning, "An export is already running");
                return model;
            }
            if model.buffer.is_blank() {
                model.alert = Some(crate::export::ExportError::EmptySource.to_string());
                return model;
            }
            model.pending_export = Some(model.export_request());
            model.export_in_flight = true;
        }
        Message::ExportFinished(status) => {
            model.export_in_flight = false;
            match status {
                ExportStatus::Saved { path, bytes } => {
                    model.show_toast(
                        ToastLevel::Info,
                        format!("Exported {} ({bytes} bytes)", path.display()),
                    );
                }
                ExportStatus::Failed(message) => model.alert = Some(message),
            }
        }
        Message::DismissAlert => model.alert = None,
        Message::Resize(width, height) => {
            model.terminal_size = (width, height);
            model.ensure_cursor_visible();
        }
        Message::Quit => model.should_quit = true,
    }
    model
}

fn overlay_step(model: &mut Model, delta: isize) {
    let step = |selected: &mut usize, len: usize| {
        *selected = selected.saturating_add_signed(delta).min(len.saturating_sub(1));
    };
    match model.overlay.as_mut() {
        Some(Overlay::Help { scroll }) => {
            *scroll = scroll.saturating_add_signed(i16::try_from(delta).unwrap_or(0));
        }
        Some(Overlay::ThemePicker { selected }) => step(selected, ThemeId::ALL.len()),
        Some(Overlay::TemplatePicker { selected }) => step(selected, TEMPLATES.len()),
        Some(Overlay::ExportSettings(form)) => {
            form.focus = if delta < 0 {
                form.focus.prev()
            } else {
                form.focus.next()
            };
        }
        None => {}
    }
}

fn confirm_overlay(model: &mut Model) {
    match model.overlay.take() {
        Some(Overlay::ThemePicker { selected }) => {
            model.theme = ThemeId::from_index(selected);
        }
        Some(Overlay::TemplatePicker { selected }) => {
            if let Some(template) = TEMPLATES.get(selected) {
                model.buffer.replace_all(template.source);
                model.editor_scroll_offset = 0;
                model.editor_hscroll = 0;
            }
        }
        Some(Overlay::ExportSettings(form)) => {
            model.export_config = form.to_config();
            let config = model.export_config;
            model.show_toast(
                ToastLevel::Info,
                format!(
                    "Export set to {}, background {}",
                    config.size_label(),
                    config.background.label()
                ),
            );
        }
        Some(Overlay::Help { .. }) | None => {}
    }
}
