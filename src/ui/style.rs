//! Colours for the editor chrome and highlighted source.
//!
//! Uses ANSI colours that adapt to the terminal's palette, switching to
//! darker indexed shades on light backgrounds.

use ratatui::style::{Color, Modifier, Style};

use crate::highlight::TokenStyle;

/// Style for one highlighted run of Mermaid source.
pub fn token_style(token: TokenStyle) -> Style {
    let mut style = Style::default();
    if let Some((r, g, b)) = token.fg {
        style = style.fg(Color::Rgb(r, g, b));
    }
    if token.bold {
        style = style.add_modifier(Modifier::BOLD);
    }
    if token.italic {
        style = style.add_modifier(Modifier::ITALIC);
    }
    style
}

pub fn gutter_style(current_line: bool) -> Style {
    let light_bg = crate::highlight::is_light_background();
    match (current_line, light_bg) {
        (true, true) => Style::default()
            .fg(Color::Indexed(236))
            .add_modifier(Modifier::BOLD),
        (true, false) => Style::default()
            .fg(Color::Indexed(252))
            .add_modifier(Modifier::BOLD),
        (false, true) => Style::default().fg(Color::Indexed(246)),
        (false, false) => Style::default().fg(Color::Indexed(240)),
    }
}

pub fn pane_border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::Indexed(245))
    }
}

pub fn bar_style() -> Style {
    Style::default().bg(Color::DarkGray).fg(Color::White)
}

pub fn section_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

pub fn dim_style() -> Style {
    Style::default().fg(Color::Indexed(245))
}

pub fn error_style() -> Style {
    Style::default().fg(Color::Red)
}

pub fn popup_style() -> Style {
    Style::default().bg(Color::Black).fg(Color::White)
}

pub fn selected_style() -> Style {
    Style::default()
        .bg(Color::Cyan)
        .fg(Color::Black)
        .add_modifier(Modifier::BOLD)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_style_maps_colour_and_modifiers() {
        let style = token_style(TokenStyle {
            fg: Some((1, 2, 3)),
            bold: true,
            italic: true,
        });
        assert_eq!(style.fg, Some(Color::Rgb(1, 2, 3)));
        assert!(style.add_modifier.contains(Modifier::BOLD));
        assert!(style.add_modifier.contains(Modifier::ITALIC));
    }

    #[test]
    fn test_plain_token_keeps_terminal_colour() {
        assert_eq!(token_style(TokenStyle::default()), Style::default());
    }
}
