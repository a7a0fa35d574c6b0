//! Syntax highlighting for Mermaid source.
//!
//! A bundled sublime-syntax definition registers the language with syntect
//! and a small built-in theme colours its tokens. Highlighting is purely
//! cosmetic; it never affects what gets rendered.

use std::str::FromStr;
use std::sync::{Mutex, OnceLock};

use syntect::easy::HighlightLines;
use syntect::highlighting::{
    Color, FontStyle, ScopeSelectors, StyleModifier, Theme, ThemeItem, ThemeSettings,
};
use syntect::parsing::{SyntaxDefinition, SyntaxReference, SyntaxSet, SyntaxSetBuilder};

const MERMAID_SYNTAX: &str = include_str!("../../assets/mermaid.sublime-syntax");

const PLAIN: Color = Color {
    r: 0xd4,
    g: 0xd4,
    b: 0xd4,
    a: 0xff,
};

/// Colour and weight for one highlighted run of text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenStyle {
    /// `None` keeps the terminal's default foreground.
    pub fg: Option<(u8, u8, u8)>,
    pub bold: bool,
    pub italic: bool,
}

/// Highlight a single line of Mermaid source.
pub fn highlight_line(line: &str) -> Vec<(TokenStyle, String)> {
    let mut highlighter = Highlighter::new();
    highlighter.line(line)
}

/// Stateful highlighter for consecutive lines.
pub struct Highlighter {
    inner: Option<HighlightLines<'static>>,
    mode: BackgroundMode,
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

impl Highlighter {
    pub fn new() -> Self {
        Self {
            inner: mermaid_syntax().map(|syntax| HighlightLines::new(syntax, theme())),
            mode: background_mode(),
        }
    }

    /// Highlight the next line. Falls back to one plain run on any failure.
    pub fn line(&mut self, line: &str) -> Vec<(TokenStyle, String)> {
        let plain = || vec![(TokenStyle::default(), line.to_string())];
        let Some(inner) = self.inner.as_mut() else {
            return plain();
        };
        let Ok(ranges) = inner.highlight_line(line, syntax_set()) else {
            return plain();
        };
        ranges
            .into_iter()
            .filter(|(_, text)| !text.is_empty())
            .map(|(style, text)| {
                let fg = (style.foreground != PLAIN).then(|| {
                    adjust_fg_for_background(
                        (style.foreground.r, style.foreground.g, style.foreground.b),
                        self.mode,
                    )
                });
                let token = TokenStyle {
                    fg,
                    bold: style.font_style.contains(FontStyle::BOLD),
                    italic: style.font_style.contains(FontStyle::ITALIC),
                };
                (token, text.to_string())
            })
            .collect()
    }
}

impl std::fmt::Debug for Highlighter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Highlighter")
            .field("loaded", &self.inner.is_some())
            .field("mode", &self.mode)
            .finish()
    }
}

fn syntax_set() -> &'static SyntaxSet {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    SYNTAX_SET.get_or_init(|| {
        let _scope = crate::perf::scope("highlight.syntax_set.build");
        let mut builder = SyntaxSetBuilder::new();
        match SyntaxDefinition::load_from_str(MERMAID_SYNTAX, false, Some("mermaid")) {
            Ok(def) => builder.add(def),
            Err(err) => tracing::warn!(error = %err, "mermaid syntax failed to load"),
        }
        builder.build()
    })
}

fn mermaid_syntax() -> Option<&'static SyntaxReference> {
    syntax_set().find_syntax_by_name("Mermaid")
}

const fn rgb(r: u8, g: u8, b: u8) -> Color {
    Color { r, g, b, a: 0xff }
}

fn item(selector: &str, fg: Color, font_style: FontStyle) -> ThemeItem {
    ThemeItem {
        scope: ScopeSelectors::from_str(selector).unwrap_or_default(),
        style: StyleModifier {
            foreground: Some(fg),
            background: None,
            font_style: Some(font_style),
        },
    }
}

fn theme() -> &'static Theme {
    static THEME: OnceLock<Theme> = OnceLock::new();
    THEME.get_or_init(|| Theme {
        name: Some("mermedit".to_string()),
        author: None,
        settings: ThemeSettings {
            foreground: Some(PLAIN),
            ..ThemeSettings::default()
        },
        scopes: vec![
            item("keyword.control, keyword.other", rgb(0x00, 0x66, 0xcc), FontStyle::BOLD),
            item("keyword.operator", rgb(0x66, 0x66, 0x66), FontStyle::empty()),
            item("string", rgb(0x00, 0x80, 0x00), FontStyle::empty()),
            item("comment", rgb(0x99, 0x99, 0x99), FontStyle::ITALIC),
            item("constant.numeric", rgb(0xff, 0x66, 0x00), FontStyle::empty()),
        ],
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackgroundMode {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightBackground {
    Light,
    Dark,
}

static BACKGROUND_OVERRIDE: OnceLock<Mutex<Option<HighlightBackground>>> = OnceLock::new();

/// Force the background assumption, or `None` to detect from `COLORFGBG`.
pub fn set_background_mode(mode: Option<HighlightBackground>) {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(mut guard) = lock.lock() {
        *guard = mode;
    }
}

/// Whether colours should assume a light terminal background.
pub fn is_light_background() -> bool {
    background_mode() == BackgroundMode::Light
}

fn background_mode() -> BackgroundMode {
    let lock = BACKGROUND_OVERRIDE.get_or_init(|| Mutex::new(None));
    if let Ok(guard) = lock.lock() {
        if let Some(mode) = *guard {
            return match mode {
                HighlightBackground::Light => BackgroundMode::Light,
                HighlightBackground::Dark => BackgroundMode::Dark,
            };
        }
    }
    background_mode_from_colorfgbg(std::env::var("COLORFGBG").ok().as_deref())
}

fn background_mode_from_colorfgbg(colorfgbg: Option<&str>) -> BackgroundMode {
    let Some(value) = colorfgbg else {
        return BackgroundMode::Dark;
    };
    let bg_str = value.rsplit(';').next().unwrap_or(value);
    match bg_str.parse::<u8>() {
        Ok(bg) if bg >= 7 => BackgroundMode::Light,
        _ => BackgroundMode::Dark,
    }
}

fn luma((r, g, b): (u8, u8, u8)) -> f32 {
    0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    )
}

/// Keep token colours readable: dark tokens are lifted on dark
/// backgrounds, bright ones are dimmed on light backgrounds.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn adjust_fg_for_background(color: (u8, u8, u8), mode: BackgroundMode) -> (u8, u8, u8) {
    let (r, g, b) = color;
    match mode {
        BackgroundMode::Dark if luma(color) < 100.0 => {
            let lift = |c: u8| (f32::from(c) + (255.0 - f32::from(c)) * 0.45).round() as u8;
            (lift(r), lift(g), lift(b))
        }
        BackgroundMode::Light if luma(color) >= 155.0 => {
            let dim = |c: u8| (f32::from(c) * 0.42).round() as u8;
            (dim(r), dim(g), dim(b))
        }
        _ => color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styled(line: &str, needle: &str) -> TokenStyle {
        highlight_line(line)
            .into_iter()
            .find(|(_, text)| text.contains(needle))
            .map(|(style, _)| style)
            .unwrap_or_else(|| panic!("no run containing {needle:?}"))
    }

    #[test]
    fn test_mermaid_syntax_is_registered() {
        assert!(mermaid_syntax().is_some());
    }

    #[test]
    fn test_highlight_preserves_text() {
        let line = "    A[Start] --> B{Ok?} %% note";
        let joined: String = highlight_line(line).into_iter().map(|(_, t)| t).collect();
        assert_eq!(joined, line);
    }

    #[test]
    fn test_diagram_keyword_is_bold_and_coloured() {
        let style = styled("graph TD", "graph");
        assert!(style.bold);
        assert!(style.fg.is_some());
    }

    #[test]
    fn test_comment_is_italic() {
        let style = styled("%% a comment", "comment");
        assert!(style.italic);
    }

    #[test]
    fn test_operator_number_and_label_are_coloured() {
        let line = "A[Start] --> B : 42";
        let op = styled(line, "-->");
        let label = styled(line, "[Start]");
        let num = styled(line, "42");
        assert!(op.fg.is_some());
        assert!(label.fg.is_some());
        assert!(num.fg.is_some());
        assert_ne!(label.fg, num.fg);
    }

    #[test]
    fn test_plain_identifiers_keep_terminal_colour() {
        let style = styled("A --> B", "A");
        assert_eq!(style.fg, None);
    }

    #[test]
    fn test_colorfgbg_dark_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("15;0")), BackgroundMode::Dark);
    }

    #[test]
    fn test_colorfgbg_light_background() {
        assert_eq!(background_mode_from_colorfgbg(Some("0;15")), BackgroundMode::Light);
    }

    #[test]
    fn test_background_override() {
        set_background_mode(Some(HighlightBackground::Light));
        assert_eq!(background_mode(), BackgroundMode::Light);
        set_background_mode(Some(HighlightBackground::Dark));
        assert_eq!(background_mode(), BackgroundMode::Dark);
        set_background_mode(None);
    }

    #[test]
    fn test_dark_mode_lifts_dark_keyword_blue() {
        let adjusted = adjust_fg_for_background((0x00, 0x66, 0xcc), BackgroundMode::Dark);
        assert!(luma(adjusted) > luma((0x00, 0x66, 0xcc)));
    }

    #[test]
    fn test_light_mode_caps_luma_for_readability() {
        let adjusted = adjust_fg_for_background((240, 230, 120), BackgroundMode::Light);
        assert!(luma(adjusted) < 120.0);
    }
}
