use std::fmt;
use std::str::FromStr;

pub const DEFAULT_EXPORT_WIDTH: u32 = 800;
pub const DEFAULT_EXPORT_HEIGHT: u32 = 600;
pub const MIN_EXPORT_DIMENSION: u32 = 100;
pub const MAX_EXPORT_DIMENSION: u32 = 4000;

/// Background painted behind an exported diagram.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Background {
    #[default]
    Transparent,
    White,
    LightGray,
    DarkGray,
    Black,
}

impl Background {
    pub const ALL: [Self; 5] = [
        Self::Transparent,
        Self::White,
        Self::LightGray,
        Self::DarkGray,
        Self::Black,
    ];

    /// CSS colour value injected into the exported SVG, or `None` for transparent.
    pub const fn css_value(self) -> Option<&'static str> {
        match self {
            Self::Transparent => None,
            Self::White => Some("white"),
            Self::LightGray => Some("#f8f9fa"),
            Self::DarkGray => Some("#343a40"),
            Self::Black => Some("black"),
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Transparent => "Transparent",
            Self::White => "White",
            Self::LightGray => "Light gray",
            Self::DarkGray => "Dark gray",
            Self::Black => "Black",
        }
    }

    /// Config-file token for this background.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Transparent => "transparent",
            Self::White => "white",
            Self::LightGray => "light-gray",
            Self::DarkGray => "dark-gray",
            Self::Black => "black",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|b| *b == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl fmt::Display for Background {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Background {
    type Err = String;

    /// Accepts the token names as well as the CSS values.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|bg| bg.as_str() == needle || bg.css_value() == Some(needle.as_str()))
            .ok_or_else(|| format!("unknown background '{s}'"))
    }
}

/// Size and background applied to an exported SVG.
///
/// `None` for a dimension leaves whatever the renderer produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportConfig {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub background: Background,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            width: Some(DEFAULT_EXPORT_WIDTH),
            height: Some(DEFAULT_EXPORT_HEIGHT),
            background: Background::Transparent,
        }
    }
}

impl ExportConfig {
    pub fn size_label(&self) -> String {
        let fmt_dim = |d: Option<u32>| d.map_or_else(|| "auto".to_string(), |v| v.to_string());
        format!("{}x{}", fmt_dim(self.width), fmt_dim(self.height))
    }
}

/// Parse a width/height field the way the export form does.
///
/// Empty input means "auto". Garbage falls back to `fallback`. Numbers are
/// clamped into the accepted export range.
pub fn parse_dimension(input: &str, fallback: u32) -> Option<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let value = trimmed
        .parse::<u32>()
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(fallback);
    Some(value.clamp(MIN_EXPORT_DIMENSION, MAX_EXPORT_DIMENSION))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_export_config_matches_form_defaults() {
        let cfg = ExportConfig::default();
        assert_eq!(cfg.width, Some(800));
        assert_eq!(cfg.height, Some(600));
        assert_eq!(cfg.background, Background::Transparent);
        assert_eq!(cfg.size_label(), "800x600");
    }

    #[test]
    fn test_background_cycles_through_palette() {
        let mut bg = Background::Transparent;
        for _ in 0..Background::ALL.len() {
            bg = bg.next();
        }
        assert_eq!(bg, Background::Transparent);
        assert_eq!(Background::Transparent.prev(), Background::Black);
    }

    #[test]
    fn test_background_parses_tokens_and_css_values() {
        assert_eq!("white".parse::<Background>(), Ok(Background::White));
        assert_eq!("#343A40".parse::<Background>(), Ok(Background::DarkGray));
        assert_eq!("light-gray".parse::<Background>(), Ok(Background::LightGray));
        assert!("magenta".parse::<Background>().is_err());
    }

    #[test]
    fn test_transparent_has_no_css_value() {
        assert_eq!(Background::Transparent.css_value(), None);
        assert_eq!(Background::White.css_value(), Some("white"));
    }

    #[test]
    fn test_parse_dimension_handles_empty_garbage_and_bounds() {
        assert_eq!(parse_dimension("", 800), None);
        assert_eq!(parse_dimension("abc", 800), Some(800));
        assert_eq!(parse_dimension("0", 600), Some(600));
        assert_eq!(parse_dimension("5", 800), Some(100));
        assert_eq!(parse_dimension("99999", 800), Some(4000));
        assert_eq!(parse_dimension(" 1024 ", 800), Some(1024));
    }
}
