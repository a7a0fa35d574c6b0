use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Renderer theme, passed through verbatim to the diagram renderer.
#[derive(clap::ValueEnum, Serialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ThemeId {
    #[default]
    Default,
    Dark,
    Forest,
    Neutral,
    Base,
}

impl ThemeId {
    pub const ALL: [Self; 5] = [
        Self::Default,
        Self::Dark,
        Self::Forest,
        Self::Neutral,
        Self::Base,
    ];

    /// Name understood by the renderer's `theme` option.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Dark => "dark",
            Self::Forest => "forest",
            Self::Neutral => "neutral",
            Self::Base => "base",
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Default => "Default",
            Self::Dark => "Dark",
            Self::Forest => "Forest",
            Self::Neutral => "Neutral",
            Self::Base => "Base",
        }
    }

    /// Colours the renderer paints this theme with.
    pub const fn palette(self) -> &'static Palette {
        match self {
            Self::Default => &DEFAULT_PALETTE,
            Self::Dark => &DARK_PALETTE,
            Self::Forest => &FOREST_PALETTE,
            Self::Neutral => &NEUTRAL_PALETTE,
            Self::Base => &BASE_PALETTE,
        }
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn from_index(idx: usize) -> Self {
        Self::ALL.get(idx).copied().unwrap_or_default()
    }

    pub fn next(self) -> Self {
        Self::from_index((self.index() + 1) % Self::ALL.len())
    }

    pub fn prev(self) -> Self {
        Self::from_index((self.index() + Self::ALL.len() - 1) % Self::ALL.len())
    }
}

/// Node, edge and cluster colours for one theme, as CSS colour strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub node_fill: &'static str,
    pub node_border: &'static str,
    pub text: &'static str,
    pub line: &'static str,
    pub cluster_fill: &'static str,
    pub cluster_border: &'static str,
    pub edge_label_fill: &'static str,
}

const DEFAULT_PALETTE: Palette = Palette {
    background: "#ffffff",
    node_fill: "#ececff",
    node_border: "#9370db",
    text: "#333333",
    line: "#333333",
    cluster_fill: "#ffffde",
    cluster_border: "#aaaa33",
    edge_label_fill: "#e8e8e8",
};

const DARK_PALETTE: Palette = Palette {
    background: "#333333",
    node_fill: "#1f2020",
    node_border: "#cccccc",
    text: "#e0dfdf",
    line: "#d3d3d3",
    cluster_fill: "#161616",
    cluster_border: "#6c6c6c",
    edge_label_fill: "#585858",
};

const FOREST_PALETTE: Palette = Palette {
    background: "#ffffff",
    node_fill: "#cde498",
    node_border: "#13540c",
    text: "#000000",
    line: "#008000",
    cluster_fill: "#cdffb2",
    cluster_border: "#6eaa49",
    edge_label_fill: "#e8e8e8",
};

const NEUTRAL_PALETTE: Palette = Palette {
    background: "#ffffff",
    node_fill: "#eeeeee",
    node_border: "#999999",
    text: "#333333",
    line: "#666666",
    cluster_fill: "#f4f4f4",
    cluster_border: "#999999",
    edge_label_fill: "#ffffff",
};

const BASE_PALETTE: Palette = Palette {
    background: "#ffffff",
    node_fill: "#fff4dd",
    node_border: "#c9a55c",
    text: "#333333",
    line: "#333333",
    cluster_fill: "#ffffde",
    cluster_border: "#c9a55c",
    edge_label_fill: "#fff4dd",
};

impl fmt::Display for ThemeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|theme| theme.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown theme '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_parses_case_insensitively() {
        assert_eq!("Dark".parse::<ThemeId>(), Ok(ThemeId::Dark));
        assert_eq!(" forest ".parse::<ThemeId>(), Ok(ThemeId::Forest));
        assert!("solarized".parse::<ThemeId>().is_err());
    }

    #[test]
    fn test_theme_index_roundtrips_all_variants() {
        for theme in ThemeId::ALL {
            assert_eq!(ThemeId::from_index(theme.index()), theme);
        }
        assert_eq!(ThemeId::from_index(99), ThemeId::Default);
    }

    #[test]
    fn test_theme_cycles_wrap_around() {
        assert_eq!(ThemeId::Base.next(), ThemeId::Default);
        assert_eq!(ThemeId::Default.prev(), ThemeId::Base);
        assert_eq!(ThemeId::Dark.next().prev(), ThemeId::Dark);
    }

    #[test]
    fn test_every_theme_has_a_distinct_palette() {
        for (i, a) in ThemeId::ALL.iter().enumerate() {
            for b in &ThemeId::ALL[i + 1..] {
                assert_ne!(a.palette(), b.palette(), "{a} and {b} share colours");
            }
        }
        assert_eq!(ThemeId::Dark.palette().background, "#333333");
    }

    #[test]
    fn test_theme_serializes_as_renderer_name() {
        let json = serde_json::to_string(&ThemeId::Neutral).unwrap();
        assert_eq!(json, "\"neutral\"");
    }
}
