use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::diagram::{Background, ExportConfig, ThemeId, parse_dimension};

/// Which terminal background the syntax colours should assume.
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightMode {
    Auto,
    Light,
    Dark,
}

impl HighlightMode {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }
}

/// Options that can come from the command line or a flags file.
///
/// Booleans are additive; valued options from `other` win in [`Self::union`].
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub no_images: bool,
    pub perf: bool,
    pub force_half_cell: bool,
    pub theme: Option<ThemeId>,
    pub template: Option<String>,
    pub out_dir: Option<PathBuf>,
    /// Raw width token: a number or `auto`.
    pub width: Option<String>,
    /// Raw height token: a number or `auto`.
    pub height: Option<String>,
    pub background: Option<Background>,
    pub highlight: Option<HighlightMode>,
    pub render_debug_log: Option<PathBuf>,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            no_images: self.no_images || other.no_images,
            perf: self.perf || other.perf,
            force_half_cell: self.force_half_cell || other.force_half_cell,
            theme: other.theme.or(self.theme),
            template: other.template.clone().or_else(|| self.template.clone()),
            out_dir: other.out_dir.clone().or_else(|| self.out_dir.clone()),
            width: other.width.clone().or_else(|| self.width.clone()),
            height: other.height.clone().or_else(|| self.height.clone()),
            background: other.background.or(self.background),
            highlight: other.highlight.or(self.highlight),
            render_debug_log: other
                .render_debug_log
                .clone()
                .or_else(|| self.render_debug_log.clone()),
        }
    }

    /// Export settings with form defaults filled in.
    pub fn export_config(&self) -> ExportConfig {
        let defaults = ExportConfig::default();
        ExportConfig {
            width: resolve_dimension(self.width.as_deref(), defaults.width),
            height: resolve_dimension(self.height.as_deref(), defaults.height),
            background: self.background.unwrap_or(defaults.background),
        }
    }

    /// Where exports are written; the working directory unless configured.
    pub fn out_dir(&self) -> PathBuf {
        self.out_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}

fn resolve_dimension(raw: Option<&str>, default: Option<u32>) -> Option<u32> {
    let fallback = default.unwrap_or(crate::diagram::DEFAULT_EXPORT_WIDTH);
    match raw.map(str::trim) {
        None => default,
        Some(token) if token.eq_ignore_ascii_case("auto") => None,
        Some(token) => parse_dimension(token, fallback),
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("mermedit").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("mermedit")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("mermedit").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("mermedit")
                .join("config");
        }
    }

    local_override_path()
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".mermeditrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = vec!["# mermedit defaults (saved with --save)".to_string()];
    if flags.no_images {
        lines.push("--no-images".to_string());
    }
    if let Some(theme) = flags.theme {
        lines.push(format!("--theme {theme}"));
    }
    if let Some(template) = &flags.template {
        lines.push(format!("--template {template}"));
    }
    if let Some(dir) = &flags.out_dir {
        lines.push(format!("--out-dir {}", dir.display()));
    }
    if let Some(width) = &flags.width {
        lines.push(format!("--width {width}"));
    }
    if let Some(height) = &flags.height {
        lines.push(format!("--height {height}"));
    }
    if let Some(background) = flags.background {
        lines.push(format!("--background {background}"));
    }
    if let Some(mode) = flags.highlight {
        lines.push(format!("--highlight {}", mode.as_str()));
    }
    if flags.perf {
        lines.push("--perf".to_string());
    }
    if let Some(path) = &flags.render_debug_log {
        lines.push(format!("--render-debug-log {}", path.display()));
    }
    if flags.force_half_cell {
        lines.push("--force-half-cell".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Parse `--flag`, `--opt value` and `--opt=value` tokens. Unknown tokens
/// and unparseable values are skipped.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        let (name, inline_value) = match token.split_once('=') {
            Some((name, value)) => (name, Some(value.to_string())),
            None => (token, None),
        };
        let mut value = || {
            inline_value.clone().or_else(|| {
                let next = tokens.get(i + 1).cloned();
                if next.is_some() {
                    i += 1;
                }
                next
            })
        };
        match name {
            "--no-images" => flags.no_images = true,
            "--perf" => flags.perf = true,
            "--force-half-cell" => flags.force_half_cell = true,
            "--theme" => flags.theme = value().and_then(|v| v.parse().ok()),
            "--template" => flags.template = value(),
            "--out-dir" => flags.out_dir = value().map(PathBuf::from),
            "--width" => flags.width = value(),
            "--height" => flags.height = value(),
            "--background" => flags.background = value().and_then(|v| v.parse().ok()),
            "--highlight" => flags.highlight = value().and_then(|v| parse_highlight(&v)),
            "--render-debug-log" => flags.render_debug_log = value().map(PathBuf::from),
            _ => {}
        }
        i += 1;
    }
    flags
}

fn parse_highlight(s: &str) -> Option<HighlightMode> {
    match s {
        "auto" => Some(HighlightMode::Auto),
        "light" => Some(HighlightMode::Light),
        "dark" => Some(HighlightMode::Dark),
        _ => None,
    }
}
