//! Mermedit - A terminal Mermaid diagram editor with live preview.
//!
//! # Usage
//!
//! ```bash
//! mermedit
//! mermedit --template sequence --theme forest
//! mermedit --width 1200 --height auto --background white --out-dir exports
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use mermedit::app::App;
use mermedit::config::{
    ConfigFlags, HighlightMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use mermedit::diagram::{Background, ThemeId};
use mermedit::highlight::{HighlightBackground, set_background_mode};
use mermedit::perf;
use mermedit::templates::{Template, default_source};

/// A terminal Mermaid diagram editor with live preview and SVG export
#[derive(Parser, Debug)]
#[command(name = "mermedit", version, about, long_about = None)]
struct Cli {
    /// Renderer theme for the preview and exports
    #[arg(long, value_enum)]
    theme: Option<ThemeId>,

    /// Start from a built-in template (flowchart, sequence, class, state, gantt, pie)
    #[arg(long, value_name = "NAME")]
    template: Option<String>,

    /// Directory exported SVGs are written to
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Export width in pixels, or "auto"
    #[arg(long, value_name = "PX")]
    width: Option<String>,

    /// Export height in pixels, or "auto"
    #[arg(long, value_name = "PX")]
    height: Option<String>,

    /// Export background (transparent, white, light-gray, dark-gray, black)
    #[arg(long, value_name = "COLOR", value_parser = parse_background)]
    background: Option<Background>,

    /// Disable the image preview (show a text summary only)
    #[arg(long)]
    no_images: bool,

    /// Force image rendering to use half-cell fallback mode
    #[arg(long)]
    force_half_cell: bool,

    /// Force syntax highlight background (light or dark)
    #[arg(long, value_enum)]
    highlight: Option<HighlightMode>,

    /// Enable startup performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_background(s: &str) -> Result<Background, String> {
    s.parse()
}

// Query the terminal background using OSC 11.
// We talk to /dev/tty so the terminal responds even when stdout is piped.
// On non-Unix platforms we skip the query entirely because the fallback
// (stdin/stdout) leaves an orphaned reader thread that blocks the console
// input buffer, preventing crossterm from receiving any keyboard events.
#[cfg(not(unix))]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    Ok(None)
}

#[cfg(unix)]
fn query_terminal_background() -> std::io::Result<Option<(u8, u8, u8)>> {
    use std::io::{Read, Write};
    use std::sync::mpsc;

    let (tx, rx) = mpsc::channel();

    let mut io = std::fs::OpenOptions::new().read(true).write(true).open("/dev/tty")?;
    let reader = io.try_clone()?;

    // OSC 11 query: ESC ] 11 ; ? BEL
    io.write_all(b"\x1b]11;?\x07")?;
    io.flush()?;

    std::thread::spawn(move || {
        let mut reader = reader;
        let mut buf = [0u8; 256];
        let mut collected: Vec<u8> = Vec::new();
        loop {
            match reader.read(&mut buf) {
                Ok(0) => continue,
                Ok(n) => {
                    collected.extend_from_slice(&buf[..n]);
                    if collected.contains(&b'\x07')
                        || collected.windows(2).any(|w| w == b"\x1b\\")
                    {
                        let _ = tx.send(collected);
                        break;
                    }
                }
                Err(_) => break,
            }
        }
    });

    let mut collected = Vec::new();
    if let Ok(bytes) = rx.recv_timeout(Duration::from_millis(75)) {
        collected = bytes;
    }

    let mut found: Option<(u8, u8, u8)> = None;
    if !collected.is_empty() {
        let text = String::from_utf8_lossy(&collected);
        if text.contains("rgb:") {
            found = parse_osc11_reply(&text);
        }
    }

    Ok(found)
}

fn parse_osc11_reply(reply: &str) -> Option<(u8, u8, u8)> {
    // Expect: ESC ] 11 ; rgb:RRRR/GGGG/BBBB BEL or ST
    let start = reply.find("rgb:")?;
    let data = &reply[start + 4..];
    let mut parts = data.split(['/', '\x07', '\x1b']);
    let r = parts.next()?;
    let g = parts.next()?;
    let b = parts.next()?;
    Some((parse_osc_component(r)?, parse_osc_component(g)?, parse_osc_component(b)?))
}

fn parse_osc_component(s: &str) -> Option<u8> {
    let hex = s.trim();
    if hex.len() >= 4 {
        let v = u16::from_str_radix(&hex[..4], 16).ok()?;
        u8::try_from(v >> 8).ok()
    } else if hex.len() == 2 {
        u8::from_str_radix(hex, 16).ok()
    } else {
        None
    }
}

fn theme_from_rgb(r: u8, g: u8, b: u8) -> HighlightBackground {
    let luma = 0.0722f32.mul_add(
        f32::from(b),
        0.2126f32.mul_add(f32::from(r), 0.7152 * f32::from(g)),
    );
    if luma >= 140.0 {
        HighlightBackground::Light
    } else {
        HighlightBackground::Dark
    }
}

fn detect_background() -> Option<HighlightBackground> {
    let _raw = enable_raw_mode();
    let result = query_terminal_background();
    let _ = disable_raw_mode();
    result.ok().flatten().map(|(r, g, b)| theme_from_rgb(r, g, b))
}

/// Source the editor opens with: the requested template, or the default
/// flowchart when the name is unknown.
fn initial_source(template: Option<&str>) -> &'static str {
    match template {
        None => default_source(),
        Some(name) => Template::find(name).map_or_else(
            || {
                tracing::warn!(template = name, "unknown template, using the default");
                eprintln!("[warn] Unknown template '{name}', starting with the flowchart");
                default_source()
            },
            |t| t.source,
        ),
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let render_debug_log_path = effective
        .render_debug_log
        .clone()
        .or_else(|| std::env::var_os("MERMEDIT_RENDER_DEBUG_LOG").map(PathBuf::from));
    if let Err(err) = perf::set_debug_log_path(render_debug_log_path.as_deref()) {
        eprintln!(
            "[warn] Failed to initialize render debug log {}: {}",
            render_debug_log_path
                .as_ref()
                .map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            err
        );
    }

    match effective.highlight.unwrap_or(HighlightMode::Auto) {
        HighlightMode::Auto => set_background_mode(detect_background()),
        HighlightMode::Light => set_background_mode(Some(HighlightBackground::Light)),
        HighlightMode::Dark => set_background_mode(Some(HighlightBackground::Dark)),
    }

    let out_dir = effective.out_dir();
    if !out_dir.is_dir() {
        anyhow::bail!("Export directory not found: {}", out_dir.display());
    }

    let source = initial_source(effective.template.as_deref());

    // Run the application
    let mut app = App::new(source)
        .with_theme(effective.theme.unwrap_or_default())
        .with_export_config(effective.export_config())
        .with_out_dir(out_dir)
        .with_force_half_cell(effective.force_half_cell)
        .with_images_enabled(!effective.no_images)
        .with_config_paths(
            Some(global_path.clone()),
            if local_path.exists() {
                Some(local_path.clone())
            } else {
                None
            },
        );

    app.run().context("Application error")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_osc11_reply_reads_16_bit_components() {
        let reply = "\x1b]11;rgb:ffff/8080/0000\x07";
        assert_eq!(parse_osc11_reply(reply), Some((0xff, 0x80, 0x00)));
    }

    #[test]
    fn test_parse_osc11_reply_rejects_garbage() {
        assert_eq!(parse_osc11_reply("no colour here"), None);
        assert_eq!(parse_osc11_reply("rgb:zz/00/00"), None);
    }

    #[test]
    fn test_theme_from_rgb_splits_on_luma() {
        assert_eq!(theme_from_rgb(255, 255, 255), HighlightBackground::Light);
        assert_eq!(theme_from_rgb(30, 30, 30), HighlightBackground::Dark);
    }

    #[test]
    fn test_unknown_template_falls_back_to_default() {
        assert_eq!(initial_source(Some("nope")), default_source());
        assert!(initial_source(Some("sequence")).starts_with("sequenceDiagram"));
        assert_eq!(initial_source(None), default_source());
    }

    #[test]
    fn test_cli_parses_export_flags() {
        let cli = Cli::try_parse_from([
            "mermedit",
            "--theme",
            "forest",
            "--background",
            "light-gray",
            "--width",
            "auto",
        ])
        .unwrap();
        assert_eq!(cli.theme, Some(ThemeId::Forest));
        assert_eq!(cli.background, Some(Background::LightGray));
        assert_eq!(cli.width.as_deref(), Some("auto"));
    }
}
