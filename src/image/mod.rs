//! Terminal graphics for the diagram preview.
//!
//! Picks a graphics protocol (Kitty, Sixel, iTerm2 or half-blocks) through
//! `ratatui-image` and prepares rasterized diagrams for display.

use std::time::Duration;

use image::{DynamicImage, Rgba, RgbaImage};
use ratatui_image::picker::Picker;
#[cfg(unix)]
use ratatui_image::picker::cap_parser::QueryStdioOptions;

const PICKER_QUERY_TIMEOUT_MS: u64 = 250;

/// Widest raster the preview will ask for, whatever the pane size.
pub const MAX_PREVIEW_WIDTH_PX: u32 = 4096;

/// Create a picker for terminal image rendering.
///
/// The picker detects terminal capabilities and chooses the best protocol.
pub fn create_picker(force_half_cell: bool) -> Option<Picker> {
    if force_half_cell {
        crate::perf::log_event(
            "image.create_picker",
            "force_half_cell=true protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    // The stdio capability query can leave orphaned reader threads on the
    // Windows console input buffer, so use half-blocks there.
    #[cfg(not(unix))]
    {
        crate::perf::log_event(
            "image.create_picker",
            "windows fallback protocol=Halfblocks",
        );
        return Some(Picker::halfblocks());
    }

    #[cfg(unix)]
    {
        let picker = Picker::from_query_stdio_with_options(query_options()).ok()?;
        crate::perf::log_event(
            "image.create_picker",
            format!(
                "term_program={} term={} colorterm={} protocol={:?}",
                std::env::var("TERM_PROGRAM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("TERM").unwrap_or_else(|_| "<unset>".to_string()),
                std::env::var("COLORTERM").unwrap_or_else(|_| "<unset>".to_string()),
                picker.protocol_type()
            ),
        );
        Some(picker)
    }
}

/// Pixel width to rasterize at so a diagram fills `cols` terminal cells.
pub fn preview_width_px(cols: u16, font_size: (u16, u16)) -> u32 {
    let cell_w = u32::from(font_size.0.max(1));
    (u32::from(cols) * cell_w).clamp(1, MAX_PREVIEW_WIDTH_PX)
}

/// Composite a (possibly transparent) raster over an opaque backdrop.
///
/// Diagrams are drawn with dark ink on a transparent canvas, which is
/// unreadable on dark terminals without a backdrop.
pub fn flatten_onto(image: &DynamicImage, backdrop: [u8; 3]) -> DynamicImage {
    let src = image.to_rgba8();
    let mut out = RgbaImage::new(src.width(), src.height());
    for (x, y, px) in src.enumerate_pixels() {
        let alpha = u16::from(px[3]);
        let blend = |fg: u8, bg: u8| {
            let mixed = (u16::from(fg) * alpha + u16::from(bg) * (255 - alpha) + 127) / 255;
            u8::try_from(mixed).unwrap_or(u8::MAX)
        };
        out.put_pixel(
            x,
            y,
            Rgba([
                blend(px[0], backdrop[0]),
                blend(px[1], backdrop[1]),
                blend(px[2], backdrop[2]),
                255,
            ]),
        );
    }
    DynamicImage::ImageRgba8(out)
}

/// Whether terminal output should be treated as truecolor-capable.
pub fn supports_truecolor_terminal() -> bool {
    if let Ok(force) = std::env::var("MERMEDIT_TRUECOLOR") {
        let value = force.to_ascii_lowercase();
        return matches!(value.as_str(), "1" | "true" | "yes" | "on");
    }
    if std::env::var("TERM_PROGRAM")
        .ok()
        .as_deref()
        .is_some_and(|v| v == "Apple_Terminal")
    {
        return false;
    }
    supports_truecolor_from_env(
        std::env::var("COLORTERM").ok().as_deref(),
        std::env::var("TERM").ok().as_deref(),
    )
}

#[cfg(unix)]
fn query_options() -> QueryStdioOptions {
    let mut options = QueryStdioOptions::default();
    options.timeout = Duration::from_millis(PICKER_QUERY_TIMEOUT_MS);
    options
}

fn supports_truecolor_from_env(colorterm: Option<&str>, term: Option<&str>) -> bool {
    let has = |value: Option<&str>, needles: &[&str]| {
        value.is_some_and(|v| {
            let lower = v.to_ascii_lowercase();
            needles.iter().any(|n| lower.contains(n))
        })
    };
    has(colorterm, &["truecolor", "24bit"]) || has(term, &["direct", "truecolor"])
}

/// Nearest colour in the 6x6x6 cube of the xterm-256 palette.
#[allow(clippy::cast_possible_truncation)]
pub fn rgb_to_xterm_256(r: u8, g: u8, b: u8) -> u8 {
    let to_cube = |v: u8| ((u16::from(v) * 5 + 127) / 255) as u8;
    16 + (36 * to_cube(r)) + (6 * to_cube(g)) + to_cube(b)
}
