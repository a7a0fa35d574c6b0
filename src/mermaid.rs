//! Mermaid diagram rendering.
//!
//! [`MermaidRenderer`] adapts `mermaid-rs-renderer` to the [`DiagramRenderer`]
//! seam. [`rasterize_svg`] turns the resulting SVG into pixels with `resvg`
//! for the terminal preview.

use std::sync::{Arc, OnceLock};

use anyhow::Result;
use image::DynamicImage;
use mermaid_rs_renderer::config::LayoutConfig;
use mermaid_rs_renderer::layout::compute_layout;
use mermaid_rs_renderer::parser::parse_mermaid;
use mermaid_rs_renderer::render::render_svg;
use mermaid_rs_renderer::theme::Theme;
use resvg::usvg::fontdb;

use crate::diagram::{DiagramId, DiagramRenderer, RenderError, RendererConfig};
use crate::export::svg::{root_attribute, set_root_attribute};

/// Renderer backed by the `mermaid-rs-renderer` crate.
///
/// The selected theme's palette and font are handed to the layout and SVG
/// stages directly. The `init` directive with the per-family constants is
/// still prepended so the parser sees the same text a user could write.
#[derive(Debug, Default, Clone, Copy)]
pub struct MermaidRenderer;

impl DiagramRenderer for MermaidRenderer {
    fn validate(&self, source: &str) -> Result<(), RenderError> {
        parse_mermaid(source)
            .map(|_| ())
            .map_err(|err| RenderError::Validation(err.to_string()))
    }

    fn render(
        &self,
        id: &DiagramId,
        source: &str,
        config: &RendererConfig,
    ) -> Result<String, RenderError> {
        let directive = config.init_directive()?;
        let input = format!("{directive}\n{source}");
        let parsed = parse_mermaid(&input).map_err(|err| RenderError::Render(err.to_string()))?;
        let theme = renderer_theme(config);
        let layout_config = LayoutConfig::default();
        let laid_out = compute_layout(&parsed.graph, &theme, &layout_config);
        let svg = fix_svg_font_families(&render_svg(&laid_out, &theme, &layout_config));
        let svg = if config.flowchart.use_max_width {
            fit_to_container(&svg)
        } else {
            svg
        };
        Ok(set_root_attribute(&svg, "id", id.as_str()))
    }
}

/// Map the selected theme and font onto the renderer's [`Theme`].
fn renderer_theme(config: &RendererConfig) -> Theme {
    let palette = config.theme.palette();
    let mut theme = Theme::modern();
    theme.background = palette.background.to_string();
    theme.primary_color = palette.node_fill.to_string();
    theme.primary_border_color = palette.node_border.to_string();
    theme.primary_text_color = palette.text.to_string();
    theme.line_color = palette.line.to_string();
    theme.cluster_background = palette.cluster_fill.to_string();
    theme.cluster_border = palette.cluster_border.to_string();
    theme.edge_label_background = palette.edge_label_fill.to_string();
    theme.font_family = config.font_family.to_string();
    #[allow(clippy::cast_precision_loss)]
    {
        theme.font_size = config.font_size as f32;
    }
    theme
}

/// Let the diagram shrink to its container: `width="100%"` plus a
/// `max-width` of the natural width, as Mermaid does with `useMaxWidth`.
fn fit_to_container(svg: &str) -> String {
    let Some(width) = root_attribute(svg, "width") else {
        return svg.to_string();
    };
    let style = format!("max-width: {width}px;");
    let svg = set_root_attribute(svg, "width", "100%");
    set_root_attribute(&svg, "style", &style)
}

/// Fix unescaped double quotes inside font-family attributes.
///
/// `mermaid-rs-renderer` emits font-family values like:
///   `font-family="Inter, ... "Segoe UI", sans-serif"`
/// The inner `"Segoe UI"` breaks XML parsing, so inner double quotes become
/// single quotes.
fn fix_svg_font_families(svg: &str) -> String {
    const MARKER: &str = "font-family=\"";
    let mut result = String::with_capacity(svg.len());
    let mut rest = svg;

    while let Some(pos) = rest.find(MARKER) {
        result.push_str(&rest[..pos + MARKER.len()]);
        rest = &rest[pos + MARKER.len()..];

        // The closing quote is the first `"` followed by `>`, ` `, `/` or end.
        let mut end_offset = rest.len();
        let mut value = String::new();
        for (i, ch) in rest.char_indices() {
            if ch != '"' {
                value.push(ch);
                continue;
            }
            let after = rest.get(i + 1..i + 2).unwrap_or("");
            if after.is_empty() || after.starts_with(['>', ' ', '/']) {
                result.push_str(&value.replace('"', "'"));
                result.push('"');
                end_offset = i + 1;
                break;
            }
            value.push('"');
        }
        if end_offset == rest.len() {
            // Unterminated value: keep the remainder as-is.
            result.push_str(&value);
        }
        rest = &rest[end_offset..];
    }
    result.push_str(rest);
    result
}

fn font_database() -> Arc<fontdb::Database> {
    static FONTS: OnceLock<Arc<fontdb::Database>> = OnceLock::new();
    FONTS
        .get_or_init(|| {
            let _scope = crate::perf::scope("mermaid.load_fonts");
            let mut db = fontdb::Database::new();
            db.load_system_fonts();
            Arc::new(db)
        })
        .clone()
}

/// Rasterize an SVG string to a `DynamicImage`.
///
/// Scales the SVG so its width matches `target_width_px`, preserving aspect
/// ratio, so the vector is drawn directly at display resolution.
///
/// # Errors
///
/// Returns an error if the SVG cannot be parsed or the pixmap cannot be
/// allocated.
pub fn rasterize_svg(svg: &str, target_width_px: u32) -> Result<DynamicImage> {
    let _scope = crate::perf::scope("mermaid.rasterize");
    let opts = resvg::usvg::Options {
        fontdb: font_database(),
        ..Default::default()
    };

    let tree = resvg::usvg::Tree::from_str(svg, &opts)?;
    let size = tree.size();
    if size.width() <= 0.0 || size.height() <= 0.0 {
        anyhow::bail!("svg has empty size {}x{}", size.width(), size.height());
    }

    #[allow(clippy::cast_precision_loss)]
    let scale = target_width_px.max(1) as f32 / size.width();

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let width = (size.width() * scale).ceil() as u32;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let height = (size.height() * scale).ceil().max(1.0) as u32;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| anyhow::anyhow!("failed to create pixmap {width}x{height}"))?;

    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let rgba = pixmap.data().to_vec();
    let img_buf = image::RgbaImage::from_raw(width, height, rgba)
        .ok_or_else(|| anyhow::anyhow!("failed to create image from pixmap data"))?;

    Ok(DynamicImage::ImageRgba8(img_buf))
}
