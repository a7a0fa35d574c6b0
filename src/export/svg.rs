//! Textual post-processing of rendered SVG.
//!
//! Only the root `<svg ...>` tag is ever touched. The rest of the document
//! is copied through byte for byte.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::diagram::{Background, ExportConfig};

static ROOT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<svg\b[^>]*>").expect("root tag pattern is valid"));

// Attributes touched on every export and preview render.
static WIDTH_ATTR: LazyLock<Regex> = LazyLock::new(|| cached_pattern("width"));
static HEIGHT_ATTR: LazyLock<Regex> = LazyLock::new(|| cached_pattern("height"));
static STYLE_ATTR: LazyLock<Regex> = LazyLock::new(|| cached_pattern("style"));
static ID_ATTR: LazyLock<Regex> = LazyLock::new(|| cached_pattern("id"));

/// Apply the export settings: background first, then size.
pub fn postprocess(svg: &str, settings: &ExportConfig) -> String {
    let with_bg = apply_background(svg, settings.background);
    apply_dimensions(&with_bg, settings.width, settings.height)
}

/// Paint `background` behind the diagram via the root `style` attribute.
///
/// Transparent leaves the input untouched. An existing `style` is kept and
/// the background declaration is appended so it takes precedence.
pub fn apply_background(svg: &str, background: Background) -> String {
    let Some(css) = background.css_value() else {
        return svg.to_string();
    };
    let declaration = format!("background-color: {css}");
    let style = match root_attribute(svg, "style") {
        Some(existing) if !existing.trim().is_empty() => {
            format!("{}; {declaration}", existing.trim().trim_end_matches(';'))
        }
        _ => declaration,
    };
    set_root_attribute(svg, "style", &style)
}

/// Overwrite (or add) the root `width` / `height` attributes.
pub fn apply_dimensions(svg: &str, width: Option<u32>, height: Option<u32>) -> String {
    let mut out = svg.to_string();
    if let Some(w) = width {
        out = set_root_attribute(&out, "width", &w.to_string());
    }
    if let Some(h) = height {
        out = set_root_attribute(&out, "height", &h.to_string());
    }
    out
}

/// Set `name="value"` on the first `<svg>` tag.
///
/// Replaces the first existing occurrence of the attribute (matched on the
/// whole name, so `width` never hits `stroke-width`) or inserts it right
/// after `<svg`. Input without an `<svg` tag is returned unchanged.
pub fn set_root_attribute(svg: &str, name: &str, value: &str) -> String {
    let Some(root) = ROOT_TAG.find(svg) else {
        return svg.to_string();
    };
    let tag = root.as_str();
    let Some(pattern) = attribute_pattern(name) else {
        return svg.to_string();
    };
    let escaped = escape_attr(value);

    let new_tag = if pattern.is_match(tag) {
        pattern
            .replacen(tag, 1, |caps: &Captures| {
                format!("{}{name}=\"{escaped}\"", &caps[1])
            })
            .into_owned()
    } else {
        format!("<svg {name}=\"{escaped}\"{}", &tag["<svg".len()..])
    };

    let mut out = String::with_capacity(svg.len() + name.len() + escaped.len() + 4);
    out.push_str(&svg[..root.start()]);
    out.push_str(&new_tag);
    out.push_str(&svg[root.end()..]);
    out
}

/// Read an attribute from the first `<svg>` tag.
pub fn root_attribute(svg: &str, name: &str) -> Option<String> {
    let tag = ROOT_TAG.find(svg)?.as_str();
    let pattern = attribute_pattern(name)?;
    let caps = pattern.captures(tag)?;
    let raw = caps.get(2)?.as_str();
    // Strip the surrounding quote characters.
    Some(raw[1..raw.len() - 1].to_string())
}

fn attribute_source(name: &str) -> String {
    format!(r#"(\s){}\s*=\s*("[^"]*"|'[^']*')"#, regex::escape(name))
}

fn cached_pattern(name: &str) -> Regex {
    Regex::new(&attribute_source(name)).expect("attribute pattern is valid")
}

/// Pattern matching ` name="value"`, capturing the leading space and the
/// quoted value. `None` only if the pattern fails to compile.
fn attribute_pattern(name: &str) -> Option<Cow<'static, Regex>> {
    let cached: &'static LazyLock<Regex> = match name {
        "width" => &WIDTH_ATTR,
        "height" => &HEIGHT_ATTR,
        "style" => &STYLE_ATTR,
        "id" => &ID_ATTR,
        _ => return Regex::new(&attribute_source(name)).ok().map(Cow::Owned),
    };
    Some(Cow::Borrowed(LazyLock::force(cached)))
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
