//! Vector to Raster
//!
//! Scan conversion is done by resvg with anti-aliasing on and full opacity.

use resvg::{tiny_skia, usvg};
use std::borrow::Cow;
use std::ops::Range;

use crate::icons::IconError;

/// Declared coordinate extent of an SVG
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewBox {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

fn parse_xml(svg: &str) -> Option<roxmltree::Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    roxmltree::Document::parse_with_options(svg, options).ok()
}

fn view_box_attribute(root: roxmltree::Node<'_, '_>) -> Option<ViewBox> {
    let numbers: Vec<f64> = root
        .attribute("viewBox")?
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect();
    match numbers[..] {
        [_, _, width, height] if width > 0.0 && height > 0.0 => Some(ViewBox { width, height }),
        _ => None,
    }
}

/// Read `viewBox`, falling back to the root `width`/`height` attributes.
pub fn declared_view_box(svg: &str) -> Option<ViewBox> {
    let doc = parse_xml(svg)?;
    let root = doc.root_element();

    if let Some(view_box) = view_box_attribute(root) {
        return Some(view_box);
    }

    let width = root.attribute("width").and_then(parse_length)?;
    let height = root.attribute("height").and_then(parse_length)?;
    Some(ViewBox { width, height })
}

/// With a valid `viewBox`, drop the root `width`/`height` so usvg sizes the
/// tree from the viewBox itself. Otherwise a mismatched pair (`1em`, or a
/// square box over a wide viewBox) letterboxes the geometry.
fn size_from_view_box(svg: &str) -> Cow<'_, str> {
    let Some(doc) = parse_xml(svg) else {
        return Cow::Borrowed(svg);
    };
    let root = doc.root_element();
    if view_box_attribute(root).is_none() {
        return Cow::Borrowed(svg);
    }

    let mut ranges: Vec<Range<usize>> = root
        .attributes()
        .filter(|a| a.namespace().is_none() && matches!(a.name(), "width" | "height"))
        .map(|a| a.range())
        .collect();
    if ranges.is_empty() {
        return Cow::Borrowed(svg);
    }
    ranges.sort_by_key(|r| r.start);

    let mut out = String::with_capacity(svg.len());
    let mut last = 0;
    for range in ranges {
        out.push_str(&svg[last..range.start]);
        last = range.end;
    }
    out.push_str(&svg[last..]);
    Cow::Owned(out)
}

fn parse_length(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().trim_end_matches("px").parse().ok()?;
    (value > 0.0).then_some(value)
}

/// The larger side becomes `size`; the other keeps the aspect ratio.
pub fn target_dimensions(view_box: ViewBox, size: u32) -> (u32, u32) {
    let size = size.max(1);
    let scaled = |small: f64, large: f64| ((size as f64 * small / large).round() as u32).max(1);

    if view_box.width >= view_box.height {
        (size, scaled(view_box.height, view_box.width))
    } else {
        (scaled(view_box.width, view_box.height), size)
    }
}

pub fn render_pixmap(svg: &str, size: u32) -> Result<tiny_skia::Pixmap, IconError> {
    let normalized = size_from_view_box(svg);
    let tree = usvg::Tree::from_str(&normalized, &usvg::Options::default())
        .map_err(|e| IconError::Parse(e.to_string()))?;
    let tree_size = tree.size();

    let view_box = declared_view_box(svg).unwrap_or(ViewBox {
        width: tree_size.width() as f64,
        height: tree_size.height() as f64,
    });
    let (width, height) = target_dimensions(view_box, size);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| IconError::Raster(format!("cannot allocate {}x{} pixmap", width, height)))?;

    let transform = tiny_skia::Transform::from_scale(
        width as f32 / tree_size.width(),
        height as f32 / tree_size.height(),
    );
    resvg::render(&tree, transform, &mut pixmap.as_mut());

    Ok(pixmap)
}

pub fn rasterize(svg: &str, size: u32) -> Result<RasterImage, IconError> {
    let pixmap = render_pixmap(svg, size)?;
    let png = pixmap
        .encode_png()
        .map_err(|e| IconError::Encode(e.to_string()))?;

    Ok(RasterImage {
        width: pixmap.width(),
        height: pixmap.height(),
        png,
    })
}
