//! SVG Recoloring - Textual Paint Rewrite
//!
//! This is a heuristic over the raw markup, not a structural transform.
//! Gradients, CSS classes and fills inherited from `<g>` elements are left
//! alone.

use regex::Regex;
use std::sync::OnceLock;

const INHERIT_IDIOMS: &[&str] = &[
    r#"fill="currentColor""#,
    r#"fill='currentColor'"#,
    r##"fill="#000""##,
    r##"fill="#000000""##,
    r#"fill="black""#,
];

const STROKE_IDIOMS: &[&str] = &[r#"stroke="currentColor""#, r#"stroke='currentColor'"#];

fn shape_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)<(path|circle|rect|polygon)(\s)").expect("shape pattern is valid")
    })
}

/// Rewrite the markup so monochrome icons draw in `hex` (six digits, no `#`).
pub fn recolor_svg(svg: &str, hex: &str) -> String {
    let fill = format!(r##"fill="#{}""##, hex);
    let stroke = format!(r##"stroke="#{}""##, hex);

    let mut out = svg.to_string();
    for idiom in INHERIT_IDIOMS {
        out = out.replace(idiom, &fill);
    }
    for idiom in STROKE_IDIOMS {
        out = out.replace(idiom, &stroke);
    }

    if !has_fill_attribute(&out) {
        let injected = format!(r#"<$1 {}$2"#, fill);
        out = shape_regex().replace_all(&out, injected.as_str()).into_owned();
    }

    out
}

fn has_fill_attribute(svg: &str) -> bool {
    let lower = svg.to_ascii_lowercase();
    lower.contains(r#"fill=""#) || lower.contains("fill='")
}
