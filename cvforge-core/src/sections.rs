//! Section Renderers - Tag to Behavior
//!
//! Renderers turn a decoded payload plus resolved style into rows. The
//! registry maps free-form type tags onto a closed set of renderer kinds;
//! tags it does not know are skipped by the composer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::commands::{Row, TextSpec};
use crate::content::{EntryItem, SectionItem, SectionPayload};
use crate::style::{FontStyle, ResolvedFont};

/// Fonts and gaps a renderer draws with, already resolved from config
#[derive(Debug, Clone, PartialEq)]
pub struct SectionStyle {
    pub body: ResolvedFont,
    pub emphasis: ResolvedFont,
    pub spacing: f64,
    pub item_spacing: f64,
}

impl SectionStyle {
    /// Detail lines sit slightly tighter and smaller than headlines
    fn detail_height(&self) -> f64 {
        (self.item_spacing - 2.0).max(0.0)
    }

    fn detail_font(&self, style: FontStyle) -> ResolvedFont {
        ResolvedFont {
            size: self.body.size - 1.0,
            style,
            ..self.body.clone()
        }
    }
}

/// Renderer trait - produces rows for one section body
pub trait SectionRenderer {
    fn name(&self) -> &'static str;
    fn render(&self, payload: &SectionPayload, style: &SectionStyle) -> Vec<Row>;
}

// --- Concrete Renderers ---

pub struct PlainTextRenderer;

impl SectionRenderer for PlainTextRenderer {
    fn name(&self) -> &'static str { "plain_text" }

    fn render(&self, payload: &SectionPayload, style: &SectionStyle) -> Vec<Row> {
        if let Some(text) = payload.text() {
            return vec![Row::text(style.spacing, TextSpec::new(text, &style.body))];
        }

        payload
            .items()
            .iter()
            .filter_map(SectionItem::label)
            .map(|line| Row::text(style.spacing, TextSpec::new(line, &style.body)))
            .collect()
    }
}

pub struct EntryListRenderer;

impl EntryListRenderer {
    const BULLET_INDENT: f64 = 5.0;

    fn render_entry(&self, entry: &EntryItem, style: &SectionStyle, rows: &mut Vec<Row>) {
        if let Some(headline) = entry.headline() {
            rows.push(Row::text(
                style.item_spacing,
                TextSpec::new(headline, &style.emphasis),
            ));
        }

        if let Some(meta) = entry.meta_line() {
            rows.push(Row::text(
                style.detail_height(),
                TextSpec::new(meta, &style.detail_font(FontStyle::Italic)),
            ));
        }

        let bullet_font = style.detail_font(FontStyle::Normal);
        for bullet in entry.description.iter().filter(|b| !b.trim().is_empty()) {
            rows.push(Row::text(
                style.detail_height(),
                TextSpec::new(format!("- {}", bullet), &bullet_font)
                    .offset(0.0, Self::BULLET_INDENT),
            ));
        }
    }
}

impl SectionRenderer for EntryListRenderer {
    fn name(&self) -> &'static str { "entry_list" }

    fn render(&self, payload: &SectionPayload, style: &SectionStyle) -> Vec<Row> {
        let mut rows = vec![];

        if let Some(text) = payload.text() {
            rows.push(Row::text(style.spacing, TextSpec::new(text, &style.body)));
        }

        for item in payload.items() {
            match item {
                SectionItem::Entry(entry) => self.render_entry(entry, style, &mut rows),
                SectionItem::Label(label) if !label.trim().is_empty() => {
                    rows.push(Row::text(style.item_spacing, TextSpec::new(label, &style.body)));
                }
                SectionItem::Label(_) => {}
            }
        }

        rows
    }
}

pub struct DelimitedListRenderer;

impl DelimitedListRenderer {
    pub const SEPARATOR: &'static str = " | ";
}

impl SectionRenderer for DelimitedListRenderer {
    fn name(&self) -> &'static str { "delimited_list" }

    fn render(&self, payload: &SectionPayload, style: &SectionStyle) -> Vec<Row> {
        let joined = match payload.text() {
            Some(text) => text.to_string(),
            None => payload
                .items()
                .iter()
                .filter_map(SectionItem::label)
                .collect::<Vec<_>>()
                .join(Self::SEPARATOR),
        };

        if joined.is_empty() {
            return vec![];
        }
        vec![Row::text(style.spacing, TextSpec::new(joined, &style.body))]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RendererKind {
    PlainText,
    EntryList,
    DelimitedList,
}

impl RendererKind {
    pub fn renderer(self) -> &'static dyn SectionRenderer {
        match self {
            RendererKind::PlainText => &PlainTextRenderer,
            RendererKind::EntryList => &EntryListRenderer,
            RendererKind::DelimitedList => &DelimitedListRenderer,
        }
    }
}

/// Registry of type tags, several of which may share one renderer
pub struct RendererRegistry {
    tags: BTreeMap<String, RendererKind>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self { tags: BTreeMap::new() }
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for tag in ["summary", "text", "plain_text"] {
            registry.register(tag, RendererKind::PlainText);
        }
        for tag in ["entry_list", "experience", "education", "employment"] {
            registry.register(tag, RendererKind::EntryList);
        }
        for tag in ["simple_list", "skills", "certifications", "languages"] {
            registry.register(tag, RendererKind::DelimitedList);
        }
        registry
    }

    pub fn register(&mut self, tag: impl Into<String>, kind: RendererKind) {
        self.tags.insert(tag.into(), kind);
    }

    pub fn kind(&self, tag: &str) -> Option<RendererKind> {
        self.tags.get(tag).copied()
    }

    pub fn get(&self, tag: &str) -> Option<&'static dyn SectionRenderer> {
        self.kind(tag).map(RendererKind::renderer)
    }

    pub fn tags(&self) -> impl Iterator<Item = (&str, RendererKind)> {
        self.tags.iter().map(|(tag, kind)| (tag.as_str(), *kind))
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::Rgb;
    use serde_json::json;

    fn font(size: f64) -> ResolvedFont {
        ResolvedFont {
            family: "Arial".into(),
            size,
            style: FontStyle::Normal,
            color: Rgb::BLACK,
        }
    }

    fn style() -> SectionStyle {
        SectionStyle {
            body: font(11.0),
            emphasis: ResolvedFont { style: FontStyle::Bold, ..font(12.0) },
            spacing: 6.0,
            item_spacing: 8.0,
        }
    }

    fn payload(value: serde_json::Value) -> SectionPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_aliases_share_renderers() {
        let registry = RendererRegistry::default();
        assert_eq!(registry.kind("summary"), Some(RendererKind::PlainText));
        assert_eq!(registry.kind("text"), Some(RendererKind::PlainText));
        assert_eq!(registry.get("experience").unwrap().name(), "entry_list");
        assert_eq!(registry.get("skills").unwrap().name(), "delimited_list");
        assert!(registry.get("hobbies").is_none());
    }

    #[test]
    fn test_register_custom_tag() {
        let mut registry = RendererRegistry::new();
        assert!(registry.get("hobbies").is_none());
        registry.register("hobbies", RendererKind::DelimitedList);
        assert_eq!(registry.kind("hobbies"), Some(RendererKind::DelimitedList));
    }

    #[test]
    fn test_plain_text() {
        let rows = PlainTextRenderer.render(&payload(json!({"content": "Builds things."})), &style());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].height, 6.0);
        assert_eq!(rows[0].texts(), vec!["Builds things."]);
    }

    #[test]
    fn test_delimited_list_joins_labels() {
        let rows = DelimitedListRenderer.render(&payload(json!({"items": ["Go", "Rust"]})), &style());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].texts(), vec!["Go | Rust"]);
        assert_eq!(rows[0].total_weight(), 12);

        let empty = DelimitedListRenderer.render(&payload(json!({"items": []})), &style());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_entry_list_layout() {
        let rows = EntryListRenderer.render(
            &payload(json!({"items": [{
                "title": "Engineer",
                "company": "Acme",
                "location": "Oslo",
                "start_date": "2020",
                "end_date": "2023",
                "description": ["Shipped v1", "Mentored"]
            }]})),
            &style(),
        );

        let texts: Vec<_> = rows.iter().flat_map(|r| r.texts()).collect();
        assert_eq!(
            texts,
            vec!["Engineer - Acme", "Oslo | 2020 - 2023", "- Shipped v1", "- Mentored"]
        );
        assert_eq!(rows[0].height, 8.0);
        assert_eq!(rows[1].height, 6.0);

        match &rows[1].columns[0].primitive {
            crate::commands::Primitive::Text(t) => {
                assert_eq!(t.style, FontStyle::Italic);
                assert_eq!(t.size, 10.0);
            }
            other => panic!("unexpected primitive {:?}", other),
        }
        match &rows[0].columns[0].primitive {
            crate::commands::Primitive::Text(t) => assert_eq!(t.style, FontStyle::Bold),
            other => panic!("unexpected primitive {:?}", other),
        }
    }

    #[test]
    fn test_other_payload_renders_nothing() {
        let other = payload(json!({"unexpected": true}));
        for kind in [RendererKind::PlainText, RendererKind::EntryList, RendererKind::DelimitedList] {
            assert!(kind.renderer().render(&other, &style()).is_empty());
        }
    }
}
