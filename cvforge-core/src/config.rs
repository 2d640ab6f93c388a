//! Document Configuration - Cascading Style Contract

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

pub const HEADER_SECTION: &str = "header";
pub const CONTACT_SECTION: &str = "contact";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentConfig {
    #[serde(default)]
    pub engine_min_version: Option<String>,
    #[serde(default)]
    pub pdf: PageSettings,
    #[serde(default)]
    pub spacing: HashMap<String, f64>,
    #[serde(default)]
    pub fonts: HashMap<String, FontDefinition>,
    #[serde(default)]
    pub colors: HashMap<String, String>,
    #[serde(default)]
    pub icons: IconConfig,
    #[serde(default)]
    pub section_templates: HashMap<String, SectionTemplate>,
    /// Declaration order is the tie-breaker for equal `order` values.
    #[serde(default)]
    pub sections: IndexMap<String, SectionConfig>,
}

impl DocumentConfig {
    /// Header and contact blocks are on unless explicitly disabled.
    pub fn block_enabled(&self, key: &str) -> bool {
        self.sections.get(key).map_or(true, |s| s.enabled)
    }

    pub fn template(&self, name: &str) -> SectionTemplate {
        self.section_templates.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageSettings {
    #[serde(default = "default_page_size")]
    pub page_size: String,
    #[serde(default)]
    pub margins: Margins,
    #[serde(default)]
    pub background_color: Option<String>,
    #[serde(default)]
    pub divider: DividerConfig,
}

fn default_page_size() -> String { "A4".to_string() }

impl Default for PageSettings {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            margins: Margins::default(),
            background_color: None,
            divider: DividerConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Margins {
    #[serde(default = "default_margin")]
    pub top: f64,
    #[serde(default = "default_margin")]
    pub bottom: f64,
    #[serde(default = "default_margin")]
    pub left: f64,
    #[serde(default = "default_margin")]
    pub right: f64,
}

fn default_margin() -> f64 { 20.0 }

impl Default for Margins {
    fn default() -> Self {
        Self {
            top: default_margin(),
            bottom: default_margin(),
            left: default_margin(),
            right: default_margin(),
        }
    }
}

/// Horizontal rule emitted after the contact block
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DividerConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_divider_color")]
    pub color: String,
    #[serde(default = "default_divider_thickness")]
    pub thickness: f64,
    #[serde(default = "default_divider_spacing")]
    pub spacing: String,
}

fn default_true() -> bool { true }
fn default_divider_color() -> String { "secondary".to_string() }
fn default_divider_thickness() -> f64 { 1.0 }
fn default_divider_spacing() -> String { "medium".to_string() }

impl Default for DividerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            color: default_divider_color(),
            thickness: default_divider_thickness(),
            spacing: default_divider_spacing(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontDefinition {
    #[serde(default = "default_family")]
    pub family: String,
    #[serde(default = "default_font_size")]
    pub size: f64,
    #[serde(default)]
    pub style: String,
    #[serde(default)]
    pub color: String,
}

fn default_family() -> String { "Arial".to_string() }
fn default_font_size() -> f64 { 10.0 }

impl Default for FontDefinition {
    fn default() -> Self {
        Self {
            family: default_family(),
            size: default_font_size(),
            style: String::new(),
            color: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IconConfig {
    /// Searched in order; the first directory holding `<stem>.svg` wins.
    #[serde(default)]
    pub svg_paths: Vec<PathBuf>,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_icon_size")]
    pub default_size: u32,
    /// Color reference applied to every icon
    #[serde(default)]
    pub color: String,
    /// Icon key -> source file stem
    #[serde(default)]
    pub mappings: HashMap<String, String>,
    /// Append a digest of the source SVG to cache file names
    #[serde(default)]
    pub fingerprint_sources: bool,
}

fn default_output_dir() -> PathBuf { PathBuf::from("icons/png") }
fn default_icon_size() -> u32 { 64 }

impl Default for IconConfig {
    fn default() -> Self {
        Self {
            svg_paths: vec![],
            output_dir: default_output_dir(),
            default_size: default_icon_size(),
            color: String::new(),
            mappings: HashMap::new(),
            fingerprint_sources: false,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionTemplate {
    #[serde(default)]
    pub spacing: String,
    #[serde(default)]
    pub font: String,
    /// Icon width as a percentage of its grid cell; 0 means the default
    #[serde(default)]
    pub icon_size: u32,
    #[serde(default)]
    pub title_spacing: String,
    #[serde(default)]
    pub item_spacing: String,
}

impl SectionTemplate {
    pub const DEFAULT_ICON_PERCENT: u32 = 60;

    pub fn icon_percent(&self) -> u32 {
        if self.icon_size == 0 {
            Self::DEFAULT_ICON_PERCENT
        } else {
            self.icon_size
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Name of the entry in `section_templates` supplying fonts and spacing
    #[serde(default)]
    pub template: String,
    /// Renderer tag; defaults to the section key
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub order: i64,
}

impl SectionConfig {
    pub fn type_tag<'a>(&'a self, key: &'a str) -> &'a str {
        self.kind.as_deref().filter(|k| !k.is_empty()).unwrap_or(key)
    }

    pub fn template_name<'a>(&'a self, key: &'a str) -> &'a str {
        if self.template.is_empty() { key } else { &self.template }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let cfg: DocumentConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(cfg.pdf.page_size, "A4");
        assert_eq!(cfg.pdf.margins.left, 20.0);
        assert!(cfg.pdf.divider.enabled);
        assert_eq!(cfg.icons.default_size, 64);
        assert!(cfg.block_enabled(HEADER_SECTION));
    }

    #[test]
    fn test_sections_keep_declaration_order() {
        let cfg: DocumentConfig = serde_json::from_value(json!({
            "sections": {
                "zeta": {"enabled": true},
                "alpha": {"enabled": true},
                "mid": {"enabled": false}
            }
        }))
        .unwrap();
        let keys: Vec<_> = cfg.sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_type_tag_defaults_to_key() {
        let section: SectionConfig = serde_json::from_value(json!({
            "template": "simple_list",
            "enabled": true
        }))
        .unwrap();
        assert_eq!(section.type_tag("skills"), "skills");
        assert_eq!(section.template_name("skills"), "simple_list");

        let typed: SectionConfig = serde_json::from_value(json!({"type": "text"})).unwrap();
        assert_eq!(typed.type_tag("about"), "text");
        assert_eq!(typed.template_name("about"), "about");
    }

    #[test]
    fn test_icon_percent_fallback() {
        assert_eq!(SectionTemplate::default().icon_percent(), 60);
        let t = SectionTemplate { icon_size: 80, ..Default::default() };
        assert_eq!(t.icon_percent(), 80);
    }
}
