//! Style Resolver - Symbolic Names to Concrete Values
//!
//! Every lookup goes through exactly one level of indirection: a name is
//! either a key in the relevant config table or, for colors, a literal.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{DocumentConfig, FontDefinition};

/// Hex used when no color is configured at all
pub const FALLBACK_HEX: &str = "000000";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { red: 0, green: 0, blue: 0 };

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Uppercase six-digit hex without `#`
    pub fn to_hex(self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontStyle {
    #[default]
    Normal,
    Bold,
    Italic,
    BoldItalic,
}

/// A font definition with its color reference already resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedFont {
    pub family: String,
    pub size: f64,
    pub style: FontStyle,
    pub color: Rgb,
}

/// Parse `RRGGBB` (optionally `#`-prefixed). Anything else is black.
pub fn hex_to_rgb(hex: &str) -> Rgb {
    match parse_hex(hex) {
        Some(rgb) => rgb,
        None => Rgb::BLACK,
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
}

/// Resolve a palette name, or fall back to treating the name as a literal hex.
///
/// The palette value itself is never looked up again.
pub fn resolve_color(name: &str, palette: &HashMap<String, String>) -> Rgb {
    match palette.get(name) {
        Some(value) => hex_to_rgb(value),
        None => hex_to_rgb(name),
    }
}

/// Resolve a color reference to the hex digits used in icon cache keys.
///
/// Valid hex keeps its original casing so file names from earlier runs still
/// match. An empty or missing reference yields `000000`.
pub fn resolve_color_hex(name: &str, palette: &HashMap<String, String>) -> String {
    let value = palette.get(name).map(String::as_str).unwrap_or(name);
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.is_empty() {
        return FALLBACK_HEX.to_string();
    }
    match parse_hex(digits) {
        Some(_) => digits.to_string(),
        None => {
            log::debug!("color '{}' is not valid hex, using black", name);
            hex_to_rgb(digits).to_hex()
        }
    }
}

pub fn resolve_font_style(token: &str) -> FontStyle {
    match token.to_ascii_lowercase().as_str() {
        "bold" => FontStyle::Bold,
        "italic" => FontStyle::Italic,
        "bolditalic" => FontStyle::BoldItalic,
        _ => FontStyle::Normal,
    }
}

/// Config-backed resolver for fonts, spacings and colors
#[derive(Debug, Clone, Copy)]
pub struct StyleResolver<'a> {
    config: &'a DocumentConfig,
}

impl<'a> StyleResolver<'a> {
    pub fn new(config: &'a DocumentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &'a DocumentConfig {
        self.config
    }

    pub fn color(&self, name: &str) -> Rgb {
        resolve_color(name, &self.config.colors)
    }

    /// Missing spacing names resolve to zero.
    pub fn spacing(&self, name: &str) -> f64 {
        match self.config.spacing.get(name) {
            Some(gap) => *gap,
            None => {
                if !name.is_empty() {
                    log::debug!("spacing '{}' not configured", name);
                }
                0.0
            }
        }
    }

    /// Missing fonts resolve to the default definition.
    pub fn font(&self, name: &str) -> ResolvedFont {
        let fallback;
        let def = match self.config.fonts.get(name) {
            Some(def) => def,
            None => {
                log::debug!("font '{}' not configured, using default", name);
                fallback = FontDefinition::default();
                &fallback
            }
        };
        self.resolve_font(def)
    }

    pub fn resolve_font(&self, def: &FontDefinition) -> ResolvedFont {
        ResolvedFont {
            family: def.family.clone(),
            size: def.size,
            style: resolve_font_style(&def.style),
            color: self.color(&def.color),
        }
    }
}
