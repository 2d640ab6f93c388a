//! Draw Commands - What the Backend Receives
//!
//! A document is a flat list of rows. Each row splits a 12-unit grid between
//! its columns, and each column carries exactly one primitive.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::style::{FontStyle, ResolvedFont, Rgb};

pub const GRID_COLUMNS: u8 = 12;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub height: f64,
    pub columns: Vec<Column>,
}

impl Row {
    pub fn new(height: f64) -> Self {
        Self { height, columns: vec![] }
    }

    pub fn with_column(mut self, weight: u8, primitive: Primitive) -> Self {
        self.columns.push(Column { weight, primitive });
        self
    }

    /// A single full-width text column
    pub fn text(height: f64, text: TextSpec) -> Self {
        Self::new(height).with_column(GRID_COLUMNS, Primitive::Text(text))
    }

    pub fn total_weight(&self) -> u32 {
        self.columns.iter().map(|c| c.weight as u32).sum()
    }

    /// Text of every text column, in order
    pub fn texts(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter_map(|c| match &c.primitive {
                Primitive::Text(t) => Some(t.content.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub weight: u8,
    pub primitive: Primitive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Primitive {
    Text(TextSpec),
    Image(ImageSpec),
    Line(LineSpec),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSpec {
    pub content: String,
    pub family: String,
    pub size: f64,
    pub style: FontStyle,
    pub color: Rgb,
    #[serde(default)]
    pub align: Align,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperlink: Option<String>,
}

impl TextSpec {
    pub fn new(content: impl Into<String>, font: &ResolvedFont) -> Self {
        Self {
            content: content.into(),
            family: font.family.clone(),
            size: font.size,
            style: font.style,
            color: font.color,
            align: Align::Left,
            top: 0.0,
            left: 0.0,
            hyperlink: None,
        }
    }

    pub fn offset(mut self, top: f64, left: f64) -> Self {
        self.top = top;
        self.left = left;
        self
    }

    pub fn link(mut self, url: String, color: Rgb) -> Self {
        self.hyperlink = Some(url);
        self.color = color;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageSpec {
    pub path: PathBuf,
    /// Width as a percentage of the cell
    pub percent: f64,
    #[serde(default)]
    pub top: f64,
    #[serde(default)]
    pub left: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    #[default]
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSpec {
    pub color: Rgb,
    pub thickness: f64,
    pub orientation: Orientation,
    pub size_percent: f64,
    pub offset_percent: f64,
}
