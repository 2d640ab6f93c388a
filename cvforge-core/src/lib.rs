//! cvforge Core - Document Composition Engine
//!
//! # Ground Rules
//! 1. Inputs Are Immutable
//! 2. Only Loading Is Fatal
//! 3. Every Miss Degrades, Nothing Aborts
//! 4. Icon Files Are Content-Addressed
//! 5. Identical Inputs, Identical Rows

pub mod backend;
pub mod commands;
pub mod compose;
pub mod config;
pub mod content;
pub mod hashing;
pub mod icons;
pub mod loader;
pub mod raster;
pub mod recolor;
pub mod sections;
pub mod style;

pub use backend::{BackendError, DocumentBackend, DocumentManifest, JsonBackend, RecordingBackend};
pub use commands::{Column, Primitive, Row, TextSpec, ImageSpec, LineSpec};
pub use compose::{Composer, Composition, ComposeSummary, compose_document, ordered_sections};
pub use config::{DocumentConfig, IconConfig, SectionConfig, SectionTemplate};
pub use content::{Content, ContactField, SectionPayload, SectionItem, EntryItem};
pub use hashing::{compute_stream_hash, compute_input_hash, canonical_json};
pub use icons::{IconPipeline, IconCacheKey, IconError, IconStats, ensure_icon};
pub use loader::{LoadError, load_config, load_content};
pub use sections::{RendererKind, RendererRegistry, SectionRenderer, SectionStyle};
pub use style::{Rgb, FontStyle, StyleResolver, hex_to_rgb, resolve_color, resolve_font_style};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
