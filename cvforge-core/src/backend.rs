//! Document Backends - Consumers of the Row Stream

use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use thiserror::Error;
use uuid::Uuid;

use crate::commands::{Primitive, Row};
use crate::config::PageSettings;
use crate::hashing::compute_stream_hash;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Backend used out of order: {0}")]
    State(&'static str),
}

/// Receives the composed document one row at a time
pub trait DocumentBackend {
    fn begin(&mut self, page: &PageSettings) -> Result<(), BackendError>;
    fn add_row(&mut self, row: Row) -> Result<(), BackendError>;
    fn finish(&mut self) -> Result<(), BackendError>;
}

/// Keeps everything in memory
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub page: Option<PageSettings>,
    pub rows: Vec<Row>,
    pub finished: bool,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentBackend for RecordingBackend {
    fn begin(&mut self, page: &PageSettings) -> Result<(), BackendError> {
        self.page = Some(page.clone());
        Ok(())
    }

    fn add_row(&mut self, row: Row) -> Result<(), BackendError> {
        self.rows.push(row);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BackendError> {
        self.finished = true;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentManifest {
    pub id: String,
    pub engine_version: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub input_hash: Option<String>,
    pub stream_hash: String,
    pub page: PageSettings,
    pub rows: Vec<Row>,
    /// Image path -> base64 PNG, when embedding is on
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub images: BTreeMap<String, String>,
}

/// Writes the whole stream as one JSON manifest on `finish`
pub struct JsonBackend<W: Write> {
    writer: W,
    page: Option<PageSettings>,
    rows: Vec<Row>,
    embed_images: bool,
    pretty: bool,
    input_hash: Option<String>,
}

impl<W: Write> JsonBackend<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            page: None,
            rows: vec![],
            embed_images: false,
            pretty: true,
            input_hash: None,
        }
    }

    pub fn embed_images(mut self, embed: bool) -> Self {
        self.embed_images = embed;
        self
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    pub fn with_input_hash(mut self, hash: String) -> Self {
        self.input_hash = Some(hash);
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn collect_images(&self) -> BTreeMap<String, String> {
        let mut images = BTreeMap::new();
        for column in self.rows.iter().flat_map(|r| &r.columns) {
            let Primitive::Image(image) = &column.primitive else {
                continue;
            };
            let key = image.path.display().to_string();
            if images.contains_key(&key) {
                continue;
            }
            match fs::read(&image.path) {
                Ok(bytes) => {
                    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
                    images.insert(key, encoded);
                }
                Err(e) => log::warn!("cannot embed image {}: {}", key, e),
            }
        }
        images
    }
}

impl<W: Write> DocumentBackend for JsonBackend<W> {
    fn begin(&mut self, page: &PageSettings) -> Result<(), BackendError> {
        self.page = Some(page.clone());
        self.rows.clear();
        Ok(())
    }

    fn add_row(&mut self, row: Row) -> Result<(), BackendError> {
        if self.page.is_none() {
            return Err(BackendError::State("add_row before begin"));
        }
        self.rows.push(row);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), BackendError> {
        let page = self.page.take().ok_or(BackendError::State("finish before begin"))?;
        let images = if self.embed_images {
            self.collect_images()
        } else {
            BTreeMap::new()
        };

        let manifest = DocumentManifest {
            id: Uuid::new_v4().to_string(),
            engine_version: ENGINE_VERSION.to_string(),
            created_at: Utc::now(),
            input_hash: self.input_hash.clone(),
            stream_hash: compute_stream_hash(&self.rows)?,
            page,
            rows: std::mem::take(&mut self.rows),
            images,
        };

        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, &manifest)?;
        } else {
            serde_json::to_writer(&mut self.writer, &manifest)?;
        }
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
