//! Config and Content Loading
//!
//! The only place where failures are fatal: a document is never composed
//! from input that did not parse.

use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::DocumentConfig;
use crate::content::Content;
use crate::ENGINE_VERSION;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Invalid JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Config requires engine >= {required}, current is {current}")]
    EngineVersionMismatch { required: String, current: String },

    #[error("Invalid version requirement '{0}'")]
    InvalidVersion(String),
}

pub fn load_config(path: &Path) -> Result<DocumentConfig, LoadError> {
    let config: DocumentConfig = load_json(path)?;
    check_engine_version(&config)?;
    log::info!(
        "loaded config {} ({} sections, {} icon mappings)",
        path.display(),
        config.sections.len(),
        config.icons.mappings.len()
    );
    Ok(config)
}

pub fn load_content(path: &Path) -> Result<Content, LoadError> {
    let content: Content = load_json(path)?;
    log::info!(
        "loaded content {} ({} contact fields, {} sections)",
        path.display(),
        content.contact_fields.len(),
        content.sections.len()
    );
    Ok(content)
}

pub fn parse_config(json: &str) -> Result<DocumentConfig, LoadError> {
    let config = serde_json::from_str(json).map_err(|source| LoadError::Json {
        path: "<inline>".to_string(),
        source,
    })?;
    check_engine_version(&config)?;
    Ok(config)
}

pub fn parse_content(json: &str) -> Result<Content, LoadError> {
    serde_json::from_str(json).map_err(|source| LoadError::Json {
        path: "<inline>".to_string(),
        source,
    })
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let display = path.display().to_string();
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if ext != "json" {
        return Err(LoadError::UnsupportedFormat(display));
    }

    let data = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: display.clone(),
        source,
    })?;
    serde_json::from_str(&data).map_err(|source| LoadError::Json { path: display, source })
}

fn check_engine_version(config: &DocumentConfig) -> Result<(), LoadError> {
    let Some(required) = &config.engine_min_version else {
        return Ok(());
    };

    let engine_ver = semver::Version::parse(ENGINE_VERSION)
        .map_err(|_| LoadError::InvalidVersion(ENGINE_VERSION.to_string()))?;
    let min_ver = semver::Version::parse(required)
        .map_err(|_| LoadError::InvalidVersion(required.clone()))?;

    if engine_ver < min_ver {
        return Err(LoadError::EngineVersionMismatch {
            required: required.clone(),
            current: ENGINE_VERSION.to_string(),
        });
    }
    Ok(())
}
