//! Icon Asset Pipeline - Content-Addressed Raster Cache
//!
//! `(stem, color, size)` fully determines the cached file. A file already at
//! the key path is always reused, so edits to the source SVG are not picked
//! up unless the cache is cleared or `fingerprint_sources` is enabled.

use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::{DocumentConfig, IconConfig};
use crate::hashing::source_fingerprint;
use crate::raster::rasterize;
use crate::recolor::recolor_svg;
use crate::style::resolve_color_hex;

pub const SOURCE_EXTENSION: &str = "svg";
pub const RASTER_EXTENSION: &str = "png";

#[derive(Debug, Error)]
pub enum IconError {
    #[error("Icon source {0}.svg not found in any configured search path")]
    SourceNotFound(String),

    #[error("Icon size must be at least 1px")]
    ZeroSize,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SVG parse error: {0}")]
    Parse(String),

    #[error("Rasterization error: {0}")]
    Raster(String),

    #[error("PNG encoding error: {0}")]
    Encode(String),

    #[error("Failed to move icon into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IconCacheKey {
    pub stem: String,
    /// Six hex digits, no `#`
    pub color_hex: String,
    pub size: u32,
    pub fingerprint: Option<String>,
}

impl IconCacheKey {
    pub fn new(stem: impl Into<String>, color_hex: impl Into<String>, size: u32) -> Self {
        Self {
            stem: stem.into(),
            color_hex: color_hex.into(),
            size,
            fingerprint: None,
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: String) -> Self {
        self.fingerprint = Some(fingerprint);
        self
    }

    /// `<stem>_<hex>_<size>px.png`
    pub fn file_name(&self) -> String {
        match &self.fingerprint {
            Some(fp) => format!(
                "{}_{}_{}px_{}.{}",
                self.stem, self.color_hex, self.size, fp, RASTER_EXTENSION
            ),
            None => format!(
                "{}_{}_{}px.{}",
                self.stem, self.color_hex, self.size, RASTER_EXTENSION
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IconStats {
    /// Requests answered from a file already on disk
    pub hits: u32,
    /// Requests that parsed and rasterized a source SVG
    pub conversions: u32,
    /// Requests for a mapped icon that could not be produced
    pub misses: u32,
}

pub struct IconPipeline<'a> {
    config: &'a IconConfig,
    palette: &'a HashMap<String, String>,
    resolved: HashMap<IconCacheKey, PathBuf>,
    stats: IconStats,
}

impl<'a> IconPipeline<'a> {
    pub fn new(config: &'a IconConfig, palette: &'a HashMap<String, String>) -> Self {
        Self {
            config,
            palette,
            resolved: HashMap::new(),
            stats: IconStats::default(),
        }
    }

    pub fn from_document(config: &'a DocumentConfig) -> Self {
        Self::new(&config.icons, &config.colors)
    }

    pub fn stats(&self) -> IconStats {
        self.stats
    }

    pub fn default_size(&self) -> u32 {
        self.config.default_size
    }

    pub fn default_color(&self) -> &'a str {
        &self.config.color
    }

    /// Icon at the configured default size and color
    pub fn ensure_default(&mut self, icon_key: &str) -> Option<PathBuf> {
        let config = self.config;
        self.ensure(icon_key, config.default_size, config.color.as_str())
    }

    /// Return the cached raster for `icon_key`, converting it on first use.
    ///
    /// Unmapped keys and any conversion failure yield `None`.
    pub fn ensure(&mut self, icon_key: &str, size: u32, color_ref: &str) -> Option<PathBuf> {
        if icon_key.is_empty() {
            return None;
        }
        let config = self.config;
        let Some(stem) = config.mappings.get(icon_key) else {
            log::debug!("no icon mapping for '{}'", icon_key);
            return None;
        };
        if size == 0 {
            return self.miss(icon_key, IconError::ZeroSize);
        }

        let color_hex = resolve_color_hex(color_ref, self.palette);
        let mut key = IconCacheKey::new(stem.as_str(), color_hex, size);

        let mut source = None;
        if config.fingerprint_sources {
            match self.read_source(stem) {
                Ok((path, svg)) => {
                    key = key.with_fingerprint(source_fingerprint(svg.as_bytes()));
                    source = Some((path, svg));
                }
                Err(e) => return self.miss(icon_key, e),
            }
        }

        if let Some(path) = self.resolved.get(&key) {
            if path.is_file() {
                self.stats.hits += 1;
                return Some(path.clone());
            }
        }

        let target = config.output_dir.join(key.file_name());
        if target.is_file() {
            self.stats.hits += 1;
            self.resolved.insert(key, target.clone());
            return Some(target);
        }

        let (source_path, svg) = match source {
            Some(found) => found,
            None => match self.read_source(stem) {
                Ok(found) => found,
                Err(e) => return self.miss(icon_key, e),
            },
        };

        match convert(&svg, &key, &target) {
            Ok(()) => {
                log::info!(
                    "converted icon '{}' from {} -> {}",
                    icon_key,
                    source_path.display(),
                    target.display()
                );
                self.stats.conversions += 1;
                self.resolved.insert(key, target.clone());
                Some(target)
            }
            Err(e) => self.miss(icon_key, e),
        }
    }

    fn miss(&mut self, icon_key: &str, err: IconError) -> Option<PathBuf> {
        log::warn!("Could not convert icon {}: {}", icon_key, err);
        self.stats.misses += 1;
        None
    }

    /// First search directory containing `<stem>.svg` wins.
    pub fn locate_source(&self, stem: &str) -> Result<PathBuf, IconError> {
        let file_name = format!("{}.{}", stem, SOURCE_EXTENSION);
        self.config
            .svg_paths
            .iter()
            .map(|dir| dir.join(&file_name))
            .find(|candidate| candidate.is_file())
            .ok_or_else(|| IconError::SourceNotFound(stem.to_string()))
    }

    fn read_source(&self, stem: &str) -> Result<(PathBuf, String), IconError> {
        let path = self.locate_source(stem)?;
        let svg = fs::read_to_string(&path)?;
        Ok((path, svg))
    }
}

fn convert(svg: &str, key: &IconCacheKey, target: &Path) -> Result<(), IconError> {
    let recolored = recolor_svg(svg, &key.color_hex);
    let image = rasterize(&recolored, key.size)?;
    log::debug!(
        "rasterized {} at {}x{}",
        key.file_name(),
        image.width,
        image.height
    );
    write_atomic(target, &image.png)
}

/// Write next to the target and rename, so readers never see a partial file.
fn write_atomic(target: &Path, bytes: &[u8]) -> Result<(), IconError> {
    let dir = match target.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(target)?;
    Ok(())
}

/// One-shot lookup against a document config
pub fn ensure_icon(
    icon_key: &str,
    size: u32,
    color_ref: &str,
    config: &DocumentConfig,
) -> Option<PathBuf> {
    IconPipeline::from_document(config).ensure(icon_key, size, color_ref)
}

#[cfg(test)]
mod tests {
    use super::*;
    use resvg::tiny_skia::Pixmap;
    use tempfile::TempDir;

    const ENVELOPE: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 512 448"><path d="M0 0 L512 0 L512 448 L0 448 Z"/></svg>"#;

    fn setup() -> (TempDir, DocumentConfig) {
        let dir = TempDir::new().unwrap();
        let svg_dir = dir.path().join("svg");
        fs::create_dir_all(&svg_dir).unwrap();
        fs::write(svg_dir.join("envelope.svg"), ENVELOPE).unwrap();

        let mut config = DocumentConfig::default();
        config.colors.insert("primary".into(), "#2C3E50".into());
        config.icons.svg_paths = vec![svg_dir];
        config.icons.output_dir = dir.path().join("png");
        config.icons.mappings.insert("email".into(), "envelope".into());
        config.icons.color = "primary".into();
        (dir, config)
    }

    #[test]
    fn test_cache_key_file_name() {
        let key = IconCacheKey::new("envelope", "2C3E50", 32);
        assert_eq!(key.file_name(), "envelope_2C3E50_32px.png");
        let key = key.with_fingerprint("abc123".into());
        assert_eq!(key.file_name(), "envelope_2C3E50_32px_abc123.png");
    }

    #[test]
    fn test_second_request_is_cache_hit() {
        let (dir, config) = setup();
        let mut pipeline = IconPipeline::from_document(&config);

        let first = pipeline.ensure("email", 32, "primary").unwrap();
        let second = pipeline.ensure("email", 32, "primary").unwrap();

        assert_eq!(first, second);
        assert_eq!(first, dir.path().join("png").join("envelope_2C3E50_32px.png"));
        assert_eq!(pipeline.stats(), IconStats { hits: 1, conversions: 1, misses: 0 });
    }

    #[test]
    fn test_existing_file_reused_across_pipelines() {
        let (_dir, config) = setup();
        let first = ensure_icon("email", 32, "primary", &config).unwrap();
        let written = fs::read(&first).unwrap();

        let mut fresh = IconPipeline::from_document(&config);
        let again = fresh.ensure("email", 32, "primary").unwrap();
        assert_eq!(again, first);
        assert_eq!(fresh.stats().conversions, 0);
        assert_eq!(fs::read(&again).unwrap(), written);
    }

    #[test]
    fn test_recolored_and_sized() {
        let (_dir, config) = setup();
        let path = ensure_icon("email", 64, "primary", &config).unwrap();
        let pixmap = Pixmap::decode_png(&fs::read(path).unwrap()).unwrap();
        assert_eq!((pixmap.width(), pixmap.height()), (64, 56));

        let px = pixmap.pixel(32, 28).unwrap();
        assert_eq!((px.red(), px.green(), px.blue(), px.alpha()), (0x2C, 0x3E, 0x50, 255));
    }

    #[test]
    fn test_unmapped_key_is_not_an_error() {
        let (_dir, config) = setup();
        let mut pipeline = IconPipeline::from_document(&config);
        assert_eq!(pipeline.ensure("fax", 32, "primary"), None);
        assert_eq!(pipeline.ensure("", 32, "primary"), None);
        assert_eq!(pipeline.stats(), IconStats::default());
    }

    #[test]
    fn test_missing_source_degrades_to_none() {
        let (_dir, mut config) = setup();
        config.icons.mappings.insert("phone".into(), "handset".into());
        let mut pipeline = IconPipeline::from_document(&config);
        assert_eq!(pipeline.ensure("phone", 32, "primary"), None);
        assert_eq!(pipeline.stats().misses, 1);
    }

    #[test]
    fn test_invalid_svg_degrades_to_none() {
        let (dir, mut config) = setup();
        fs::write(dir.path().join("svg").join("broken.svg"), "<svg").unwrap();
        config.icons.mappings.insert("broken".into(), "broken".into());
        assert_eq!(ensure_icon("broken", 32, "primary", &config), None);
        assert!(!dir.path().join("png").join("broken_2C3E50_32px.png").exists());
    }

    #[test]
    fn test_first_search_path_wins() {
        let (dir, mut config) = setup();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        let square = |fill: &str| {
            format!(
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 10 10"><rect width="10" height="10" fill="{}"/></svg>"#,
                fill
            )
        };
        fs::write(first.join("dot.svg"), square("#FF0000")).unwrap();
        fs::write(second.join("dot.svg"), square("#0000FF")).unwrap();
        config.icons.svg_paths = vec![dir.path().join("missing"), first, second];
        config.icons.mappings.insert("dot".into(), "dot".into());

        let path = ensure_icon("dot", 10, "", &config).unwrap();
        assert!(path.ends_with("dot_000000_10px.png"));
        let pixmap = Pixmap::decode_png(&fs::read(path).unwrap()).unwrap();
        assert_eq!(pixmap.pixel(5, 5).unwrap().red(), 255);
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (dir, config) = setup();
        ensure_icon("email", 16, "primary", &config).unwrap();
        let entries: Vec<_> = fs::read_dir(dir.path().join("png")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_fingerprint_tracks_source_edits() {
        let (dir, mut config) = setup();
        config.icons.fingerprint_sources = true;

        let before = ensure_icon("email", 16, "primary", &config).unwrap();
        fs::write(
            dir.path().join("svg").join("envelope.svg"),
            ENVELOPE.replace("448", "512"),
        )
        .unwrap();
        let after = ensure_icon("email", 16, "primary", &config).unwrap();

        assert_ne!(before, after);
        assert!(after.file_name().unwrap().to_string_lossy().starts_with("envelope_2C3E50_16px_"));
    }

    #[test]
    fn test_zero_size_rejected_without_writing() {
        let (dir, config) = setup();
        let mut pipeline = IconPipeline::from_document(&config);
        assert_eq!(pipeline.ensure("email", 0, "primary"), None);
        assert_eq!(pipeline.stats().misses, 1);
        assert!(!dir.path().join("png").join("envelope_2C3E50_0px.png").exists());
    }
}
