//! Hashing System - SHA-256 for Streams and Sources
//!
//! Provides deterministic, reproducible digests of composition inputs and
//! outputs, plus short fingerprints for icon sources.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

/// Hex digits of the source digest appended to fingerprinted cache names
pub const FINGERPRINT_LEN: usize = 12;

/// Lowercase hex SHA-256 digest
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Compact JSON with object keys sorted at every depth
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut v: Value = serde_json::to_value(value)?;
    sort_keys(&mut v);
    to_string(&v)
}

fn sort_keys(v: &mut Value) {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = std::mem::take(map).into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            for (key, mut child) in entries {
                sort_keys(&mut child);
                map.insert(key, child);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(sort_keys),
        _ => {}
    }
}

/// Hash of an emitted row stream; identical inputs give identical hashes
pub fn compute_stream_hash<T: Serialize>(rows: &T) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(rows)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Hash of everything that went into a composition
/// input_hash = sha256(canonical_config + canonical_content + engine_version)
pub fn compute_input_hash(
    config: &impl Serialize,
    content: &impl Serialize,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let combined = format!(
        "{}:{}:{}",
        canonical_json(config)?,
        canonical_json(content)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

/// Short digest of an icon source file
pub fn source_fingerprint(data: &[u8]) -> String {
    let mut digest = sha256_hex(data);
    digest.truncate(FINGERPRINT_LEN);
    digest
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Row, TextSpec};
    use crate::style::{FontStyle, ResolvedFont, Rgb};
    use serde_json::json;

    #[test]
    fn test_row_stream_canonical_form() {
        let font = ResolvedFont {
            family: "Arial".into(),
            size: 10.0,
            style: FontStyle::Bold,
            color: Rgb::BLACK,
        };
        let rows = vec![Row::text(6.0, TextSpec::new("Jane", &font))];
        let canonical = canonical_json(&rows).unwrap();

        assert!(canonical.starts_with(r#"[{"columns":[{"primitive":{"#));
        assert!(canonical.ends_with(r#""weight":12}],"height":6.0}]"#));
        assert!(!canonical.contains(": "));
    }

    #[test]
    fn test_stream_hash_tracks_row_content() {
        let font = ResolvedFont {
            family: "Arial".into(),
            size: 10.0,
            style: FontStyle::Normal,
            color: Rgb::BLACK,
        };
        let jane = vec![Row::text(6.0, TextSpec::new("Jane", &font))];
        let john = vec![Row::text(6.0, TextSpec::new("John", &font))];
        assert_eq!(
            compute_stream_hash(&jane).unwrap(),
            compute_stream_hash(&jane.clone()).unwrap()
        );
        assert_ne!(compute_stream_hash(&jane).unwrap(), compute_stream_hash(&john).unwrap());
    }

    #[test]
    fn test_sha256_known_digest() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_stream_hash_ignores_key_order() {
        let a = json!([{"height": 10.0, "columns": []}]);
        let b = json!([{"columns": [], "height": 10.0}]);
        assert_eq!(compute_stream_hash(&a).unwrap(), compute_stream_hash(&b).unwrap());
    }

    #[test]
    fn test_input_hash_changes_with_engine() {
        let cfg = json!({"colors": {"primary": "#000000"}});
        let content = json!({"personal": {"name": "Jane"}});
        let h1 = compute_input_hash(&cfg, &content, "1.0.0").unwrap();
        let h2 = compute_input_hash(&cfg, &content, "1.1.0").unwrap();
        assert_ne!(h1, h2);
    }

    #[test]
    fn test_source_fingerprint_length() {
        let fp = source_fingerprint(b"<svg/>");
        assert_eq!(fp.len(), FINGERPRINT_LEN);
        assert_ne!(fp, source_fingerprint(b"<svg></svg>"));
    }
}
