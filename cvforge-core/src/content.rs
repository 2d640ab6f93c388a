//! Content Model - Schema-Free Document Data
//!
//! Section payloads are decoded into a closed set of shapes when the content
//! is loaded, so renderers never re-inspect raw JSON.

use regex::{Captures, Regex};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub personal: PersonalInfo,
    #[serde(default)]
    pub contact_fields: Vec<ContactField>,
    #[serde(default)]
    pub sections: HashMap<String, SectionPayload>,
}

/// `name` is the only field the composer needs; everything else is kept for
/// template placeholders.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonalInfo {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactField {
    #[serde(default)]
    pub field: String,
    /// Literal text or a `{{ .Personal.Field }}` template
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl ContactField {
    pub fn is_link(&self) -> bool {
        self.kind.as_deref() == Some("link") && self.link.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SectionPayload {
    Text { content: String },
    Items {
        #[serde(deserialize_with = "lenient_items")]
        items: Vec<SectionItem>,
    },
    #[serde(deserialize_with = "lenient_items")]
    List(Vec<SectionItem>),
    Other(Value),
}

impl SectionPayload {
    pub fn text(&self) -> Option<&str> {
        match self {
            SectionPayload::Text { content } => Some(content),
            _ => None,
        }
    }

    pub fn items(&self) -> &[SectionItem] {
        match self {
            SectionPayload::Items { items } | SectionPayload::List(items) => items,
            _ => &[],
        }
    }

    /// Whether there is anything a renderer could draw
    pub fn has_data(&self) -> bool {
        match self {
            SectionPayload::Text { content } => !content.trim().is_empty(),
            SectionPayload::Items { items } | SectionPayload::List(items) => !items.is_empty(),
            SectionPayload::Other(_) => false,
        }
    }
}

/// Decoded through [`lenient_items`]: strings become labels, objects become
/// entries, anything else is dropped.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SectionItem {
    Label(String),
    Entry(EntryItem),
}

impl SectionItem {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(SectionItem::Label(text)),
            Value::Object(_) => serde_json::from_value(value).ok().map(SectionItem::Entry),
            other => {
                log::debug!("dropping non-text section item {}", other);
                None
            }
        }
    }

    /// Short single-line form used by list renderers
    pub fn label(&self) -> Option<String> {
        match self {
            SectionItem::Label(text) if !text.trim().is_empty() => Some(text.clone()),
            SectionItem::Label(_) => None,
            SectionItem::Entry(entry) => entry.headline(),
        }
    }
}

/// Employment or education entry. Fields of the wrong JSON type are dropped
/// individually.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryItem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub company: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub degree: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub start_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub end_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_strings")]
    pub description: Vec<String>,
}

fn lenient_items<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<SectionItem>, D::Error> {
    let raw = Vec::<Value>::deserialize(deserializer)?;
    Ok(raw.into_iter().filter_map(SectionItem::from_value).collect())
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(Some(text)),
        _ => Ok(None),
    }
}

fn lenient_strings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Array(values) => Ok(values
            .into_iter()
            .filter_map(|v| match v {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect()),
        _ => Ok(vec![]),
    }
}

impl EntryItem {
    /// `title - company`, else `degree - institution`
    pub fn headline(&self) -> Option<String> {
        join_pair(self.title.as_deref(), self.company.as_deref())
            .or_else(|| join_pair(self.degree.as_deref(), self.institution.as_deref()))
    }

    /// `location | start - end`
    pub fn meta_line(&self) -> Option<String> {
        let mut parts = vec![];
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            parts.push(location.to_string());
        }
        if self.start_date.is_some() || self.end_date.is_some() {
            parts.push(format!(
                "{} - {}",
                self.start_date.as_deref().unwrap_or(""),
                self.end_date.as_deref().unwrap_or(""),
            ));
        }
        if parts.is_empty() {
            None
        } else {
            Some(parts.join(" | "))
        }
    }
}

fn join_pair(left: Option<&str>, right: Option<&str>) -> Option<String> {
    let left = left.filter(|s| !s.is_empty());
    let right = right.filter(|s| !s.is_empty());
    match (left, right) {
        (Some(l), Some(r)) => Some(format!("{} - {}", l, r)),
        (Some(one), None) | (None, Some(one)) => Some(one.to_string()),
        (None, None) => None,
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*\.?([A-Za-z0-9_]+(?:\.[A-Za-z0-9_]+)*)\s*\}\}")
            .expect("placeholder pattern is valid")
    })
}

/// Content serialized once for placeholder lookups
#[derive(Debug, Clone)]
pub struct TemplateContext {
    root: Value,
}

impl TemplateContext {
    pub fn new(content: &Content) -> Self {
        let root = serde_json::to_value(content).unwrap_or(Value::Null);
        Self { root }
    }

    /// Substitute `{{ .A.B }}` placeholders. Path segments match keys ignoring
    /// case and underscores, so `.Personal.GitHub` finds `personal.github`.
    ///
    /// A missing key under an existing object resolves to an empty string. If
    /// any placeholder walks through a missing or non-object parent the text
    /// is returned unchanged.
    pub fn resolve(&self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }

        let mut unresolved = false;
        let out = placeholder_regex().replace_all(text, |caps: &Captures| {
            match self.lookup(&caps[1]) {
                Some(value) => value,
                None => {
                    unresolved = true;
                    String::new()
                }
            }
        });

        if unresolved {
            log::debug!("unresolved placeholder in '{}'", text);
            text.to_string()
        } else {
            out.into_owned()
        }
    }

    fn lookup(&self, path: &str) -> Option<String> {
        let segments: Vec<&str> = path.split('.').collect();
        let (leaf, parents) = segments.split_last()?;

        let mut current = &self.root;
        for segment in parents {
            current = find_key(current.as_object()?, segment)?;
        }
        let Some(value) = find_key(current.as_object()?, leaf) else {
            return Some(String::new());
        };

        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            Value::Null => Some(String::new()),
            Value::Array(_) | Value::Object(_) => None,
        }
    }
}

fn find_key<'v>(map: &'v serde_json::Map<String, Value>, segment: &str) -> Option<&'v Value> {
    let wanted = normalize_key(segment);
    map.iter()
        .find(|(key, _)| normalize_key(key) == wanted)
        .map(|(_, value)| value)
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn content() -> Content {
        serde_json::from_value(json!({
            "personal": {"name": "Jane Doe", "github": "janedoe", "years": 7},
            "contact_fields": [],
            "sections": {}
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_shapes_decoded_at_load() {
        let text: SectionPayload = serde_json::from_value(json!({"content": "Hello"})).unwrap();
        assert_eq!(text.text(), Some("Hello"));

        let list: SectionPayload = serde_json::from_value(json!({"items": ["Go", "Rust"]})).unwrap();
        assert_eq!(list.items().len(), 2);
        assert!(matches!(list.items()[0], SectionItem::Label(_)));

        let entries: SectionPayload = serde_json::from_value(json!({
            "items": [{"title": "Engineer", "company": "Acme", "description": ["Built it"]}]
        }))
        .unwrap();
        match &entries.items()[0] {
            SectionItem::Entry(e) => assert_eq!(e.description, vec!["Built it"]),
            other => panic!("expected entry, got {:?}", other),
        }

        let bare: SectionPayload = serde_json::from_value(json!(["a", "b"])).unwrap();
        assert!(matches!(bare, SectionPayload::List(_)));

        let other: SectionPayload = serde_json::from_value(json!(42)).unwrap();
        assert!(matches!(other, SectionPayload::Other(_)));
        assert!(!other.has_data());
    }

    #[test]
    fn test_entry_lines() {
        let job = EntryItem {
            title: Some("Engineer".into()),
            company: Some("Acme".into()),
            location: Some("Oslo".into()),
            start_date: Some("2020".into()),
            end_date: None,
            ..Default::default()
        };
        assert_eq!(job.headline().as_deref(), Some("Engineer - Acme"));
        assert_eq!(job.meta_line().as_deref(), Some("Oslo | 2020 - "));

        let school = EntryItem {
            degree: Some("BSc".into()),
            institution: Some("NTNU".into()),
            ..Default::default()
        };
        assert_eq!(school.headline().as_deref(), Some("BSc - NTNU"));
        assert_eq!(school.meta_line(), None);
    }

    #[test]
    fn test_template_substitution() {
        let ctx = TemplateContext::new(&content());
        assert_eq!(
            ctx.resolve("https://github.com/{{.Personal.GitHub}}"),
            "https://github.com/janedoe"
        );
        assert_eq!(ctx.resolve("{{ personal.years }} years"), "7 years");
        assert_eq!(ctx.resolve("plain text"), "plain text");
    }

    #[test]
    fn test_missing_personal_key_resolves_blank() {
        let ctx = TemplateContext::new(&content());
        assert_eq!(ctx.resolve("{{.Personal.LinkedIn}}"), "");
        assert_eq!(ctx.resolve("linkedin.com/in/{{.Personal.LinkedIn}}"), "linkedin.com/in/");
    }

    #[test]
    fn test_unresolvable_parent_left_unchanged() {
        let ctx = TemplateContext::new(&content());
        for raw in ["{{.Employer.Name}}", "{{.Personal.Name.First}}", "{{.Personal}}"] {
            assert_eq!(ctx.resolve(raw), raw);
        }
    }

    #[test]
    fn test_mistyped_entry_fields_dropped_individually() {
        let payload: SectionPayload = serde_json::from_value(json!({
            "items": [
                {"title": "Engineer", "company": "Acme", "start_date": 2020,
                 "description": "Shipped v1"},
                {"degree": "BSc", "institution": "NTNU", "description": ["Thesis", 3]}
            ]
        }))
        .unwrap();
        assert!(payload.has_data());

        match &payload.items()[..] {
            [SectionItem::Entry(job), SectionItem::Entry(school)] => {
                assert_eq!(job.headline().as_deref(), Some("Engineer - Acme"));
                assert_eq!(job.start_date, None);
                assert!(job.description.is_empty());
                assert_eq!(school.description, vec!["Thesis"]);
            }
            other => panic!("expected two entries, got {:?}", other),
        }
    }

    #[test]
    fn test_non_text_list_items_dropped() {
        let payload: SectionPayload =
            serde_json::from_value(json!({"items": ["Go", 42, null, "Rust"]})).unwrap();
        let labels: Vec<_> = payload.items().iter().filter_map(SectionItem::label).collect();
        assert_eq!(labels, vec!["Go", "Rust"]);

        let bare: SectionPayload = serde_json::from_value(json!([true, "Chess"])).unwrap();
        assert_eq!(bare.items().len(), 1);
    }
}
