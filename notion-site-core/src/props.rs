//! Typed view over a page's property bag, and page classification.
//!
//! Property values arrive in the API's typed shape, e.g.
//! `{"type": "rich_text", "rich_text": [{"plain_text": "..."}]}`. The helpers here pull the
//! handful of shapes the engine cares about into plain Rust values.

use serde_json::{Map, Value};

use crate::config::PropertyNames;
use crate::model::Page;

/// Role of a page, decided once from its properties before any file I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    /// Site-wide configuration; never produces a file.
    Settings,
    /// Directory node; children attach beneath it.
    Folder,
    /// One markdown file plus one front-matter record.
    Content,
}

impl PageRole {
    /// Classifies from the value of the kind property. Anything that is not a settings or
    /// folder marker is content.
    pub fn from_kind(kind: Option<&str>) -> Self {
        match kind.map(|k| k.trim().to_ascii_lowercase()).as_deref() {
            Some("settings") | Some("setting") => PageRole::Settings,
            Some("folder") | Some("directory") => PageRole::Folder,
            _ => PageRole::Content,
        }
    }
}

/// The properties of one page the engine reads, extracted once.
#[derive(Debug, Clone, PartialEq)]
pub struct PageProps {
    pub title: String,
    pub slug: Option<String>,
    /// Slash separated location relative to the owning folder; empty means "here".
    pub position: String,
    pub role: PageRole,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub description: Option<String>,
    pub date: Option<String>,
}

impl PageProps {
    pub fn from_page(page: &Page, names: &PropertyNames) -> Self {
        let props = &page.properties;
        let title = props
            .get(&names.title)
            .and_then(plain_text)
            .or_else(|| title_property(props))
            .unwrap_or_default();

        Self {
            title,
            slug: props.get(&names.slug).and_then(plain_text),
            position: props
                .get(&names.position)
                .and_then(plain_text)
                .unwrap_or_default(),
            role: PageRole::from_kind(props.get(&names.kind).and_then(select_name).as_deref()),
            tags: props.get(&names.tags).map(multi_select).unwrap_or_default(),
            categories: props
                .get(&names.categories)
                .map(multi_select)
                .unwrap_or_default(),
            description: props.get(&names.description).and_then(plain_text),
            date: props.get(&names.date).and_then(date_start),
        }
    }

    pub fn is_settings(&self) -> bool {
        self.role == PageRole::Settings
    }

    pub fn is_folder(&self) -> bool {
        self.role == PageRole::Folder
    }
}

/// Plain text of a title, rich text, url, number, select or formula value.
/// Empty text is treated as absent.
pub fn plain_text(value: &Value) -> Option<String> {
    let text = match value.get("type").and_then(Value::as_str)? {
        kind @ ("title" | "rich_text") => value
            .get(kind)?
            .as_array()?
            .iter()
            .filter_map(|t| t.get("plain_text").and_then(Value::as_str))
            .collect::<String>(),
        kind @ ("url" | "email" | "phone_number") => value.get(kind)?.as_str()?.to_string(),
        "number" => value.get("number")?.as_f64()?.to_string(),
        "select" | "status" => select_name(value)?,
        "formula" => {
            let formula = value.get("formula")?;
            formula.get("string").and_then(Value::as_str)?.to_string()
        }
        _ => return None,
    };
    let text = text.trim().to_string();
    (!text.is_empty()).then_some(text)
}

/// Name of a `select` or `status` option.
pub fn select_name(value: &Value) -> Option<String> {
    let kind = value.get("type").and_then(Value::as_str)?;
    value
        .get(kind)?
        .get("name")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// Option names of a `multi_select`; other shapes yield nothing.
pub fn multi_select(value: &Value) -> Vec<String> {
    value
        .get("multi_select")
        .and_then(Value::as_array)
        .map(|options| {
            options
                .iter()
                .filter_map(|o| o.get("name").and_then(Value::as_str))
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Start of a `date` value.
pub fn date_start(value: &Value) -> Option<String> {
    value
        .get("date")?
        .get("start")
        .and_then(Value::as_str)
        .map(str::to_string)
}

/// First property of type `title`, used when the configured title property is missing.
fn title_property(props: &Map<String, Value>) -> Option<String> {
    props
        .values()
        .find(|v| v.get("type").and_then(Value::as_str) == Some("title"))
        .and_then(plain_text)
}

/// Builders for property values in the API shape. Handy for tests and fixtures.
pub mod value {
    use serde_json::{json, Value};

    pub fn title(text: &str) -> Value {
        json!({ "type": "title", "title": [{ "plain_text": text }] })
    }

    pub fn rich_text(text: &str) -> Value {
        json!({ "type": "rich_text", "rich_text": [{ "plain_text": text }] })
    }

    pub fn select(name: &str) -> Value {
        json!({ "type": "select", "select": { "name": name } })
    }

    pub fn status(name: &str) -> Value {
        json!({ "type": "status", "status": { "name": name } })
    }

    pub fn multi_select(names: &[&str]) -> Value {
        let options: Vec<Value> = names.iter().map(|n| json!({ "name": n })).collect();
        json!({ "type": "multi_select", "multi_select": options })
    }

    pub fn date(start: &str) -> Value {
        json!({ "type": "date", "date": { "start": start } })
    }
}
