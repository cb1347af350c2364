use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A page as returned by a database query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub created_time: Option<String>,
    #[serde(default)]
    pub last_edited_time: Option<String>,
    #[serde(default)]
    pub created_by: PartialUser,
    #[serde(default)]
    pub last_edited_by: PartialUser,
    /// Raw property bag keyed by property name, each value in the API's typed shape.
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Page {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Value) -> Self {
        self.properties.insert(name.into(), value);
        self
    }

    pub fn with_authors(mut self, created_by: &str, last_edited_by: &str) -> Self {
        self.created_by = PartialUser::new(created_by);
        self.last_edited_by = PartialUser::new(last_edited_by);
        self
    }
}

/// User reference embedded in pages; only the id is populated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialUser {
    #[serde(default)]
    pub id: String,
}

impl PartialUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub person: Option<Person>,
}

impl User {
    /// Stand-in recorded when a lookup fails, so the id is not queried again.
    pub fn unknown(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default)]
    pub email: Option<String>,
}
