use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Name of the directory under `home_path` that receives all generated content.
pub const CONTENT_DIR: &str = "content";

/// File name of the front-matter manifest written into the content directory.
pub const MANIFEST_FILE: &str = "blogs.json";

/// Full configuration for one run. Secrets (the API token) are never part of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Root of the generated site; content lands in `<home_path>/content`.
    pub home_path: PathBuf,
    /// The root database every run starts from.
    pub database_id: String,
    #[serde(default)]
    pub notion: NotionConfig,
    #[serde(default)]
    pub properties: PropertyNames,
    #[serde(default)]
    pub template: TemplateConfig,
    #[serde(default)]
    pub markdown: MarkdownConfig,
}

impl SiteConfig {
    pub fn content_dir(&self) -> PathBuf {
        self.home_path.join(CONTENT_DIR)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.content_dir().join(MANIFEST_FILE)
    }

    pub fn trace_loaded(&self) {
        info!(
            home_path = %self.home_path.display(),
            database_id = %self.database_id,
            filter_prop = %self.notion.filter_prop,
            "Loaded SiteConfig"
        );
        debug!(?self, "SiteConfig loaded (full debug)");
    }
}

/// Which pages are pulled and how they are marked once processed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotionConfig {
    /// Status-like property used both for filtering and for the published mark.
    #[serde(default = "default_filter_prop")]
    pub filter_prop: String,
    /// Pages whose `filter_prop` holds one of these values are queried.
    /// Empty means no filter.
    #[serde(default = "default_filter_value")]
    pub filter_value: Vec<String>,
    /// Value written to `filter_prop` after a page is processed. Empty disables the mutation.
    #[serde(default = "default_published_value")]
    pub published_value: String,
}

impl Default for NotionConfig {
    fn default() -> Self {
        Self {
            filter_prop: default_filter_prop(),
            filter_value: default_filter_value(),
            published_value: default_published_value(),
        }
    }
}

fn default_filter_prop() -> String {
    "Status".to_string()
}

fn default_filter_value() -> Vec<String> {
    vec!["Finished".to_string(), "Published".to_string()]
}

fn default_published_value() -> String {
    "Published".to_string()
}

/// Names of the page properties the engine reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PropertyNames {
    pub title: String,
    pub slug: String,
    pub position: String,
    /// Select property classifying a page as `Settings`, `Folder` or regular content.
    pub kind: String,
    pub tags: String,
    pub categories: String,
    pub description: String,
    pub date: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        Self {
            title: "Name".to_string(),
            slug: "Slug".to_string(),
            position: "Position".to_string(),
            kind: "Type".to_string(),
            tags: "Tags".to_string(),
            categories: "Categories".to_string(),
            description: "Description".to_string(),
            date: "Date".to_string(),
        }
    }
}

/// Extra front-matter fields stamped onto every content page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Optional layout/template name, emitted as the `template` front-matter field.
    #[serde(default)]
    pub name: Option<String>,
    /// Arbitrary fields merged into each record. `{{title}}` and `{{slug}}` are substituted.
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MarkdownConfig {
    /// Shortcode delimiter style for embeds, e.g. `hugo` renders `{{< video url="..." >}}`.
    #[serde(default)]
    pub shortcode_syntax: Option<String>,
}

impl SiteConfig {
    /// Configuration used by `notion-site init` and as a baseline in tests.
    pub fn with_defaults(home_path: impl Into<PathBuf>, database_id: impl Into<String>) -> Self {
        Self {
            home_path: home_path.into(),
            database_id: database_id.into(),
            notion: NotionConfig::default(),
            properties: PropertyNames::default(),
            template: TemplateConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}
