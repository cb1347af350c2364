//! Front-matter records and the manifest aggregator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::error::SiteError;
use crate::sanitize::sanitize;

/// Metadata describing one generated content page. Serialized both as the YAML header of
/// the markdown file and as an entry of the JSON manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontMatter {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Filled by [`finalize`]; empty until then.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub access_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lastmod: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
    /// Template-defined fields, flattened into the record.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Assigns every record its access path, then serializes the ordered collection as a JSON
/// array.
pub fn finalize(records: &mut [FrontMatter]) -> Result<Vec<u8>, SiteError> {
    for record in records.iter_mut() {
        let access_path = sanitize(&record.title, record.slug.as_deref()).map_err(|source| {
            SiteError::AccessPath {
                title: record.title.clone(),
                source,
            }
        })?;
        record.access_path = access_path;
        debug!(title = %record.title, access_path = %record.access_path, "[MANIFEST] Resolved access path");
    }
    Ok(serde_json::to_vec(records)?)
}

/// Runs [`finalize`] and writes the result to `path`.
pub fn write_manifest(records: &mut [FrontMatter], path: &Path) -> Result<(), SiteError> {
    let bytes = finalize(records)?;
    std::fs::write(path, bytes).map_err(|source| SiteError::ManifestWrite {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), records = records.len(), "[MANIFEST] Manifest written");
    Ok(())
}
