//! `init`: bootstraps a default configuration file.

use anyhow::{bail, Context, Result};
use notion_site_core::config::SiteConfig;
use std::fs;
use std::path::Path;
use tracing::info;

/// Written by `notion-site init` when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "notion-site.yaml";

/// Placeholder the user replaces with their root database id.
pub const DATABASE_ID_PLACEHOLDER: &str = "<your-database-id>";

pub fn default_config() -> SiteConfig {
    SiteConfig::with_defaults(".", DATABASE_ID_PLACEHOLDER)
}

/// Writes [`default_config`] as YAML to `path`. An existing file is never overwritten.
pub fn write_default_config(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("Refusing to overwrite existing config {}", path.display());
    }
    let yaml = serde_yaml::to_string(&default_config()).context("serializing default config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    fs::write(path, yaml).with_context(|| format!("writing config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default config");
    Ok(())
}
