//! `load_config`: reads the YAML site configuration into a [`SiteConfig`].
//!
//! This is the only place untrusted YAML is parsed. Secrets never live in the file; the
//! Notion token is read from the environment by the client.
//!
//! # Errors
//! Failures surface as `anyhow::Error` with the config path and the reason, so the CLI can
//! print them as they are.

use anyhow::{bail, Result};
use notion_site_core::config::SiteConfig;
use std::fs;
use std::path::Path;
use tracing::{error, info};

/// Loads and validates a site config. Relative `home_path` values are kept as written and
/// resolve against the working directory.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SiteConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => content,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            bail!("Failed to read config file {:?}: {}", path_ref, e);
        }
    };

    let config: SiteConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => conf,
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            bail!("Failed to parse config YAML: {e}");
        }
    };

    if config.database_id.trim().is_empty() {
        error!(config_path = ?path_ref, "Config has an empty database_id");
        bail!("Invalid config {:?}: database_id must not be empty", path_ref);
    }

    config.trace_loaded();
    Ok(config)
}
