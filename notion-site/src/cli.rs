//! # notion-site CLI
//!
//! Command parsing and orchestration only. Traversal, file layout and the manifest live in
//! `notion-site-core`; the HTTP client lives in [`crate::client`].
//!
//! - [`Cli`] / [`Commands`] define the user-facing surface (`sync`, `init`).
//! - [`run`] is the async entrypoint shared by `main` and the integration tests.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use notion_site_core::render::MarkdownRenderer;
use notion_site_core::synchronise::synchronise;
use std::path::PathBuf;

use crate::client::NotionClient;
use crate::init::{write_default_config, DEFAULT_CONFIG_FILE};
use crate::load_config::load_config;

/// Pull a Notion database tree into a markdown content tree.
#[derive(Parser)]
#[clap(
    name = "notion-site",
    version,
    about = "Generate static-site content from a Notion database"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronise the configured database tree into <home_path>/content
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Write a default config file
    Init {
        /// Where to write the config; an existing file is never overwritten
        #[clap(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", database_id = %config.database_id, "Starting synchronisation");
            let client = NotionClient::new_from_env().context("constructing Notion client")?;

            let report = synchronise(&config, &client, &MarkdownRenderer::new())
                .await
                .map_err(|e| {
                    tracing::error!(command = "sync", error = %e, "Synchronisation failed");
                    anyhow::Error::new(e)
                })?;

            let skipped: usize = report.databases.iter().map(|d| d.skipped_pages.len()).sum();
            tracing::info!(
                command = "sync",
                records = report.records.len(),
                skipped,
                failed_databases = report.failed_databases.len(),
                published = report.published,
                "Synchronisation complete"
            );
            println!(
                "Synchronised {} pages from {} databases ({} skipped, {} published). Manifest: {}",
                report.records.len(),
                report.databases.len(),
                skipped,
                report.published,
                report.manifest_path.display()
            );
            for failed in &report.failed_databases {
                eprintln!("warning: database {} failed: {}", failed.database_id, failed.reason);
            }
            Ok(())
        }
        Commands::Init { path } => {
            write_default_config(&path)?;
            println!("Wrote default config to {}", path.display());
            Ok(())
        }
    }
}
