//! High-level pipeline: walks a database tree and materializes it as a content tree.
//!
//! This module provides the top-level orchestration for "synchronising" a site from its
//! root database. It:
//!   - Queries the root database and runs every page through the [`PageProcessor`]
//!   - Defers child databases discovered on pages to a FIFO [`WorkQueue`], drained only
//!     after the current database is complete (including status mutations)
//!   - Aggregates all front-matter records into the manifest (`content/blogs.json`)
//!   - Returns a report of what was written, skipped and published.
//!
//! # Error Handling
//! Only the content directory, the root database query and the manifest are fatal
//! ([`SiteError`]). A failing page or a failing deferred database is logged with enough
//! context to re-run it, recorded in the report, and skipped.
//!
//! # Navigation
//! - Main entrypoint: [`synchronise`]
//! - Supporting types: [`SynchroniseReport`], [`DatabaseReport`], [`SkippedPage`].

use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, error, info, warn};

use crate::ci::publish_github_output;
use crate::config::SiteConfig;
use crate::contract::{ApiError, ContentApi, Renderer};
use crate::error::SiteError;
use crate::files::FileContext;
use crate::manifest::{write_manifest, FrontMatter};
use crate::page::{PageOutcome, PageProcessor, SettingsRecord, WorkQueue};
use crate::users::UserCache;

#[derive(Debug)]
pub struct SynchroniseReport {
    /// Finalized records in manifest order.
    pub records: Vec<FrontMatter>,
    pub manifest_path: PathBuf,
    /// One entry per processed database, in processing order.
    pub databases: Vec<DatabaseReport>,
    pub failed_databases: Vec<FailedDatabase>,
    pub settings: Vec<SettingsRecord>,
    /// Pages whose status was changed remotely.
    pub published: usize,
}

#[derive(Debug, Default)]
pub struct DatabaseReport {
    pub database_id: String,
    pub pages: usize,
    pub records: usize,
    pub folders: usize,
    pub containers: usize,
    pub skipped_pages: Vec<SkippedPage>,
    pub user_lookups: usize,
    pub user_lookup_failures: usize,
    pub status_changed: usize,
}

/// A page left out of the run, with what is needed to find it again.
#[derive(Debug)]
pub struct SkippedPage {
    pub page_id: String,
    pub url: String,
    /// Position within the database's result list, starting at 0.
    pub index: usize,
    pub reason: String,
}

/// A deferred database whose query failed.
#[derive(Debug)]
pub struct FailedDatabase {
    pub database_id: String,
    pub reason: String,
}

struct DatabaseOutput {
    records: Vec<FrontMatter>,
    settings: Vec<SettingsRecord>,
    report: DatabaseReport,
}

/// Owns the state of one run: the deferred queue and the set of databases already seen.
struct Synchroniser<'a, A: ?Sized, R: ?Sized> {
    config: &'a SiteConfig,
    api: &'a A,
    processor: PageProcessor<'a, R>,
    queue: WorkQueue,
    visited: HashSet<String>,
}

/// Runs a full synchronisation from `config.database_id`.
pub async fn synchronise<A, R>(
    config: &SiteConfig,
    api: &A,
    renderer: &R,
) -> Result<SynchroniseReport, SiteError>
where
    A: ContentApi + ?Sized,
    R: Renderer + ?Sized,
{
    let content_dir = config.content_dir();
    info!(path = %content_dir.display(), "[SYNC] Init save path");
    std::fs::create_dir_all(&content_dir).map_err(|source| SiteError::ContentDir {
        path: content_dir.clone(),
        source,
    })?;

    let mut run = Synchroniser {
        config,
        api,
        processor: PageProcessor::new(config, renderer),
        queue: WorkQueue::new(),
        visited: HashSet::new(),
    };

    let root = FileContext::root(&content_dir);
    run.visited.insert(config.database_id.clone());
    let root_output = run
        .process_database(&config.database_id, &root)
        .await
        .map_err(|source| {
            error!(database_id = %config.database_id, error = %source, "[SYNC][ERROR] Querying root database failed");
            SiteError::RootQuery {
                database_id: config.database_id.clone(),
                source,
            }
        })?;

    let mut records = Vec::new();
    let mut settings = Vec::new();
    let mut databases = Vec::new();
    let mut failed_databases = Vec::new();
    let mut absorb = |output: DatabaseOutput| {
        records.extend(output.records);
        settings.extend(output.settings);
        databases.push(output.report);
    };
    absorb(root_output);

    while let Some(entry) = run.queue.pop() {
        if !run.visited.insert(entry.database_id.clone()) {
            warn!(database_id = %entry.database_id, "[SYNC] Child database already processed, skipping");
            continue;
        }
        info!(
            database_id = %entry.database_id,
            owner = %entry.owner_props.title,
            remaining = run.queue.len(),
            "[SYNC] Processing deferred child database"
        );
        match run
            .process_database(&entry.database_id, &entry.owner_files)
            .await
        {
            Ok(output) => absorb(output),
            Err(e) => {
                error!(database_id = %entry.database_id, error = %e, "[SYNC][ERROR] Process child database failed, continuing");
                failed_databases.push(FailedDatabase {
                    database_id: entry.database_id,
                    reason: e.to_string(),
                });
            }
        }
    }

    let manifest_path = config.manifest_path();
    write_manifest(&mut records, &manifest_path)?;

    let published = databases.iter().map(|d| d.status_changed).sum();
    publish_github_output(published);

    info!(
        records = records.len(),
        databases = databases.len(),
        failed_databases = failed_databases.len(),
        published,
        "[SYNC] Synchronisation complete"
    );
    Ok(SynchroniseReport {
        records,
        manifest_path,
        databases,
        failed_databases,
        settings,
        published,
    })
}

impl<'a, A, R> Synchroniser<'a, A, R>
where
    A: ContentApi + ?Sized,
    R: Renderer + ?Sized,
{
    /// Processes every page of one database. Only the database query itself can fail;
    /// per-page problems are recorded in the report.
    async fn process_database(
        &mut self,
        database_id: &str,
        files: &FileContext,
    ) -> Result<DatabaseOutput, ApiError> {
        let pages = self.api.query_database(&self.config.notion, database_id).await?;
        info!(database_id, pages = pages.len(), "[SYNC] Querying database: Completed");

        let mut users = UserCache::new();
        let mut output = DatabaseOutput {
            records: Vec::new(),
            settings: Vec::new(),
            report: DatabaseReport {
                database_id: database_id.to_string(),
                pages: pages.len(),
                ..DatabaseReport::default()
            },
        };

        for (index, page) in pages.iter().enumerate() {
            info!(
                database_id,
                page_id = %page.id,
                url = %page.url,
                "[SYNC] -- Article [{}/{}] --",
                index + 1,
                pages.len()
            );
            let skip = |reason: String| SkippedPage {
                page_id: page.id.clone(),
                url: page.url.clone(),
                index,
                reason,
            };

            let blocks = match self.api.query_block_children(&page.id).await {
                Ok(blocks) => blocks,
                Err(e) => {
                    error!(page_id = %page.id, url = %page.url, index, error = %e, "[SYNC][ERROR] Getting blocks tree failed, skipping page");
                    output.report.skipped_pages.push(skip(format!("getting blocks tree: {e}")));
                    continue;
                }
            };
            debug!(page_id = %page.id, blocks = blocks.len(), "[SYNC] Getting blocks tree: Completed");

            users.resolve_page_authors(self.api, page).await;

            match self
                .processor
                .process(page, &blocks, users.users(), files, &mut self.queue)
            {
                Ok(PageOutcome::Document(fm)) => {
                    output.report.records += 1;
                    output.records.push(fm);
                }
                Ok(PageOutcome::Folder { .. }) => output.report.folders += 1,
                Ok(PageOutcome::Container { .. }) => output.report.containers += 1,
                Ok(PageOutcome::Settings(record)) => output.settings.push(record),
                Err(e) => {
                    error!(page_id = %page.id, url = %page.url, index, error = %e, "[SYNC][ERROR] Generating page failed, skipping page");
                    output.report.skipped_pages.push(skip(format!("generating page: {e}")));
                    continue;
                }
            }
            info!(page_id = %page.id, "[SYNC] Generating page: Completed");

            if self.api.change_status(page, &self.config.notion).await {
                output.report.status_changed += 1;
                debug!(page_id = %page.id, "[SYNC] Page status changed");
            }
        }

        output.report.user_lookups = users.lookups();
        output.report.user_lookup_failures = users.failures();
        if users.failures() > 0 {
            warn!(
                database_id,
                failures = users.failures(),
                "[SYNC] Some user lookups failed; author fields may be missing"
            );
        }
        Ok(output)
    }
}
