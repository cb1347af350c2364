//! Page processor: turns one page and its block tree into a [`PageOutcome`].
//!
//! Order of operations for every page:
//! 1. classify (once, from properties);
//! 2. derive the output location;
//! 3. look for child databases; if any, queue them and stop, the page is a pure container;
//! 4. folders get a directory, settings pages are handed back untouched;
//! 5. content pages are rendered through a temporary file and persisted atomically.

use serde_json::{Map, Value};
use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use tracing::{debug, info};

use crate::block::{child_databases, Block};
use crate::config::SiteConfig;
use crate::contract::{RenderContext, Renderer};
use crate::error::PageError;
use crate::files::{ensure_dir, locate, write_atomically, FileContext};
use crate::manifest::FrontMatter;
use crate::model::{Page, User};
use crate::props::{PageProps, PageRole};

/// A nested database discovered on a page, processed once the owning database is drained.
#[derive(Debug, Clone, PartialEq)]
pub struct ChildDatabase {
    /// Folder the nested database's pages are written below.
    pub owner_files: FileContext,
    /// Properties of the page that contained the database block.
    pub owner_props: PageProps,
    pub database_id: String,
}

/// FIFO of deferred child databases. Entries pushed while draining are processed after
/// everything already queued, which makes the traversal breadth-first.
#[derive(Debug, Default)]
pub struct WorkQueue {
    entries: VecDeque<ChildDatabase>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: ChildDatabase) {
        self.entries.push_back(entry);
    }

    pub fn pop(&mut self) -> Option<ChildDatabase> {
        self.entries.pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChildDatabase> {
        self.entries.iter()
    }
}

/// Properties of a settings page, kept for site-wide configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SettingsRecord {
    pub page_id: String,
    pub title: String,
    pub properties: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    /// Content page written to disk.
    Document(FrontMatter),
    /// Folder page; the directory (relative to the content dir) now exists.
    Folder { dir: PathBuf },
    /// Settings page; nothing was written.
    Settings(SettingsRecord),
    /// The page holds child databases, which were queued. Its own content is not rendered.
    Container { queued: usize },
}

impl PageOutcome {
    pub fn front_matter(&self) -> Option<&FrontMatter> {
        match self {
            PageOutcome::Document(fm) => Some(fm),
            _ => None,
        }
    }

    pub fn into_front_matter(self) -> Option<FrontMatter> {
        match self {
            PageOutcome::Document(fm) => Some(fm),
            _ => None,
        }
    }
}

pub struct PageProcessor<'a, R: ?Sized> {
    config: &'a SiteConfig,
    renderer: &'a R,
}

impl<'a, R> PageProcessor<'a, R>
where
    R: Renderer + ?Sized,
{
    pub fn new(config: &'a SiteConfig, renderer: &'a R) -> Self {
        Self { config, renderer }
    }

    pub fn process(
        &self,
        page: &Page,
        blocks: &[Block],
        users: &HashMap<String, User>,
        files: &FileContext,
        queue: &mut WorkQueue,
    ) -> Result<PageOutcome, PageError> {
        let props = PageProps::from_page(page, &self.config.properties);
        debug!(page_id = %page.id, title = %props.title, role = ?props.role, "[PAGE] Classified page");

        let location = match props.role {
            PageRole::Settings => None,
            PageRole::Folder | PageRole::Content => Some(locate(files, &props)?),
        };

        let nested = child_databases(blocks);
        if !nested.is_empty() {
            let owner_folder = location
                .as_ref()
                .map(|loc| loc.page_dir.clone())
                .unwrap_or_else(|| files.folder.clone());
            for block in &nested {
                info!(
                    page_id = %page.id,
                    database_id = %block.id,
                    folder = %owner_folder.display(),
                    "[PAGE] Found child database, deferring"
                );
                queue.push(ChildDatabase {
                    owner_files: files.at(owner_folder.clone()),
                    owner_props: props.clone(),
                    database_id: block.id.clone(),
                });
            }
            return Ok(PageOutcome::Container {
                queued: nested.len(),
            });
        }

        let Some(loc) = location else {
            info!(page_id = %page.id, title = %props.title, "[PAGE] Settings page, no content generated");
            return Ok(PageOutcome::Settings(SettingsRecord {
                page_id: page.id.clone(),
                title: props.title.clone(),
                properties: page.properties.clone(),
            }));
        };

        if props.is_folder() {
            ensure_dir(&files.absolute(&loc.page_dir))?;
            info!(page_id = %page.id, dir = %loc.page_dir.display(), "[PAGE] Folder page, directory ensured");
            return Ok(PageOutcome::Folder { dir: loc.page_dir });
        }

        let ctx = RenderContext {
            page,
            props: &props,
            blocks,
            users,
            config: self.config,
            front_matter: self.front_matter(page, &props, users),
        };
        let target = files.absolute(&loc.file);
        let fm = write_atomically(&target, |sink| self.renderer.generate_to(ctx, sink))?;
        info!(page_id = %page.id, file = %loc.file.display(), "[PAGE] Content page written");
        Ok(PageOutcome::Document(fm))
    }

    /// Record built from page metadata plus the configured template fields.
    fn front_matter(
        &self,
        page: &Page,
        props: &PageProps,
        users: &HashMap<String, User>,
    ) -> FrontMatter {
        let template = &self.config.template;
        let slug = props.slug.clone();
        let extra = template
            .extra
            .iter()
            .map(|(key, value)| (key.clone(), substitute(value, &props.title, slug.as_deref())))
            .collect();

        FrontMatter {
            title: props.title.clone(),
            slug,
            access_path: String::new(),
            date: props.date.clone().or_else(|| page.created_time.clone()),
            lastmod: page.last_edited_time.clone(),
            author: users
                .get(&page.created_by.id)
                .and_then(User::display_name)
                .map(str::to_string),
            tags: props.tags.clone(),
            categories: props.categories.clone(),
            description: props.description.clone(),
            position: Some(props.position.clone()).filter(|p| !p.is_empty()),
            template: template.name.clone(),
            extra,
        }
    }
}

/// Replaces `{{title}}` and `{{slug}}` in string values, recursing into arrays and objects.
fn substitute(value: &Value, title: &str, slug: Option<&str>) -> Value {
    match value {
        Value::String(s) => Value::String(
            s.replace("{{title}}", title)
                .replace("{{slug}}", slug.unwrap_or_default()),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| substitute(v, title, slug)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute(v, title, slug)))
                .collect(),
        ),
        other => other.clone(),
    }
}
