//! # contract: interfaces between the traversal engine and its collaborators
//!
//! The engine never talks HTTP and never formats markdown itself. It reaches the remote
//! content API through [`ContentApi`] and hands page rendering to a [`Renderer`].
//!
//! ## Interface & Extensibility
//! - Implement [`ContentApi`] for a real client (see the `notion-site` crate) or use the
//!   generated `MockContentApi` in tests.
//! - Implement [`Renderer`] to change the output format; [`crate::render::MarkdownRenderer`]
//!   is the default.
//! - Collaborator errors are boxed trait objects: the engine only logs or wraps them.
//!
//! ## Mocking & Testing
//! - [`ContentApi`] is annotated for `mockall`, exported when the `test-export-mocks` feature
//!   is on (default) so downstream crates can script whole traversals.

use async_trait::async_trait;
use std::collections::HashMap;
use std::io::Write;

#[allow(unused_imports)]
use mockall::{automock, predicate::*};

use crate::block::Block;
use crate::config::{NotionConfig, SiteConfig};
use crate::error::RenderError;
use crate::manifest::FrontMatter;
use crate::model::{Page, User};
use crate::props::PageProps;

/// Error type for collaborator calls (simple boxed error).
pub type ApiError = Box<dyn std::error::Error + Send + Sync>;

/// Read access to the remote content API, plus the one mutation the engine performs.
///
/// Calls are awaited one at a time; implementors need not handle concurrent use.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ContentApi: Send + Sync {
    /// All pages of a database matching the configured filter, in the order the API returns
    /// them. Pagination is exhausted by the implementor.
    async fn query_database(
        &self,
        config: &NotionConfig,
        database_id: &str,
    ) -> Result<Vec<Page>, ApiError>;

    /// The complete block tree below a page or block, children nested into
    /// [`Block::children`].
    async fn query_block_children(&self, block_id: &str) -> Result<Vec<Block>, ApiError>;

    /// A single user record.
    async fn query_user(&self, user_id: &str) -> Result<User, ApiError>;

    /// Marks a processed page according to `config`. Returns whether a mutation happened.
    /// Best effort: failures are reported as `false`, never as errors.
    async fn change_status(&self, page: &Page, config: &NotionConfig) -> bool;
}

/// Everything a renderer may need for one content page.
pub struct RenderContext<'a> {
    pub page: &'a Page,
    pub props: &'a PageProps,
    pub blocks: &'a [Block],
    pub users: &'a HashMap<String, User>,
    pub config: &'a SiteConfig,
    /// Record pre-populated from page metadata and the configured template.
    pub front_matter: FrontMatter,
}

/// Converts one content page into a document written to `sink`.
///
/// Returns the front-matter record that describes the written document, normally the one
/// passed in through the context, possibly enriched.
pub trait Renderer: Send + Sync {
    fn generate_to(
        &self,
        ctx: RenderContext<'_>,
        sink: &mut dyn Write,
    ) -> Result<FrontMatter, RenderError>;
}
