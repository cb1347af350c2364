//! Error types for the traversal engine.
//!
//! Errors fall into three buckets:
//! - [`SiteError`]: fatal, aborts the whole run. Each variant names the phase that failed.
//! - [`PageError`]: recoverable, aborts only the page being processed.
//! - best-effort failures (user lookup, status mutation, CI output) never become errors;
//!   they are logged and counted in the [`crate::synchronise::SynchroniseReport`].

use std::path::PathBuf;
use thiserror::Error;

use crate::contract::ApiError;

/// Fatal errors surfaced to the caller of [`crate::synchronise::synchronise`].
#[derive(Debug, Error)]
pub enum SiteError {
    #[error("couldn't create content folder {path}: {source}")]
    ContentDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("querying root database {database_id} failed: {source}")]
    RootQuery {
        database_id: String,
        #[source]
        source: ApiError,
    },

    #[error("malformed access path for page '{title}': {source}")]
    AccessPath {
        title: String,
        #[source]
        source: PathError,
    },

    #[error("serializing manifest failed: {0}")]
    ManifestSerialize(#[from] serde_json::Error),

    #[error("writing manifest {path} failed: {source}")]
    ManifestWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort a single page and let traversal continue.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("page has no usable title or slug for its file name: {0}")]
    Path(#[from] PathError),

    #[error("error creating directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error creating file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("rendering failed: {0}")]
    Render(#[from] RenderError),
}

/// Errors from the path sanitizer.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path: neither slug nor title is set")]
    Empty,

    #[error("invalid URL escape {escape:?} in {input:?}")]
    InvalidEscape { input: String, escape: String },

    #[error("invalid control character in URL path {input:?}")]
    ControlCharacter { input: String },

    #[error("URL path {input:?} does not decode to valid UTF-8")]
    InvalidUtf8 { input: String },
}

/// Errors from a [`crate::contract::Renderer`].
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("io error while rendering: {0}")]
    Io(#[from] std::io::Error),

    #[error("front matter serialization failed: {0}")]
    FrontMatter(#[from] serde_yaml::Error),

    #[error("{0}")]
    Other(String),
}
