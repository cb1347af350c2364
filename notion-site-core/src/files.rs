//! Output locations and file materialization.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::{PageError, PathError, RenderError};
use crate::props::PageProps;
use crate::sanitize::sanitize;

/// Extension of generated content files.
pub const CONTENT_EXTENSION: &str = "md";

/// The folder a database's pages are written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// `<home>/content`.
    pub content_dir: PathBuf,
    /// Folder relative to `content_dir`; empty for the root database.
    pub folder: PathBuf,
}

impl FileContext {
    pub fn root(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            folder: PathBuf::new(),
        }
    }

    /// Context for pages that live below `folder` (relative to the content dir).
    pub fn at(&self, folder: PathBuf) -> Self {
        Self {
            content_dir: self.content_dir.clone(),
            folder,
        }
    }

    pub fn absolute(&self, relative: &Path) -> PathBuf {
        self.content_dir.join(relative)
    }
}

/// Where one page lands, relative to the content dir.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLocation {
    /// Directory the page occupies as a folder or container. Nested databases found on the
    /// page are written below it.
    pub page_dir: PathBuf,
    /// Directory holding the page's markdown file.
    pub file_dir: PathBuf,
    /// The markdown file for content pages.
    pub file: PathBuf,
}

/// Derives the location of a page from its position and name. Deterministic: the same
/// context and properties always give the same paths.
pub fn locate(ctx: &FileContext, props: &PageProps) -> Result<PageLocation, PathError> {
    let mut file_dir = ctx.folder.clone();
    // A position with nothing usable in it (`/`, `..`) means "here", like an empty one.
    match sanitize(&props.position, None) {
        Ok(sub) => file_dir.push(sub),
        Err(PathError::Empty) => {}
        Err(e) => return Err(e),
    }
    let name = sanitize(&props.title, props.slug.as_deref())?;
    let file = file_dir.join(format!("{name}.{CONTENT_EXTENSION}"));
    Ok(PageLocation {
        page_dir: file_dir.join(&name),
        file_dir,
        file,
    })
}

pub fn ensure_dir(path: &Path) -> Result<(), PageError> {
    fs::create_dir_all(path).map_err(|source| PageError::CreateDir {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "[FILES] Directory ensured");
    Ok(())
}

/// Writes `path` through a temporary file in the same directory. The target only appears
/// once `write` succeeded; on failure nothing is left behind.
pub fn write_atomically<T, F>(path: &Path, write: F) -> Result<T, PageError>
where
    F: FnOnce(&mut dyn Write) -> Result<T, RenderError>,
{
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    ensure_dir(dir)?;
    let create_err = |source| PageError::CreateFile {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(create_err)?;
    let value = write(&mut tmp)?;
    tmp.flush().map_err(create_err)?;
    tmp.persist(path).map_err(|e| create_err(e.error))?;
    debug!(path = %path.display(), "[FILES] File written");
    Ok(value)
}
