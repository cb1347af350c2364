//! CI integration: report the number of published pages to GitHub Actions.

use std::fs::OpenOptions;
use std::io::Write;
use tracing::{debug, warn};

/// Output name written to `$GITHUB_OUTPUT`.
pub const PUBLISHED_OUTPUT: &str = "articles_published";

/// Appends `articles_published=<count>` to the file named by `GITHUB_OUTPUT` when running
/// under GitHub Actions. Best effort: returns whether the line was written.
pub fn publish_github_output(published: usize) -> bool {
    if std::env::var("GITHUB_ACTIONS").as_deref() != Ok("true") {
        return false;
    }
    let Ok(path) = std::env::var("GITHUB_OUTPUT") else {
        warn!("[CI] GITHUB_ACTIONS is set but GITHUB_OUTPUT is not, skipping output");
        return false;
    };

    let written = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut f| writeln!(f, "{PUBLISHED_OUTPUT}={published}"));
    match written {
        Ok(()) => {
            debug!(path = %path, published, "[CI] Wrote GitHub output");
            true
        }
        Err(e) => {
            warn!(path = %path, error = %e, "[CI] Failed to write GitHub output");
            false
        }
    }
}
