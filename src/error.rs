//! Fatal pipeline errors.
//!
//! These abort the whole invocation. Per-asset problems during inlining are
//! not errors; they are reported as warnings and the reference is left as-is.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("File not found: {}", .0.display())]
    EntryNotFound(PathBuf),

    #[error("bundler failed for `{}`", .entry.display())]
    Bundler {
        entry: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    #[error("bundler did not produce `{}`", .0.display())]
    MissingBundleOutput(PathBuf),

    #[error("failed to rename `{}` to `{}`", .from.display(), .to.display())]
    Rename {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("critical CSS extraction failed for `{}`", .0.display())]
    Critical(PathBuf, #[source] anyhow::Error),

    #[error("HTML minification failed for `{}`", .0.display())]
    Minify(PathBuf, #[source] anyhow::Error),

    #[error("IO error on `{}`", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
}
