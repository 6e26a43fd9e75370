//! Asset location against ordered search roots.
//!
//! A reference is tried against each root in order; the first existing file
//! wins. Missing assets are not fatal: the caller reports the error and
//! leaves the reference alone.

use percent_encoding::percent_decode_str;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A directory a reference may be resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRoot {
    /// Short name shown next to each tried path (e.g. "root", "dist").
    pub label: &'static str,
    pub dir: PathBuf,
}

impl SearchRoot {
    pub fn new(label: &'static str, dir: impl Into<PathBuf>) -> Self {
        Self {
            label,
            dir: dir.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum LocateError {
    #[error("empty asset reference")]
    Empty,

    #[error("`{reference}` not found (tried {})", TriedPaths(.tried))]
    NotFound {
        reference: String,
        /// Candidate paths, labelled with their search root.
        tried: Vec<(&'static str, PathBuf)>,
    },
}

struct TriedPaths<'a>(&'a [(&'static str, PathBuf)]);

impl fmt::Display for TriedPaths<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (label, path)) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{label}: {}", path.display())?;
        }
        Ok(())
    }
}

/// Resolves references to existing files.
#[derive(Debug, Clone)]
pub struct AssetLocator {
    roots: Vec<SearchRoot>,
}

impl AssetLocator {
    pub fn new(roots: Vec<SearchRoot>) -> Self {
        Self { roots }
    }

    /// Return the first existing file for `reference`.
    pub fn locate(&self, reference: &str) -> Result<PathBuf, LocateError> {
        let relative = normalize_reference(reference).ok_or(LocateError::Empty)?;

        let mut tried = Vec::with_capacity(self.roots.len());
        for root in &self.roots {
            let candidate = root.dir.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
            tried.push((root.label, candidate));
        }

        Err(LocateError::NotFound {
            reference: reference.to_string(),
            tried,
        })
    }
}

/// Turn a raw attribute value into a root-relative file path.
///
/// Strips query string and fragment, decodes percent-escapes and drops a
/// leading `/` so that root-relative URLs resolve inside the search root.
/// Returns `None` when nothing remains.
pub fn normalize_reference(raw: &str) -> Option<PathBuf> {
    let path = raw.trim().split(['?', '#']).next().unwrap_or_default();
    let decoded = percent_decode_str(path)
        .decode_utf8()
        .map(std::borrow::Cow::into_owned)
        .unwrap_or_else(|_| path.to_string());

    let relative = decoded.trim_start_matches('/');
    if relative.is_empty() {
        return None;
    }
    Some(Path::new(relative).to_path_buf())
}

// ============================================================================
// tests
// ============================================================================
