//! External collaborators of the pipeline.
//!
//! The bundler, critical CSS extractor and HTML minifier are traits so the
//! orchestrator can be driven by fakes in tests. Default implementations:
//!
//! - [`ViteBundler`]: `npx vite build` with the single-file plugin
//! - [`CriticalCli`]: `npx critical`
//! - [`NativeMinifier`]: lol_html + oxc + lightningcss + minify-html

mod critical;
mod minify;
mod vite;

pub use critical::CriticalCli;
pub use minify::NativeMinifier;
pub use vite::ViteBundler;

use crate::config::{BuildConfig, MinifyOptions};
use anyhow::Result;
use std::path::PathBuf;

/// Threshold that inlines every asset the bundler emits.
pub const INLINE_ALL_LIMIT: u64 = 100_000_000;

/// Command prefix for Node tooling.
pub(crate) const NPX: &str = if cfg!(windows) { "npx.cmd" } else { "npx" };

// ============================================================================
// Bundler
// ============================================================================

/// Input of one bundler run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundlerRequest {
    /// Project root (directory of the entry).
    pub root: PathBuf,
    /// Absolute path of the entry HTML.
    pub entry: PathBuf,
    /// Directory to (re)create and fill.
    pub out_dir: PathBuf,
    pub minify_js: bool,
    /// Inline every asset instead of emitting `assets/` files.
    pub inline_assets: bool,
}

impl BundlerRequest {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            root: config.root_dir.clone(),
            entry: config.entry_path.clone(),
            out_dir: config.out_dir.clone(),
            minify_js: config.vite.minify_js,
            inline_assets: config.inline.images,
        }
    }

    /// Size in bytes below which the bundler embeds an asset.
    pub fn assets_inline_limit(&self) -> u64 {
        if self.inline_assets {
            INLINE_ALL_LIMIT
        } else {
            0
        }
    }
}

/// Produces `<out_dir>/index.html` from the entry.
pub trait Bundler {
    fn bundle(&self, request: &BundlerRequest) -> Result<()>;
}

// ============================================================================
// Critical CSS
// ============================================================================

/// Input of one critical CSS run. Paths in `source`/`target` are relative
/// to `base_dir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CriticalRequest {
    pub base_dir: PathBuf,
    pub source: String,
    pub target: String,
    /// Inline the critical CSS into the document head.
    pub inline: bool,
    /// Remove the inlined rules from the remaining stylesheets.
    pub extract: bool,
    pub width: u32,
    pub height: u32,
    /// Directories used to resolve assets referenced from CSS.
    pub asset_paths: Vec<PathBuf>,
}

impl CriticalRequest {
    pub fn from_config(config: &BuildConfig) -> Self {
        Self {
            base_dir: config.out_dir.clone(),
            source: config.out_name.clone(),
            target: config.out_name.clone(),
            inline: true,
            extract: config.critical.strip,
            width: config.critical.width,
            height: config.critical.height,
            asset_paths: vec![config.root_dir.clone(), config.out_dir.clone()],
        }
    }
}

/// Rewrites the target document in place with critical CSS inlined.
pub trait CriticalCss {
    fn generate(&self, request: &CriticalRequest) -> Result<()>;
}

// ============================================================================
// HTML minifier
// ============================================================================

pub trait HtmlMinifier {
    fn minify(&self, html: &str, options: &MinifyOptions) -> Result<String>;
}
