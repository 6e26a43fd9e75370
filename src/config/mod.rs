//! Build configuration.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── options    # BundleOptions (caller-facing, nocd.toml [bundle])
//! ├── error      # ConfigError, ConfigDiagnostics
//! ├── util       # config file discovery
//! └── mod.rs     # BuildConfig + BuildConfigBuilder (this file)
//! ```
//!
//! Resolution is layered: defaults → config file → caller overrides →
//! derived fields. [`BuildConfigBuilder::build`] validates once and yields
//! an immutable [`BuildConfig`] that the pipeline only ever reads.

mod error;
mod options;
mod util;

pub use error::{ConfigDiagnostic, ConfigDiagnostics, ConfigError};
pub use options::{BundleOptions, DEFAULT_OUTPUT_NAME};
pub use util::{CONFIG_FILE_NAME, find_config_file};

use crate::error::BundleError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Name of the distribution directory, relative to the entry's directory.
pub const DIST_DIR_NAME: &str = "dist";

/// Name of the bundler's asset directory inside the output directory.
pub const ASSETS_DIR_NAME: &str = "assets";

// ============================================================================
// Sections
// ============================================================================

/// External bundler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViteSection {
    pub enabled: bool,
    pub minify_js: bool,
}

/// Critical CSS extraction settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CriticalSection {
    pub enabled: bool,
    /// Remove the non-critical rules after inlining the critical ones.
    pub strip: bool,
    pub width: u32,
    pub height: u32,
}

/// Options record handed to the HTML minifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifyOptions {
    pub remove_comments: bool,
    pub remove_redundant_attributes: bool,
    pub remove_script_type_attributes: bool,
    pub remove_style_link_type_attributes: bool,
    pub remove_attribute_quotes: bool,
    pub use_short_doctype: bool,
    pub collapse_whitespace: bool,
    pub collapse_inline_tag_whitespace: bool,
    pub remove_empty_attributes: bool,
    pub minify_css: bool,
    pub minify_js: bool,
    pub minify_urls: bool,
    pub sort_attributes: bool,
    pub sort_class_name: bool,
}

impl MinifyOptions {
    /// Derive the minifier record from caller options.
    pub fn from_options(options: &BundleOptions) -> Self {
        Self {
            remove_comments: options.remove_comments,
            remove_redundant_attributes: options.remove_redundant_attributes,
            remove_script_type_attributes: true,
            remove_style_link_type_attributes: true,
            remove_attribute_quotes: options.remove_redundant_attributes,
            use_short_doctype: true,
            collapse_whitespace: options.collapse_whitespace,
            collapse_inline_tag_whitespace: options.collapse_whitespace,
            remove_empty_attributes: options.remove_redundant_attributes,
            minify_css: options.minify_css,
            minify_js: options.minify_js,
            minify_urls: true,
            sort_attributes: true,
            sort_class_name: true,
        }
    }
}

impl Default for MinifyOptions {
    fn default() -> Self {
        Self::from_options(&BundleOptions::default())
    }
}

/// HTML minification settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinifySection {
    pub enabled: bool,
    pub options: MinifyOptions,
}

/// Which asset categories the residual inliner embeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InlineFlags {
    pub images: bool,
    pub js: bool,
    pub css: bool,
}

impl Default for InlineFlags {
    fn default() -> Self {
        Self {
            images: true,
            js: true,
            css: true,
        }
    }
}

// ============================================================================
// BuildConfig
// ============================================================================

/// Fully resolved configuration for one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildConfig {
    /// Absolute path of the entry HTML file.
    pub entry_path: PathBuf,
    /// File name of the entry (e.g. `index.html`).
    pub entry_file: String,
    /// Directory containing the entry; base for local references.
    pub root_dir: PathBuf,
    /// Distribution directory (`<root_dir>/dist`).
    pub out_dir: PathBuf,
    /// File name of the final artifact inside `out_dir`.
    pub out_name: String,
    pub vite: ViteSection,
    pub critical: CriticalSection,
    pub minify: MinifySection,
    pub inline: InlineFlags,
    /// Caller keys the pipeline does not interpret.
    pub extra: toml::Table,
}

impl BuildConfig {
    /// Path of the final artifact.
    pub fn dist_path(&self) -> PathBuf {
        self.out_dir.join(&self.out_name)
    }

    /// Path where the bundler leaves its artifact.
    pub fn bundler_output(&self) -> PathBuf {
        self.out_dir.join(DEFAULT_OUTPUT_NAME)
    }

    /// Bundler's directory for assets that were not inlined.
    pub fn assets_dir(&self) -> PathBuf {
        self.out_dir.join(ASSETS_DIR_NAME)
    }

    /// Whether the bundler artifact has to be renamed.
    pub fn renames_output(&self) -> bool {
        self.out_name != DEFAULT_OUTPUT_NAME
    }

    /// Whether the residual inlining stage has any work to do.
    ///
    /// Excluding images still needs the pass for the background path fix.
    pub fn needs_residual_pass(&self) -> bool {
        self.inline.js || self.inline.css || !self.inline.images
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Layered builder for [`BuildConfig`].
///
/// # Example
/// ```ignore
/// let config = BuildConfigBuilder::new("site/index.html")
///     .options(BundleOptions::from_path(&file)?)
///     .override_with(|o| o.inline_images = false)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct BuildConfigBuilder {
    entry: PathBuf,
    options: BundleOptions,
}

impl BuildConfigBuilder {
    /// Start from defaults for the given entry file.
    pub fn new(entry: impl AsRef<Path>) -> Self {
        Self {
            entry: entry.as_ref().to_path_buf(),
            options: BundleOptions::default(),
        }
    }

    /// Replace the option layer (e.g. with values loaded from a file).
    pub fn options(mut self, options: BundleOptions) -> Self {
        self.options = options;
        self
    }

    /// Apply caller overrides on top of the current layer.
    pub fn override_with(mut self, apply: impl FnOnce(&mut BundleOptions)) -> Self {
        apply(&mut self.options);
        self
    }

    /// Resolve paths, validate, and derive the final configuration.
    ///
    /// Fails with [`BundleError::EntryNotFound`] when the entry is missing,
    /// before anything touches the filesystem.
    pub fn build(self) -> Result<BuildConfig> {
        let entry_path = std::path::absolute(&self.entry)
            .with_context(|| format!("failed to resolve `{}`", self.entry.display()))?;
        if !entry_path.is_file() {
            return Err(BundleError::EntryNotFound(entry_path).into());
        }

        validate(&self.options)?;

        let root_dir = entry_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let entry_file = entry_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let out_dir = root_dir.join(DIST_DIR_NAME);

        let options = self.options;
        Ok(BuildConfig {
            entry_file,
            out_dir,
            out_name: options.output_file_name.clone(),
            vite: ViteSection {
                enabled: options.use_vite_build,
                minify_js: options.minify_js,
            },
            critical: CriticalSection {
                enabled: options.use_critical_css && options.prune_css,
                strip: options.prune_css,
                width: options.critical_width,
                height: options.critical_height,
            },
            minify: MinifySection {
                enabled: options.minify_html,
                options: MinifyOptions::from_options(&options),
            },
            inline: InlineFlags {
                images: options.inline_images,
                js: options.inline_js,
                css: options.inline_css,
            },
            root_dir,
            entry_path,
            extra: options.extra,
        })
    }
}

/// Validate caller options, collecting every problem at once.
fn validate(options: &BundleOptions) -> Result<(), ConfigError> {
    let mut diag = ConfigDiagnostics::new();

    if options.critical_width == 0 {
        diag.error("critical_width", "must be greater than 0");
    }
    if options.critical_height == 0 {
        diag.error("critical_height", "must be greater than 0");
    }

    let name = options.output_file_name.as_str();
    if name.is_empty() {
        diag.error("output_file_name", "must not be empty");
    } else if name.contains(['/', '\\']) || name == "." || name == ".." {
        diag.error_with_hint(
            "output_file_name",
            format!("`{name}` is not a bare file name"),
            "the artifact is always written inside the dist directory",
        );
    } else if !(name.ends_with(".html") || name.ends_with(".htm")) {
        diag.error_with_hint(
            "output_file_name",
            format!("`{name}` has no .html extension"),
            format!("use `{name}.html`"),
        );
    }

    diag.into_result().map_err(ConfigError::Diagnostics)
}

// ============================================================================
// tests
// ============================================================================
