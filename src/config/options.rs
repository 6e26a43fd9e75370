//! Caller-facing bundle options.
//!
//! This is the flat option set a caller (library user, CLI, or the `[bundle]`
//! table of `nocd.toml`) provides. Every field has a default, so an empty
//! table or `BundleOptions::default()` yields a fully runnable pipeline.
//!
//! # Example
//!
//! ```toml
//! [bundle]
//! inline_images = false       # Keep images external, fix background paths
//! prune_css = true            # Strip non-critical CSS after extraction
//! critical_width = 1300       # Viewport used for critical CSS
//! critical_height = 900
//! output_file_name = "app.html"
//! ```
//!
//! Keys that are not listed here are kept in [`BundleOptions::extra`] and
//! passed through to the resolved configuration unchanged.

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, str::FromStr};

/// Default name of the artifact produced by the bundler.
pub const DEFAULT_OUTPUT_NAME: &str = "index.html";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleOptions {
    /// Embed `<img>` sources as data URLs.
    pub inline_images: bool,
    /// Embed local `<script src>` files.
    pub inline_js: bool,
    /// Embed local stylesheets.
    pub inline_css: bool,
    /// Remove CSS that is not needed above the fold.
    pub prune_css: bool,
    /// Minify the final HTML.
    pub minify_html: bool,
    /// Minify JavaScript (bundler output and inline scripts).
    pub minify_js: bool,
    /// Minify inline CSS.
    pub minify_css: bool,
    pub remove_comments: bool,
    pub remove_redundant_attributes: bool,
    pub collapse_whitespace: bool,
    /// Run the external bundler. When false the entry file is copied as-is.
    pub use_vite_build: bool,
    /// Run critical CSS extraction (only effective with `prune_css`).
    pub use_critical_css: bool,
    pub critical_width: u32,
    pub critical_height: u32,
    /// File name of the final artifact inside the output directory.
    pub output_file_name: String,

    /// Unrecognized keys, passed through untouched.
    #[serde(flatten)]
    pub extra: toml::Table,
}

impl Default for BundleOptions {
    fn default() -> Self {
        Self {
            inline_images: true,
            inline_js: true,
            inline_css: true,
            prune_css: true,
            minify_html: true,
            minify_js: true,
            minify_css: true,
            remove_comments: true,
            remove_redundant_attributes: true,
            collapse_whitespace: true,
            use_vite_build: true,
            use_critical_css: true,
            critical_width: 1300,
            critical_height: 900,
            output_file_name: DEFAULT_OUTPUT_NAME.into(),
            extra: toml::Table::new(),
        }
    }
}

/// Shape of `nocd.toml`.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    bundle: BundleOptions,
}

/// Parse options from the content of a config file.
impl FromStr for BundleOptions {
    type Err = ConfigError;

    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let file: ConfigFile = toml::from_str(content)?;
        Ok(file.bundle)
    }
}

impl BundleOptions {
    /// Load options from a config file path.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        content.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = BundleOptions::default();
        assert!(options.inline_images);
        assert!(options.inline_js);
        assert!(options.inline_css);
        assert!(options.prune_css);
        assert!(options.minify_html);
        assert!(options.use_vite_build);
        assert!(options.use_critical_css);
        assert_eq!(options.critical_width, 1300);
        assert_eq!(options.critical_height, 900);
        assert_eq!(options.output_file_name, "index.html");
        assert!(options.extra.is_empty());
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let options = BundleOptions::from_str("").unwrap();
        assert_eq!(options, BundleOptions::default());
    }

    #[test]
    fn test_partial_table_overrides() {
        let options = BundleOptions::from_str(
            "[bundle]\ninline_images = false\ncritical_width = 800\noutput_file_name = \"app.html\"",
        )
        .unwrap();
        assert!(!options.inline_images);
        assert!(options.inline_js);
        assert_eq!(options.critical_width, 800);
        assert_eq!(options.output_file_name, "app.html");
    }

    #[test]
    fn test_unknown_keys_pass_through() {
        let options =
            BundleOptions::from_str("[bundle]\ntheme = \"dark\"\nretries = 3").unwrap();
        assert_eq!(
            options.extra.get("theme").and_then(|v| v.as_str()),
            Some("dark")
        );
        assert_eq!(
            options.extra.get("retries").and_then(|v| v.as_integer()),
            Some(3)
        );
    }

    #[test]
    fn test_invalid_toml() {
        let result = BundleOptions::from_str("[bundle\ninline_js = true");
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_wrong_type_is_an_error() {
        let result = BundleOptions::from_str("[bundle]\ninline_js = \"yes\"");
        assert!(result.is_err());
    }
}
