//! Bundle pipeline.
//!
//! Turns an HTML entry into one self-contained HTML file. Stages run in a
//! fixed order, each gated by [`BuildConfig`]:
//!
//! ```text
//! bundle (vite) or copy ─► rename ─► inline + css path fix ─► critical css ─► minify ─► finalize
//! ```
//!
//! Every stage after the first rewrites the same artifact,
//! `<out_dir>/<out_name>`, in full. Any stage error aborts the run.

pub mod css_path;
pub mod inline;

pub use css_path::fix_background_paths;
pub use inline::{InlineContext, InlineOutcome, inline_assets};

use crate::collab::{
    Bundler, BundlerRequest, CriticalCli, CriticalCss, CriticalRequest, HtmlMinifier,
    NativeMinifier, ViteBundler,
};
use crate::config::{BuildConfig, BuildConfigBuilder, BundleOptions};
use crate::debug;
use crate::error::BundleError;
use crate::report::{Reporter, TerminalReporter};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Bundle `entry` with the default collaborators and terminal reporting.
///
/// Returns the text of the final artifact.
pub fn bundle(entry: impl AsRef<Path>, options: BundleOptions) -> Result<String> {
    Pipeline::new().bundle(entry, options)
}

/// Orchestrates the stages over injectable collaborators.
///
/// # Example
/// ```ignore
/// let reporter = MemoryReporter::new();
/// let html = Pipeline::new()
///     .with_reporter(&reporter)
///     .bundle("site/index.html", BundleOptions::default())?;
/// ```
pub struct Pipeline<'a> {
    bundler: &'a dyn Bundler,
    critical: &'a dyn CriticalCss,
    minifier: &'a dyn HtmlMinifier,
    reporter: &'a dyn Reporter,
}

impl Default for Pipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Pipeline<'a> {
    pub fn new() -> Self {
        Self {
            bundler: &ViteBundler,
            critical: &CriticalCli,
            minifier: &NativeMinifier,
            reporter: &TerminalReporter,
        }
    }

    pub fn with_bundler(mut self, bundler: &'a dyn Bundler) -> Self {
        self.bundler = bundler;
        self
    }

    pub fn with_critical(mut self, critical: &'a dyn CriticalCss) -> Self {
        self.critical = critical;
        self
    }

    pub fn with_minifier(mut self, minifier: &'a dyn HtmlMinifier) -> Self {
        self.minifier = minifier;
        self
    }

    pub fn with_reporter(mut self, reporter: &'a dyn Reporter) -> Self {
        self.reporter = reporter;
        self
    }

    /// Resolve the configuration for `entry` and run every stage.
    pub fn bundle(&self, entry: impl AsRef<Path>, options: BundleOptions) -> Result<String> {
        let result = BuildConfigBuilder::new(entry)
            .options(options)
            .build()
            .and_then(|config| self.stages(&config));
        self.report_failure(result)
    }

    fn report_failure(&self, result: Result<String>) -> Result<String> {
        if let Err(err) = &result {
            self.reporter.error("bundle", &format!("build failed: {err:#}"));
        }
        result
    }

    fn stages(&self, config: &BuildConfig) -> Result<String> {
        debug!("config"; "{:?}", config);
        if !config.extra.is_empty() {
            let keys: Vec<_> = config.extra.keys().map(String::as_str).collect();
            debug!("config"; "unused options: {}", keys.join(", "));
        }
        self.reporter.info(
            "bundle",
            &format!("building {}", config.entry_path.display()),
        );

        let artifact = self.produce_artifact(config)?;

        if config.needs_residual_pass() {
            self.post_process(config, &artifact)?;
        } else {
            self.reporter.skip("inline", "nothing left to inline");
        }

        if config.critical.enabled {
            self.extract_critical(config, &artifact)?;
        } else {
            self.reporter.skip("critical", "critical CSS disabled");
        }

        if config.minify.enabled {
            self.minify(config, &artifact)?;
        } else {
            self.reporter.skip("minify", "HTML minification disabled");
        }

        self.finalize(&artifact)
    }

    // ------------------------------------------------------------------------
    // Stages
    // ------------------------------------------------------------------------

    /// Bundle (or copy) the entry into `out_dir` under its final name.
    fn produce_artifact(&self, config: &BuildConfig) -> Result<PathBuf> {
        let artifact = config.dist_path();

        if !config.vite.enabled {
            self.reporter.skip("vite", "bundling disabled, copying entry");
            fs::create_dir_all(&config.out_dir)
                .map_err(|err| BundleError::Io(config.out_dir.clone(), err))?;
            fs::copy(&config.entry_path, &artifact)
                .map_err(|err| BundleError::Io(artifact.clone(), err))?;
            return Ok(artifact);
        }

        self.reporter.info("vite", "bundling");
        self.bundler
            .bundle(&BundlerRequest::from_config(config))
            .map_err(|source| BundleError::Bundler {
                entry: config.entry_path.clone(),
                source,
            })?;

        let produced = config.bundler_output();
        if !produced.is_file() {
            return Err(BundleError::MissingBundleOutput(produced).into());
        }

        if config.renames_output() {
            self.reporter
                .info("bundle", &format!("renaming output to {}", config.out_name));
            fs::rename(&produced, &artifact).map_err(|source| BundleError::Rename {
                from: produced.clone(),
                to: artifact.clone(),
                source,
            })?;
        }
        Ok(artifact)
    }

    /// Inline residual assets and fix background paths in one rewrite.
    fn post_process(&self, config: &BuildConfig, artifact: &Path) -> Result<()> {
        self.reporter.info("inline", "inlining remaining local assets");
        let html = read_artifact(artifact)?;

        let ctx = InlineContext {
            root_dir: config.root_dir.clone(),
            dist_dir: config.out_dir.clone(),
            flags: config.inline,
        };
        let mut html = inline_assets(&html, &ctx, self.reporter)?.html;

        if !config.inline.images {
            self.reporter
                .info("css", "fixing background image paths for external images");
            let (fixed_html, fixed) =
                fix_background_paths(&html, &config.assets_dir(), self.reporter);
            debug!("css"; "{} background paths fixed", fixed);
            html = fixed_html;
        }

        write_artifact(artifact, &html)
    }

    fn extract_critical(&self, config: &BuildConfig, artifact: &Path) -> Result<()> {
        self.reporter.info("critical", "generating critical CSS");
        self.critical
            .generate(&CriticalRequest::from_config(config))
            .map_err(|err| BundleError::Critical(artifact.to_path_buf(), err))?;
        self.reporter.success("critical", "critical CSS inlined");
        Ok(())
    }

    fn minify(&self, config: &BuildConfig, artifact: &Path) -> Result<()> {
        self.reporter.info("minify", "minifying HTML");
        let html = read_artifact(artifact)?;
        let minified = self
            .minifier
            .minify(&html, &config.minify.options)
            .map_err(|err| BundleError::Minify(artifact.to_path_buf(), err))?;
        write_artifact(artifact, &minified)?;

        self.reporter.success(
            "minify",
            &format!(
                "HTML minified: {} → {} ({:.1}% reduction)",
                format_kb(html.len() as u64),
                format_kb(minified.len() as u64),
                reduction_percent(html.len(), minified.len())
            ),
        );
        Ok(())
    }

    fn finalize(&self, artifact: &Path) -> Result<String> {
        let html = read_artifact(artifact)?;
        self.reporter.success("bundle", "build complete");
        self.reporter
            .info("bundle", &format!("Output: {}", artifact.display()));
        self.reporter
            .info("bundle", &format!("Size: {}", format_kb(html.len() as u64)));
        Ok(html)
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn read_artifact(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|err| BundleError::Io(path.to_path_buf(), err).into())
}

fn write_artifact(path: &Path, html: &str) -> Result<()> {
    fs::write(path, html).map_err(|err| BundleError::Io(path.to_path_buf(), err).into())
}

fn format_kb(bytes: u64) -> String {
    format!("{:.2} KB", bytes as f64 / 1024.0)
}

fn reduction_percent(before: usize, after: usize) -> f64 {
    if before == 0 {
        return 0.0;
    }
    (before as f64 - after as f64) / before as f64 * 100.0
}

// ============================================================================
// tests
// ============================================================================
