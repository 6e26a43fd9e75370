//! nocd-bundle: package an HTML entry and its local assets into one
//! self-contained HTML file.
//!
//! The work is split into a small pipeline:
//!
//! - an external bundler (Vite with `vite-plugin-singlefile`) or a plain copy
//! - a residual inline pass over whatever the bundler left external
//! - a background-path fix for CSS that references external images
//! - optional critical CSS extraction
//! - HTML minification
//!
//! ```no_run
//! use nocd_bundle::{BundleOptions, bundle};
//!
//! let html = bundle("site/index.html", BundleOptions::default())?;
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod logger;

pub mod asset;
pub mod collab;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use config::{BuildConfig, BuildConfigBuilder, BundleOptions, ConfigError};
pub use error::BundleError;
pub use pipeline::{Pipeline, bundle};
pub use report::{MemoryReporter, Reporter, TerminalReporter};
