//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use nocd_bundle::config::BundleOptions;
use std::path::PathBuf;

/// Package an HTML entry and its assets into a single HTML file
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Entry HTML file
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub entry: PathBuf,

    /// Config file path (default: nocd.toml, searched upward from the current directory)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Write the final HTML to stdout
    #[arg(short, long)]
    pub print: bool,

    #[command(flatten)]
    pub bundle: BundleArgs,
}

/// Per-option overrides of the `[bundle]` config table
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BundleArgs {
    /// Embed images as data URLs
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub inline_images: Option<bool>,

    /// Embed local scripts
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub inline_js: Option<bool>,

    /// Embed local stylesheets
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub inline_css: Option<bool>,

    /// Strip CSS not needed above the fold
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub prune_css: Option<bool>,

    /// Minify the final HTML
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_html: Option<bool>,

    /// Minify JavaScript
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_js: Option<bool>,

    /// Minify inline CSS
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify_css: Option<bool>,

    /// Remove HTML comments
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub remove_comments: Option<bool>,

    /// Remove attributes that repeat the HTML default
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub remove_redundant_attributes: Option<bool>,

    /// Collapse whitespace between elements
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub collapse_whitespace: Option<bool>,

    /// Run the Vite bundler (otherwise the entry is copied as-is)
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub vite: Option<bool>,

    /// Run critical CSS extraction
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub critical: Option<bool>,

    /// Viewport width for critical CSS
    #[arg(long)]
    pub critical_width: Option<u32>,

    /// Viewport height for critical CSS
    #[arg(long)]
    pub critical_height: Option<u32>,

    /// File name of the final artifact inside `dist/`
    #[arg(short, long)]
    pub output_file_name: Option<String>,
}

impl BundleArgs {
    /// Apply CLI overrides on top of file/default options.
    pub fn apply(&self, options: &mut BundleOptions) {
        update_option(&mut options.inline_images, self.inline_images.as_ref());
        update_option(&mut options.inline_js, self.inline_js.as_ref());
        update_option(&mut options.inline_css, self.inline_css.as_ref());
        update_option(&mut options.prune_css, self.prune_css.as_ref());
        update_option(&mut options.minify_html, self.minify_html.as_ref());
        update_option(&mut options.minify_js, self.minify_js.as_ref());
        update_option(&mut options.minify_css, self.minify_css.as_ref());
        update_option(&mut options.remove_comments, self.remove_comments.as_ref());
        update_option(
            &mut options.remove_redundant_attributes,
            self.remove_redundant_attributes.as_ref(),
        );
        update_option(&mut options.collapse_whitespace, self.collapse_whitespace.as_ref());
        update_option(&mut options.use_vite_build, self.vite.as_ref());
        update_option(&mut options.use_critical_css, self.critical.as_ref());
        update_option(&mut options.critical_width, self.critical_width.as_ref());
        update_option(&mut options.critical_height, self.critical_height.as_ref());
        update_option(&mut options.output_file_name, self.output_file_name.as_ref());
    }
}

fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
    if let Some(option) = cli_option {
        *config_option = option.clone();
    }
}
