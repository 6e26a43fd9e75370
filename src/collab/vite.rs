//! Vite bundler.
//!
//! Renders a throwaway `vite.config` module next to the entry, runs
//! `npx vite build` against it and normalizes the emitted HTML name to
//! `index.html`. Requires `vite` and `vite-plugin-singlefile` to be
//! installed in the project.

use super::{Bundler, BundlerRequest, NPX};
use crate::config::DEFAULT_OUTPUT_NAME;
use crate::utils::exec::{Cmd, FilterRule};
use crate::{debug, log};
use anyhow::{Context, Result};
use serde_json::json;
use std::fs;
use std::io::Write;
use std::path::PathBuf;

/// npm chatter that is not worth surfacing.
static NPM_FILTER: FilterRule = FilterRule::new(&["npm WARN", "npm notice", "(!) "]);

#[derive(Debug, Default, Clone, Copy)]
pub struct ViteBundler;

impl Bundler for ViteBundler {
    fn bundle(&self, request: &BundlerRequest) -> Result<()> {
        let source = render_config(request)?;

        let mut config_file = tempfile::Builder::new()
            .prefix(".nocd-vite-")
            .suffix(".config.mjs")
            .tempfile_in(&request.root)
            .with_context(|| {
                format!("failed to create vite config in `{}`", request.root.display())
            })?;
        config_file.write_all(source.as_bytes())?;
        config_file.flush()?;
        debug!("vite"; "config written to {}", config_file.path().display());

        Cmd::from_slice(&[NPX, "vite", "build"])
            .arg("--config")
            .arg(config_file.path())
            .cwd(&request.root)
            .envs([("NODE_ENV", "production")])
            .filter(&NPM_FILTER)
            .run()?;

        normalize_output(request)
    }
}

/// Render the Vite config module for a request.
fn render_config(request: &BundlerRequest) -> Result<String> {
    let minify = if request.minify_js {
        json!("esbuild")
    } else {
        json!(false)
    };
    let build = json!({
        "outDir": request.out_dir.to_string_lossy(),
        "emptyOutDir": true,
        "minify": minify,
        "assetsInlineLimit": request.assets_inline_limit(),
        "cssCodeSplit": false,
        "modulePreload": { "polyfill": false },
        "rollupOptions": {
            "input": request.entry.to_string_lossy(),
            "output": { "inlineDynamicImports": true },
        },
    });
    let config = json!({
        "root": request.root.to_string_lossy(),
        "base": "./",
        "logLevel": "info",
        "build": build,
    });
    let config = serde_json::to_string_pretty(&config)?;

    Ok(format!(
        "import {{ viteSingleFile }} from 'vite-plugin-singlefile';\n\n\
         const config = {config};\n\n\
         config.plugins = [\n  \
         viteSingleFile({{ removeViteModuleLoader: true, useRecommendedBuildConfig: false }}),\n\
         ];\n\n\
         export default config;\n"
    ))
}

/// Vite names the emitted HTML after the entry; rename it to `index.html`.
fn normalize_output(request: &BundlerRequest) -> Result<()> {
    let Some(emitted) = emitted_html(request) else {
        return Ok(());
    };
    let expected = request.out_dir.join(DEFAULT_OUTPUT_NAME);
    if emitted == expected || !emitted.is_file() {
        return Ok(());
    }

    log!("vite"; "normalizing {} -> {}", emitted.display(), DEFAULT_OUTPUT_NAME);
    fs::rename(&emitted, &expected).with_context(|| {
        format!(
            "failed to rename `{}` to `{}`",
            emitted.display(),
            expected.display()
        )
    })
}

/// Where Vite puts the HTML for the request's entry.
fn emitted_html(request: &BundlerRequest) -> Option<PathBuf> {
    let relative = request.entry.strip_prefix(&request.root).ok()?;
    Some(request.out_dir.join(relative))
}
