//! Background image path fix.
//!
//! When images stay external the bundler moves them to `<out>/assets/`,
//! but `background`/`background-image` URLs in inlined CSS still point at
//! the source layout. Each such URL is redirected to `./assets/<path>` if
//! that file exists.
//!
//! Only the first `url(...)` of a declaration is considered; `image-set()`
//! and multi-layer backgrounds keep their other URLs.

use crate::config::ASSETS_DIR_NAME;
use crate::report::Reporter;
use regex::{Captures, Regex};
use std::path::{Component, Path};
use std::sync::LazyLock;

static BACKGROUND_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(background(?:-image)?\s*:[^;}]*?url\(\s*)(['"]?)(\./)?([^'")\s:]+\.(?:jpe?g|png|gif|webp|svg))(['"]?)\s*\)"#,
    )
    .unwrap()
});

/// Rewrite background image URLs in `text` to `assets_dir`, the bundler's
/// `assets/` directory next to the artifact.
///
/// Returns the rewritten text and the number of URLs changed.
pub fn fix_background_paths(
    text: &str,
    assets_dir: &Path,
    reporter: &dyn Reporter,
) -> (String, usize) {
    let mut fixed = 0;

    let result = BACKGROUND_URL.replace_all(text, |caps: &Captures<'_>| {
        let whole = &caps[0];
        let path = &caps[4];
        if !is_rewritable(path) || !assets_dir.join(path).is_file() {
            return whole.to_string();
        }

        fixed += 1;
        reporter.success("css", &format!("background path: {path} -> ./assets/{path}"));
        let quote_open = caps.get(2).map_or("", |m| m.as_str());
        let quote_close = caps.get(5).map_or("", |m| m.as_str());
        format!(
            "{}{quote_open}./{ASSETS_DIR_NAME}/{path}{quote_close})",
            &caps[1]
        )
    });

    (result.into_owned(), fixed)
}

/// Plain relative paths only: not root-relative, not already under
/// `assets/`, no parent traversal.
fn is_rewritable(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with(&format!("{ASSETS_DIR_NAME}/")) {
        return false;
    }
    Path::new(path)
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use std::fs;
    use tempfile::TempDir;

    fn out_dir_with(assets: &[&str]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for asset in assets {
            let path = dir.path().join("assets").join(asset);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, b"img").unwrap();
        }
        dir
    }

    fn fix(text: &str, out: &TempDir) -> (String, usize) {
        fix_background_paths(text, &out.path().join("assets"), &MemoryReporter::new())
    }

    #[test]
    fn test_rewrites_existing_asset() {
        let out = out_dir_with(&["hero.png"]);
        let (text, fixed) = fix(".a{background-image:url(./hero.png)}", &out);
        assert_eq!(text, ".a{background-image:url(./assets/hero.png)}");
        assert_eq!(fixed, 1);
    }

    #[test]
    fn test_keeps_quotes_and_rest_of_declaration() {
        let out = out_dir_with(&["bg/sky.JPG"]);
        let (text, fixed) = fix(
            r#"div { background: #fff url( "bg/sky.JPG" ) no-repeat center; }"#,
            &out,
        );
        assert_eq!(
            text,
            r#"div { background: #fff url( "./assets/bg/sky.JPG") no-repeat center; }"#
        );
        assert_eq!(fixed, 1);
    }

    #[test]
    fn test_missing_asset_left_alone() {
        let out = out_dir_with(&[]);
        let css = ".a{background-image:url(./x.png)}";
        assert_eq!(fix(css, &out), (css.to_string(), 0));
    }

    #[test]
    fn test_skips_absolute_external_and_data_urls() {
        let out = out_dir_with(&["x.png"]);
        for css in [
            ".a{background:url(/x.png)}",
            ".a{background:url(https://cdn.example.com/x.png)}",
            ".a{background:url(//cdn.example.com/x.png)}",
            ".a{background:url(data:image/png;base64,AAAA)}",
            ".a{background:url(./assets/x.png)}",
            ".a{background:url(../x.png)}",
        ] {
            assert_eq!(fix(css, &out), (css.to_string(), 0), "{css}");
        }
    }

    #[test]
    fn test_other_properties_untouched() {
        let out = out_dir_with(&["x.png"]);
        let css = ".a{list-style-image:url(x.png);border-image:url(x.png)}";
        assert_eq!(fix(css, &out), (css.to_string(), 0));
    }

    #[test]
    fn test_only_first_url_of_declaration() {
        let out = out_dir_with(&["a.png", "b.png"]);
        let (text, fixed) = fix(".a{background-image:url(a.png),url(b.png)}", &out);
        assert_eq!(text, ".a{background-image:url(./assets/a.png),url(b.png)}");
        assert_eq!(fixed, 1);
    }

    #[test]
    fn test_counts_every_declaration() {
        let out = out_dir_with(&["a.svg", "b.webp"]);
        let reporter = MemoryReporter::new();
        let (_, fixed) = fix_background_paths(
            "<style>.a{background:url(a.svg)} .b{BACKGROUND-IMAGE: url('b.webp')}</style>",
            &out.path().join("assets"),
            &reporter,
        );
        assert_eq!(fixed, 2);
        assert_eq!(reporter.events().len(), 2);
    }
}
