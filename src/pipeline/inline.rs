//! Residual asset inlining.
//!
//! Embeds local scripts, stylesheets and images that survived bundling.
//! Works in three steps so the document is only rewritten once:
//!
//! ```text
//! scan     read-only pass, every referencing element per category
//! resolve  script → stylesheet → image, in document order
//! apply    one rewrite pass, replacements matched by per-category ordinal
//! ```
//!
//! A reference that cannot be resolved is reported and left untouched.

use crate::asset::{AssetKind, AssetLocator, AssetReference, RefClass, SearchRoot, mime};
use crate::config::InlineFlags;
use crate::report::Reporter;
use anyhow::{Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use lol_html::html_content::{ContentType, Element};
use lol_html::{HtmlRewriter, Settings, element};
use regex::Regex;
use std::borrow::Cow;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::LazyLock;

const MODULE: &str = "inline";

/// Directories and category flags for one inlining pass.
#[derive(Debug, Clone)]
pub struct InlineContext {
    pub root_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub flags: InlineFlags,
}

impl InlineContext {
    /// Search roots for a category, in priority order.
    fn search_roots(&self, kind: AssetKind) -> Vec<SearchRoot> {
        let root = SearchRoot::new("root", &self.root_dir);
        match kind {
            AssetKind::Stylesheet => vec![root, SearchRoot::new("dist", &self.dist_dir)],
            AssetKind::Script | AssetKind::Image => vec![root],
        }
    }

    fn enabled(&self, kind: AssetKind) -> bool {
        match kind {
            AssetKind::Script => self.flags.js,
            AssetKind::Stylesheet => self.flags.css,
            AssetKind::Image => self.flags.images,
        }
    }
}

/// Result of an inlining pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOutcome {
    pub html: String,
    /// Number of references replaced.
    pub inlined: usize,
    /// One message per reference that could not be inlined.
    pub warnings: Vec<String>,
}

/// Content to put in place of one referencing element.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Replacement {
    /// Script text; the element keeps all attributes but `src`.
    Script(String),
    /// Complete `<style>` element replacing the `<link>`.
    Style(String),
    /// Data URL for `src`.
    Image(String),
}

/// Precomputed replacements, indexed by document order within a category.
#[derive(Debug, Default)]
struct Plan {
    scripts: Vec<Option<Replacement>>,
    stylesheets: Vec<Option<Replacement>>,
    images: Vec<Option<Replacement>>,
}

impl Plan {
    fn slot_mut(&mut self, kind: AssetKind) -> &mut Vec<Option<Replacement>> {
        match kind {
            AssetKind::Script => &mut self.scripts,
            AssetKind::Stylesheet => &mut self.stylesheets,
            AssetKind::Image => &mut self.images,
        }
    }

    fn take(&mut self, kind: AssetKind) -> Vec<Option<Replacement>> {
        std::mem::take(self.slot_mut(kind))
    }
}

/// Inline local assets referenced by `html`.
pub fn inline_assets(
    html: &str,
    ctx: &InlineContext,
    reporter: &dyn Reporter,
) -> Result<InlineOutcome> {
    let kinds: Vec<AssetKind> = AssetKind::ALL
        .into_iter()
        .filter(|kind| ctx.enabled(*kind))
        .collect();
    for kind in AssetKind::ALL.into_iter().filter(|k| !ctx.enabled(*k)) {
        reporter.skip(MODULE, &format!("{kind} inlining disabled"));
    }
    if kinds.is_empty() {
        return Ok(InlineOutcome {
            html: html.to_string(),
            inlined: 0,
            warnings: Vec::new(),
        });
    }

    let references = scan(html, &kinds)?;

    let mut plan = Plan::default();
    let mut warnings = Vec::new();
    let mut inlined = 0;
    for kind in &kinds {
        let locator = AssetLocator::new(ctx.search_roots(*kind));
        let slot = plan.slot_mut(*kind);
        for reference in references.iter().filter(|r| r.kind == *kind) {
            let replacement = match resolve(reference, &locator) {
                Ok(Some(replacement)) => {
                    reporter.success(MODULE, &format!("{kind}: {}", reference.raw));
                    inlined += 1;
                    Some(replacement)
                }
                Ok(None) => None,
                Err(err) => {
                    let message = format!("could not inline {kind} `{}`: {err}", reference.raw);
                    reporter.warn(MODULE, &message);
                    warnings.push(message);
                    None
                }
            };
            slot.push(replacement);
        }
    }

    let html = if inlined > 0 {
        apply(html, plan)?
    } else {
        html.to_string()
    };

    reporter.info(
        MODULE,
        &format!("inlined {inlined} assets, {} warnings", warnings.len()),
    );
    Ok(InlineOutcome {
        html,
        inlined,
        warnings,
    })
}

// ============================================================================
// Scan
// ============================================================================

/// Every referencing element of the given categories, in document order.
fn scan(html: &str, kinds: &[AssetKind]) -> Result<Vec<AssetReference>> {
    let found = Rc::new(RefCell::new(Vec::new()));

    let handlers = kinds
        .iter()
        .map(|&kind| {
            let found = Rc::clone(&found);
            element!(kind.selector(), move |el| {
                let raw = el.get_attribute(kind.attribute()).unwrap_or_default();
                found.borrow_mut().push(AssetReference::new(kind, raw));
                Ok(())
            })
        })
        .collect();

    run_rewriter(html, handlers)?;
    Ok(found.take())
}

// ============================================================================
// Resolve
// ============================================================================

/// `Ok(None)` for references that are not ours to inline.
fn resolve(reference: &AssetReference, locator: &AssetLocator) -> Result<Option<Replacement>> {
    match reference.class() {
        RefClass::External | RefClass::Embedded => return Ok(None),
        RefClass::Local => {}
    }

    if reference.kind == AssetKind::Image {
        return resolve_image(reference, locator).map(Some);
    }

    let path = locator.locate(&reference.value)?;
    let text = read_text(&path)?;
    Ok(Some(match reference.kind {
        AssetKind::Script => {
            Replacement::Script(escape_end_tag(&text, &SCRIPT_END).into_owned())
        }
        _ => Replacement::Style(text),
    }))
}

fn resolve_image(reference: &AssetReference, locator: &AssetLocator) -> Result<Replacement> {
    let path = locator.locate(&reference.value)?;
    let mime = mime::from_path(&path).ok_or_else(|| {
        anyhow!(
            "unsupported image type `{}`",
            path.extension().unwrap_or_default().to_string_lossy()
        )
    })?;
    let bytes = fs::read(&path).map_err(|err| anyhow!("{}: {err}", path.display()))?;
    Ok(Replacement::Image(data_url(mime, &bytes)))
}

fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|err| anyhow!("{}: {err}", path.display()))
}

/// `data:<mime>;base64,<payload>`
pub fn data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

static SCRIPT_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</(script)").unwrap());
static STYLE_END: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)</(style)").unwrap());

/// Break up closing tags so embedded text cannot end its element early.
fn escape_end_tag<'t>(text: &'t str, end_tag: &Regex) -> Cow<'t, str> {
    end_tag.replace_all(text, r"<\/$1")
}

// ============================================================================
// Apply
// ============================================================================

fn apply(html: &str, mut plan: Plan) -> Result<String> {
    let handlers = AssetKind::ALL
        .into_iter()
        .filter_map(|kind| {
            let replacements = plan.take(kind);
            if replacements.iter().all(Option::is_none) {
                return None;
            }
            let mut next = 0;
            Some(element!(kind.selector(), move |el| {
                let index = next;
                next += 1;
                if let Some(Some(replacement)) = replacements.get(index) {
                    replace(el, replacement)?;
                }
                Ok(())
            }))
        })
        .collect();

    run_rewriter(html, handlers)
}

fn replace(
    el: &mut Element<'_, '_>,
    replacement: &Replacement,
) -> Result<(), lol_html::errors::AttributeNameError> {
    match replacement {
        Replacement::Script(text) => {
            el.remove_attribute("src");
            el.set_inner_content(text, ContentType::Html);
        }
        Replacement::Style(css) => {
            let style = style_element(el, css);
            el.replace(&style, ContentType::Html);
        }
        Replacement::Image(url) => el.set_attribute("src", url)?,
    }
    Ok(())
}

/// `<style>` carrying every attribute of `link` except `href` and `rel`.
fn style_element(link: &Element<'_, '_>, css: &str) -> String {
    let mut out = String::from("<style");
    for attr in link.attributes() {
        let name = attr.name();
        if name == "href" || name == "rel" {
            continue;
        }
        out.push_str(&format!(" {name}=\"{}\"", attr.value().replace('"', "&quot;")));
    }
    out.push('>');
    out.push_str(&escape_end_tag(css, &STYLE_END));
    out.push_str("</style>");
    out
}

// ============================================================================
// Rewriter
// ============================================================================

type Handler<'h> = (
    Cow<'h, lol_html::Selector>,
    lol_html::ElementContentHandlers<'h>,
);

fn run_rewriter(html: &str, handlers: Vec<Handler<'_>>) -> Result<String> {
    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: handlers,
            ..Settings::default()
        },
        |c: &[u8]| output.extend_from_slice(c),
    );
    rewriter
        .write(html.as_bytes())
        .map_err(|e| anyhow!("HtmlRewriter error: {e}"))?;
    rewriter
        .end()
        .map_err(|e| anyhow!("HtmlRewriter end error: {e}"))?;
    Ok(String::from_utf8(output)?)
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemoryReporter;
    use tempfile::TempDir;

    const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 1, 2, 255];

    struct Site {
        dir: TempDir,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir(dir.path().join("dist")).unwrap();
            Self { dir }
        }

        fn write(&self, path: &str, content: impl AsRef<[u8]>) -> &Self {
            let path = self.dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
            self
        }

        fn ctx(&self, flags: InlineFlags) -> InlineContext {
            InlineContext {
                root_dir: self.dir.path().to_path_buf(),
                dist_dir: self.dir.path().join("dist"),
                flags,
            }
        }
    }

    fn run(site: &Site, html: &str, flags: InlineFlags) -> (InlineOutcome, MemoryReporter) {
        let reporter = MemoryReporter::new();
        let outcome = inline_assets(html, &site.ctx(flags), &reporter).unwrap();
        (outcome, reporter)
    }

    #[test]
    fn test_script_inlined_with_exact_text() {
        let site = Site::new();
        let js = "console.log(\"a < b && c\");\n";
        site.write("app.js", js);

        let (outcome, _) = run(
            &site,
            r#"<script src="./app.js" defer type="module"></script>"#,
            InlineFlags::default(),
        );

        assert_eq!(
            outcome.html,
            format!(r#"<script defer type="module">{js}</script>"#)
        );
        assert_eq!(outcome.inlined, 1);
    }

    #[test]
    fn test_stylesheet_becomes_style_element() {
        let site = Site::new();
        site.write("style.css", "body{margin:0}");

        let (outcome, _) = run(
            &site,
            r#"<link rel="stylesheet" href="style.css" media="print" data-x='a"b'>"#,
            InlineFlags::default(),
        );

        assert_eq!(
            outcome.html,
            r#"<style media="print" data-x="a&quot;b">body{margin:0}</style>"#
        );
    }

    #[test]
    fn test_stylesheet_falls_back_to_dist() {
        let site = Site::new();
        site.write("dist/assets/index.css", "p{color:red}");

        let (outcome, reporter) = run(
            &site,
            r#"<link rel="stylesheet" href="/assets/index.css">"#,
            InlineFlags::default(),
        );

        assert_eq!(outcome.html, "<style>p{color:red}</style>");
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_image_becomes_lossless_data_url() {
        let site = Site::new();
        site.write("img/logo.png", PNG);

        let (outcome, _) = run(
            &site,
            r#"<img alt="logo" src="img/logo.png">"#,
            InlineFlags::default(),
        );

        let prefix = "data:image/png;base64,";
        let start = outcome.html.find(prefix).unwrap() + prefix.len();
        let end = start + outcome.html[start..].find('"').unwrap();
        let decoded = STANDARD.decode(&outcome.html[start..end]).unwrap();
        assert_eq!(decoded, PNG);
        assert!(outcome.html.contains(r#"alt="logo""#));
    }

    #[test]
    fn test_external_and_data_references_untouched() {
        let site = Site::new();
        let html = concat!(
            r#"<img src="http://example.com/a.png">"#,
            r#"<img src="https://example.com/b.png">"#,
            r#"<img src="//example.com/c.png">"#,
            r#"<img src="data:image/gif;base64,R0lGOD">"#,
            r#"<script src="https://cdn.example.com/lib.js"></script>"#,
        );

        let (outcome, reporter) = run(&site, html, InlineFlags::default());

        assert_eq!(outcome.html, html);
        assert_eq!(outcome.inlined, 0);
        assert!(reporter.warnings().is_empty());
    }

    #[test]
    fn test_missing_asset_warns_and_keeps_tag() {
        let site = Site::new();
        let html = r#"<script src="./missing.js"></script>"#;

        let (outcome, reporter) = run(&site, html, InlineFlags::default());

        assert_eq!(outcome.html, html);
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("./missing.js"));
        assert_eq!(reporter.warnings(), outcome.warnings);
    }

    #[test]
    fn test_character_references_decoded_before_lookup() {
        let site = Site::new();
        site.write("a&b.png", PNG);
        site.write("x&y.js", "go()");

        let (outcome, reporter) = run(
            &site,
            r#"<img src="a&amp;b.png"><script src="x&amp;y.js"></script>"#,
            InlineFlags::default(),
        );

        assert_eq!(outcome.inlined, 2);
        assert!(outcome.warnings.is_empty());
        assert!(outcome.html.starts_with(r#"<img src="data:image/png;base64,"#));
        assert!(outcome.html.ends_with("<script>go()</script>"));
        assert!(
            reporter
                .messages(crate::report::Level::Success)
                .contains(&"image: a&amp;b.png".to_string())
        );
    }

    #[test]
    fn test_warning_quotes_reference_as_written() {
        let site = Site::new();
        let (outcome, _) = run(
            &site,
            r#"<script src="gone&amp;lost.js"></script>"#,
            InlineFlags::default(),
        );

        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].contains("`gone&amp;lost.js`"));
        assert!(outcome.warnings[0].contains("gone&lost.js"));
    }

    #[test]
    fn test_unsupported_image_type_warns() {
        let site = Site::new();
        site.write("photo.bmp", [0u8; 4]);
        let html = r#"<img src="photo.bmp">"#;

        let (outcome, _) = run(&site, html, InlineFlags::default());

        assert_eq!(outcome.html, html);
        assert!(outcome.warnings[0].contains("unsupported image type"));
    }

    #[test]
    fn test_failures_do_not_shift_later_replacements() {
        let site = Site::new();
        site.write("b.js", "b()");
        let html = r#"<script src="a.js"></script><script src="https://x/y.js"></script><script src="b.js"></script>"#;

        let (outcome, _) = run(&site, html, InlineFlags::default());

        assert_eq!(
            outcome.html,
            r#"<script src="a.js"></script><script src="https://x/y.js"></script><script>b()</script>"#
        );
    }

    #[test]
    fn test_flags_gate_categories() {
        let site = Site::new();
        site.write("app.js", "x()").write("logo.png", PNG);
        let html = r#"<script src="app.js"></script><img src="logo.png">"#;

        let flags = InlineFlags {
            images: false,
            js: true,
            css: true,
        };
        let (outcome, reporter) = run(&site, html, flags);

        assert!(outcome.html.contains("<script>x()</script>"));
        assert!(outcome.html.contains(r#"<img src="logo.png">"#));
        assert!(!reporter.messages(crate::report::Level::Skip).is_empty());
    }

    #[test]
    fn test_categories_resolved_in_order() {
        let site = Site::new();
        site.write("a.css", "a{}").write("b.js", "b()").write("c.png", PNG);
        let html = r#"<img src="c.png"><link rel="stylesheet" href="a.css"><script src="b.js"></script>"#;

        let (_, reporter) = run(&site, html, InlineFlags::default());

        let inlined = reporter.messages(crate::report::Level::Success);
        assert_eq!(inlined, vec!["script: b.js", "stylesheet: a.css", "image: c.png"]);
    }

    #[test]
    fn test_closing_tag_in_script_is_escaped() {
        let site = Site::new();
        site.write("app.js", "s = '</script>';");

        let (outcome, _) = run(
            &site,
            r#"<script src="app.js"></script>"#,
            InlineFlags::default(),
        );
        assert_eq!(outcome.html, r#"<script>s = '<\/script>';</script>"#);
    }
}
