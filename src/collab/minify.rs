//! Native HTML minifier.
//!
//! Two passes:
//!
//! 1. lol_html rewrite: comments, redundant/empty/type attributes, attribute
//!    and class ordering, inline `<script>` (oxc) and `<style>`
//!    (lightningcss) bodies.
//! 2. minify-html when whitespace collapsing is on: whitespace, doctype and
//!    attribute quoting.
//!
//! Both passes are fixed points on their own output, so minifying twice
//! yields the same bytes.

use super::HtmlMinifier;
use crate::asset::minify::{minify_css, minify_js};
use crate::config::MinifyOptions;
use anyhow::{Result, anyhow};
use lol_html::html_content::ContentType;
use lol_html::{HtmlRewriter, Settings, doc_comments, element, text};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Default, Clone, Copy)]
pub struct NativeMinifier;

impl HtmlMinifier for NativeMinifier {
    fn minify(&self, html: &str, options: &MinifyOptions) -> Result<String> {
        let rewritten = rewrite(html, options)?;
        if !options.collapse_whitespace {
            return Ok(rewritten);
        }
        let minified = minify_html::minify(rewritten.as_bytes(), &structural_cfg(options));
        Ok(String::from_utf8(minified)?)
    }
}

// ============================================================================
// Pass 1: lol_html
// ============================================================================

/// How the body of the current `<script>` is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptBody {
    Classic,
    Module,
    Json,
    Keep,
}

/// Attributes whose value equals the HTML default.
const REDUNDANT: &[(&str, &str, &str)] = &[
    ("form", "method", "get"),
    ("input", "type", "text"),
    ("area", "shape", "rect"),
    ("script", "language", "javascript"),
];

/// Attributes that can be dropped when empty.
const EMPTY_DROPPABLE: &[&str] = &["class", "id", "style", "title", "lang", "dir"];

const JS_TYPES: &[&str] = &[
    "text/javascript",
    "application/javascript",
    "application/ecmascript",
    "text/ecmascript",
];

fn rewrite(html: &str, options: &MinifyOptions) -> Result<String> {
    let options = *options;
    let script_body = Rc::new(RefCell::new(ScriptBody::Keep));
    let script_buf = Rc::new(RefCell::new(String::new()));
    let style_buf = Rc::new(RefCell::new(String::new()));

    let mut element_handlers = vec![
        element!("*", move |el| {
            rewrite_attributes(el, &options)?;
            Ok(())
        }),
        element!("script", {
            let script_body = Rc::clone(&script_body);
            move |el| {
                *script_body.borrow_mut() = script_body_kind(
                    el.has_attribute("src"),
                    el.get_attribute("type").as_deref(),
                );
                Ok(())
            }
        }),
    ];

    if options.minify_js {
        let script_body = Rc::clone(&script_body);
        let buf = Rc::clone(&script_buf);
        element_handlers.push(text!("script", move |chunk| {
            let body = *script_body.borrow();
            if body == ScriptBody::Keep {
                return Ok(());
            }
            buf.borrow_mut().push_str(chunk.as_str());
            chunk.remove();
            if chunk.last_in_text_node() {
                let source = std::mem::take(&mut *buf.borrow_mut());
                let minified = minify_script(&source, body).unwrap_or(source);
                chunk.replace(&minified, ContentType::Html);
            }
            Ok(())
        }));
    }

    if options.minify_css {
        let buf = Rc::clone(&style_buf);
        element_handlers.push(text!("style", move |chunk| {
            buf.borrow_mut().push_str(chunk.as_str());
            chunk.remove();
            if chunk.last_in_text_node() {
                let source = std::mem::take(&mut *buf.borrow_mut());
                let minified = minify_css(&source)
                    .filter(|css| !contains_end_tag(css, "</style"))
                    .unwrap_or(source);
                chunk.replace(&minified, ContentType::Html);
            }
            Ok(())
        }));
    }

    let mut document_handlers = Vec::new();
    if options.remove_comments {
        document_handlers.push(doc_comments!(|c| {
            c.remove();
            Ok(())
        }));
    }

    let mut output = Vec::with_capacity(html.len());
    let mut rewriter = HtmlRewriter::new(
        Settings {
            element_content_handlers: element_handlers,
            document_content_handlers: document_handlers,
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

fn script_body_kind(has_src: bool, script_type: Option<&str>) -> ScriptBody {
    if has_src {
        return ScriptBody::Keep;
    }
    let Some(ty) = script_type.map(|t| t.trim().to_ascii_lowercase()) else {
        return ScriptBody::Classic;
    };
    match ty.as_str() {
        "" => ScriptBody::Classic,
        "module" => ScriptBody::Module,
        "application/json" | "application/ld+json" | "importmap" => ScriptBody::Json,
        t if JS_TYPES.contains(&t) => ScriptBody::Classic,
        _ => ScriptBody::Keep,
    }
}

fn minify_script(source: &str, body: ScriptBody) -> Option<String> {
    if source.trim().is_empty() {
        return Some(String::new());
    }
    let minified = match body {
        ScriptBody::Classic => minify_js(source, false)?,
        ScriptBody::Module => minify_js(source, true)?,
        ScriptBody::Json => {
            let value: serde_json::Value = serde_json::from_str(source).ok()?;
            serde_json::to_string(&value).ok()?
        }
        ScriptBody::Keep => return None,
    };
    (!contains_end_tag(&minified, "</script")).then_some(minified)
}

fn contains_end_tag(code: &str, tag: &str) -> bool {
    code.to_ascii_lowercase().contains(tag)
}

/// Attribute-level rewrites for one element.
fn rewrite_attributes(
    el: &mut lol_html::html_content::Element<'_, '_>,
    options: &MinifyOptions,
) -> Result<(), lol_html::errors::AttributeNameError> {
    let tag = el.tag_name();
    let mut attrs: Vec<(String, String)> = el
        .attributes()
        .iter()
        .map(|a| (a.name(), a.value()))
        .collect();
    let original = attrs.clone();

    attrs.retain(|(name, value)| !is_droppable(&tag, name, value, options, &original));

    for (name, value) in &mut attrs {
        if options.minify_urls && matches!(name.as_str(), "href" | "src" | "action") {
            *value = value.trim().to_string();
        }
        if options.sort_class_name && name == "class" {
            *value = sort_classes(value);
        }
    }

    if options.sort_attributes {
        attrs.sort_by(|a, b| a.0.cmp(&b.0));
    }

    if attrs == original {
        return Ok(());
    }
    for (name, _) in &original {
        el.remove_attribute(name);
    }
    for (name, value) in &attrs {
        el.set_attribute(name, value)?;
    }
    Ok(())
}

fn is_droppable(
    tag: &str,
    name: &str,
    value: &str,
    options: &MinifyOptions,
    attrs: &[(String, String)],
) -> bool {
    let normalized = value.trim().to_ascii_lowercase();

    if options.remove_redundant_attributes {
        if REDUNDANT
            .iter()
            .any(|(t, n, v)| *t == tag && *n == name && *v == normalized)
        {
            return true;
        }
        // charset only applies to external scripts
        if tag == "script" && name == "charset" && !attrs.iter().any(|(n, _)| n == "src") {
            return true;
        }
    }

    if options.remove_script_type_attributes
        && tag == "script"
        && name == "type"
        && JS_TYPES.contains(&normalized.as_str())
    {
        return true;
    }

    if options.remove_style_link_type_attributes
        && matches!(tag, "style" | "link")
        && name == "type"
        && normalized == "text/css"
    {
        return true;
    }

    options.remove_empty_attributes
        && normalized.is_empty()
        && (EMPTY_DROPPABLE.contains(&name) || name.starts_with("on"))
}

/// Class tokens sorted and deduplicated, single-space separated.
fn sort_classes(value: &str) -> String {
    let mut classes: Vec<&str> = value.split_ascii_whitespace().collect();
    classes.sort_unstable();
    classes.dedup();
    classes.join(" ")
}

// ============================================================================
// Pass 2: minify-html
// ============================================================================

fn structural_cfg(options: &MinifyOptions) -> minify_html::Cfg {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.keep_comments = !options.remove_comments;
    // inline code was handled by the first pass
    cfg.minify_css = false;
    cfg.minify_js = false;
    cfg.remove_bangs = options.remove_comments;
    cfg.remove_processing_instructions = true;
    cfg.do_not_minify_doctype = !options.use_short_doctype;
    cfg.ensure_spec_compliant_unquoted_attribute_values = !options.remove_attribute_quotes;
    cfg
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minify(html: &str, options: &MinifyOptions) -> String {
        NativeMinifier.minify(html, options).unwrap()
    }

    const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
  <head>
    <!-- page head -->
    <style type="text/css">
      body {
        color: #ff0000;
      }
    </style>
    <script type="text/javascript">
      var greeting = "hello";
      console.log(greeting);
    </script>
  </head>
  <body>
    <form method="GET" id="" class="b a  b">
      <input type="text" name="q" value="x">
    </form>
  </body>
</html>
"#;

    #[test]
    fn test_minify_shrinks_page() {
        let out = minify(PAGE, &MinifyOptions::default());
        assert!(out.len() < PAGE.len());
        assert!(!out.contains("page head"));
        assert!(!out.contains("text/javascript"));
        assert!(!out.contains("text/css"));
        assert!(!out.contains("method"));
        assert!(!out.contains("id="));
        assert!(out.contains("console.log"));
        assert!(out.contains("greeting"));
    }

    #[test]
    fn test_minify_is_idempotent() {
        let options = MinifyOptions::default();
        let once = minify(PAGE, &options);
        let twice = minify(&once, &options);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_keeps_comments_when_asked() {
        let options = MinifyOptions {
            remove_comments: false,
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let out = minify("<div><!-- keep --></div>", &options);
        assert!(out.contains("<!-- keep -->"));
    }

    #[test]
    fn test_attributes_sorted() {
        let options = MinifyOptions {
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let out = minify(r#"<div title="t" data-x="1" class="z a"></div>"#, &options);
        assert_eq!(out, r#"<div class="a z" data-x="1" title="t"></div>"#);
    }

    #[test]
    fn test_non_js_scripts_untouched() {
        let options = MinifyOptions {
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let template = "<script type=\"text/template\">  <b> {{ name }} </b>  </script>";
        assert_eq!(minify(template, &options), template);
    }

    #[test]
    fn test_json_scripts_compacted() {
        let options = MinifyOptions {
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let out = minify(
            "<script type=\"application/ld+json\">{ \"a\": 1,\n \"b\": [1, 2] }</script>",
            &options,
        );
        assert_eq!(
            out,
            "<script type=\"application/ld+json\">{\"a\":1,\"b\":[1,2]}</script>"
        );
    }

    #[test]
    fn test_invalid_script_kept() {
        let options = MinifyOptions {
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let html = "<script>function (</script>";
        assert_eq!(minify(html, &options), html);
    }

    #[test]
    fn test_external_script_untouched() {
        let options = MinifyOptions {
            collapse_whitespace: false,
            ..MinifyOptions::default()
        };
        let html = r#"<script src="app.js"></script>"#;
        assert_eq!(minify(html, &options), html);
    }

    #[test]
    fn test_sort_classes() {
        assert_eq!(sort_classes("  b a\tb  c "), "a b c");
        assert_eq!(sort_classes(""), "");
    }

    #[test]
    fn test_script_body_kind() {
        assert_eq!(script_body_kind(false, None), ScriptBody::Classic);
        assert_eq!(script_body_kind(false, Some("module")), ScriptBody::Module);
        assert_eq!(script_body_kind(true, None), ScriptBody::Keep);
        assert_eq!(script_body_kind(false, Some("text/x-template")), ScriptBody::Keep);
        assert_eq!(script_body_kind(false, Some(" Text/JavaScript ")), ScriptBody::Classic);
    }
}
