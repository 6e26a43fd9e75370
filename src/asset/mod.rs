//! Asset references and their resolution.
//!
//! - `mime`: image MIME table
//! - `locate`: first-existing-file lookup against ordered search roots
//! - `minify`: JS/CSS minification used by the HTML minifier

pub mod locate;
pub mod mime;
pub mod minify;

pub use locate::{AssetLocator, LocateError, SearchRoot};

use html_escape::decode_html_entities;
use std::fmt;

/// Category of a referencing element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    /// `<script src>`
    Script,
    /// `<link rel="stylesheet" href>`
    Stylesheet,
    /// `<img src>`
    Image,
}

impl AssetKind {
    /// All kinds, in the order they are inlined.
    pub const ALL: [AssetKind; 3] = [Self::Script, Self::Stylesheet, Self::Image];

    /// CSS selector matching referencing elements of this kind.
    pub const fn selector(self) -> &'static str {
        match self {
            Self::Script => "script[src]",
            Self::Stylesheet => "link[rel='stylesheet'][href]",
            Self::Image => "img[src]",
        }
    }

    /// Attribute carrying the reference.
    pub const fn attribute(self) -> &'static str {
        match self {
            Self::Script | Self::Image => "src",
            Self::Stylesheet => "href",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
        })
    }
}

/// Where a reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefClass {
    /// `http://`, `https://` or protocol-relative `//`.
    External,
    /// `data:` URL (images only).
    Embedded,
    /// Anything else: a path on disk.
    Local,
}

/// A referencing element found in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    pub kind: AssetKind,
    /// Attribute value as written in the markup.
    pub raw: String,
    /// Attribute value with character references decoded.
    pub value: String,
}

impl AssetReference {
    pub fn new(kind: AssetKind, raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = decode_html_entities(&raw).into_owned();
        Self { kind, raw, value }
    }

    pub fn class(&self) -> RefClass {
        classify(self.kind, &self.value)
    }
}

/// Classify a raw reference of the given kind.
pub fn classify(kind: AssetKind, raw: &str) -> RefClass {
    let value = raw.trim_start();
    if value.starts_with("//")
        || has_prefix_ignore_case(value, "http://")
        || has_prefix_ignore_case(value, "https://")
    {
        RefClass::External
    } else if kind == AssetKind::Image && has_prefix_ignore_case(value, "data:") {
        RefClass::Embedded
    } else {
        RefClass::Local
    }
}

fn has_prefix_ignore_case(value: &str, prefix: &str) -> bool {
    value
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external() {
        for raw in [
            "http://cdn.example.com/a.js",
            "https://cdn.example.com/a.js",
            "HTTPS://CDN.EXAMPLE.COM/A.JS",
            "//cdn.example.com/a.js",
        ] {
            assert_eq!(classify(AssetKind::Script, raw), RefClass::External, "{raw}");
            assert_eq!(classify(AssetKind::Image, raw), RefClass::External, "{raw}");
        }
    }

    #[test]
    fn test_data_url_only_embedded_for_images() {
        let raw = "data:image/png;base64,AAAA";
        assert_eq!(classify(AssetKind::Image, raw), RefClass::Embedded);
        assert_eq!(classify(AssetKind::Script, "data:text/javascript,1"), RefClass::Local);
    }

    #[test]
    fn test_local() {
        for raw in ["./app.js", "app.js", "/app.js", "../shared/app.js", "httpfoo.js"] {
            assert_eq!(
                AssetReference::new(AssetKind::Script, raw).class(),
                RefClass::Local,
                "{raw}"
            );
        }
    }

    #[test]
    fn test_value_decodes_character_references() {
        let reference = AssetReference::new(AssetKind::Image, "img/a&amp;b&#46;png");
        assert_eq!(reference.raw, "img/a&amp;b&#46;png");
        assert_eq!(reference.value, "img/a&b.png");

        let external = AssetReference::new(AssetKind::Script, "&#104;ttps://cdn.example.com/a.js");
        assert_eq!(external.class(), RefClass::External);
    }

    #[test]
    fn test_kind_selectors() {
        assert_eq!(AssetKind::Stylesheet.attribute(), "href");
        assert_eq!(AssetKind::Image.selector(), "img[src]");
        assert_eq!(AssetKind::ALL[0], AssetKind::Script);
        assert_eq!(AssetKind::Stylesheet.to_string(), "stylesheet");
    }
}
