//! MIME type detection for inlined images.
//!
//! Only the formats that can be embedded as `<img>` data URLs are known;
//! anything else is unsupported and left for the caller to report.

use std::path::Path;

/// MIME type constants for supported image formats.
pub mod types {
    pub const JPEG: &str = "image/jpeg";
    pub const PNG: &str = "image/png";
    pub const GIF: &str = "image/gif";
    pub const SVG: &str = "image/svg+xml";
    pub const WEBP: &str = "image/webp";
}

/// Image MIME type from file extension (case-insensitive).
///
/// Returns `None` for unknown or missing extensions.
pub fn from_extension(ext: &str) -> Option<&'static str> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some(types::JPEG),
        "png" => Some(types::PNG),
        "gif" => Some(types::GIF),
        "svg" => Some(types::SVG),
        "webp" => Some(types::WEBP),
        _ => None,
    }
}

/// Image MIME type from a path's extension.
pub fn from_path(path: &Path) -> Option<&'static str> {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(from_extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(from_path(Path::new("logo.png")), Some(types::PNG));
        assert_eq!(from_path(Path::new("photo.jpg")), Some(types::JPEG));
        assert_eq!(from_path(Path::new("photo.jpeg")), Some(types::JPEG));
        assert_eq!(from_path(Path::new("anim.gif")), Some(types::GIF));
        assert_eq!(from_path(Path::new("icon.svg")), Some(types::SVG));
        assert_eq!(from_path(Path::new("hero.webp")), Some(types::WEBP));
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(from_path(Path::new("LOGO.PNG")), Some(types::PNG));
        assert_eq!(from_extension("JpEg"), Some(types::JPEG));
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(from_path(Path::new("image.bmp")), None);
        assert_eq!(from_path(Path::new("image.avif")), None);
        assert_eq!(from_path(Path::new("README")), None);
        assert_eq!(from_extension(""), None);
    }
}
