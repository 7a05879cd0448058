//! HTML helpers for feed bodies
//!
//! Feeds embed HTML in descriptions and content bodies. We only need a short
//! plain-text blurb and, when present, the first inline image.

use std::sync::LazyLock;

use newscloud_core::item::{SUMMARY_ELLIPSIS, SUMMARY_MAX_CHARS};
use regex::Regex;

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<.*?>").expect("tag pattern is valid"));

static IMG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("img pattern is valid")
});

/// Convert an HTML fragment into a short plain-text summary.
///
/// Tags become spaces, entities are decoded, line breaks and whitespace runs
/// collapse to single spaces. Anything beyond 220 characters is cut and
/// marked with a trailing ellipsis.
pub fn sanitize_summary(html: &str) -> String {
    let without_tags = TAG_PATTERN.replace_all(html, " ");
    let decoded = html_escape::decode_html_entities(&without_tags);
    let text = decoded.split_whitespace().collect::<Vec<_>>().join(" ");

    truncate_chars(&text, SUMMARY_MAX_CHARS)
}

/// Truncate on a character boundary, appending an ellipsis when cut
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = text[..byte_idx].to_string();
            out.push(SUMMARY_ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

/// Extract the first `<img src="...">` URL from an HTML fragment
pub fn extract_image_from_html(html: &str) -> Option<String> {
    IMG_PATTERN
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_tags_and_entities() {
        let html = "<p>Hello <b>world</b> &amp; friends&nbsp;!</p>\r\n<br/>Next";
        assert_eq!(sanitize_summary(html), "Hello world & friends ! Next");
    }

    #[test]
    fn test_sanitize_short_text_untouched() {
        assert_eq!(sanitize_summary("Plain text"), "Plain text");
        assert_eq!(sanitize_summary(""), "");
    }

    #[test]
    fn test_sanitize_truncates_long_text() {
        let long = "a".repeat(300);
        let summary = sanitize_summary(&long);
        assert_eq!(summary.chars().count(), SUMMARY_MAX_CHARS + 1);
        assert!(summary.ends_with(SUMMARY_ELLIPSIS));
    }

    #[test]
    fn test_exactly_max_chars_is_not_truncated() {
        let text = "b".repeat(SUMMARY_MAX_CHARS);
        assert_eq!(sanitize_summary(&text), text);
    }

    #[test]
    fn test_truncate_respects_multibyte_chars() {
        let text = "é".repeat(5);
        assert_eq!(truncate_chars(&text, 3), "ééé…");
    }

    #[test]
    fn test_extract_image() {
        let html = concat!(
            r#"<div><IMG class="hero" SRC='https://cdn.example/a.jpg'>"#,
            r#"<img src="https://cdn.example/b.jpg"></div>"#,
        );
        assert_eq!(
            extract_image_from_html(html).as_deref(),
            Some("https://cdn.example/a.jpg")
        );
        assert_eq!(extract_image_from_html("<p>no image</p>"), None);
    }
}
