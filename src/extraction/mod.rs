//! Extracts class names, ids and a body excerpt from HTML files.
//!
//! Extraction never fails: an unreadable file (missing, permission denied,
//! not UTF-8) produces an empty [`ExtractionResult`] so that one bad file does
//! not abort the analysis of a whole project.

use crate::core_types::ExtractionResult;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

mod attributes;

pub use attributes::{HtmlAttributeExtractor, RegexAttributeExtractor};

static BODY_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<body(?:\s[^>]*)?>").unwrap());

const BODY_CLOSE: &str = "</body>";

/// Reads `path` and extracts its classes, ids and body excerpt using the
/// default [`RegexAttributeExtractor`].
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let temp = tempfile::tempdir().unwrap();
/// let page = temp.path().join("index.html");
/// std::fs::write(&page, r#"<body><div class="a b"><span id="x"></span></div></body>"#).unwrap();
///
/// let result = autocss::extraction::extract(&page, 1500).await;
/// assert!(result.classes.contains("a") && result.classes.contains("b"));
/// assert!(result.ids.contains("x"));
/// # }
/// ```
pub async fn extract(path: &Path, excerpt_limit: usize) -> ExtractionResult {
    extract_with(path, excerpt_limit, &RegexAttributeExtractor).await
}

/// Like [`extract`], with a caller-supplied attribute extractor.
pub async fn extract_with(
    path: &Path,
    excerpt_limit: usize,
    extractor: &dyn HtmlAttributeExtractor,
) -> ExtractionResult {
    match tokio::fs::read_to_string(path).await {
        Ok(html) => extract_from_str(&html, excerpt_limit, extractor),
        Err(e) => {
            log::warn!(
                "Could not read '{}' for extraction, using empty result: {}",
                path.display(),
                e
            );
            ExtractionResult::default()
        }
    }
}

/// Extracts from HTML text already in memory.
pub fn extract_from_str(
    html: &str,
    excerpt_limit: usize,
    extractor: &dyn HtmlAttributeExtractor,
) -> ExtractionResult {
    ExtractionResult {
        classes: extractor.classes(html),
        ids: extractor.ids(html),
        html_excerpt: truncate_chars(body_content(html), excerpt_limit).to_string(),
    }
}

/// Returns the markup between the first `<body ...>` and the last `</body>`,
/// or the whole document when no body tag is present. Whitespace is kept
/// as-is.
pub fn body_content(html: &str) -> &str {
    let Some(open) = BODY_OPEN_RE.find(html) else {
        return html;
    };
    let start = open.end();
    // ASCII lowercasing keeps byte offsets aligned with `html`.
    let lowered = html.to_ascii_lowercase();
    let end = match lowered.rfind(BODY_CLOSE) {
        Some(close) if close >= start => close,
        _ => html.len(),
    };
    &html[start..end]
}

/// Truncates `text` to at most `max_chars` characters, on a char boundary.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_body_content_between_tags() {
        let html = "<html><head><title>t</title></head><BODY class=\"page\">\n<main>hi</main>\n</Body></html>";
        assert_eq!(body_content(html), "\n<main>hi</main>\n");
    }

    #[test]
    fn test_body_content_keeps_surrounding_whitespace() {
        let fragment = "\n  <div>x</div>\n";
        assert_eq!(body_content(fragment), fragment);
        assert_eq!(body_content("<body>  \n</body>"), "  \n");
    }

    #[test]
    fn test_body_content_uses_last_closing_tag() {
        let html = "<body><p>a</p></body><!-- stray --></body>";
        assert_eq!(body_content(html), "<p>a</p></body><!-- stray -->");
    }

    #[test]
    fn test_body_content_without_body_is_whole_document() {
        let html = "<div class=\"x\">fragment</div>";
        assert_eq!(body_content(html), html);
    }

    #[test]
    fn test_body_content_does_not_match_bodyguard_tag() {
        let html = "<bodyguard>x</bodyguard>";
        assert_eq!(body_content(html), html);
    }

    #[test]
    fn test_truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("abc", 0), "");
    }

    #[test]
    fn test_excerpt_is_bounded() {
        let body = "x".repeat(5000);
        let html = format!("<body>{}</body>", body);
        let result = extract_from_str(&html, 1500, &RegexAttributeExtractor);
        assert_eq!(result.html_excerpt.chars().count(), 1500);
    }

    #[tokio::test]
    async fn test_extract_scenario_div_span() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let page = temp.path().join("index.html");
        fs::write(&page, r#"<div class="a b"><span id="x"></span></div>"#)?;

        let result = extract(&page, 1500).await;
        assert_eq!(result.classes.len(), 2);
        assert!(result.classes.contains("a"));
        assert!(result.classes.contains("b"));
        assert_eq!(result.ids.len(), 1);
        assert!(result.ids.contains("x"));
        Ok(())
    }

    #[tokio::test]
    async fn test_extract_unreadable_file_is_empty() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let page = temp.path().join("broken.html");
        fs::write(&page, [0xff, 0xfe, 0x80, 0x81])?;

        let result = extract(&page, 1500).await;
        assert!(result.is_empty());

        let missing = extract(&temp.path().join("missing.html"), 1500).await;
        assert!(missing.is_empty());
        Ok(())
    }
}
