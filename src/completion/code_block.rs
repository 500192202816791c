// src/completion/code_block.rs

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([a-zA-Z0-9_+-]+)?\s*\n([\s\S]+?)\n```").unwrap());

/// Code pulled out of a completion response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeBlock {
    pub code: String,
    /// The fence's language tag, if any.
    pub language: Option<String>,
}

/// Returns the body of the first fenced code block in `text`, trimmed.
///
/// Without a fence, the whole trimmed text is returned with no language.
///
/// # Examples
///
/// ```
/// use autocss::completion::extract_code_block;
///
/// let block = extract_code_block("Sure!\n```css\nbody { margin: 0; }\n```");
/// assert_eq!(block.code, "body { margin: 0; }");
/// assert_eq!(block.language.as_deref(), Some("css"));
///
/// let bare = extract_code_block("  h1 { color: red; }\n");
/// assert_eq!(bare.code, "h1 { color: red; }");
/// assert!(bare.language.is_none());
/// ```
pub fn extract_code_block(text: &str) -> CodeBlock {
    match FENCED_BLOCK_RE.captures(text) {
        Some(caps) => CodeBlock {
            code: caps
                .get(2)
                .map_or("", |m| m.as_str())
                .trim()
                .to_string(),
            language: caps.get(1).map(|m| m.as_str().to_string()),
        },
        None => CodeBlock {
            code: text.trim().to_string(),
            language: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_block_wins() {
        let text = "```css\na{}\n```\nand\n```js\nb()\n```";
        let block = extract_code_block(text);
        assert_eq!(block.code, "a{}");
        assert_eq!(block.language.as_deref(), Some("css"));
    }

    #[test]
    fn test_untagged_fence() {
        let block = extract_code_block("```\nlet x = 1;\n```");
        assert_eq!(block.code, "let x = 1;");
        assert_eq!(block.language, None);
    }

    #[test]
    fn test_multiline_body_is_kept() {
        let text = "```c++\nint main() {\n  return 0;\n}\n```";
        let block = extract_code_block(text);
        assert_eq!(block.code, "int main() {\n  return 0;\n}");
        assert_eq!(block.language.as_deref(), Some("c++"));
    }

    #[test]
    fn test_unterminated_fence_falls_back_to_whole_text() {
        let text = "```css\nbody{}";
        assert_eq!(extract_code_block(text).code, text);
    }
}
