// src/extraction/attributes.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeSet;

/// Pulls class tokens and id values out of HTML text.
///
/// Implementations are best-effort: the rest of the pipeline only relies on
/// the returned sets being free of empty strings.
pub trait HtmlAttributeExtractor: Send + Sync {
    /// Returns every class token found in `class` attributes.
    fn classes(&self, html: &str) -> BTreeSet<String>;
    /// Returns every value found in `id` attributes.
    fn ids(&self, html: &str) -> BTreeSet<String>;
}

// The leading group keeps `data-class="..."` and `aria-id="..."` from matching.
static CLASS_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|[^\w-])class\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static ID_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)(?:^|[^\w-])id\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

/// Shallow pattern-match extractor. Not an HTML parser: attributes inside
/// comments or scripts are picked up too.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegexAttributeExtractor;

impl RegexAttributeExtractor {
    fn attribute_values<'a>(re: &'static Regex, html: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        re.captures_iter(html)
            .filter_map(|caps| caps.get(1).or_else(|| caps.get(2)))
            .map(|m| m.as_str())
    }
}

impl HtmlAttributeExtractor for RegexAttributeExtractor {
    fn classes(&self, html: &str) -> BTreeSet<String> {
        Self::attribute_values(&CLASS_ATTR_RE, html)
            .flat_map(|value| value.split_whitespace())
            .map(str::to_string)
            .collect()
    }

    fn ids(&self, html: &str) -> BTreeSet<String> {
        Self::attribute_values(&ID_ATTR_RE, html)
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    }
}
