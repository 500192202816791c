//! Turns a project summary into the text prompt sent to the completion API.
//!
//! Assembly is a pure function of its inputs: no I/O, no network.

use crate::constants::PROMPT_CLOSING_DIRECTIVE;
use crate::core_types::ProjectSummary;
use crate::extraction::truncate_chars;
use std::fmt::Write;

/// Builds the prompt for `summary`.
///
/// The excerpts of all HTML samples are concatenated (each prefixed with
/// `File: <name>`) and the concatenation as a whole is cut to
/// `excerpt_limit` characters. `user_instructions`, when present and not
/// blank, are inserted verbatim.
///
/// # Examples
///
/// ```
/// use autocss::core_types::ProjectSummary;
/// use autocss::prompt::assemble;
///
/// let summary = ProjectSummary {
///     html_files: vec!["index.html".into()],
///     ..Default::default()
/// };
/// let prompt = assemble(&summary, Some("Use a dark theme."), 3000);
/// assert!(prompt.contains("HTML files: index.html"));
/// assert!(prompt.contains("CSS files: None"));
/// assert!(prompt.contains("Use a dark theme."));
/// ```
pub fn assemble(
    summary: &ProjectSummary,
    user_instructions: Option<&str>,
    excerpt_limit: usize,
) -> String {
    let mut prompt = String::new();
    prompt.push_str("Generate modern, responsive CSS for the following web project.\n\n");

    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "HTML files: {}", join_or_none(&summary.html_files));
    let _ = writeln!(prompt, "CSS files: {}", join_or_none(&summary.css_files));
    let _ = writeln!(prompt, "JavaScript files: {}", join_or_none(&summary.js_files));
    prompt.push('\n');
    let _ = writeln!(
        prompt,
        "CSS classes used: {}",
        join_or_none(&summary.elements.classes)
    );
    let _ = writeln!(
        prompt,
        "Element IDs used: {}",
        join_or_none(&summary.elements.ids)
    );
    prompt.push('\n');

    prompt.push_str("HTML structure samples:\n");
    let excerpts = concatenated_excerpts(summary, excerpt_limit);
    if excerpts.is_empty() {
        prompt.push_str("None\n");
    } else {
        prompt.push_str(&excerpts);
        prompt.push('\n');
    }
    prompt.push('\n');

    if let Some(instructions) = user_instructions.filter(|s| !s.trim().is_empty()) {
        prompt.push_str("Additional requirements:\n");
        prompt.push_str(instructions);
        prompt.push_str("\n\n");
    }

    prompt.push_str(PROMPT_CLOSING_DIRECTIVE);
    prompt
}

/// Concatenates all samples and truncates the result to `limit` characters.
pub fn concatenated_excerpts(summary: &ProjectSummary, limit: usize) -> String {
    let mut combined = String::new();
    for sample in &summary.html_structure_samples {
        if !combined.is_empty() {
            combined.push_str("\n\n");
        }
        let _ = write!(combined, "File: {}\n{}", sample.file, sample.excerpt);
    }
    truncate_chars(&combined, limit).to_string()
}

fn join_or_none<'a, I>(items: I) -> String
where
    I: IntoIterator<Item = &'a String>,
{
    let joined = items
        .into_iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ");
    if joined.is_empty() {
        "None".to_string()
    } else {
        joined
    }
}
