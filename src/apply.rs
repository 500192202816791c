//! Materializes the enhanced copy of a project with the generated stylesheet linked in.
//!
//! The applier never touches the source tree. It copies every file
//! byte-for-byte into the enhanced directory, writes the stylesheet there and
//! rewrites only the copied HTML files. Running it twice with the same inputs
//! yields the same tree.

use crate::config::Config;
use crate::constants::{ENHANCED_DIR_NAME, GENERATED_STYLESHEET_NAME};
use crate::core_types::FileKind;
use crate::discovery;
use crate::errors::{io_error_with_path, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::instrument;

static HTML_OPEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<html(?:\s[^>]*)?>").unwrap());

const HEAD_CLOSE: &str = "</head>";

/// Returns where the enhanced copy of `root` lives.
///
/// Normally the sibling `<parent>/enhanced`. If `root` has no parent, or is
/// itself named `enhanced`, the copy is nested at `root/enhanced` instead
/// (and excluded from the copy).
///
/// # Examples
///
/// ```
/// use autocss::apply::enhanced_dir_for;
/// use std::path::Path;
///
/// assert_eq!(
///     enhanced_dir_for(Path::new("/data/p1/project")),
///     Path::new("/data/p1/enhanced")
/// );
/// assert_eq!(enhanced_dir_for(Path::new("/")), Path::new("/enhanced"));
/// ```
pub fn enhanced_dir_for(root: &Path) -> PathBuf {
    if root.file_name() == Some(OsStr::new(ENHANCED_DIR_NAME)) {
        return root.join(ENHANCED_DIR_NAME);
    }
    match root.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(ENHANCED_DIR_NAME),
        _ => root.join(ENHANCED_DIR_NAME),
    }
}

/// Copies `root` into its enhanced directory, writes `css` as the generated
/// stylesheet and links it from every HTML file. Returns the enhanced directory.
///
/// # Errors
/// `Error::NotFound` if `root` is missing, `Error::Io` naming the failing path
/// for any copy or write failure. A failure part-way leaves a partial tree.
///
/// Any previous content of the enhanced directory is removed first, so the
/// result only ever holds files from `root`.
#[instrument(level = "debug", skip(css, config))]
pub async fn apply(root: &Path, css: &str, config: &Config) -> Result<PathBuf> {
    let root = discovery::resolve_root(root).await?;
    let enhanced = enhanced_dir_for(&root);
    match tokio::fs::remove_dir_all(&enhanced).await {
        Ok(()) => log::debug!("Cleared previous output in '{}'", enhanced.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(io_error_with_path(e, &enhanced)),
    }
    tokio::fs::create_dir_all(&enhanced)
        .await
        .map_err(|e| io_error_with_path(e, &enhanced))?;

    let files = discovery::walk_excluding(&root, config.follow_symlinks, &enhanced).await?;

    let mut html_copies: Vec<(PathBuf, String)> = Vec::new();
    for source in &files {
        let Ok(relative) = source.strip_prefix(&root) else {
            continue;
        };
        let dest = enhanced.join(relative);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| io_error_with_path(e, parent))?;
        }
        tokio::fs::copy(source, &dest)
            .await
            .map_err(|e| io_error_with_path(e, source))?;

        if FileKind::from_path(relative) == FileKind::Html {
            html_copies.push((dest, stylesheet_href(relative)));
        }
    }

    let stylesheet = enhanced.join(GENERATED_STYLESHEET_NAME);
    tokio::fs::write(&stylesheet, css)
        .await
        .map_err(|e| io_error_with_path(e, &stylesheet))?;

    let mut linked = 0;
    for (path, href) in &html_copies {
        if link_stylesheet_in_file(path, href).await? {
            linked += 1;
        }
    }

    log::info!(
        "Enhanced copy written to '{}' ({} files, {} HTML files linked)",
        enhanced.display(),
        files.len(),
        linked
    );
    Ok(enhanced)
}

/// Links the stylesheet into one copied HTML file. Returns `true` if the file changed.
async fn link_stylesheet_in_file(path: &Path, href: &str) -> Result<bool> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| io_error_with_path(e, path))?;
    let html = match String::from_utf8(bytes) {
        Ok(html) => html,
        Err(_) => {
            log::warn!(
                "'{}' is not valid UTF-8; copied without a stylesheet link",
                path.display()
            );
            return Ok(false);
        }
    };
    if references_stylesheet(&html) {
        return Ok(false);
    }
    let updated = inject_stylesheet_link(&html, href);
    tokio::fs::write(path, updated)
        .await
        .map_err(|e| io_error_with_path(e, path))?;
    Ok(true)
}

/// Path from an HTML file (relative to the project root) to the stylesheet at the root.
fn stylesheet_href(html_relative: &Path) -> String {
    let depth = html_relative
        .parent()
        .map(|p| p.components().count())
        .unwrap_or(0);
    let prefix = "../".repeat(depth);
    format!("{}{}", prefix, GENERATED_STYLESHEET_NAME)
}

/// Whether `html` already mentions the generated stylesheet.
pub fn references_stylesheet(html: &str) -> bool {
    html.contains(GENERATED_STYLESHEET_NAME)
}

/// Inserts a `<link rel="stylesheet">` for `href` into `html`.
///
/// The link goes right before the first `</head>` (case-insensitive). Without
/// a head, `<head>LINK</head>` is placed after the `<html>` open tag, or at the
/// very start of the document if there is none.
///
/// # Examples
///
/// ```
/// use autocss::apply::inject_stylesheet_link;
///
/// let html = "<html><HEAD><title>t</title></HEAD><body></body></html>";
/// assert_eq!(
///     inject_stylesheet_link(html, "style.css"),
///     r#"<html><HEAD><title>t</title><link rel="stylesheet" href="style.css"></HEAD><body></body></html>"#
/// );
/// ```
pub fn inject_stylesheet_link(html: &str, href: &str) -> String {
    let link = format!(r#"<link rel="stylesheet" href="{}">"#, href);

    // ASCII lowercasing keeps byte offsets aligned with `html`.
    if let Some(pos) = html.to_ascii_lowercase().find(HEAD_CLOSE) {
        let mut out = String::with_capacity(html.len() + link.len());
        out.push_str(&html[..pos]);
        out.push_str(&link);
        out.push_str(&html[pos..]);
        return out;
    }

    let head = format!("<head>{}</head>", link);
    match HTML_OPEN_RE.find(html) {
        Some(open) => {
            let mut out = String::with_capacity(html.len() + head.len());
            out.push_str(&html[..open.end()]);
            out.push_str(&head);
            out.push_str(&html[open.end()..]);
            out
        }
        None => format!("{}{}", head, html),
    }
}
