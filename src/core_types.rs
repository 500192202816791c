//! Defines core data structures used throughout the pipeline.
//!
//! `FileRecord` comes out of the walker, `ExtractionResult` out of the HTML
//! extractor, and `ProjectSummary` out of the analyzer. All of them are plain
//! data and serialize with camelCase keys for the web API.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The type of a project file, inferred from its extension (case-insensitive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Html,
    Css,
    Js,
    Other,
}

impl FileKind {
    /// Classifies a path by its extension.
    ///
    /// # Examples
    ///
    /// ```
    /// use autocss::core_types::FileKind;
    /// use std::path::Path;
    ///
    /// assert_eq!(FileKind::from_path(Path::new("index.HTML")), FileKind::Html);
    /// assert_eq!(FileKind::from_path(Path::new("page.htm")), FileKind::Html);
    /// assert_eq!(FileKind::from_path(Path::new("css/site.css")), FileKind::Css);
    /// assert_eq!(FileKind::from_path(Path::new("app.mjs")), FileKind::Js);
    /// assert_eq!(FileKind::from_path(Path::new("README")), FileKind::Other);
    /// ```
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|os_str| os_str.to_str())
            .map(|s| s.to_ascii_lowercase());

        match extension.as_deref() {
            Some("html") | Some("htm") => FileKind::Html,
            Some("css") => FileKind::Css,
            Some("js") | Some("mjs") | Some("cjs") | Some("jsx") => FileKind::Js,
            _ => FileKind::Other,
        }
    }
}

/// One file found by the directory walker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// The absolute path to the file on disk.
    pub absolute_path: PathBuf,
    /// The path relative to the project root, always with `/` separators.
    pub relative_path: String,
    /// The inferred file type.
    pub kind: FileKind,
}

impl FileRecord {
    /// Builds a record for `absolute_path`, which must lie under `root`.
    ///
    /// Returns `None` if `absolute_path` is not inside `root`.
    pub fn new(root: &Path, absolute_path: PathBuf) -> Option<Self> {
        let relative = absolute_path.strip_prefix(root).ok()?;
        let relative_path = to_forward_slashes(relative);
        let kind = FileKind::from_path(&absolute_path);
        Some(Self {
            absolute_path,
            relative_path,
            kind,
        })
    }
}

/// Joins the components of a relative path with `/`, regardless of host OS.
pub fn to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Classes, ids and body excerpt pulled from one HTML file.
///
/// The sets never contain empty strings or duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionResult {
    pub classes: BTreeSet<String>,
    pub ids: BTreeSet<String>,
    pub html_excerpt: String,
}

impl ExtractionResult {
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.ids.is_empty() && self.html_excerpt.is_empty()
    }
}

/// Deduplicated union of classes and ids across a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSets {
    pub classes: BTreeSet<String>,
    pub ids: BTreeSet<String>,
}

impl ElementSets {
    /// Merges one file's extraction into the union. Order of merges does not
    /// affect the result.
    pub fn merge(&mut self, result: &ExtractionResult) {
        self.classes.extend(result.classes.iter().cloned());
        self.ids.extend(result.ids.iter().cloned());
    }
}

/// An excerpt of one HTML file, kept for prompt assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HtmlSample {
    pub file: String,
    pub excerpt: String,
}

/// Project-level aggregate produced by the analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    pub html_files: Vec<String>,
    pub css_files: Vec<String>,
    pub js_files: Vec<String>,
    pub elements: ElementSets,
    pub html_structure_samples: Vec<HtmlSample>,
}
