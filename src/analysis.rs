//! Aggregates per-file extraction results into a project summary.

use crate::config::Config;
use crate::constants::EXTRACTION_CONCURRENCY;
use crate::core_types::{ExtractionResult, FileKind, HtmlSample, ProjectSummary};
use crate::discovery;
use crate::errors::{Error, Result};
use crate::extraction::{extract_with, HtmlAttributeExtractor, RegexAttributeExtractor};
use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A project summary together with the raw per-file extraction results.
#[derive(Debug, Clone, Default)]
pub struct ProjectAnalysis {
    pub summary: ProjectSummary,
    /// Extraction result for every HTML file, keyed by relative path.
    /// Unreadable files map to an empty result.
    pub extractions: BTreeMap<String, ExtractionResult>,
}

/// Analyzes the project at `root`.
///
/// Walks the tree once, classifies files by extension, extracts every HTML
/// file and unions the class and id sets. All paths in the summary are
/// relative to `root` and use `/` separators.
///
/// # Errors
/// Returns `Error::Analysis` if the walk fails (for example, `root` is missing).
/// Per-file read failures are absorbed.
pub async fn analyze(root: &Path, config: &Config) -> Result<ProjectSummary> {
    Ok(analyze_detailed(root, config, &RegexAttributeExtractor)
        .await?
        .summary)
}

/// Like [`analyze`], with a caller-supplied extractor, returning per-file results too.
pub async fn analyze_detailed(
    root: &Path,
    config: &Config,
    extractor: &dyn HtmlAttributeExtractor,
) -> Result<ProjectAnalysis> {
    let records = discovery::discover_files(root, config.follow_symlinks)
        .await
        .map_err(|e| Error::Analysis(Box::new(e)))?;

    let mut summary = ProjectSummary::default();
    let mut html_files: Vec<(PathBuf, String)> = Vec::new();
    for record in &records {
        match record.kind {
            FileKind::Html => {
                summary.html_files.push(record.relative_path.clone());
                html_files.push((record.absolute_path.clone(), record.relative_path.clone()));
            }
            FileKind::Css => summary.css_files.push(record.relative_path.clone()),
            FileKind::Js => summary.js_files.push(record.relative_path.clone()),
            FileKind::Other => {}
        }
    }

    let excerpt_limit = config.excerpt_limit;
    // `buffered` keeps input order, so samples follow walk order.
    let results: Vec<(String, ExtractionResult)> = stream::iter(html_files)
        .map(move |(path, relative)| async move {
            let result = extract_with(&path, excerpt_limit, extractor).await;
            (relative, result)
        })
        .buffered(EXTRACTION_CONCURRENCY)
        .collect()
        .await;

    let mut extractions = BTreeMap::new();
    for (file, result) in results {
        summary.elements.merge(&result);
        if !result.html_excerpt.is_empty() {
            summary.html_structure_samples.push(HtmlSample {
                file: file.clone(),
                excerpt: result.html_excerpt.clone(),
            });
        }
        extractions.insert(file, result);
    }

    log::info!(
        "Analyzed '{}': {} HTML, {} CSS, {} JS files; {} classes, {} ids",
        root.display(),
        summary.html_files.len(),
        summary.css_files.len(),
        summary.js_files.len(),
        summary.elements.classes.len(),
        summary.elements.ids.len()
    );

    Ok(ProjectAnalysis {
        summary,
        extractions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn test_config(dir: &Path) -> Config {
        Config::new_for_test(dir.join("data"))
    }

    #[tokio::test]
    async fn test_analyze_missing_root_is_analysis_error() {
        let temp = tempdir().unwrap();
        let config = test_config(temp.path());
        let result = analyze(&temp.path().join("nope"), &config).await;
        match result {
            Err(Error::Analysis(inner)) => assert!(matches!(*inner, Error::NotFound(_))),
            other => panic!("Expected Analysis error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_analyze_future_can_be_spawned() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        fs::write(root.join("index.html"), r#"<body><p class="spawned"></p></body>"#)?;
        let config = test_config(temp.path());

        // Web handlers await `analyze` on a multi-threaded runtime.
        let summary = tokio::spawn(async move { analyze(&root, &config).await }).await??;
        assert!(summary.elements.classes.contains("spawned"));
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_lists_files_by_kind() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(root.join("pages"))?;
        fs::create_dir_all(root.join("js"))?;
        fs::write(root.join("index.html"), r#"<body><h1 class="title">x</h1></body>"#)?;
        fs::write(root.join("pages/about.HTM"), r#"<p id="about"></p>"#)?;
        fs::write(root.join("style.css"), "h1{}")?;
        fs::write(root.join("js/app.js"), "")?;
        fs::write(root.join("README.md"), "# readme")?;

        let summary = analyze(&root, &test_config(temp.path())).await?;
        assert_eq!(summary.html_files, vec!["index.html", "pages/about.HTM"]);
        assert_eq!(summary.css_files, vec!["style.css"]);
        assert_eq!(summary.js_files, vec!["js/app.js"]);
        assert!(summary.elements.classes.contains("title"));
        assert!(summary.elements.ids.contains("about"));
        assert_eq!(summary.html_structure_samples.len(), 2);
        assert_eq!(summary.html_structure_samples[0].file, "index.html");
        assert_eq!(
            summary.html_structure_samples[0].excerpt,
            r#"<h1 class="title">x</h1>"#
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_deduplicates_across_many_files() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        for i in 0..100 {
            fs::write(
                root.join(format!("page{:03}.html", i)),
                r#"<div class="card shared" id="main"></div>"#,
            )?;
        }

        let summary = analyze(&root, &test_config(temp.path())).await?;
        assert_eq!(summary.html_files.len(), 100);
        assert_eq!(summary.elements.classes.len(), 2);
        assert_eq!(summary.elements.ids.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_degrades_on_unreadable_file() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        fs::write(root.join("a.html"), r#"<div class="alpha" id="one"></div>"#)?;
        fs::write(root.join("b.html"), [0xc3, 0x28, 0xa0, 0xa1])?;
        fs::write(root.join("c.html"), r#"<div class="gamma" id="three"></div>"#)?;

        let analysis =
            analyze_detailed(&root, &test_config(temp.path()), &RegexAttributeExtractor).await?;
        let summary = &analysis.summary;
        assert_eq!(summary.html_files.len(), 3);
        assert!(summary.elements.classes.contains("alpha"));
        assert!(summary.elements.classes.contains("gamma"));
        assert!(summary.elements.ids.contains("one"));
        assert!(summary.elements.ids.contains("three"));
        assert!(analysis.extractions["b.html"].is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_analyze_respects_excerpt_limit() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        fs::write(root.join("big.html"), format!("<body>{}</body>", "y".repeat(4000)))?;

        let config = crate::ConfigBuilder::new()
            .data_dir(temp.path().join("data"))
            .excerpt_limit(100)
            .build()?;
        let summary = analyze(&root, &config).await?;
        assert_eq!(summary.html_structure_samples[0].excerpt.chars().count(), 100);
        Ok(())
    }
}
