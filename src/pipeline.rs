//! End-to-end CSS generation: analyze, prompt, complete, apply, archive.
//!
//! The functions here are shared by the CLI (which works on any directory)
//! and the web service (which works on stored projects under a lease).

use crate::analysis::analyze;
use crate::apply::apply;
use crate::archive::archive;
use crate::cancellation::CancellationToken;
use crate::completion::{complete_with_retry, extract_code_block, CompletionClient, CompletionRequest, RetryPolicy};
use crate::config::Config;
use crate::constants::CSS_SYSTEM_MESSAGE;
use crate::core_types::ProjectSummary;
use crate::css_report::CssReport;
use crate::errors::{Error, Result};
use crate::project::ProjectStore;
use crate::prompt::assemble;
use std::path::{Path, PathBuf};
use tracing::instrument;

/// A stylesheet generated for a project, before it is applied.
#[derive(Debug, Clone)]
pub struct GeneratedCss {
    pub css: String,
    pub summary: ProjectSummary,
    pub report: CssReport,
}

/// Result of a full run: the stylesheet plus where the enhanced copy was written.
#[derive(Debug, Clone)]
pub struct EnhancedProject {
    pub generated: GeneratedCss,
    pub enhanced_dir: PathBuf,
}

/// Analyzes `root` and asks `client` for a stylesheet. Nothing is written.
///
/// # Errors
/// `Analysis` if the walk fails, `Generation` if the completion fails or
/// yields no CSS, `Interrupted` if `token` is cancelled.
#[instrument(level = "debug", skip(client, config, token))]
pub async fn generate_css(
    root: &Path,
    instructions: Option<&str>,
    client: &dyn CompletionClient,
    config: &Config,
    token: &CancellationToken,
) -> Result<GeneratedCss> {
    let summary = analyze(root, config).await?;
    token.check()?;

    let prompt = assemble(&summary, instructions, config.prompt_excerpt_limit);
    let request = CompletionRequest::new(prompt, CSS_SYSTEM_MESSAGE, &config.completion);
    let response = complete_with_retry(
        client,
        &request,
        RetryPolicy::from(&config.completion),
        token,
    )
    .await?;

    let css = extract_code_block(&response).code;
    if css.is_empty() {
        return Err(Error::Generation(
            "Completion contained no CSS".to_string(),
        ));
    }
    let report = CssReport::from_css(&css);
    log::info!(
        "Generated {} bytes of CSS ({:?}: {} media queries)",
        css.len(),
        report.status,
        report.media_queries
    );
    Ok(GeneratedCss {
        css,
        summary,
        report,
    })
}

/// Generates a stylesheet for `root` and applies it to the enhanced copy.
pub async fn enhance(
    root: &Path,
    instructions: Option<&str>,
    client: &dyn CompletionClient,
    config: &Config,
    token: &CancellationToken,
) -> Result<EnhancedProject> {
    let generated = generate_css(root, instructions, client, config, token).await?;
    token.check()?;
    let enhanced_dir = apply(root, &generated.css, config).await?;
    Ok(EnhancedProject {
        generated,
        enhanced_dir,
    })
}

/// Runs [`enhance`] on a stored project while holding its lease.
///
/// # Errors
/// `Conflict` if the project is already being processed, `NotFound` for an
/// unknown id, plus everything [`enhance`] can return.
#[instrument(level = "debug", skip(store, instructions, client, token))]
pub async fn generate_project_css(
    store: &ProjectStore,
    project_id: &str,
    instructions: Option<&str>,
    client: &dyn CompletionClient,
    token: &CancellationToken,
) -> Result<EnhancedProject> {
    let _lease = store.lease(project_id)?;
    let root = store.project_root(project_id).await?;
    enhance(&root, instructions, client, store.config(), token).await
}

/// Zips a stored project's enhanced copy and returns the archive path.
///
/// # Errors
/// `NotFound` if the project has not been enhanced yet, `Conflict` if a run
/// is in progress.
pub async fn build_archive(store: &ProjectStore, project_id: &str) -> Result<PathBuf> {
    let _lease = store.lease(project_id)?;
    store.project_root(project_id).await?;
    let enhanced = store.enhanced_dir(project_id);
    if !tokio::fs::try_exists(&enhanced).await.unwrap_or(false) {
        return Err(Error::NotFound(format!(
            "Enhanced output for project '{}'",
            project_id
        )));
    }
    let dest = store.archive_path(project_id);
    archive(&enhanced, &dest).await?;
    Ok(dest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::test_support::ScriptedClient;
    use crate::project::UploadedFile;
    use std::fs;
    use std::sync::Arc;
    use tempfile::tempdir;

    const CSS_RESPONSE: &str = "```css\n.hero { display: flex; }\n```";

    #[tokio::test]
    async fn test_enhance_end_to_end() -> anyhow::Result<()> {
        // 1. Setup
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        fs::write(
            root.join("index.html"),
            r#"<html><head></head><body><div class="hero"></div></body></html>"#,
        )?;
        let config = Config::new_for_test(temp.path().join("data"));
        let client = ScriptedClient::new(vec![Ok(CSS_RESPONSE.into())]);
        let token = CancellationToken::new();

        // 2. Execute
        let outcome = enhance(&root, Some("Bold"), &client, &config, &token).await?;

        // 3. Assert
        assert_eq!(outcome.generated.css, ".hero { display: flex; }");
        assert!(outcome.generated.summary.elements.classes.contains("hero"));
        assert_eq!(outcome.enhanced_dir, fs::canonicalize(temp.path())?.join("enhanced"));
        let html = fs::read_to_string(outcome.enhanced_dir.join("index.html"))?;
        assert!(html.contains(r#"href="autocss-generated.css""#));

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests[0].system_message, CSS_SYSTEM_MESSAGE);
        assert!(requests[0].prompt.contains("CSS classes used: hero"));
        assert!(requests[0].prompt.contains("Bold"));
        Ok(())
    }

    #[tokio::test]
    async fn test_empty_completion_is_generation_error() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let root = temp.path().join("site");
        fs::create_dir_all(&root)?;
        let config = Config::new_for_test(temp.path().join("data"));
        let client = ScriptedClient::new(vec![Ok("```css\n  \n```".into())]);
        let result = generate_css(&root, None, &client, &config, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::Generation(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_project_run_conflicts_with_held_lease() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ProjectStore::new(Arc::new(Config::new_for_test(temp.path())));
        let id = store
            .materialize(vec![UploadedFile::new("index.html", "<p></p>")])
            .await?;
        let client = ScriptedClient::new(vec![Ok(CSS_RESPONSE.into())]);

        let held = store.lease(&id)?;
        let result =
            generate_project_css(&store, &id, None, &client, &CancellationToken::new()).await;
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(client.calls(), 0);

        drop(held);
        generate_project_css(&store, &id, None, &client, &CancellationToken::new()).await?;
        assert!(!store.registry().is_leased(&id));
        Ok(())
    }

    #[tokio::test]
    async fn test_build_archive_requires_enhanced_output() -> anyhow::Result<()> {
        let temp = tempdir()?;
        let store = ProjectStore::new(Arc::new(Config::new_for_test(temp.path())));
        let id = store
            .materialize(vec![UploadedFile::new("index.html", "<p></p>")])
            .await?;
        assert!(matches!(
            build_archive(&store, &id).await,
            Err(Error::NotFound(_))
        ));

        let client = ScriptedClient::new(vec![Ok(CSS_RESPONSE.into())]);
        generate_project_css(&store, &id, None, &client, &CancellationToken::new()).await?;
        let zip_path = build_archive(&store, &id).await?;
        assert_eq!(zip_path, store.archive_path(&id));
        assert!(zip_path.is_file());
        Ok(())
    }
}
