//! Imports a project from a GitHub repository folder.

mod api;
mod url;

pub use api::{GithubClient, GITHUB_API_BASE};
pub use url::{parse_github_url, GithubLocation};

use crate::errors::{Error, Result};
use crate::project::ProjectStore;

impl GithubClient {
    /// Downloads the folder named by `url` into a new stored project and
    /// returns the project id. The download is capped at the store's
    /// `max_upload_size`. The project is removed again if the download fails
    /// or finds no files.
    pub async fn import(&self, url: &str, store: &ProjectStore) -> Result<String> {
        let location = parse_github_url(url).ok_or_else(|| {
            Error::InvalidUpload(format!("Not a GitHub repository or folder URL: '{}'", url))
        })?;

        let (project_id, root) = store.create_project().await?;
        let max_bytes = store.config().max_upload_size;
        match self.download_directory(&location, &root, max_bytes).await {
            Ok(0) => {
                store.remove_project(&project_id).await;
                Err(Error::NotFound(format!("No files found at '{}'", url)))
            }
            Ok(count) => {
                log::info!("Imported {} files from {} as project {}", count, url, project_id);
                Ok(project_id)
            }
            Err(e) => {
                store.remove_project(&project_id).await;
                Err(e)
            }
        }
    }
}

/// Imports `url` into `store` using the configured `GITHUB_TOKEN`, if any.
pub async fn import_into_store(url: &str, store: &ProjectStore) -> Result<String> {
    let client = GithubClient::new(store.config().github_token.as_deref())?;
    client.import(url, store).await
}
