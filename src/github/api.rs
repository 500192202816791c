// src/github/api.rs
//! Downloads folder contents through the GitHub contents API.

use super::url::GithubLocation;
use crate::errors::{Error, Result};
use crate::project::{sanitize_relative_path, write_project_file};
use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

pub const GITHUB_API_BASE: &str = "https://api.github.com";

const DOWNLOAD_CONCURRENCY: usize = 8;

/// A file or directory item from the contents API.
#[derive(Deserialize, Debug)]
struct ContentItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
    download_url: Option<String>,
    #[serde(default)]
    size: u64,
}

/// Repository metadata, only used for the default branch.
#[derive(Deserialize, Debug)]
struct RepoInfo {
    default_branch: String,
}

/// A file queued for download, with its destination relative to the project root.
#[derive(Debug)]
struct PendingFile {
    relative: PathBuf,
    download_url: String,
    size: u64,
}

/// Running total of downloaded bytes, shared by concurrent downloads.
#[derive(Debug)]
struct ByteBudget {
    limit: u64,
    used: AtomicU64,
}

impl ByteBudget {
    fn new(limit: u64) -> Self {
        Self {
            limit,
            used: AtomicU64::new(0),
        }
    }

    fn consume(&self, bytes: u64) -> Result<()> {
        let total = self.used.fetch_add(bytes, Ordering::Relaxed) + bytes;
        if total > self.limit {
            return Err(too_large(total, self.limit));
        }
        Ok(())
    }
}

fn too_large(total: u64, limit: u64) -> Error {
    Error::InvalidUpload(format!(
        "Import of {} bytes exceeds the limit of {} bytes",
        total, limit
    ))
}

/// Async client for the GitHub REST API.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_base: String,
}

impl GithubClient {
    /// Builds a client, authenticating with `token` when given.
    ///
    /// A token is needed for private repositories and raises rate limits.
    pub fn new(token: Option<&str>) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github.v3+json"),
        );
        if let Some(token) = token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| Error::Config("GITHUB_TOKEN contains invalid characters".into()))?;
            headers.insert(AUTHORIZATION, value);
            log::debug!("Using GITHUB_TOKEN for authentication.");
        }
        let http = reqwest::Client::builder()
            .user_agent(concat!("autocss/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            api_base: GITHUB_API_BASE.to_string(),
        })
    }

    /// Points the client at another API host (GitHub Enterprise, test servers).
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// Downloads every file under `location` into `dest`, keeping the folder
    /// structure relative to `location.subdirectory`. Returns the file count.
    ///
    /// Fails with `Error::InvalidUpload` once more than `max_bytes` would be
    /// written, judged first by the sizes the listing declares and then by the
    /// bytes actually received.
    pub async fn download_directory(
        &self,
        location: &GithubLocation,
        dest: &Path,
        max_bytes: u64,
    ) -> Result<usize> {
        let branch = match &location.branch {
            Some(branch) => branch.clone(),
            None => self.default_branch(location).await?,
        };
        log::info!(
            "Fetching {}/{} '{}' on branch {}",
            location.owner,
            location.repo,
            location.subdirectory,
            branch
        );

        let files = self.list_files(location, &branch).await?;
        let count = files.len();
        let declared: u64 = files.iter().map(|file| file.size).sum();
        if declared > max_bytes {
            return Err(too_large(declared, max_bytes));
        }

        let budget = &ByteBudget::new(max_bytes);
        stream::iter(files)
            .map(move |file| async move {
                let bytes = self.fetch_bytes(&file.download_url, budget).await?;
                write_project_file(dest, &file.relative, &bytes).await
            })
            .buffer_unordered(DOWNLOAD_CONCURRENCY)
            .try_collect::<Vec<()>>()
            .await?;

        Ok(count)
    }

    async fn default_branch(&self, location: &GithubLocation) -> Result<String> {
        let api_url = format!(
            "{}/repos/{}/{}",
            self.api_base, location.owner, location.repo
        );
        log::debug!("Fetching repo metadata from: {}", api_url);
        let info: RepoInfo = self
            .get(&api_url)
            .await?
            .json()
            .await
            .map_err(|e| Error::Fetch(format!("Malformed repository metadata: {}", e)))?;
        Ok(info.default_branch)
    }

    /// Lists all files under the location breadth-first.
    async fn list_files(&self, location: &GithubLocation, branch: &str) -> Result<Vec<PendingFile>> {
        let mut files = Vec::new();
        let mut queue: VecDeque<String> = VecDeque::new();
        queue.push_back(location.subdirectory.clone());

        while let Some(path) = queue.pop_front() {
            let api_url = if path.is_empty() {
                format!(
                    "{}/repos/{}/{}/contents",
                    self.api_base, location.owner, location.repo
                )
            } else {
                format!(
                    "{}/repos/{}/{}/contents/{}",
                    self.api_base, location.owner, location.repo, path
                )
            };
            log::debug!("Fetching directory contents from: {}", api_url);
            let response = self
                .http
                .get(&api_url)
                .query(&[("ref", branch)])
                .send()
                .await
                .map_err(|e| Error::Fetch(e.to_string()))?;
            let json_value: Value = check_status(response, &api_url)?
                .json()
                .await
                .map_err(|e| Error::Fetch(format!("Malformed contents listing: {}", e)))?;

            // A file path yields a single object, a directory an array.
            let items: Vec<ContentItem> = match json_value {
                Value::Array(_) => serde_json::from_value(json_value),
                Value::Object(_) => {
                    serde_json::from_value::<ContentItem>(json_value).map(|item| vec![item])
                }
                _ => Ok(Vec::new()),
            }
            .map_err(|e| Error::Fetch(format!("Unexpected contents listing: {}", e)))?;

            for item in items {
                match (item.item_type.as_str(), item.download_url) {
                    ("file", Some(download_url)) => {
                        let relative =
                            relative_to_subdirectory(&item.path, &location.subdirectory);
                        files.push(PendingFile {
                            relative: sanitize_relative_path(&relative)?,
                            download_url,
                            size: item.size,
                        });
                    }
                    ("file", None) => {
                        log::warn!("Skipping file with no download_url: {}", item.path)
                    }
                    ("dir", _) => queue.push_back(item.path),
                    _ => log::debug!("Skipping {} entry: {}", item.item_type, item.path),
                }
            }
        }
        Ok(files)
    }

    async fn fetch_bytes(&self, url: &str, budget: &ByteBudget) -> Result<Vec<u8>> {
        log::debug!("Downloading file from: {}", url);
        let mut response = self.get(url).await?;
        let mut bytes = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| Error::Fetch(format!("Failed to read '{}': {}", url, e)))?
        {
            budget.consume(chunk.len() as u64)?;
            bytes.extend_from_slice(&chunk);
        }
        Ok(bytes)
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::Fetch(e.to_string()))?;
        check_status(response, url)
    }
}

fn check_status(response: reqwest::Response, url: &str) -> Result<reqwest::Response> {
    match response.status() {
        status if status.is_success() => Ok(response),
        StatusCode::NOT_FOUND => Err(Error::NotFound(format!("GitHub resource '{}'", url))),
        status => Err(Error::Fetch(format!("GitHub returned {} for '{}'", status, url))),
    }
}

/// Repo path of an item, made relative to the requested folder.
fn relative_to_subdirectory(item_path: &str, subdirectory: &str) -> String {
    if subdirectory.is_empty() {
        return item_path.to_string();
    }
    if item_path == subdirectory {
        // The location named a single file.
        return item_path
            .rsplit('/')
            .next()
            .unwrap_or(item_path)
            .to_string();
    }
    item_path
        .strip_prefix(subdirectory)
        .map(|rest| rest.trim_start_matches('/').to_string())
        .unwrap_or_else(|| item_path.to_string())
}
