//! Defines the core `Config` struct and related types for application configuration.
//!
//! A `Config` is built once at process start (from CLI flags and the
//! environment) and passed by reference into every pipeline invocation. It
//! replaces any notion of global upload/output directories.

use std::path::PathBuf;
use std::time::Duration;

pub use builder::ConfigBuilder;
mod builder;
mod parsing;
mod validation;

/// Settings for the external completion collaborator.
#[derive(Clone)]
pub struct CompletionConfig {
    /// Bearer token for the completion API. Required only when a request is made.
    pub api_key: Option<String>,
    /// Base URL of an OpenAI-compatible API, without the trailing `/chat/completions`.
    pub api_base: String,
    /// Chat model name.
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Retries after the first failed attempt. File-system work is never retried.
    pub max_retries: u32,
}

// Custom Debug implementation to keep the API key out of logs.
impl std::fmt::Debug for CompletionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base directory holding stored projects and transient archives.
    pub data_dir: PathBuf,
    /// Maximum characters kept from one HTML body.
    pub excerpt_limit: usize,
    /// Maximum characters of concatenated excerpts in a prompt.
    pub prompt_excerpt_limit: usize,
    /// Whether the walker follows symbolic links. Cycles are skipped either way.
    pub follow_symlinks: bool,
    /// Maximum total bytes accepted in one upload.
    pub max_upload_size: u64,
    /// Token for GitHub API requests, to access private repos and raise rate limits.
    pub github_token: Option<String>,
    pub completion: CompletionConfig,
}

impl Config {
    /// Directory containing one container directory per stored project.
    pub fn projects_dir(&self) -> PathBuf {
        self.data_dir.join("projects")
    }

    /// Directory where archives are written before being served.
    pub fn archives_dir(&self) -> PathBuf {
        self.data_dir.join("archives")
    }

    /// Creates a default `Config` for testing purposes, rooted at `data_dir`.
    #[doc(hidden)]
    pub fn new_for_test(data_dir: impl Into<PathBuf>) -> Self {
        ConfigBuilder::new()
            .data_dir(data_dir.into())
            .api_key("test-key")
            .build()
            .expect("default test configuration is valid")
    }
}
