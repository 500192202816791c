// src/config/builder.rs

use super::{
    parsing::{env_var, normalize_api_base, parse_size},
    validation::validate_config,
    CompletionConfig, Config,
};
use crate::cli::GlobalArgs;
use crate::constants::{
    DEFAULT_API_BASE, DEFAULT_COMPLETION_RETRIES, DEFAULT_COMPLETION_TIMEOUT_SECS,
    DEFAULT_EXCERPT_LIMIT, DEFAULT_MAX_TOKENS, DEFAULT_MAX_UPLOAD_SIZE, DEFAULT_MODEL,
    DEFAULT_PROMPT_EXCERPT_LIMIT, DEFAULT_TEMPERATURE,
};
use crate::errors::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;

/// A builder for creating a [`Config`].
///
/// Every setting is optional; unset settings fall back to the defaults in
/// [`crate::constants`]. [`ConfigBuilder::from_env`] pre-populates the builder
/// from environment variables (and a `.env` file, if present), and explicit
/// setter calls made afterwards take precedence.
///
/// # Examples
///
/// ```
/// use autocss::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .data_dir("/tmp/autocss-data")
///     .excerpt_limit(800)
///     .model("gpt-4o-mini")
///     .build()
///     .unwrap();
///
/// assert_eq!(config.excerpt_limit, 800);
/// assert_eq!(config.completion.model, "gpt-4o-mini");
/// assert_eq!(config.prompt_excerpt_limit, 3000);
/// ```
#[derive(Debug, Default, Clone)]
pub struct ConfigBuilder {
    data_dir: Option<PathBuf>,
    excerpt_limit: Option<usize>,
    prompt_excerpt_limit: Option<usize>,
    follow_symlinks: Option<bool>,
    max_upload_size: Option<String>,
    github_token: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
    max_retries: Option<u32>,
}

impl ConfigBuilder {
    /// Creates a new `ConfigBuilder` with no settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder populated from the environment.
    ///
    /// Loads `.env` if present, then reads `OPENAI_API_KEY`, `AUTOCSS_API_BASE`,
    /// `AUTOCSS_MODEL`, `AUTOCSS_DATA_DIR`, `AUTOCSS_MAX_UPLOAD_SIZE` and
    /// `GITHUB_TOKEN`.
    pub fn from_env() -> Self {
        if dotenv::dotenv().is_ok() {
            log::debug!("Loaded environment from .env file.");
        }
        Self {
            data_dir: env_var("AUTOCSS_DATA_DIR").map(PathBuf::from),
            max_upload_size: env_var("AUTOCSS_MAX_UPLOAD_SIZE"),
            github_token: env_var("GITHUB_TOKEN"),
            api_key: env_var("OPENAI_API_KEY"),
            api_base: env_var("AUTOCSS_API_BASE"),
            model: env_var("AUTOCSS_MODEL"),
            ..Self::default()
        }
    }

    /// Creates a builder from the environment, overridden by command-line flags.
    pub fn from_cli(args: &GlobalArgs) -> Self {
        let mut builder = Self::from_env();
        if let Some(dir) = &args.data_dir {
            builder = builder.data_dir(dir.clone());
        }
        if let Some(model) = &args.model {
            builder = builder.model(model.clone());
        }
        if let Some(api_base) = &args.api_base {
            builder = builder.api_base(api_base.clone());
        }
        if let Some(limit) = args.excerpt_limit {
            builder = builder.excerpt_limit(limit);
        }
        if let Some(secs) = args.timeout {
            builder = builder.timeout_secs(secs);
        }
        if let Some(retries) = args.retries {
            builder = builder.max_retries(retries);
        }
        if let Some(size) = &args.max_upload_size {
            builder = builder.max_upload_size(size.clone());
        }
        builder.follow_symlinks(args.follow_symlinks)
    }

    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(path.into());
        self
    }

    pub fn excerpt_limit(mut self, limit: usize) -> Self {
        self.excerpt_limit = Some(limit);
        self
    }

    pub fn prompt_excerpt_limit(mut self, limit: usize) -> Self {
        self.prompt_excerpt_limit = Some(limit);
        self
    }

    pub fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = Some(follow);
        self
    }

    /// Sets the upload limit from a human-readable size such as `"10MiB"`.
    pub fn max_upload_size(mut self, size: impl Into<String>) -> Self {
        self.max_upload_size = Some(size.into());
        self
    }

    pub fn github_token(mut self, token: impl Into<String>) -> Self {
        self.github_token = Some(token.into());
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = Some(retries);
        self
    }

    /// Builds and validates the final `Config`.
    ///
    /// # Errors
    /// Returns `Error::Config` if a size or URL cannot be parsed or a value is out of range.
    pub fn build(self) -> Result<Config> {
        self.try_build()
            .map_err(|e| Error::Config(format!("{:#}", e)))
    }

    fn try_build(self) -> anyhow::Result<Config> {
        let max_upload_size = parse_size(
            self.max_upload_size
                .as_deref()
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE),
        )?;
        let api_base = normalize_api_base(self.api_base.as_deref().unwrap_or(DEFAULT_API_BASE))?;

        let config = Config {
            data_dir: self
                .data_dir
                .unwrap_or_else(|| PathBuf::from("autocss-data")),
            excerpt_limit: self.excerpt_limit.unwrap_or(DEFAULT_EXCERPT_LIMIT),
            prompt_excerpt_limit: self
                .prompt_excerpt_limit
                .unwrap_or(DEFAULT_PROMPT_EXCERPT_LIMIT),
            follow_symlinks: self.follow_symlinks.unwrap_or(false),
            max_upload_size,
            github_token: self.github_token,
            completion: CompletionConfig {
                api_key: self.api_key,
                api_base,
                model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
                temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
                max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
                timeout: Duration::from_secs(
                    self.timeout_secs
                        .unwrap_or(DEFAULT_COMPLETION_TIMEOUT_SECS),
                ),
                max_retries: self.max_retries.unwrap_or(DEFAULT_COMPLETION_RETRIES),
            },
        };

        validate_config(&config)?;
        log::debug!("Configuration built: {:?}", config);
        Ok(config)
    }
}
