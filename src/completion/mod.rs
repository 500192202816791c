//! The external completion collaborator and the code it drives.
//!
//! [`CompletionClient`] is a single-attempt seam; [`complete_with_retry`]
//! wraps any client with a per-attempt timeout, bounded retries with
//! exponential backoff, and cancellation. Callers normally go through
//! [`generate_code`] or the project pipeline rather than calling a client
//! directly.

use crate::cancellation::CancellationToken;
use crate::config::CompletionConfig;
use crate::constants::{CODE_SYSTEM_MESSAGE, COMPLETION_BACKOFF_MS, DEFAULT_CODE_LANGUAGE};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;

mod code_block;
mod openai;

pub use code_block::{extract_code_block, CodeBlock};
pub use openai::OpenAiClient;

/// One request to the completion API.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub prompt: String,
    pub system_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Builds a request using the sampling settings from `config`.
    pub fn new(
        prompt: impl Into<String>,
        system_message: impl Into<String>,
        config: &CompletionConfig,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            system_message: system_message.into(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }
}

/// A text-completion backend.
///
/// Implementations perform exactly one attempt; retrying and timeouts are
/// layered on top by [`complete_with_retry`].
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Returns the completion text, or `Error::Generation` on failure or an
    /// empty response.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// Timeout and retry settings for completion calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
}

impl From<&CompletionConfig> for RetryPolicy {
    fn from(config: &CompletionConfig) -> Self {
        Self {
            timeout: config.timeout,
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(COMPLETION_BACKOFF_MS),
        }
    }
}

/// Calls `client`, retrying `Generation` failures and timeouts.
///
/// Any other error (for example a missing API key) is returned immediately.
/// Cancellation of `token` aborts the in-flight attempt or backoff sleep with
/// `Error::Interrupted`.
pub async fn complete_with_retry(
    client: &dyn CompletionClient,
    request: &CompletionRequest,
    policy: RetryPolicy,
    token: &CancellationToken,
) -> Result<String> {
    let mut backoff = policy.initial_backoff;
    let mut attempt = 0;
    loop {
        token.check()?;
        let outcome = tokio::select! {
            _ = token.cancelled() => return Err(Error::Interrupted),
            res = tokio::time::timeout(policy.timeout, client.complete(request)) => match res {
                Ok(inner) => inner,
                Err(_) => Err(Error::Generation(format!(
                    "Completion timed out after {}s",
                    policy.timeout.as_secs_f32()
                ))),
            },
        };

        match outcome {
            Ok(text) => return Ok(text),
            Err(Error::Generation(msg)) if attempt < policy.max_retries => {
                attempt += 1;
                log::warn!(
                    "Completion attempt {} failed ({}), retrying in {:?}",
                    attempt,
                    msg,
                    backoff
                );
                tokio::select! {
                    _ = token.cancelled() => return Err(Error::Interrupted),
                    _ = tokio::time::sleep(backoff) => {}
                }
                backoff *= 2;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Result of free-form code generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedCode {
    pub code: String,
    pub language: String,
}

/// Generates code for a free-form prompt.
///
/// The first fenced block of the response becomes the code; without a fence
/// the whole trimmed response is used. The language defaults to `javascript`.
///
/// # Errors
/// `Error::Config` for a blank prompt, otherwise whatever the client returns.
pub async fn generate_code(
    prompt: &str,
    client: &dyn CompletionClient,
    config: &CompletionConfig,
    token: &CancellationToken,
) -> Result<GeneratedCode> {
    if prompt.trim().is_empty() {
        return Err(Error::Config("Prompt is required".to_string()));
    }
    let request = CompletionRequest::new(prompt, CODE_SYSTEM_MESSAGE, config);
    let response = complete_with_retry(client, &request, RetryPolicy::from(config), token).await?;
    let block = extract_code_block(&response);
    Ok(GeneratedCode {
        code: block.code,
        language: block
            .language
            .unwrap_or_else(|| DEFAULT_CODE_LANGUAGE.to_string()),
    })
}
