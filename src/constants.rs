// src/constants.rs

/// File name of the stylesheet written into every enhanced project.
pub const GENERATED_STYLESHEET_NAME: &str = "autocss-generated.css";

/// Directory name of the enhanced copy, created as a sibling of the project root.
pub const ENHANCED_DIR_NAME: &str = "enhanced";

/// Directory name of the project root inside a stored project's container.
pub const PROJECT_DIR_NAME: &str = "project";

/// Maximum characters kept from a single HTML file's body.
pub const DEFAULT_EXCERPT_LIMIT: usize = 1500;

/// Maximum characters of concatenated excerpts placed in a prompt.
pub const DEFAULT_PROMPT_EXCERPT_LIMIT: usize = 3000;

/// Number of HTML files extracted concurrently during analysis.
pub const EXTRACTION_CONCURRENCY: usize = 8;

/// Default chat model for the completion API.
pub const DEFAULT_MODEL: &str = "gpt-4";

/// Default base URL of the OpenAI-compatible completion API.
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

pub const DEFAULT_TEMPERATURE: f32 = 0.2;

pub const DEFAULT_MAX_TOKENS: u32 = 2048;

/// Seconds to wait for a single completion response.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Retries after the first failed completion attempt.
pub const DEFAULT_COMPLETION_RETRIES: u32 = 2;

/// Initial backoff between completion retries, doubled on each attempt.
pub const COMPLETION_BACKOFF_MS: u64 = 500;

/// Default maximum total size of one upload.
pub const DEFAULT_MAX_UPLOAD_SIZE: &str = "50MiB";

/// Language reported for generated code when the response carries no fence tag.
pub const DEFAULT_CODE_LANGUAGE: &str = "javascript";

/// System message for free-form code generation.
pub const CODE_SYSTEM_MESSAGE: &str = "You are a helpful programming assistant. Respond with clean, well-formatted code based on the user's request. Include only the code without explanations unless specifically asked.";

/// System message for project stylesheet generation.
pub const CSS_SYSTEM_MESSAGE: &str = "You are an expert front-end developer specializing in modern, responsive CSS. Respond with a single CSS document only.";

/// Closing directive appended to every project prompt.
pub const PROMPT_CLOSING_DIRECTIVE: &str = "Return a single, complete CSS document that styles the elements above. Respond with CSS only: no explanations, no commentary, no markdown outside the code.";
