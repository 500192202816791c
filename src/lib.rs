//! `autocss` is a library and command-line tool that generates a responsive
//! stylesheet for a static web project with an LLM and writes an enhanced copy
//! of the project with the stylesheet linked from every HTML page.
//!
//! As a library, it exposes each stage of the pipeline separately:
//! 1.  **Analyze**: Walk a project, classify its files and collect the classes,
//!     ids and body excerpts of its HTML pages ([`analysis::analyze`]).
//! 2.  **Prompt**: Turn the summary into a completion prompt ([`prompt::assemble`]).
//! 3.  **Complete**: Ask a [`completion::CompletionClient`] for CSS, with
//!     timeouts, retries and cancellation ([`completion::complete_with_retry`]).
//! 4.  **Apply**: Copy the project and link the stylesheet into every HTML
//!     file ([`apply::apply`]).
//! 5.  **Archive**: Zip the enhanced copy ([`archive::archive`]).
//!
//! [`pipeline`] strings these together, and the `web` feature serves them
//! over HTTP for uploaded or GitHub-imported projects.
//!
//! # Example: Library Usage
//!
//! ```
//! use autocss::{analysis::analyze, prompt::assemble, ConfigBuilder};
//! use std::fs;
//! use tempfile::tempdir;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! // 1. A small project on disk.
//! let temp_dir = tempdir()?;
//! fs::write(
//!     temp_dir.path().join("index.html"),
//!     r#"<html><body><nav id="top" class="menu"></nav></body></html>"#,
//! )?;
//! fs::write(temp_dir.path().join("app.js"), "console.log(1);")?;
//!
//! // 2. Configuration, built programmatically.
//! let config = ConfigBuilder::new().excerpt_limit(500).build()?;
//!
//! // 3. Analyze the project and assemble the prompt.
//! let summary = analyze(temp_dir.path(), &config).await?;
//! assert_eq!(summary.html_files, vec!["index.html"]);
//! assert!(summary.elements.classes.contains("menu"));
//!
//! let prompt = assemble(&summary, Some("Use a dark theme"), config.prompt_excerpt_limit);
//! assert!(prompt.contains("Element IDs used: top"));
//! assert!(prompt.contains("Use a dark theme"));
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod apply;
pub mod archive;
pub mod cancellation;
pub mod cli;
pub mod completion;
pub mod config;
pub mod constants;
pub mod core_types;
pub mod css_report;
pub mod discovery;
pub mod errors;
pub mod extraction;
#[cfg(feature = "github")]
pub mod github;
pub mod pipeline;
pub mod prelude;
pub mod project;
pub mod prompt;
pub mod signal;
#[cfg(feature = "web")]
pub mod web;

// Re-export key public types for easier use as a library
pub use cancellation::CancellationToken;
pub use completion::{CompletionClient, OpenAiClient};
pub use config::{Config, ConfigBuilder};
pub use core_types::{ElementSets, FileKind, FileRecord, ProjectSummary};
pub use css_report::{CssReport, ResponsiveStatus};
pub use errors::{Error, Result};
pub use pipeline::{enhance, generate_css, EnhancedProject, GeneratedCss};
