//! The `autocss` prelude for convenient library usage.
//!
//! Re-exports the types and functions most programs need, so a single glob
//! import is enough to analyze a project and run the generation pipeline.
//!
//! # Example
//!
//! ```
//! use autocss::prelude::*;
//! # fn main() -> Result<()> {
//!
//! let config = ConfigBuilder::new().model("gpt-4o-mini").build()?;
//! let token = CancellationToken::new();
//! assert!(!token.is_cancelled());
//! assert_eq!(config.completion.model, "gpt-4o-mini");
//!
//! let report = CssReport::from_css("@media (max-width: 600px) { .a { display: grid; } }");
//! assert_eq!(report.media_queries, 1);
//!
//! # Ok(())
//! # }
//! ```

pub use crate::analysis::{analyze, analyze_detailed, ProjectAnalysis};
pub use crate::apply::{apply, enhanced_dir_for, inject_stylesheet_link};
pub use crate::archive::{archive, Archiver};
pub use crate::cancellation::CancellationToken;
pub use crate::completion::{
    complete_with_retry, extract_code_block, generate_code, CompletionClient, CompletionRequest,
    OpenAiClient, RetryPolicy,
};
pub use crate::config::{Config, ConfigBuilder};
pub use crate::core_types::{FileKind, FileRecord, ProjectSummary};
pub use crate::css_report::{CssReport, ResponsiveStatus};
pub use crate::errors::{Error, Result};
pub use crate::extraction::{HtmlAttributeExtractor, RegexAttributeExtractor};
pub use crate::pipeline::{enhance, generate_css, EnhancedProject, GeneratedCss};
pub use crate::project::{ProjectStore, UploadedFile};
pub use crate::prompt::assemble;

#[cfg(feature = "github")]
pub use crate::github::{parse_github_url, GithubClient, GithubLocation};
