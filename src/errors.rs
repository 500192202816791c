//! Defines application-specific error types.
//!
//! This module provides the `Error` enum, which categorizes the failures the
//! pipeline can surface, offering more context than generic I/O or `anyhow`
//! errors. Per-file extraction failures never appear here: they degrade to an
//! empty extraction result instead.

use thiserror::Error;

/// Errors produced by the autocss pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// A project root or project identifier does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The directory walk underlying a project analysis failed.
    #[error("Failed to analyze project: {0}")]
    Analysis(#[source] Box<Error>),

    /// The completion collaborator failed or returned an empty/invalid response.
    #[error("Generation failed: {0}")]
    Generation(String),

    /// Error occurring during file or directory access (read, write, copy).
    #[error("I/O error accessing path '{path}': {source}")]
    Io {
        /// The path that caused the I/O error.
        path: String,
        /// The underlying `std::io::Error`.
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote project (GitHub) failed.
    #[error("Failed to fetch remote project: {0}")]
    Fetch(String),

    /// Zip creation failed.
    #[error("Archive error: {0}")]
    Archive(String),

    /// Another pipeline run currently holds the project.
    #[error("Project '{0}' is already being processed")]
    Conflict(String),

    /// Invalid configuration settings or combinations.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// An upload was rejected (unsafe path, duplicate path, too large).
    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    /// The operation was cancelled (Ctrl+C or a disconnected client).
    #[error("Operation cancelled")]
    Interrupted,
}

/// A `Result` alias using the crate's [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Helper function to create an `Error::Io` with path context.
///
/// # Arguments
/// * `source` - The original `std::io::Error`.
/// * `path` - The path associated with the error, convertible to `AsRef<std::path::Path>`.
pub fn io_error_with_path<P: AsRef<std::path::Path>>(source: std::io::Error, path: P) -> Error {
    Error::Io {
        path: path.as_ref().display().to_string(),
        source,
    }
}

impl Error {
    /// Returns `true` for errors caused by the caller's input rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_) | Error::Conflict(_) | Error::Config(_) | Error::InvalidUpload(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{io, path::PathBuf};

    #[test]
    fn test_io_error_with_path_helper() {
        let path = PathBuf::from("site/css/main.css");
        let source_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err = io_error_with_path(source_error, &path);

        match err {
            Error::Io {
                path: error_path,
                source,
            } => {
                assert!(error_path.contains("site/css/main.css"));
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Error::Io"),
        }
    }

    #[test]
    fn test_io_error_message_names_the_file() {
        let err = io_error_with_path(
            io::Error::new(io::ErrorKind::PermissionDenied, "Access denied"),
            "enhanced/index.html",
        );
        let msg = err.to_string();
        assert!(msg.contains("enhanced/index.html"));
        assert!(msg.contains("Access denied"));
    }

    #[test]
    fn test_analysis_error_wraps_cause() {
        let err = Error::Analysis(Box::new(Error::NotFound("/missing".to_string())));
        assert!(err.to_string().contains("/missing"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_client_error_classification() {
        assert!(Error::Conflict("p1".into()).is_client_error());
        assert!(Error::InvalidUpload("../x".into()).is_client_error());
        assert!(!Error::Archive("boom".into()).is_client_error());
        assert!(!Error::Generation("empty".into()).is_client_error());
    }
}
