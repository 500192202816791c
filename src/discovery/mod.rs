//! Enumerates the files of a project root.
//!
//! The walk itself is synchronous (`walkdir`) and runs on tokio's blocking
//! pool, so callers only ever see an awaitable API.

use crate::core_types::FileRecord;
use crate::errors::{io_error_with_path, Error, Result};
use log::debug;
use std::path::{Path, PathBuf};

mod walker;

/// Recursively lists every file under `root` as absolute paths.
///
/// Directories are never returned. The order is deterministic for an
/// unchanged tree (file-name order within each directory).
///
/// # Errors
/// Returns `Error::NotFound` if `root` does not exist or is not a directory.
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> autocss::errors::Result<()> {
/// let temp = tempfile::tempdir().unwrap();
/// std::fs::write(temp.path().join("index.html"), "<html></html>").unwrap();
///
/// let files = autocss::discovery::walk(temp.path(), false).await?;
/// assert_eq!(files.len(), 1);
/// assert!(files[0].is_absolute());
/// # Ok(())
/// # }
/// ```
pub async fn walk(root: &Path, follow_symlinks: bool) -> Result<Vec<PathBuf>> {
    walk_inner(root, follow_symlinks, None).await
}

/// Like [`walk`], but never descends into `exclude`.
pub async fn walk_excluding(
    root: &Path,
    follow_symlinks: bool,
    exclude: &Path,
) -> Result<Vec<PathBuf>> {
    walk_inner(root, follow_symlinks, Some(exclude.to_path_buf())).await
}

/// Walks `root` and classifies every file into a [`FileRecord`].
pub async fn discover_files(root: &Path, follow_symlinks: bool) -> Result<Vec<FileRecord>> {
    let root = resolve_root(root).await?;
    let files = walk(&root, follow_symlinks).await?;
    Ok(files
        .into_iter()
        .filter_map(|path| FileRecord::new(&root, path))
        .collect())
}

/// Canonicalizes `root` and checks that it is a directory.
pub async fn resolve_root(root: &Path) -> Result<PathBuf> {
    let canonical = tokio::fs::canonicalize(root)
        .await
        .map_err(|_| Error::NotFound(format!("Project root '{}' does not exist", root.display())))?;
    let metadata = tokio::fs::metadata(&canonical)
        .await
        .map_err(|e| io_error_with_path(e, &canonical))?;
    if !metadata.is_dir() {
        return Err(Error::NotFound(format!(
            "Project root '{}' is not a directory",
            root.display()
        )));
    }
    Ok(canonical)
}

async fn walk_inner(
    root: &Path,
    follow_symlinks: bool,
    exclude: Option<PathBuf>,
) -> Result<Vec<PathBuf>> {
    let root = resolve_root(root).await?;
    let exclude = match exclude {
        // The excluded directory may not exist yet; compare against the canonical root instead.
        Some(path) => Some(tokio::fs::canonicalize(&path).await.unwrap_or(path)),
        None => None,
    };

    let walk_root = root.clone();
    let files = tokio::task::spawn_blocking(move || {
        walker::collect_files(&walk_root, follow_symlinks, exclude.as_deref())
    })
    .await
    .map_err(|e| Error::Io {
        path: root.display().to_string(),
        source: std::io::Error::new(std::io::ErrorKind::Other, e),
    })??;

    debug!("Walk of '{}' found {} files", root.display(), files.len());
    Ok(files)
}
