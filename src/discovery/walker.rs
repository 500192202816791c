use crate::errors::{Error, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Walks `root` and collects every regular file, skipping anything under `exclude`.
///
/// Entries are visited in file-name order within each directory, so repeated
/// runs over an unchanged tree yield the same sequence. Symbolic links to
/// regular files are always collected. Symlinked directories are only
/// traversed when `follow_symlinks` is set; in that mode `walkdir` reports
/// links that point back at an ancestor, and those are skipped.
///
/// Entries that vanish mid-walk are skipped. Any other walk failure (e.g. an
/// unreadable directory) aborts with [`Error::Io`] naming the offending path.
pub(super) fn collect_files(
    root: &Path,
    follow_symlinks: bool,
    exclude: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    let walker = WalkDir::new(root)
        .follow_links(follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| match exclude {
            Some(excluded) => !entry.path().starts_with(excluded),
            None => true,
        });

    let mut files = Vec::new();
    for entry_result in walker {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(err) => {
                skip_or_fail(err, root)?;
                continue;
            }
        };

        if entry.file_type().is_file() {
            files.push(entry.into_path());
        } else if entry.path_is_symlink() {
            // With `follow_links` off the entry carries the link's own type.
            match std::fs::metadata(entry.path()) {
                Ok(meta) if meta.is_file() => files.push(entry.into_path()),
                Ok(_) => debug!("Not following symlinked directory: {}", entry.path().display()),
                Err(e) => debug!("Skipping dangling symlink '{}': {}", entry.path().display(), e),
            }
        }
    }
    Ok(files)
}

/// Decides whether a walk error is tolerable. Symlink cycles and entries
/// removed during the walk are logged and skipped; everything else fails.
fn skip_or_fail(err: walkdir::Error, root: &Path) -> Result<()> {
    let path = err.path().unwrap_or(root).to_path_buf();
    let ancestor = err.loop_ancestor().map(Path::to_path_buf);
    classify_walk_error(&path, ancestor.as_deref(), err.into_io_error())
}

fn classify_walk_error(
    path: &Path,
    loop_ancestor: Option<&Path>,
    io_error: Option<std::io::Error>,
) -> Result<()> {
    if let Some(ancestor) = loop_ancestor {
        warn!(
            "Skipping symlink cycle at '{}' (points back to '{}')",
            path.display(),
            ancestor.display()
        );
        return Ok(());
    }
    let source = match io_error {
        Some(io) if io.kind() == std::io::ErrorKind::NotFound => {
            warn!("Skipping '{}': removed during walk", path.display());
            return Ok(());
        }
        Some(io) => io,
        None => std::io::Error::new(std::io::ErrorKind::Other, "directory walk failed"),
    };
    Err(Error::Io {
        path: path.display().to_string(),
        source,
    })
}
