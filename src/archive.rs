//! Zips an enhanced project for download.
//!
//! Zip creation is synchronous and runs on tokio's blocking pool. The future
//! returned by [`Archiver::write`] resolves only after the archive has been
//! finished and synced to disk, so the caller can read it immediately.

use crate::core_types::to_forward_slashes;
use crate::discovery;
use crate::errors::{Error, Result};
use std::fs::File;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Lifecycle of one archive file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    Idle,
    Writing,
    /// The archive is complete and synced.
    Closed,
    /// Writing failed and the partial file was removed.
    Failed,
}

/// Writes one zip archive. Single use: a second `write` is rejected.
#[derive(Debug)]
pub struct Archiver {
    dest: PathBuf,
    state: ArchiveState,
}

impl Archiver {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            state: ArchiveState::Idle,
        }
    }

    pub fn state(&self) -> ArchiveState {
        self.state
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Archives every file and directory under `source_dir`, with entry names
    /// relative to it. The archive itself is never an entry, even when `dest`
    /// lies inside `source_dir`.
    ///
    /// # Errors
    /// `Error::NotFound` if `source_dir` is missing; `Error::Archive` for any
    /// other failure, in which case the partial archive is deleted.
    pub async fn write(&mut self, source_dir: &Path) -> Result<()> {
        if self.state != ArchiveState::Idle {
            return Err(Error::Archive(format!(
                "Archiver for '{}' was already used ({:?})",
                self.dest.display(),
                self.state
            )));
        }
        let source = discovery::resolve_root(source_dir).await?;
        if let Some(parent) = self.dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Archive(format!("{}: {}", parent.display(), e)))?;
        }

        // Resolved so an archive placed inside `source_dir` can leave itself out.
        let dest = match (self.dest.parent(), self.dest.file_name()) {
            (Some(parent), Some(name)) => tokio::fs::canonicalize(parent)
                .await
                .map(|dir| dir.join(name))
                .unwrap_or_else(|_| self.dest.clone()),
            _ => self.dest.clone(),
        };

        self.state = ArchiveState::Writing;
        let result = tokio::task::spawn_blocking(move || write_zip(&source, &dest))
            .await
            .map_err(|e| Error::Archive(format!("Archive task failed: {}", e)))
            .and_then(|inner| inner);

        match result {
            Ok(entries) => {
                self.state = ArchiveState::Closed;
                log::info!(
                    "Archived {} entries into '{}'",
                    entries,
                    self.dest.display()
                );
                Ok(())
            }
            Err(e) => {
                self.state = ArchiveState::Failed;
                if let Err(remove_err) = tokio::fs::remove_file(&self.dest).await {
                    if remove_err.kind() != ErrorKind::NotFound {
                        log::warn!(
                            "Could not remove failed archive '{}': {}",
                            self.dest.display(),
                            remove_err
                        );
                    }
                }
                Err(e)
            }
        }
    }
}

/// Zips `source_dir` into `dest`. See [`Archiver::write`].
///
/// # Examples
///
/// ```
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> autocss::errors::Result<()> {
/// let temp = tempfile::tempdir().unwrap();
/// let site = temp.path().join("site");
/// std::fs::create_dir(&site).unwrap();
/// std::fs::write(site.join("index.html"), "<p>hi</p>").unwrap();
///
/// let zip_path = temp.path().join("out/site.zip");
/// autocss::archive::archive(&site, &zip_path).await?;
/// assert!(zip_path.is_file());
/// # Ok(())
/// # }
/// ```
pub async fn archive(source_dir: &Path, dest: &Path) -> Result<()> {
    Archiver::new(dest).write(source_dir).await
}

fn write_zip(source: &Path, dest: &Path) -> Result<usize> {
    let archive_err = |context: &str, e: &dyn std::fmt::Display| {
        Error::Archive(format!("{} '{}': {}", context, dest.display(), e))
    };

    let file = File::create(dest).map_err(|e| archive_err("Cannot create", &e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut entries = 0;
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if is_vanished(e.io_error()) => {
                log::warn!("Skipping entry that vanished during archiving: {}", e);
                continue;
            }
            Err(e) => return Err(archive_err("Failed to walk source for", &e)),
        };
        if entry.path() == dest {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(source) else {
            continue;
        };
        let name = to_forward_slashes(relative);

        if entry.file_type().is_dir() {
            writer
                .add_directory(name.as_str(), options)
                .map_err(|e| archive_err("Failed to add directory to", &e))?;
            entries += 1;
            continue;
        }
        if entry.path_is_symlink() && entry.path().is_dir() {
            log::debug!("Not following symlinked directory: {}", entry.path().display());
            continue;
        }

        let mut input = match File::open(entry.path()) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::warn!(
                    "Skipping '{}': it vanished during archiving",
                    entry.path().display()
                );
                continue;
            }
            Err(e) => return Err(archive_err(&format!("Cannot read '{}' for", name), &e)),
        };
        writer
            .start_file(name.as_str(), options)
            .map_err(|e| archive_err("Failed to start entry in", &e))?;
        io::copy(&mut input, &mut writer)
            .map_err(|e| archive_err(&format!("Failed to write '{}' into", name), &e))?;
        entries += 1;
    }

    let file = writer
        .finish()
        .map_err(|e| archive_err("Failed to finalize", &e))?;
    file.sync_all()
        .map_err(|e| archive_err("Failed to sync", &e))?;
    Ok(entries)
}

fn is_vanished(error: Option<&io::Error>) -> bool {
    error.map_or(false, |e| e.kind() == ErrorKind::NotFound)
}
