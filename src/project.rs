//! Stored projects: on-disk layout, uploads and per-project leases.
//!
//! Layout under `Config::data_dir`:
//!
//! ```text
//! projects/<id>/project/    the project root (uploaded files)
//! projects/<id>/enhanced/   the enhanced copy, written by the applier
//! archives/<id>.zip         transient download archive
//! ```

use crate::config::Config;
use crate::constants::{ENHANCED_DIR_NAME, PROJECT_DIR_NAME};
use crate::errors::{io_error_with_path, Error, Result};
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Default)]
struct RegistryInner {
    active: Mutex<HashMap<String, u64>>,
    next_generation: AtomicU64,
}

/// Tracks which projects are currently being processed.
///
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ProjectRegistry {
    inner: Arc<RegistryInner>,
}

impl ProjectRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the lease for `project_id`.
    ///
    /// # Errors
    /// `Error::Conflict` if another lease for the same project is alive.
    pub fn acquire(&self, project_id: &str) -> Result<ProjectLease> {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut active = self
            .inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if active.contains_key(project_id) {
            return Err(Error::Conflict(project_id.to_string()));
        }
        active.insert(project_id.to_string(), generation);
        log::debug!("Lease {} acquired for project {}", generation, project_id);
        Ok(ProjectLease {
            registry: self.clone(),
            project_id: project_id.to_string(),
            generation,
        })
    }

    /// Whether a lease for `project_id` is currently held.
    pub fn is_leased(&self, project_id: &str) -> bool {
        self.inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(project_id)
    }
}

/// Exclusive right to run the pipeline on one project. Released on drop.
#[derive(Debug)]
pub struct ProjectLease {
    registry: ProjectRegistry,
    project_id: String,
    generation: u64,
}

impl ProjectLease {
    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for ProjectLease {
    fn drop(&mut self) {
        let mut active = self
            .registry
            .inner
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // Only release our own generation.
        if active.get(&self.project_id) == Some(&self.generation) {
            active.remove(&self.project_id);
            log::debug!(
                "Lease {} released for project {}",
                self.generation,
                self.project_id
            );
        }
    }
}

/// One uploaded file, named by its path relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub relative_path: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(relative_path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            relative_path: relative_path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Creates, locates and leases stored projects.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    config: Arc<Config>,
    registry: ProjectRegistry,
}

impl ProjectStore {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            registry: ProjectRegistry::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &ProjectRegistry {
        &self.registry
    }

    /// Takes the processing lease for `project_id`.
    pub fn lease(&self, project_id: &str) -> Result<ProjectLease> {
        self.registry.acquire(project_id)
    }

    fn container_dir(&self, project_id: &str) -> PathBuf {
        self.config.projects_dir().join(project_id)
    }

    /// Path of the project's enhanced copy (may not exist yet).
    pub fn enhanced_dir(&self, project_id: &str) -> PathBuf {
        self.container_dir(project_id).join(ENHANCED_DIR_NAME)
    }

    /// Path where the project's download archive is written.
    pub fn archive_path(&self, project_id: &str) -> PathBuf {
        self.config
            .archives_dir()
            .join(format!("{}.zip", project_id))
    }

    /// Resolves `project_id` to its project root.
    ///
    /// # Errors
    /// `Error::NotFound` for a malformed id or a project that does not exist.
    pub async fn project_root(&self, project_id: &str) -> Result<PathBuf> {
        validate_project_id(project_id)?;
        let root = self.container_dir(project_id).join(PROJECT_DIR_NAME);
        match tokio::fs::metadata(&root).await {
            Ok(meta) if meta.is_dir() => Ok(root),
            _ => Err(Error::NotFound(format!("Project '{}'", project_id))),
        }
    }

    /// Allocates a new, empty project and returns its id and root.
    pub async fn create_project(&self) -> Result<(String, PathBuf)> {
        let project_id = Uuid::new_v4().to_string();
        let root = self.container_dir(&project_id).join(PROJECT_DIR_NAME);
        tokio::fs::create_dir_all(&root)
            .await
            .map_err(|e| io_error_with_path(e, &root))?;
        log::debug!("Created project {} at '{}'", project_id, root.display());
        Ok((project_id, root))
    }

    /// Writes uploaded files into a fresh project and returns its id.
    ///
    /// Every path is validated before anything is written: absolute paths,
    /// `..` components, empty names and duplicates are rejected, as is an
    /// upload larger than `Config::max_upload_size`.
    pub async fn materialize(&self, files: Vec<UploadedFile>) -> Result<String> {
        if files.is_empty() {
            return Err(Error::InvalidUpload("No files uploaded".to_string()));
        }

        let mut seen = HashSet::new();
        let mut total: u64 = 0;
        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            let relative = sanitize_relative_path(&file.relative_path)?;
            if !seen.insert(relative.clone()) {
                return Err(Error::InvalidUpload(format!(
                    "Duplicate path in upload: '{}'",
                    file.relative_path
                )));
            }
            total += file.bytes.len() as u64;
            planned.push((relative, file.bytes));
        }
        if total > self.config.max_upload_size {
            return Err(Error::InvalidUpload(format!(
                "Upload of {} bytes exceeds the limit of {} bytes",
                total, self.config.max_upload_size
            )));
        }

        let (project_id, root) = self.create_project().await?;
        for (relative, bytes) in &planned {
            if let Err(e) = write_project_file(&root, relative, bytes).await {
                self.remove_project(&project_id).await;
                return Err(e);
            }
        }
        log::info!(
            "Stored project {} with {} files ({} bytes)",
            project_id,
            planned.len(),
            total
        );
        Ok(project_id)
    }

    /// Deletes a project's container, logging rather than failing.
    pub async fn remove_project(&self, project_id: &str) {
        let container = self.container_dir(project_id);
        if let Err(e) = tokio::fs::remove_dir_all(&container).await {
            log::warn!(
                "Failed to remove project directory '{}': {}",
                container.display(),
                e
            );
        }
    }
}

/// Writes `bytes` to `root/relative`, creating parent directories.
pub(crate) async fn write_project_file(root: &Path, relative: &Path, bytes: &[u8]) -> Result<()> {
    let dest = root.join(relative);
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| io_error_with_path(e, parent))?;
    }
    tokio::fs::write(&dest, bytes)
        .await
        .map_err(|e| io_error_with_path(e, &dest))
}

fn validate_project_id(project_id: &str) -> Result<()> {
    Uuid::parse_str(project_id)
        .map(|_| ())
        .map_err(|_| Error::NotFound(format!("Project '{}'", project_id)))
}

/// Turns an untrusted upload path into a safe relative path.
///
/// Backslashes are treated as separators and `.` segments are dropped.
///
/// # Examples
///
/// ```
/// use autocss::project::sanitize_relative_path;
/// use std::path::PathBuf;
///
/// assert_eq!(
///     sanitize_relative_path("site\\css/./main.css").unwrap(),
///     PathBuf::from("site/css/main.css")
/// );
/// assert!(sanitize_relative_path("../etc/passwd").is_err());
/// assert!(sanitize_relative_path("/abs.html").is_err());
/// ```
pub fn sanitize_relative_path(raw: &str) -> Result<PathBuf> {
    let reject = |reason: &str| Err(Error::InvalidUpload(format!("{}: '{}'", reason, raw)));

    if raw.contains('\0') {
        return reject("Path contains a NUL byte");
    }
    let normalized = raw.replace('\\', "/");
    if normalized.starts_with('/') || Path::new(&normalized).has_root() {
        return reject("Absolute paths are not allowed");
    }

    let mut clean = PathBuf::new();
    for segment in normalized.split('/') {
        match segment {
            "" => return reject("Empty path segment"),
            "." => continue,
            ".." => return reject("Parent directory segments are not allowed"),
            // Drive letters and other prefixes.
            s if s.contains(':') => return reject("Path prefixes are not allowed"),
            s => clean.push(s),
        }
    }
    if clean.as_os_str().is_empty() {
        return reject("Empty file name");
    }
    debug_assert!(clean
        .components()
        .all(|c| matches!(c, Component::Normal(_))));
    Ok(clean)
}
