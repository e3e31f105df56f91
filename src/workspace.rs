//! Per-job scratch directories.
//!
//! A [`Workspace`] owns one freshly created directory. It is removed recursively by
//! [`Workspace::close`] on the normal path and by `Drop` on every other path (early `?` return,
//! panic unwind), so no job ever leaks files or sees another job's files.

use std::path::{Path, PathBuf};

use crate::foundation::error::{ReelError, ReelResult};
use crate::job::model::JobId;

/// Allocates job workspaces under a root directory.
#[derive(Clone, Debug)]
pub struct WorkspaceManager {
    root: PathBuf,
}

impl WorkspaceManager {
    /// Manager rooted at `root` (created on demand).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Manager rooted at the OS temp directory.
    pub fn in_temp_dir() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// Root directory workspaces are created in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty directory exclusively owned by `job`.
    pub fn open(&self, job: &JobId) -> ReelResult<Workspace> {
        std::fs::create_dir_all(&self.root).map_err(|e| {
            ReelError::workspace(format!(
                "failed to create workspace root '{}': {e}",
                self.root.display()
            ))
        })?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("reelsmith-{job}-"))
            .tempdir_in(&self.root)
            .map_err(|e| {
                ReelError::workspace(format!("failed to create workspace for job '{job}': {e}"))
            })?;
        tracing::debug!(job = %job, dir = %dir.path().display(), "opened workspace");
        Ok(Workspace {
            job: job.clone(),
            dir: Some(dir),
            files: Vec::new(),
        })
    }
}

/// Scoped scratch directory of one job plus the files created in it.
#[derive(Debug)]
pub struct Workspace {
    job: JobId,
    dir: Option<tempfile::TempDir>,
    files: Vec<PathBuf>,
}

impl Workspace {
    /// Directory of this workspace.
    pub fn path(&self) -> &Path {
        // `dir` is only taken by `close`, which consumes `self`.
        self.dir.as_ref().map(|d| d.path()).unwrap_or(Path::new(""))
    }

    /// Owning job.
    pub fn job(&self) -> &JobId {
        &self.job
    }

    /// Reserve a unique path for a file named after `name` and track it.
    ///
    /// `name` must be a plain file name. Collisions get a numeric suffix.
    pub fn alloc(&mut self, name: &str) -> ReelResult<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ReelError::workspace(format!(
                "workspace file name '{name}' must be a plain file name"
            )));
        }
        let mut path = self.path().join(name);
        let mut n = 1u32;
        while self.files.contains(&path) || path.exists() {
            let (stem, ext) = split_name(name);
            path = self.path().join(match ext {
                Some(ext) => format!("{stem}_{n}.{ext}"),
                None => format!("{stem}_{n}"),
            });
            n += 1;
        }
        self.files.push(path.clone());
        Ok(path)
    }

    /// Allocate `name` and write `bytes` to it.
    pub fn write(&mut self, name: &str, bytes: &[u8]) -> ReelResult<PathBuf> {
        let path = self.alloc(name)?;
        std::fs::write(&path, bytes).map_err(|e| {
            ReelError::workspace(format!("failed to write '{}': {e}", path.display()))
        })?;
        Ok(path)
    }

    /// Paths handed out so far, in allocation order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Remove the directory tree. Called once on the normal exit path.
    pub fn close(mut self) -> ReelResult<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();
        dir.close().map_err(|e| {
            ReelError::workspace(format!(
                "failed to remove workspace '{}': {e}",
                path.display()
            ))
        })?;
        tracing::debug!(job = %self.job, dir = %path.display(), "closed workspace");
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            tracing::debug!(job = %self.job, dir = %dir.path().display(), "removing workspace on drop");
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                tracing::warn!(job = %self.job, dir = %path.display(), error = %e, "workspace cleanup failed");
            }
        }
    }
}

fn split_name(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

#[cfg(test)]
#[path = "../tests/unit/workspace/workspace.rs"]
mod tests;
