//! Project-level lock
//!
//! Only one podbuilder invocation may touch a project's scratch directory,
//! prebuilt artifacts and records at a time. The lock is an OS-level advisory
//! lock on `PodBuilder/.podbuilder.lock`, released when the guard is dropped.
//! A second invocation fails immediately instead of waiting.

use fs4::fs_std::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::LockError;

/// Guard holding the project lock
#[derive(Debug)]
pub struct ProjectLock {
    /// Lock is held while this handle is open
    _file: File,
    path: PathBuf,
}

impl Drop for ProjectLock {
    fn drop(&mut self) {
        tracing::debug!("Project lock released: {}", self.path.display());
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::debug!("Failed to remove lock file: {e}");
            }
        }
    }
}

impl ProjectLock {
    /// Take the lock at `path` or fail with [`LockError::ConcurrentRun`]
    pub fn acquire(path: &Path) -> Result<Self, LockError> {
        let create_failed = |error: String| LockError::CreateFailed {
            path: path.to_path_buf(),
            error,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| create_failed(e.to_string()))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)
            .map_err(|e| create_failed(e.to_string()))?;

        match file.try_lock_exclusive() {
            Ok(true) => {
                tracing::debug!("Project lock acquired: {}", path.display());
                Ok(Self {
                    _file: file,
                    path: path.to_path_buf(),
                })
            }
            Ok(false) => Err(LockError::ConcurrentRun {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Err(LockError::ConcurrentRun {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(create_failed(e.to_string())),
        }
    }

    /// Lock file location
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_second_acquire_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("PodBuilder/.podbuilder.lock");

        let lock = ProjectLock::acquire(&path).unwrap();
        assert!(lock.path().exists());
        let err = ProjectLock::acquire(&path).unwrap_err();
        assert!(matches!(err, LockError::ConcurrentRun { .. }));
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".podbuilder.lock");
        {
            let _lock = ProjectLock::acquire(&path).unwrap();
        }
        assert!(!path.exists());
        assert!(ProjectLock::acquire(&path).is_ok());
    }
}
