//! Filesystem operations
//!
//! Handles file and directory operations.

use std::ffi::OsStr;
use std::path::Path;
use walkdir::WalkDir;

use crate::error::FilesystemError;

/// Create a directory and all parent directories
pub fn create_dir_all(path: &Path) -> Result<(), FilesystemError> {
    std::fs::create_dir_all(path).map_err(|e| FilesystemError::CreateDir {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Remove a directory and all its contents
pub fn remove_dir_all(path: &Path) -> Result<(), FilesystemError> {
    if path.exists() {
        std::fs::remove_dir_all(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
    }
    Ok(())
}

/// Remove a file or directory, whichever `path` is
pub fn remove_path(path: &Path) -> Result<(), FilesystemError> {
    if path.is_dir() {
        remove_dir_all(path)
    } else if path.exists() {
        std::fs::remove_file(path).map_err(|e| FilesystemError::RemoveDir {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Wipe `path` and recreate it empty
pub fn reset_dir(path: &Path) -> Result<(), FilesystemError> {
    remove_dir_all(path)?;
    create_dir_all(path)
}

/// Empty `path` except for the entries named in `keep`, creating it if needed
pub fn reset_dir_except(path: &Path, keep: &[&OsStr]) -> Result<(), FilesystemError> {
    create_dir_all(path)?;
    let entries = std::fs::read_dir(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    for entry in entries {
        let entry = entry.map_err(|e| FilesystemError::ReadFile {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;
        if !keep.contains(&entry.file_name().as_os_str()) {
            remove_path(&entry.path())?;
        }
    }
    Ok(())
}

/// Write content to a file
pub fn write_file(path: &Path, content: &str) -> Result<(), FilesystemError> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    std::fs::write(path, content).map_err(|e| FilesystemError::WriteFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Read content from a file
pub fn read_file(path: &Path) -> Result<String, FilesystemError> {
    std::fs::read_to_string(path).map_err(|e| FilesystemError::ReadFile {
        path: path.to_path_buf(),
        error: e.to_string(),
    })
}

/// Copy a file or a whole directory tree to `to`, replacing what's there
pub fn copy_path(from: &Path, to: &Path) -> Result<(), FilesystemError> {
    let copy_error = |error: String| FilesystemError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        error,
    };

    remove_path(to)?;

    if from.is_file() {
        if let Some(parent) = to.parent() {
            create_dir_all(parent)?;
        }
        std::fs::copy(from, to).map_err(|e| copy_error(e.to_string()))?;
        return Ok(());
    }

    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| copy_error(e.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| copy_error(e.to_string()))?;
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            create_dir_all(&target)?;
        } else if entry.file_type().is_symlink() {
            let link = std::fs::read_link(entry.path()).map_err(|e| copy_error(e.to_string()))?;
            symlink(&link, &target).map_err(|e| copy_error(e.to_string()))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| copy_error(e.to_string()))?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(not(unix))]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::fs::copy(original, link).map(|_| ())
}
