//! Filesystem capability and atomic writes

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::{Error, NormalizedPath, Result};

/// The filesystem operations the reconciler and drift reporter act through.
///
/// Every call names the path it operates on; nothing depends on the process
/// working directory beyond how the OS resolves relative paths.
pub trait Filesystem: Send + Sync {
    /// Whether anything (including a dangling symlink) occupies `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` resolves to a directory (symlinks followed).
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` itself is a symbolic link.
    fn is_symlink(&self, path: &Path) -> bool;

    /// Read the literal target of the symlink at `path`.
    fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Create a symlink at `at` pointing to `target`.
    ///
    /// `target` is stored verbatim; relative targets resolve against the
    /// directory containing `at`.
    fn create_symlink(&self, target: &Path, at: &Path) -> Result<()>;

    /// Remove a file or symlink. Directories are refused.
    fn remove_entry(&self, path: &Path) -> Result<()>;

    /// Recursively create `path`. Succeeds if the directory already exists.
    fn make_dirs(&self, path: &Path) -> Result<()>;
}

/// [`Filesystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl Filesystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        fs::symlink_metadata(path).is_ok()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn is_symlink(&self, path: &Path) -> bool {
        path.is_symlink()
    }

    fn read_link(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).map_err(|e| Error::io(path, e))
    }

    fn create_symlink(&self, target: &Path, at: &Path) -> Result<()> {
        tracing::debug!(link = %at.display(), target = %target.display(), "Creating symlink");
        symlink(target, at).map_err(|e| Error::io(at, e))
    }

    fn remove_entry(&self, path: &Path) -> Result<()> {
        let metadata = fs::symlink_metadata(path).map_err(|e| Error::io(path, e))?;
        if metadata.is_dir() {
            return Err(Error::IsADirectory {
                path: path.to_path_buf(),
            });
        }
        remove_link_or_file(path).map_err(|e| Error::io(path, e))
    }

    fn make_dirs(&self, path: &Path) -> Result<()> {
        if path.as_os_str().is_empty() {
            return Ok(());
        }
        match fs::create_dir_all(path) {
            Ok(()) => Ok(()),
            Err(_) if path.is_dir() => Ok(()),
            Err(e) if path.exists() => {
                tracing::debug!(path = %path.display(), error = %e, "Path blocks directory creation");
                Err(Error::NotADirectory {
                    path: path.to_path_buf(),
                })
            }
            Err(e) => Err(Error::io(path, e)),
        }
    }
}

#[cfg(unix)]
fn symlink(target: &Path, at: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, at)
}

#[cfg(windows)]
fn symlink(target: &Path, at: &Path) -> std::io::Result<()> {
    let resolved = at.parent().map(|p| p.join(target)).unwrap_or_else(|| target.to_path_buf());
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, at)
    } else {
        std::os::windows::fs::symlink_file(target, at)
    }
}

#[cfg(unix)]
fn remove_link_or_file(path: &Path) -> std::io::Result<()> {
    fs::remove_file(path)
}

#[cfg(windows)]
fn remove_link_or_file(path: &Path) -> std::io::Result<()> {
    // Directory symlinks on Windows are removed as directories.
    fs::remove_file(path).or_else(|_| fs::remove_dir(path))
}

/// Write content atomically to a file with locking.
///
/// Uses write-to-temp-then-rename strategy to prevent partial writes.
/// Acquires an advisory lock to prevent concurrent access.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let native_path = path.to_native();

    if let Some(parent) = native_path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }

    // Temp file lives in the same directory so the rename stays on one filesystem
    let temp_name = format!(
        ".{}.{}.tmp",
        native_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default(),
        std::process::id()
    );
    let temp_path = native_path.with_file_name(&temp_name);

    let mut temp_file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file
        .lock_exclusive()
        .map_err(|_| Error::LockFailed {
            path: native_path.clone(),
        })?;

    temp_file
        .write_all(content)
        .map_err(|e| Error::io(&temp_path, e))?;

    temp_file.sync_all().map_err(|e| Error::io(&temp_path, e))?;

    temp_file.unlock().map_err(|_| Error::LockFailed {
        path: native_path.clone(),
    })?;

    fs::rename(&temp_path, &native_path).map_err(|e| Error::io(&native_path, e))?;

    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}
