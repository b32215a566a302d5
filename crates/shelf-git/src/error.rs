//! Error types for shelf-git

use std::path::PathBuf;
use std::time::Duration;

/// Result type for shelf-git operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in shelf-git operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    #[error("Filesystem error: {0}")]
    Fs(#[from] shelf_fs::Error),

    #[error("Not a git repository: {path}")]
    NotARepository { path: PathBuf },

    #[error("Reference '{reference}' not found")]
    ReferenceNotFound { reference: String },

    #[error("Clone of {url} failed: {message}")]
    CloneFailed { url: String, message: String },

    #[error("Fetch from remote '{remote}' failed: {message}")]
    FetchFailed { remote: String, message: String },

    #[error("`git {command}` failed (exit code {code}): {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to run git: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("`git {command}` timed out after {timeout:?}")]
    Timeout { command: String, timeout: Duration },
}

impl Error {
    /// Whether the backend gave up waiting on the operation.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Whether repeating the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CloneFailed { .. }
                | Self::FetchFailed { .. }
                | Self::CommandFailed { .. }
                | Self::Timeout { .. }
        )
    }
}
