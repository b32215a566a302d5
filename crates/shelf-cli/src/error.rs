//! Error types for the gitshelf CLI

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from shelf-core
    #[error(transparent)]
    Core(#[from] shelf_core::Error),

    /// Error from shelf-fs
    #[error(transparent)]
    Fs(#[from] shelf_fs::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Some books could not be processed; details were already printed
    #[error("{failed} of {total} books failed")]
    BooksFailed { failed: usize, total: usize },

    /// User-facing error with a message
    #[error("{message}")]
    User { message: String },
}

impl CliError {
    /// Create a new user error with the given message
    pub fn user(message: impl Into<String>) -> Self {
        Self::User {
            message: message.into(),
        }
    }
}
