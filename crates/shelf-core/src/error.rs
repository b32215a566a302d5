//! Error types for shelf-core

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;
use shelf_fs::NormalizedPath;

/// Result type for shelf-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// The backend or filesystem call a book failed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Clone,
    Fetch,
    Checkout,
    Describe,
    RevParse,
    RemoteList,
    Status,
    Diff,
    ReadLink,
    MakeDirs,
    CreateLink,
    RemoveLink,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Fetch => "fetch",
            Self::Checkout => "checkout",
            Self::Describe => "describe",
            Self::RevParse => "rev-parse",
            Self::RemoteList => "remote-list",
            Self::Status => "status",
            Self::Diff => "diff",
            Self::ReadLink => "read-link",
            Self::MakeDirs => "make-dirs",
            Self::CreateLink => "create-link",
            Self::RemoveLink => "remove-link",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that can occur in shelf-core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A manifest entry names both a git source and a link target, or neither
    #[error("Book '{path}' must set exactly one of `git` or `link`")]
    AmbiguousOrMissingSource { path: String },

    #[error("Book path must not be empty")]
    EmptyPath,

    /// Checkout of the declared reference failed; the working tree is untouched
    #[error("{book}: checkout of '{reference}' failed: {source}")]
    CheckoutFailed {
        book: NormalizedPath,
        reference: String,
        #[source]
        source: shelf_git::Error,
    },

    /// Refusing to replace something that is not what the book manages
    #[error("{path}: expected {expected}, found something else")]
    UnexpectedPathType {
        path: NormalizedPath,
        expected: &'static str,
    },

    #[error("{repo}: repository has no remote configured")]
    NoRemoteConfigured { repo: NormalizedPath },

    #[error("{book}: {step} timed out")]
    BackendTimeout {
        book: NormalizedPath,
        step: Step,
        #[source]
        source: shelf_git::Error,
    },

    #[error("{book}: {step} failed: {source}")]
    Backend {
        book: NormalizedPath,
        step: Step,
        #[source]
        source: shelf_git::Error,
    },

    #[error("{book}: {step} failed: {source}")]
    Filesystem {
        book: NormalizedPath,
        step: Step,
        #[source]
        source: shelf_fs::Error,
    },

    #[error("Discovery walk failed under {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Manifest not found at {path}")]
    ManifestNotFound { path: PathBuf },

    #[error("Invalid manifest {path}: {source}")]
    ManifestParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Unknown environment '{name}' (available: {available})")]
    UnknownEnvironment { name: String, available: String },

    #[error("Invalid token override '{spec}', expected NAME=VALUE")]
    InvalidToken { spec: String },

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error(transparent)]
    Fs(#[from] shelf_fs::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Attach book and step to a backend failure. Timeouts become
    /// [`Error::BackendTimeout`].
    pub fn backend(book: &NormalizedPath, step: Step, source: shelf_git::Error) -> Self {
        if source.is_timeout() {
            Self::BackendTimeout {
                book: book.clone(),
                step,
                source,
            }
        } else {
            Self::Backend {
                book: book.clone(),
                step,
                source,
            }
        }
    }

    /// Attach book and step to a filesystem failure.
    pub fn filesystem(book: &NormalizedPath, step: Step, source: shelf_fs::Error) -> Self {
        Self::Filesystem {
            book: book.clone(),
            step,
            source,
        }
    }

    /// Short machine-readable name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AmbiguousOrMissingSource { .. } => "ambiguous-or-missing-source",
            Self::EmptyPath => "empty-path",
            Self::CheckoutFailed { .. } => "checkout-failed",
            Self::UnexpectedPathType { .. } => "unexpected-path-type",
            Self::NoRemoteConfigured { .. } => "no-remote-configured",
            Self::BackendTimeout { .. } => "backend-timeout",
            Self::Backend { .. } => "backend-invocation-failed",
            Self::Filesystem { .. } => "filesystem",
            Self::Walk { .. } => "walk",
            Self::ManifestNotFound { .. } => "manifest-not-found",
            Self::ManifestParse { .. } => "manifest-parse",
            Self::UnknownEnvironment { .. } => "unknown-environment",
            Self::InvalidToken { .. } => "invalid-token",
            Self::ThreadPool(_) => "thread-pool",
            Self::Fs(_) => "filesystem",
            Self::Yaml(_) => "yaml",
        }
    }
}
