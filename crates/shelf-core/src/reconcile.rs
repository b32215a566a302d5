//! Converging on-disk state toward a book
//!
//! Reconciling is idempotent: once a book has converged, a second pass
//! only reads (exists, is-symlink, read-link, describe, rev-parse and the
//! optional remote listing) and performs no mutating call.

use std::path::Path;

use serde::Serialize;
use shelf_fs::{Filesystem, NormalizedPath};
use shelf_git::{RemoteUrl, VcsBackend};

use crate::book::{Book, BookKind};
use crate::error::Step;
use crate::position::HeadPosition;
use crate::{Error, Result};

/// A mutation performed while reconciling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "kebab-case")]
pub enum Action {
    Cloned { url: String },
    Fetched,
    CheckedOut { reference: String },
    Linked { target: String },
    Relinked { previous: String, target: String },
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cloned { url } => write!(f, "cloned {url}"),
            Self::Fetched => write!(f, "fetched"),
            Self::CheckedOut { reference } => write!(f, "checked out {reference}"),
            Self::Linked { target } => write!(f, "linked to {target}"),
            Self::Relinked { previous, target } => {
                write!(f, "relinked from {previous} to {target}")
            }
        }
    }
}

/// None of the checkout's remotes point at the declared URL.
///
/// Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteMismatch {
    pub expected: String,
    pub found: Vec<String>,
}

/// Outcome of reconciling one book.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Mutations performed, in order
    pub actions: Vec<Action>,
    pub remote_mismatch: Option<RemoteMismatch>,
}

impl ReconcileReport {
    /// Whether the book was already in its desired state.
    pub fn is_unchanged(&self) -> bool {
        self.actions.is_empty()
    }
}

/// Brings one book at a time into its desired state.
///
/// Holds no state between books; every backend call names the path it
/// acts on.
pub struct Reconciler<'a> {
    vcs: &'a dyn VcsBackend,
    fs: &'a dyn Filesystem,
}

impl<'a> Reconciler<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, fs: &'a dyn Filesystem) -> Self {
        Self { vcs, fs }
    }

    /// Make the filesystem match `book`.
    ///
    /// # Errors
    ///
    /// - [`Error::UnexpectedPathType`] when something other than what the
    ///   book manages occupies its path
    /// - [`Error::CheckoutFailed`] when the reference cannot be checked out
    /// - [`Error::Backend`] / [`Error::BackendTimeout`] /
    ///   [`Error::Filesystem`] naming the failing step
    pub fn reconcile(&self, book: &Book) -> Result<ReconcileReport> {
        match book.kind() {
            BookKind::GitRepo {
                remote_url,
                reference,
                verify_remote,
            } => self.reconcile_repo(book.path(), remote_url, reference, *verify_remote),
            BookKind::SymbolicLink { target } => self.reconcile_link(book.path(), target),
        }
    }

    fn reconcile_repo(
        &self,
        path: &NormalizedPath,
        url: &str,
        reference: &str,
        verify_remote: bool,
    ) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let workdir = path.to_native();

        if !self.fs.exists(&workdir) {
            tracing::info!(book = %path, url = %url, reference = %reference, "Cloning book");
            self.vcs
                .clone_repo(url, &workdir)
                .map_err(|e| Error::backend(path, Step::Clone, e))?;
            report.actions.push(Action::Cloned {
                url: url.to_string(),
            });
        } else if !self.fs.is_dir(&workdir) {
            return Err(Error::UnexpectedPathType {
                path: path.clone(),
                expected: "a repository directory",
            });
        } else {
            tracing::debug!(book = %path, "Book already exists");
        }

        if verify_remote {
            report.remote_mismatch = self.verify_remote(path, &workdir, url)?;
        }

        let head = HeadPosition::read(self.vcs, path, &workdir)?;
        if head.is_at(reference) {
            tracing::debug!(book = %path, reference = %reference, "Already on reference");
            return Ok(report);
        }

        tracing::info!(
            book = %path,
            current = %head.description,
            commit = %head.commit,
            reference = %reference,
            "Switching reference"
        );
        self.vcs
            .fetch(&workdir)
            .map_err(|e| Error::backend(path, Step::Fetch, e))?;
        report.actions.push(Action::Fetched);

        self.vcs
            .checkout(&workdir, reference)
            .map_err(|source| {
                if source.is_timeout() {
                    Error::backend(path, Step::Checkout, source)
                } else {
                    Error::CheckoutFailed {
                        book: path.clone(),
                        reference: reference.to_string(),
                        source,
                    }
                }
            })?;
        report.actions.push(Action::CheckedOut {
            reference: reference.to_string(),
        });

        Ok(report)
    }

    fn verify_remote(
        &self,
        path: &NormalizedPath,
        workdir: &Path,
        url: &str,
    ) -> Result<Option<RemoteMismatch>> {
        let remotes = self
            .vcs
            .remotes(workdir)
            .map_err(|e| Error::backend(path, Step::RemoteList, e))?;
        let expected = RemoteUrl::parse(url);

        if remotes
            .values()
            .any(|candidate| RemoteUrl::parse(candidate) == expected)
        {
            tracing::debug!(book = %path, url = %url, "Remote verified");
            return Ok(None);
        }

        tracing::warn!(book = %path, expected = %url, "No configured remote matches the declared URL");
        Ok(Some(RemoteMismatch {
            expected: url.to_string(),
            found: remotes.into_values().collect(),
        }))
    }

    fn reconcile_link(&self, path: &NormalizedPath, target: &Path) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let at = path.to_native();

        if !self.fs.is_symlink(&at) {
            if self.fs.exists(&at) {
                return Err(Error::UnexpectedPathType {
                    path: path.clone(),
                    expected: "a symbolic link",
                });
            }
            if let Some(parent) = path.parent() {
                self.fs
                    .make_dirs(&parent.to_native())
                    .map_err(|e| Error::filesystem(path, Step::MakeDirs, e))?;
            }
            tracing::info!(book = %path, target = %target.display(), "Creating link");
            self.fs
                .create_symlink(target, &at)
                .map_err(|e| Error::filesystem(path, Step::CreateLink, e))?;
            report.actions.push(Action::Linked {
                target: target.display().to_string(),
            });
            return Ok(report);
        }

        let current = self
            .fs
            .read_link(&at)
            .map_err(|e| Error::filesystem(path, Step::ReadLink, e))?;
        if current == target {
            tracing::debug!(book = %path, target = %target.display(), "Link already correct");
            return Ok(report);
        }

        tracing::info!(
            book = %path,
            from = %current.display(),
            to = %target.display(),
            "Correcting link"
        );
        self.fs
            .remove_entry(&at)
            .map_err(|e| Error::filesystem(path, Step::RemoveLink, e))?;
        self.fs
            .create_symlink(target, &at)
            .map_err(|e| Error::filesystem(path, Step::CreateLink, e))?;
        report.actions.push(Action::Relinked {
            previous: current.display().to_string(),
            target: target.display().to_string(),
        });

        Ok(report)
    }
}
