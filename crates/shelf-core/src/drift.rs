//! Read-only drift reporting
//!
//! Nothing here mutates the filesystem or a checkout.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use shelf_fs::{Filesystem, NormalizedPath};
use shelf_git::VcsBackend;

use crate::book::{Book, BookKind};
use crate::error::Step;
use crate::position::HeadPosition;
use crate::{Error, Result};

/// Status of one book against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DriftReport {
    /// Nothing at the path (or, for a link book, no symlink there)
    Missing,
    /// On the declared reference with no pending changes
    Clean,
    /// On the declared reference with local changes
    Dirty { changes: Vec<String> },
    WrongReference {
        actual: String,
        commit: String,
        expected: String,
    },
    /// Link points at the declared target
    Correct { target: String },
    Incorrect { actual: String, expected: String },
}

/// What `reconcile` would do for a book in a given state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PendingAction {
    Clone,
    FetchCheckout,
    CreateLink,
    Relink,
}

impl fmt::Display for PendingAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Clone => "clone",
            Self::FetchCheckout => "fetch+checkout",
            Self::CreateLink => "create link",
            Self::Relink => "relink",
        })
    }
}

impl DriftReport {
    /// Whether the book matches its declared state with nothing to report.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Clean | Self::Correct { .. })
    }

    /// The reconcile step this state calls for, if any. Local changes in a
    /// checkout are not something reconcile touches.
    pub fn pending_action(&self, book: &Book) -> Option<PendingAction> {
        match (self, book.kind()) {
            (Self::Missing, BookKind::GitRepo { .. }) => Some(PendingAction::Clone),
            (Self::Missing, BookKind::SymbolicLink { .. }) => Some(PendingAction::CreateLink),
            (Self::WrongReference { .. }, _) => Some(PendingAction::FetchCheckout),
            (Self::Incorrect { .. }, _) => Some(PendingAction::Relink),
            _ => None,
        }
    }
}

/// Diff of one book against the filesystem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "kebab-case")]
pub enum DiffReport {
    Missing,
    Clean,
    Changes { diff: String },
    Correct { target: String },
    Incorrect { actual: String, expected: String },
}

/// Computes [`DriftReport`]s and [`DiffReport`]s.
pub struct DriftReporter<'a> {
    vcs: &'a dyn VcsBackend,
    fs: &'a dyn Filesystem,
}

/// Shared by `status` and `diff`, which agree for links.
enum LinkState {
    Missing,
    Correct(String),
    Incorrect { actual: String, expected: String },
}

impl<'a> DriftReporter<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, fs: &'a dyn Filesystem) -> Self {
        Self { vcs, fs }
    }

    pub fn status(&self, book: &Book) -> Result<DriftReport> {
        let path = book.path();
        match book.kind() {
            BookKind::GitRepo { reference, .. } => {
                let workdir = path.to_native();
                if !self.fs.exists(&workdir) {
                    tracing::warn!(book = %path, "Book does not exist");
                    return Ok(DriftReport::Missing);
                }

                let head = HeadPosition::read(self.vcs, path, &workdir)?;
                if !head.is_at(reference) {
                    tracing::warn!(
                        book = %path,
                        actual = %head.description,
                        commit = %head.commit,
                        expected = %reference,
                        "Book is on the wrong reference"
                    );
                    return Ok(DriftReport::WrongReference {
                        actual: head.description,
                        commit: head.commit,
                        expected: reference.clone(),
                    });
                }

                let status = self
                    .vcs
                    .status(&workdir)
                    .map_err(|e| Error::backend(path, Step::Status, e))?;
                if status.is_clean() {
                    Ok(DriftReport::Clean)
                } else {
                    Ok(DriftReport::Dirty {
                        changes: status.changes().to_vec(),
                    })
                }
            }
            BookKind::SymbolicLink { target } => Ok(match self.link_state(path, target)? {
                LinkState::Missing => DriftReport::Missing,
                LinkState::Correct(target) => DriftReport::Correct { target },
                LinkState::Incorrect { actual, expected } => {
                    DriftReport::Incorrect { actual, expected }
                }
            }),
        }
    }

    /// The action `reconcile` would take for `book`.
    ///
    /// Fails with [`Error::UnexpectedPathType`] where reconcile would refuse
    /// the path.
    pub fn plan(&self, book: &Book) -> Result<Option<PendingAction>> {
        let at = book.path().to_native();
        let expected = match book.kind() {
            BookKind::GitRepo { .. } if self.fs.exists(&at) && !self.fs.is_dir(&at) => {
                Some("a repository directory")
            }
            BookKind::SymbolicLink { .. } if self.fs.exists(&at) && !self.fs.is_symlink(&at) => {
                Some("a symbolic link")
            }
            _ => None,
        };
        if let Some(expected) = expected {
            return Err(Error::UnexpectedPathType {
                path: book.path().clone(),
                expected,
            });
        }

        Ok(self.status(book)?.pending_action(book))
    }

    pub fn diff(&self, book: &Book) -> Result<DiffReport> {
        let path = book.path();
        match book.kind() {
            BookKind::GitRepo { .. } => {
                let workdir = path.to_native();
                if !self.fs.exists(&workdir) {
                    return Ok(DiffReport::Missing);
                }
                let diff = self
                    .vcs
                    .diff(&workdir)
                    .map_err(|e| Error::backend(path, Step::Diff, e))?;
                if diff.is_empty() {
                    Ok(DiffReport::Clean)
                } else {
                    Ok(DiffReport::Changes { diff })
                }
            }
            BookKind::SymbolicLink { target } => Ok(match self.link_state(path, target)? {
                LinkState::Missing => DiffReport::Missing,
                LinkState::Correct(target) => DiffReport::Correct { target },
                LinkState::Incorrect { actual, expected } => DiffReport::Incorrect { actual, expected },
            }),
        }
    }

    fn link_state(&self, path: &NormalizedPath, target: &Path) -> Result<LinkState> {
        let at = path.to_native();
        if !self.fs.is_symlink(&at) {
            return Ok(LinkState::Missing);
        }

        let actual = self
            .fs
            .read_link(&at)
            .map_err(|e| Error::filesystem(path, Step::ReadLink, e))?;
        if actual == target {
            Ok(LinkState::Correct(target.display().to_string()))
        } else {
            tracing::warn!(
                book = %path,
                actual = %actual.display(),
                expected = %target.display(),
                "Link points elsewhere"
            );
            Ok(LinkState::Incorrect {
                actual: actual.display().to_string(),
                expected: target.display().to_string(),
            })
        }
    }
}
