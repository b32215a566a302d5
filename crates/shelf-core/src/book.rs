//! The book entity: desired state for one workspace path

use std::fmt;
use std::path::PathBuf;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use shelf_fs::{NormalizedPath, rebase, relative_link_target};

use crate::{Error, Result};

/// Reference checked out when an entry names none.
pub const DEFAULT_REFERENCE: &str = "master";

/// Raw fields of one manifest entry, as written in `gitshelf.yml`.
///
/// Empty strings count as absent so that a token that rendered to nothing
/// does not silently turn a link into a repository or vice versa.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookEntry {
    /// Workspace path of the book
    pub book: String,

    /// Clone URL, for repository books
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub git: Option<String>,

    /// Branch, tag or commit id to check out
    #[serde(
        default,
        deserialize_with = "scalar_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub branch: Option<String>,

    /// Symlink target, for link books
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,

    /// Skip comparing the on-disk remotes against `git`
    #[serde(default, skip_serializing_if = "is_false")]
    pub skiprepourlcheck: bool,
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Accept `branch: 1.0` and `branch: 2024` as well as quoted strings.
fn scalar_string<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Option<String>, D::Error> {
    match Option::<serde_yaml::Value>::deserialize(deserializer)? {
        None | Some(serde_yaml::Value::Null) => Ok(None),
        Some(serde_yaml::Value::String(s)) => Ok(Some(s)),
        Some(serde_yaml::Value::Number(n)) => Ok(Some(n.to_string())),
        Some(serde_yaml::Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!(
            "expected a branch, tag or commit id, found {other:?}"
        ))),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Settings applied to every entry of a manifest.
#[derive(Debug, Clone, Default)]
pub struct BookOptions {
    /// Alternate root that absolute book paths are moved under
    pub fakeroot: Option<NormalizedPath>,
    /// Disable remote verification for every book
    pub skip_remote_check: bool,
}

/// What a book is: a checkout or a symlink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookKind {
    GitRepo {
        remote_url: String,
        reference: String,
        /// Compare on-disk remotes against `remote_url` during reconcile
        verify_remote: bool,
    },
    SymbolicLink {
        /// Stored verbatim; relative targets resolve against the link's directory
        target: PathBuf,
    },
}

/// Desired state for one workspace path.
///
/// Immutable once built; reconciling changes the filesystem, never the book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Book {
    path: NormalizedPath,
    kind: BookKind,
}

impl Book {
    /// Build a book from a manifest entry, applying the fakeroot.
    ///
    /// The path is rebased under the fakeroot unless it starts with `.`.
    /// An absolute link target is rebased too and then expressed relative
    /// to the rebased book's directory, so the relocated tree stays
    /// self-consistent.
    pub fn from_entry(entry: &BookEntry, options: &BookOptions) -> Result<Self> {
        let raw_path = entry.book.trim();
        if raw_path.is_empty() {
            return Err(Error::EmptyPath);
        }
        let fakeroot = options.fakeroot.as_ref().filter(|root| !root.is_empty());
        let path = rebase(&NormalizedPath::new(raw_path), fakeroot);

        let kind = match (non_empty(&entry.git), non_empty(&entry.link)) {
            (Some(url), None) => BookKind::GitRepo {
                remote_url: url.to_string(),
                reference: non_empty(&entry.branch)
                    .unwrap_or(DEFAULT_REFERENCE)
                    .to_string(),
                verify_remote: !(entry.skiprepourlcheck || options.skip_remote_check),
            },
            (None, Some(link)) => {
                let literal = NormalizedPath::new(link);
                let target = match fakeroot {
                    Some(root) if literal.is_absolute() => {
                        let relocated = relative_link_target(&rebase(&literal, Some(root)), &path);
                        tracing::debug!(book = %path, target = %relocated, "Relocated absolute link target");
                        relocated.to_native()
                    }
                    _ => PathBuf::from(link),
                };
                BookKind::SymbolicLink { target }
            }
            _ => {
                return Err(Error::AmbiguousOrMissingSource {
                    path: raw_path.to_string(),
                });
            }
        };

        Ok(Self { path, kind })
    }

    /// A repository book with remote verification on.
    pub fn git_repo(
        path: impl Into<NormalizedPath>,
        remote_url: impl Into<String>,
        reference: impl Into<String>,
    ) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        Ok(Self {
            path,
            kind: BookKind::GitRepo {
                remote_url: remote_url.into(),
                reference: reference.into(),
                verify_remote: true,
            },
        })
    }

    /// A link book pointing at `target`, taken literally.
    pub fn symbolic_link(path: impl Into<NormalizedPath>, target: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if path.is_empty() {
            return Err(Error::EmptyPath);
        }
        Ok(Self {
            path,
            kind: BookKind::SymbolicLink {
                target: target.into(),
            },
        })
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }

    pub fn kind(&self) -> &BookKind {
        &self.kind
    }

    pub fn is_git_repo(&self) -> bool {
        matches!(self.kind, BookKind::GitRepo { .. })
    }

    /// Convert back into manifest form.
    pub fn to_entry(&self) -> BookEntry {
        match &self.kind {
            BookKind::GitRepo {
                remote_url,
                reference,
                verify_remote,
            } => BookEntry {
                book: self.path.to_string(),
                git: Some(remote_url.clone()),
                branch: Some(reference.clone()),
                link: None,
                skiprepourlcheck: !verify_remote,
            },
            BookKind::SymbolicLink { target } => BookEntry {
                book: self.path.to_string(),
                git: None,
                branch: None,
                link: Some(target.to_string_lossy().into_owned()),
                skiprepourlcheck: false,
            },
        }
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(book: &str) -> BookEntry {
        BookEntry {
            book: book.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_git_entry_defaults_to_master() {
        let book = Book::from_entry(
            &BookEntry {
                git: Some("https://example.com/foo.git".into()),
                ..entry("libs/foo")
            },
            &BookOptions::default(),
        )
        .unwrap();

        assert_eq!(
            book.kind(),
            &BookKind::GitRepo {
                remote_url: "https://example.com/foo.git".into(),
                reference: "master".into(),
                verify_remote: true,
            }
        );
    }

    #[test]
    fn test_empty_strings_count_as_absent() {
        let result = Book::from_entry(
            &BookEntry {
                git: Some(String::new()),
                link: Some("  ".into()),
                ..entry("libs/foo")
            },
            &BookOptions::default(),
        );
        assert!(matches!(result, Err(Error::AmbiguousOrMissingSource { .. })));
    }

    #[test]
    fn test_empty_path_rejected() {
        let result = Book::from_entry(
            &BookEntry {
                git: Some("u".into()),
                ..entry(" ")
            },
            &BookOptions::default(),
        );
        assert!(matches!(result, Err(Error::EmptyPath)));
    }

    #[test]
    fn test_branch_accepts_numbers() {
        let parsed: BookEntry = serde_yaml::from_str("book: a\ngit: u\nbranch: 2024\n").unwrap();
        assert_eq!(parsed.branch.as_deref(), Some("2024"));
    }
}
