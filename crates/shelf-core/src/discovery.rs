//! Reverse discovery: synthesize books from a live tree
//!
//! Raw walk order follows the operating system's directory listing order
//! and is not stable across filesystems. Use [`DiscoveryReport::sort`]
//! before emitting a manifest.

use std::path::Path;

use shelf_fs::{Filesystem, NormalizedPath, ShelfPath};
use shelf_git::VcsBackend;
use walkdir::{DirEntry, WalkDir};

use crate::book::Book;
use crate::error::Step;
use crate::{Error, Result};

/// Remote preferred when a repository has several.
const PREFERRED_REMOTE: &str = "origin";

/// Books found under a root plus the repositories that could not be described.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Book paths are relative to the discovery root
    pub books: Vec<Book>,
    pub failures: Vec<Error>,
}

impl DiscoveryReport {
    /// Order books by path.
    pub fn sort(&mut self) {
        self.books.sort_by(|a, b| a.path().cmp(b.path()));
    }
}

/// Walks a directory tree looking for checkouts and symlinks.
pub struct Discoverer<'a> {
    vcs: &'a dyn VcsBackend,
    fs: &'a dyn Filesystem,
}

impl<'a> Discoverer<'a> {
    pub fn new(vcs: &'a dyn VcsBackend, fs: &'a dyn Filesystem) -> Self {
        Self { vcs, fs }
    }

    /// Walk `root` and build a book for every repository and symlink found.
    ///
    /// A repository is recognised by a regular `.git/config` file below the
    /// root (the root's own metadata is ignored). Its reference is the
    /// current commit id, or the `describe` name when `use_branch` is set.
    /// Every symlink becomes a link book with its literal target.
    ///
    /// One repository failing (no remote, backend error) never stops the
    /// walk; the failure is collected in the report.
    pub fn discover(&self, root: &Path, use_branch: bool) -> DiscoveryReport {
        let mut report = DiscoveryReport::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .min_depth(1)
            .into_iter()
            .filter_entry(|entry| !inside_git_metadata(entry));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(source) => {
                    tracing::warn!(error = %source, "Skipping unreadable entry");
                    report.failures.push(Error::Walk {
                        root: root.to_path_buf(),
                        source,
                    });
                    continue;
                }
            };

            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = NormalizedPath::new(relative);

            if entry.file_type().is_file()
                && let Some(repo) = repository_of(&relative)
            {
                tracing::debug!(repo = %repo, "Found repository");
                match self.describe_repository(&repo, &root.join(repo.as_str()), use_branch) {
                    Ok(book) => report.books.push(book),
                    Err(e) => {
                        tracing::warn!(repo = %repo, error = %e, "Could not describe repository");
                        report.failures.push(e);
                    }
                }
            }

            if entry.path_is_symlink() {
                match self.describe_link(&relative, entry.path()) {
                    Ok(book) => report.books.push(book),
                    Err(e) => report.failures.push(e),
                }
            }
        }

        tracing::info!(
            root = %root.display(),
            books = report.books.len(),
            failures = report.failures.len(),
            "Discovery finished"
        );
        report
    }

    fn describe_repository(
        &self,
        repo: &NormalizedPath,
        workdir: &Path,
        use_branch: bool,
    ) -> Result<Book> {
        let remotes = self
            .vcs
            .remotes(workdir)
            .map_err(|e| Error::backend(repo, Step::RemoteList, e))?;
        // BTreeMap order makes the fallback the lexicographically first remote.
        let url = remotes
            .get(PREFERRED_REMOTE)
            .or_else(|| remotes.values().next())
            .ok_or_else(|| Error::NoRemoteConfigured { repo: repo.clone() })?;

        let reference = if use_branch {
            self.vcs
                .describe_head(workdir)
                .map_err(|e| Error::backend(repo, Step::Describe, e))?
        } else {
            self.vcs
                .rev_parse_head(workdir)
                .map_err(|e| Error::backend(repo, Step::RevParse, e))?
        };

        Book::git_repo(repo.clone(), url.clone(), reference)
    }

    fn describe_link(&self, relative: &NormalizedPath, at: &Path) -> Result<Book> {
        let target = self
            .fs
            .read_link(at)
            .map_err(|e| Error::filesystem(relative, Step::ReadLink, e))?;
        tracing::debug!(link = %relative, target = %target.display(), "Found link");
        Book::symbolic_link(relative.clone(), target)
    }
}

/// Keep `.git/config` but do not descend into the rest of a `.git` directory.
fn inside_git_metadata(entry: &DirEntry) -> bool {
    let in_git_dir = entry
        .path()
        .parent()
        .and_then(Path::file_name)
        .is_some_and(|name| name == ShelfPath::GitDir.as_str());
    in_git_dir && entry.file_name() != "config"
}

/// `a/b/.git/config` names repository `a/b`. The root's own `.git/config`
/// names nothing.
fn repository_of(relative: &NormalizedPath) -> Option<NormalizedPath> {
    let marker = format!("/{}", ShelfPath::GitConfig.as_str());
    relative
        .as_str()
        .strip_suffix(&marker)
        .filter(|repo| !repo.is_empty())
        .map(NormalizedPath::new)
}
