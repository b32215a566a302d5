//! Backend trait for version-control operations

use std::collections::BTreeMap;
use std::path::Path;

use crate::Result;

/// Configured remotes of a repository, keyed by remote name.
///
/// Ordered so that "first remote" is well defined.
pub type RemoteMap = BTreeMap<String, String>;

/// Phrases `git status` prints for a tree with nothing pending.
const CLEAN_PHRASES: &[&str] = &[
    "nothing to commit, working tree clean",
    "nothing to commit, working directory clean",
];

/// Pending changes in a working tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkingTreeStatus {
    /// One entry per changed path, `XY path` in porcelain style
    changes: Vec<String>,
}

impl WorkingTreeStatus {
    /// Build from already formatted change entries.
    pub fn from_entries(changes: Vec<String>) -> Self {
        Self { changes }
    }

    /// Parse `git status --porcelain` output. Any non-blank line is a change.
    pub fn from_porcelain(text: &str) -> Self {
        let changes = text
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| line.trim_end().to_string())
            .collect();
        Self { changes }
    }

    /// Parse human-readable `git status` output.
    ///
    /// Fallback for tools that cannot produce porcelain output: the tree is
    /// clean iff one of the known "nothing to commit" phrases appears.
    /// Tab-indented lines are taken as the changed paths; if there are none
    /// the whole text is kept as a single change.
    pub fn from_human_text(text: &str) -> Self {
        if CLEAN_PHRASES.iter().any(|phrase| text.contains(phrase)) {
            return Self::default();
        }

        let mut changes: Vec<String> = text
            .lines()
            .filter(|line| line.starts_with('\t'))
            .map(|line| line.trim().to_string())
            .collect();
        if changes.is_empty() {
            changes.push(text.trim().to_string());
        }
        Self { changes }
    }

    /// Whether the backend reported no pending changes.
    pub fn is_clean(&self) -> bool {
        self.changes.is_empty()
    }

    /// The individual change entries.
    pub fn changes(&self) -> &[String] {
        &self.changes
    }

    /// All change entries, newline separated.
    pub fn summary(&self) -> String {
        self.changes.join("\n")
    }
}

/// Repository operations the reconciler, drift reporter and discovery use.
///
/// `workdir` is always the root of the checkout being operated on. Outputs
/// are treated as opaque beyond what each method documents.
pub trait VcsBackend: Send + Sync {
    /// Clone `url` into `dest`, creating parent directories as needed.
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;

    /// Fetch branches and tags from every configured remote.
    fn fetch(&self, workdir: &Path) -> Result<()>;

    /// Check out a branch, tag or commit id.
    ///
    /// A branch that only exists on a remote gets a local tracking branch.
    /// Fails without touching the working tree when the reference is unknown.
    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()>;

    /// Full commit id of HEAD.
    fn rev_parse_head(&self, workdir: &Path) -> Result<String>;

    /// Symbolic description of HEAD: the branch name when on a branch,
    /// else a tag pointing at HEAD, else a `describe --all` style name.
    fn describe_head(&self, workdir: &Path) -> Result<String>;

    /// Configured remotes and their URLs.
    fn remotes(&self, workdir: &Path) -> Result<RemoteMap>;

    /// Pending changes in the working tree.
    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus>;

    /// Unstaged changes as a textual patch. Empty means no changes.
    fn diff(&self, workdir: &Path) -> Result<String>;
}

impl<T: VcsBackend + ?Sized> VcsBackend for Box<T> {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        (**self).clone_repo(url, dest)
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        (**self).fetch(workdir)
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()> {
        (**self).checkout(workdir, reference)
    }

    fn rev_parse_head(&self, workdir: &Path) -> Result<String> {
        (**self).rev_parse_head(workdir)
    }

    fn describe_head(&self, workdir: &Path) -> Result<String> {
        (**self).describe_head(workdir)
    }

    fn remotes(&self, workdir: &Path) -> Result<RemoteMap> {
        (**self).remotes(workdir)
    }

    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus> {
        (**self).status(workdir)
    }

    fn diff(&self, workdir: &Path) -> Result<String> {
        (**self).diff(workdir)
    }
}
