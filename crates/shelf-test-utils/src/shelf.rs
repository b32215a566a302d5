//! [`TestShelf`] builder for gitshelf workspace scenarios.

use std::fs;
use std::path::{Path, PathBuf};

use shelf_fs::ShelfPath;
use tempfile::TempDir;

use crate::git::{UpstreamRepo, head_commit};

/// A temporary directory holding a workspace and any number of upstream
/// repositories next to it.
///
/// ```text
/// <tmp>/workspace/        root() - books and gitshelf.yml live here
/// <tmp>/upstreams/<name>  repositories created by upstream()
/// ```
///
/// # Example
///
/// ```rust,no_run
/// use shelf_test_utils::shelf::TestShelf;
///
/// let shelf = TestShelf::new();
/// let foo = shelf.upstream("foo");
/// shelf.write_manifest(&format!("books:\n  - book: libs/foo\n    git: {}\n", foo.url()));
/// shelf.assert_not_exists("libs/foo");
/// ```
pub struct TestShelf {
    temp_dir: TempDir,
}

impl Default for TestShelf {
    fn default() -> Self {
        Self::new()
    }
}

impl TestShelf {
    /// Create an empty workspace.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("workspace")).unwrap();
        fs::create_dir_all(temp_dir.path().join("upstreams")).unwrap();
        Self { temp_dir }
    }

    /// The workspace root.
    pub fn root(&self) -> PathBuf {
        self.temp_dir.path().join("workspace")
    }

    /// Absolute path of `rel` inside the workspace.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root().join(rel)
    }

    /// Create an upstream repository with the standard fixture history.
    pub fn upstream(&self, name: &str) -> UpstreamRepo {
        let path = self.temp_dir.path().join("upstreams").join(name);
        fs::create_dir_all(&path).unwrap();
        UpstreamRepo::create(&path)
    }

    /// Write `gitshelf.yml` at the workspace root and return its path.
    pub fn write_manifest(&self, yaml: &str) -> PathBuf {
        let path = self.root().join(ShelfPath::Manifest);
        fs::write(&path, yaml).unwrap();
        path
    }

    /// Create a directory (and parents) inside the workspace.
    pub fn mkdir(&self, rel: &str) {
        fs::create_dir_all(self.path(rel)).unwrap();
    }

    /// Create a symlink at `rel` pointing to `target`, verbatim.
    #[cfg(unix)]
    pub fn symlink(&self, target: &str, rel: &str) {
        let at = self.path(rel);
        if let Some(parent) = at.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        std::os::unix::fs::symlink(target, at).unwrap();
    }

    /// Assert that `rel` is a symlink whose literal target is `expected`.
    ///
    /// # Panics
    /// Panics with a descriptive message otherwise.
    pub fn assert_symlink(&self, rel: &str, expected: &str) {
        let path = self.path(rel);
        let target = fs::read_link(&path)
            .unwrap_or_else(|e| panic!("Expected symlink at {}: {e}", path.display()));
        assert_eq!(
            target,
            Path::new(expected),
            "Symlink {} points to the wrong target",
            path.display()
        );
    }

    /// Assert that nothing exists at `rel` (dangling symlinks count as existing).
    pub fn assert_not_exists(&self, rel: &str) {
        let path = self.path(rel);
        assert!(
            fs::symlink_metadata(&path).is_err(),
            "Expected nothing at {}",
            path.display()
        );
    }

    /// Assert that the checkout at `rel` has HEAD at `commit`.
    pub fn assert_head(&self, rel: &str, commit: &str) {
        let path = self.path(rel);
        assert_eq!(
            head_commit(&path),
            commit,
            "Checkout {} is at the wrong commit",
            path.display()
        );
    }
}
