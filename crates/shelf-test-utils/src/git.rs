//! Git repository fixtures.
//!
//! Everything is built in-process with `git2` so the fixtures work on
//! machines without a `git` executable. Tests that drive the CLI backend
//! should gate on [`git_available`].

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};

/// Tag placed on the first commit of an [`UpstreamRepo`].
pub const FIRST_TAG: &str = "v1.0";

/// Branch created at the first commit of an [`UpstreamRepo`].
pub const SIDE_BRANCH: &str = "develop";

/// Whether a `git` executable can be run.
pub fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Initialise an empty repository on `master` with a test identity.
///
/// # Panics
/// Panics if the repository cannot be created.
pub fn init_repo(path: &Path) -> Repository {
    let mut options = RepositoryInitOptions::new();
    options.initial_head("master");
    let repo = Repository::init_opts(path, &options)
        .unwrap_or_else(|e| panic!("init_repo: failed at {}: {e}", path.display()));
    {
        let mut config = repo
            .config()
            .unwrap_or_else(|e| panic!("init_repo: no config: {e}"));
        config
            .set_str("user.name", "Test User")
            .unwrap_or_else(|e| panic!("init_repo: set user.name: {e}"));
        config
            .set_str("user.email", "test@test.com")
            .unwrap_or_else(|e| panic!("init_repo: set user.email: {e}"));
    }
    repo
}

/// Write `name` with `content` and commit it on the current HEAD.
///
/// # Panics
/// Panics if any git operation fails.
pub fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo
        .workdir()
        .unwrap_or_else(|| panic!("commit_file: bare repository"));
    let file = workdir.join(name);
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).unwrap_or_else(|e| panic!("commit_file: mkdir: {e}"));
    }
    fs::write(&file, content).unwrap_or_else(|e| panic!("commit_file: write {name}: {e}"));

    let mut index = repo.index().unwrap_or_else(|e| panic!("commit_file: index: {e}"));
    index
        .add_path(Path::new(name))
        .unwrap_or_else(|e| panic!("commit_file: add {name}: {e}"));
    index.write().unwrap_or_else(|e| panic!("commit_file: index write: {e}"));
    let tree_id = index
        .write_tree()
        .unwrap_or_else(|e| panic!("commit_file: write tree: {e}"));
    let tree = repo
        .find_tree(tree_id)
        .unwrap_or_else(|e| panic!("commit_file: find tree: {e}"));

    let signature = Signature::now("Test User", "test@test.com")
        .unwrap_or_else(|e| panic!("commit_file: signature: {e}"));
    let parent = repo.head().ok().and_then(|head| head.peel_to_commit().ok());
    let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

    repo.commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)
        .unwrap_or_else(|e| panic!("commit_file: commit: {e}"))
}

/// Add a remote named `name` pointing at `url`.
///
/// # Panics
/// Panics if the remote cannot be created.
pub fn add_remote(workdir: &Path, name: &str, url: &str) {
    let repo = Repository::open(workdir)
        .unwrap_or_else(|e| panic!("add_remote: open {}: {e}", workdir.display()));
    repo.remote(name, url)
        .unwrap_or_else(|e| panic!("add_remote: create {name}: {e}"));
}

/// Modify `README.md` in a checkout without committing.
///
/// # Panics
/// Panics if the file cannot be written.
pub fn dirty_worktree(workdir: &Path) {
    fs::write(workdir.join("README.md"), "locally edited\n")
        .unwrap_or_else(|e| panic!("dirty_worktree: {e}"));
}

/// A source repository with a small, known history.
///
/// ```text
/// master:   first ── second
///              │
///              └── tag v1.0, branch develop
/// ```
pub struct UpstreamRepo {
    path: PathBuf,
    /// Commit id of the first (tagged) commit
    pub first_commit: String,
    /// Commit id of the tip of `master`
    pub second_commit: String,
}

impl UpstreamRepo {
    /// Create the repository at `path`.
    ///
    /// # Panics
    /// Panics if any git operation fails.
    pub fn create(path: &Path) -> Self {
        let repo = init_repo(path);

        let first = commit_file(&repo, "README.md", "first\n", "First commit");
        let first_commit = repo
            .find_commit(first)
            .unwrap_or_else(|e| panic!("UpstreamRepo: find first commit: {e}"));
        repo.tag_lightweight(FIRST_TAG, first_commit.as_object(), false)
            .unwrap_or_else(|e| panic!("UpstreamRepo: tag: {e}"));
        repo.branch(SIDE_BRANCH, &first_commit, false)
            .unwrap_or_else(|e| panic!("UpstreamRepo: branch: {e}"));

        let second = commit_file(&repo, "README.md", "second\n", "Second commit");

        Self {
            path: path.to_path_buf(),
            first_commit: first.to_string(),
            second_commit: second.to_string(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// URL suitable for cloning (the local path).
    pub fn url(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    /// Add a commit on `master` after clones were made. Returns its id.
    pub fn advance(&self, content: &str) -> String {
        let repo = Repository::open(&self.path)
            .unwrap_or_else(|e| panic!("UpstreamRepo::advance: open: {e}"));
        commit_file(&repo, "README.md", content, "Advance").to_string()
    }
}

/// Current HEAD commit id of the checkout at `workdir`.
///
/// # Panics
/// Panics if the repository has no HEAD.
pub fn head_commit(workdir: &Path) -> String {
    let repo = Repository::open(workdir)
        .unwrap_or_else(|e| panic!("head_commit: open {}: {e}", workdir.display()));
    let head = repo
        .head()
        .and_then(|head| head.peel_to_commit())
        .unwrap_or_else(|e| panic!("head_commit: {e}"));
    head.id().to_string()
}
