//! Fake VCS backends for tests that must not depend on a real checkout.

use std::fs;
use std::path::Path;
use std::time::Duration;

use shelf_git::{Error, RemoteMap, Result, VcsBackend, WorkingTreeStatus};

/// Operation names accepted by [`ScriptedVcs::time_out_on`].
pub const OPERATIONS: &[&str] = &[
    "clone", "fetch", "checkout", "rev-parse", "describe", "remote", "status", "diff",
];

/// Backend answering every query from fixed values.
///
/// `clone` creates the destination directory so later existence checks see
/// it. One operation can be made to time out.
#[derive(Debug, Clone, Default)]
pub struct ScriptedVcs {
    pub description: String,
    pub commit: String,
    pub remotes: RemoteMap,
    pub status: WorkingTreeStatus,
    pub diff: String,
    timeout_on: Option<&'static str>,
}

impl ScriptedVcs {
    pub fn at(description: &str, commit: &str) -> Self {
        Self {
            description: description.to_string(),
            commit: commit.to_string(),
            ..Self::default()
        }
    }

    pub fn with_remote(mut self, name: &str, url: &str) -> Self {
        self.remotes.insert(name.to_string(), url.to_string());
        self
    }

    /// Make `operation` (one of [`OPERATIONS`]) fail with a timeout.
    pub fn time_out_on(mut self, operation: &'static str) -> Self {
        assert!(OPERATIONS.contains(&operation), "unknown operation {operation}");
        self.timeout_on = Some(operation);
        self
    }

    fn check(&self, operation: &str) -> Result<()> {
        if self.timeout_on == Some(operation) {
            return Err(Error::Timeout {
                command: operation.to_string(),
                timeout: Duration::from_secs(1),
            });
        }
        Ok(())
    }
}

impl VcsBackend for ScriptedVcs {
    fn clone_repo(&self, _url: &str, dest: &Path) -> Result<()> {
        self.check("clone")?;
        fs::create_dir_all(dest).map_err(Error::Spawn)
    }

    fn fetch(&self, _workdir: &Path) -> Result<()> {
        self.check("fetch")
    }

    fn checkout(&self, _workdir: &Path, _reference: &str) -> Result<()> {
        self.check("checkout")
    }

    fn rev_parse_head(&self, _workdir: &Path) -> Result<String> {
        self.check("rev-parse")?;
        Ok(self.commit.clone())
    }

    fn describe_head(&self, _workdir: &Path) -> Result<String> {
        self.check("describe")?;
        Ok(self.description.clone())
    }

    fn remotes(&self, _workdir: &Path) -> Result<RemoteMap> {
        self.check("remote")?;
        Ok(self.remotes.clone())
    }

    fn status(&self, _workdir: &Path) -> Result<WorkingTreeStatus> {
        self.check("status")?;
        Ok(self.status.clone())
    }

    fn diff(&self, _workdir: &Path) -> Result<String> {
        self.check("diff")?;
        Ok(self.diff.clone())
    }
}

/// Backend that panics on any call, for asserting a code path never
/// reaches version control.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnreachableVcs;

impl VcsBackend for UnreachableVcs {
    fn clone_repo(&self, url: &str, _dest: &Path) -> Result<()> {
        panic!("unexpected clone of {url}")
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        panic!("unexpected fetch in {}", workdir.display())
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()> {
        panic!("unexpected checkout of {reference} in {}", workdir.display())
    }

    fn rev_parse_head(&self, workdir: &Path) -> Result<String> {
        panic!("unexpected rev-parse in {}", workdir.display())
    }

    fn describe_head(&self, workdir: &Path) -> Result<String> {
        panic!("unexpected describe in {}", workdir.display())
    }

    fn remotes(&self, workdir: &Path) -> Result<RemoteMap> {
        panic!("unexpected remote listing in {}", workdir.display())
    }

    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus> {
        panic!("unexpected status in {}", workdir.display())
    }

    fn diff(&self, workdir: &Path) -> Result<String> {
        panic!("unexpected diff in {}", workdir.display())
    }
}
