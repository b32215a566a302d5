//! In-process backend built on git2

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    AutotagOption, BranchType, Commit, DescribeFormatOptions, DescribeOptions, DiffFormat,
    ErrorCode, FetchOptions, Oid, Repository, Status, StatusOptions,
};
use shelf_fs::{Filesystem, LocalFs};

use crate::cli::discard_partial_clone;
use crate::provider::{RemoteMap, VcsBackend, WorkingTreeStatus};
use crate::{Error, Result};

/// [`VcsBackend`] that runs every operation through libgit2.
///
/// Authentication relies on whatever libgit2 can do without callbacks, so
/// it suits local paths and anonymous remotes best.
#[derive(Debug, Clone, Copy, Default)]
pub struct LibGitBackend;

impl LibGitBackend {
    pub fn new() -> Self {
        Self
    }
}

fn open(workdir: &Path) -> Result<Repository> {
    Repository::open(workdir).map_err(|e| {
        if e.code() == ErrorCode::NotFound {
            Error::NotARepository {
                path: workdir.to_path_buf(),
            }
        } else {
            Error::Git(e)
        }
    })
}

fn checkout_commit(repo: &Repository, commit: &Commit<'_>) -> Result<()> {
    let mut builder = CheckoutBuilder::new();
    builder.safe();
    repo.checkout_tree(commit.as_object(), Some(&mut builder))?;
    Ok(())
}

/// Find `<remote>/<name>` among the remote-tracking branches, `origin` first.
fn remote_tracking_commit<'r>(
    repo: &'r Repository,
    name: &str,
) -> Result<Option<(String, Commit<'r>)>> {
    let mut remotes: Vec<String> = repo
        .remotes()?
        .iter()
        .flatten()
        .map(str::to_string)
        .collect();
    remotes.sort_by_key(|remote| remote.as_str() != "origin");

    for remote in remotes {
        let shorthand = format!("{remote}/{name}");
        if let Ok(branch) = repo.find_branch(&shorthand, BranchType::Remote) {
            let commit = branch.get().peel_to_commit()?;
            return Ok(Some((shorthand, commit)));
        }
    }
    Ok(None)
}

fn tags_pointing_at(repo: &Repository, target: Oid) -> Result<Vec<String>> {
    let mut tags = Vec::new();
    for name in repo.tag_names(None)?.iter().flatten() {
        let object = repo.revparse_single(&format!("refs/tags/{name}"))?;
        if matches!(object.peel_to_commit(), Ok(commit) if commit.id() == target) {
            tags.push(name.to_string());
        }
    }
    tags.sort();
    Ok(tags)
}

fn status_code(status: Status) -> String {
    if status.is_conflicted() {
        return "UU".to_string();
    }
    if status.is_wt_new() && !status.is_index_new() {
        return "??".to_string();
    }

    let index = if status.is_index_new() {
        'A'
    } else if status.is_index_modified() {
        'M'
    } else if status.is_index_deleted() {
        'D'
    } else if status.is_index_renamed() {
        'R'
    } else if status.is_index_typechange() {
        'T'
    } else {
        ' '
    };
    let worktree = if status.is_wt_modified() {
        'M'
    } else if status.is_wt_deleted() {
        'D'
    } else if status.is_wt_renamed() {
        'R'
    } else if status.is_wt_typechange() {
        'T'
    } else {
        ' '
    };
    format!("{index}{worktree}")
}

impl VcsBackend for LibGitBackend {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            LocalFs.make_dirs(parent)?;
        }

        let existed = dest.symlink_metadata().is_ok();
        tracing::debug!(url = %url, dest = %dest.display(), "Cloning with libgit2");
        RepoBuilder::new().clone(url, dest).map_err(|e| {
            if !existed {
                discard_partial_clone(dest);
            }
            Error::CloneFailed {
                url: url.to_string(),
                message: e.message().to_string(),
            }
        })?;
        Ok(())
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        let repo = open(workdir)?;
        for name in repo.remotes()?.iter().flatten() {
            let mut remote = repo.find_remote(name)?;
            let mut options = FetchOptions::new();
            options.download_tags(AutotagOption::All);

            tracing::debug!(remote = %name, repo = %workdir.display(), "Fetching");
            remote
                .fetch(&[] as &[&str], Some(&mut options), None)
                .map_err(|e| Error::FetchFailed {
                    remote: name.to_string(),
                    message: e.message().to_string(),
                })?;
        }
        Ok(())
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()> {
        let repo = open(workdir)?;

        if let Ok(branch) = repo.find_branch(reference, BranchType::Local) {
            let commit = branch.get().peel_to_commit()?;
            let refname = format!("refs/heads/{reference}");
            checkout_commit(&repo, &commit)?;
            repo.set_head(&refname)?;
            return Ok(());
        }

        if let Some((upstream, commit)) = remote_tracking_commit(&repo, reference)? {
            checkout_commit(&repo, &commit)?;
            let mut branch = repo.branch(reference, &commit, false)?;
            branch.set_upstream(Some(upstream.as_str()))?;
            repo.set_head(&format!("refs/heads/{reference}"))?;
            tracing::debug!(branch = %reference, upstream = %upstream, "Created tracking branch");
            return Ok(());
        }

        let commit = repo
            .revparse_single(reference)
            .and_then(|object| object.peel_to_commit())
            .map_err(|_| Error::ReferenceNotFound {
                reference: reference.to_string(),
            })?;
        checkout_commit(&repo, &commit)?;
        repo.set_head_detached(commit.id())?;
        Ok(())
    }

    fn rev_parse_head(&self, workdir: &Path) -> Result<String> {
        let repo = open(workdir)?;
        let id = repo.head()?.peel_to_commit()?.id();
        Ok(id.to_string())
    }

    fn describe_head(&self, workdir: &Path) -> Result<String> {
        let repo = open(workdir)?;
        let head = repo.head()?;
        if head.is_branch() {
            return Ok(head.shorthand().unwrap_or("HEAD").to_string());
        }

        let head_id = head.peel_to_commit()?.id();
        if let Some(tag) = tags_pointing_at(&repo, head_id)?.into_iter().next() {
            return Ok(tag);
        }

        let mut options = DescribeOptions::new();
        options.describe_all().show_commit_oid_as_fallback(true);
        let mut format = DescribeFormatOptions::new();
        format.abbreviated_size(4);
        let description = repo.describe(&options)?.format(Some(&format))?;
        Ok(description)
    }

    fn remotes(&self, workdir: &Path) -> Result<RemoteMap> {
        let repo = open(workdir)?;
        let mut remotes = RemoteMap::new();
        for name in repo.remotes()?.iter().flatten() {
            let remote = repo.find_remote(name)?;
            if let Some(url) = remote.url() {
                remotes.insert(name.to_string(), url.to_string());
            }
        }
        Ok(remotes)
    }

    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus> {
        let repo = open(workdir)?;
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(false)
            .exclude_submodules(true);

        let statuses = repo.statuses(Some(&mut options))?;
        let changes = statuses
            .iter()
            .map(|entry| {
                format!(
                    "{} {}",
                    status_code(entry.status()),
                    entry.path().unwrap_or("?")
                )
            })
            .collect();
        Ok(WorkingTreeStatus::from_entries(changes))
    }

    fn diff(&self, workdir: &Path) -> Result<String> {
        let repo = open(workdir)?;
        let diff = repo.diff_index_to_workdir(None, None)?;

        let mut text = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                text.push(line.origin());
            }
            text.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(text)
    }
}
