//! Backend that shells out to the `git` executable

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use shelf_fs::{Filesystem, LocalFs};

use crate::provider::{RemoteMap, VcsBackend, WorkingTreeStatus};
use crate::{Error, Result};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How [`GitCliBackend`] reads working-tree status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusMode {
    /// `git status --porcelain`; any output line is a change
    #[default]
    Porcelain,
    /// Plain `git status`, matched against the "nothing to commit" phrases
    HumanText,
}

/// [`VcsBackend`] running `git` subprocesses with an explicit working directory.
///
/// Uses the user's git configuration, so credential helpers and SSH agents
/// work as they do on the command line.
#[derive(Debug, Clone)]
pub struct GitCliBackend {
    program: PathBuf,
    timeout: Option<Duration>,
    status_mode: StatusMode,
}

impl Default for GitCliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl GitCliBackend {
    pub fn new() -> Self {
        Self {
            program: PathBuf::from("git"),
            timeout: None,
            status_mode: StatusMode::default(),
        }
    }

    /// Use a specific git executable.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill any invocation that runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_status_mode(mut self, mode: StatusMode) -> Self {
        self.status_mode = mode;
        self
    }

    /// Whether the configured executable can be run at all.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn run(&self, workdir: Option<&Path>, args: &[&str]) -> Result<String> {
        let command = args.join(" ");
        let mut cmd = Command::new(&self.program);
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }
        cmd.args(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::trace!(command = %command, "Running git");
        let output = match self.timeout {
            None => cmd.output().map_err(Error::Spawn)?,
            Some(limit) => {
                let child = cmd.spawn().map_err(Error::Spawn)?;
                wait_with_timeout(child, limit, &command)?
            }
        };

        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).to_string())
        } else {
            Err(Error::CommandFailed {
                command,
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            })
        }
    }
}

fn drain(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    buffer
}

fn wait_with_timeout(mut child: Child, limit: Duration, command: &str) -> Result<Output> {
    // Pipes are drained on their own threads so a chatty child cannot block
    // on a full pipe while we poll.
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    let stdout_reader = thread::spawn(move || drain(stdout));
    let stderr_reader = thread::spawn(move || drain(stderr));

    let deadline = Instant::now() + limit;
    let status = loop {
        if let Some(status) = child.try_wait().map_err(Error::Spawn)? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            tracing::warn!(command = %command, timeout = ?limit, "git invocation timed out");
            return Err(Error::Timeout {
                command: command.to_string(),
                timeout: limit,
            });
        }
        thread::sleep(POLL_INTERVAL);
    };

    Ok(Output {
        status,
        stdout: stdout_reader.join().unwrap_or_default(),
        stderr: stderr_reader.join().unwrap_or_default(),
    })
}

/// Remove whatever a failed clone left at `dest`; a killed `git clone`
/// leaves its directory behind.
pub(crate) fn discard_partial_clone(dest: &Path) {
    if dest.symlink_metadata().is_err() {
        return;
    }
    match std::fs::remove_dir_all(dest) {
        Ok(()) => tracing::debug!(dest = %dest.display(), "Removed partial clone"),
        Err(e) => {
            tracing::warn!(dest = %dest.display(), error = %e, "Could not remove partial clone")
        }
    }
}

fn first_line(text: &str) -> String {
    text.lines().next().unwrap_or("").trim().to_string()
}

impl VcsBackend for GitCliBackend {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        if let Some(parent) = dest.parent() {
            LocalFs.make_dirs(parent)?;
        }
        let existed = dest.symlink_metadata().is_ok();
        let target = dest.to_string_lossy();
        let result = self
            .run(None, &["clone", "--quiet", "--", url, &target])
            .map_err(|e| match e {
                Error::CommandFailed { stderr, .. } => Error::CloneFailed {
                    url: url.to_string(),
                    message: stderr,
                },
                other => other,
            });
        if result.is_err() && !existed {
            discard_partial_clone(dest);
        }
        result.map(|_| ())
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        self.run(Some(workdir), &["fetch", "--all", "--tags", "--quiet"])
            .map_err(|e| match e {
                Error::CommandFailed { stderr, .. } => Error::FetchFailed {
                    remote: "--all".to_string(),
                    message: stderr,
                },
                other => other,
            })?;
        Ok(())
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()> {
        self.run(Some(workdir), &["checkout", "--quiet", reference, "--"])?;
        Ok(())
    }

    fn rev_parse_head(&self, workdir: &Path) -> Result<String> {
        let output = self.run(Some(workdir), &["rev-parse", "HEAD"])?;
        Ok(first_line(&output))
    }

    fn describe_head(&self, workdir: &Path) -> Result<String> {
        if let Ok(branch) = self.run(Some(workdir), &["symbolic-ref", "--quiet", "--short", "HEAD"]) {
            return Ok(first_line(&branch));
        }

        let tags = self.run(Some(workdir), &["tag", "--points-at", "HEAD"])?;
        let tag = first_line(&tags);
        if !tag.is_empty() {
            return Ok(tag);
        }

        let description = self.run(
            Some(workdir),
            &["describe", "--all", "--always", "--abbrev=4", "HEAD"],
        )?;
        Ok(first_line(&description))
    }

    fn remotes(&self, workdir: &Path) -> Result<RemoteMap> {
        let output = self.run(Some(workdir), &["remote", "-v"])?;
        Ok(parse_remote_verbose(&output))
    }

    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus> {
        match self.status_mode {
            StatusMode::Porcelain => {
                let output = self.run(Some(workdir), &["status", "--porcelain"])?;
                Ok(WorkingTreeStatus::from_porcelain(&output))
            }
            StatusMode::HumanText => {
                let output = self.run(Some(workdir), &["status"])?;
                Ok(WorkingTreeStatus::from_human_text(&output))
            }
        }
    }

    fn diff(&self, workdir: &Path) -> Result<String> {
        self.run(Some(workdir), &["diff"])
    }
}

/// Parse `git remote -v` output into name -> fetch URL.
fn parse_remote_verbose(output: &str) -> RemoteMap {
    let mut remotes = RemoteMap::new();
    for line in output.lines() {
        let mut fields = line.split_whitespace();
        if let (Some(name), Some(url)) = (fields.next(), fields.next()) {
            remotes
                .entry(name.to_string())
                .or_insert_with(|| url.to_string());
        }
    }
    remotes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_remote_verbose() {
        let output = "origin\thttps://example.com/foo.git (fetch)\n\
                      origin\thttps://example.com/foo.git (push)\n\
                      other\tgit@example.com:foo.git (fetch)\n";
        let remotes = parse_remote_verbose(output);
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes["origin"], "https://example.com/foo.git");
        assert_eq!(remotes["other"], "git@example.com:foo.git");
    }

    #[test]
    fn test_parse_remote_verbose_empty() {
        assert!(parse_remote_verbose("").is_empty());
    }

    #[test]
    fn test_missing_program_is_spawn_error() {
        let backend = GitCliBackend::new().with_program("/nonexistent/git-binary");
        assert!(!backend.is_available());

        let result = backend.rev_parse_head(Path::new("."));
        assert!(matches!(result, Err(Error::Spawn(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_timeout_kills_slow_command() {
        // `sleep 5` stands in for a hung git.
        let backend = GitCliBackend::new()
            .with_program("sleep")
            .with_timeout(Duration::from_millis(100));
        let started = Instant::now();
        let result = backend.run(None, &["5"]);

        assert!(matches!(result, Err(Error::Timeout { .. })));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
