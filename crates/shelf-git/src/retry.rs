//! Retry decorator for network-bound backend calls

use std::path::Path;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;

use crate::provider::{RemoteMap, VcsBackend, WorkingTreeStatus};
use crate::{Error, Result};

/// Wraps a [`VcsBackend`] and retries transient clone and fetch failures
/// with exponential backoff.
///
/// Every other call goes straight to the inner backend. Checkout, status and
/// the queries are local operations where a retry would only repeat the
/// same answer.
#[derive(Debug, Clone)]
pub struct RetryingBackend<B> {
    inner: B,
    max_attempts: u32,
    initial_interval: Duration,
    max_elapsed: Duration,
}

impl<B: VcsBackend> RetryingBackend<B> {
    /// Retry up to `max_attempts` times in total (1 means no retry).
    pub fn new(inner: B, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            initial_interval: Duration::from_millis(500),
            max_elapsed: Duration::from_secs(120),
        }
    }

    pub fn with_initial_interval(mut self, interval: Duration) -> Self {
        self.initial_interval = interval;
        self
    }

    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    fn with_retries<T>(&self, what: &str, mut op: impl FnMut() -> Result<T>) -> Result<T> {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_interval)
            .with_max_elapsed_time(Some(self.max_elapsed))
            .build();

        let mut attempt = 0u32;
        backoff::retry(policy, || {
            attempt += 1;
            op().map_err(|e| {
                if e.is_transient() && attempt < self.max_attempts {
                    tracing::warn!(operation = what, attempt, error = %e, "Retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        })
        .map_err(|e| match e {
            backoff::Error::Permanent(err) => err,
            backoff::Error::Transient { err, .. } => err,
        })
    }
}

impl<B: VcsBackend> VcsBackend for RetryingBackend<B> {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        self.with_retries("clone", || self.inner.clone_repo(url, dest))
    }

    fn fetch(&self, workdir: &Path) -> Result<()> {
        self.with_retries("fetch", || self.inner.fetch(workdir))
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> Result<()> {
        self.inner.checkout(workdir, reference)
    }

    fn rev_parse_head(&self, workdir: &Path) -> Result<String> {
        self.inner.rev_parse_head(workdir)
    }

    fn describe_head(&self, workdir: &Path) -> Result<String> {
        self.inner.describe_head(workdir)
    }

    fn remotes(&self, workdir: &Path) -> Result<RemoteMap> {
        self.inner.remotes(workdir)
    }

    fn status(&self, workdir: &Path) -> Result<WorkingTreeStatus> {
        self.inner.status(workdir)
    }

    fn diff(&self, workdir: &Path) -> Result<String> {
        self.inner.diff(workdir)
    }
}
