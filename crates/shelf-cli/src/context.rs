//! Settings shared by every command, resolved from the global flags

use std::path::PathBuf;
use std::time::Duration;

use shelf_core::{BookOptions, Manifest, ManifestOptions, Shelf};
use shelf_fs::NormalizedPath;
use shelf_git::{GitCliBackend, LibGitBackend, RetryingBackend, VcsBackend};

use crate::cli::{BackendKind, GlobalArgs};
use crate::error::{CliError, Result};

/// What the global flags resolve to.
#[derive(Debug, Clone)]
pub struct ShelfContext {
    pub manifest_path: PathBuf,
    pub manifest_options: ManifestOptions,
    pub book_options: BookOptions,
    pub backend: BackendKind,
    pub timeout: Option<Duration>,
}

impl ShelfContext {
    pub fn from_args(args: &GlobalArgs) -> Self {
        Self {
            manifest_path: args.gitshelf.clone(),
            manifest_options: ManifestOptions {
                environment: args.environment.clone(),
                tokens: args.tokens.iter().cloned().collect(),
            },
            book_options: BookOptions {
                fakeroot: args.fakeroot.as_ref().map(NormalizedPath::new),
                skip_remote_check: args.skip_repo_url_check,
            },
            backend: args.backend,
            timeout: args.timeout.map(Duration::from_secs),
        }
    }

    /// Load the manifest and build its books.
    pub fn load_shelf(&self) -> Result<Shelf> {
        let manifest = Manifest::load(&self.manifest_path, &self.manifest_options)?;
        tracing::info!(
            manifest = %self.manifest_path.display(),
            environment = %manifest.environment,
            books = manifest.books.len(),
            "Loaded manifest"
        );
        Ok(Shelf::from_entries(&manifest.books, &self.book_options))
    }

    /// The selected backend, wrapped in a retry policy when `retries > 0`.
    pub fn vcs(&self, retries: u32) -> Result<Box<dyn VcsBackend>> {
        let backend: Box<dyn VcsBackend> = match self.backend {
            BackendKind::Libgit => {
                if self.timeout.is_some() {
                    tracing::warn!("--timeout only applies to the cli backend; ignoring");
                }
                Box::new(LibGitBackend::new())
            }
            BackendKind::Cli => {
                let mut cli = GitCliBackend::new();
                if !cli.is_available() {
                    return Err(CliError::user(
                        "the cli backend needs a `git` executable on PATH",
                    ));
                }
                if let Some(timeout) = self.timeout {
                    cli = cli.with_timeout(timeout);
                }
                Box::new(cli)
            }
        };

        if retries == 0 {
            return Ok(backend);
        }
        tracing::debug!(retries, "Retrying clone and fetch on transient failures");
        Ok(Box::new(RetryingBackend::new(backend, retries.saturating_add(1))))
    }
}
