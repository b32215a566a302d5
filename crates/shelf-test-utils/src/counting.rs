//! Backend wrappers that count mutating calls.
//!
//! Used to assert that a second reconcile of an already converged shelf
//! performs no clone, fetch, checkout or link mutation.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use shelf_fs::Filesystem;
use shelf_git::{RemoteMap, VcsBackend, WorkingTreeStatus};

/// Counts of mutating VCS calls.
#[derive(Debug, Default)]
pub struct VcsCounts {
    pub clones: AtomicUsize,
    pub fetches: AtomicUsize,
    pub checkouts: AtomicUsize,
}

impl VcsCounts {
    /// Total of all mutating calls so far.
    pub fn mutations(&self) -> usize {
        self.clones.load(Ordering::SeqCst)
            + self.fetches.load(Ordering::SeqCst)
            + self.checkouts.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.clones.store(0, Ordering::SeqCst);
        self.fetches.store(0, Ordering::SeqCst);
        self.checkouts.store(0, Ordering::SeqCst);
    }
}

/// [`VcsBackend`] decorator recording clone, fetch and checkout calls.
pub struct CountingVcs<B> {
    inner: B,
    pub counts: VcsCounts,
}

impl<B: VcsBackend> CountingVcs<B> {
    pub fn new(inner: B) -> Self {
        Self {
            inner,
            counts: VcsCounts::default(),
        }
    }
}

impl<B: VcsBackend> VcsBackend for CountingVcs<B> {
    fn clone_repo(&self, url: &str, dest: &Path) -> shelf_git::Result<()> {
        self.counts.clones.fetch_add(1, Ordering::SeqCst);
        self.inner.clone_repo(url, dest)
    }

    fn fetch(&self, workdir: &Path) -> shelf_git::Result<()> {
        self.counts.fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch(workdir)
    }

    fn checkout(&self, workdir: &Path, reference: &str) -> shelf_git::Result<()> {
        self.counts.checkouts.fetch_add(1, Ordering::SeqCst);
        self.inner.checkout(workdir, reference)
    }

    fn rev_parse_head(&self, workdir: &Path) -> shelf_git::Result<String> {
        self.inner.rev_parse_head(workdir)
    }

    fn describe_head(&self, workdir: &Path) -> shelf_git::Result<String> {
        self.inner.describe_head(workdir)
    }

    fn remotes(&self, workdir: &Path) -> shelf_git::Result<RemoteMap> {
        self.inner.remotes(workdir)
    }

    fn status(&self, workdir: &Path) -> shelf_git::Result<WorkingTreeStatus> {
        self.inner.status(workdir)
    }

    fn diff(&self, workdir: &Path) -> shelf_git::Result<String> {
        self.inner.diff(workdir)
    }
}

/// Counts of mutating filesystem calls.
#[derive(Debug, Default)]
pub struct FsCounts {
    pub links_created: AtomicUsize,
    pub entries_removed: AtomicUsize,
    pub dirs_made: AtomicUsize,
}

impl FsCounts {
    pub fn mutations(&self) -> usize {
        self.links_created.load(Ordering::SeqCst)
            + self.entries_removed.load(Ordering::SeqCst)
            + self.dirs_made.load(Ordering::SeqCst)
    }
}

/// [`Filesystem`] decorator recording symlink and directory mutations.
pub struct CountingFs<F> {
    inner: F,
    pub counts: FsCounts,
}

impl<F: Filesystem> CountingFs<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            counts: FsCounts::default(),
        }
    }
}

impl<F: Filesystem> Filesystem for CountingFs<F> {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.inner.is_symlink(path)
    }

    fn read_link(&self, path: &Path) -> shelf_fs::Result<PathBuf> {
        self.inner.read_link(path)
    }

    fn create_symlink(&self, target: &Path, at: &Path) -> shelf_fs::Result<()> {
        self.counts.links_created.fetch_add(1, Ordering::SeqCst);
        self.inner.create_symlink(target, at)
    }

    fn remove_entry(&self, path: &Path) -> shelf_fs::Result<()> {
        self.counts.entries_removed.fetch_add(1, Ordering::SeqCst);
        self.inner.remove_entry(path)
    }

    fn make_dirs(&self, path: &Path) -> shelf_fs::Result<()> {
        self.counts.dirs_made.fetch_add(1, Ordering::SeqCst);
        self.inner.make_dirs(path)
    }
}
