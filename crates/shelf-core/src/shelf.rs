//! Running an operation over every book of a manifest
//!
//! One book failing never stops the others; every outcome is collected in
//! a [`RunReport`].

use rayon::prelude::*;
use shelf_fs::{Filesystem, NormalizedPath};
use shelf_git::VcsBackend;

use crate::book::{Book, BookEntry, BookOptions};
use crate::drift::{DiffReport, DriftReport, DriftReporter, PendingAction};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::{Error, Result};

/// Options for a run over the shelf.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Number of books processed concurrently; 1 runs in order on the
    /// calling thread
    pub jobs: usize,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { jobs: 1 }
    }
}

/// A manifest entry that could not become a book.
#[derive(Debug)]
pub struct RejectedEntry {
    /// The entry's raw `book` field
    pub book: String,
    pub error: Error,
}

/// The result of one operation on one book.
#[derive(Debug)]
pub struct BookOutcome<T> {
    pub book: NormalizedPath,
    pub result: Result<T>,
}

/// Per-book outcomes of a run, in manifest order.
#[derive(Debug)]
pub struct RunReport<T> {
    pub outcomes: Vec<BookOutcome<T>>,
}

impl<T> RunReport<T> {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }

    /// Outcomes that succeeded, with their values.
    pub fn successes(&self) -> impl Iterator<Item = (&NormalizedPath, &T)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok().map(|value| (&o.book, value)))
    }

    /// Outcomes that failed, with their errors.
    pub fn failures(&self) -> impl Iterator<Item = (&NormalizedPath, &Error)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|error| (&o.book, error)))
    }
}

/// All books of a manifest plus the entries that were rejected.
#[derive(Debug, Default)]
pub struct Shelf {
    books: Vec<Book>,
    rejected: Vec<RejectedEntry>,
}

impl Shelf {
    /// Build books from manifest entries. Invalid entries are kept aside
    /// rather than failing the whole shelf.
    pub fn from_entries(entries: &[BookEntry], options: &BookOptions) -> Self {
        let mut shelf = Self::default();
        for entry in entries {
            match Book::from_entry(entry, options) {
                Ok(book) => shelf.books.push(book),
                Err(error) => {
                    tracing::error!(book = %entry.book, error = %error, "Rejecting manifest entry");
                    shelf.rejected.push(RejectedEntry {
                        book: entry.book.clone(),
                        error,
                    });
                }
            }
        }
        shelf
    }

    pub fn from_books(books: Vec<Book>) -> Self {
        Self {
            books,
            rejected: Vec::new(),
        }
    }

    pub fn books(&self) -> &[Book] {
        &self.books
    }

    pub fn rejected(&self) -> &[RejectedEntry] {
        &self.rejected
    }

    /// Reconcile every book.
    pub fn install(
        &self,
        vcs: &dyn VcsBackend,
        fs: &dyn Filesystem,
        options: &RunOptions,
    ) -> Result<RunReport<ReconcileReport>> {
        let reconciler = Reconciler::new(vcs, fs);
        self.run(options, |book| reconciler.reconcile(book))
    }

    /// What `install` would do, without doing it.
    pub fn plan(
        &self,
        vcs: &dyn VcsBackend,
        fs: &dyn Filesystem,
        options: &RunOptions,
    ) -> Result<RunReport<Option<PendingAction>>> {
        let reporter = DriftReporter::new(vcs, fs);
        self.run(options, |book| reporter.plan(book))
    }

    pub fn status(
        &self,
        vcs: &dyn VcsBackend,
        fs: &dyn Filesystem,
        options: &RunOptions,
    ) -> Result<RunReport<DriftReport>> {
        let reporter = DriftReporter::new(vcs, fs);
        self.run(options, |book| reporter.status(book))
    }

    pub fn diff(
        &self,
        vcs: &dyn VcsBackend,
        fs: &dyn Filesystem,
        options: &RunOptions,
    ) -> Result<RunReport<DiffReport>> {
        let reporter = DriftReporter::new(vcs, fs);
        self.run(options, |book| reporter.diff(book))
    }

    fn run<T, F>(&self, options: &RunOptions, op: F) -> Result<RunReport<T>>
    where
        T: Send,
        F: Fn(&Book) -> Result<T> + Sync,
    {
        let one = |book: &Book| {
            let _span = tracing::info_span!("book", path = %book.path()).entered();
            let result = op(book);
            if let Err(e) = &result {
                tracing::error!(error = %e, "Book failed");
            }
            BookOutcome {
                book: book.path().clone(),
                result,
            }
        };

        let outcomes = if options.jobs > 1 && self.books.len() > 1 {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(options.jobs)
                .build()?;
            pool.install(|| self.books.par_iter().map(one).collect())
        } else {
            self.books.iter().map(one).collect()
        };

        Ok(RunReport { outcomes })
    }
}
