//! Book reconciliation, drift reporting and discovery for gitshelf
//!
//! A *book* is one manifest entry: a git checkout or a symlink at a
//! workspace path. This crate provides:
//!
//! - **Book entity**: validated desired state, with fakeroot relocation
//!   applied at construction
//! - **Reconciler**: idempotently brings the filesystem to a book's state
//! - **Drift reporter**: read-only status and diff
//! - **Discovery**: synthesizes books from an existing tree
//! - **Manifest**: `gitshelf.yml` parsing with environment tokens
//! - **Shelf**: runs any of the above over a whole manifest, collecting
//!   per-book failures
//!
//! # Architecture
//!
//! ```text
//!          gitshelf (CLI)
//!                |
//!           shelf-core
//!                |
//!        +-------+-------+
//!        |               |
//!    shelf-fs        shelf-git
//! ```
//!
//! Every filesystem and VCS call receives the path it acts on, so books are
//! independent and may be processed concurrently.
//!
//! # Example
//!
//! ```no_run
//! use shelf_core::{BookOptions, Manifest, ManifestOptions, RunOptions, Shelf};
//! use shelf_fs::LocalFs;
//! use shelf_git::LibGitBackend;
//!
//! fn example() -> shelf_core::Result<()> {
//!     let manifest = Manifest::load("gitshelf.yml".as_ref(), &ManifestOptions::default())?;
//!     let shelf = Shelf::from_entries(&manifest.books, &BookOptions::default());
//!     let report = shelf.install(&LibGitBackend::new(), &LocalFs, &RunOptions::default())?;
//!     println!("{} of {} books failed", report.failed(), report.total());
//!     Ok(())
//! }
//! ```

pub mod book;
pub mod config;
pub mod discovery;
pub mod drift;
pub mod error;
pub mod position;
pub mod reconcile;
pub mod shelf;

pub use book::{Book, BookEntry, BookKind, BookOptions, DEFAULT_REFERENCE};
pub use config::{Manifest, ManifestOptions, TokenMap, parse_token_override, render_manifest};
pub use discovery::{Discoverer, DiscoveryReport};
pub use drift::{DiffReport, DriftReport, DriftReporter, PendingAction};
pub use error::{Error, Result, Step};
pub use position::HeadPosition;
pub use reconcile::{Action, ReconcileReport, Reconciler, RemoteMismatch};
pub use shelf::{BookOutcome, RejectedEntry, RunOptions, RunReport, Shelf};
