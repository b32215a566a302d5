//! Git abstraction for gitshelf
//!
//! Every operation takes the repository directory it acts on, so callers
//! never depend on the process working directory. Two interchangeable
//! backends are provided:
//!
//! - [`LibGitBackend`] runs everything in-process through `git2`
//! - [`GitCliBackend`] shells out to the `git` executable, with an optional
//!   per-invocation timeout
//!
//! [`RetryingBackend`] wraps either one with a backoff policy for the
//! network operations.

pub mod cli;
pub mod error;
pub mod libgit;
pub mod provider;
pub mod retry;
pub mod url;

pub use cli::{GitCliBackend, StatusMode};
pub use error::{Error, Result};
pub use libgit::LibGitBackend;
pub use provider::{RemoteMap, VcsBackend, WorkingTreeStatus};
pub use retry::RetryingBackend;
pub use url::RemoteUrl;
