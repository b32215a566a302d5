//! Shared test fixtures for the gitshelf workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`git`]: upstream repositories with known history, built with `git2`
//! - [`counting`]: backend wrappers that count mutating calls
//! - [`fake`]: scripted and unreachable VCS backends
//! - [`shelf`]: [`TestShelf`](shelf::TestShelf) workspace builder

pub mod counting;
pub mod fake;
pub mod git;
pub mod shelf;
