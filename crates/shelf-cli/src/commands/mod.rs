//! Command implementations for gitshelf

pub mod completions;
pub mod diff;
pub mod discover;
pub mod install;
pub mod status;

pub use completions::run_completions;
pub use diff::run_diff;
pub use discover::run_discover;
pub use install::run_install;
pub use status::run_status;

use colored::Colorize;
use serde_json::{Value, json};
use shelf_core::Shelf;

use crate::error::{CliError, Result};

/// Print the manifest entries that could not become books.
fn print_rejected(shelf: &Shelf) {
    for rejected in shelf.rejected() {
        println!("  {} {}  {}", "x".red().bold(), rejected.book, rejected.error);
    }
}

fn rejected_json(shelf: &Shelf) -> Vec<Value> {
    shelf
        .rejected()
        .iter()
        .map(|r| json!({ "book": r.book, "error": r.error.to_string(), "kind": r.error.kind() }))
        .collect()
}

/// Turn a failure count into the command result.
fn finish(failed: usize, total: usize) -> Result<()> {
    if failed > 0 {
        return Err(CliError::BooksFailed { failed, total });
    }
    Ok(())
}
