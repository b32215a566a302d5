//! Diff command implementation
//!
//! Prints the uncommitted changes of every checkout and the state of every
//! link.

use colored::Colorize;
use serde_json::json;
use shelf_core::{DiffReport, RunOptions};
use shelf_fs::LocalFs;

use super::{finish, print_rejected, rejected_json};
use crate::context::ShelfContext;
use crate::error::Result;

/// Run the diff command
pub fn run_diff(ctx: &ShelfContext, json: bool) -> Result<()> {
    let shelf = ctx.load_shelf()?;
    let vcs = ctx.vcs(0)?;
    let report = shelf.diff(vcs.as_ref(), &LocalFs, &RunOptions::default())?;

    if json {
        let books: Vec<_> = report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(diff) => json!({ "book": outcome.book.as_str(), "diff": diff }),
                Err(e) => json!({ "book": outcome.book.as_str(), "error": e.to_string(), "kind": e.kind() }),
            })
            .collect();
        let output = json!({
            "books": books,
            "rejected": rejected_json(&shelf),
            "has_changes": report
                .successes()
                .any(|(_, diff)| !matches!(diff, DiffReport::Clean | DiffReport::Correct { .. })),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(DiffReport::Changes { diff }) => {
                    println!("{} {}", "==>".cyan().bold(), outcome.book.to_string().bold());
                    print!("{diff}");
                    if !diff.ends_with('\n') {
                        println!();
                    }
                }
                Ok(DiffReport::Clean) => {
                    println!("{} {}  {}", "==>".cyan().bold(), outcome.book, "clean".dimmed())
                }
                Ok(DiffReport::Missing) => {
                    println!("{} {}  {}", "==>".cyan().bold(), outcome.book, "missing".red())
                }
                Ok(DiffReport::Correct { target }) => {
                    println!("{} {}  -> {}", "==>".cyan().bold(), outcome.book, target.dimmed())
                }
                Ok(DiffReport::Incorrect { actual, expected }) => println!(
                    "{} {}  -> {}, expected {}",
                    "==>".cyan().bold(),
                    outcome.book,
                    actual.red(),
                    expected
                ),
                Err(e) => println!("  {} {}  {}", "x".red().bold(), outcome.book, e),
            }
        }
        print_rejected(&shelf);
    }

    finish(
        report.failed() + shelf.rejected().len(),
        report.total() + shelf.rejected().len(),
    )
}
