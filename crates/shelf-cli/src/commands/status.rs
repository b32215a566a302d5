//! Status command implementation

use colored::Colorize;
use serde_json::json;
use shelf_core::{DriftReport, RunOptions};
use shelf_fs::LocalFs;

use super::{finish, print_rejected, rejected_json};
use crate::context::ShelfContext;
use crate::error::Result;

/// Abbreviated commit ids in human output.
const SHORT_COMMIT: usize = 10;

/// Run the status command
pub fn run_status(ctx: &ShelfContext, json: bool) -> Result<()> {
    let shelf = ctx.load_shelf()?;
    let vcs = ctx.vcs(0)?;
    let report = shelf.status(vcs.as_ref(), &LocalFs, &RunOptions::default())?;

    if json {
        let books: Vec<_> = report
            .outcomes
            .iter()
            .map(|outcome| match &outcome.result {
                Ok(status) => json!({ "book": outcome.book.as_str(), "status": status }),
                Err(e) => json!({ "book": outcome.book.as_str(), "error": e.to_string(), "kind": e.kind() }),
            })
            .collect();
        let output = json!({
            "books": books,
            "rejected": rejected_json(&shelf),
            "in_sync": report.is_success()
                && shelf.rejected().is_empty()
                && report.successes().all(|(_, status)| status.is_ok()),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(status) => print_status(outcome.book.as_str(), status),
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

fn print_status(book: &str, status: &DriftReport) {
    match status {
        DriftReport::Missing => println!("  {} {}  {}", "-".red(), book, "missing".red()),
        DriftReport::Clean => println!("  {} {}  {}", "=".green(), book, "clean".dimmed()),
        DriftReport::Dirty { changes } => {
            println!("  {} {}  {}", "M".yellow(), book, "local changes".yellow());
            for change in changes {
                println!("      {change}");
            }
        }
        DriftReport::WrongReference {
            actual,
            commit,
            expected,
        } => println!(
            "  {} {}  on {} ({}), expected {}",
            "!".yellow().bold(),
            book,
            actual.cyan(),
            short(commit),
            expected.cyan()
        ),
        DriftReport::Correct { target } => {
            println!("  {} {}  -> {}", "=".green(), book, target.dimmed())
        }
        DriftReport::Incorrect { actual, expected } => println!(
            "  {} {}  -> {}, expected {}",
            "!".yellow().bold(),
            book,
            actual,
            expected.cyan()
        ),
    }
}

fn short(commit: &str) -> &str {
    commit.get(..SHORT_COMMIT).unwrap_or(commit)
}
