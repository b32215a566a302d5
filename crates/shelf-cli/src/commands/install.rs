//! Install command implementation
//!
//! Reconciles every book, or with `--dry-run` reports what would be done.

use colored::Colorize;
use shelf_core::{Action, ReconcileReport, RunOptions, Shelf};
use shelf_fs::LocalFs;

use super::{finish, print_rejected};
use crate::context::ShelfContext;
use crate::error::Result;

/// Run the install command
pub fn run_install(ctx: &ShelfContext, dry_run: bool, jobs: usize, retries: u32) -> Result<()> {
    let shelf = ctx.load_shelf()?;
    let options = RunOptions { jobs };

    if dry_run {
        return run_plan(ctx, &shelf, &options);
    }

    let vcs = ctx.vcs(retries)?;
    let report = shelf.install(vcs.as_ref(), &LocalFs, &options)?;

    let mut changed = 0;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(result) => {
                if !result.is_unchanged() {
                    changed += 1;
                }
                println!("  {} {}  {}", symbol(result), outcome.book, describe(result));
                if let Some(mismatch) = &result.remote_mismatch {
                    println!(
                        "      {} expected {}, found {}",
                        "remote mismatch:".yellow(),
                        mismatch.expected,
                        if mismatch.found.is_empty() {
                            "no remotes".to_string()
                        } else {
                            mismatch.found.join(", ")
                        }
                    );
                }
            }
            Err(e) => println!("  {} {}  {}", "x".red().bold(), outcome.book, e),
        }
    }
    print_rejected(&shelf);

    let failed = report.failed() + shelf.rejected().len();
    let total = report.total() + shelf.rejected().len();
    println!();
    println!(
        "{} books, {} changed, {} failed",
        total,
        changed,
        if failed > 0 {
            failed.to_string().red().to_string()
        } else {
            failed.to_string()
        }
    );
    finish(failed, total)
}

fn run_plan(ctx: &ShelfContext, shelf: &Shelf, options: &RunOptions) -> Result<()> {
    let vcs = ctx.vcs(0)?;
    let report = shelf.plan(vcs.as_ref(), &LocalFs, options)?;

    println!("{}", "Dry run: nothing will be changed".bold());
    let mut pending = 0;
    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(Some(action)) => {
                pending += 1;
                println!("  {} {}  would {}", "+".green(), outcome.book, action);
            }
            Ok(None) => println!("  {} {}  {}", "=".dimmed(), outcome.book, "up to date".dimmed()),
            Err(e) => println!("  {} {}  {}", "x".red().bold(), outcome.book, e),
        }
    }
    print_rejected(shelf);

    println!();
    println!("{} of {} books need changes", pending, report.total());
    finish(
        report.failed() + shelf.rejected().len(),
        report.total() + shelf.rejected().len(),
    )
}

fn symbol(report: &ReconcileReport) -> colored::ColoredString {
    if report.remote_mismatch.is_some() {
        "!".yellow().bold()
    } else if report.is_unchanged() {
        "=".dimmed()
    } else {
        "+".green()
    }
}

/// One-line summary of what reconciling a book did.
fn describe(report: &ReconcileReport) -> String {
    if report.is_unchanged() {
        return "up to date".to_string();
    }
    report
        .actions
        .iter()
        .map(Action::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
