//! Discover command implementation
//!
//! Scans a directory tree and emits a manifest that reproduces it.

use std::path::Path;

use colored::Colorize;
use shelf_core::{Discoverer, render_manifest};
use shelf_fs::{LocalFs, NormalizedPath, write_text};

use super::finish;
use crate::context::ShelfContext;
use crate::error::{CliError, Result};

/// Run the discover command
///
/// Books are sorted by path so the output is stable. Repositories that
/// cannot be described are reported on stderr and make the command fail
/// after the manifest has been written.
pub fn run_discover(
    ctx: &ShelfContext,
    root: &Path,
    use_branch: bool,
    output: Option<&Path>,
) -> Result<()> {
    if !root.is_dir() {
        return Err(CliError::user(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let vcs = ctx.vcs(0)?;
    let mut report = Discoverer::new(vcs.as_ref(), &LocalFs).discover(root, use_branch);
    report.sort();
    let yaml = render_manifest(&report.books)?;

    match output {
        Some(path) => {
            write_text(&NormalizedPath::new(path), &yaml)?;
            eprintln!(
                "{} {} books to {}",
                "Wrote".green().bold(),
                report.books.len(),
                path.display()
            );
        }
        None => print!("{yaml}"),
    }

    for failure in &report.failures {
        eprintln!("{}: {}", "warning".yellow().bold(), failure);
    }

    finish(
        report.failures.len(),
        report.books.len() + report.failures.len(),
    )
}
