//! gitshelf CLI
//!
//! Declarative workspaces of git checkouts and symlinks.

mod cli;
mod commands;
mod context;
mod error;
mod logging;

use clap::Parser;
use colored::Colorize;

use cli::{Cli, Commands};
use context::ShelfContext;
use error::Result;

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.global.verbose, cli.global.quiet) {
        eprintln!("{}: logging disabled: {}", "warning".yellow().bold(), e);
    }
    tracing::debug!(args = ?cli.global, "Parsed arguments");

    match cli.command {
        Some(cmd) => execute_command(&ShelfContext::from_args(&cli.global), cmd),
        None => {
            // No command provided - show help hint
            println!("{} - declarative git workspaces", "gitshelf".green().bold());
            println!();
            println!("Run {} for available commands.", "gitshelf --help".cyan());
            Ok(())
        }
    }
}

fn execute_command(ctx: &ShelfContext, cmd: Commands) -> Result<()> {
    match cmd {
        Commands::Install {
            dry_run,
            jobs,
            retries,
        } => commands::run_install(ctx, dry_run, usize::from(jobs), retries),
        Commands::Status { json } => commands::run_status(ctx, json),
        Commands::Diff { json } => commands::run_diff(ctx, json),
        Commands::Discover {
            root,
            use_branch,
            output,
        } => commands::run_discover(ctx, &root, use_branch, output.as_deref()),
        Commands::Completions { shell } => {
            commands::run_completions(shell);
            Ok(())
        }
    }
}
