//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use shelf_fs::ShelfPath;

/// gitshelf - Keep a workspace of git checkouts and symlinks in sync with a manifest
#[derive(Parser, Debug)]
#[command(name = "gitshelf")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct GlobalArgs {
    /// Enable debug output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest file
    #[arg(
        long,
        global = true,
        env = "GITSHELF_MANIFEST",
        default_value = ShelfPath::Manifest.as_str(),
        value_name = "FILE"
    )]
    pub gitshelf: PathBuf,

    /// Override a manifest token (repeatable)
    #[arg(long = "token", global = true, value_name = "NAME=VALUE", value_parser = parse_token)]
    pub tokens: Vec<(String, String)>,

    /// Environment whose tokens are applied
    #[arg(long, global = true, env = "GITSHELF_ENVIRONMENT")]
    pub environment: Option<String>,

    /// Move absolute book paths under this directory
    #[arg(long, global = true, env = "GITSHELF_FAKEROOT", value_name = "DIR")]
    pub fakeroot: Option<PathBuf>,

    /// Do not compare checkout remotes against the manifest URLs
    #[arg(long, global = true)]
    pub skip_repo_url_check: bool,

    /// Version-control backend
    #[arg(long, global = true, value_enum, default_value_t = BackendKind::Libgit)]
    pub backend: BackendKind,

    /// Kill `git` invocations running longer than this (cli backend only)
    #[arg(long, global = true, value_name = "SECS")]
    pub timeout: Option<u64>,
}

/// Which [`shelf_git::VcsBackend`] to use.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    /// In-process libgit2
    Libgit,
    /// The `git` executable
    Cli,
}

fn parse_token(spec: &str) -> Result<(String, String), shelf_core::Error> {
    shelf_core::parse_token_override(spec)
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Clone, check out and link every book in the manifest
    ///
    /// Examples:
    ///   gitshelf install
    ///   gitshelf install --dry-run
    ///   gitshelf install --jobs 8 --retries 3
    Install {
        /// Report what would be done without changing anything
        #[arg(long)]
        dry_run: bool,

        /// Number of books processed concurrently
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
        jobs: u16,

        /// Retry failed clones and fetches this many times
        #[arg(long, default_value_t = 0)]
        retries: u32,
    },

    /// Show how each book differs from the manifest
    Status {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Show uncommitted changes of each book
    Diff {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Write a manifest describing the checkouts and symlinks under ROOT
    ///
    /// Examples:
    ///   gitshelf discover
    ///   gitshelf discover ~/src --use-branch -o gitshelf.yml
    Discover {
        /// Directory to scan
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Record the branch or tag name instead of the commit id
        #[arg(long)]
        use_branch: bool,

        /// Write to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Generate shell completions
    ///
    /// Examples:
    ///   gitshelf completions bash > ~/.local/share/bash-completion/completions/gitshelf
    ///   gitshelf completions zsh > ~/.zfunc/_gitshelf
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
