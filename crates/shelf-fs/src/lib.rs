//! Filesystem abstraction for gitshelf
//!
//! Provides the path algebra used to relocate a shelf under a fakeroot and
//! the filesystem capability the reconciler acts through.

pub mod constants;
pub mod error;
pub mod io;
pub mod path;

pub use constants::ShelfPath;
pub use error::{Error, Result};
pub use io::{Filesystem, LocalFs, read_text, write_atomic, write_text};
pub use path::{NormalizedPath, rebase, relative_link_target};
