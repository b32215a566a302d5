//! Well-known paths inside a shelf.

use std::path::Path;

/// Standard markers and file names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelfPath {
    /// The `.git` directory of a checkout
    GitDir,
    /// The `.git/config` file that marks a repository during discovery
    GitConfig,
    /// The default manifest file name
    Manifest,
}

impl ShelfPath {
    /// Get the string representation of the path.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitDir => ".git",
            Self::GitConfig => ".git/config",
            Self::Manifest => "gitshelf.yml",
        }
    }
}

impl AsRef<Path> for ShelfPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ShelfPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ShelfPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
