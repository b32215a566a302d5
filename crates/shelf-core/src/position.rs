//! Where a checkout's HEAD currently is

use std::path::Path;

use shelf_fs::NormalizedPath;
use shelf_git::VcsBackend;

use crate::error::Step;
use crate::{Error, Result};

/// Shortest abbreviated commit id accepted as naming HEAD.
const MIN_ABBREV: usize = 7;

/// HEAD of a checkout: its symbolic description and its commit id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadPosition {
    /// Branch, tag or `describe` name
    pub description: String,
    /// Full commit id
    pub commit: String,
}

impl HeadPosition {
    /// Query the backend for the HEAD of the checkout at `workdir`.
    pub fn read(vcs: &dyn VcsBackend, book: &NormalizedPath, workdir: &Path) -> Result<Self> {
        let description = vcs
            .describe_head(workdir)
            .map_err(|e| Error::backend(book, Step::Describe, e))?;
        let commit = vcs
            .rev_parse_head(workdir)
            .map_err(|e| Error::backend(book, Step::RevParse, e))?;
        Ok(Self {
            description,
            commit,
        })
    }

    /// Whether HEAD is at `reference`: the description or the commit id
    /// equals it. An abbreviated commit id of at least seven hex digits
    /// also matches.
    pub fn is_at(&self, reference: &str) -> bool {
        self.description == reference
            || self.commit == reference
            || (reference.len() >= MIN_ABBREV
                && reference.chars().all(|c| c.is_ascii_hexdigit())
                && self.commit.starts_with(&reference.to_ascii_lowercase()))
    }
}
