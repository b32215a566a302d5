//! Manifest loading
//!
//! A manifest (`gitshelf.yml`) is read in two passes:
//!
//! 1. The raw YAML is parsed for `defaults` and `environments` only, to
//!    choose an environment and collect its tokens.
//! 2. Every `{name}` in the raw text is replaced by its token value and
//!    the rendered text is parsed again for the `books` list.
//!
//! Values containing tokens must therefore be quoted in the raw file
//! (`git: "{base}/foo.git"`), since `{base}` alone is a YAML mapping.

mod manifest;
mod tokens;

pub use manifest::{DEFAULT_ENVIRONMENT, Manifest, ManifestOptions, render_manifest};
pub use tokens::{TokenMap, parse_token_override, render_tokens};
