//! `gitshelf.yml` parsing

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::tokens::{TokenMap, render_tokens};
use crate::book::{Book, BookEntry};
use crate::{Error, Result};

/// Environment used when neither the caller nor the manifest picks one.
pub const DEFAULT_ENVIRONMENT: &str = "dev";

#[derive(Debug, Default, Deserialize)]
struct Defaults {
    #[serde(default)]
    environment: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct Environment {
    #[serde(default)]
    tokens: BTreeMap<String, serde_yaml::Value>,
}

/// First pass: everything except the books.
#[derive(Debug, Default, Deserialize)]
struct Header {
    #[serde(default)]
    defaults: Option<Defaults>,
    #[serde(default)]
    environments: Option<BTreeMap<String, Environment>>,
}

/// Second pass, after token rendering.
#[derive(Debug, Default, Serialize, Deserialize)]
struct Body {
    #[serde(default)]
    books: Option<Vec<BookEntry>>,
}

/// Caller-side choices that shape how a manifest renders.
#[derive(Debug, Clone, Default)]
pub struct ManifestOptions {
    /// Overrides `defaults.environment`
    pub environment: Option<String>,
    /// Overrides tokens of the selected environment
    pub tokens: TokenMap,
}

/// A rendered manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    /// The environment whose tokens were applied
    pub environment: String,
    /// Tokens after overrides
    pub tokens: TokenMap,
    /// Book entries in file order
    pub books: Vec<BookEntry>,
}

impl Manifest {
    /// Load and render the manifest at `path`.
    pub fn load(path: &Path, options: &ManifestOptions) -> Result<Self> {
        if !path.is_file() {
            return Err(Error::ManifestNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = shelf_fs::read_text(&shelf_fs::NormalizedPath::new(path))?;
        tracing::debug!(path = %path.display(), "Loaded manifest");
        Self::parse_with_path(&content, options, path)
    }

    /// Render and parse manifest text.
    pub fn parse(content: &str, options: &ManifestOptions) -> Result<Self> {
        Self::parse_with_path(content, options, Path::new("<inline>"))
    }

    fn parse_with_path(content: &str, options: &ManifestOptions, path: &Path) -> Result<Self> {
        let parse_error = |source| Error::ManifestParse {
            path: PathBuf::from(path),
            source,
        };

        let header: Option<Header> = serde_yaml::from_str(content).map_err(parse_error)?;
        let header = header.unwrap_or_default();

        let environment = options
            .environment
            .clone()
            .or_else(|| header.defaults.and_then(|d| d.environment))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());

        let environments = header.environments.unwrap_or_default();
        let mut tokens = if environments.is_empty() {
            TokenMap::new()
        } else {
            let selected =
                environments
                    .get(&environment)
                    .ok_or_else(|| Error::UnknownEnvironment {
                        name: environment.clone(),
                        available: environments.keys().cloned().collect::<Vec<_>>().join(", "),
                    })?;
            selected
                .tokens
                .iter()
                .filter_map(|(name, value)| scalar_text(value).map(|v| (name.clone(), v)))
                .collect()
        };

        for (name, value) in &options.tokens {
            tokens.insert(name.clone(), value.clone());
        }
        tracing::debug!(environment = %environment, tokens = tokens.len(), "Rendering manifest");

        let rendered = render_tokens(content, &tokens);
        let body: Option<Body> = serde_yaml::from_str(&rendered).map_err(parse_error)?;
        let books = body.and_then(|b| b.books).unwrap_or_default();

        Ok(Self {
            environment,
            tokens,
            books,
        })
    }
}

fn scalar_text(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Null => Some(String::new()),
        _ => {
            tracing::warn!("Ignoring non-scalar token value");
            None
        }
    }
}

/// Emit a manifest with a `books:` list for `books`, in the order given.
pub fn render_manifest(books: &[Book]) -> Result<String> {
    let body = Body {
        books: Some(books.iter().map(Book::to_entry).collect()),
    };
    Ok(serde_yaml::to_string(&body)?)
}
