//! Normalized path handling and the fakeroot path algebra

use std::path::{Path, PathBuf};

/// A path normalized to use single forward slashes internally.
///
/// Backslashes become forward slashes, runs of separators collapse to one
/// and a trailing separator is dropped (except for the root itself).
/// `.` and `..` components are kept verbatim so a leading `./` still marks
/// the path as explicitly relative.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        Self {
            inner: clean(&path_str),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Whether the path is the empty string.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let joined = if self.inner.is_empty() {
            segment.to_string()
        } else {
            format!("{}/{}", self.inner, segment)
        };
        Self {
            inner: clean(&joined),
        }
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        match self.inner.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: self.inner[..idx].to_string(),
            }),
            Some(0) if self.inner.len() > 1 => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        self.inner.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Whether the path is rooted (`/...` or a `C:/...` drive path).
    pub fn is_absolute(&self) -> bool {
        let bytes = self.inner.as_bytes();
        self.inner.starts_with('/')
            || (bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b":/")
    }

    /// Whether the path starts with the `.` marker (`.`, `./x`, `../x`).
    ///
    /// Such paths are never moved under a fakeroot.
    pub fn is_explicitly_relative(&self) -> bool {
        self.inner.starts_with('.')
    }
}

fn clean(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_slash = false;
    for ch in raw.chars() {
        let ch = if ch == '\\' { '/' } else { ch };
        if ch == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(ch);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Move `path` under `fakeroot`.
///
/// No-op when there is no fakeroot (or it is empty) and when `path` is
/// explicitly relative. Otherwise the leading separator of `path` is dropped
/// and the remainder is joined onto the fakeroot.
pub fn rebase(path: &NormalizedPath, fakeroot: Option<&NormalizedPath>) -> NormalizedPath {
    match fakeroot {
        Some(root) if !root.is_empty() && !path.is_explicitly_relative() => {
            root.join(path.as_str().trim_start_matches('/'))
        }
        _ => path.clone(),
    }
}

/// Express `target` relative to the directory containing `from`.
///
/// The computation is purely lexical. When exactly one of the two paths is
/// absolute there is no lexical answer and `target` is returned unchanged.
pub fn relative_link_target(target: &NormalizedPath, from: &NormalizedPath) -> NormalizedPath {
    let base = from.parent().unwrap_or_else(|| NormalizedPath::new("."));
    if target.is_absolute() != base.is_absolute() {
        return target.clone();
    }

    let target_parts = lexical_components(target);
    let base_parts = lexical_components(&base);

    let common = target_parts
        .iter()
        .zip(&base_parts)
        .take_while(|(a, b)| a == b)
        .count();

    // A base that climbs above its own start cannot be walked back lexically.
    if base_parts[common..].iter().any(|part| part == "..") {
        return target.clone();
    }

    let mut parts: Vec<&str> = vec![".."; base_parts.len() - common];
    parts.extend(target_parts[common..].iter().map(String::as_str));

    if parts.is_empty() {
        NormalizedPath::new(".")
    } else {
        NormalizedPath::new(parts.join("/"))
    }
}

fn lexical_components(path: &NormalizedPath) -> Vec<String> {
    let absolute = path.is_absolute();
    let mut parts: Vec<String> = Vec::new();
    for part in path.as_str().split('/') {
        match part {
            "" | "." => {}
            ".." => match parts.last() {
                Some(last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push("..".to_string()),
            },
            other => parts.push(other.to_string()),
        }
    }
    parts
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}
