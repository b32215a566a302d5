//! Remote URL normalization
//!
//! Two spellings of the same remote (`https://Host/a/b` and
//! `https://user@host:443/a/b/`) should not be reported as a mismatch.
//! The path, including any `.git` suffix, stays significant.

use std::fmt;

use url::Url;

/// Transport family of a remote URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    /// `http://` and `https://`
    Http,
    /// `ssh://`, `git+ssh://` and scp-like `user@host:path`
    Ssh,
    /// `git://`
    Git,
    /// `file://` and plain local paths
    File,
    /// Any other scheme, lowercased
    Other(String),
}

/// A remote URL reduced to the parts that identify the repository.
#[derive(Debug, Clone, Eq)]
pub struct RemoteUrl {
    raw: String,
    protocol: Protocol,
    host: String,
    port: Option<u16>,
    path: String,
}

impl RemoteUrl {
    /// Parse a remote URL as git accepts it. Never fails: anything that does
    /// not look like a URL is treated as a local path.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();

        let candidate = if trimmed.contains("://") {
            trimmed.to_string()
        } else if let Some((authority, path)) = scp_like(trimmed) {
            format!("ssh://{authority}/{}", path.trim_start_matches('/'))
        } else {
            return Self::local(raw, trimmed);
        };

        match Url::parse(&candidate) {
            Ok(url) => Self::from_url(raw, &url),
            Err(e) => {
                tracing::debug!(url = %raw, error = %e, "Not a URL, comparing as a local path");
                Self::local(raw, trimmed)
            }
        }
    }

    fn from_url(raw: &str, url: &Url) -> Self {
        let protocol = match url.scheme() {
            "http" | "https" => Protocol::Http,
            "ssh" | "git+ssh" | "ssh+git" => Protocol::Ssh,
            "git" => Protocol::Git,
            "file" => return Self::local(raw, url.path()),
            other => Protocol::Other(other.to_string()),
        };

        Self {
            raw: raw.to_string(),
            port: url
                .port_or_known_default()
                .filter(|port| Some(*port) != default_port(url.scheme())),
            host: url.host_str().unwrap_or_default().to_ascii_lowercase(),
            path: url.path().trim_matches('/').to_string(),
            protocol,
        }
    }

    fn local(raw: &str, path: &str) -> Self {
        let path = path.replace('\\', "/");
        let trimmed = path.trim_end_matches('/');
        Self {
            raw: raw.to_string(),
            protocol: Protocol::File,
            host: String::new(),
            port: None,
            path: if trimmed.is_empty() { path } else { trimmed.to_string() },
        }
    }

    /// The URL exactly as given.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Lowercased host without credentials.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port, when it is not the scheme's default.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Repository path without surrounding slashes.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl PartialEq for RemoteUrl {
    fn eq(&self, other: &Self) -> bool {
        self.protocol == other.protocol
            && self.host == other.host
            && self.port == other.port
            && self.path == other.path
    }
}

impl fmt::Display for RemoteUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        "ssh" | "git+ssh" | "ssh+git" => Some(22),
        "git" => Some(9418),
        _ => None,
    }
}

/// Split `[user@]host:path`. A single letter before the colon is a Windows
/// drive, not a host.
fn scp_like(raw: &str) -> Option<(&str, &str)> {
    let (authority, path) = raw.split_once(':')?;
    if authority.is_empty() || authority.contains('/') || authority.len() == 1 {
        return None;
    }
    Some((authority, path))
}
