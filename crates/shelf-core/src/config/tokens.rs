//! `{name}` token substitution

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::{Error, Result};

/// Token name to value.
pub type TokenMap = BTreeMap<String, String>;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_.-]+)\}").unwrap());

/// Replace every `{name}` in `text` with its value from `tokens`.
///
/// Unknown tokens render as the empty string and are logged once each.
pub fn render_tokens(text: &str, tokens: &TokenMap) -> String {
    let mut unknown: Vec<String> = Vec::new();
    let rendered = TOKEN.replace_all(text, |caps: &Captures<'_>| {
        let name = &caps[1];
        match tokens.get(name) {
            Some(value) => value.clone(),
            None => {
                if !unknown.iter().any(|u| u == name) {
                    unknown.push(name.to_string());
                }
                String::new()
            }
        }
    });

    for name in &unknown {
        tracing::warn!(token = %name, "Unknown token rendered as empty string");
    }
    rendered.into_owned()
}

/// Parse a `NAME=VALUE` override. The value may be empty or contain `=`.
pub fn parse_token_override(spec: &str) -> Result<(String, String)> {
    match spec.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(Error::InvalidToken {
            spec: spec.to_string(),
        }),
    }
}
