//! Route pattern compilation.
//!
//! Patterns use `:name` for a single path segment, `:name+` for the rest of
//! the path (slashes included) and parentheses for optional parts:
//!
//! ```text
//! /hello/:name
//! /files/:path+
//! /archive(/:year(/:month))
//! ```
//!
//! A parameter may be constrained with a regular expression through route
//! conditions, which replaces its default `[^/]+`.

use crate::error::RouteError;
use lazy_static::lazy_static;
use regex::{Captures, Regex};
use std::collections::HashMap;

lazy_static! {
    static ref PARAM: Regex = Regex::new(r":([A-Za-z0-9_]+)\+?").expect("static regex");
    static ref UNRESOLVED_GROUP: Regex =
        Regex::new(r"\([^()]*:[A-Za-z0-9_][^()]*\)").expect("static regex");
    static ref SLASHES: Regex = Regex::new(r"/{2,}").expect("static regex");
}

#[derive(Debug, Clone)]
pub(crate) struct Pattern {
    source: String,
    regex: Regex,
    params: Vec<String>,
}

impl Pattern {
    pub fn compile(
        source: &str,
        case_sensitive: bool,
        conditions: &HashMap<String, String>,
    ) -> Result<Self, RouteError> {
        let invalid = |reason: String| RouteError::InvalidPattern {
            pattern: source.to_string(),
            reason,
        };

        let mut body = String::with_capacity(source.len() * 2);
        let mut params = Vec::new();
        let mut depth = 0usize;
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '(' => {
                    depth += 1;
                    body.push_str("(?:");
                }
                ')' => {
                    if depth == 0 {
                        return Err(invalid("unbalanced `)`".to_string()));
                    }
                    depth -= 1;
                    body.push_str(")?");
                }
                ':' if chars.peek().is_some_and(|c| is_word(*c)) => {
                    let mut name = String::new();
                    while let Some(c) = chars.next_if(|c| is_word(*c)) {
                        name.push(c);
                    }
                    let greedy = chars.next_if_eq(&'+').is_some();
                    let capture = match conditions.get(&name) {
                        Some(condition) => condition.as_str(),
                        None if greedy => ".+",
                        None => "[^/]+",
                    };
                    body.push_str(&format!("(?P<{}>{})", name, capture));
                    params.push(name);
                }
                c => body.push_str(&regex::escape(c.encode_utf8(&mut [0; 4]))),
            }
        }

        if depth != 0 {
            return Err(invalid("unbalanced `(`".to_string()));
        }

        let flags = if case_sensitive { "" } else { "(?i)" };
        let regex = Regex::new(&format!("{}^{}$", flags, body))
            .map_err(|err| invalid(err.to_string()))?;

        Ok(Self {
            source: source.to_string(),
            regex,
            params,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Matches a request path, returning the decoded parameters in pattern
    /// order. Optional parameters that did not participate are left out.
    pub fn matches(&self, path: &str) -> Option<Vec<(String, String)>> {
        let captures = self.regex.captures(path)?;
        Some(
            self.params
                .iter()
                .filter_map(|name| {
                    let value = captures.name(name)?.as_str();
                    let value = urlencoding::decode(value)
                        .map(|decoded| decoded.into_owned())
                        .unwrap_or_else(|_| value.to_string());
                    Some((name.clone(), value))
                })
                .collect(),
        )
    }
}

fn is_word(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Builds a URL from a pattern. Optional groups whose parameters were not
/// supplied are dropped; required parameters that are missing stay as-is.
pub(crate) fn build_url(source: &str, params: &HashMap<String, String>) -> String {
    let mut url = PARAM
        .replace_all(source, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned();

    while UNRESOLVED_GROUP.is_match(&url) {
        url = UNRESOLVED_GROUP.replace_all(&url, "").into_owned();
    }

    let url = collapse_slashes(&url.replace(['(', ')'], ""));
    if url.is_empty() {
        "/".to_string()
    } else {
        url
    }
}

/// Squeezes runs of slashes into one.
pub(crate) fn collapse_slashes(url: &str) -> String {
    SLASHES.replace_all(url, "/").into_owned()
}
