//! Content-type parsing and the supported-type registry
//!
//! A raw content type such as `text/plain; charset=utf-8` is parsed into its
//! base type (`text/plain`) and a parameter list. The base type is what the
//! entity validates, what updates compare, and what the conversion engine
//! resolves against.

use std::fmt;
use std::str::FromStr;

use crate::error::FragmentError;

/// Every base type a fragment may carry, in registry order.
pub const SUPPORTED_TYPES: &[&str] = &[
    "text/plain",
    "text/markdown",
    "text/html",
    "text/csv",
    "application/json",
    "application/yaml",
    "image/png",
    "image/jpeg",
    "image/webp",
    "image/gif",
];

/// Whether `mime_type` (a base type, no parameters) is in the registry
pub fn is_registered(mime_type: &str) -> bool {
    SUPPORTED_TYPES.contains(&mime_type)
}

/// Parsed content type: base type plus parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    essence: String,
    params: Vec<(String, String)>,
}

impl ContentType {
    /// Parse a raw content-type string.
    ///
    /// The base type is lowercased. Parameter names are lowercased; values
    /// keep their case and lose surrounding quotes. Parameters without an
    /// `=` are dropped.
    ///
    /// # Errors
    ///
    /// - `Validation` when `raw` is empty or whitespace
    /// - `UnsupportedType` when the base type is not of the form `type/subtype`
    pub fn parse(raw: &str) -> Result<Self, FragmentError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(FragmentError::validation("type must not be empty"));
        }

        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();

        let well_formed = essence
            .split_once('/')
            .is_some_and(|(top, sub)| is_token(top) && is_token(sub));
        if !well_formed {
            return Err(FragmentError::UnsupportedType(raw.to_string()));
        }

        let params = parts
            .filter_map(|param| {
                let (name, value) = param.split_once('=')?;
                let name = name.trim().to_ascii_lowercase();
                if name.is_empty() {
                    return None;
                }
                let value = value.trim().trim_matches('"').to_string();
                Some((name, value))
            })
            .collect();

        Ok(Self { essence, params })
    }

    /// Base type with parameters stripped, e.g. `text/plain`
    pub fn essence(&self) -> &str {
        &self.essence
    }

    /// Parameters in the order they appeared
    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Look up a parameter by (case-insensitive) name
    pub fn param(&self, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.params
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    /// True for `text/*` base types
    pub fn is_text(&self) -> bool {
        self.essence.starts_with("text/")
    }

    /// Whether the base type is in the registry
    pub fn is_supported(&self) -> bool {
        is_registered(&self.essence)
    }
}

impl FromStr for ContentType {
    type Err = FragmentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.params {
            write!(f, "; {name}={value}")?;
        }
        Ok(())
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}
