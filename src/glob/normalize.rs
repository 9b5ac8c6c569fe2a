// src/glob/normalize.rs

//! Validation and resolution of user-supplied glob patterns.

use std::path::Path;

use crate::errors::{GlobwatchError, Result};
use crate::watch::path_utils::{normalize_lexically, slash_string};

/// Negation marker: a pattern starting with `!` excludes what it matches.
pub const NEGATION: char = '!';

/// The `globs` argument: one pattern or an ordered list of patterns.
///
/// The library route builds this through the `From` impls; the config/CLI
/// route goes through [`GlobInput::from_toml`], which is where the
/// "missing" and "wrong type" cases can actually occur.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GlobInput {
    Single(String),
    List(Vec<String>),
}

impl GlobInput {
    /// Build from a dynamically typed TOML value.
    ///
    /// `None`, numbers, tables, booleans, dates and arrays containing
    /// anything but strings are rejected with `InvalidArgument`.
    pub fn from_toml(value: Option<&toml::Value>) -> Result<Self> {
        let value = value.ok_or_else(|| {
            GlobwatchError::InvalidArgument("glob argument required".to_string())
        })?;

        match value {
            toml::Value::String(s) => Ok(GlobInput::Single(s.clone())),
            toml::Value::Array(items) => {
                let mut globs = Vec::with_capacity(items.len());
                for (idx, item) in items.iter().enumerate() {
                    match item {
                        toml::Value::String(s) => globs.push(s.clone()),
                        other => {
                            return Err(GlobwatchError::InvalidArgument(format!(
                                "glob at index {idx} should be String, not {}",
                                other.type_str()
                            )));
                        }
                    }
                }
                Ok(GlobInput::List(globs))
            }
            other => Err(GlobwatchError::InvalidArgument(format!(
                "glob should be String or Array, not {}",
                other.type_str()
            ))),
        }
    }

    /// Check the patterns and return them in order.
    pub fn into_patterns(self) -> Result<Vec<String>> {
        let globs = match self {
            GlobInput::Single(glob) => vec![glob],
            GlobInput::List(globs) => globs,
        };
        if globs.is_empty() {
            return Err(GlobwatchError::InvalidArgument(
                "glob argument required".to_string(),
            ));
        }

        for (idx, glob) in globs.iter().enumerate() {
            let body = glob.strip_prefix(NEGATION).unwrap_or(glob);
            if body.trim().is_empty() {
                return Err(GlobwatchError::InvalidArgument(if globs.len() == 1 {
                    "glob argument required".to_string()
                } else {
                    format!("glob at index {idx} is empty")
                }));
            }
        }
        Ok(globs)
    }
}

impl From<&str> for GlobInput {
    fn from(glob: &str) -> Self {
        GlobInput::Single(glob.to_string())
    }
}

impl From<String> for GlobInput {
    fn from(glob: String) -> Self {
        GlobInput::Single(glob)
    }
}

impl From<Vec<String>> for GlobInput {
    fn from(globs: Vec<String>) -> Self {
        GlobInput::List(globs)
    }
}

impl From<Vec<&str>> for GlobInput {
    fn from(globs: Vec<&str>) -> Self {
        GlobInput::List(globs.into_iter().map(str::to_string).collect())
    }
}

impl From<&[&str]> for GlobInput {
    fn from(globs: &[&str]) -> Self {
        GlobInput::List(globs.iter().map(|g| g.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for GlobInput {
    fn from(globs: [&str; N]) -> Self {
        GlobInput::List(globs.iter().map(|g| g.to_string()).collect())
    }
}

/// Validate `input` and resolve every pattern with [`resolve_glob`].
///
/// Order is preserved; correlation picks the first matching pattern.
pub fn normalize_globs(input: GlobInput, cwd: Option<&Path>) -> Result<Vec<String>> {
    Ok(input
        .into_patterns()?
        .iter()
        .map(|glob| resolve_glob(glob, cwd))
        .collect())
}

/// Resolve a single pattern.
///
/// - A leading `!` is stripped, the rest resolved, and the `!` reattached.
/// - With `cwd` set the pattern is only lexically normalized and stays
///   relative (it is matched against paths relative to `cwd`).
/// - Without `cwd` the pattern is made absolute against the process
///   working directory.
pub fn resolve_glob(glob: &str, cwd: Option<&Path>) -> String {
    let (negated, body) = match glob.strip_prefix(NEGATION) {
        Some(rest) => (true, rest),
        None => (false, glob),
    };

    let path = Path::new(body);
    let resolved = match cwd {
        Some(_) => normalize_lexically(path),
        None if path.is_absolute() => normalize_lexically(path),
        None => {
            let here = std::env::current_dir().unwrap_or_default();
            normalize_lexically(&here.join(path))
        }
    };

    let resolved = slash_string(&resolved);
    if negated {
        format!("{NEGATION}{resolved}")
    } else {
        resolved
    }
}

/// Whether a resolved pattern is an exclusion.
pub fn is_negated(pattern: &str) -> bool {
    pattern.starts_with(NEGATION)
}
