// src/glob/base.rs

use std::path::PathBuf;

use crate::config::model::WatchOptions;
use crate::glob::normalize::NEGATION;

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

fn is_magic(segment: &str) -> bool {
    segment.contains(GLOB_META)
}

/// The fixed, non-magic directory prefix of a pattern.
///
/// Segments are taken from the left until the first one containing a glob
/// meta-character. When no segment is magic, the pattern names a single
/// file and its last segment is dropped.
///
/// ```
/// use std::path::PathBuf;
/// use globwatch::glob::glob_base;
///
/// assert_eq!(glob_base("src/**/*.js"), PathBuf::from("src"));
/// assert_eq!(glob_base("/abs/lib/*.rs"), PathBuf::from("/abs/lib"));
/// assert_eq!(glob_base("docs/readme.md"), PathBuf::from("docs"));
/// ```
pub fn glob_base(pattern: &str) -> PathBuf {
    let body = pattern.strip_prefix(NEGATION).unwrap_or(pattern);
    let segments: Vec<&str> = body.split('/').collect();

    let mut fixed: Vec<&str> = segments.iter().copied().take_while(|s| !is_magic(s)).collect();
    if fixed.len() == segments.len() {
        fixed.pop();
    }

    let joined = fixed.join("/");
    if joined.is_empty() && body.starts_with('/') {
        PathBuf::from("/")
    } else {
        PathBuf::from(joined)
    }
}

/// Decides the base of each record: forced by the caller or inferred from
/// the pattern that matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseResolver {
    Forced(PathBuf),
    Inferred,
}

impl BaseResolver {
    pub fn from_options(opts: &WatchOptions) -> Self {
        match &opts.base {
            Some(base) => BaseResolver::Forced(base.clone()),
            None => BaseResolver::Inferred,
        }
    }

    pub fn resolve(&self, pattern: &str) -> PathBuf {
        match self {
            BaseResolver::Forced(base) => base.clone(),
            BaseResolver::Inferred => glob_base(pattern),
        }
    }
}
