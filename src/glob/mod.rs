// src/glob/mod.rs

//! Glob handling: normalizing user patterns and inferring their base
//! directory. Matching itself is done by `globset` (see
//! [`crate::watch::correlate`]).

pub mod base;
pub mod normalize;

pub use base::{BaseResolver, glob_base};
pub use normalize::{GlobInput, NEGATION, is_negated, normalize_globs, resolve_glob};
