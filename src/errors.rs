// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum GlobwatchError {
    /// Bad `globs` argument (missing, empty, or neither a string nor a list
    /// of strings). Raised synchronously; no stream is returned.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A changed/added file could not be read after the read delay.
    /// Delivered on the stream, never returned from `watch`.
    #[error("Failed to read {path:?}: {message}")]
    FileRead { path: PathBuf, message: String },

    #[error("Invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("Watcher error: {0}")]
    Watcher(#[from] notify::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Stream already closed")]
    StreamClosed,

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, GlobwatchError>;
