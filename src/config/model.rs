// src/config/model.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{EventKind, default_events};
use crate::watch::path_utils::normalize_lexically;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// globs = ["src/**/*.js", "!src/**/*.min.js"]
///
/// [options]
/// events = ["add", "change"]
/// read_delay = 25
/// verbose = true
/// name = "app"
/// ```
///
/// `globs` is kept as a raw `toml::Value` here: it may legally be a single
/// string or an array of strings, and rejecting anything else is the job of
/// [`crate::glob::GlobInput`], so that the config route and the library route
/// fail with the same `InvalidArgument` error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub globs: Option<toml::Value>,

    /// Watch options from `[options]`.
    #[serde(default)]
    pub options: WatchOptions,
}

/// Options recognised by [`crate::watch`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchOptions {
    /// Base directory for relative resolution.
    ///
    /// When set, patterns are only lexically normalized and stay relative,
    /// and raw paths are matched relative to this directory.
    pub cwd: Option<PathBuf>,

    /// Force the base directory of every record (disables inference).
    pub base: Option<PathBuf>,

    /// Event kinds that produce records.
    pub events: Vec<EventKind>,

    /// Suppress `add` events for files that exist when watching starts.
    pub ignore_initial: bool,

    /// Milliseconds to wait before reading an added/changed file.
    pub read_delay: u64,

    /// Log a human-readable line for every record.
    pub verbose: bool,

    /// Subject label for verbose log lines.
    pub name: Option<String>,
}

pub const DEFAULT_READ_DELAY_MS: u64 = 10;

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            cwd: None,
            base: None,
            events: default_events(),
            ignore_initial: true,
            read_delay: DEFAULT_READ_DELAY_MS,
            verbose: false,
            name: None,
        }
    }
}

impl WatchOptions {
    pub fn read_delay(&self) -> Duration {
        Duration::from_millis(self.read_delay)
    }

    /// Whether raw events of this kind should be turned into records.
    pub fn subscribes(&self, kind: EventKind) -> bool {
        self.events.contains(&kind)
    }

    /// Pin a relative `cwd` to the process working directory, lexically
    /// normalized. Everything downstream assumes an absolute `cwd`.
    pub fn with_absolute_cwd(mut self) -> std::io::Result<Self> {
        if let Some(cwd) = self.cwd.take() {
            let cwd = if cwd.is_absolute() {
                cwd
            } else {
                std::env::current_dir()?.join(cwd)
            };
            self.cwd = Some(normalize_lexically(&cwd));
        }
        Ok(self)
    }

    /// `cwd` if set, otherwise the process working directory.
    pub fn effective_cwd(&self) -> PathBuf {
        match &self.cwd {
            Some(cwd) => cwd.clone(),
            None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        }
    }

    /// Join a possibly-relative path onto the effective cwd.
    pub fn absolutize(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.effective_cwd().join(path)
        }
    }
}
