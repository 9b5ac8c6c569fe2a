// src/record/mod.rs

//! File records: what the stream hands to consumers.

pub mod builder;

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

pub use crate::fs::FileStat;
pub use builder::RecordBuilder;

use crate::types::EventKind;
use crate::watch::path_utils::relative_path;

/// A file as seen by one watcher event.
///
/// Deletion records carry no `contents` and no `stat`. Directory records
/// carry a `stat` but no `contents`. Consumers may attach their own
/// key/value pairs in `attributes` as the record moves down a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileRecord {
    /// Absolute path of the file.
    pub path: PathBuf,
    pub cwd: PathBuf,
    /// Directory that `relative()` is computed against.
    pub base: PathBuf,
    pub contents: Option<Vec<u8>>,
    pub stat: Option<FileStat>,
    pub event: Option<EventKind>,
    pub attributes: BTreeMap<String, String>,
}

impl FileRecord {
    pub fn new(path: impl Into<PathBuf>, cwd: impl Into<PathBuf>, base: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cwd: cwd.into(),
            base: base.into(),
            contents: None,
            stat: None,
            event: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Path relative to `base`, e.g. `a.js` for `/p/src/a.js` with base
    /// `/p/src`.
    pub fn relative(&self) -> PathBuf {
        relative_path(&self.base, &self.path)
    }

    pub fn is_deletion(&self) -> bool {
        self.event.is_some_and(|e| e.is_deletion())
    }

    pub fn is_directory(&self) -> bool {
        self.stat.as_ref().is_some_and(|s| s.is_dir)
            || self.event.is_some_and(|e| e.is_dir())
    }

    pub fn with_event(mut self, event: EventKind) -> Self {
        self.event = Some(event);
        self
    }

    pub fn with_contents(mut self, contents: impl Into<Vec<u8>>) -> Self {
        self.contents = Some(contents.into());
        self
    }
}

/// Per-event context threaded from correlation to the finished record.
///
/// Each event owns its own inferred base and absolute path, so events from
/// different patterns that are in flight at the same time never observe
/// each other's values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub kind: EventKind,
    /// Absolute path of the changed entry.
    pub path: PathBuf,
    /// Absolute base directory for this event's record.
    pub base: PathBuf,
    /// Pattern that claimed the path.
    pub pattern: String,
}
