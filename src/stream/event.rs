// src/stream/event.rs

use std::path::PathBuf;

use crate::errors::GlobwatchError;
use crate::record::FileRecord;
use crate::types::EventKind;

/// Everything a consumer can observe on a [`super::WatchStream`].
#[derive(Debug)]
pub enum StreamEvent {
    /// A built (or written-through) record.
    Data(FileRecord),
    /// A path signal mirrored verbatim from the watcher backend, whether or
    /// not it produced a record.
    Watcher { kind: EventKind, path: PathBuf },
    /// The backend finished its initial scan.
    Ready,
    /// Low-level backend event description.
    Raw(String),
    /// A read failure or a backend error. The stream stays open.
    Error(GlobwatchError),
    /// `close()` was called; nothing follows.
    End,
}

impl StreamEvent {
    /// Channel name: `data`, `add`, `change`, `unlink`, `addDir`,
    /// `unlinkDir`, `ready`, `raw`, `error` or `end`.
    pub fn name(&self) -> &'static str {
        match self {
            StreamEvent::Data(_) => "data",
            StreamEvent::Watcher { kind, .. } => kind.as_str(),
            StreamEvent::Ready => "ready",
            StreamEvent::Raw(_) => "raw",
            StreamEvent::Error(_) => "error",
            StreamEvent::End => "end",
        }
    }

    pub fn into_record(self) -> Option<FileRecord> {
        match self {
            StreamEvent::Data(record) => Some(record),
            _ => None,
        }
    }
}
