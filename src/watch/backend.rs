// src/watch/backend.rs

//! Pluggable watcher backend abstraction.
//!
//! The stream talks to a `WatchBackend` instead of `notify` directly. This
//! makes it easy to swap in a fake backend in tests that emits exactly the
//! path events a test needs, while production uses
//! [`super::notify_backend::NotifyBackend`].

use std::path::PathBuf;

use tokio::sync::mpsc;

use crate::config::model::WatchOptions;
use crate::errors::{GlobwatchError, Result};
use crate::types::EventKind;

/// Signals a backend sends to the stream.
#[derive(Debug)]
pub enum BackendEvent {
    /// A path changed. Only paths the backend considers watched are sent.
    Path { kind: EventKind, path: PathBuf },
    /// Initial scan finished.
    Ready,
    Error(GlobwatchError),
    /// Low-level event description, for observability only.
    Raw(String),
}

pub type BackendEventSender = mpsc::UnboundedSender<BackendEvent>;
pub type BackendEventReceiver = mpsc::UnboundedReceiver<BackendEvent>;

/// Trait abstracting the filesystem watcher.
///
/// Patterns handed to the backend are already resolved (see
/// [`crate::glob::normalize_globs`]) and may carry a leading `!`.
pub trait WatchBackend: Send {
    /// Begin watching `patterns`, sending signals on `events`.
    fn start(
        &mut self,
        patterns: &[String],
        opts: &WatchOptions,
        events: BackendEventSender,
    ) -> Result<()>;

    /// Add patterns to the live watch set.
    fn add(&mut self, patterns: &[String]) -> Result<()>;

    /// Remove patterns from the live watch set.
    fn unwatch(&mut self, patterns: &[String]) -> Result<()>;

    /// Stop watching. No signals are sent afterwards.
    fn close(&mut self) -> Result<()>;
}
