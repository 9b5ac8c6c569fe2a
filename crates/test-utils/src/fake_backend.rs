use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use globwatch::errors::Result;
use globwatch::watch::{BackendEvent, BackendEventSender, WatchBackend};
use globwatch::{EventKind, GlobwatchError, WatchOptions};

#[derive(Debug, Default)]
struct FakeState {
    sender: Option<BackendEventSender>,
    started_with: Vec<String>,
    added: Vec<String>,
    unwatched: Vec<String>,
    closed: bool,
}

/// A fake watcher backend that:
/// - records which patterns were started, added and unwatched
/// - emits exactly the signals a test asks for, until it is closed.
///
/// Clones share state, so a test keeps one handle and gives the other to
/// the stream.
#[derive(Debug, Clone, Default)]
pub struct FakeBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    fn send(&self, event: BackendEvent) {
        let state = self.state();
        if state.closed {
            return;
        }
        if let Some(tx) = &state.sender {
            let _ = tx.send(event);
        }
    }

    pub fn emit(&self, kind: EventKind, path: impl Into<PathBuf>) {
        self.send(BackendEvent::Path {
            kind,
            path: path.into(),
        });
    }

    pub fn ready(&self) {
        self.send(BackendEvent::Ready);
    }

    pub fn error(&self, message: &str) {
        self.send(BackendEvent::Error(GlobwatchError::Other(anyhow::anyhow!(
            message.to_string()
        ))));
    }

    pub fn raw(&self, description: &str) {
        self.send(BackendEvent::Raw(description.to_string()));
    }

    /// Patterns the backend is currently watching.
    pub fn live_patterns(&self) -> Vec<String> {
        let state = self.state();
        state
            .started_with
            .iter()
            .chain(state.added.iter())
            .filter(|p| !state.unwatched.contains(p))
            .cloned()
            .collect()
    }

    pub fn added(&self) -> Vec<String> {
        self.state().added.clone()
    }

    pub fn unwatched(&self) -> Vec<String> {
        self.state().unwatched.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.state().closed
    }
}

impl WatchBackend for FakeBackend {
    fn start(
        &mut self,
        patterns: &[String],
        _opts: &WatchOptions,
        events: BackendEventSender,
    ) -> Result<()> {
        let mut state = self.state();
        state.started_with = patterns.to_vec();
        state.sender = Some(events);
        Ok(())
    }

    fn add(&mut self, patterns: &[String]) -> Result<()> {
        self.state().added.extend(patterns.iter().cloned());
        Ok(())
    }

    fn unwatch(&mut self, patterns: &[String]) -> Result<()> {
        self.state().unwatched.extend(patterns.iter().cloned());
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let mut state = self.state();
        state.closed = true;
        state.sender = None;
        Ok(())
    }
}
