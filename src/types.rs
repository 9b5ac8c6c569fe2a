use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of filesystem change reported by the watcher backend.
///
/// Serialized with the names used on the wire and in config files:
/// `add`, `change`, `unlink`, `addDir`, `unlinkDir`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    Add,
    Change,
    Unlink,
    AddDir,
    UnlinkDir,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Add,
        EventKind::Change,
        EventKind::Unlink,
        EventKind::AddDir,
        EventKind::UnlinkDir,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Add => "add",
            EventKind::Change => "change",
            EventKind::Unlink => "unlink",
            EventKind::AddDir => "addDir",
            EventKind::UnlinkDir => "unlinkDir",
        }
    }

    /// Deletions are never read from disk and skip the read delay.
    pub fn is_deletion(&self) -> bool {
        matches!(self, EventKind::Unlink | EventKind::UnlinkDir)
    }

    pub fn is_dir(&self) -> bool {
        matches!(self, EventKind::AddDir | EventKind::UnlinkDir)
    }

    /// Past-tense form used in verbose log lines.
    ///
    /// Names ending in `e` get a `d` suffix, everything else gets `ed`
    /// (`add` -> `added`, `change` -> `changed`, `addDir` -> `addDired`).
    pub fn past_tense(&self) -> String {
        let name = self.as_str();
        if name.ends_with('e') {
            format!("{name}d")
        } else {
            format!("{name}ed")
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], "").as_str() {
            "add" => Ok(EventKind::Add),
            "change" => Ok(EventKind::Change),
            "unlink" => Ok(EventKind::Unlink),
            "adddir" => Ok(EventKind::AddDir),
            "unlinkdir" => Ok(EventKind::UnlinkDir),
            other => Err(format!(
                "invalid event kind: {other} (expected one of add, change, unlink, addDir, unlinkDir)"
            )),
        }
    }
}

/// Events that produce records when the caller does not choose any.
pub fn default_events() -> Vec<EventKind> {
    vec![EventKind::Add, EventKind::Change, EventKind::Unlink]
}
