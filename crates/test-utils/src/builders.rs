#![allow(dead_code)]

use std::path::PathBuf;

use globwatch::{EventKind, WatchOptions};

/// Builder for `WatchOptions` to simplify test setup.
///
/// Starts from the library defaults except `read_delay`, which is zero so
/// tests don't sleep unless they ask to.
pub struct WatchOptionsBuilder {
    options: WatchOptions,
}

impl WatchOptionsBuilder {
    pub fn new() -> Self {
        Self {
            options: WatchOptions {
                read_delay: 0,
                ..WatchOptions::default()
            },
        }
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options.cwd = Some(cwd.into());
        self
    }

    pub fn base(mut self, base: impl Into<PathBuf>) -> Self {
        self.options.base = Some(base.into());
        self
    }

    pub fn events(mut self, events: &[EventKind]) -> Self {
        self.options.events = events.to_vec();
        self
    }

    pub fn read_delay(mut self, ms: u64) -> Self {
        self.options.read_delay = ms;
        self
    }

    pub fn include_initial(mut self) -> Self {
        self.options.ignore_initial = false;
        self
    }

    pub fn verbose(mut self, name: Option<&str>) -> Self {
        self.options.verbose = true;
        self.options.name = name.map(str::to_string);
        self
    }

    pub fn build(self) -> WatchOptions {
        self.options
    }
}

impl Default for WatchOptionsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
