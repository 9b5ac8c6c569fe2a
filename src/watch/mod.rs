// src/watch/mod.rs

//! File watching and event correlation.
//!
//! This module is responsible for:
//! - The watcher backend abstraction and its `notify` implementation.
//! - Correlating raw event paths with the glob pattern that owns them.
//! - Path helpers shared by both.
//!
//! It does **not** read files or build records; see [`crate::record`].

pub mod backend;
pub mod correlate;
pub mod notify_backend;
pub mod path_utils;

pub use backend::{BackendEvent, BackendEventReceiver, BackendEventSender, WatchBackend};
pub use correlate::{Correlation, Correlator};
pub use notify_backend::NotifyBackend;
