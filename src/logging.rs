// src/logging.rs

//! Logging for `globwatch`.
//!
//! Two layers:
//! - [`init_logging`] installs the global `tracing-subscriber` used by the
//!   binary. Priority for the level: `--log-level`, then the
//!   `GLOBWATCH_LOG` environment variable, then `info`. Logs go to STDERR
//!   so that stdout carries only records.
//! - [`EventLogger`] is the collaborator the stream talks to for the
//!   human-readable lines (verbose per-record lines and the unresolved-path
//!   diagnostic). The default [`TracingLogger`] forwards them to `tracing`;
//!   tests inject a recording implementation.

use std::path::Path;

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;
use crate::config::model::WatchOptions;
use crate::record::FileRecord;
use crate::types::EventKind;

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => std::env::var("GLOBWATCH_LOG")
            .ok()
            .and_then(|s| parse_level_str(&s))
            .unwrap_or(tracing::Level::INFO),
    };

    fmt()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();

    Ok(())
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    Plain,
    Cyan,
    Magenta,
    Yellow,
}

/// One piece of a log line with its intended styling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub style: Style,
}

impl Segment {
    pub fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, Style::Plain)
    }

    pub fn cyan(text: impl Into<String>) -> Self {
        Self::new(text, Style::Cyan)
    }

    pub fn magenta(text: impl Into<String>) -> Self {
        Self::new(text, Style::Magenta)
    }

    pub fn yellow(text: impl Into<String>) -> Self {
        Self::new(text, Style::Yellow)
    }
}

/// Join segments with single spaces, dropping styles.
pub fn render_plain(segments: &[Segment]) -> String {
    segments
        .iter()
        .map(|s| s.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Sink for human-readable stream log lines.
pub trait EventLogger: Send + Sync {
    fn info(&self, segments: &[Segment]);
    fn warn(&self, segments: &[Segment]);
}

/// Default [`EventLogger`]: plain text through `tracing`.
#[derive(Debug, Clone, Default)]
pub struct TracingLogger;

impl EventLogger for TracingLogger {
    fn info(&self, segments: &[Segment]) {
        tracing::info!("{}", render_plain(segments));
    }

    fn warn(&self, segments: &[Segment]) {
        tracing::warn!("{}", render_plain(segments));
    }
}

/// `[<name> saw] <relative> was <past tense>`.
pub fn verbose_segments(name: Option<&str>, record: &FileRecord, kind: EventKind) -> Vec<Segment> {
    let mut segments = Vec::with_capacity(5);
    if let Some(name) = name {
        segments.push(Segment::cyan(name));
        segments.push(Segment::plain("saw"));
    }
    segments.push(Segment::magenta(record.relative().to_string_lossy()));
    segments.push(Segment::plain("was"));
    segments.push(Segment::plain(kind.past_tense()));
    segments
}

/// Diagnostic for a raw path that no pattern (or ancestor) claims.
///
/// This means the watcher reported something outside the pattern list;
/// the line carries everything needed to reproduce it.
pub fn unresolved_segments(path: &Path, globs: &[String], opts: &WatchOptions) -> Vec<Segment> {
    let rendered_opts = toml::to_string_pretty(opts).unwrap_or_else(|_| format!("{opts:#?}"));
    vec![
        Segment::cyan("[globwatch]"),
        Segment::yellow("watched an unexpected path; no glob claims it:"),
        Segment::plain(format!(
            "\nGlobs: {globs:?}\nFilepath: {}\nOptions:\n{rendered_opts}",
            path.display()
        )),
    ]
}
