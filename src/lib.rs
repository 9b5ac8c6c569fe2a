// src/lib.rs

//! Turn filesystem change notifications for a set of glob patterns into a
//! stream of file records.
//!
//! ```no_run
//! use globwatch::{StreamEvent, WatchOptions, watch};
//!
//! # async fn demo() -> globwatch::Result<()> {
//! let mut stream = watch("src/**/*.js", WatchOptions::default())?;
//! while let Some(event) = stream.recv().await {
//!     if let StreamEvent::Data(record) = event {
//!         println!("{:?} {}", record.event, record.relative().display());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod glob;
pub mod logging;
pub mod record;
pub mod stream;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, WatchConfig, default_config_path, load_from_path};

pub use crate::config::WatchOptions;
pub use crate::errors::{GlobwatchError, Result};
pub use crate::glob::GlobInput;
pub use crate::record::{FileRecord, FileStat};
pub use crate::stream::{
    Collaborators, RecordCallback, StreamEvent, WatchStream, watch, watch_with, watch_with_callback,
};
pub use crate::types::EventKind;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading (file + CLI overrides)
/// - the watch stream
/// - record printing
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let WatchConfig { globs, options } = load_config(&args)?;

    if args.dry_run {
        print_dry_run(globs, &options)?;
        return Ok(());
    }

    let mut stream = watch(globs, options)?;

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        let step = tokio::select! {
            event = stream.recv() => Step::Event(event),
            res = &mut shutdown => Step::Shutdown(res),
        };

        match step {
            Step::Event(Some(event)) => handle_event(event),
            Step::Event(None) => break,
            Step::Shutdown(res) => {
                if let Err(e) = res {
                    eprintln!("failed to listen for Ctrl+C: {e}");
                }
                stream.close()?;
                break;
            }
        }
    }

    // Drain whatever was queued before `End`.
    while let Some(event) = stream.recv().await {
        handle_event(event);
    }

    info!("globwatch exiting");
    Ok(())
}

enum Step {
    Event(Option<StreamEvent>),
    Shutdown(std::io::Result<()>),
}

/// Build the effective config: file (explicit, or `Globwatch.toml` when it
/// exists), then CLI globs and flags on top.
pub fn load_config(args: &CliArgs) -> crate::Result<WatchConfig> {
    let path = match &args.config {
        Some(p) => Some(PathBuf::from(p)),
        None => Some(default_config_path()).filter(|p| p.exists()),
    };

    let mut raw = match &path {
        Some(p) => {
            let mut raw = load_from_path(p)?;
            if let Some(cwd) = raw.options.cwd.take() {
                raw.options.cwd = Some(if cwd.is_relative() {
                    config_root_dir(p).join(cwd)
                } else {
                    cwd
                });
            }
            raw
        }
        None => ConfigFile::default(),
    };

    if !args.globs.is_empty() {
        raw.globs = Some(toml::Value::Array(
            args.globs.iter().cloned().map(toml::Value::String).collect(),
        ));
    }
    args.apply_to(&mut raw.options);

    WatchConfig::try_from(raw)
}

/// Directory a config-relative `cwd` is resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Globwatch.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Globwatch.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn handle_event(event: StreamEvent) {
    match event {
        StreamEvent::Data(record) => println!("{}", describe_record(&record)),
        StreamEvent::Error(err) => warn!(error = %err, "stream error"),
        StreamEvent::Ready => info!("ready; waiting for changes"),
        StreamEvent::Raw(raw) => debug!(%raw, "raw watcher event"),
        StreamEvent::Watcher { kind, path } => debug!(%kind, ?path, "watcher event"),
        StreamEvent::End => debug!("stream ended"),
    }
}

/// One stdout line per record: event, relative path, size.
pub fn describe_record(record: &FileRecord) -> String {
    let event = record
        .event
        .map(|e| e.to_string())
        .unwrap_or_else(|| "data".to_string());
    let detail = match (&record.contents, &record.stat) {
        (Some(contents), _) => format!("{} bytes", contents.len()),
        (None, Some(stat)) if stat.is_dir => "directory".to_string(),
        _ => "no content".to_string(),
    };
    format!("{event:<9} {} ({detail})", record.relative().display())
}

/// Simple dry-run output: resolved patterns and effective options.
fn print_dry_run(globs: GlobInput, options: &WatchOptions) -> anyhow::Result<()> {
    let patterns = glob::normalize_globs(globs, options.cwd.as_deref())?;

    println!("globwatch dry-run");
    println!("patterns ({}):", patterns.len());
    for pattern in &patterns {
        println!("  - {pattern}  (base: {})", glob::glob_base(pattern).display());
    }
    println!();
    println!("options:");
    print!("{}", toml::to_string_pretty(options)?);

    debug!("dry-run complete (no watching)");
    Ok(())
}
