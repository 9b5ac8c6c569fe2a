// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::model::WatchOptions;
use crate::types::EventKind;

/// Command-line arguments for `globwatch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "globwatch",
    version,
    about = "Watch glob patterns and print a file record for every change.",
    long_about = None
)]
pub struct CliArgs {
    /// Glob patterns to watch; prefix with `!` to exclude.
    ///
    /// When given, these replace `globs` from the config file.
    #[arg(value_name = "GLOB")]
    pub globs: Vec<String>,

    /// Path to the config file (TOML).
    ///
    /// Default: `Globwatch.toml` in the current working directory, if it
    /// exists.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Resolve patterns relative to this directory instead of making them
    /// absolute.
    #[arg(long, value_name = "DIR")]
    pub cwd: Option<PathBuf>,

    /// Force the base directory of every record.
    #[arg(long, value_name = "DIR")]
    pub base: Option<PathBuf>,

    /// Comma-separated event kinds that produce records
    /// (add, change, unlink, addDir, unlinkDir).
    #[arg(long, value_delimiter = ',', value_name = "KINDS")]
    pub events: Vec<EventKind>,

    /// Milliseconds to wait before reading a changed file.
    #[arg(long, value_name = "MS")]
    pub read_delay: Option<u64>,

    /// Report files that already exist at startup as `add`.
    #[arg(long)]
    pub include_initial: bool,

    /// Log a line for every record.
    #[arg(long)]
    pub verbose: bool,

    /// Label used in verbose log lines.
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GLOBWATCH_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve patterns and options, print them, and exit.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Overlay the flags that were given on top of `opts`.
    pub fn apply_to(&self, opts: &mut WatchOptions) {
        if let Some(cwd) = &self.cwd {
            opts.cwd = Some(cwd.clone());
        }
        if let Some(base) = &self.base {
            opts.base = Some(base.clone());
        }
        if !self.events.is_empty() {
            opts.events = self.events.clone();
        }
        if let Some(delay) = self.read_delay {
            opts.read_delay = delay;
        }
        if self.include_initial {
            opts.ignore_initial = false;
        }
        if self.verbose {
            opts.verbose = true;
        }
        if let Some(name) = &self.name {
            opts.name = Some(name.clone());
        }
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
