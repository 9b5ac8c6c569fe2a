// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::WatchOptions;
use crate::errors::{GlobwatchError, Result};

/// Run semantic validation against loaded options.
///
/// This checks:
/// - `events` is not empty and has no duplicates
/// - `name`, when present, is not blank
/// - `cwd` / `base`, when present, are not empty paths
///
/// It does **not** check that `cwd` or `base` exist; the watcher backend
/// reports that when it starts.
pub fn validate_options(opts: &WatchOptions) -> Result<()> {
    validate_events(opts)?;
    validate_name(opts)?;
    validate_paths(opts)?;
    Ok(())
}

fn validate_events(opts: &WatchOptions) -> Result<()> {
    if opts.events.is_empty() {
        return Err(GlobwatchError::ConfigError(
            "[options].events must list at least one event kind".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    for kind in &opts.events {
        if !seen.insert(*kind) {
            return Err(GlobwatchError::ConfigError(format!(
                "[options].events lists '{kind}' more than once"
            )));
        }
    }
    Ok(())
}

fn validate_name(opts: &WatchOptions) -> Result<()> {
    if let Some(name) = &opts.name {
        if name.trim().is_empty() {
            return Err(GlobwatchError::ConfigError(
                "[options].name must not be blank".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_paths(opts: &WatchOptions) -> Result<()> {
    for (field, value) in [("cwd", &opts.cwd), ("base", &opts.base)] {
        if let Some(path) = value {
            if path.as_os_str().is_empty() {
                return Err(GlobwatchError::ConfigError(format!(
                    "[options].{field} must not be an empty path"
                )));
            }
        }
    }
    Ok(())
}
