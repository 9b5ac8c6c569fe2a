// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, WatchOptions};
use crate::config::validate::validate_options;
use crate::errors::Result;
use crate::glob::GlobInput;

/// A config file that passed validation: typed globs plus options.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub globs: GlobInput,
    pub options: WatchOptions,
}

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** check the
/// `globs` value or the options. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: ConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Turns `globs` into a [`GlobInput`] (string or list, nothing else).
/// - Checks the options (see [`validate_options`]).
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let raw = load_from_path(&path)?;
    WatchConfig::try_from(raw)
}

impl TryFrom<ConfigFile> for WatchConfig {
    type Error = crate::errors::GlobwatchError;

    fn try_from(raw: ConfigFile) -> Result<Self> {
        let globs = GlobInput::from_toml(raw.globs.as_ref())?;
        validate_options(&raw.options)?;
        Ok(WatchConfig {
            globs,
            options: raw.options,
        })
    }
}

/// Default config location: `Globwatch.toml` in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Globwatch.toml")
}
