// src/config/mod.rs

//! Configuration loading and validation for globwatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate option invariants (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{WatchConfig, default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, DEFAULT_READ_DELAY_MS, WatchOptions};
pub use validate::validate_options;
