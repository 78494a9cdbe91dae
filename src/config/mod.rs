// src/config/mod.rs

//! Configuration loading and validation for assetflow.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate task names, paths and tool templates (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve, DEFAULT_CONFIG_FILE};
pub use model::{
    BuildSection, ConfigFile, PathsSection, RawConfigFile, RawWatchRule, ServerSection,
    ToolsSection, WatchRuleSpec, WatchSection,
};
