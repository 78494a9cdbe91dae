// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{PipelineError, Result};

/// Default config file name, looked up in the current working directory.
pub const DEFAULT_CONFIG_FILE: &str = "Assetflow.toml";

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation (task names, paths, tool templates). Use [`load_and_validate`]
/// for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| {
        PipelineError::ConfigError(format!("cannot read config file {}: {e}", path.display()))
    })?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// Relative `[paths]` are resolved against the directory containing the
/// config file.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_project_root(config_root_dir(path)))
}

/// Resolve the configuration used by the CLI.
///
/// - An explicit `--config` path must exist.
/// - Without one, `Assetflow.toml` in the working directory is used when
///   present, otherwise the built-in defaults apply.
pub fn resolve(explicit: Option<&Path>) -> Result<ConfigFile> {
    match explicit {
        Some(path) => load_and_validate(path),
        None => {
            let path = default_config_path();
            if path.is_file() {
                load_and_validate(&path)
            } else {
                debug!("no {DEFAULT_CONFIG_FILE} found; using built-in defaults");
                let config = ConfigFile::try_from(RawConfigFile::default())?;
                Ok(config.with_project_root(config_root_dir(&path)))
            }
        }
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Figure out the project root for a config path.
///
/// - If the config path has a non-empty parent (e.g. "site/Assetflow.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Assetflow.toml" (parent = ""),
///   we fall back to the current working directory.
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
