// src/errors.rs

//! Crate-wide error aliases and helpers.

use std::path::PathBuf;

use thiserror::Error;

use crate::tasks::TaskId;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown task: {0}")]
    UnknownTask(String),

    #[error("Task '{task}' failed: {message}")]
    Transform { task: TaskId, message: String },

    #[error("Filesystem error at {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipelineError {
    /// Wrap the error chain of a failed pipeline stage into a task-level error.
    pub fn transform(task: TaskId, err: &anyhow::Error) -> Self {
        PipelineError::Transform {
            task,
            message: format!("{err:#}"),
        }
    }

    /// True for errors that mean the configuration itself is unusable.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PipelineError::ConfigError(_) | PipelineError::UnknownTask(_) | PipelineError::TomlError(_)
        )
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PipelineError>;
