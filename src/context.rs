// src/context.rs

//! The build context handed to every task, the executor, the watcher and the
//! dev server.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ConfigFile, ToolsSection};
use crate::fs::{FileSystem, RealFileSystem};
use crate::server::ReloadSignal;

/// Conventional subdirectories of the source root.
pub mod layout {
    pub const SASS_DIR: &str = "sass";
    pub const IMG_DIR: &str = "img";
    pub const JS_DIR: &str = "js";
    pub const FONTS_DIR: &str = "fonts";
    pub const FILES_DIR: &str = "files";
    pub const MAILER_DIR: &str = "phpMailer";

    /// Output subdirectories that differ from their source counterpart.
    pub const CSS_OUT_DIR: &str = "css";
    pub const SPRITE_FILE: &str = "sprite.svg";
    pub const SCRIPT_BUNDLE: &str = "app.js";
}

/// Explicit replacement for a single global output directory and dev-server
/// instance. Tests create one per temporary directory.
#[derive(Debug, Clone)]
pub struct BuildContext {
    source_root: PathBuf,
    output_root: PathBuf,
    tools: Arc<ToolsSection>,
    fs: Arc<dyn FileSystem>,
    reload: ReloadSignal,
}

impl BuildContext {
    pub fn new(
        source_root: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        tools: ToolsSection,
    ) -> Self {
        Self {
            source_root: source_root.into(),
            output_root: output_root.into(),
            tools: Arc::new(tools),
            fs: Arc::new(RealFileSystem),
            reload: ReloadSignal::new(),
        }
    }

    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self::new(cfg.source_root(), cfg.output_root(), cfg.tools().clone())
    }

    /// Swap the filesystem used for discovery and cleaning.
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    pub fn tools(&self) -> &ToolsSection {
        &self.tools
    }

    pub fn fs(&self) -> &dyn FileSystem {
        self.fs.as_ref()
    }

    pub fn fs_handle(&self) -> Arc<dyn FileSystem> {
        Arc::clone(&self.fs)
    }

    pub fn reload(&self) -> &ReloadSignal {
        &self.reload
    }
}
