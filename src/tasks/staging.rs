// src/tasks/staging.rs

//! All-or-nothing output for a task invocation.
//!
//! Every stage writes into a private temporary directory. Only when the whole
//! pipeline succeeded are the staged files copied into the output tree, so a
//! failing external tool never leaves half-written artifacts behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::fs;
use tracing::debug;

#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    staged: Vec<String>,
    scratch_counter: usize,
}

impl Staging {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("assetflow-")
            .tempdir()
            .context("creating staging directory")?;
        Ok(Self {
            dir,
            staged: Vec::new(),
            scratch_counter: 0,
        })
    }

    /// Path for an artifact that will land at `rel` under the output root.
    /// Parent directories are created.
    pub async fn output(&mut self, rel: &str) -> Result<PathBuf> {
        let path = self.dir.path().join("out").join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating staging dir {:?}", parent))?;
        }
        if !self.staged.iter().any(|s| s == rel) {
            self.staged.push(rel.to_string());
        }
        Ok(path)
    }

    /// Fresh path for an intermediate file that is never committed.
    pub async fn scratch(&mut self, file_name: &str) -> Result<PathBuf> {
        self.scratch_counter += 1;
        let dir = self
            .dir
            .path()
            .join("work")
            .join(self.scratch_counter.to_string());
        fs::create_dir_all(&dir)
            .await
            .with_context(|| format!("creating scratch dir {:?}", dir))?;
        Ok(dir.join(file_name))
    }

    /// Copy every staged artifact into `output_root`, returning the relative
    /// paths written, in staging order.
    pub async fn commit(self, output_root: &Path) -> Result<Vec<String>> {
        let out = self.dir.path().join("out");
        for rel in &self.staged {
            let from = out.join(rel);
            let to = output_root.join(rel);
            if let Some(parent) = to.parent() {
                fs::create_dir_all(parent)
                    .await
                    .with_context(|| format!("creating output dir {:?}", parent))?;
            }
            fs::copy(&from, &to)
                .await
                .with_context(|| format!("committing {:?} to {:?}", from, to))?;
            debug!(artifact = %rel, "committed");
        }
        Ok(self.staged)
    }
}
