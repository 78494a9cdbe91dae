#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use assetflow::config::{ConfigFile, RawConfigFile, RawWatchRule, ToolsSection};
use assetflow::context::BuildContext;
use tempfile::TempDir;

use crate::{copy_tools, png_bytes};

/// Builder for a temporary project: `app/` sources and a `dist/` output
/// root inside one `TempDir`.
pub struct SiteBuilder {
    files: Vec<(String, Vec<u8>)>,
    tools: ToolsSection,
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            tools: copy_tools(),
        }
    }

    /// Add a source file, relative to the source root.
    pub fn file(mut self, rel: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.files.push((rel.to_string(), contents.into()));
        self
    }

    pub fn png(self, rel: &str) -> Self {
        self.file(rel, png_bytes(4, 4))
    }

    pub fn tool(mut self, key: &str, template: &str) -> Self {
        let slot = match key {
            "sass" => &mut self.tools.sass,
            "autoprefixer" => &mut self.tools.autoprefixer,
            "css_minify" => &mut self.tools.css_minify,
            "js_minify" => &mut self.tools.js_minify,
            "gif" => &mut self.tools.gif,
            "jpeg" => &mut self.tools.jpeg,
            "png" => &mut self.tools.png,
            "svg" => &mut self.tools.svg,
            "svg_sprite" => &mut self.tools.svg_sprite,
            other => panic!("unknown tool key {other}"),
        };
        *slot = template.to_string();
        self
    }

    pub fn build(self) -> Result<Site> {
        let dir = tempfile::tempdir()?;
        let source = dir.path().join("app");
        let output = dir.path().join("dist");
        fs::create_dir_all(&source)?;

        let site = Site {
            dir,
            source,
            output,
            tools: self.tools,
        };
        for (rel, contents) in &self.files {
            site.write_source(rel, contents)?;
        }
        Ok(site)
    }
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A temporary project on disk. Removed when dropped.
pub struct Site {
    dir: TempDir,
    pub source: PathBuf,
    pub output: PathBuf,
    pub tools: ToolsSection,
}

impl Site {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// A fresh build context over this project.
    pub fn context(&self) -> BuildContext {
        BuildContext::new(&self.source, &self.output, self.tools.clone())
    }

    pub fn write_source(&self, rel: &str, contents: impl AsRef<[u8]>) -> Result<()> {
        let path = self.source.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents).with_context(|| format!("writing {path:?}"))
    }

    pub fn remove_source(&self, rel: &str) -> Result<()> {
        fs::remove_file(self.source.join(rel)).with_context(|| format!("removing {rel}"))
    }

    pub fn output_path(&self, rel: &str) -> PathBuf {
        self.output.join(rel)
    }

    pub fn read_output(&self, rel: &str) -> Result<String> {
        let path = self.output_path(rel);
        fs::read_to_string(&path).with_context(|| format!("reading {path:?}"))
    }

    /// Every file under the output root, relative and with forward slashes.
    pub fn output_files(&self) -> Result<Vec<String>> {
        Ok(self.output_snapshot()?.into_keys().collect())
    }

    /// Contents of every output file, keyed by relative path.
    pub fn output_snapshot(&self) -> Result<BTreeMap<String, Vec<u8>>> {
        let mut out = BTreeMap::new();
        if self.output.is_dir() {
            collect(&self.output, &self.output, &mut |rel, path| {
                out.insert(rel, fs::read(path)?);
                Ok(())
            })?;
        }
        Ok(out)
    }

    /// Modification times of every output file, keyed by relative path.
    pub fn output_mtimes(&self) -> Result<BTreeMap<String, SystemTime>> {
        let mut out = BTreeMap::new();
        if self.output.is_dir() {
            collect(&self.output, &self.output, &mut |rel, path| {
                out.insert(rel, fs::metadata(path)?.modified()?);
                Ok(())
            })?;
        }
        Ok(out)
    }

    /// Write `Assetflow.toml` at the project root and load it.
    pub fn config(&self, extra_toml: &str) -> Result<ConfigFile> {
        let path = self.dir.path().join("Assetflow.toml");
        fs::write(&path, format!("[paths]\nsource = \"app\"\noutput = \"dist\"\n\n{extra_toml}"))?;
        Ok(assetflow::config::load_and_validate(&path)?)
    }
}

fn collect(
    root: &Path,
    dir: &Path,
    visit: &mut dyn FnMut(String, &Path) -> Result<()>,
) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            collect(root, &path, visit)?;
        } else {
            let rel = path
                .strip_prefix(root)?
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect::<Vec<_>>()
                .join("/");
            visit(rel, &path)?;
        }
    }
    Ok(())
}

/// Builder for `RawConfigFile`, validated into a `ConfigFile`.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn build_tasks(mut self, names: &[&str]) -> Self {
        self.config.build.tasks = Some(names.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn watch_rule(mut self, pattern: &str, tasks: &[&str]) -> Self {
        self.config.watch.rules.push(RawWatchRule {
            pattern: pattern.to_string(),
            tasks: tasks.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    pub fn use_hash(mut self, val: bool) -> Self {
        self.config.watch.use_hash = val;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}
