// src/tasks/selector.rs

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};

use crate::fs::FileSystem;

/// A source file picked by a selector.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceFile {
    /// Absolute (or source-root based) path to read from.
    pub path: PathBuf,
    /// Path relative to the selector base, with forward slashes.
    pub rel: String,
}

/// Glob-based source selection beneath one subdirectory of the source root.
///
/// Files whose name starts with `_` are private partials: they are never
/// selected, whatever the include patterns say.
#[derive(Clone)]
pub struct SourceSelector {
    base: String,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
    include: GlobSet,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for SourceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceSelector")
            .field("base", &self.base)
            .field("include", &self.include_patterns)
            .field("exclude", &self.exclude_patterns)
            .finish()
    }
}

impl SourceSelector {
    /// `base` is a subdirectory of the source root (`""` for the root itself);
    /// patterns are relative to it.
    pub fn new(base: &str, include: &[&str], exclude: &[&str]) -> Result<Self> {
        let include_set = build_globset(include)
            .with_context(|| format!("building include globset for '{base}'"))?;
        let exclude_set = if exclude.is_empty() {
            None
        } else {
            Some(
                build_globset(exclude)
                    .with_context(|| format!("building exclude globset for '{base}'"))?,
            )
        };

        Ok(Self {
            base: base.to_string(),
            include_patterns: include.iter().map(|s| s.to_string()).collect(),
            exclude_patterns: exclude.iter().map(|s| s.to_string()).collect(),
            include: include_set,
            exclude: exclude_set,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Returns true if `rel` (relative to the base, forward slashes) is a
    /// direct input of this selector.
    pub fn matches(&self, rel: &str) -> bool {
        if is_partial(rel) || !self.include.is_match(rel) {
            return false;
        }
        match &self.exclude {
            Some(exclude) => !exclude.is_match(rel),
            None => true,
        }
    }

    /// Collect every matching file beneath `source_root/base`, sorted by
    /// relative path. A missing base directory yields no files.
    pub fn collect(&self, fs: &dyn FileSystem, source_root: &Path) -> Result<Vec<SourceFile>> {
        let root = self.base_dir(source_root);
        let mut files = Vec::new();

        if !fs.is_dir(&root) {
            return Ok(files);
        }

        let mut stack = vec![root.clone()];
        while let Some(dir) = stack.pop() {
            for path in fs.read_dir(&dir)? {
                if fs.is_dir(&path) {
                    stack.push(path);
                } else if fs.is_file(&path) {
                    if let Ok(rel) = path.strip_prefix(&root) {
                        let rel = rel.to_string_lossy().replace('\\', "/");
                        if self.matches(&rel) {
                            files.push(SourceFile { path, rel });
                        }
                    }
                }
            }
        }

        files.sort_by(|a, b| a.rel.cmp(&b.rel));
        Ok(files)
    }

    pub fn base_dir(&self, source_root: &Path) -> PathBuf {
        if self.base.is_empty() {
            source_root.to_path_buf()
        } else {
            source_root.join(&self.base)
        }
    }

    /// Human readable summary for `plan`.
    pub fn describe(&self) -> String {
        let prefix = if self.base.is_empty() {
            String::new()
        } else {
            format!("{}/", self.base)
        };
        let mut out = self
            .include_patterns
            .iter()
            .map(|p| format!("{prefix}{p}"))
            .collect::<Vec<_>>()
            .join(", ");
        for ex in &self.exclude_patterns {
            out.push_str(&format!(" !{prefix}{ex}"));
        }
        out.push_str(" !**/_*");
        out
    }
}

/// True when the file name (last component) marks a private partial.
pub fn is_partial(rel: &str) -> bool {
    rel.rsplit('/').next().is_some_and(|name| name.starts_with('_'))
}

/// Build a GlobSet where `*` stays within one path component.
pub(crate) fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .with_context(|| format!("invalid glob pattern: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
