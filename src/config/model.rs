// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::tasks::TaskId;
use crate::types::TriggerWhileRunningBehaviour;

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [paths]
/// source = "app"
/// output = "dist"
///
/// [build]
/// tasks = ["markup", "stylesheet", "script"]
///
/// [server]
/// port = 3000
///
/// [watch]
/// use_hash = true
///
/// [[watch.rule]]
/// pattern = "partials/**/*.html"
/// tasks = ["markup"]
///
/// [tools]
/// sass = "sass --no-source-map --style=expanded {input} {output}"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub build: BuildSection,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub tools: ToolsSection,
}

/// `[paths]` section. Relative paths are resolved against the directory
/// that contains the config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsSection {
    pub source: PathBuf,
    pub output: PathBuf,
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            source: PathBuf::from("app"),
            output: PathBuf::from("dist"),
        }
    }
}

/// `[build]` section: the task set run by `build` and at the start of `dev`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct BuildSection {
    /// If `None`, every registered task runs.
    #[serde(default)]
    pub tasks: Option<Vec<String>>,
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub host: String,
    pub port: u16,
    /// Open the served site in the default browser once listening.
    pub open: bool,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
            open: false,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct WatchSection {
    /// Drop modify events whose file content hash did not change.
    #[serde(default)]
    pub use_hash: bool,

    #[serde(default)]
    pub while_running: TriggerWhileRunningBehaviour,

    /// Extra `[[watch.rule]]` entries, added to the built-in rules.
    #[serde(default, rename = "rule")]
    pub rules: Vec<RawWatchRule>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawWatchRule {
    /// Glob relative to the source root.
    pub pattern: String,
    /// Task names triggered by a matching change.
    pub tasks: Vec<String>,
}

/// `[tools]` section: shell command templates for external transformations.
///
/// `{input}` and `{output}` are replaced by quoted paths. An empty string
/// turns the stage into a plain copy.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ToolsSection {
    pub sass: String,
    pub autoprefixer: String,
    pub css_minify: String,
    pub js_minify: String,
    pub gif: String,
    pub jpeg: String,
    pub png: String,
    pub svg: String,
    pub svg_sprite: String,
}

impl Default for ToolsSection {
    fn default() -> Self {
        Self {
            sass: "sass --no-source-map --style=expanded {input} {output}".to_string(),
            autoprefixer: "BROWSERSLIST='last 5 versions' npx postcss {input} --use autoprefixer --no-map -o {output}"
                .to_string(),
            css_minify: "sass --no-source-map --style=compressed {input} {output}".to_string(),
            js_minify: "npx terser {input} --compress --mangle -o {output}".to_string(),
            gif: "gifsicle --interlace {input} -o {output}".to_string(),
            jpeg: "cjpeg -quality 75 -progressive -outfile {output} {input}".to_string(),
            png: "optipng -o7 -quiet -out {output} {input}".to_string(),
            svg: "npx svgo@1 --enable=removeViewBox --disable=cleanupIDs {input} -o {output}"
                .to_string(),
            svg_sprite: "npx svgo@1 --pretty {input} -o {output}".to_string(),
        }
    }
}

impl ToolsSection {
    /// `(key, template)` pairs, used for validation and `plan` output.
    pub fn entries(&self) -> [(&'static str, &str); 9] {
        [
            ("sass", &self.sass),
            ("autoprefixer", &self.autoprefixer),
            ("css_minify", &self.css_minify),
            ("js_minify", &self.js_minify),
            ("gif", &self.gif),
            ("jpeg", &self.jpeg),
            ("png", &self.png),
            ("svg", &self.svg),
            ("svg_sprite", &self.svg_sprite),
        ]
    }
}

/// A `[[watch.rule]]` entry with its task names resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchRuleSpec {
    pub pattern: String,
    pub tasks: Vec<TaskId>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// every task name in it is a known [`TaskId`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    project_root: PathBuf,
    paths: PathsSection,
    build_tasks: Vec<TaskId>,
    server: ServerSection,
    use_hash: bool,
    while_running: TriggerWhileRunningBehaviour,
    watch_rules: Vec<WatchRuleSpec>,
    tools: ToolsSection,
}

impl ConfigFile {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        paths: PathsSection,
        build_tasks: Vec<TaskId>,
        server: ServerSection,
        use_hash: bool,
        while_running: TriggerWhileRunningBehaviour,
        watch_rules: Vec<WatchRuleSpec>,
        tools: ToolsSection,
    ) -> Self {
        Self {
            project_root: PathBuf::from("."),
            paths,
            build_tasks,
            server,
            use_hash,
            while_running,
            watch_rules,
            tools,
        }
    }

    /// Resolve relative `[paths]` against `root` (the config file's directory).
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = root.into();
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn source_root(&self) -> PathBuf {
        self.project_root.join(&self.paths.source)
    }

    pub fn output_root(&self) -> PathBuf {
        self.project_root.join(&self.paths.output)
    }

    /// Task set run by `build` and at the start of `dev`.
    pub fn build_tasks(&self) -> &[TaskId] {
        &self.build_tasks
    }

    pub fn server(&self) -> &ServerSection {
        &self.server
    }

    pub fn use_hash(&self) -> bool {
        self.use_hash
    }

    pub fn while_running(&self) -> TriggerWhileRunningBehaviour {
        self.while_running
    }

    /// Extra watch rules from configuration.
    pub fn watch_rules(&self) -> &[WatchRuleSpec] {
        &self.watch_rules
    }

    pub fn tools(&self) -> &ToolsSection {
        &self.tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tools_keep_browser_targets_and_svg_ids() {
        let tools = ToolsSection::default();
        assert!(tools.autoprefixer.contains("BROWSERSLIST='last 5 versions'"));
        assert!(tools.svg.contains("--enable=removeViewBox"));
        assert!(tools.svg.contains("--disable=cleanupIDs"));
        for (key, template) in tools.entries() {
            assert!(
                template.contains("{input}") && template.contains("{output}"),
                "{key}: {template}"
            );
        }
    }
}
