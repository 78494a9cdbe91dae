// src/tasks/stylesheet.rs

//! Stylesheet task.
//!
//! Per entry point (`sass/**/*.{scss,sass}`, partials excluded):
//! 1. external compile to expanded CSS
//! 2. external vendor prefixing
//! 3. WebP-aware `url()` rewrite
//! 4. write `css/<name>.css`
//! 5. external minify of that file to `css/<name>.min.css`

use std::sync::LazyLock;

use anyhow::{Context, Result};
use regex::{Captures, Regex};
use tokio::fs;
use tracing::debug;

use crate::context::{layout, BuildContext};
use crate::tasks::command::ExternalTool;
use crate::tasks::markup::webp_variant;
use crate::tasks::selector::{SourceFile, SourceSelector};
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

static RULE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([^{}]+)\{([^{}]*)\}").unwrap());
static COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static URL_FN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)url\(\s*(["']?)([^"')]+)["']?\s*\)"#).unwrap());

#[derive(Debug)]
pub struct StylesheetTask {
    selector: SourceSelector,
}

impl StylesheetTask {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selector: SourceSelector::new(layout::SASS_DIR, &["**/*.{scss,sass}"], &[])?,
        })
    }

    async fn compile_all(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let entries = self.inputs(ctx)?;
        let mut staging = Staging::new()?;

        for entry in &entries {
            compile_entry(ctx, &mut staging, entry)
                .await
                .with_context(|| format!("compiling {}", entry.rel))?;
        }

        Ok(TaskReport {
            task: TaskId::Stylesheet,
            written: staging.commit(ctx.output_root()).await?,
        })
    }
}

impl Transform for StylesheetTask {
    fn id(&self) -> TaskId {
        TaskId::Stylesheet
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        layout::CSS_OUT_DIR
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.compile_all(ctx))
    }
}

async fn compile_entry(ctx: &BuildContext, staging: &mut Staging, entry: &SourceFile) -> Result<()> {
    let tools = ctx.tools();
    let stem = strip_extension(&entry.rel);
    let file_stem = stem.rsplit('/').next().unwrap_or(stem);

    let compiled = staging.scratch(&format!("{file_stem}.css")).await?;
    ExternalTool::new("sass", &tools.sass)
        .apply(&entry.path, &compiled)
        .await?;

    let prefixed = staging.scratch(&format!("{file_stem}.css")).await?;
    ExternalTool::new("autoprefixer", &tools.autoprefixer)
        .apply(&compiled, &prefixed)
        .await?;

    let css = fs::read_to_string(&prefixed)
        .await
        .with_context(|| format!("reading prefixed css {:?}", prefixed))?;
    let expanded = staging
        .output(&format!("{}/{stem}.css", layout::CSS_OUT_DIR))
        .await?;
    fs::write(&expanded, rewrite_webp_urls(&css))
        .await
        .with_context(|| format!("writing {:?}", expanded))?;

    let minified = staging
        .output(&format!("{}/{stem}.min.css", layout::CSS_OUT_DIR))
        .await?;
    ExternalTool::new("css_minify", &tools.css_minify)
        .apply(&expanded, &minified)
        .await?;

    debug!(entry = %entry.rel, "stylesheet compiled");
    Ok(())
}

fn strip_extension(rel: &str) -> &str {
    match rel.rfind('.') {
        Some(dot) if !rel[dot..].contains('/') => &rel[..dot],
        _ => rel,
    }
}

/// Add a `.webp`-scoped copy of every rule that references a jpg/jpeg/png,
/// pointing at the re-encoded `.webp` file.
///
/// The original rule is kept as the fallback; pages are expected to put a
/// `webp` class on `<html>` when the browser supports the format.
pub fn rewrite_webp_urls(css: &str) -> String {
    RULE.replace_all(css, |caps: &Captures| {
        let original = &caps[0];
        let selector = COMMENT.replace_all(&caps[1], "");
        let selector = selector.trim();
        if selector.is_empty() || selector.starts_with('@') {
            return original.to_string();
        }

        let webp_decls: Vec<String> = caps[2]
            .split(';')
            .filter_map(|decl| {
                let mut changed = false;
                let rewritten = URL_FN.replace_all(decl, |u: &Captures| match webp_variant(&u[2]) {
                    Some(webp) => {
                        changed = true;
                        format!("url({q}{webp}{q})", q = &u[1])
                    }
                    None => u[0].to_string(),
                });
                changed.then(|| rewritten.trim().to_string())
            })
            .collect();

        if webp_decls.is_empty() {
            return original.to_string();
        }

        let scoped = selector
            .split(',')
            .map(|s| format!(".webp {}", s.trim()))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{original}\n{scoped} {{ {}; }}", webp_decls.join("; "))
    })
    .into_owned()
}
