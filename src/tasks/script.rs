// src/tasks/script.rs

//! Script task: concatenate every script into one bundle, then minify it.

use anyhow::{Context, Result};
use tokio::fs;

use crate::context::{layout, BuildContext};
use crate::tasks::command::ExternalTool;
use crate::tasks::selector::{SourceFile, SourceSelector};
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

#[derive(Debug)]
pub struct ScriptTask {
    selector: SourceSelector,
}

impl ScriptTask {
    pub fn new() -> Result<Self> {
        Ok(Self {
            selector: SourceSelector::new(layout::JS_DIR, &["**/*.js"], &[])?,
        })
    }

    async fn bundle(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let sources = self.inputs(ctx)?;
        if sources.is_empty() {
            return Ok(TaskReport {
                task: TaskId::Script,
                written: Vec::new(),
            });
        }

        let mut staging = Staging::new()?;
        let bundle_rel = format!("{}/{}", layout::JS_DIR, layout::SCRIPT_BUNDLE);
        let bundle = staging.output(&bundle_rel).await?;
        fs::write(&bundle, concat_sources(&sources).await?)
            .await
            .with_context(|| format!("writing {bundle_rel}"))?;

        let minified = staging.output(&minified_name(&bundle_rel)).await?;
        ExternalTool::new("js_minify", &ctx.tools().js_minify)
            .apply(&bundle, &minified)
            .await?;

        Ok(TaskReport {
            task: TaskId::Script,
            written: staging.commit(ctx.output_root()).await?,
        })
    }
}

impl Transform for ScriptTask {
    fn id(&self) -> TaskId {
        TaskId::Script
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        layout::JS_DIR
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.bundle(ctx))
    }
}

/// Sources are already sorted by relative path; they are joined with a
/// single newline.
async fn concat_sources(sources: &[SourceFile]) -> Result<String> {
    let mut parts = Vec::with_capacity(sources.len());
    for src in sources {
        parts.push(
            fs::read_to_string(&src.path)
                .await
                .with_context(|| format!("reading script {:?}", src.path))?,
        );
    }
    Ok(parts.join("\n"))
}

fn minified_name(rel: &str) -> String {
    match rel.strip_suffix(".js") {
        Some(stem) => format!("{stem}.min.js"),
        None => format!("{rel}.min"),
    }
}
