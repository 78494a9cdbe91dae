// src/tasks/mod.rs

//! Build tasks and the registry that names them.
//!
//! - [`id`] is the closed set of task identifiers.
//! - [`selector`] picks source files (never underscore partials).
//! - [`staging`] makes a task's output all-or-nothing.
//! - [`command`] runs external transformation tools.
//! - one module per transformation: [`markup`], [`stylesheet`], [`image`],
//!   [`script`], [`sprite`], and the passthrough [`copy`] tasks.
//! - [`clean`] deletes the output tree.

pub mod clean;
pub mod command;
pub mod copy;
pub mod id;
pub mod image;
pub mod markup;
pub mod script;
pub mod selector;
pub mod sprite;
pub mod staging;
pub mod stylesheet;

use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use tracing::{error, info};

use crate::context::BuildContext;
use crate::errors::PipelineError;

pub use id::{parse_task_names, TaskId};
pub use selector::{SourceFile, SourceSelector};

/// Files a successful invocation wrote, relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskReport {
    pub task: TaskId,
    pub written: Vec<String>,
}

pub type TaskFuture<'a> = Pin<Box<dyn Future<Output = Result<TaskReport>> + Send + 'a>>;

/// One source-to-destination transformation.
///
/// Implementations read from `ctx.source_root()`, stage their output and
/// commit it under `ctx.output_root()` only when every stage succeeded.
pub trait Transform: Send + Sync + fmt::Debug {
    fn id(&self) -> TaskId;

    /// Selectors that define the task's input set.
    fn selectors(&self) -> Vec<&SourceSelector>;

    /// Destination, relative to the output root, for display.
    fn destination(&self) -> &'static str;

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a>;

    /// The files this task would read directly, sorted and deduplicated.
    fn inputs(&self, ctx: &BuildContext) -> Result<Vec<SourceFile>> {
        let mut files = Vec::new();
        for selector in self.selectors() {
            files.extend(selector.collect(ctx.fs(), ctx.source_root())?);
        }
        files.sort();
        files.dedup();
        Ok(files)
    }
}

/// Mapping from task id to its transformation. Built once at startup.
#[derive(Debug, Clone)]
pub struct TaskRegistry {
    tasks: BTreeMap<TaskId, Arc<dyn Transform>>,
}

impl TaskRegistry {
    /// Registry with every built-in task.
    pub fn standard() -> Result<Self> {
        Ok(Self::builder()
            .register(markup::MarkupTask::new()?)
            .register(copy::CopyTask::fonts()?)
            .register(stylesheet::StylesheetTask::new()?)
            .register(image::ImageTask::new()?)
            .register(script::ScriptTask::new()?)
            .register(copy::CopyTask::server_pages()?)
            .register(sprite::SpriteTask::new()?)
            .register(copy::CopyTask::static_files()?)
            .register(copy::CopyTask::mailer_assets()?)
            .build())
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            tasks: BTreeMap::new(),
        }
    }

    pub fn contains(&self, id: TaskId) -> bool {
        self.tasks.contains_key(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = TaskId> + '_ {
        self.tasks.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TaskId, &Arc<dyn Transform>)> + '_ {
        self.tasks.iter().map(|(id, t)| (*id, t))
    }

    pub fn get(&self, id: TaskId) -> std::result::Result<Arc<dyn Transform>, PipelineError> {
        self.tasks.get(&id).cloned().ok_or_else(|| {
            PipelineError::ConfigError(format!("task '{id}' is not registered"))
        })
    }

    /// Check that every id of a composite task set is registered.
    pub fn resolve(&self, ids: &[TaskId]) -> std::result::Result<Vec<TaskId>, PipelineError> {
        for id in ids {
            self.get(*id)?;
        }
        Ok(ids.to_vec())
    }
}

pub struct RegistryBuilder {
    tasks: BTreeMap<TaskId, Arc<dyn Transform>>,
}

impl RegistryBuilder {
    /// Register a transform under its own id; a later registration replaces
    /// an earlier one.
    pub fn register<T: Transform + 'static>(mut self, task: T) -> Self {
        self.tasks.insert(task.id(), Arc::new(task));
        self
    }

    pub fn build(self) -> TaskRegistry {
        TaskRegistry { tasks: self.tasks }
    }
}

/// Run one task to completion and fire the reload signal.
///
/// Failures are logged with the task name, broadcast to dev clients and
/// returned; they never affect other tasks.
pub async fn run_task(
    registry: &TaskRegistry,
    ctx: &BuildContext,
    id: TaskId,
) -> std::result::Result<TaskReport, PipelineError> {
    let task = registry.get(id)?;
    let started = Instant::now();
    info!(task = %id, "task started");

    match task.run(ctx).await {
        Ok(report) => {
            info!(
                task = %id,
                written = report.written.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "task finished"
            );
            ctx.reload().changed(id);
            Ok(report)
        }
        Err(err) => {
            let err = PipelineError::transform(id, &err);
            error!(task = %id, error = %err, "task failed");
            if let PipelineError::Transform { message, .. } = &err {
                ctx.reload().failed(id, message.clone());
            }
            Err(err)
        }
    }
}
