// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of running tasks
//! itself. Tests swap in a fake executor that records dispatched ids and
//! reports completions without touching the filesystem.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::context::BuildContext;
use crate::engine::RuntimeEvent;
use crate::errors::Result;
use crate::exec::task_runner::run_and_report;
use crate::tasks::{TaskId, TaskRegistry};

/// Trait abstracting how dispatched tasks are executed.
pub trait ExecutorBackend: Send {
    /// Start the given tasks. Implementations must eventually send one
    /// `RuntimeEvent::TaskCompleted` per task.
    fn spawn_tasks(
        &mut self,
        tasks: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Production backend: one tokio task per invocation, running the task
/// from the registry against the shared build context.
pub struct PipelineExecutor {
    registry: Arc<TaskRegistry>,
    ctx: BuildContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl PipelineExecutor {
    pub fn new(
        registry: Arc<TaskRegistry>,
        ctx: BuildContext,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            registry,
            ctx,
            runtime_tx,
        }
    }
}

impl ExecutorBackend for PipelineExecutor {
    fn spawn_tasks(
        &mut self,
        tasks: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(async move {
            for task in tasks {
                let registry = Arc::clone(&self.registry);
                let ctx = self.ctx.clone();
                let tx = self.runtime_tx.clone();
                tokio::spawn(async move {
                    run_and_report(&registry, &ctx, task, &tx).await;
                });
            }
            Ok(())
        })
    }
}
