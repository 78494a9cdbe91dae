// src/exec/task_runner.rs

//! Individual task invocation.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::context::BuildContext;
use crate::engine::RuntimeEvent;
use crate::tasks::{run_task, TaskId, TaskRegistry};
use crate::types::TaskOutcome;

/// Run one task and report its outcome to the runtime.
///
/// Task failures are already logged and broadcast by [`run_task`]; here they
/// only become a `Failed` outcome.
pub async fn run_and_report(
    registry: &TaskRegistry,
    ctx: &BuildContext,
    task: TaskId,
    runtime_tx: &mpsc::Sender<RuntimeEvent>,
) {
    let outcome = match run_task(registry, ctx, task).await {
        Ok(report) => {
            debug!(task = %task, written = ?report.written, "task report");
            TaskOutcome::Success
        }
        Err(_) => TaskOutcome::Failed,
    };

    if let Err(err) = runtime_tx
        .send(RuntimeEvent::TaskCompleted { task, outcome })
        .await
    {
        warn!(task = %task, error = %err, "runtime gone; dropping completion");
    }
}
