// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use crate::engine::core::RunSummary;
use crate::engine::queue::PendingTriggers;
use crate::engine::{RuntimeOptions, TriggerReason};
use crate::tasks::TaskId;
use crate::types::TaskOutcome;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Hand these tasks to the executor.
    DispatchTasks(Vec<TaskId>),
    /// Request that the runtime stops (one-shot builds, once idle).
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

/// Handle a trigger for a set of tasks.
///
/// - Idle tasks are marked running and dispatched, each once even if the
///   trigger lists it several times.
/// - Running tasks go through the pending queue (re-run once, or dropped).
pub fn handle_tasks_triggered(
    running: &mut BTreeSet<TaskId>,
    queue: &mut PendingTriggers,
    options: &RuntimeOptions,
    tasks: Vec<TaskId>,
    reason: TriggerReason,
) -> CoreStep {
    let mut commands = Vec::new();
    let mut ready = Vec::new();

    for task in tasks {
        if ready.contains(&task) {
            continue;
        }
        if running.insert(task) {
            ready.push(task);
        } else {
            queue.record_trigger(task);
        }
    }

    debug!(?reason, ?ready, "tasks triggered");
    if !ready.is_empty() {
        commands.push(CoreCommand::DispatchTasks(ready));
    }

    finish_step(running, queue, options, commands)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    running: &mut BTreeSet<TaskId>,
    queue: &mut PendingTriggers,
    options: &RuntimeOptions,
    summary: &mut RunSummary,
    task: TaskId,
    outcome: TaskOutcome,
) -> CoreStep {
    let mut commands = Vec::new();

    if !running.remove(&task) {
        warn!(task = %task, "completion for a task that was not running; ignoring");
        return finish_step(running, queue, options, commands);
    }
    summary.record(task, outcome);

    if queue.take(task) {
        debug!(task = %task, "dispatching queued re-run");
        running.insert(task);
        commands.push(CoreCommand::DispatchTasks(vec![task]));
    }

    finish_step(running, queue, options, commands)
}

/// In one-shot mode, stop once nothing runs and nothing is pending.
fn finish_step(
    running: &BTreeSet<TaskId>,
    queue: &PendingTriggers,
    options: &RuntimeOptions,
    mut commands: Vec<CoreCommand>,
) -> CoreStep {
    let mut keep_running = true;
    if options.exit_when_idle && running.is_empty() && queue.is_empty() {
        keep_running = false;
        commands.push(CoreCommand::RequestExit);
    }

    CoreStep {
        commands,
        keep_running,
    }
}
