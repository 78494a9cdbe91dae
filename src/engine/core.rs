// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async/IO-heavy shell (`engine::runtime::Runtime`) is responsible for:
//! - reading events from channels
//! - handing task ids to the executor
//! - handling Ctrl+C / shutdown
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use std::collections::BTreeSet;

use crate::engine::event_handlers::{handle_task_completion, handle_tasks_triggered, CoreStep};
use crate::engine::queue::PendingTriggers;
use crate::engine::{RuntimeEvent, RuntimeOptions};
use crate::tasks::TaskId;
use crate::types::{TaskOutcome, TriggerWhileRunningBehaviour};

/// Public view of one task's state in the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskState {
    Idle,
    Running,
    /// Running, and triggered again meanwhile; it runs once more afterwards.
    RunningWithPending,
}

/// What happened over the lifetime of a runtime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub invocations: usize,
    /// Tasks whose latest invocation failed, sorted.
    pub failed: BTreeSet<TaskId>,
    /// Set when the runtime stopped because of a shutdown request.
    pub interrupted: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && !self.interrupted
    }

    pub(crate) fn record(&mut self, task: TaskId, outcome: TaskOutcome) {
        self.invocations += 1;
        if outcome.is_success() {
            self.failed.remove(&task);
        } else {
            self.failed.insert(task);
        }
    }
}

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    running: BTreeSet<TaskId>,
    queue: PendingTriggers,
    options: RuntimeOptions,
    summary: RunSummary,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, options: RuntimeOptions) -> Self {
        Self {
            running: BTreeSet::new(),
            queue: PendingTriggers::new(behaviour),
            options,
            summary: RunSummary::default(),
        }
    }

    /// Idle means no task is running; otherwise the core is dispatching.
    pub fn is_idle(&self) -> bool {
        self.running.is_empty()
    }

    pub fn queue_is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn state_of(&self, task: TaskId) -> TaskState {
        match (self.running.contains(&task), self.queue.contains(task)) {
            (false, _) => TaskState::Idle,
            (true, false) => TaskState::Running,
            (true, true) => TaskState::RunningWithPending,
        }
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_summary(self) -> RunSummary {
        self.summary
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TasksTriggered { tasks, reason } => handle_tasks_triggered(
                &mut self.running,
                &mut self.queue,
                &self.options,
                tasks,
                reason,
            ),
            RuntimeEvent::TaskCompleted { task, outcome } => handle_task_completion(
                &mut self.running,
                &mut self.queue,
                &self.options,
                &mut self.summary,
                task,
                outcome,
            ),
            RuntimeEvent::ShutdownRequested => {
                self.summary.interrupted = true;
                CoreStep {
                    commands: Vec::new(),
                    keep_running: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CoreCommand, TriggerReason};

    fn trigger(tasks: &[TaskId]) -> RuntimeEvent {
        RuntimeEvent::TasksTriggered {
            tasks: tasks.to_vec(),
            reason: TriggerReason::FileWatch,
        }
    }

    fn done(task: TaskId, outcome: TaskOutcome) -> RuntimeEvent {
        RuntimeEvent::TaskCompleted { task, outcome }
    }

    fn dispatched(step: &CoreStep) -> Vec<TaskId> {
        step.commands
            .iter()
            .flat_map(|c| match c {
                CoreCommand::DispatchTasks(t) => t.clone(),
                CoreCommand::RequestExit => Vec::new(),
            })
            .collect()
    }

    #[test]
    fn trigger_dispatches_each_task_once() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, RuntimeOptions::default());
        let step = core.step(trigger(&[TaskId::Image, TaskId::Sprite, TaskId::Image]));

        assert_eq!(dispatched(&step), vec![TaskId::Image, TaskId::Sprite]);
        assert!(step.keep_running);
        assert!(!core.is_idle());
        assert_eq!(core.state_of(TaskId::Image), TaskState::Running);
    }

    #[test]
    fn retrigger_while_running_runs_once_more() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, RuntimeOptions::default());
        core.step(trigger(&[TaskId::Stylesheet]));

        assert!(dispatched(&core.step(trigger(&[TaskId::Stylesheet]))).is_empty());
        assert!(dispatched(&core.step(trigger(&[TaskId::Stylesheet]))).is_empty());
        assert_eq!(core.state_of(TaskId::Stylesheet), TaskState::RunningWithPending);

        let step = core.step(done(TaskId::Stylesheet, TaskOutcome::Success));
        assert_eq!(dispatched(&step), vec![TaskId::Stylesheet]);
        assert_eq!(core.state_of(TaskId::Stylesheet), TaskState::Running);

        let step = core.step(done(TaskId::Stylesheet, TaskOutcome::Success));
        assert!(dispatched(&step).is_empty());
        assert!(core.is_idle());
        assert_eq!(core.summary().invocations, 2);
    }

    #[test]
    fn ignore_drops_retrigger() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Ignore, RuntimeOptions::default());
        core.step(trigger(&[TaskId::Markup]));
        core.step(trigger(&[TaskId::Markup]));
        assert_eq!(core.state_of(TaskId::Markup), TaskState::Running);

        let step = core.step(done(TaskId::Markup, TaskOutcome::Success));
        assert!(dispatched(&step).is_empty());
        assert!(core.is_idle());
    }

    #[test]
    fn exit_when_idle_waits_for_every_task() {
        let options = RuntimeOptions { exit_when_idle: true };
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, options);
        core.step(trigger(&[TaskId::Fonts, TaskId::Script]));

        let step = core.step(done(TaskId::Script, TaskOutcome::Failed));
        assert!(step.keep_running);

        let step = core.step(done(TaskId::Fonts, TaskOutcome::Success));
        assert!(!step.keep_running);
        assert!(step.commands.iter().any(|c| matches!(c, CoreCommand::RequestExit)));

        let summary = core.into_summary();
        assert_eq!(summary.failed.into_iter().collect::<Vec<_>>(), vec![TaskId::Script]);
    }

    #[test]
    fn empty_trigger_exits_immediately_in_one_shot_mode() {
        let options = RuntimeOptions { exit_when_idle: true };
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, options);
        let step = core.step(trigger(&[]));
        assert!(!step.keep_running);
    }

    #[test]
    fn later_success_clears_failure() {
        let mut summary = RunSummary::default();
        summary.record(TaskId::Image, TaskOutcome::Failed);
        summary.record(TaskId::Image, TaskOutcome::Success);
        assert!(summary.is_success());
        assert_eq!(summary.invocations, 2);
    }

    #[test]
    fn shutdown_marks_interrupted() {
        let mut core = CoreRuntime::new(TriggerWhileRunningBehaviour::Queue, RuntimeOptions::default());
        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert!(core.summary().interrupted);
    }
}
