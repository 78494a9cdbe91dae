// src/engine/mod.rs

//! Orchestration engine for assetflow.
//!
//! This module ties together:
//! - per-task run state (idle, running, running with a re-run pending)
//! - the pending-trigger queue (what happens when a task is triggered while
//!   it is still running)
//! - the main runtime event loop that reacts to:
//!   - initial and file-watch triggers
//!   - task completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

use crate::tasks::TaskId;

pub use crate::types::{TaskOutcome, TriggerWhileRunningBehaviour};

/// Why tasks were triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerReason {
    /// Initial build (`build`, `run`, or the first phase of `dev`).
    Initial,
    /// A watched source file changed.
    FileWatch,
}

/// Runtime options used by both the core and the async shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuntimeOptions {
    /// If true, exit the runtime once no task is running and nothing is
    /// pending (used for one-shot builds).
    pub exit_when_idle: bool,
}

/// Events flowing into the runtime from the orchestrator, the watcher and
/// the executor.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// These tasks should run (once each).
    TasksTriggered {
        tasks: Vec<TaskId>,
        reason: TriggerReason,
    },
    /// A task invocation finished.
    TaskCompleted { task: TaskId, outcome: TaskOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod queue;
pub mod runtime;

pub use core::{CoreRuntime, RunSummary, TaskState};
pub use event_handlers::{CoreCommand, CoreStep};
pub use queue::PendingTriggers;
pub use runtime::Runtime;
