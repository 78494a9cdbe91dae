// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;
use crate::exec::ExecutorBackend;
use crate::tasks::TaskId;

use super::core::{CoreRuntime, RunSummary};
use super::{CoreCommand, RuntimeEvent};

/// Feeds `RuntimeEvent`s into the core state machine and delegates actual
/// task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop. Returns what ran and what failed once the core asks
    /// to stop or every event sender is gone.
    pub async fn run(mut self) -> Result<RunSummary> {
        debug!("runtime started");

        loop {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                debug!("core requested exit; stopping runtime");
                break;
            }
        }

        Ok(self.core.into_summary())
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::DispatchTasks(tasks) => self.dispatch(tasks).await?,
            CoreCommand::RequestExit => debug!("core issued RequestExit command"),
        }
        Ok(())
    }

    async fn dispatch(&mut self, tasks: Vec<TaskId>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }
        debug!(?tasks, "dispatching tasks");
        self.executor.spawn_tasks(tasks).await
    }
}
