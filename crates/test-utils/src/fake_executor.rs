use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use assetflow::engine::{RuntimeEvent, TaskOutcome};
use assetflow::errors::{PipelineError, Result};
use assetflow::exec::ExecutorBackend;
use assetflow::tasks::TaskId;
use tokio::sync::mpsc;

/// A fake executor that:
/// - records which tasks were "run", in dispatch order
/// - immediately reports TaskCompleted for each dispatched task, failing
///   the ones listed in `failing`.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<TaskId>>>,
    failing: BTreeSet<TaskId>,
}

impl FakeExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, executed: Arc<Mutex<Vec<TaskId>>>) -> Self {
        Self {
            runtime_tx,
            executed,
            failing: BTreeSet::new(),
        }
    }

    pub fn failing(mut self, tasks: &[TaskId]) -> Self {
        self.failing.extend(tasks.iter().copied());
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_tasks(
        &mut self,
        tasks: Vec<TaskId>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);

        Box::pin(async move {
            for task in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push(task);
                }

                let outcome = if self.failing.contains(&task) {
                    TaskOutcome::Failed
                } else {
                    TaskOutcome::Success
                };
                tx.send(RuntimeEvent::TaskCompleted { task, outcome })
                    .await
                    .map_err(|e| PipelineError::Other(anyhow::Error::from(e)))?;
            }
            Ok(())
        })
    }
}
