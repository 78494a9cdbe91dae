// src/engine/queue.rs

use std::collections::BTreeSet;

use tracing::debug;

use crate::tasks::TaskId;
use crate::types::TriggerWhileRunningBehaviour;

/// Triggers that arrived for tasks that were still running.
///
/// Semantics:
/// - `Queue`: each running task remembers at most one follow-up invocation,
///   however many triggers arrive meanwhile. When the running invocation
///   settles, the task is dispatched once more.
/// - `Ignore`: triggers for running tasks are dropped.
#[derive(Debug)]
pub struct PendingTriggers {
    behaviour: TriggerWhileRunningBehaviour,
    pending: BTreeSet<TaskId>,
}

impl PendingTriggers {
    pub fn new(behaviour: TriggerWhileRunningBehaviour) -> Self {
        Self {
            behaviour,
            pending: BTreeSet::new(),
        }
    }

    pub fn behaviour(&self) -> TriggerWhileRunningBehaviour {
        self.behaviour
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.pending.contains(&task)
    }

    /// Record a trigger for a running task. Returns whether a follow-up run
    /// is now pending.
    pub fn record_trigger(&mut self, task: TaskId) -> bool {
        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                let inserted = self.pending.insert(task);
                debug!(task = %task, coalesced = !inserted, "re-run queued");
                true
            }
            TriggerWhileRunningBehaviour::Ignore => {
                debug!(task = %task, "task running; trigger ignored");
                false
            }
        }
    }

    /// Remove and report the pending follow-up for `task`, if any.
    pub fn take(&mut self, task: TaskId) -> bool {
        self.pending.remove(&task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_coalesces_to_one_rerun() {
        let mut q = PendingTriggers::new(TriggerWhileRunningBehaviour::Queue);
        assert!(q.record_trigger(TaskId::Stylesheet));
        assert!(q.record_trigger(TaskId::Stylesheet));
        assert!(q.take(TaskId::Stylesheet));
        assert!(!q.take(TaskId::Stylesheet));
        assert!(q.is_empty());
    }

    #[test]
    fn ignore_never_queues() {
        let mut q = PendingTriggers::new(TriggerWhileRunningBehaviour::Ignore);
        assert!(!q.record_trigger(TaskId::Image));
        assert!(!q.contains(TaskId::Image));
        assert!(q.is_empty());
    }
}
