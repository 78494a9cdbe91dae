use std::str::FromStr;
use serde::Deserialize;

/// Behaviour when a watch trigger arrives for a task that is still running.
///
/// - `Queue`: remember the trigger and run the task once more when the
///   current invocation settles (default behaviour).
/// - `Ignore`: drop the trigger; the running invocation is considered
///   fresh enough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerWhileRunningBehaviour {
    Queue,
    Ignore,
}

impl Default for TriggerWhileRunningBehaviour {
    fn default() -> Self {
        TriggerWhileRunningBehaviour::Queue
    }
}

impl FromStr for TriggerWhileRunningBehaviour {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "queue" => Ok(TriggerWhileRunningBehaviour::Queue),
            "ignore" => Ok(TriggerWhileRunningBehaviour::Ignore),
            other => Err(format!(
                "invalid while_running: {other} (expected \"queue\" or \"ignore\")"
            )),
        }
    }
}

/// Outcome of a single task invocation, as seen by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    Failed,
}

impl TaskOutcome {
    pub fn is_success(self) -> bool {
        matches!(self, TaskOutcome::Success)
    }
}
