// src/server/reload.rs

//! Reload signal: a fire-and-forget broadcast to development clients.

use tokio::sync::broadcast;
use tracing::trace;

use crate::tasks::TaskId;

const RELOAD_CHANNEL_CAPACITY: usize = 64;

/// What connected clients are told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// Some output changed; reload the page.
    Changed,
    /// A task failed; surfaced in the browser console.
    Failed { task: TaskId, message: String },
}

/// Broadcast handle shared by tasks, the executor and the dev server.
///
/// Sending never blocks and never fails from the caller's point of view:
/// with no subscribers the event is dropped, and slow subscribers miss
/// events once the channel capacity is exceeded.
#[derive(Debug, Clone)]
pub struct ReloadSignal {
    tx: broadcast::Sender<ReloadEvent>,
}

impl ReloadSignal {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(RELOAD_CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.tx.subscribe()
    }

    pub fn changed(&self, task: TaskId) {
        let receivers = self.tx.send(ReloadEvent::Changed).unwrap_or(0);
        trace!(task = %task, receivers, "reload signal sent");
    }

    pub fn failed(&self, task: TaskId, message: impl Into<String>) {
        let _ = self.tx.send(ReloadEvent::Failed {
            task,
            message: message.into(),
        });
    }
}

impl Default for ReloadSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sending_without_subscribers_is_silent() {
        let signal = ReloadSignal::new();
        signal.changed(TaskId::Markup);
        signal.failed(TaskId::Script, "boom");
    }

    #[tokio::test]
    async fn subscribers_receive_events_in_order() {
        let signal = ReloadSignal::new();
        let mut rx = signal.subscribe();

        signal.changed(TaskId::Stylesheet);
        signal.failed(TaskId::Image, "bad png");

        assert_eq!(rx.recv().await.unwrap(), ReloadEvent::Changed);
        assert_eq!(
            rx.recv().await.unwrap(),
            ReloadEvent::Failed {
                task: TaskId::Image,
                message: "bad png".to_string()
            }
        );
    }
}
