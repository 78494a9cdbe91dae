// src/watch/event_handler.rs

//! Turning one filesystem event into one runtime trigger.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use notify::EventKind;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::engine::{RuntimeEvent, TriggerReason};
use crate::fs::FileSystem;
use crate::tasks::TaskId;
use crate::watch::cache::FileCache;
use crate::watch::path_utils::relative_str;
use crate::watch::rules::WatchRules;

/// Event kinds that can change a task's inputs. Access events and
/// metadata-only noise are dropped before any matching happens.
pub fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    )
}

/// Shared state of the dispatcher loop.
#[derive(Debug, Clone)]
pub struct ChangeDispatcher {
    source_root: PathBuf,
    rules: Arc<WatchRules>,
    fs: Arc<dyn FileSystem>,
    /// Present when content-hash filtering is enabled.
    cache: Option<Arc<Mutex<FileCache>>>,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
}

impl ChangeDispatcher {
    pub fn new(
        source_root: PathBuf,
        rules: Arc<WatchRules>,
        fs: Arc<dyn FileSystem>,
        cache: Option<Arc<Mutex<FileCache>>>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            source_root,
            rules,
            fs,
            cache,
            runtime_tx,
        }
    }

    /// The tasks a change to `path` must re-run, after hash filtering.
    /// Empty when the path matches no rule or its content is unchanged.
    pub async fn tasks_for_change(&self, kind: &EventKind, path: &Path) -> BTreeSet<TaskId> {
        let Some(rel) = relative_str(&self.source_root, path) else {
            debug!(?path, "event outside the source root");
            return BTreeSet::new();
        };

        let tasks = self.rules.tasks_for(&rel);
        if tasks.is_empty() {
            return tasks;
        }

        if !self.content_changed(kind, path).await {
            debug!(path = %rel, "content unchanged; skipping trigger");
            return BTreeSet::new();
        }

        debug!(path = %rel, ?tasks, "watch match");
        tasks
    }

    /// Process one event: every path in it, unioned into a single trigger.
    /// Returns false once the runtime is gone.
    pub async fn dispatch(&self, kind: EventKind, paths: &[PathBuf]) -> bool {
        if !is_relevant(&kind) {
            return true;
        }

        let mut tasks = BTreeSet::new();
        for path in paths {
            tasks.extend(self.tasks_for_change(&kind, path).await);
        }
        if tasks.is_empty() {
            return true;
        }

        let event = RuntimeEvent::TasksTriggered {
            tasks: tasks.into_iter().collect(),
            reason: TriggerReason::FileWatch,
        };
        if let Err(err) = self.runtime_tx.send(event).await {
            warn!("failed to send RuntimeEvent::TasksTriggered: {err}");
            return false;
        }
        true
    }

    /// Only plain modifications are filtered; creations, removals and
    /// renames always count as a change.
    async fn content_changed(&self, kind: &EventKind, path: &Path) -> bool {
        let Some(cache) = &self.cache else {
            return true;
        };

        let cache = Arc::clone(cache);
        let fs = Arc::clone(&self.fs);
        let path = path.to_path_buf();
        let is_data_change = matches!(kind, EventKind::Modify(notify::event::ModifyKind::Data(_)))
            || matches!(kind, EventKind::Modify(notify::event::ModifyKind::Any));

        tokio::task::spawn_blocking(move || {
            let mut cache = match cache.lock() {
                Ok(g) => g,
                Err(_) => {
                    warn!("file cache mutex poisoned; triggering anyway");
                    return true;
                }
            };

            if !is_data_change || !fs.is_file(&path) {
                cache.invalidate(&path);
                return true;
            }

            match cache.refresh(fs.as_ref(), &path) {
                Ok(changed) => changed,
                Err(err) => {
                    warn!(file = ?path, error = %err, "failed to hash file; triggering anyway");
                    true
                }
            }
        })
        .await
        .unwrap_or(true)
    }
}
