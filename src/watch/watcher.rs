// src/watch/watcher.rs

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::engine::RuntimeEvent;
use crate::fs::FileSystem;
use crate::watch::cache::FileCache;
use crate::watch::event_handler::ChangeDispatcher;
use crate::watch::rules::WatchRules;

/// Keeps the underlying `RecommendedWatcher` alive. Dropping this handle
/// stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle").finish()
    }
}

/// Watch `source_root` recursively and send one
/// `RuntimeEvent::TasksTriggered` per relevant filesystem event.
///
/// notify calls back on its own thread; events are forwarded into an
/// unbounded channel and consumed by a single dispatcher task.
pub async fn spawn_watcher(
    source_root: impl Into<PathBuf>,
    rules: Arc<WatchRules>,
    fs: Arc<dyn FileSystem>,
    use_hash: bool,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) -> Result<WatcherHandle> {
    let root = source_root.into();
    let root = root.canonicalize().unwrap_or(root);

    let cache = if use_hash {
        let fs = Arc::clone(&fs);
        let prime_root = root.clone();
        let cache = tokio::task::spawn_blocking(move || -> Result<FileCache> {
            let mut cache = FileCache::new();
            cache.prime(fs.as_ref(), &prime_root)?;
            Ok(cache)
        })
        .await
        .context("hash cache priming panicked")??;
        Some(Arc::new(Mutex::new(cache)))
    } else {
        None
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            // A send error only means the dispatcher is gone (shutdown).
            Ok(event) => {
                let _ = event_tx.send(event);
            }
            Err(err) => warn!("file watch error: {err}"),
        },
        Config::default(),
    )?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("watching {:?}", root))?;

    info!(root = %root.display(), rules = rules.len(), use_hash, "file watcher started");

    let dispatcher = ChangeDispatcher::new(root, rules, fs, cache, runtime_tx);
    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            debug!(?event, "received notify event");
            if !dispatcher.dispatch(event.kind, &event.paths).await {
                break;
            }
        }
        debug!("watcher event loop finished");
    });

    Ok(WatcherHandle { _inner: watcher })
}
