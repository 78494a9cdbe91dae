// src/watch/mod.rs

//! File watching and change routing.
//!
//! This module is responsible for:
//! - The watch rule table mapping globs to task ids (`rules`).
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//! - Optionally dropping modify events whose content hash did not change.
//!
//! It does **not** run tasks; it only turns filesystem changes into
//! `RuntimeEvent::TasksTriggered`.

pub mod cache;
pub mod event_handler;
pub mod hash;
pub mod path_utils;
pub mod rules;
pub mod watcher;

pub use event_handler::ChangeDispatcher;
pub use rules::{WatchRule, WatchRules};
pub use watcher::{spawn_watcher, WatcherHandle};
