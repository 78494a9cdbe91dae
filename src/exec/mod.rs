// src/exec/mod.rs

//! Task execution layer.
//!
//! - [`task_runner`] runs one task invocation and reports its outcome to the
//!   runtime as a `RuntimeEvent::TaskCompleted`.
//! - [`backend`] provides the `ExecutorBackend` trait and the production
//!   `PipelineExecutor`, which tests replace with a fake implementation.

pub mod backend;
pub mod task_runner;

pub use backend::{ExecutorBackend, PipelineExecutor};
