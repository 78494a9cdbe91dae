#![allow(dead_code)]

use std::sync::Arc;

use assetflow::config::ConfigFile;
use assetflow::context::BuildContext;
use assetflow::engine::RunSummary;
use assetflow::tasks::{TaskId, TaskRegistry};
use assetflow_test_utils::builders::ConfigFileBuilder;

pub use assetflow_test_utils::{init_tracing, with_timeout};

/// Run `tasks` through the real executor and wait for all of them.
pub async fn build(ctx: &BuildContext, tasks: &[TaskId]) -> anyhow::Result<RunSummary> {
    let cfg: ConfigFile = ConfigFileBuilder::new().build();
    let registry = Arc::new(TaskRegistry::standard()?);
    assetflow::build_once(&cfg, registry, ctx.clone(), tasks.to_vec()).await
}
