// src/lib.rs

pub mod cli;
pub mod config;
pub mod context;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod server;
pub mod tasks;
pub mod types;
pub mod watch;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::ConfigFile;
use crate::context::BuildContext;
use crate::engine::{CoreRuntime, RunSummary, Runtime, RuntimeEvent, RuntimeOptions, TriggerReason};
use crate::errors::PipelineError;
use crate::exec::PipelineExecutor;
use crate::server::DevServer;
use crate::tasks::{parse_task_names, TaskId, TaskRegistry};
use crate::watch::WatchRules;

/// Process exit statuses.
pub mod exit {
    pub const SUCCESS: u8 = 0;
    pub const TASK_FAILED: u8 = 1;
    pub const CONFIG_ERROR: u8 = 2;
    pub const INTERRUPTED: u8 = 130;
}

/// Exit status for an error that escaped [`run`].
pub fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<PipelineError>() {
        Some(e) if e.is_config_error() => exit::CONFIG_ERROR,
        _ => exit::TASK_FAILED,
    }
}

/// High-level entry point used by `main.rs`. Returns the process exit
/// status (see [`exit`]).
///
/// This wires together:
/// - config loading and validation
/// - the task registry and watch rules
/// - runtime / executor for one-shot builds
/// - dev server, file watcher and Ctrl-C handling for `dev`
pub async fn run(args: CliArgs) -> Result<u8> {
    let cfg = config::resolve(args.config.as_deref())?;
    let registry = Arc::new(TaskRegistry::standard()?);
    registry.resolve(cfg.build_tasks())?;

    let rules = WatchRules::from_config(&cfg)?;
    rules.validate(&registry)?;

    let ctx = BuildContext::from_config(&cfg);
    debug!(
        source = %ctx.source_root().display(),
        output = %ctx.output_root().display(),
        "configuration resolved"
    );

    match args.command() {
        Command::Clean => {
            tasks::clean::clean(&ctx)?;
            Ok(exit::SUCCESS)
        }
        Command::Build { clean } => {
            if clean {
                tasks::clean::clean(&ctx)?;
            }
            let summary = build_once(&cfg, registry, ctx, cfg.build_tasks().to_vec()).await?;
            Ok(summary_exit_code(&summary))
        }
        Command::Run { tasks: names, clean } => {
            let ids = registry.resolve(&parse_task_names(&names)?)?;
            if clean {
                tasks::clean::clean(&ctx)?;
            }
            let summary = build_once(&cfg, registry, ctx, ids).await?;
            Ok(summary_exit_code(&summary))
        }
        Command::Dev { clean } => {
            if clean {
                tasks::clean::clean(&ctx)?;
            }
            dev(&cfg, registry, ctx, rules).await
        }
        Command::Plan => {
            print_plan(&cfg, &registry, &rules);
            Ok(exit::SUCCESS)
        }
    }
}

/// Run `tasks` concurrently and return once every one has finished.
pub async fn build_once(
    cfg: &ConfigFile,
    registry: Arc<TaskRegistry>,
    ctx: BuildContext,
    tasks: Vec<TaskId>,
) -> Result<RunSummary> {
    if tasks.is_empty() {
        return Ok(RunSummary::default());
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let executor = PipelineExecutor::new(registry, ctx, rt_tx.clone());
    spawn_ctrl_c(rt_tx.clone());

    info!(?tasks, "building");
    rt_tx
        .send(RuntimeEvent::TasksTriggered {
            tasks,
            reason: TriggerReason::Initial,
        })
        .await?;

    let core = CoreRuntime::new(
        cfg.while_running(),
        RuntimeOptions {
            exit_when_idle: true,
        },
    );
    let summary = Runtime::new(core, rt_rx, executor).run().await?;
    log_summary(&summary);
    Ok(summary)
}

/// Build, then serve the output tree and rebuild on change until Ctrl-C.
async fn dev(
    cfg: &ConfigFile,
    registry: Arc<TaskRegistry>,
    ctx: BuildContext,
    rules: WatchRules,
) -> Result<u8> {
    let initial = build_once(cfg, Arc::clone(&registry), ctx.clone(), cfg.build_tasks().to_vec()).await?;
    if initial.interrupted {
        return Ok(exit::INTERRUPTED);
    }
    if !initial.failed.is_empty() {
        warn!(failed = ?initial.failed, "initial build had failures; watching anyway");
    }

    let server = DevServer::bind(cfg.server(), ctx.output_root().to_path_buf(), ctx.reload().clone()).await?;
    let server_task = tokio::spawn(async move {
        if let Err(err) = server.run().await {
            error!(error = %err, "dev server failed");
        }
    });

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = watch::spawn_watcher(
        ctx.source_root().to_path_buf(),
        Arc::new(rules),
        ctx.fs_handle(),
        cfg.use_hash(),
        rt_tx.clone(),
    )
    .await?;
    spawn_ctrl_c(rt_tx.clone());

    let executor = PipelineExecutor::new(registry, ctx, rt_tx);
    let core = CoreRuntime::new(cfg.while_running(), RuntimeOptions::default());
    let summary = Runtime::new(core, rt_rx, executor).run().await?;

    server_task.abort();
    info!(invocations = summary.invocations, "dev session finished");

    if summary.interrupted {
        Ok(exit::INTERRUPTED)
    } else {
        Ok(exit::SUCCESS)
    }
}

fn spawn_ctrl_c(tx: mpsc::Sender<RuntimeEvent>) {
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
            return;
        }
        let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
    });
}

fn summary_exit_code(summary: &RunSummary) -> u8 {
    if summary.interrupted {
        exit::INTERRUPTED
    } else if summary.failed.is_empty() {
        exit::SUCCESS
    } else {
        exit::TASK_FAILED
    }
}

fn log_summary(summary: &RunSummary) {
    if summary.interrupted {
        warn!("build interrupted");
    } else if summary.failed.is_empty() {
        info!(invocations = summary.invocations, "build finished");
    } else {
        let failed: Vec<&str> = summary.failed.iter().map(|t| t.name()).collect();
        error!(failed = %failed.join(", "), "build finished with failures");
    }
}

/// `plan` output: resolved paths, tasks with their inputs, and watch rules.
fn print_plan(cfg: &ConfigFile, registry: &TaskRegistry, rules: &WatchRules) {
    println!("assetflow plan");
    println!("  project: {}", cfg.project_root().display());
    println!("  source:  {}", cfg.source_root().display());
    println!("  output:  {}", cfg.output_root().display());
    println!(
        "  server:  http://{}:{}/ (open = {})",
        cfg.server().host,
        cfg.server().port,
        cfg.server().open
    );
    println!("  watch.use_hash = {}", cfg.use_hash());
    println!("  watch.while_running = {:?}", cfg.while_running());
    println!();

    let build: Vec<&str> = cfg.build_tasks().iter().map(|t| t.name()).collect();
    println!("build tasks: {}", build.join(", "));
    println!();

    println!("tasks ({}):", registry.ids().count());
    for (id, task) in registry.iter() {
        println!("  - {id} -> {}", task.destination());
        for selector in task.selectors() {
            println!("      from: {}", selector.describe());
        }
    }
    println!();

    println!("watch rules ({}):", rules.len());
    for rule in rules.iter() {
        let names: Vec<&str> = rule.tasks().iter().map(|t| t.name()).collect();
        println!("  - {} => {}", rule.pattern(), names.join(", "));
    }
    println!();

    println!("tools:");
    for (key, template) in cfg.tools().entries() {
        if template.trim().is_empty() {
            println!("  {key}: (copy)");
        } else {
            println!("  {key}: {template}");
        }
    }
}
