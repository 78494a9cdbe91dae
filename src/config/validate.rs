// src/config/validate.rs

use globset::Glob;

use crate::config::model::{ConfigFile, RawConfigFile, WatchRuleSpec};
use crate::errors::{PipelineError, Result};
use crate::tasks::{parse_task_names, TaskId};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipelineError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;

        let build_tasks = match &raw.build.tasks {
            Some(names) => parse_task_names(names)?,
            None => TaskId::ALL.to_vec(),
        };
        let watch_rules = resolve_watch_rules(&raw)?;

        Ok(ConfigFile::new_unchecked(
            raw.paths,
            build_tasks,
            raw.server,
            raw.watch.use_hash,
            raw.watch.while_running,
            watch_rules,
            raw.tools,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_paths(cfg)?;
    validate_server(cfg)?;
    validate_build_tasks(cfg)?;
    validate_tools(cfg)?;
    Ok(())
}

fn validate_paths(cfg: &RawConfigFile) -> Result<()> {
    let source = &cfg.paths.source;
    let output = &cfg.paths.output;

    if source.as_os_str().is_empty() || output.as_os_str().is_empty() {
        return Err(PipelineError::ConfigError(
            "[paths].source and [paths].output must not be empty".to_string(),
        ));
    }

    // Cleaning the output tree must never touch sources, and the watcher
    // must never see its own writes.
    if source.starts_with(output) || output.starts_with(source) {
        return Err(PipelineError::ConfigError(format!(
            "[paths].source ({}) and [paths].output ({}) must not contain each other",
            source.display(),
            output.display()
        )));
    }

    Ok(())
}

fn validate_server(cfg: &RawConfigFile) -> Result<()> {
    if cfg.server.port == 0 {
        return Err(PipelineError::ConfigError(
            "[server].port must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_build_tasks(cfg: &RawConfigFile) -> Result<()> {
    if let Some(tasks) = &cfg.build.tasks {
        if tasks.is_empty() {
            return Err(PipelineError::ConfigError(
                "[build].tasks must name at least one task".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_tools(cfg: &RawConfigFile) -> Result<()> {
    for (key, template) in cfg.tools.entries() {
        if template.trim().is_empty() {
            continue;
        }
        if !template.contains("{input}") || !template.contains("{output}") {
            return Err(PipelineError::ConfigError(format!(
                "[tools].{key} must mention both {{input}} and {{output}} (got \"{template}\")"
            )));
        }
    }
    Ok(())
}

fn resolve_watch_rules(cfg: &RawConfigFile) -> Result<Vec<WatchRuleSpec>> {
    let mut rules = Vec::with_capacity(cfg.watch.rules.len());

    for rule in &cfg.watch.rules {
        Glob::new(&rule.pattern).map_err(|e| {
            PipelineError::ConfigError(format!(
                "[[watch.rule]] has invalid pattern '{}': {e}",
                rule.pattern
            ))
        })?;

        if rule.tasks.is_empty() {
            return Err(PipelineError::ConfigError(format!(
                "[[watch.rule]] '{}' must name at least one task",
                rule.pattern
            )));
        }

        let tasks = parse_task_names(&rule.tasks)?;
        rules.push(WatchRuleSpec {
            pattern: rule.pattern.clone(),
            tasks,
        });
    }

    Ok(rules)
}
