// src/tasks/id.rs

use std::fmt;
use std::str::FromStr;

use crate::errors::PipelineError;

/// Closed set of build tasks.
///
/// Names coming from configuration or the command line are parsed into a
/// `TaskId` once at startup, so an unknown name can never reach the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TaskId {
    Markup,
    Fonts,
    Stylesheet,
    Image,
    Script,
    ServerPages,
    Sprite,
    StaticFiles,
    MailerAssets,
}

impl TaskId {
    pub const ALL: [TaskId; 9] = [
        TaskId::Markup,
        TaskId::Fonts,
        TaskId::Stylesheet,
        TaskId::Image,
        TaskId::Script,
        TaskId::ServerPages,
        TaskId::Sprite,
        TaskId::StaticFiles,
        TaskId::MailerAssets,
    ];

    /// Stable name used in configuration, logs and the reload channel.
    pub fn name(self) -> &'static str {
        match self {
            TaskId::Markup => "markup",
            TaskId::Fonts => "fonts",
            TaskId::Stylesheet => "stylesheet",
            TaskId::Image => "image",
            TaskId::Script => "script",
            TaskId::ServerPages => "server-pages",
            TaskId::Sprite => "sprite",
            TaskId::StaticFiles => "static-files",
            TaskId::MailerAssets => "mailer-assets",
        }
    }

    /// Older names from gulp-based setups, accepted when parsing.
    fn from_alias(s: &str) -> Option<TaskId> {
        match s {
            "html" => Some(TaskId::Markup),
            "sass" | "css" => Some(TaskId::Stylesheet),
            "img" => Some(TaskId::Image),
            "js" => Some(TaskId::Script),
            "php" => Some(TaskId::ServerPages),
            "spritesvg" => Some(TaskId::Sprite),
            "files" => Some(TaskId::StaticFiles),
            "phpmailer" => Some(TaskId::MailerAssets),
            _ => None,
        }
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TaskId {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase().replace('_', "-");
        TaskId::ALL
            .iter()
            .copied()
            .find(|id| id.name() == key)
            .or_else(|| TaskId::from_alias(&key))
            .ok_or_else(|| PipelineError::UnknownTask(s.to_string()))
    }
}

/// Parse a list of task names, failing on the first unknown one.
pub fn parse_task_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<TaskId>, PipelineError> {
    let mut ids = Vec::with_capacity(names.len());
    for name in names {
        let id: TaskId = name.as_ref().parse()?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    Ok(ids)
}
