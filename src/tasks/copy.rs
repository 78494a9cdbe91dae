// src/tasks/copy.rs

//! Passthrough tasks: fonts, server pages, static files and the vendored
//! mailer library. Bytes are copied unchanged, relative paths are kept.

use anyhow::{Context, Result};
use tokio::fs;

use crate::context::{layout, BuildContext};
use crate::tasks::selector::SourceSelector;
use crate::tasks::staging::Staging;
use crate::tasks::{TaskFuture, TaskId, TaskReport, Transform};

#[derive(Debug)]
pub struct CopyTask {
    id: TaskId,
    selector: SourceSelector,
    /// Prefix under the output root (`""` for the root itself).
    dest: &'static str,
}

impl CopyTask {
    pub fn fonts() -> Result<Self> {
        Ok(Self {
            id: TaskId::Fonts,
            selector: SourceSelector::new(layout::FONTS_DIR, &["**/*.{ttf,woff,woff2}"], &[])?,
            dest: "fonts",
        })
    }

    /// PHP pages anywhere in the source tree, except inside `files/` and
    /// the vendored mailer library (both copied by their own tasks).
    pub fn server_pages() -> Result<Self> {
        let files = format!("{}/**", layout::FILES_DIR);
        let mailer = format!("{}/**", layout::MAILER_DIR);
        Ok(Self {
            id: TaskId::ServerPages,
            selector: SourceSelector::new("", &["**/*.php"], &[files.as_str(), mailer.as_str()])?,
            dest: "",
        })
    }

    pub fn static_files() -> Result<Self> {
        Ok(Self {
            id: TaskId::StaticFiles,
            selector: SourceSelector::new(layout::FILES_DIR, &["**"], &[])?,
            dest: "files",
        })
    }

    pub fn mailer_assets() -> Result<Self> {
        Ok(Self {
            id: TaskId::MailerAssets,
            selector: SourceSelector::new(layout::MAILER_DIR, &["**"], &[])?,
            dest: "phpMailer",
        })
    }

    async fn copy_all(&self, ctx: &BuildContext) -> Result<TaskReport> {
        let sources = self.inputs(ctx)?;
        let mut staging = Staging::new()?;

        for src in &sources {
            let rel = join_rel(self.dest, &src.rel);
            let target = staging.output(&rel).await?;
            fs::copy(&src.path, &target)
                .await
                .with_context(|| format!("copying {:?}", src.path))?;
        }

        let written = staging.commit(ctx.output_root()).await?;
        Ok(TaskReport {
            task: self.id,
            written,
        })
    }
}

impl Transform for CopyTask {
    fn id(&self) -> TaskId {
        self.id
    }

    fn selectors(&self) -> Vec<&SourceSelector> {
        vec![&self.selector]
    }

    fn destination(&self) -> &'static str {
        self.dest
    }

    fn run<'a>(&'a self, ctx: &'a BuildContext) -> TaskFuture<'a> {
        Box::pin(self.copy_all(ctx))
    }
}

/// Join an output prefix and a relative path with `/`.
pub(crate) fn join_rel(prefix: &str, rel: &str) -> String {
    if prefix.is_empty() {
        rel.to_string()
    } else {
        format!("{prefix}/{rel}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_rel_handles_root_prefix() {
        assert_eq!(join_rel("", "index.php"), "index.php");
        assert_eq!(join_rel("fonts", "a/b.woff2"), "fonts/a/b.woff2");
    }

    #[test]
    fn static_files_select_everything_but_partials() {
        let task = CopyTask::static_files().unwrap();
        assert!(task.selector.matches("brochure.pdf"));
        assert!(task.selector.matches("docs/terms.txt"));
        assert!(!task.selector.matches("docs/_draft.txt"));
    }

    #[test]
    fn server_pages_leave_files_and_mailer_to_their_own_tasks() {
        let task = CopyTask::server_pages().unwrap();
        assert!(task.selector.matches("contact.php"));
        assert!(task.selector.matches("blog/post.php"));
        assert!(!task.selector.matches("files/form.php"));
        assert!(!task.selector.matches("files/forms/quote.php"));
        assert!(!task.selector.matches("phpMailer/src/SMTP.php"));
    }
}
