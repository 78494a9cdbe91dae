// src/tasks/command.rs

//! External transformation tools (compilers, minifiers, image compressors).
//!
//! A tool is a shell command template from `[tools]` with `{input}` and
//! `{output}` placeholders. The pipeline only cares whether the process
//! succeeded and produced its output file.

use std::path::Path;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use tokio::fs;
use tokio::process::Command;
use tracing::debug;

/// Lines of stderr kept in a failure message.
const STDERR_TAIL_LINES: usize = 12;

#[derive(Debug, Clone, Copy)]
pub struct ExternalTool<'a> {
    key: &'static str,
    template: &'a str,
}

impl<'a> ExternalTool<'a> {
    pub fn new(key: &'static str, template: &'a str) -> Self {
        Self { key, template }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    /// An empty template turns the stage into a plain copy.
    pub fn is_disabled(&self) -> bool {
        self.template.trim().is_empty()
    }

    /// The concrete shell command line for one invocation.
    pub fn render(&self, input: &Path, output: &Path) -> String {
        self.template
            .replace("{input}", &shell_quote(input))
            .replace("{output}", &shell_quote(output))
    }

    /// Run the tool from `input` to `output`.
    pub async fn apply(&self, input: &Path, output: &Path) -> Result<()> {
        if self.is_disabled() {
            fs::copy(input, output)
                .await
                .with_context(|| format!("copying {:?} (tool '{}' disabled)", input, self.key))?;
            return Ok(());
        }

        let line = self.render(input, output);
        debug!(tool = self.key, cmd = %line, "running external tool");

        // Build a shell command appropriate for the platform.
        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let result = cmd
            .output()
            .await
            .with_context(|| format!("spawning tool '{}'", self.key))?;

        if !result.status.success() {
            let code = result.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&result.stderr);
            bail!(
                "tool '{}' exited with code {}{}",
                self.key,
                code,
                stderr_tail(&stderr)
            );
        }

        if fs::metadata(output).await.is_err() {
            bail!("tool '{}' did not produce {:?}", self.key, output);
        }

        Ok(())
    }
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    format!(": {}", lines[start..].join("\n"))
}

#[cfg(not(windows))]
fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(windows)]
fn shell_quote(path: &Path) -> String {
    format!("\"{}\"", path.to_string_lossy())
}
