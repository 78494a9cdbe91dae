// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for `assetflow`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "assetflow",
    version,
    about = "Build static-site assets and serve them with live reload.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Assetflow.toml` in the current directory if present,
    /// otherwise built-in defaults.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ASSETFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl CliArgs {
    /// The subcommand to run; `dev` when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Dev { clean: false })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Delete the output directory.
    Clean,
    /// Run the default task set once.
    Build {
        /// Delete the output directory first.
        #[arg(long)]
        clean: bool,
    },
    /// Run the named tasks once.
    Run {
        /// Task names (e.g. `stylesheet`, `image`).
        #[arg(required = true, value_name = "TASK")]
        tasks: Vec<String>,
        /// Delete the output directory first.
        #[arg(long)]
        clean: bool,
    },
    /// Build, then serve the output and rebuild on change (default).
    Dev {
        /// Delete the output directory first.
        #[arg(long)]
        clean: bool,
    },
    /// Print the resolved configuration, tasks and watch rules.
    Plan,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
