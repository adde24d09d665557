// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{DependencyType, Status, TaskType};

/// Command-line arguments for `learnpath`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "learnpath",
    version,
    about = "Track learner progress over a shared project/epic/task/subtask graph.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `$LEARNPATH_CONFIG`, else `Learnpath.toml` in the current
    /// working directory. A missing default file means built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// SQLite database file; overrides `[store].path`.
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LEARNPATH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print results as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Import a template graph from a TOML or JSON document.
    Import {
        file: PathBuf,
        /// Validate and report without writing.
        #[arg(long)]
        dry_run: bool,
    },
    /// List the learner's ready work in a project, best first.
    Ready {
        #[command(flatten)]
        scope: ProjectScope,
        /// Only list tasks of this type.
        #[arg(long = "type", value_parser = parse_task_type, value_name = "TYPE")]
        task_type: Option<TaskType>,
    },
    /// Show a task as the learner sees it.
    Show(TaskLearner),
    /// Start a task.
    Start(TaskLearner),
    /// Submit an attempt.
    Submit {
        #[command(flatten)]
        target: TaskLearner,
        #[arg(long, conflicts_with = "payload_file", required_unless_present = "payload_file")]
        payload: Option<String>,
        #[arg(long, value_name = "PATH")]
        payload_file: Option<PathBuf>,
    },
    /// Close a task explicitly.
    Close {
        #[command(flatten)]
        target: TaskLearner,
        #[arg(long, default_value = "closed")]
        reason: String,
    },
    /// Move a closed or blocked task back to open or in_progress.
    Reopen {
        #[command(flatten)]
        target: TaskLearner,
        #[arg(long = "to", value_parser = parse_status, default_value = "open")]
        to: Status,
        #[arg(long, default_value = "")]
        reason: String,
    },
    /// Add or remove dependency edges.
    #[command(subcommand)]
    Dep(DepCommand),
    /// List blocked work with its blockers.
    Blocked(ProjectScope),
    /// Count the learner's tasks by status.
    Summary(ProjectScope),
    /// Show the learner's attempts at a task.
    History(TaskLearner),
    /// Report every dependency cycle in the stored graph.
    Audit,
}

#[derive(Debug, Clone, Subcommand)]
pub enum DepCommand {
    /// `task` depends on `depends_on`.
    Add {
        task: String,
        depends_on: String,
        #[arg(long = "type", value_parser = parse_dependency_type, default_value = "blocks")]
        dep_type: DependencyType,
    },
    /// Remove the explicit edges from `task` to `depends_on`.
    Remove { task: String, depends_on: String },
}

#[derive(Debug, Clone, Args)]
pub struct ProjectScope {
    #[arg(long)]
    pub project: String,
    #[arg(long)]
    pub learner: String,
}

#[derive(Debug, Clone, Args)]
pub struct TaskLearner {
    pub task: String,
    #[arg(long)]
    pub learner: String,
}

fn parse_task_type(s: &str) -> Result<TaskType, String> {
    s.parse()
}

fn parse_status(s: &str) -> Result<Status, String> {
    s.parse()
}

fn parse_dependency_type(s: &str) -> Result<DependencyType, String> {
    s.parse()
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
