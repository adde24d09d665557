// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::TaskId;

#[derive(Error, Debug)]
pub enum LearnpathError {
    #[error("Dependency {task_id} -> {depends_on_id} would create a cycle")]
    Cycle {
        task_id: TaskId,
        depends_on_id: TaskId,
    },

    #[error("Already exists: {0}")]
    Duplicate(String),

    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("Dependency not found: {task_id} -> {depends_on_id}")]
    DependencyNotFound {
        task_id: TaskId,
        depends_on_id: TaskId,
    },

    #[error("Invalid status transition for {task_id}: {reason}")]
    InvalidTransition { task_id: TaskId, reason: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Import error: {0}")]
    ImportError(String),

    #[error("Cycle detected in task graph: {0}")]
    DagCycle(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    SqlError(#[from] rusqlite::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LearnpathError {
    pub(crate) fn invalid_transition(task_id: &str, reason: impl Into<String>) -> Self {
        LearnpathError::InvalidTransition {
            task_id: task_id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LearnpathError>;
