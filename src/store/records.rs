// src/store/records.rs

//! Row types shared between the store, the resolver and the engine.

use serde::Serialize;

use crate::types::{DependencyType, LearnerId, Status, TaskId, TaskType};
use crate::validators::ValidatorSpec;

/// A template task, shared by every learner.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskRecord {
    pub id: TaskId,
    pub parent_id: Option<TaskId>,
    pub task_type: TaskType,
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Option<String>,
    /// 0 (highest) to 4 (lowest).
    pub priority: u8,
    /// Tri-state: `None` defers to the submission policy.
    pub requires_submission: Option<bool>,
    /// Per-task validator; `None` defers to the registry.
    pub validator: Option<ValidatorSpec>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    /// Insertion order, used as a creation tie-break within one millisecond.
    #[serde(skip)]
    pub seq: i64,
}

/// A dependency edge: `task_id` depends on `depends_on_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dependency {
    pub task_id: TaskId,
    pub depends_on_id: TaskId,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub created_at_ms: i64,
}

/// One learner's progress on one task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    pub task_id: TaskId,
    pub learner_id: LearnerId,
    pub status: Status,
    pub notes: Option<String>,
    pub created_at_ms: i64,
    pub updated_at_ms: i64,
    pub started_at_ms: Option<i64>,
    pub closed_at_ms: Option<i64>,
}

impl ProgressRecord {
    /// A fresh, not yet persisted record in the initial state.
    pub fn fresh(task_id: &str, learner_id: &str, now_ms: i64) -> Self {
        Self {
            task_id: task_id.to_string(),
            learner_id: learner_id.to_string(),
            status: Status::Open,
            notes: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
            started_at_ms: None,
            closed_at_ms: None,
        }
    }

    /// Append a line to the free-text notes.
    pub fn append_note(&mut self, note: &str) {
        let note = note.trim();
        if note.is_empty() {
            return;
        }
        match self.notes.as_mut() {
            Some(existing) if !existing.is_empty() => {
                existing.push('\n');
                existing.push_str(note);
            }
            _ => self.notes = Some(note.to_string()),
        }
    }
}

/// Resolve the status of a (task, learner) pair from its optional row.
///
/// A missing row means the learner never touched the task, which is the
/// `open` state. Every read site goes through this function.
pub fn resolve_status(row: Option<&ProgressRecord>) -> Status {
    row.map(|r| r.status).unwrap_or(Status::Open)
}

/// Outcome of running a validator against one submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationRecord {
    pub submission_id: i64,
    pub passed: bool,
    pub message: String,
    pub validator: String,
    pub created_at_ms: i64,
}

/// One attempt by a learner, with its validation if one was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionRecord {
    pub id: i64,
    pub task_id: TaskId,
    pub learner_id: LearnerId,
    pub attempt_number: i64,
    pub payload: String,
    pub payload_digest: String,
    pub created_at_ms: i64,
    pub validation: Option<ValidationRecord>,
}
