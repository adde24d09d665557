use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Canonical task identifier type (hierarchical path such as `proj-a1b2.1.1`).
pub type TaskId = String;

/// Canonical learner identifier type.
pub type LearnerId = String;

/// Lowest priority; 0 is the highest.
pub const MAX_PRIORITY: u8 = 4;

/// Priority given to imported tasks that do not set one.
pub const DEFAULT_PRIORITY: u8 = 2;

/// The four node kinds of the template hierarchy, outermost first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    Project,
    Epic,
    Task,
    Subtask,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::Project => "project",
            TaskType::Epic => "epic",
            TaskType::Task => "task",
            TaskType::Subtask => "subtask",
        }
    }

    /// The type a direct parent of this type must have (`None` for projects).
    pub fn parent_type(self) -> Option<TaskType> {
        match self {
            TaskType::Project => None,
            TaskType::Epic => Some(TaskType::Project),
            TaskType::Task => Some(TaskType::Epic),
            TaskType::Subtask => Some(TaskType::Task),
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "project" => Ok(TaskType::Project),
            "epic" => Ok(TaskType::Epic),
            "task" => Ok(TaskType::Task),
            "subtask" => Ok(TaskType::Subtask),
            other => Err(format!(
                "invalid task type: {other} (expected project, epic, task or subtask)"
            )),
        }
    }
}

/// Kind of a dependency edge.
///
/// Only `Blocks` and `ParentChild` participate in blocking computation and
/// cycle checks; `Related` is informational.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum DependencyType {
    #[default]
    Blocks,
    ParentChild,
    Related,
}

impl DependencyType {
    pub fn as_str(self) -> &'static str {
        match self {
            DependencyType::Blocks => "blocks",
            DependencyType::ParentChild => "parent_child",
            DependencyType::Related => "related",
        }
    }

    pub fn is_blocking(self) -> bool {
        matches!(self, DependencyType::Blocks | DependencyType::ParentChild)
    }
}

impl fmt::Display for DependencyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DependencyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "blocks" => Ok(DependencyType::Blocks),
            "parent_child" => Ok(DependencyType::ParentChild),
            "related" => Ok(DependencyType::Related),
            other => Err(format!(
                "invalid dependency type: {other} (expected blocks, parent_child or related)"
            )),
        }
    }
}

/// Per-learner progress status.
///
/// `Blocked` is a read-time classification computed by the resolver; the
/// engine itself only ever persists `Open`, `InProgress` and `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Open => "open",
            Status::InProgress => "in_progress",
            Status::Blocked => "blocked",
            Status::Closed => "closed",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "open" => Ok(Status::Open),
            "in_progress" => Ok(Status::InProgress),
            "blocked" => Ok(Status::Blocked),
            "closed" => Ok(Status::Closed),
            other => Err(format!(
                "invalid status: {other} (expected open, in_progress, blocked or closed)"
            )),
        }
    }
}

/// What happens to ancestors once every child of a parent is closed.
///
/// - `AutoClose` (default): parents that do not require a submission are
///   closed automatically, climbing towards the project root.
/// - `Explicit`: parents stay open until someone closes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CascadePolicy {
    AutoClose,
    Explicit,
}

impl Default for CascadePolicy {
    fn default() -> Self {
        CascadePolicy::AutoClose
    }
}

impl FromStr for CascadePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "auto_close" | "auto" => Ok(CascadePolicy::AutoClose),
            "explicit" => Ok(CascadePolicy::Explicit),
            other => Err(format!(
                "invalid cascade policy: {other} (expected \"auto_close\" or \"explicit\")"
            )),
        }
    }
}

/// Default `requires_submission` per task type, used when a task leaves the
/// flag unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct SubmissionPolicy {
    #[serde(default)]
    pub project: bool,
    #[serde(default)]
    pub epic: bool,
    #[serde(default)]
    pub task: bool,
    #[serde(default = "default_subtask_requires_submission")]
    pub subtask: bool,
}

fn default_subtask_requires_submission() -> bool {
    true
}

impl Default for SubmissionPolicy {
    fn default() -> Self {
        Self {
            project: false,
            epic: false,
            task: false,
            subtask: default_subtask_requires_submission(),
        }
    }
}

impl SubmissionPolicy {
    pub fn default_for(&self, task_type: TaskType) -> bool {
        match task_type {
            TaskType::Project => self.project,
            TaskType::Epic => self.epic,
            TaskType::Task => self.task,
            TaskType::Subtask => self.subtask,
        }
    }

    /// Resolve the tri-state flag of a task against this policy.
    pub fn resolve(&self, task_type: TaskType, explicit: Option<bool>) -> bool {
        explicit.unwrap_or_else(|| self.default_for(task_type))
    }
}
