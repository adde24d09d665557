// src/ingest/model.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{LearnpathError, Result};
use crate::types::{DependencyType, TaskId, TaskType, DEFAULT_PRIORITY};
use crate::validators::ValidatorSpec;

/// Import document as read from TOML or JSON, before validation.
///
/// ```toml
/// [[tasks]]
/// id = "proj-x"
/// type = "project"
/// title = "Project X"
///
/// [[tasks]]
/// id = "proj-x.1"
/// type = "epic"
/// title = "Epic"
/// objectives = ["Understand joins"]
///
/// [[dependencies]]
/// task = "proj-x.1.2"
/// depends_on = "proj-x.1.1"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawImport {
    #[serde(default)]
    pub tasks: Vec<RawTaskSpec>,

    #[serde(default)]
    pub dependencies: Vec<RawDependencySpec>,
}

impl RawImport {
    /// Render the document in the TOML import format.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| LearnpathError::ImportError(e.to_string()))
    }

    /// Render the document in the JSON import format.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// One `[[tasks]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawTaskSpec {
    pub id: TaskId,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,

    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objectives: Vec<String>,

    /// Unset defers to the `[submission]` policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_submission: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validator: Option<ValidatorSpec>,

    /// Explicit parent. When absent the parent is derived from the id path.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

/// One `[[dependencies]]` entry: `task` depends on `depends_on`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawDependencySpec {
    pub task: TaskId,
    pub depends_on: TaskId,
    #[serde(rename = "type", default)]
    pub dep_type: DependencyType,
}

/// A validated task, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub id: TaskId,
    pub task_type: TaskType,
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub priority: u8,
    pub objectives: Vec<String>,
    pub requires_submission: Option<bool>,
    pub validator: Option<ValidatorSpec>,
    pub parent_id: Option<TaskId>,
}

/// A validated explicit edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedDependency {
    pub task_id: TaskId,
    pub depends_on_id: TaskId,
    pub dep_type: DependencyType,
}

/// Validated import document.
///
/// Tasks are ordered so that every parent precedes its children. Parents and
/// dependency endpoints outside the document are listed in `external_*` and
/// checked against the store at commit time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportPlan {
    pub tasks: Vec<PlannedTask>,
    pub dependencies: Vec<PlannedDependency>,
    /// Parent ids referenced by the document but not defined in it, with the
    /// type the parent must have.
    pub external_parents: BTreeMap<TaskId, TaskType>,
    /// Dependency endpoints referenced by the document but not defined in it.
    pub external_endpoints: Vec<TaskId>,
    /// BLAKE3 digest of the document's canonical JSON form.
    pub digest: String,
}

/// Planned (or written) row counts of an import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub digest: String,
    pub dry_run: bool,
    pub tasks: usize,
    pub tasks_by_type: BTreeMap<TaskType, usize>,
    pub parent_child_edges: usize,
    pub explicit_edges: usize,
    pub objectives: usize,
}

impl ImportPlan {
    pub fn report(&self, dry_run: bool) -> ImportReport {
        let mut tasks_by_type = BTreeMap::new();
        for task in &self.tasks {
            *tasks_by_type.entry(task.task_type).or_insert(0) += 1;
        }

        ImportReport {
            digest: self.digest.clone(),
            dry_run,
            tasks: self.tasks.len(),
            tasks_by_type,
            parent_child_edges: self.tasks.iter().filter(|t| t.parent_id.is_some()).count(),
            explicit_edges: self.dependencies.len(),
            objectives: self.tasks.iter().map(|t| t.objectives.len()).sum(),
        }
    }
}
