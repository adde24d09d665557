// src/engine/template.rs

//! Admin maintenance of the shared template: tasks and dependency edges.

use rusqlite::Connection;
use tracing::info;

use crate::config::EngineSettings;
use crate::dag::{would_create_cycle, DependencyGraph};
use crate::errors::{LearnpathError, Result};
use crate::ids::{derive_parent_id, validate_task_id};
use crate::store::{self, now_ms, Dependency, TaskRecord};
use crate::types::{DependencyType, TaskId, TaskType, DEFAULT_PRIORITY, MAX_PRIORITY};
use crate::validators::ValidatorSpec;

/// A task to add to the template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub id: TaskId,
    pub task_type: TaskType,
    pub title: String,
    pub description: Option<String>,
    pub acceptance_criteria: Option<String>,
    pub priority: u8,
    pub requires_submission: Option<bool>,
    pub validator: Option<ValidatorSpec>,
    /// Explicit parent; derived from the id when `None`.
    pub parent_id: Option<TaskId>,
    pub objectives: Vec<String>,
}

impl NewTask {
    pub fn new(id: impl Into<TaskId>, task_type: TaskType, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            task_type,
            title: title.into(),
            description: None,
            acceptance_criteria: None,
            priority: DEFAULT_PRIORITY,
            requires_submission: None,
            validator: None,
            parent_id: None,
            objectives: Vec::new(),
        }
    }
}

/// Field updates for an existing task; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub acceptance_criteria: Option<Option<String>>,
    pub priority: Option<u8>,
    pub requires_submission: Option<Option<bool>>,
    pub validator: Option<Option<ValidatorSpec>>,
}

pub(crate) fn check_priority(task_id: &str, priority: u8) -> std::result::Result<(), String> {
    if priority > MAX_PRIORITY {
        return Err(format!(
            "task '{task_id}' has priority {priority}; expected 0 (highest) to {MAX_PRIORITY}"
        ));
    }
    Ok(())
}

/// Enforce the strict project -> epic -> task -> subtask hierarchy.
pub(crate) fn check_parent_type(
    task_id: &str,
    task_type: TaskType,
    parent: Option<(&str, TaskType)>,
) -> std::result::Result<(), String> {
    match (task_type.parent_type(), parent) {
        (None, None) => Ok(()),
        (None, Some((parent_id, _))) => Err(format!(
            "project '{task_id}' cannot have a parent (got '{parent_id}')"
        )),
        (Some(expected), None) => Err(format!(
            "{task_type} '{task_id}' needs a parent of type {expected}"
        )),
        (Some(expected), Some((parent_id, actual))) if expected != actual => Err(format!(
            "{task_type} '{task_id}' must have a {expected} parent, but '{parent_id}' is a {actual}"
        )),
        (Some(_), Some(_)) => Ok(()),
    }
}

/// Parent of a new task: the explicit one, else the one encoded in its id.
pub(crate) fn parent_for(
    task_id: &str,
    task_type: TaskType,
    explicit: Option<&str>,
) -> Option<TaskId> {
    match explicit {
        Some(parent) => Some(parent.to_string()),
        None if task_type == TaskType::Project => None,
        None => derive_parent_id(task_id),
    }
}

fn load_graph(conn: &Connection) -> Result<DependencyGraph> {
    Ok(DependencyGraph::from_edges(&store::deps::blocking_edges(conn)?))
}

/// Insert an edge after the cycle check, inside the caller's transaction.
fn insert_checked_edge(
    conn: &Connection,
    settings: &EngineSettings,
    task_id: &str,
    depends_on_id: &str,
    dep_type: DependencyType,
) -> Result<Dependency> {
    if dep_type.is_blocking() {
        if task_id == depends_on_id {
            return Err(LearnpathError::Cycle {
                task_id: task_id.to_string(),
                depends_on_id: depends_on_id.to_string(),
            });
        }
        let graph = load_graph(conn)?;
        if would_create_cycle(
            &graph,
            task_id,
            depends_on_id,
            dep_type,
            settings.max_traversal_depth,
        ) {
            return Err(LearnpathError::Cycle {
                task_id: task_id.to_string(),
                depends_on_id: depends_on_id.to_string(),
            });
        }
    }

    let dep = Dependency {
        task_id: task_id.to_string(),
        depends_on_id: depends_on_id.to_string(),
        dep_type,
        created_at_ms: now_ms(),
    };
    store::deps::insert_dependency(conn, &dep)?;
    Ok(dep)
}

pub(crate) fn add_dependency_tx(
    conn: &Connection,
    settings: &EngineSettings,
    task_id: &str,
    depends_on_id: &str,
    dep_type: DependencyType,
) -> Result<Dependency> {
    if dep_type == DependencyType::ParentChild {
        return Err(LearnpathError::InvalidInput(
            "parent_child edges are derived from the task hierarchy and cannot be added".to_string(),
        ));
    }
    if task_id == depends_on_id && !dep_type.is_blocking() {
        return Err(LearnpathError::InvalidInput(format!(
            "task '{task_id}' cannot be related to itself"
        )));
    }
    for id in [task_id, depends_on_id] {
        if !store::tasks::task_exists(conn, id)? {
            return Err(LearnpathError::TaskNotFound(id.to_string()));
        }
    }

    let dep = insert_checked_edge(conn, settings, task_id, depends_on_id, dep_type)?;
    info!(task = %task_id, depends_on = %depends_on_id, dep_type = %dep_type, "dependency added");
    Ok(dep)
}

/// Remove the explicit edges from `task_id` to `depends_on_id`.
pub(crate) fn remove_dependency_tx(
    conn: &Connection,
    task_id: &str,
    depends_on_id: &str,
) -> Result<Vec<Dependency>> {
    let edges = store::deps::dependencies_between(conn, task_id, depends_on_id)?;
    if edges.is_empty() {
        return Err(LearnpathError::DependencyNotFound {
            task_id: task_id.to_string(),
            depends_on_id: depends_on_id.to_string(),
        });
    }

    let removable: Vec<Dependency> = edges
        .into_iter()
        .filter(|dep| dep.dep_type != DependencyType::ParentChild)
        .collect();
    if removable.is_empty() {
        return Err(LearnpathError::InvalidInput(format!(
            "'{task_id}' -> '{depends_on_id}' is a parent_child edge; it follows the task hierarchy"
        )));
    }

    for dep in &removable {
        store::deps::delete_dependency(conn, &dep.task_id, &dep.depends_on_id, dep.dep_type)?;
        info!(task = %task_id, depends_on = %depends_on_id, dep_type = %dep.dep_type, "dependency removed");
    }
    Ok(removable)
}

pub(crate) fn create_task_tx(
    conn: &Connection,
    settings: &EngineSettings,
    new_task: NewTask,
) -> Result<TaskRecord> {
    validate_task_id(&new_task.id)?;
    if new_task.title.trim().is_empty() {
        return Err(LearnpathError::InvalidInput(format!(
            "task '{}' must have a title",
            new_task.id
        )));
    }
    check_priority(&new_task.id, new_task.priority).map_err(LearnpathError::InvalidInput)?;
    if let Some(spec) = &new_task.validator {
        spec.check()?;
    }

    let parent_id = parent_for(&new_task.id, new_task.task_type, new_task.parent_id.as_deref());
    let parent = match &parent_id {
        Some(id) => Some(store::tasks::require_task(conn, id)?),
        None => None,
    };
    check_parent_type(
        &new_task.id,
        new_task.task_type,
        parent.as_ref().map(|p| (p.id.as_str(), p.task_type)),
    )
    .map_err(LearnpathError::InvalidInput)?;

    let now = now_ms();
    let mut record = TaskRecord {
        id: new_task.id,
        parent_id,
        task_type: new_task.task_type,
        title: new_task.title,
        description: new_task.description,
        acceptance_criteria: new_task.acceptance_criteria,
        priority: new_task.priority,
        requires_submission: new_task.requires_submission,
        validator: new_task.validator,
        created_at_ms: now,
        updated_at_ms: now,
        seq: 0,
    };
    store::tasks::insert_task(conn, &record)?;
    record.seq = conn.last_insert_rowid();
    store::tasks::insert_objectives(conn, &record.id, &new_task.objectives)?;

    if let Some(parent_id) = &record.parent_id {
        insert_checked_edge(conn, settings, &record.id, parent_id, DependencyType::ParentChild)?;
    }

    info!(task = %record.id, task_type = %record.task_type, "task created");
    Ok(record)
}

pub(crate) fn edit_task_tx(conn: &Connection, task_id: &str, edit: TaskEdit) -> Result<TaskRecord> {
    let mut record = store::tasks::require_task(conn, task_id)?;

    if let Some(title) = edit.title {
        if title.trim().is_empty() {
            return Err(LearnpathError::InvalidInput(format!(
                "task '{task_id}' must have a title"
            )));
        }
        record.title = title;
    }
    if let Some(description) = edit.description {
        record.description = description;
    }
    if let Some(criteria) = edit.acceptance_criteria {
        record.acceptance_criteria = criteria;
    }
    if let Some(priority) = edit.priority {
        check_priority(task_id, priority).map_err(LearnpathError::InvalidInput)?;
        record.priority = priority;
    }
    if let Some(requires_submission) = edit.requires_submission {
        record.requires_submission = requires_submission;
    }
    if let Some(validator) = edit.validator {
        if let Some(spec) = &validator {
            spec.check()?;
        }
        record.validator = validator;
    }

    record.updated_at_ms = now_ms();
    store::tasks::update_task(conn, &record)?;
    info!(task = %task_id, "task edited");
    Ok(record)
}
