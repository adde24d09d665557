// src/store/tasks.rs

//! Template task rows and their learning objectives.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::{LearnpathError, Result};
use crate::store::records::TaskRecord;
use crate::store::{is_unique_violation, parse_text_column};
use crate::types::TaskId;
use crate::validators::ValidatorSpec;

const TASK_COLUMNS: &str = "rowid, id, parent_id, task_type, title, description, \
     acceptance_criteria, priority, requires_submission, validator_json, created_at_ms, \
     updated_at_ms";

fn parse_task_row(row: &Row<'_>) -> rusqlite::Result<TaskRecord> {
    let validator = match row.get::<_, Option<String>>(9)? {
        Some(raw) => Some(serde_json::from_str::<ValidatorSpec>(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(9, rusqlite::types::Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(TaskRecord {
        seq: row.get(0)?,
        id: row.get(1)?,
        parent_id: row.get(2)?,
        task_type: parse_text_column(3, row.get::<_, String>(3)?)?,
        title: row.get(4)?,
        description: row.get(5)?,
        acceptance_criteria: row.get(6)?,
        priority: row.get(7)?,
        requires_submission: row.get(8)?,
        validator,
        created_at_ms: row.get(10)?,
        updated_at_ms: row.get(11)?,
    })
}

fn validator_json(task: &TaskRecord) -> Result<Option<String>> {
    Ok(task
        .validator
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?)
}

/// Insert a new template task. An existing id is reported as a duplicate.
pub fn insert_task(conn: &Connection, task: &TaskRecord) -> Result<()> {
    let validator_json = validator_json(task)?;
    let inserted = conn.execute(
        "INSERT INTO tasks(id, parent_id, task_type, title, description, acceptance_criteria, \
         priority, requires_submission, validator_json, created_at_ms, updated_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            task.id,
            task.parent_id,
            task.task_type.as_str(),
            task.title,
            task.description,
            task.acceptance_criteria,
            task.priority,
            task.requires_submission,
            validator_json,
            task.created_at_ms,
            task.updated_at_ms,
        ],
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => {
            Err(LearnpathError::Duplicate(format!("task '{}'", task.id)))
        }
        Err(err) => Err(err.into()),
    }
}

/// Overwrite the editable content of an existing task.
pub fn update_task(conn: &Connection, task: &TaskRecord) -> Result<()> {
    let validator_json = validator_json(task)?;
    let changed = conn.execute(
        "UPDATE tasks SET title=?2, description=?3, acceptance_criteria=?4, priority=?5, \
         requires_submission=?6, validator_json=?7, updated_at_ms=?8 WHERE id=?1",
        params![
            task.id,
            task.title,
            task.description,
            task.acceptance_criteria,
            task.priority,
            task.requires_submission,
            validator_json,
            task.updated_at_ms,
        ],
    )?;
    if changed == 0 {
        return Err(LearnpathError::TaskNotFound(task.id.clone()));
    }
    Ok(())
}

pub fn get_task(conn: &Connection, id: &str) -> Result<Option<TaskRecord>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id=?1");
    Ok(conn.query_row(&sql, params![id], parse_task_row).optional()?)
}

/// Like [`get_task`], but a missing task is an error.
pub fn require_task(conn: &Connection, id: &str) -> Result<TaskRecord> {
    get_task(conn, id)?.ok_or_else(|| LearnpathError::TaskNotFound(id.to_string()))
}

pub fn task_exists(conn: &Connection, id: &str) -> Result<bool> {
    let found = conn
        .query_row("SELECT 1 FROM tasks WHERE id=?1", params![id], |_| Ok(()))
        .optional()?;
    Ok(found.is_some())
}

/// Every template task, in insertion order.
pub fn list_tasks(conn: &Connection) -> Result<Vec<TaskRecord>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY rowid ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], parse_task_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Direct children of a task, in insertion order.
pub fn children_of(conn: &Connection, parent_id: &str) -> Result<Vec<TaskRecord>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE parent_id=?1 ORDER BY rowid ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![parent_id], parse_task_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn child_ids_of(conn: &Connection, parent_id: &str) -> Result<Vec<TaskId>> {
    let mut stmt = conn.prepare("SELECT id FROM tasks WHERE parent_id=?1 ORDER BY rowid ASC")?;
    let rows = stmt.query_map(params![parent_id], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn count_tasks(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(1) FROM tasks", [], |row| row.get(0))?)
}

pub fn insert_objectives(conn: &Connection, task_id: &str, objectives: &[String]) -> Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO task_objectives(task_id, position, objective) VALUES (?1, ?2, ?3)",
    )?;
    for (position, objective) in objectives.iter().enumerate() {
        let position = i64::try_from(position).unwrap_or(i64::MAX);
        stmt.execute(params![task_id, position, objective])?;
    }
    Ok(())
}

pub fn objectives_of(conn: &Connection, task_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT objective FROM task_objectives WHERE task_id=?1 ORDER BY position ASC",
    )?;
    let rows = stmt.query_map(params![task_id], |row| row.get::<_, String>(0))?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}
