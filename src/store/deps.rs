// src/store/deps.rs

//! Dependency edges of the template graph.

use rusqlite::{params, Connection, Row};

use crate::errors::{LearnpathError, Result};
use crate::store::records::Dependency;
use crate::store::{is_unique_violation, parse_text_column};
use crate::types::DependencyType;

const DEP_COLUMNS: &str = "task_id, depends_on_id, dep_type, created_at_ms";

fn parse_dependency_row(row: &Row<'_>) -> rusqlite::Result<Dependency> {
    Ok(Dependency {
        task_id: row.get(0)?,
        depends_on_id: row.get(1)?,
        dep_type: parse_text_column(2, row.get::<_, String>(2)?)?,
        created_at_ms: row.get(3)?,
    })
}

fn query_dependencies(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<Dependency>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params, parse_dependency_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

/// Insert an edge. An identical `(task, depends_on, type)` edge is a duplicate.
pub fn insert_dependency(conn: &Connection, dep: &Dependency) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO dependencies(task_id, depends_on_id, dep_type, created_at_ms) \
         VALUES (?1, ?2, ?3, ?4)",
        params![
            dep.task_id,
            dep.depends_on_id,
            dep.dep_type.as_str(),
            dep.created_at_ms
        ],
    );

    match inserted {
        Ok(_) => Ok(()),
        Err(err) if is_unique_violation(&err) => Err(LearnpathError::Duplicate(format!(
            "dependency {} -> {} ({})",
            dep.task_id, dep.depends_on_id, dep.dep_type
        ))),
        Err(err) => Err(err.into()),
    }
}

/// Delete one edge; returns how many rows were removed (0 or 1).
pub fn delete_dependency(
    conn: &Connection,
    task_id: &str,
    depends_on_id: &str,
    dep_type: DependencyType,
) -> Result<usize> {
    Ok(conn.execute(
        "DELETE FROM dependencies WHERE task_id=?1 AND depends_on_id=?2 AND dep_type=?3",
        params![task_id, depends_on_id, dep_type.as_str()],
    )?)
}

/// All edges from `task_id` to `depends_on_id`, whatever their type.
pub fn dependencies_between(
    conn: &Connection,
    task_id: &str,
    depends_on_id: &str,
) -> Result<Vec<Dependency>> {
    let sql = format!(
        "SELECT {DEP_COLUMNS} FROM dependencies WHERE task_id=?1 AND depends_on_id=?2 \
         ORDER BY dep_type ASC"
    );
    query_dependencies(conn, &sql, params![task_id, depends_on_id])
}

/// Every `blocks` and `parent_child` edge, fetched in one batch.
pub fn blocking_edges(conn: &Connection) -> Result<Vec<Dependency>> {
    let sql = format!(
        "SELECT {DEP_COLUMNS} FROM dependencies WHERE dep_type IN ('blocks', 'parent_child') \
         ORDER BY task_id ASC, depends_on_id ASC"
    );
    query_dependencies(conn, &sql, [])
}

/// Outgoing edges of a task (what it depends on).
pub fn dependencies_of(conn: &Connection, task_id: &str) -> Result<Vec<Dependency>> {
    let sql = format!(
        "SELECT {DEP_COLUMNS} FROM dependencies WHERE task_id=?1 \
         ORDER BY dep_type ASC, depends_on_id ASC"
    );
    query_dependencies(conn, &sql, params![task_id])
}

/// Incoming edges of a task (what depends on it).
pub fn dependents_of(conn: &Connection, task_id: &str) -> Result<Vec<Dependency>> {
    let sql = format!(
        "SELECT {DEP_COLUMNS} FROM dependencies WHERE depends_on_id=?1 \
         ORDER BY dep_type ASC, task_id ASC"
    );
    query_dependencies(conn, &sql, params![task_id])
}
