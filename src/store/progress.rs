// src/store/progress.rs

//! Per-learner progress rows.
//!
//! Rows are created on the first status-changing operation for a
//! (task, learner) pair. Readers must go through
//! [`resolve_status`](crate::store::resolve_status) so that a missing row
//! reads as `open`.

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::Result;
use crate::store::parse_text_column;
use crate::store::records::ProgressRecord;
use crate::types::TaskId;

const PROGRESS_COLUMNS: &str = "task_id, learner_id, status, notes, created_at_ms, \
     updated_at_ms, started_at_ms, closed_at_ms";

fn parse_progress_row(row: &Row<'_>) -> rusqlite::Result<ProgressRecord> {
    Ok(ProgressRecord {
        task_id: row.get(0)?,
        learner_id: row.get(1)?,
        status: parse_text_column(2, row.get::<_, String>(2)?)?,
        notes: row.get(3)?,
        created_at_ms: row.get(4)?,
        updated_at_ms: row.get(5)?,
        started_at_ms: row.get(6)?,
        closed_at_ms: row.get(7)?,
    })
}

pub fn get_progress(
    conn: &Connection,
    task_id: &str,
    learner_id: &str,
) -> Result<Option<ProgressRecord>> {
    let sql = format!(
        "SELECT {PROGRESS_COLUMNS} FROM learner_task_progress WHERE task_id=?1 AND learner_id=?2"
    );
    Ok(conn
        .query_row(&sql, params![task_id, learner_id], parse_progress_row)
        .optional()?)
}

/// Every progress row of one learner, keyed by task id, in one query.
pub fn learner_progress(
    conn: &Connection,
    learner_id: &str,
) -> Result<HashMap<TaskId, ProgressRecord>> {
    let sql = format!("SELECT {PROGRESS_COLUMNS} FROM learner_task_progress WHERE learner_id=?1");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![learner_id], parse_progress_row)?;
    let mut out = HashMap::new();
    for row in rows {
        let row = row?;
        out.insert(row.task_id.clone(), row);
    }
    Ok(out)
}

/// Insert or overwrite the row keyed by `(task_id, learner_id)`.
///
/// `created_at_ms` of an existing row is preserved.
pub fn upsert_progress(conn: &Connection, record: &ProgressRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO learner_task_progress(task_id, learner_id, status, notes, created_at_ms, \
         updated_at_ms, started_at_ms, closed_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8) \
         ON CONFLICT(task_id, learner_id) DO UPDATE SET \
           status=excluded.status, notes=excluded.notes, updated_at_ms=excluded.updated_at_ms, \
           started_at_ms=excluded.started_at_ms, closed_at_ms=excluded.closed_at_ms",
        params![
            record.task_id,
            record.learner_id,
            record.status.as_str(),
            record.notes,
            record.created_at_ms,
            record.updated_at_ms,
            record.started_at_ms,
            record.closed_at_ms,
        ],
    )?;
    Ok(())
}

/// Number of progress rows for a pair (0 or 1); used by diagnostics and tests.
pub fn count_progress_rows(conn: &Connection, task_id: &str, learner_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(1) FROM learner_task_progress WHERE task_id=?1 AND learner_id=?2",
        params![task_id, learner_id],
        |row| row.get(0),
    )?)
}
