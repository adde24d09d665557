// src/store/submissions.rs

//! Append-only submissions and their validations.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::errors::Result;
use crate::store::records::{SubmissionRecord, ValidationRecord};

const SUBMISSION_SELECT: &str = "SELECT s.id, s.task_id, s.learner_id, s.attempt_number, \
     s.payload, s.payload_digest, s.created_at_ms, v.passed, v.message, v.validator, \
     v.created_at_ms \
     FROM submissions s LEFT JOIN validations v ON v.submission_id = s.id";

fn parse_submission_row(row: &Row<'_>) -> rusqlite::Result<SubmissionRecord> {
    let id: i64 = row.get(0)?;
    let validation = match row.get::<_, Option<bool>>(7)? {
        Some(passed) => Some(ValidationRecord {
            submission_id: id,
            passed,
            message: row.get(8)?,
            validator: row.get(9)?,
            created_at_ms: row.get(10)?,
        }),
        None => None,
    };

    Ok(SubmissionRecord {
        id,
        task_id: row.get(1)?,
        learner_id: row.get(2)?,
        attempt_number: row.get(3)?,
        payload: row.get(4)?,
        payload_digest: row.get(5)?,
        created_at_ms: row.get(6)?,
        validation,
    })
}

/// Next attempt number for a (task, learner) pair, starting at 1.
///
/// Must be called inside the same write transaction as the insert that uses
/// it; the unique key on `(task_id, learner_id, attempt_number)` backs this up.
pub fn next_attempt_number(conn: &Connection, task_id: &str, learner_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(MAX(attempt_number), 0) + 1 FROM submissions \
         WHERE task_id=?1 AND learner_id=?2",
        params![task_id, learner_id],
        |row| row.get(0),
    )?)
}

/// Append a submission and return its id.
pub fn insert_submission(
    conn: &Connection,
    task_id: &str,
    learner_id: &str,
    attempt_number: i64,
    payload: &str,
    payload_digest: &str,
    created_at_ms: i64,
) -> Result<i64> {
    conn.execute(
        "INSERT INTO submissions(task_id, learner_id, attempt_number, payload, payload_digest, \
         created_at_ms) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            task_id,
            learner_id,
            attempt_number,
            payload,
            payload_digest,
            created_at_ms
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn insert_validation(conn: &Connection, validation: &ValidationRecord) -> Result<()> {
    conn.execute(
        "INSERT INTO validations(submission_id, passed, message, validator, created_at_ms) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            validation.submission_id,
            validation.passed,
            validation.message,
            validation.validator,
            validation.created_at_ms,
        ],
    )?;
    Ok(())
}

/// The learner's most recent attempt at a task, with its validation.
pub fn latest_submission(
    conn: &Connection,
    task_id: &str,
    learner_id: &str,
) -> Result<Option<SubmissionRecord>> {
    let sql = format!(
        "{SUBMISSION_SELECT} WHERE s.task_id=?1 AND s.learner_id=?2 \
         ORDER BY s.attempt_number DESC LIMIT 1"
    );
    Ok(conn
        .query_row(&sql, params![task_id, learner_id], parse_submission_row)
        .optional()?)
}

/// Full attempt history for a (task, learner) pair, oldest first.
pub fn submissions_for(
    conn: &Connection,
    task_id: &str,
    learner_id: &str,
) -> Result<Vec<SubmissionRecord>> {
    let sql = format!(
        "{SUBMISSION_SELECT} WHERE s.task_id=?1 AND s.learner_id=?2 \
         ORDER BY s.attempt_number ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![task_id, learner_id], parse_submission_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub fn attempt_count(conn: &Connection, task_id: &str, learner_id: &str) -> Result<i64> {
    Ok(conn.query_row(
        "SELECT COUNT(1) FROM submissions WHERE task_id=?1 AND learner_id=?2",
        params![task_id, learner_id],
        |row| row.get(0),
    )?)
}
