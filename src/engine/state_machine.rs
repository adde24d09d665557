// src/engine/state_machine.rs

//! Legal transitions for one (task, learner) pair.
//!
//! ```text
//! open --start--> in_progress --close--> closed
//!   \______________close______________/     |
//!   ^                                       |
//!   +------------------reopen---------------+
//! ```
//!
//! `blocked` is never written here. It is recomputed by the resolver at every
//! decision point, and a stored `blocked` reads as `open`.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::config::EngineSettings;
use crate::dag::Resolver;
use crate::errors::{LearnpathError, Result};
use crate::store::{self, now_ms, ProgressRecord, TaskRecord};
use crate::types::Status;

/// `open -> in_progress`. Starting an in-progress or closed task returns its
/// current record unchanged.
pub(crate) fn start_tx(
    conn: &Connection,
    settings: &EngineSettings,
    task_id: &str,
    learner_id: &str,
) -> Result<ProgressRecord> {
    let resolver = Resolver::load(conn, learner_id, settings.max_traversal_depth)?;
    resolver.task(task_id)?;

    let existing = resolver.progress_of(task_id).cloned();
    match resolver.status_of(task_id) {
        Status::InProgress | Status::Closed => {
            debug!(task = %task_id, learner = %learner_id, "start is a no-op");
            if let Some(record) = existing {
                return Ok(record);
            }
        }
        _ => {}
    }

    ensure_unblocked(&resolver, task_id)?;

    let now = now_ms();
    let mut record = existing.unwrap_or_else(|| ProgressRecord::fresh(task_id, learner_id, now));
    record.status = Status::InProgress;
    record.updated_at_ms = now;
    record.started_at_ms.get_or_insert(now);
    record.closed_at_ms = None;
    store::progress::upsert_progress(conn, &record)?;

    info!(task = %task_id, learner = %learner_id, "task started");
    Ok(record)
}

fn ensure_unblocked(resolver: &Resolver, task_id: &str) -> Result<()> {
    if !resolver.is_blocked(task_id) {
        return Ok(());
    }
    let blockers: Vec<String> = resolver.blocking_tasks(task_id).into_iter().collect();
    let reason = if blockers.is_empty() {
        "task is blocked (dependency chain exceeds the traversal depth)".to_string()
    } else {
        format!("task is blocked by: {}", blockers.join(", "))
    };
    Err(LearnpathError::invalid_transition(task_id, reason))
}

/// `open | in_progress -> closed`, refused while the task is blocked for the
/// learner and gated on a passing submission when the task requires one.
pub(crate) fn close_tx(
    conn: &Connection,
    settings: &EngineSettings,
    task: &TaskRecord,
    learner_id: &str,
    reason: &str,
) -> Result<ProgressRecord> {
    let resolver = Resolver::load(conn, learner_id, settings.max_traversal_depth)?;
    let existing = resolver.progress_of(&task.id).cloned();
    if resolver.status_of(&task.id) == Status::Closed {
        return Err(LearnpathError::invalid_transition(&task.id, "task is already closed"));
    }
    ensure_unblocked(&resolver, &task.id)?;

    if settings
        .submission
        .resolve(task.task_type, task.requires_submission)
    {
        ensure_passing_submission(conn, task, learner_id)?;
    }

    let now = now_ms();
    let mut record = existing.unwrap_or_else(|| ProgressRecord::fresh(&task.id, learner_id, now));
    record.status = Status::Closed;
    record.updated_at_ms = now;
    record.closed_at_ms = Some(now);
    record.append_note(reason);
    store::progress::upsert_progress(conn, &record)?;

    info!(task = %task.id, learner = %learner_id, reason, "task closed");
    Ok(record)
}

fn ensure_passing_submission(conn: &Connection, task: &TaskRecord, learner_id: &str) -> Result<()> {
    let latest = store::submissions::latest_submission(conn, &task.id, learner_id)?;
    match latest {
        None => Err(LearnpathError::invalid_transition(
            &task.id,
            "a passing submission is required before closing",
        )),
        Some(submission) => match submission.validation {
            Some(validation) if validation.passed => Ok(()),
            Some(_) => Err(LearnpathError::invalid_transition(
                &task.id,
                format!(
                    "latest submission (attempt {}) did not pass validation",
                    submission.attempt_number
                ),
            )),
            None => Err(LearnpathError::invalid_transition(
                &task.id,
                format!(
                    "latest submission (attempt {}) has not been validated",
                    submission.attempt_number
                ),
            )),
        },
    }
}

/// Explicit go-back to `open` or `in_progress`.
///
/// Legal from `closed`, or while the task is blocked for this learner.
pub(crate) fn reopen_tx(
    conn: &Connection,
    settings: &EngineSettings,
    task_id: &str,
    learner_id: &str,
    target: Status,
    reason: &str,
) -> Result<ProgressRecord> {
    if !matches!(target, Status::Open | Status::InProgress) {
        return Err(LearnpathError::InvalidInput(format!(
            "cannot reopen to '{target}' (expected open or in_progress)"
        )));
    }

    let resolver = Resolver::load(conn, learner_id, settings.max_traversal_depth)?;
    resolver.task(task_id)?;

    let stored = resolver.stored_status(task_id);
    let legal = stored == Status::Closed
        || stored == Status::Blocked
        || resolver.effective_status(task_id) == Status::Blocked;
    if !legal {
        return Err(LearnpathError::invalid_transition(
            task_id,
            format!("only closed or blocked tasks can be reopened (status is {stored})"),
        ));
    }

    let now = now_ms();
    let mut record = resolver
        .progress_of(task_id)
        .cloned()
        .unwrap_or_else(|| ProgressRecord::fresh(task_id, learner_id, now));
    record.status = target;
    record.updated_at_ms = now;
    record.closed_at_ms = None;
    if target == Status::InProgress {
        record.started_at_ms.get_or_insert(now);
    }
    if !reason.trim().is_empty() {
        record.append_note(&format!("reopened: {}", reason.trim()));
    }
    store::progress::upsert_progress(conn, &record)?;

    info!(task = %task_id, learner = %learner_id, to = %target, "task reopened");
    Ok(record)
}
