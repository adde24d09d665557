// src/engine/pipeline.rs

//! Submission and validation pipeline.
//!
//! One transaction: append the attempt, validate it, record the verdict and,
//! on a pass, close the task and run the cascade. A close that is refused
//! after a pass (the task is already closed or still blocked) is reported in
//! the message instead of rolling back the attempt.

use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::engine::cascade::{cascade_tx, AutoClosed};
use crate::dag::Resolver;
use crate::engine::state_machine::close_tx;
use crate::errors::{LearnpathError, Result};
use crate::store::{self, now_ms, ValidationRecord};
use crate::types::{Status, TaskId};
use crate::validators::ValidatorRegistry;

/// What the pipeline committed, before ready work is recomputed.
#[derive(Debug, Clone)]
pub(crate) struct SubmitOutcome {
    pub task_id: TaskId,
    pub status: Status,
    pub attempt_number: i64,
    pub validation_passed: bool,
    pub message: String,
    pub auto_closed: Vec<AutoClosed>,
}

/// Hex BLAKE3 digest of a submission payload.
pub fn payload_digest(payload: &str) -> String {
    blake3::hash(payload.as_bytes()).to_hex().to_string()
}

pub(crate) fn submit_tx(
    conn: &Connection,
    settings: &EngineSettings,
    validators: &ValidatorRegistry,
    task_id: &str,
    learner_id: &str,
    payload: &str,
) -> Result<SubmitOutcome> {
    let task = store::tasks::require_task(conn, task_id)?;
    let validator = validators.resolve(&task)?;

    let now = now_ms();
    let attempt_number = store::submissions::next_attempt_number(conn, task_id, learner_id)?;
    let submission_id = store::submissions::insert_submission(
        conn,
        task_id,
        learner_id,
        attempt_number,
        payload,
        &payload_digest(payload),
        now,
    )?;

    let verdict = validator.validate(&task, payload);
    store::submissions::insert_validation(
        conn,
        &ValidationRecord {
            submission_id,
            passed: verdict.passed,
            message: verdict.message.clone(),
            validator: validator.name().to_string(),
            created_at_ms: now,
        },
    )?;
    debug!(
        task = %task_id,
        learner = %learner_id,
        attempt = attempt_number,
        validator = validator.name(),
        passed = verdict.passed,
        "submission validated"
    );

    let mut message = verdict.message.clone();
    let mut auto_closed = Vec::new();
    if verdict.passed {
        let reason = format!("submission #{attempt_number} passed");
        match close_tx(conn, settings, &task, learner_id, &reason) {
            Ok(_) => auto_closed = cascade_tx(conn, settings, &task, learner_id)?,
            Err(LearnpathError::InvalidTransition { reason, .. }) => {
                warn!(task = %task_id, learner = %learner_id, %reason, "close skipped after passing submission");
                message = format!("{message} (close skipped: {reason})");
            }
            Err(other) => return Err(other),
        }
    }

    // Same view as show_task: `blocked` is derived, not stored.
    let status = Resolver::load(conn, learner_id, settings.max_traversal_depth)?
        .effective_status(task_id);
    info!(
        task = %task_id,
        learner = %learner_id,
        attempt = attempt_number,
        passed = verdict.passed,
        %status,
        auto_closed = auto_closed.len(),
        "submission recorded"
    );

    Ok(SubmitOutcome {
        task_id: task_id.to_string(),
        status,
        attempt_number,
        validation_passed: verdict.passed,
        message,
        auto_closed,
    })
}
