// src/engine/cascade.rs

//! Auto-close of ancestors once all their children are closed.

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::EngineSettings;
use crate::engine::state_machine::close_tx;
use crate::errors::{LearnpathError, Result};
use crate::store::{self, resolve_status, TaskRecord};
use crate::types::{CascadePolicy, Status, TaskId, TaskType};

/// Note recorded on parents closed by the cascade.
pub const AUTO_CLOSE_REASON: &str = "auto: all children complete";

/// An ancestor closed by the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AutoClosed {
    pub id: TaskId,
    pub task_type: TaskType,
}

/// Climb from the parent of `closed` towards the root, closing every parent
/// whose children are now all closed for this learner.
///
/// Stops at the first parent that requires a submission, still has an
/// unclosed child, or cannot be closed. Returns the closed ancestors in
/// child-to-root order.
pub(crate) fn cascade_tx(
    conn: &Connection,
    settings: &EngineSettings,
    closed: &TaskRecord,
    learner_id: &str,
) -> Result<Vec<AutoClosed>> {
    let mut auto_closed = Vec::new();
    if settings.cascade == CascadePolicy::Explicit {
        return Ok(auto_closed);
    }

    let mut next_parent = closed.parent_id.clone();
    for _ in 0..settings.max_traversal_depth {
        let Some(parent_id) = next_parent.take() else {
            break;
        };
        let parent = store::tasks::require_task(conn, &parent_id)?;

        if settings
            .submission
            .resolve(parent.task_type, parent.requires_submission)
        {
            debug!(parent = %parent.id, "cascade stops: parent requires a submission");
            break;
        }

        if !all_children_closed(conn, &parent.id, learner_id)? {
            debug!(parent = %parent.id, "cascade stops: parent has unclosed children");
            break;
        }

        match close_tx(conn, settings, &parent, learner_id, AUTO_CLOSE_REASON) {
            Ok(_) => {}
            Err(LearnpathError::InvalidTransition { reason, .. }) => {
                warn!(parent = %parent.id, learner = %learner_id, %reason, "cascade stops: close failed");
                break;
            }
            Err(other) => return Err(other),
        }

        info!(parent = %parent.id, task_type = %parent.task_type, learner = %learner_id, "auto-closed");
        auto_closed.push(AutoClosed {
            id: parent.id.clone(),
            task_type: parent.task_type,
        });
        next_parent = parent.parent_id;
    }

    Ok(auto_closed)
}

fn all_children_closed(conn: &Connection, parent_id: &str, learner_id: &str) -> Result<bool> {
    for child_id in store::tasks::child_ids_of(conn, parent_id)? {
        let row = store::progress::get_progress(conn, &child_id, learner_id)?;
        if resolve_status(row.as_ref()) != Status::Closed {
            return Ok(false);
        }
    }
    Ok(true)
}
