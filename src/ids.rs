// src/ids.rs

//! Hierarchical task id helpers.
//!
//! Ids look like `proj-a1b2`, `proj-a1b2.1`, `proj-a1b2.1.3`: a root segment
//! followed by numeric path segments. The parent of an id is the id with its
//! last `.N` segment removed.

use std::sync::OnceLock;

use regex::Regex;

use crate::errors::{LearnpathError, Result};
use crate::types::TaskId;

const MAX_ID_LEN: usize = 128;

fn id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_-]*(\.[0-9]+)*$").expect("task id pattern is valid")
    })
}

/// Check that `id` is a well-formed hierarchical task id.
pub fn validate_task_id(id: &str) -> Result<()> {
    if id.is_empty() {
        return Err(LearnpathError::InvalidInput("task id must not be empty".to_string()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(LearnpathError::InvalidInput(format!(
            "task id '{id}' is longer than {MAX_ID_LEN} characters"
        )));
    }
    if !id_pattern().is_match(id) {
        return Err(LearnpathError::InvalidInput(format!(
            "task id '{id}' is not a hierarchical id (expected e.g. 'proj-a1b2.1.1')"
        )));
    }
    Ok(())
}

/// Parent id encoded in the path, if any.
pub fn derive_parent_id(id: &str) -> Option<TaskId> {
    let (parent, last) = id.rsplit_once('.')?;
    if parent.is_empty() || last.is_empty() || !last.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(parent.to_string())
}

/// Check that a learner id is usable as a key.
pub fn validate_learner_id(learner_id: &str) -> Result<()> {
    if learner_id.trim().is_empty() {
        return Err(LearnpathError::InvalidInput(
            "learner id must not be empty".to_string(),
        ));
    }
    Ok(())
}
