// src/config/validate.rs

use std::collections::BTreeMap;
use std::time::Duration;

use crate::config::model::{EngineConfig, EngineSettings, RawEngineConfig, StoreSettings};
use crate::errors::{LearnpathError, Result};
use crate::types::TaskType;
use crate::validators::ValidatorSpec;

/// Upper bound accepted for `[engine].max_traversal_depth`.
pub const MAX_TRAVERSAL_DEPTH_LIMIT: usize = 10_000;

impl TryFrom<RawEngineConfig> for EngineConfig {
    type Error = LearnpathError;

    fn try_from(raw: RawEngineConfig) -> std::result::Result<Self, Self::Error> {
        validate_engine_section(&raw)?;
        validate_store_section(&raw)?;
        let validators = validate_validators(&raw.validator)?;

        Ok(EngineConfig {
            engine: EngineSettings {
                cascade: raw.engine.cascade,
                max_traversal_depth: raw.engine.max_traversal_depth,
                submission: raw.submission,
            },
            store: StoreSettings {
                path: raw.store.path,
                busy_timeout: Duration::from_millis(raw.store.busy_timeout_ms),
            },
            validators,
        })
    }
}

fn validate_engine_section(cfg: &RawEngineConfig) -> Result<()> {
    let depth = cfg.engine.max_traversal_depth;
    if depth == 0 || depth > MAX_TRAVERSAL_DEPTH_LIMIT {
        return Err(LearnpathError::ConfigError(format!(
            "[engine].max_traversal_depth must be between 1 and {MAX_TRAVERSAL_DEPTH_LIMIT} (got {depth})"
        )));
    }
    Ok(())
}

fn validate_store_section(cfg: &RawEngineConfig) -> Result<()> {
    if cfg.store.busy_timeout_ms == 0 {
        return Err(LearnpathError::ConfigError(
            "[store].busy_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if cfg.store.path.as_os_str().is_empty() {
        return Err(LearnpathError::ConfigError(
            "[store].path must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_validators(
    raw: &BTreeMap<String, ValidatorSpec>,
) -> Result<BTreeMap<TaskType, ValidatorSpec>> {
    let mut out = BTreeMap::new();
    for (key, spec) in raw {
        let task_type: TaskType = key
            .parse()
            .map_err(|e| LearnpathError::ConfigError(format!("[validator.{key}]: {e}")))?;
        spec.check().map_err(|e| match e {
            LearnpathError::ConfigError(msg) => {
                LearnpathError::ConfigError(format!("[validator.{key}]: {msg}"))
            }
            other => other,
        })?;
        out.insert(task_type, spec.clone());
    }
    Ok(out)
}
