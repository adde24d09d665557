// src/logging.rs

//! Logging setup for `learnpath` using `tracing` + `tracing-subscriber`.
//!
//! The filter comes from, in order:
//! 1. `--log-level` (applies to every target)
//! 2. `LEARNPATH_LOG`, which accepts full filter directives such as
//!    `warn,learnpath::engine=debug`
//! 3. `info`
//!
//! Events go to stderr; stdout carries command output, including `--json`
//! documents.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::LogLevel;

/// Environment variable consulted when no `--log-level` flag is given.
pub const LOG_ENV_VAR: &str = "LEARNPATH_LOG";

const DEFAULT_DIRECTIVES: &str = "info";

/// Install the global subscriber. Fails if one is already installed.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env_value = std::env::var(LOG_ENV_VAR).ok();
    let (filter, rejected) = build_filter(cli_level, env_value.as_deref());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))?;

    if let Some(value) = rejected {
        tracing::warn!(%value, "ignoring unparsable {LOG_ENV_VAR}; using {DEFAULT_DIRECTIVES}");
    }
    Ok(())
}

/// Filter for the given flag and environment value. The second element is
/// the environment value when it had to be ignored.
fn build_filter(cli_level: Option<LogLevel>, env_value: Option<&str>) -> (EnvFilter, Option<String>) {
    if let Some(level) = cli_level {
        return (EnvFilter::new(directive_for(level)), None);
    }

    match env_value.map(str::trim).filter(|v| !v.is_empty()) {
        None => (EnvFilter::new(DEFAULT_DIRECTIVES), None),
        Some(value) => match EnvFilter::try_new(value) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_DIRECTIVES), Some(value.to_string())),
        },
    }
}

fn directive_for(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Error => "error",
        LogLevel::Warn => "warn",
        LogLevel::Info => "info",
        LogLevel::Debug => "debug",
        LogLevel::Trace => "trace",
    }
}
