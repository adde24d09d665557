// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::{CascadePolicy, SubmissionPolicy, TaskType};
use crate::validators::ValidatorSpec;

/// Configuration file as read from TOML, before semantic validation.
///
/// ```toml
/// [engine]
/// cascade = "auto_close"
/// max_traversal_depth = 100
///
/// [store]
/// path = "learnpath.db"
/// busy_timeout_ms = 5000
///
/// [submission]
/// task = true
///
/// [validator.subtask]
/// kind = "regex"
/// pattern = "(?i)select"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawEngineConfig {
    #[serde(default)]
    pub engine: EngineSection,

    #[serde(default)]
    pub store: StoreSection,

    /// Default `requires_submission` per task type.
    #[serde(default)]
    pub submission: SubmissionPolicy,

    /// Validators keyed by task type name (`[validator.<type>]`).
    #[serde(default)]
    pub validator: BTreeMap<String, ValidatorSpec>,
}

/// `[engine]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// `"auto_close"` (default) or `"explicit"`.
    #[serde(default)]
    pub cascade: CascadePolicy,

    /// Cap on graph traversals (cycle checks, blocking, cascade).
    #[serde(default = "default_max_traversal_depth")]
    pub max_traversal_depth: usize,
}

fn default_max_traversal_depth() -> usize {
    100
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            cascade: CascadePolicy::default(),
            max_traversal_depth: default_max_traversal_depth(),
        }
    }
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreSection {
    /// SQLite database file, relative to the working directory.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// How long a writer waits on a locked database before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("learnpath.db")
}

fn default_busy_timeout_ms() -> u64 {
    5_000
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

/// Engine behaviour knobs, shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineSettings {
    pub cascade: CascadePolicy,
    pub max_traversal_depth: usize,
    pub submission: SubmissionPolicy,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            cascade: CascadePolicy::default(),
            max_traversal_depth: default_max_traversal_depth(),
            submission: SubmissionPolicy::default(),
        }
    }
}

/// Where and how to open the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub path: PathBuf,
    pub busy_timeout: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            busy_timeout: Duration::from_millis(default_busy_timeout_ms()),
        }
    }
}

/// Validated configuration.
///
/// Constructed via `TryFrom<RawEngineConfig>` (see `config::validate`), so
/// holding one means the traversal cap is in range, the busy timeout is
/// positive and every validator spec compiles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineConfig {
    pub engine: EngineSettings,
    pub store: StoreSettings,
    pub validators: BTreeMap<TaskType, ValidatorSpec>,
}

impl EngineConfig {
    /// Same configuration with a different database path (`--db`).
    pub fn with_store_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.store.path = path.into();
        self
    }
}
