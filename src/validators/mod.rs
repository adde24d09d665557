// src/validators/mod.rs

//! Pluggable submission validators.
//!
//! The pipeline talks to a [`Validator`] trait object instead of a concrete
//! checker, so tests can swap in fakes and deployments can register richer
//! validators (result comparison, test runners) per task type.
//!
//! Resolution order for a task:
//! 1. the task's own [`ValidatorSpec`] (from ingestion or admin edit)
//! 2. the registry entry for its [`TaskType`]
//! 3. the registry fallback ([`NonEmptyValidator`] unless replaced)

pub mod builtin;

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::{LearnpathError, Result};
use crate::store::TaskRecord;
use crate::types::TaskType;

pub use builtin::{AcceptValidator, ExactMatchValidator, NonEmptyValidator, RegexValidator};

/// Result of validating one payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub passed: bool,
    pub message: String,
}

impl Verdict {
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            passed: true,
            message: message.into(),
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: message.into(),
        }
    }
}

/// A synchronous check run against a learner's submission.
pub trait Validator: Send + Sync + Debug {
    /// Short identifier stored alongside each validation row.
    fn name(&self) -> &str;

    fn validate(&self, task: &TaskRecord, payload: &str) -> Verdict;
}

/// Declarative validator configuration, as found in import documents,
/// `[validator.<type>]` config sections and the `validator_json` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidatorSpec {
    /// Payload must contain something other than whitespace.
    NonEmpty,
    /// Payload must match the regular expression.
    Regex { pattern: String },
    /// Payload (trimmed) must equal `expected`.
    Exact {
        expected: String,
        #[serde(default)]
        ignore_case: bool,
    },
    /// Every payload passes.
    Accept,
}

impl ValidatorSpec {
    /// Instantiate the validator this spec describes.
    pub fn build(&self) -> Result<Arc<dyn Validator>> {
        let validator: Arc<dyn Validator> = match self {
            ValidatorSpec::NonEmpty => Arc::new(NonEmptyValidator),
            ValidatorSpec::Regex { pattern } => Arc::new(RegexValidator::new(pattern)?),
            ValidatorSpec::Exact {
                expected,
                ignore_case,
            } => Arc::new(ExactMatchValidator::new(expected, *ignore_case)),
            ValidatorSpec::Accept => Arc::new(AcceptValidator),
        };
        Ok(validator)
    }

    /// Check that the spec can be built (e.g. the regex compiles).
    pub fn check(&self) -> Result<()> {
        self.build().map(|_| ())
    }
}

/// Validators keyed by task type, with a fallback.
#[derive(Debug, Clone)]
pub struct ValidatorRegistry {
    by_type: HashMap<TaskType, Arc<dyn Validator>>,
    fallback: Arc<dyn Validator>,
}

impl Default for ValidatorRegistry {
    fn default() -> Self {
        Self {
            by_type: HashMap::new(),
            fallback: Arc::new(NonEmptyValidator),
        }
    }
}

impl ValidatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from `[validator.<type>]` config entries.
    pub fn from_specs<'a>(
        specs: impl IntoIterator<Item = (&'a TaskType, &'a ValidatorSpec)>,
    ) -> Result<Self> {
        let mut registry = Self::new();
        for (task_type, spec) in specs {
            registry.register(*task_type, spec.build()?);
        }
        Ok(registry)
    }

    /// Use `validator` for every task of `task_type` without its own spec.
    pub fn register(&mut self, task_type: TaskType, validator: Arc<dyn Validator>) {
        self.by_type.insert(task_type, validator);
    }

    /// Replace the validator used when nothing more specific applies.
    pub fn set_fallback(&mut self, validator: Arc<dyn Validator>) {
        self.fallback = validator;
    }

    /// Pick the validator for a task.
    pub fn resolve(&self, task: &TaskRecord) -> Result<Arc<dyn Validator>> {
        if let Some(spec) = &task.validator {
            return spec.build().map_err(|e| match e {
                LearnpathError::ConfigError(msg) => LearnpathError::ConfigError(format!(
                    "task '{}' has an invalid validator: {msg}",
                    task.id
                )),
                other => other,
            });
        }
        Ok(self
            .by_type
            .get(&task.task_type)
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.fallback)))
    }
}
