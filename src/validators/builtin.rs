// src/validators/builtin.rs

use regex::Regex;

use crate::errors::{LearnpathError, Result};
use crate::store::TaskRecord;
use crate::validators::{Validator, Verdict};

/// Minimum viable check: the payload is not blank.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonEmptyValidator;

impl Validator for NonEmptyValidator {
    fn name(&self) -> &str {
        "non_empty"
    }

    fn validate(&self, _task: &TaskRecord, payload: &str) -> Verdict {
        if payload.trim().is_empty() {
            Verdict::fail("submission is empty")
        } else {
            Verdict::pass("submission received")
        }
    }
}

/// Payload must match a regular expression.
#[derive(Debug, Clone)]
pub struct RegexValidator {
    pattern: Regex,
}

impl RegexValidator {
    pub fn new(pattern: &str) -> Result<Self> {
        let pattern = Regex::new(pattern).map_err(|e| {
            LearnpathError::ConfigError(format!("invalid validator regex '{pattern}': {e}"))
        })?;
        Ok(Self { pattern })
    }
}

impl Validator for RegexValidator {
    fn name(&self) -> &str {
        "regex"
    }

    fn validate(&self, _task: &TaskRecord, payload: &str) -> Verdict {
        if self.pattern.is_match(payload) {
            Verdict::pass("submission matches the expected pattern")
        } else {
            Verdict::fail(format!(
                "submission does not match the expected pattern `{}`",
                self.pattern.as_str()
            ))
        }
    }
}

/// Trimmed payload must equal an expected answer.
#[derive(Debug, Clone)]
pub struct ExactMatchValidator {
    expected: String,
    ignore_case: bool,
}

impl ExactMatchValidator {
    pub fn new(expected: &str, ignore_case: bool) -> Self {
        Self {
            expected: expected.trim().to_string(),
            ignore_case,
        }
    }
}

impl Validator for ExactMatchValidator {
    fn name(&self) -> &str {
        "exact"
    }

    fn validate(&self, _task: &TaskRecord, payload: &str) -> Verdict {
        let payload = payload.trim();
        let matches = if self.ignore_case {
            payload.to_lowercase() == self.expected.to_lowercase()
        } else {
            payload == self.expected
        };
        if matches {
            Verdict::pass("submission matches the expected result")
        } else {
            Verdict::fail("submission does not match the expected result")
        }
    }
}

/// Accepts everything (tasks whose completion is judged elsewhere).
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptValidator;

impl Validator for AcceptValidator {
    fn name(&self) -> &str {
        "accept"
    }

    fn validate(&self, _task: &TaskRecord, _payload: &str) -> Verdict {
        Verdict::pass("accepted")
    }
}
