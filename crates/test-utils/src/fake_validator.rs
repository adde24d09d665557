#![allow(dead_code)]

use std::sync::Mutex;

use learnpath::store::TaskRecord;
use learnpath::validators::{Validator, Verdict};

/// Passes every payload.
#[derive(Debug, Default)]
pub struct AlwaysPass;

impl Validator for AlwaysPass {
    fn name(&self) -> &str {
        "always_pass"
    }

    fn validate(&self, _task: &TaskRecord, _payload: &str) -> Verdict {
        Verdict::pass("looks good")
    }
}

/// Fails every payload.
#[derive(Debug, Default)]
pub struct AlwaysFail;

impl Validator for AlwaysFail {
    fn name(&self) -> &str {
        "always_fail"
    }

    fn validate(&self, _task: &TaskRecord, _payload: &str) -> Verdict {
        Verdict::fail("not quite")
    }
}

/// Passes only the exact `answer`, and records every (task, payload) it saw.
#[derive(Debug)]
pub struct RecordingValidator {
    answer: String,
    seen: Mutex<Vec<(String, String)>>,
}

impl RecordingValidator {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of what has been validated so far.
    pub fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().expect("recording lock").clone()
    }
}

impl Validator for RecordingValidator {
    fn name(&self) -> &str {
        "recording"
    }

    fn validate(&self, task: &TaskRecord, payload: &str) -> Verdict {
        self.seen
            .lock()
            .expect("recording lock")
            .push((task.id.clone(), payload.to_string()));
        if payload == self.answer {
            Verdict::pass("matches the recorded answer")
        } else {
            Verdict::fail("does not match the recorded answer")
        }
    }
}
