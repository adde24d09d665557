#![allow(dead_code)]

pub use learnpath_test_utils::builders::{ImportBuilder, TaskSpecBuilder};
pub use learnpath_test_utils::init_tracing;

use learnpath::dag::TaskSummary;
use learnpath::engine::Engine;
use learnpath::ingest::ImportReport;
use learnpath::types::TaskType;

pub const LEARNER: &str = "L1";
pub const OTHER_LEARNER: &str = "L2";

/// A task that can only be closed by a passing submission.
pub fn gated_task(id: &str) -> TaskSpecBuilder {
    TaskSpecBuilder::new(id, TaskType::Task).requires_submission(true)
}

/// Project `proj-x` with one epic and two gated tasks.
pub fn proj_x() -> ImportBuilder {
    ImportBuilder::new()
        .project("proj-x")
        .epic("proj-x.1")
        .with_task(gated_task("proj-x.1.1"))
        .with_task(gated_task("proj-x.1.2"))
}

/// A chain of three tasks under one epic: `.1.3` waits on `.1.2`, which waits
/// on `.1.1`. Tasks do not require submissions by default.
pub fn chain() -> ImportBuilder {
    ImportBuilder::new()
        .project("chain")
        .epic("chain.1")
        .task("chain.1.1")
        .task("chain.1.2")
        .task("chain.1.3")
        .blocks("chain.1.2", "chain.1.1")
        .blocks("chain.1.3", "chain.1.2")
}

pub fn import(engine: &Engine, builder: ImportBuilder) -> ImportReport {
    engine
        .import(&builder.build(), false)
        .expect("import should succeed")
}

pub fn ids(tasks: &[TaskSummary]) -> Vec<&str> {
    tasks.iter().map(|t| t.id.as_str()).collect()
}
