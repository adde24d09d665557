mod common;

use common::{chain, ids, import, init_tracing, proj_x, ImportBuilder, TaskSpecBuilder, LEARNER};
use learnpath::errors::LearnpathError;
use learnpath::types::{Status, TaskType};
use learnpath_test_utils::in_memory_engine;

fn prioritised() -> ImportBuilder {
    ImportBuilder::new()
        .project("r")
        .epic("r.1")
        .with_task(TaskSpecBuilder::new("r.1.1", TaskType::Task).priority(2))
        .with_task(TaskSpecBuilder::new("r.1.2", TaskType::Task).priority(0))
        .with_task(TaskSpecBuilder::new("r.1.3", TaskType::Task).priority(1))
        .with_task(TaskSpecBuilder::new("r.1.4", TaskType::Task).priority(4))
}

#[test]
fn in_progress_first_then_priority() {
    init_tracing();

    let engine = in_memory_engine();
    import(&engine, prioritised());
    engine.start_task("r.1.4", LEARNER).unwrap();

    let ready = engine
        .get_ready("r", LEARNER, Some(TaskType::Task))
        .unwrap();
    assert_eq!(ids(&ready), vec!["r.1.4", "r.1.2", "r.1.3", "r.1.1"]);
    assert_eq!(ready[0].status, Status::InProgress);
    assert!(ready[1..].iter().all(|t| t.status == Status::Open));
}

#[test]
fn equal_priorities_fall_back_to_depth_then_insertion_order() {
    let engine = in_memory_engine();
    import(
        &engine,
        ImportBuilder::new()
            .project("r")
            .epic("r.1")
            .task("r.1.1")
            .task("r.1.2"),
    );

    let ready = engine.get_ready("r", LEARNER, None).unwrap();
    assert_eq!(ids(&ready), vec!["r", "r.1", "r.1.1", "r.1.2"]);
    let depths: Vec<usize> = ready.iter().map(|t| t.depth).collect();
    assert_eq!(depths, vec![0, 1, 2, 2]);
}

#[test]
fn priority_outranks_depth() {
    let engine = in_memory_engine();
    import(&engine, prioritised());

    let ready = engine.get_ready("r", LEARNER, None).unwrap();
    assert_eq!(ids(&ready), vec!["r.1.2", "r.1.3", "r", "r.1", "r.1.1", "r.1.4"]);
}

#[test]
fn blocked_and_closed_work_is_not_ready() {
    let engine = in_memory_engine();
    import(&engine, chain());
    engine.close_task("chain.1.1", LEARNER, "done").unwrap();

    let ready = engine
        .get_ready("chain", LEARNER, Some(TaskType::Task))
        .unwrap();
    assert_eq!(ids(&ready), vec!["chain.1.2"]);

    let blocked = engine.blocked_work("chain", LEARNER).unwrap();
    assert_eq!(blocked.len(), 1);
    assert_eq!(blocked[0].task.id, "chain.1.3");
    assert_eq!(blocked[0].task.status, Status::Blocked);
    assert_eq!(blocked[0].blockers, vec!["chain.1.2".to_string()]);
}

#[test]
fn type_filter_narrows_the_listing() {
    let engine = in_memory_engine();
    import(&engine, proj_x());

    let tasks = engine
        .get_ready("proj-x", LEARNER, Some(TaskType::Task))
        .unwrap();
    assert_eq!(ids(&tasks), vec!["proj-x.1.1", "proj-x.1.2"]);

    let epics = engine
        .get_ready("proj-x", LEARNER, Some(TaskType::Epic))
        .unwrap();
    assert_eq!(ids(&epics), vec!["proj-x.1"]);
}

#[test]
fn projects_are_scoped() {
    let engine = in_memory_engine();
    import(&engine, proj_x());
    import(&engine, chain());

    let ready = engine.get_ready("proj-x", LEARNER, None).unwrap();
    assert!(ready.iter().all(|t| t.id.starts_with("proj-x")));

    let summary = engine.progress_summary("chain", LEARNER).unwrap();
    assert_eq!(summary.total, 5);
    assert_eq!(summary.blocked, 2);
    assert_eq!(summary.open, 3);
}

#[test]
fn unknown_projects_are_reported() {
    let engine = in_memory_engine();
    import(&engine, chain());

    let result = engine.get_ready("missing", LEARNER, None);
    assert!(matches!(result, Err(LearnpathError::TaskNotFound(_))), "{result:?}");
    let result = engine.progress_summary("missing", LEARNER);
    assert!(matches!(result, Err(LearnpathError::TaskNotFound(_))), "{result:?}");
}
