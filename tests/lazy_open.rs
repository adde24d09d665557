mod common;

use common::{chain, import, init_tracing, LEARNER};
use learnpath::engine::Engine;
use learnpath::store::{self, now_ms, ProgressRecord};
use learnpath::types::Status;
use learnpath_test_utils::in_memory_engine;

fn row_count(engine: &Engine, task_id: &str, learner_id: &str) -> i64 {
    engine
        .store()
        .read(|tx| store::progress::count_progress_rows(tx, task_id, learner_id))
        .unwrap()
}

#[test]
fn reads_never_create_progress_rows() {
    init_tracing();

    let engine = in_memory_engine();
    import(&engine, chain());

    engine.get_ready("chain", LEARNER, None).unwrap();
    engine.blocked_work("chain", LEARNER).unwrap();
    engine.progress_summary("chain", LEARNER).unwrap();
    let detail = engine.show_task("chain.1.2", LEARNER).unwrap();
    engine.is_blocked("chain.1.3", LEARNER).unwrap();
    engine.blocking_tasks("chain.1.3", LEARNER).unwrap();

    assert_eq!(detail.stored_status, Status::Open);
    assert_eq!(detail.effective_status, Status::Blocked);
    assert!(detail.progress.is_none());

    for id in ["chain", "chain.1", "chain.1.1", "chain.1.2", "chain.1.3"] {
        assert_eq!(row_count(&engine, id, LEARNER), 0, "{id} has a row");
    }
}

#[test]
fn a_missing_row_behaves_like_an_explicit_open_row() {
    let untouched = in_memory_engine();
    import(&untouched, chain());

    let touched = in_memory_engine();
    import(&touched, chain());
    touched.close_task("chain.1.1", LEARNER, "done").unwrap();
    touched
        .reopen_task("chain.1.1", LEARNER, Status::Open, "again")
        .unwrap();
    assert_eq!(row_count(&touched, "chain.1.1", LEARNER), 1);

    let a = untouched.get_ready("chain", LEARNER, None).unwrap();
    let b = touched.get_ready("chain", LEARNER, None).unwrap();
    assert_eq!(common::ids(&a), common::ids(&b));

    let a = untouched.progress_summary("chain", LEARNER).unwrap();
    let b = touched.progress_summary("chain", LEARNER).unwrap();
    assert_eq!(a, b);

    assert_eq!(
        untouched.blocking_tasks("chain.1.2", LEARNER).unwrap(),
        touched.blocking_tasks("chain.1.2", LEARNER).unwrap()
    );
}

#[test]
fn the_first_transition_creates_exactly_one_row() {
    let engine = in_memory_engine();
    import(&engine, chain());

    let record = engine.start_task("chain.1.1", LEARNER).unwrap();
    assert_eq!(record.status, Status::InProgress);
    assert_eq!(row_count(&engine, "chain.1.1", LEARNER), 1);

    engine.close_task("chain.1.1", LEARNER, "done").unwrap();
    assert_eq!(row_count(&engine, "chain.1.1", LEARNER), 1);
}

#[test]
fn a_stored_blocked_row_reads_as_open() {
    init_tracing();

    let engine = in_memory_engine();
    import(&engine, chain());

    // Rows written by older tooling may carry `blocked`; it is never trusted.
    engine
        .store()
        .write(|tx| {
            let mut record = ProgressRecord::fresh("chain.1.1", LEARNER, now_ms());
            record.status = Status::Blocked;
            store::progress::upsert_progress(tx, &record)
        })
        .unwrap();

    let detail = engine.show_task("chain.1.1", LEARNER).unwrap();
    assert_eq!(detail.stored_status, Status::Blocked);
    assert_eq!(detail.effective_status, Status::Open);
    assert!(!engine.is_blocked("chain.1.1", LEARNER).unwrap());

    let ready = engine.get_ready("chain", LEARNER, None).unwrap();
    assert!(common::ids(&ready).contains(&"chain.1.1"));

    let started = engine.start_task("chain.1.1", LEARNER).unwrap();
    assert_eq!(started.status, Status::InProgress);
}
