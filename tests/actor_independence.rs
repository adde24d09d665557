mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use common::{chain, ids, import, init_tracing, proj_x, LEARNER, OTHER_LEARNER};
use learnpath::errors::LearnpathError;
use learnpath::types::Status;
use learnpath_test_utils::fake_validator::AlwaysPass;
use learnpath_test_utils::{engine_with_validator, in_memory_engine};

#[test]
fn closing_a_prerequisite_unblocks_only_that_learner() {
    init_tracing();

    let engine = in_memory_engine();
    import(&engine, chain());

    engine.close_task("chain.1.1", LEARNER, "done").unwrap();

    assert!(!engine.is_blocked("chain.1.2", LEARNER).unwrap());
    assert!(engine.is_blocked("chain.1.2", OTHER_LEARNER).unwrap());
    assert_eq!(
        engine.blocking_tasks("chain.1.2", OTHER_LEARNER).unwrap(),
        BTreeSet::from(["chain.1.1".to_string()])
    );

    let mine = engine.get_ready("chain", LEARNER, None).unwrap();
    let theirs = engine.get_ready("chain", OTHER_LEARNER, None).unwrap();
    assert!(ids(&mine).contains(&"chain.1.2"));
    assert!(!ids(&theirs).contains(&"chain.1.2"));
    assert!(ids(&theirs).contains(&"chain.1.1"));

    let result = engine.start_task("chain.1.2", OTHER_LEARNER);
    assert!(
        matches!(result, Err(LearnpathError::InvalidTransition { .. })),
        "{result:?}"
    );
    engine.start_task("chain.1.2", LEARNER).unwrap();
}

#[test]
fn submissions_and_cascades_are_per_learner() {
    let engine = engine_with_validator(Arc::new(AlwaysPass));
    import(&engine, proj_x());

    engine.submit("proj-x.1.1", LEARNER, "a").unwrap();
    let first_other = engine.submit("proj-x.1.1", OTHER_LEARNER, "a").unwrap();
    assert_eq!(first_other.attempt_number, 1, "attempt numbers are per learner");

    let done = engine.submit("proj-x.1.2", LEARNER, "b").unwrap();
    assert_eq!(done.auto_closed.len(), 2);

    let theirs = engine.show_task("proj-x.1", OTHER_LEARNER).unwrap();
    assert_eq!(theirs.effective_status, Status::Open);
    let theirs = engine.progress_summary("proj-x", OTHER_LEARNER).unwrap();
    assert_eq!(theirs.closed, 1);

    assert_eq!(engine.submissions("proj-x.1.2", OTHER_LEARNER).unwrap().len(), 0);
    assert_eq!(engine.submissions("proj-x.1.2", LEARNER).unwrap().len(), 1);
}
