mod common;

use common::{chain, import, init_tracing, LEARNER};
use learnpath::errors::LearnpathError;
use learnpath::types::{DependencyType, Status, TaskType};
use learnpath::validators::ValidatorSpec;
use learnpath::{NewTask, TaskEdit};
use learnpath_test_utils::in_memory_engine;

#[test]
fn created_tasks_join_the_tree() {
    init_tracing();

    let engine = in_memory_engine();
    import(&engine, chain());

    let mut new_task = NewTask::new("chain.1.4", TaskType::Task, "Window functions");
    new_task.priority = 0;
    new_task.objectives = vec!["Rank rows".to_string()];
    let record = engine.create_task(new_task).unwrap();
    assert_eq!(record.parent_id.as_deref(), Some("chain.1"));
    assert!(record.seq > 0);

    let detail = engine.show_task("chain.1.4", LEARNER).unwrap();
    assert_eq!(detail.objectives, vec!["Rank rows".to_string()]);
    assert!(detail
        .dependencies
        .iter()
        .any(|d| d.depends_on_id == "chain.1" && d.dep_type == DependencyType::ParentChild));

    let ready = engine.get_ready("chain", LEARNER, Some(TaskType::Task)).unwrap();
    assert_eq!(ready[0].id, "chain.1.4");

    // The epic now has an open child, so closing the others does not close it.
    for id in ["chain.1.1", "chain.1.2", "chain.1.3"] {
        let closed = engine.close_task(id, LEARNER, "done").unwrap();
        assert!(closed.auto_closed.is_empty(), "{id}");
    }
}

#[test]
fn creation_enforces_ids_and_hierarchy() {
    let engine = in_memory_engine();
    import(&engine, chain());

    let duplicate = engine.create_task(NewTask::new("chain.1.1", TaskType::Task, "again"));
    assert!(matches!(duplicate, Err(LearnpathError::Duplicate(_))), "{duplicate:?}");

    let skip = engine.create_task(NewTask::new("chain.2", TaskType::Task, "too high"));
    assert!(matches!(skip, Err(LearnpathError::InvalidInput(_))), "{skip:?}");

    let orphan = engine.create_task(NewTask::new("other.1", TaskType::Epic, "no project"));
    assert!(matches!(orphan, Err(LearnpathError::TaskNotFound(_))), "{orphan:?}");

    let bad_id = engine.create_task(NewTask::new("chain..1", TaskType::Epic, "bad"));
    assert!(matches!(bad_id, Err(LearnpathError::InvalidInput(_))), "{bad_id:?}");

    let mut bad_priority = NewTask::new("chain.1.9", TaskType::Task, "x");
    bad_priority.priority = 5;
    let result = engine.create_task(bad_priority);
    assert!(matches!(result, Err(LearnpathError::InvalidInput(_))), "{result:?}");

    let mut explicit = NewTask::new("lesson-a", TaskType::Subtask, "explicit parent");
    explicit.parent_id = Some("chain.1.2".to_string());
    let record = engine.create_task(explicit).unwrap();
    assert_eq!(record.parent_id.as_deref(), Some("chain.1.2"));
    // Inherits the blocking of its parent.
    assert!(engine.is_blocked("lesson-a", LEARNER).unwrap());
}

#[test]
fn edits_change_only_what_they_name() {
    let engine = in_memory_engine();
    import(&engine, chain());

    let before = engine.get_task("chain.1.2").unwrap();
    let edited = engine
        .edit_task(
            "chain.1.2",
            TaskEdit {
                title: Some("Outer joins".to_string()),
                priority: Some(0),
                requires_submission: Some(Some(true)),
                validator: Some(Some(ValidatorSpec::Accept)),
                ..TaskEdit::default()
            },
        )
        .unwrap();

    assert_eq!(edited.title, "Outer joins");
    assert_eq!(edited.priority, 0);
    assert_eq!(edited.requires_submission, Some(true));
    assert_eq!(edited.description, before.description);
    assert_eq!(edited.parent_id, before.parent_id);
    assert_eq!(engine.get_task("chain.1.2").unwrap(), edited);

    let cleared = engine
        .edit_task(
            "chain.1.2",
            TaskEdit {
                validator: Some(None),
                ..TaskEdit::default()
            },
        )
        .unwrap();
    assert_eq!(cleared.validator, None);

    for edit in [
        TaskEdit {
            title: Some(" ".to_string()),
            ..TaskEdit::default()
        },
        TaskEdit {
            priority: Some(7),
            ..TaskEdit::default()
        },
    ] {
        let result = engine.edit_task("chain.1.2", edit);
        assert!(matches!(result, Err(LearnpathError::InvalidInput(_))), "{result:?}");
    }

    let missing = engine.edit_task("nope", TaskEdit::default());
    assert!(matches!(missing, Err(LearnpathError::TaskNotFound(_))), "{missing:?}");
}

#[test]
fn requires_submission_edits_gate_closing() {
    let engine = in_memory_engine();
    import(&engine, chain());

    engine
        .edit_task(
            "chain.1.1",
            TaskEdit {
                requires_submission: Some(Some(true)),
                ..TaskEdit::default()
            },
        )
        .unwrap();

    let result = engine.close_task("chain.1.1", LEARNER, "done");
    assert!(
        matches!(result, Err(LearnpathError::InvalidTransition { .. })),
        "{result:?}"
    );

    let submitted = engine.submit("chain.1.1", LEARNER, "my answer").unwrap();
    assert_eq!(submitted.status, Status::Closed);
}

#[test]
fn removing_edges_unblocks_dependents() {
    let engine = in_memory_engine();
    import(&engine, chain());

    assert!(engine.is_blocked("chain.1.2", LEARNER).unwrap());
    let removed = engine.remove_dependency("chain.1.2", "chain.1.1").unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].dep_type, DependencyType::Blocks);
    assert!(!engine.is_blocked("chain.1.2", LEARNER).unwrap());

    let again = engine.remove_dependency("chain.1.2", "chain.1.1");
    assert!(
        matches!(again, Err(LearnpathError::DependencyNotFound { .. })),
        "{again:?}"
    );

    let structural = engine.remove_dependency("chain.1.1", "chain.1");
    assert!(
        matches!(structural, Err(LearnpathError::InvalidInput(_))),
        "{structural:?}"
    );
}

#[test]
fn related_edges_are_informational() {
    let engine = in_memory_engine();
    import(&engine, chain());

    engine
        .add_dependency("chain.1.1", "chain.1.3", DependencyType::Related)
        .unwrap();
    assert!(!engine.is_blocked("chain.1.1", LEARNER).unwrap());

    let detail = engine.show_task("chain.1.3", LEARNER).unwrap();
    assert!(detail
        .dependents
        .iter()
        .any(|d| d.task_id == "chain.1.1" && d.dep_type == DependencyType::Related));

    // A related edge and a blocking edge may share endpoints.
    engine
        .add_dependency("chain.1.3", "chain.1.1", DependencyType::Blocks)
        .unwrap();
    let removed = engine.remove_dependency("chain.1.1", "chain.1.3").unwrap();
    assert_eq!(removed.len(), 1);
    assert_eq!(removed[0].dep_type, DependencyType::Related);
}
