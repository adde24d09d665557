mod common;

use std::fs;

use common::{chain, import, init_tracing, proj_x, ImportBuilder, TaskSpecBuilder, LEARNER};
use learnpath::errors::LearnpathError;
use learnpath::ingest::{load_import, ImportPlan, RawImport};
use learnpath::store;
use learnpath::types::{DependencyType, TaskType};
use learnpath::validators::ValidatorSpec;
use learnpath_test_utils::in_memory_engine;
use tempfile::tempdir;

fn task_count(engine: &learnpath::engine::Engine) -> i64 {
    engine.store().read(|tx| store::tasks::count_tasks(tx)).unwrap()
}

fn import_error(builder: ImportBuilder) -> String {
    match ImportPlan::try_from(builder.raw()) {
        Err(LearnpathError::ImportError(msg)) => msg,
        other => panic!("expected ImportError, got {other:?}"),
    }
}

#[test]
fn dry_run_reports_without_writing() {
    init_tracing();

    let engine = in_memory_engine();
    let plan = proj_x()
        .blocks("proj-x.1.2", "proj-x.1.1")
        .with_task(
            TaskSpecBuilder::new("proj-x.2", TaskType::Epic)
                .objective("Read a query plan")
                .objective("Spot a missing index"),
        )
        .build();

    let report = engine.import(&plan, true).unwrap();
    assert!(report.dry_run);
    assert_eq!(report.tasks, 5);
    assert_eq!(report.tasks_by_type.get(&TaskType::Epic), Some(&2));
    assert_eq!(report.tasks_by_type.get(&TaskType::Task), Some(&2));
    assert_eq!(report.parent_child_edges, 4);
    assert_eq!(report.explicit_edges, 1);
    assert_eq!(report.objectives, 2);
    assert_eq!(task_count(&engine), 0);

    let committed = engine.import(&plan, false).unwrap();
    assert!(!committed.dry_run);
    assert_eq!(committed.digest, report.digest);
    assert_eq!(task_count(&engine), 5);
}

#[test]
fn importing_the_same_tasks_twice_is_a_duplicate() {
    let engine = in_memory_engine();
    import(&engine, proj_x());

    let result = engine.import(&proj_x().build(), false);
    assert!(matches!(result, Err(LearnpathError::Duplicate(_))), "{result:?}");
    let result = engine.import(&proj_x().build(), true);
    assert!(matches!(result, Err(LearnpathError::Duplicate(_))), "{result:?}");
    assert_eq!(task_count(&engine), 4);
}

#[test]
fn cycles_inside_the_document_are_rejected() {
    let result = ImportPlan::try_from(
        chain()
            .blocks("chain.1.1", "chain.1.3")
            .raw(),
    );
    assert!(matches!(result, Err(LearnpathError::DagCycle(_))), "{result:?}");
}

#[test]
fn cycles_through_stored_edges_are_rejected_atomically() {
    let engine = in_memory_engine();
    import(&engine, chain());

    // chain.1.1 -> chain.1.4 -> chain.1.3 -> chain.1.2 -> chain.1.1
    let plan = ImportBuilder::new()
        .task("chain.1.4")
        .blocks("chain.1.4", "chain.1.3")
        .blocks("chain.1.1", "chain.1.4")
        .build();
    assert_eq!(plan.external_endpoints, vec!["chain.1.1", "chain.1.3"]);

    for dry_run in [true, false] {
        let result = engine.import(&plan, dry_run);
        assert!(matches!(result, Err(LearnpathError::DagCycle(_))), "{result:?}");
    }
    assert_eq!(task_count(&engine), 5);
    assert!(engine.detect_cycles().unwrap().is_empty());
}

#[test]
fn documents_can_extend_stored_trees() {
    let engine = in_memory_engine();
    import(&engine, proj_x());

    let plan = ImportBuilder::new()
        .epic("proj-x.2")
        .task("proj-x.1.3")
        .build();
    assert_eq!(
        plan.external_parents.get("proj-x"),
        Some(&TaskType::Project)
    );
    engine.import(&plan, false).unwrap();

    let epic = engine.get_task("proj-x.2").unwrap();
    assert_eq!(epic.parent_id.as_deref(), Some("proj-x"));
    let summary = engine.progress_summary("proj-x", LEARNER).unwrap();
    assert_eq!(summary.total, 6);
}

#[test]
fn missing_or_mistyped_external_parents_are_rejected() {
    let engine = in_memory_engine();
    import(&engine, proj_x());

    let orphan = ImportBuilder::new().epic("other.1").build();
    let result = engine.import(&orphan, false);
    assert!(matches!(result, Err(LearnpathError::ImportError(_))), "{result:?}");

    // proj-x.1 is an epic; a subtask needs a task parent.
    let mistyped = ImportBuilder::new()
        .with_task(TaskSpecBuilder::new("extra.1", TaskType::Subtask).parent("proj-x.1"))
        .build();
    let result = engine.import(&mistyped, false);
    assert!(matches!(result, Err(LearnpathError::ImportError(_))), "{result:?}");

    let dangling = ImportBuilder::new()
        .epic("proj-x.2")
        .blocks("proj-x.2", "nowhere")
        .build();
    let result = engine.import(&dangling, false);
    assert!(matches!(result, Err(LearnpathError::ImportError(_))), "{result:?}");

    assert_eq!(task_count(&engine), 4);
}

#[test]
fn malformed_documents_are_import_errors() {
    assert!(import_error(ImportBuilder::new()).contains("at least one"));

    let msg = import_error(ImportBuilder::new().project("p").project("p"));
    assert!(msg.contains("more than once"), "{msg}");

    let msg = import_error(ImportBuilder::new().project("bad id!"));
    assert!(msg.contains("bad id!"), "{msg}");

    let msg = import_error(
        ImportBuilder::new().with_task(TaskSpecBuilder::new("p", TaskType::Project).title("  ")),
    );
    assert!(msg.contains("title"), "{msg}");

    let msg = import_error(
        ImportBuilder::new().with_task(TaskSpecBuilder::new("p", TaskType::Project).priority(9)),
    );
    assert!(msg.contains("priority"), "{msg}");

    let msg = import_error(ImportBuilder::new().with_task(
        TaskSpecBuilder::new("p", TaskType::Project).validator(ValidatorSpec::Regex {
            pattern: "(".to_string(),
        }),
    ));
    assert!(msg.contains("'p'"), "{msg}");

    let msg = import_error(
        proj_x().dependency("proj-x.1.1", "proj-x.1", DependencyType::ParentChild),
    );
    assert!(msg.contains("parent_child"), "{msg}");

    let msg = import_error(proj_x().blocks("proj-x.1.1", "proj-x.1.1"));
    assert!(msg.contains("itself"), "{msg}");

    let msg = import_error(
        proj_x()
            .blocks("proj-x.1.2", "proj-x.1.1")
            .blocks("proj-x.1.2", "proj-x.1.1"),
    );
    assert!(msg.contains("more than once"), "{msg}");

    // Hierarchy: a task directly under a project, a project with a parent,
    // a task with no parent at all.
    let msg = import_error(ImportBuilder::new().project("p").task("p.1"));
    assert!(msg.contains("epic"), "{msg}");
    let msg = import_error(
        ImportBuilder::new()
            .project("p")
            .with_task(TaskSpecBuilder::new("q", TaskType::Project).parent("p")),
    );
    assert!(msg.contains("cannot have a parent"), "{msg}");
    let msg = import_error(ImportBuilder::new().task("loose"));
    assert!(msg.contains("needs a parent"), "{msg}");
}

#[test]
fn toml_and_json_files_load_the_same_plan() {
    let dir = tempdir().unwrap();
    let builder = proj_x()
        .blocks("proj-x.1.2", "proj-x.1.1")
        .with_task(TaskSpecBuilder::new("proj-x.2", TaskType::Epic).objective("Joins"));

    let toml_path = dir.path().join("course.toml");
    let json_path = dir.path().join("course.json");
    fs::write(&toml_path, builder.to_toml()).unwrap();
    fs::write(&json_path, builder.to_json()).unwrap();

    let from_toml = load_import(&toml_path).unwrap();
    let from_json = load_import(&json_path).unwrap();
    assert_eq!(from_toml, from_json);
    assert_eq!(from_toml, builder.build());
}

#[test]
fn handwritten_toml_uses_defaults() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("course.toml");
    fs::write(
        &path,
        r#"
[[tasks]]
id = "sql"
type = "project"
title = "SQL basics"

[[tasks]]
id = "sql.1"
type = "epic"
title = "Joins"
objectives = ["Write an inner join", "Explain outer joins"]

[[tasks]]
id = "sql.1.1"
type = "task"
title = "Inner join"
priority = 0
validator = { kind = "exact", expected = "42", ignore_case = true }

[[tasks]]
id = "sql.1.2"
type = "task"
title = "Outer join"

[[dependencies]]
task = "sql.1.2"
depends_on = "sql.1.1"
"#,
    )
    .unwrap();

    let plan = load_import(&path).unwrap();
    assert_eq!(plan.dependencies[0].dep_type, DependencyType::Blocks);
    let outer = plan.tasks.iter().find(|t| t.id == "sql.1.2").unwrap();
    assert_eq!(outer.priority, 2);
    assert_eq!(outer.parent_id.as_deref(), Some("sql.1"));

    let engine = in_memory_engine();
    engine.import(&plan, false).unwrap();

    let epic = engine.show_task("sql.1", LEARNER).unwrap();
    assert_eq!(
        epic.objectives,
        vec!["Write an inner join".to_string(), "Explain outer joins".to_string()]
    );
    assert_eq!(epic.children, vec!["sql.1.1".to_string(), "sql.1.2".to_string()]);

    let inner = engine.get_task("sql.1.1").unwrap();
    assert_eq!(
        inner.validator,
        Some(ValidatorSpec::Exact {
            expected: "42".to_string(),
            ignore_case: true,
        })
    );
}

#[test]
fn unknown_fields_are_rejected_by_the_parser() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("course.toml");
    fs::write(
        &path,
        "[[tasks]]\nid = \"p\"\ntype = \"project\"\ntitle = \"P\"\ncolour = \"red\"\n",
    )
    .unwrap();

    let result = load_import(&path);
    assert!(matches!(result, Err(LearnpathError::TomlError(_))), "{result:?}");
}

#[test]
fn the_digest_follows_the_document() {
    let a = proj_x().build();
    let b = proj_x().build();
    let c = proj_x().task("proj-x.1.3").build();

    assert_eq!(a.digest, b.digest);
    assert_ne!(a.digest, c.digest);
    assert_eq!(a.digest.len(), 64);

    let raw: RawImport = proj_x().raw();
    assert_eq!(ImportPlan::try_from(raw).unwrap().digest, a.digest);
}
