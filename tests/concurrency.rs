mod common;

use std::path::Path;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use common::{import, init_tracing, proj_x, ImportBuilder, LEARNER};
use learnpath::config::EngineSettings;
use learnpath::engine::Engine;
use learnpath::errors::LearnpathError;
use learnpath::store::Store;
use learnpath::types::DependencyType;
use learnpath::validators::ValidatorRegistry;
use learnpath_test_utils::fake_validator::AlwaysFail;
use tempfile::tempdir;

/// A fresh engine with its own connection to `db`.
fn open_engine(db: &Path) -> Engine {
    let store = Store::open(db, Duration::from_secs(10)).unwrap();
    let mut registry = ValidatorRegistry::new();
    registry.set_fallback(Arc::new(AlwaysFail));
    Engine::new(store, EngineSettings::default(), registry)
}

#[test]
fn concurrent_submissions_get_distinct_attempt_numbers() {
    init_tracing();

    const WRITERS: usize = 8;

    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");
    import(&open_engine(&db), proj_x());

    let engines: Vec<Engine> = (0..WRITERS).map(|_| open_engine(&db)).collect();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = engines
        .into_iter()
        .enumerate()
        .map(|(i, engine)| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine
                    .submit("proj-x.1.1", LEARNER, &format!("attempt from writer {i}"))
                    .map(|r| r.attempt_number)
            })
        })
        .collect();

    let mut attempts: Vec<i64> = handles
        .into_iter()
        .map(|h| h.join().expect("writer thread panicked").unwrap())
        .collect();
    attempts.sort_unstable();

    let expected: Vec<i64> = (1..=WRITERS as i64).collect();
    assert_eq!(attempts, expected);

    let history = open_engine(&db).submissions("proj-x.1.1", LEARNER).unwrap();
    assert_eq!(history.len(), WRITERS);
}

#[test]
fn opposite_edges_race_and_exactly_one_wins() {
    init_tracing();

    let dir = tempdir().unwrap();
    let db = dir.path().join("template.db");
    import(
        &open_engine(&db),
        ImportBuilder::new()
            .project("race")
            .epic("race.1")
            .task("race.1.1")
            .task("race.1.2"),
    );

    for round in 0..5 {
        let (a, b) = (open_engine(&db), open_engine(&db));
        let barrier = Arc::new(Barrier::new(2));

        let spawn = |engine: Engine, from: &'static str, to: &'static str| {
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                engine.add_dependency(from, to, DependencyType::Blocks)
            })
        };
        let first = spawn(a, "race.1.1", "race.1.2");
        let second = spawn(b, "race.1.2", "race.1.1");

        let results = [
            first.join().expect("thread panicked"),
            second.join().expect("thread panicked"),
        ];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(wins, 1, "round {round}: {results:?}");
        assert!(
            results
                .iter()
                .any(|r| matches!(r, Err(LearnpathError::Cycle { .. }))),
            "round {round}: {results:?}"
        );

        let engine = open_engine(&db);
        assert!(engine.detect_cycles().unwrap().is_empty());

        // Reset for the next round.
        let winner = results
            .into_iter()
            .find_map(|r| r.ok())
            .expect("one edge was inserted");
        engine
            .remove_dependency(&winner.task_id, &winner.depends_on_id)
            .unwrap();
    }
}

#[test]
fn readers_on_one_engine_run_side_by_side_and_see_commits() {
    init_tracing();

    const READERS: usize = 6;

    let dir = tempdir().unwrap();
    let db = dir.path().join("progress.db");
    let engine = open_engine(&db);
    import(&engine, proj_x());

    let barrier = Arc::new(Barrier::new(READERS));
    let handles: Vec<_> = (0..READERS)
        .map(|i| {
            let engine = engine.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let learner = format!("reader-{i}");
                barrier.wait();
                (0..20)
                    .map(|_| engine.get_ready("proj-x", &learner, None).map(|r| r.len()))
                    .collect::<Result<Vec<_>, _>>()
            })
        })
        .collect();
    for handle in handles {
        let counts = handle.join().expect("reader thread panicked").unwrap();
        assert!(counts.iter().all(|&n| n == 4), "{counts:?}");
    }

    // A pooled reader sees what the writer just committed.
    engine.start_task("proj-x.1.1", LEARNER).unwrap();
    let ready = engine.get_ready("proj-x", LEARNER, None).unwrap();
    assert_eq!(ready[0].id, "proj-x.1.1");
}
