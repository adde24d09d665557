// src/engine/mod.rs

//! The engine facade.
//!
//! [`Engine`] ties together:
//! - the store (one transaction per operation)
//! - the resolver snapshots used for every per-learner decision
//! - the state machine, cascade and submission pipeline
//! - the validator registry
//!
//! Every method is one bounded, synchronous unit of work. Mutations run in a
//! `BEGIN IMMEDIATE` transaction so read-then-write sequences cannot
//! interleave with other writers; reads run in a deferred transaction.

pub mod cascade;
pub mod pipeline;
pub mod state_machine;
pub mod template;

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::config::{EngineConfig, EngineSettings};
use crate::dag::{self, BlockedTask, ProgressSummary, Resolver, TaskSummary};
use crate::errors::Result;
use crate::ids::validate_learner_id;
use crate::ingest::{self, ImportPlan, ImportReport};
use crate::store::{self, Dependency, ProgressRecord, Store, SubmissionRecord, TaskRecord};
use crate::types::{DependencyType, Status, TaskId, TaskType};
use crate::validators::ValidatorRegistry;

pub use cascade::AutoClosed;
pub use template::{NewTask, TaskEdit};

/// Everything a learner needs to see about one task.
#[derive(Debug, Clone, Serialize)]
pub struct TaskDetail {
    pub task: TaskRecord,
    pub objectives: Vec<String>,
    /// Status as stored (`open` when the learner has no row).
    pub stored_status: Status,
    /// Status as the learner sees it (`blocked` derived).
    pub effective_status: Status,
    pub blockers: Vec<TaskId>,
    pub dependencies: Vec<Dependency>,
    pub dependents: Vec<Dependency>,
    pub children: Vec<TaskId>,
    pub requires_submission: bool,
    pub attempts: i64,
    pub latest_submission: Option<SubmissionRecord>,
    pub progress: Option<ProgressRecord>,
}

/// Result of an explicit close.
#[derive(Debug, Clone, Serialize)]
pub struct CloseResult {
    pub record: ProgressRecord,
    pub auto_closed: Vec<AutoClosed>,
}

/// Result of a submission.
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResult {
    pub task_id: TaskId,
    pub status: Status,
    pub attempt_number: i64,
    pub validation_passed: bool,
    pub message: String,
    pub auto_closed: Vec<AutoClosed>,
    pub ready_tasks: Vec<TaskSummary>,
}

/// Stateless computation layer over the store. Cheap to clone; clones share
/// the connection and the validator registry.
#[derive(Debug, Clone)]
pub struct Engine {
    store: Store,
    settings: EngineSettings,
    validators: Arc<ValidatorRegistry>,
}

impl Engine {
    pub fn new(store: Store, settings: EngineSettings, validators: ValidatorRegistry) -> Self {
        Self {
            store,
            settings,
            validators: Arc::new(validators),
        }
    }

    /// Open the configured database and build validators from config.
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        let store = Store::open(&config.store.path, config.store.busy_timeout)?;
        Self::with_store(store, config)
    }

    /// Use an already opened store with the rest of the configuration.
    pub fn with_store(store: Store, config: &EngineConfig) -> Result<Self> {
        let validators = ValidatorRegistry::from_specs(config.validators.iter())?;
        Ok(Self::new(store, config.engine.clone(), validators))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    fn snapshot(&self, conn: &rusqlite::Connection, learner_id: &str) -> Result<Resolver> {
        validate_learner_id(learner_id)?;
        Resolver::load(conn, learner_id, self.settings.max_traversal_depth)
    }

    // ---------------------------------------------------------------------
    // Learner operations
    // ---------------------------------------------------------------------

    pub fn get_ready(
        &self,
        project_id: &str,
        learner_id: &str,
        task_type: Option<TaskType>,
    ) -> Result<Vec<TaskSummary>> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            resolver.ready_work(project_id, task_type)
        })
    }

    pub fn show_task(&self, task_id: &str, learner_id: &str) -> Result<TaskDetail> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            let task = resolver.task(task_id)?.clone();

            let requires_submission = self
                .settings
                .submission
                .resolve(task.task_type, task.requires_submission);

            Ok(TaskDetail {
                objectives: store::tasks::objectives_of(tx, task_id)?,
                stored_status: resolver.stored_status(task_id),
                effective_status: resolver.effective_status(task_id),
                blockers: resolver.blocking_tasks(task_id).into_iter().collect(),
                dependencies: store::deps::dependencies_of(tx, task_id)?,
                dependents: store::deps::dependents_of(tx, task_id)?,
                children: resolver.index().children_of(task_id).to_vec(),
                requires_submission,
                attempts: store::submissions::attempt_count(tx, task_id, learner_id)?,
                latest_submission: store::submissions::latest_submission(tx, task_id, learner_id)?,
                progress: resolver.progress_of(task_id).cloned(),
                task,
            })
        })
    }

    pub fn start_task(&self, task_id: &str, learner_id: &str) -> Result<ProgressRecord> {
        validate_learner_id(learner_id)?;
        self.store
            .write(|tx| state_machine::start_tx(tx, &self.settings, task_id, learner_id))
    }

    /// Close a task explicitly, then run the cascade.
    pub fn close_task(&self, task_id: &str, learner_id: &str, reason: &str) -> Result<CloseResult> {
        validate_learner_id(learner_id)?;
        self.store.write(|tx| {
            let task = store::tasks::require_task(tx, task_id)?;
            let record = state_machine::close_tx(tx, &self.settings, &task, learner_id, reason)?;
            let auto_closed = cascade::cascade_tx(tx, &self.settings, &task, learner_id)?;
            Ok(CloseResult {
                record,
                auto_closed,
            })
        })
    }

    pub fn reopen_task(
        &self,
        task_id: &str,
        learner_id: &str,
        target: Status,
        reason: &str,
    ) -> Result<ProgressRecord> {
        validate_learner_id(learner_id)?;
        self.store.write(|tx| {
            state_machine::reopen_tx(tx, &self.settings, task_id, learner_id, target, reason)
        })
    }

    /// Record and validate an attempt; close and cascade on a pass. Ready work
    /// is recomputed after the commit.
    pub fn submit(&self, task_id: &str, learner_id: &str, payload: &str) -> Result<SubmitResult> {
        validate_learner_id(learner_id)?;
        let outcome = self.store.write(|tx| {
            pipeline::submit_tx(
                tx,
                &self.settings,
                &self.validators,
                task_id,
                learner_id,
                payload,
            )
        })?;

        let ready_tasks = self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            let project_id = resolver.index().root_of(task_id).to_string();
            resolver.ready_work(&project_id, None)
        })?;

        Ok(SubmitResult {
            task_id: outcome.task_id,
            status: outcome.status,
            attempt_number: outcome.attempt_number,
            validation_passed: outcome.validation_passed,
            message: outcome.message,
            auto_closed: outcome.auto_closed,
            ready_tasks,
        })
    }

    pub fn submissions(&self, task_id: &str, learner_id: &str) -> Result<Vec<SubmissionRecord>> {
        validate_learner_id(learner_id)?;
        self.store.read(|tx| {
            store::tasks::require_task(tx, task_id)?;
            store::submissions::submissions_for(tx, task_id, learner_id)
        })
    }

    pub fn blocked_work(&self, project_id: &str, learner_id: &str) -> Result<Vec<BlockedTask>> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            resolver.blocked_work(project_id)
        })
    }

    pub fn progress_summary(&self, project_id: &str, learner_id: &str) -> Result<ProgressSummary> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            resolver.summary(project_id)
        })
    }

    // ---------------------------------------------------------------------
    // Resolver diagnostics
    // ---------------------------------------------------------------------

    pub fn is_blocked(&self, task_id: &str, learner_id: &str) -> Result<bool> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            resolver.task(task_id)?;
            Ok(resolver.is_blocked(task_id))
        })
    }

    pub fn blocking_tasks(&self, task_id: &str, learner_id: &str) -> Result<BTreeSet<TaskId>> {
        self.store.read(|tx| {
            let resolver = self.snapshot(tx, learner_id)?;
            resolver.task(task_id)?;
            Ok(resolver.blocking_tasks(task_id))
        })
    }

    /// Would adding `task_id -> depends_on_id` close a blocking cycle?
    pub fn would_create_cycle(
        &self,
        task_id: &str,
        depends_on_id: &str,
        dep_type: DependencyType,
    ) -> Result<bool> {
        if dep_type.is_blocking() && task_id == depends_on_id {
            return Ok(true);
        }
        self.store.read(|tx| {
            let graph = dag::DependencyGraph::from_edges(&store::deps::blocking_edges(tx)?);
            Ok(dag::would_create_cycle(
                &graph,
                task_id,
                depends_on_id,
                dep_type,
                self.settings.max_traversal_depth,
            ))
        })
    }

    /// Every blocking cycle in the stored graph (empty when healthy).
    pub fn detect_cycles(&self) -> Result<Vec<Vec<TaskId>>> {
        let cycles = self.store.read(|tx| {
            let graph = dag::DependencyGraph::from_edges(&store::deps::blocking_edges(tx)?);
            Ok(dag::detect_cycles(&graph))
        })?;
        debug!(cycles = cycles.len(), "cycle audit finished");
        Ok(cycles)
    }

    // ---------------------------------------------------------------------
    // Template maintenance
    // ---------------------------------------------------------------------

    pub fn add_dependency(
        &self,
        task_id: &str,
        depends_on_id: &str,
        dep_type: DependencyType,
    ) -> Result<Dependency> {
        self.store.write(|tx| {
            template::add_dependency_tx(tx, &self.settings, task_id, depends_on_id, dep_type)
        })
    }

    pub fn remove_dependency(&self, task_id: &str, depends_on_id: &str) -> Result<Vec<Dependency>> {
        self.store
            .write(|tx| template::remove_dependency_tx(tx, task_id, depends_on_id))
    }

    pub fn create_task(&self, task: NewTask) -> Result<TaskRecord> {
        self.store
            .write(|tx| template::create_task_tx(tx, &self.settings, task))
    }

    pub fn edit_task(&self, task_id: &str, edit: TaskEdit) -> Result<TaskRecord> {
        self.store.write(|tx| template::edit_task_tx(tx, task_id, edit))
    }

    pub fn get_task(&self, task_id: &str) -> Result<TaskRecord> {
        self.store.read(|tx| store::tasks::require_task(tx, task_id))
    }

    /// Apply a validated import document, or report what it would write.
    pub fn import(&self, plan: &ImportPlan, dry_run: bool) -> Result<ImportReport> {
        if dry_run {
            return self.store.read(|tx| {
                ingest::check_against_store(tx, plan)?;
                Ok(plan.report(true))
            });
        }
        self.store.write(|tx| ingest::commit_tx(tx, plan))
    }
}
