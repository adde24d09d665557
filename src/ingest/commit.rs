// src/ingest/commit.rs

//! Writing a validated import plan into the template layer.

use rusqlite::Connection;
use tracing::{debug, info};

use crate::dag::{ensure_acyclic, DependencyGraph};
use crate::errors::{LearnpathError, Result};
use crate::ingest::model::{ImportPlan, ImportReport};
use crate::ingest::validate::extend_graph;
use crate::store::{self, now_ms, Dependency, TaskRecord};
use crate::types::DependencyType;

/// Re-check a plan against what the store already holds: id collisions,
/// external parents and endpoints, and cycles through existing edges.
pub fn check_against_store(conn: &Connection, plan: &ImportPlan) -> Result<()> {
    for task in &plan.tasks {
        if store::tasks::task_exists(conn, &task.id)? {
            return Err(LearnpathError::Duplicate(format!(
                "task '{}' already exists",
                task.id
            )));
        }
    }

    for (parent_id, expected) in &plan.external_parents {
        match store::tasks::get_task(conn, parent_id)? {
            None => {
                return Err(LearnpathError::ImportError(format!(
                    "parent '{parent_id}' is neither in the document nor in the store"
                )));
            }
            Some(parent) if parent.task_type != *expected => {
                return Err(LearnpathError::ImportError(format!(
                    "parent '{parent_id}' is a {}, expected a {expected}",
                    parent.task_type
                )));
            }
            Some(_) => {}
        }
    }

    for id in &plan.external_endpoints {
        if !store::tasks::task_exists(conn, id)? {
            return Err(LearnpathError::ImportError(format!(
                "dependency endpoint '{id}' is neither in the document nor in the store"
            )));
        }
    }

    let mut graph = DependencyGraph::from_edges(&store::deps::blocking_edges(conn)?);
    extend_graph(&mut graph, plan);
    ensure_acyclic(&graph)?;

    debug!(tasks = plan.tasks.len(), digest = %plan.digest, "import plan checked against store");
    Ok(())
}

/// Write every task, objective and edge of the plan. The caller provides the
/// transaction, so a failure part-way leaves nothing behind.
pub fn commit_tx(conn: &Connection, plan: &ImportPlan) -> Result<ImportReport> {
    check_against_store(conn, plan)?;

    let now = now_ms();
    for task in &plan.tasks {
        let record = TaskRecord {
            id: task.id.clone(),
            parent_id: task.parent_id.clone(),
            task_type: task.task_type,
            title: task.title.clone(),
            description: task.description.clone(),
            acceptance_criteria: task.acceptance_criteria.clone(),
            priority: task.priority,
            requires_submission: task.requires_submission,
            validator: task.validator.clone(),
            created_at_ms: now,
            updated_at_ms: now,
            seq: 0,
        };
        store::tasks::insert_task(conn, &record)?;
        store::tasks::insert_objectives(conn, &task.id, &task.objectives)?;

        if let Some(parent_id) = &task.parent_id {
            store::deps::insert_dependency(
                conn,
                &Dependency {
                    task_id: task.id.clone(),
                    depends_on_id: parent_id.clone(),
                    dep_type: DependencyType::ParentChild,
                    created_at_ms: now,
                },
            )?;
        }
    }

    for dep in &plan.dependencies {
        store::deps::insert_dependency(
            conn,
            &Dependency {
                task_id: dep.task_id.clone(),
                depends_on_id: dep.depends_on_id.clone(),
                dep_type: dep.dep_type,
                created_at_ms: now,
            },
        )?;
    }

    let report = plan.report(false);
    info!(
        tasks = report.tasks,
        parent_child_edges = report.parent_child_edges,
        explicit_edges = report.explicit_edges,
        digest = %report.digest,
        "import committed"
    );
    Ok(report)
}
