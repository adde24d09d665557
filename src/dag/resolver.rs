// src/dag/resolver.rs

//! Per-learner view of the template graph.
//!
//! A [`Resolver`] is a read-only snapshot: the task index, the blocking edge
//! set and one learner's progress rows, each fetched with a single query.
//! Blockedness is computed once for every task when the snapshot is built,
//! so ready-work, blocked-work and summaries never go back to the store.

use std::collections::{BTreeSet, HashMap, HashSet};

use rusqlite::Connection;
use serde::Serialize;
use tracing::{debug, warn};

use crate::dag::graph::DependencyGraph;
use crate::dag::index::TaskIndex;
use crate::errors::{LearnpathError, Result};
use crate::store::{self, resolve_status, ProgressRecord, TaskRecord};
use crate::types::{DependencyType, LearnerId, Status, TaskId, TaskType};

/// One row of a ready-work or blocked-work listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub title: String,
    pub task_type: TaskType,
    pub priority: u8,
    /// Status as seen by this learner (`blocked` is the derived view).
    pub status: Status,
    pub depth: usize,
    pub parent_id: Option<TaskId>,
}

/// A task the learner would otherwise be able to act on, and what holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockedTask {
    pub task: TaskSummary,
    pub blockers: Vec<TaskId>,
}

/// Status counts for one learner over one project subtree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgressSummary {
    pub project_id: TaskId,
    pub learner_id: LearnerId,
    pub open: usize,
    pub in_progress: usize,
    pub blocked: usize,
    pub closed: usize,
    pub total: usize,
}

#[derive(Debug)]
pub struct Resolver {
    learner_id: LearnerId,
    index: TaskIndex,
    graph: DependencyGraph,
    progress: HashMap<TaskId, ProgressRecord>,
    blocked: HashSet<TaskId>,
    max_depth: usize,
}

impl Resolver {
    /// Build a snapshot for `learner_id` with three batched reads.
    pub fn load(conn: &Connection, learner_id: &str, max_depth: usize) -> Result<Self> {
        let tasks = store::tasks::list_tasks(conn)?;
        let edges = store::deps::blocking_edges(conn)?;
        let progress = store::progress::learner_progress(conn, learner_id)?;

        Ok(Self::new(
            learner_id,
            TaskIndex::new(tasks),
            DependencyGraph::from_edges(&edges),
            progress,
            max_depth,
        ))
    }

    pub fn new(
        learner_id: &str,
        index: TaskIndex,
        graph: DependencyGraph,
        progress: HashMap<TaskId, ProgressRecord>,
        max_depth: usize,
    ) -> Self {
        let mut resolver = Self {
            learner_id: learner_id.to_string(),
            index,
            graph,
            progress,
            blocked: HashSet::new(),
            max_depth,
        };
        resolver.blocked = resolver.compute_blocked();
        debug!(
            learner = %resolver.learner_id,
            tasks = resolver.index.len(),
            edges = resolver.graph.edge_count(),
            blocked = resolver.blocked.len(),
            "resolver snapshot built"
        );
        resolver
    }

    pub fn index(&self) -> &TaskIndex {
        &self.index
    }

    pub fn task(&self, id: &str) -> Result<&TaskRecord> {
        self.index
            .get(id)
            .ok_or_else(|| LearnpathError::TaskNotFound(id.to_string()))
    }

    pub fn progress_of(&self, id: &str) -> Option<&ProgressRecord> {
        self.progress.get(id)
    }

    /// Stored status after lazy-open resolution.
    pub fn stored_status(&self, id: &str) -> Status {
        resolve_status(self.progress.get(id))
    }

    /// Status used for transition decisions: a stored `blocked` reads as
    /// `open`, since blockedness is always recomputed.
    pub fn status_of(&self, id: &str) -> Status {
        match self.stored_status(id) {
            Status::Blocked => Status::Open,
            other => other,
        }
    }

    pub fn is_blocked(&self, id: &str) -> bool {
        self.blocked.contains(id)
    }

    /// What the learner sees: `blocked` overrides open and in-progress.
    pub fn effective_status(&self, id: &str) -> Status {
        let status = self.status_of(id);
        if status != Status::Closed && self.is_blocked(id) {
            Status::Blocked
        } else {
            status
        }
    }

    /// Unclosed `blocks` prerequisites of the task and of every ancestor
    /// through which blocking reaches it.
    pub fn blocking_tasks(&self, id: &str) -> BTreeSet<TaskId> {
        let mut blockers = BTreeSet::new();
        let mut stack: Vec<(&str, usize)> = vec![(id, 0)];
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some((current, depth)) = stack.pop() {
            if !seen.insert(current) || depth > self.max_depth {
                continue;
            }
            for (prereq, dep_type) in self.graph.prerequisites_of(current) {
                match dep_type {
                    DependencyType::Blocks => {
                        if self.status_of(prereq) != Status::Closed {
                            blockers.insert(prereq.clone());
                        }
                    }
                    DependencyType::ParentChild => stack.push((prereq.as_str(), depth + 1)),
                    DependencyType::Related => {}
                }
            }
        }

        blockers
    }

    pub fn summary_of(&self, task: &TaskRecord) -> TaskSummary {
        TaskSummary {
            id: task.id.clone(),
            title: task.title.clone(),
            task_type: task.task_type,
            priority: task.priority,
            status: self.effective_status(&task.id),
            depth: self.index.depth_of(&task.id),
            parent_id: task.parent_id.clone(),
        }
    }

    /// Unblocked open and in-progress tasks of a project subtree, best first.
    ///
    /// Order: in-progress before open, then priority, tree depth, creation
    /// time, insertion order and finally id.
    pub fn ready_work(
        &self,
        project_id: &str,
        task_type: Option<TaskType>,
    ) -> Result<Vec<TaskSummary>> {
        let mut ready: Vec<(&TaskRecord, TaskSummary)> = self
            .project_subtree(project_id)?
            .into_iter()
            .filter(|task| task_type.is_none_or(|t| task.task_type == t))
            .filter(|task| {
                matches!(self.status_of(&task.id), Status::Open | Status::InProgress)
                    && !self.is_blocked(&task.id)
            })
            .map(|task| (task, self.summary_of(task)))
            .collect();

        self.sort_for_work_queue(&mut ready);
        Ok(ready.into_iter().map(|(_, summary)| summary).collect())
    }

    /// Open and in-progress tasks of a project subtree that are blocked,
    /// with their blockers, in ready-work order.
    pub fn blocked_work(&self, project_id: &str) -> Result<Vec<BlockedTask>> {
        let mut blocked: Vec<(&TaskRecord, TaskSummary)> = self
            .project_subtree(project_id)?
            .into_iter()
            .filter(|task| {
                matches!(self.status_of(&task.id), Status::Open | Status::InProgress)
                    && self.is_blocked(&task.id)
            })
            .map(|task| (task, self.summary_of(task)))
            .collect();

        self.sort_for_work_queue(&mut blocked);
        Ok(blocked
            .into_iter()
            .map(|(task, summary)| BlockedTask {
                blockers: self.blocking_tasks(&task.id).into_iter().collect(),
                task: summary,
            })
            .collect())
    }

    pub fn summary(&self, project_id: &str) -> Result<ProgressSummary> {
        let mut summary = ProgressSummary {
            project_id: project_id.to_string(),
            learner_id: self.learner_id.clone(),
            ..ProgressSummary::default()
        };

        for task in self.project_subtree(project_id)? {
            match self.effective_status(&task.id) {
                Status::Open => summary.open += 1,
                Status::InProgress => summary.in_progress += 1,
                Status::Blocked => summary.blocked += 1,
                Status::Closed => summary.closed += 1,
            }
            summary.total += 1;
        }

        Ok(summary)
    }

    fn project_subtree(&self, project_id: &str) -> Result<Vec<&TaskRecord>> {
        if !self.index.contains(project_id) {
            return Err(LearnpathError::TaskNotFound(project_id.to_string()));
        }
        Ok(self.index.subtree(project_id))
    }

    fn compute_blocked(&self) -> HashSet<TaskId> {
        let mut memo: HashMap<&str, bool> = HashMap::new();
        for id in self.index.ids() {
            self.blocked_memo(id, 0, &mut memo);
        }

        memo.into_iter()
            .filter(|(_, blocked)| *blocked)
            .map(|(id, _)| id.to_string())
            .collect()
    }

    /// A task is blocked if a `blocks` prerequisite is not closed for this
    /// learner, or if its parent (via `parent_child`) is blocked.
    fn blocked_memo<'a>(
        &'a self,
        id: &'a str,
        depth: usize,
        memo: &mut HashMap<&'a str, bool>,
    ) -> bool {
        if let Some(blocked) = memo.get(id) {
            return *blocked;
        }
        if depth > self.max_depth {
            warn!(
                task = %id,
                max_depth = self.max_depth,
                "blocking resolution exceeded depth cap; treating task as blocked"
            );
            return true;
        }

        let mut blocked = false;
        for (prereq, dep_type) in self.graph.prerequisites_of(id) {
            blocked = match dep_type {
                DependencyType::Blocks => self.status_of(prereq) != Status::Closed,
                DependencyType::ParentChild => self.blocked_memo(prereq, depth + 1, memo),
                DependencyType::Related => false,
            };
            if blocked {
                break;
            }
        }

        memo.insert(id, blocked);
        blocked
    }

    fn sort_for_work_queue(&self, rows: &mut [(&TaskRecord, TaskSummary)]) {
        rows.sort_by(|(a_task, a), (b_task, b)| {
            let a_rank = self.status_of(&a.id) != Status::InProgress;
            let b_rank = self.status_of(&b.id) != Status::InProgress;
            a_rank
                .cmp(&b_rank)
                .then(a.priority.cmp(&b.priority))
                .then(a.depth.cmp(&b.depth))
                .then(a_task.created_at_ms.cmp(&b_task.created_at_ms))
                .then(a_task.seq.cmp(&b_task.seq))
                .then(a.id.cmp(&b.id))
        });
    }
}
