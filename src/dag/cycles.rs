// src/dag/cycles.rs

//! Cycle prevention and cycle audits over the blocking subgraph.

use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graphmap::DiGraphMap;
use tracing::warn;

use crate::dag::graph::{DependencyGraph, Reach};
use crate::errors::{LearnpathError, Result};
use crate::types::{DependencyType, TaskId};

/// Would inserting `task_id -> depends_on_id` close a cycle?
///
/// The new edge closes a cycle iff `task_id` is already reachable from
/// `depends_on_id`. A search that runs past `max_depth` cannot prove the
/// absence of a cycle, so it is reported as one. Non-blocking edge types
/// never participate and always return `false`.
pub fn would_create_cycle(
    graph: &DependencyGraph,
    task_id: &str,
    depends_on_id: &str,
    dep_type: DependencyType,
    max_depth: usize,
) -> bool {
    if !dep_type.is_blocking() {
        return false;
    }

    match graph.reaches(depends_on_id, task_id, max_depth) {
        Reach::Reachable => true,
        Reach::Unreachable => false,
        Reach::DepthExceeded => {
            warn!(
                task = %task_id,
                depends_on = %depends_on_id,
                max_depth,
                "cycle check exceeded depth cap; rejecting edge"
            );
            true
        }
    }
}

fn to_petgraph(graph: &DependencyGraph) -> DiGraphMap<&str, ()> {
    let mut g: DiGraphMap<&str, ()> = DiGraphMap::new();
    for task in graph.tasks() {
        g.add_node(task);
    }
    for (task, depends_on, _) in graph.edges() {
        g.add_edge(task, depends_on, ());
    }
    g
}

/// Every non-trivial strongly connected component of the blocking subgraph.
///
/// A component is non-trivial if it has more than one member or a self
/// loop. Members are sorted, and so is the returned list, so audits are
/// stable across runs.
pub fn detect_cycles(graph: &DependencyGraph) -> Vec<Vec<TaskId>> {
    let g = to_petgraph(graph);

    let mut cycles: Vec<Vec<TaskId>> = tarjan_scc(&g)
        .into_iter()
        .filter(|scc| scc.len() > 1 || scc.iter().any(|n| g.contains_edge(n, n)))
        .map(|scc| {
            let mut members: Vec<TaskId> = scc.into_iter().map(|s| s.to_string()).collect();
            members.sort();
            members
        })
        .collect();

    cycles.sort();
    cycles
}

/// Fail with [`LearnpathError::DagCycle`] if the graph is not acyclic.
///
/// Used to validate a whole import document before anything is written.
pub fn ensure_acyclic(graph: &DependencyGraph) -> Result<()> {
    let g = to_petgraph(graph);

    // A topological sort will fail if there is a cycle.
    match toposort(&g, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => {
            let node = cycle.node_id();
            Err(LearnpathError::DagCycle(format!(
                "cycle detected in task graph involving task '{}'",
                node
            )))
        }
    }
}
