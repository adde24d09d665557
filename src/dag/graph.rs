// src/dag/graph.rs

use std::collections::{HashMap, HashSet, VecDeque};

use crate::store::Dependency;
use crate::types::{DependencyType, TaskId};

/// Internal node structure: the task's immediate prerequisites.
#[derive(Debug, Clone, Default)]
struct GraphNode {
    prerequisites: Vec<(TaskId, DependencyType)>,
}

/// Outcome of a bounded reachability search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reach {
    Reachable,
    Unreachable,
    /// The search hit the depth cap before it could decide.
    DepthExceeded,
}

/// In-memory view of the blocking subgraph (`blocks` + `parent_child`).
///
/// Built from edges fetched in one batch; `related` edges are ignored. Edge
/// direction follows the table: `task -> depends_on`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<TaskId, GraphNode>,
    edge_count: usize,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the blocking graph from stored edges.
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a Dependency>) -> Self {
        let mut graph = Self::new();
        for dep in edges {
            graph.add_edge(&dep.task_id, &dep.depends_on_id, dep.dep_type);
        }
        graph
    }

    /// Add an edge; non-blocking and repeated edges are ignored.
    pub fn add_edge(&mut self, task_id: &str, depends_on_id: &str, dep_type: DependencyType) {
        if !dep_type.is_blocking() {
            return;
        }

        let node = self.nodes.entry(task_id.to_string()).or_default();
        if node
            .prerequisites
            .iter()
            .any(|(id, t)| id == depends_on_id && *t == dep_type)
        {
            return;
        }
        node.prerequisites.push((depends_on_id.to_string(), dep_type));

        // Prerequisites are nodes too, so audits see every endpoint.
        self.nodes.entry(depends_on_id.to_string()).or_default();
        self.edge_count += 1;
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// All task ids that appear on at least one blocking edge.
    pub fn tasks(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(|s| s.as_str())
    }

    /// All blocking edges as `(task, depends_on, type)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, DependencyType)> {
        self.nodes.iter().flat_map(|(task, node)| {
            node.prerequisites
                .iter()
                .map(move |(dep, t)| (task.as_str(), dep.as_str(), *t))
        })
    }

    /// Immediate prerequisites of a task.
    pub fn prerequisites_of(&self, task_id: &str) -> &[(TaskId, DependencyType)] {
        self.nodes
            .get(task_id)
            .map(|n| n.prerequisites.as_slice())
            .unwrap_or(&[])
    }

    /// Whether `target` can be reached from `from` by following prerequisite
    /// edges, exploring at most `max_depth` edges along any path.
    pub fn reaches(&self, from: &str, target: &str, max_depth: usize) -> Reach {
        if from == target {
            return Reach::Reachable;
        }

        let mut queue: VecDeque<(&str, usize)> = VecDeque::from([(from, 0)]);
        let mut visited: HashSet<&str> = HashSet::from([from]);
        let mut truncated = false;

        // Breadth-first, so every node is first seen at its shortest distance.
        while let Some((current, depth)) = queue.pop_front() {
            let prerequisites = self.prerequisites_of(current);
            if depth >= max_depth {
                truncated |= !prerequisites.is_empty();
                continue;
            }
            for (next, _) in prerequisites {
                if next == target {
                    return Reach::Reachable;
                }
                if visited.insert(next.as_str()) {
                    queue.push_back((next.as_str(), depth + 1));
                }
            }
        }

        if truncated {
            Reach::DepthExceeded
        } else {
            Reach::Unreachable
        }
    }
}
