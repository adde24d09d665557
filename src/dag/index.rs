// src/dag/index.rs

//! In-memory index of the template hierarchy.

use std::collections::{HashMap, HashSet};

use crate::store::TaskRecord;
use crate::types::TaskId;

/// Template tasks keyed by id, with parent → children links.
#[derive(Debug, Clone, Default)]
pub struct TaskIndex {
    tasks: HashMap<TaskId, TaskRecord>,
    children: HashMap<TaskId, Vec<TaskId>>,
}

impl TaskIndex {
    /// Build the index from rows in insertion order.
    pub fn new(records: impl IntoIterator<Item = TaskRecord>) -> Self {
        let mut index = Self::default();
        for record in records {
            if let Some(parent) = &record.parent_id {
                index
                    .children
                    .entry(parent.clone())
                    .or_default()
                    .push(record.id.clone());
            }
            index.tasks.insert(record.id.clone(), record);
        }
        index
    }

    pub fn get(&self, id: &str) -> Option<&TaskRecord> {
        self.tasks.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.tasks.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.tasks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Direct children, in insertion order.
    pub fn children_of(&self, id: &str) -> &[TaskId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Distance from the root of the task's tree (a project is at depth 0).
    pub fn depth_of(&self, id: &str) -> usize {
        let mut depth = 0;
        let mut seen: HashSet<&str> = HashSet::new();
        let mut current = self.tasks.get(id);
        while let Some(parent) = current.and_then(|t| t.parent_id.as_deref()) {
            if !seen.insert(parent) {
                break;
            }
            depth += 1;
            current = self.tasks.get(parent);
        }
        depth
    }

    /// Top of the task's tree (the task itself if it has no parent).
    pub fn root_of<'a>(&'a self, id: &'a str) -> &'a str {
        let mut root = id;
        let mut seen: HashSet<&str> = HashSet::new();
        while let Some(parent) = self.tasks.get(root).and_then(|t| t.parent_id.as_deref()) {
            if !seen.insert(parent) || !self.tasks.contains_key(parent) {
                break;
            }
            root = parent;
        }
        root
    }

    /// Every task in the subtree rooted at `root`, root first, depth-first in
    /// insertion order.
    pub fn subtree(&self, root: &str) -> Vec<&TaskRecord> {
        let mut out = Vec::new();
        let mut stack: Vec<&str> = vec![root];
        let mut seen: HashSet<&str> = HashSet::new();

        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            if let Some(task) = self.tasks.get(id) {
                out.push(task);
            }
            for child in self.children_of(id).iter().rev() {
                stack.push(child.as_str());
            }
        }

        out
    }
}
