// src/dag/mod.rs

//! Dependency resolution over the template graph.
//!
//! - [`graph`] holds the blocking subgraph (`blocks` + `parent_child`).
//! - [`cycles`] rejects cycle-closing edges and audits the whole graph.
//! - [`index`] indexes the task hierarchy (children, depth, subtrees).
//! - [`resolver`] computes one learner's blocked set, ready work and
//!   summaries from a batched snapshot.

pub mod cycles;
pub mod graph;
pub mod index;
pub mod resolver;

pub use cycles::{detect_cycles, ensure_acyclic, would_create_cycle};
pub use graph::{DependencyGraph, Reach};
pub use index::TaskIndex;
pub use resolver::{BlockedTask, ProgressSummary, Resolver, TaskSummary};
