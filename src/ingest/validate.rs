// src/ingest/validate.rs

//! Whole-document validation of import files.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::dag::{ensure_acyclic, DependencyGraph};
use crate::engine::template::{check_parent_type, check_priority, parent_for};
use crate::errors::{LearnpathError, Result};
use crate::ids::validate_task_id;
use crate::ingest::model::{ImportPlan, PlannedDependency, PlannedTask, RawImport};
use crate::types::{DependencyType, TaskType};

impl TryFrom<RawImport> for ImportPlan {
    type Error = LearnpathError;

    fn try_from(raw: RawImport) -> std::result::Result<Self, Self::Error> {
        let digest = document_digest(&raw)?;
        validate_raw_import(&raw)?;

        let mut external_parents = BTreeMap::new();
        let types: HashMap<&str, TaskType> = raw
            .tasks
            .iter()
            .map(|t| (t.id.as_str(), t.task_type))
            .collect();

        let mut tasks = Vec::with_capacity(raw.tasks.len());
        for spec in &raw.tasks {
            let parent_id = parent_for(&spec.id, spec.task_type, spec.parent.as_deref());
            if let Some(parent) = &parent_id {
                match types.get(parent.as_str()) {
                    Some(parent_type) => {
                        check_parent_type(&spec.id, spec.task_type, Some((parent, *parent_type)))
                            .map_err(LearnpathError::ImportError)?;
                    }
                    None => {
                        if let Some(expected) = spec.task_type.parent_type() {
                            external_parents.insert(parent.clone(), expected);
                        } else {
                            check_parent_type(&spec.id, spec.task_type, Some((parent, spec.task_type)))
                                .map_err(LearnpathError::ImportError)?;
                        }
                    }
                }
            } else {
                check_parent_type(&spec.id, spec.task_type, None)
                    .map_err(LearnpathError::ImportError)?;
            }

            tasks.push(PlannedTask {
                id: spec.id.clone(),
                task_type: spec.task_type,
                title: spec.title.clone(),
                description: spec.description.clone(),
                acceptance_criteria: spec.acceptance_criteria.clone(),
                priority: spec.priority,
                objectives: spec.objectives.clone(),
                requires_submission: spec.requires_submission,
                validator: spec.validator.clone(),
                parent_id,
            });
        }

        // Parents before children; the hierarchy is strict, so type order is enough.
        tasks.sort_by_key(|t| t.task_type);

        let mut external_endpoints: Vec<String> = raw
            .dependencies
            .iter()
            .flat_map(|d| [&d.task, &d.depends_on])
            .filter(|id| !types.contains_key(id.as_str()))
            .cloned()
            .collect();
        external_endpoints.sort();
        external_endpoints.dedup();

        let dependencies = raw
            .dependencies
            .iter()
            .map(|d| PlannedDependency {
                task_id: d.task.clone(),
                depends_on_id: d.depends_on.clone(),
                dep_type: d.dep_type,
            })
            .collect();

        let plan = ImportPlan {
            tasks,
            dependencies,
            external_parents,
            external_endpoints,
            digest,
        };
        ensure_acyclic(&plan_graph(&plan))?;
        Ok(plan)
    }
}

fn document_digest(raw: &RawImport) -> Result<String> {
    let canonical = serde_json::to_vec(raw)?;
    Ok(blake3::hash(&canonical).to_hex().to_string())
}

fn validate_raw_import(doc: &RawImport) -> Result<()> {
    ensure_has_tasks(doc)?;
    validate_tasks(doc)?;
    validate_dependencies(doc)?;
    Ok(())
}

fn ensure_has_tasks(doc: &RawImport) -> Result<()> {
    if doc.tasks.is_empty() {
        return Err(LearnpathError::ImportError(
            "import must contain at least one [[tasks]] entry".to_string(),
        ));
    }
    Ok(())
}

fn validate_tasks(doc: &RawImport) -> Result<()> {
    let mut seen: HashSet<&str> = HashSet::new();
    for task in &doc.tasks {
        validate_task_id(&task.id).map_err(|e| LearnpathError::ImportError(e.to_string()))?;
        if !seen.insert(task.id.as_str()) {
            return Err(LearnpathError::ImportError(format!(
                "task '{}' is defined more than once",
                task.id
            )));
        }
        if task.title.trim().is_empty() {
            return Err(LearnpathError::ImportError(format!(
                "task '{}' must have a title",
                task.id
            )));
        }
        check_priority(&task.id, task.priority).map_err(LearnpathError::ImportError)?;
        if let Some(spec) = &task.validator {
            spec.check().map_err(|e| {
                LearnpathError::ImportError(format!("task '{}': {e}", task.id))
            })?;
        }
        if let Some(parent) = &task.parent {
            validate_task_id(parent).map_err(|e| LearnpathError::ImportError(e.to_string()))?;
        }
    }
    Ok(())
}

fn validate_dependencies(doc: &RawImport) -> Result<()> {
    let mut seen: HashSet<(&str, &str, DependencyType)> = HashSet::new();
    for dep in &doc.dependencies {
        validate_task_id(&dep.task).map_err(|e| LearnpathError::ImportError(e.to_string()))?;
        validate_task_id(&dep.depends_on)
            .map_err(|e| LearnpathError::ImportError(e.to_string()))?;

        if dep.dep_type == DependencyType::ParentChild {
            return Err(LearnpathError::ImportError(format!(
                "dependency {} -> {}: parent_child edges are derived from the hierarchy",
                dep.task, dep.depends_on
            )));
        }
        if dep.task == dep.depends_on {
            return Err(LearnpathError::ImportError(format!(
                "task '{}' cannot depend on itself",
                dep.task
            )));
        }
        if !seen.insert((dep.task.as_str(), dep.depends_on.as_str(), dep.dep_type)) {
            return Err(LearnpathError::ImportError(format!(
                "dependency {} -> {} ({}) is listed more than once",
                dep.task, dep.depends_on, dep.dep_type
            )));
        }
    }
    Ok(())
}

/// Blocking graph described by the document alone: derived `parent_child`
/// edges plus explicit `blocks` edges.
pub(crate) fn plan_graph(plan: &ImportPlan) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    extend_graph(&mut graph, plan);
    graph
}

pub(crate) fn extend_graph(graph: &mut DependencyGraph, plan: &ImportPlan) {
    for task in &plan.tasks {
        if let Some(parent) = &task.parent_id {
            graph.add_edge(&task.id, parent, DependencyType::ParentChild);
        }
    }
    for dep in &plan.dependencies {
        graph.add_edge(&dep.task_id, &dep.depends_on_id, dep.dep_type);
    }
}
