#![allow(dead_code)]

use learnpath::ingest::{ImportPlan, RawDependencySpec, RawImport, RawTaskSpec};
use learnpath::types::{DependencyType, TaskType, DEFAULT_PRIORITY};
use learnpath::validators::ValidatorSpec;

/// Builder for import documents to simplify test setup.
pub struct ImportBuilder {
    doc: RawImport,
}

impl ImportBuilder {
    pub fn new() -> Self {
        Self {
            doc: RawImport::default(),
        }
    }

    pub fn with_task(mut self, task: TaskSpecBuilder) -> Self {
        self.doc.tasks.push(task.build());
        self
    }

    pub fn project(self, id: &str) -> Self {
        self.with_task(TaskSpecBuilder::new(id, TaskType::Project))
    }

    pub fn epic(self, id: &str) -> Self {
        self.with_task(TaskSpecBuilder::new(id, TaskType::Epic))
    }

    pub fn task(self, id: &str) -> Self {
        self.with_task(TaskSpecBuilder::new(id, TaskType::Task))
    }

    pub fn subtask(self, id: &str) -> Self {
        self.with_task(TaskSpecBuilder::new(id, TaskType::Subtask))
    }

    /// `task` is blocked until `depends_on` is closed.
    pub fn blocks(self, task: &str, depends_on: &str) -> Self {
        self.dependency(task, depends_on, DependencyType::Blocks)
    }

    pub fn dependency(mut self, task: &str, depends_on: &str, dep_type: DependencyType) -> Self {
        self.doc.dependencies.push(RawDependencySpec {
            task: task.to_string(),
            depends_on: depends_on.to_string(),
            dep_type,
        });
        self
    }

    pub fn raw(self) -> RawImport {
        self.doc
    }

    pub fn to_toml(&self) -> String {
        self.doc.to_toml().expect("import document serializes to TOML")
    }

    pub fn to_json(&self) -> String {
        self.doc.to_json().expect("import document serializes to JSON")
    }

    pub fn build(self) -> ImportPlan {
        ImportPlan::try_from(self.doc).expect("Failed to build valid import from builder")
    }
}

impl Default for ImportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for one `[[tasks]]` entry.
pub struct TaskSpecBuilder {
    task: RawTaskSpec,
}

impl TaskSpecBuilder {
    pub fn new(id: &str, task_type: TaskType) -> Self {
        Self {
            task: RawTaskSpec {
                id: id.to_string(),
                task_type,
                title: format!("{task_type} {id}"),
                description: None,
                acceptance_criteria: None,
                priority: DEFAULT_PRIORITY,
                objectives: vec![],
                requires_submission: None,
                validator: None,
                parent: None,
            },
        }
    }

    pub fn title(mut self, title: &str) -> Self {
        self.task.title = title.to_string();
        self
    }

    pub fn priority(mut self, priority: u8) -> Self {
        self.task.priority = priority;
        self
    }

    pub fn objective(mut self, objective: &str) -> Self {
        self.task.objectives.push(objective.to_string());
        self
    }

    pub fn requires_submission(mut self, value: bool) -> Self {
        self.task.requires_submission = Some(value);
        self
    }

    pub fn validator(mut self, spec: ValidatorSpec) -> Self {
        self.task.validator = Some(spec);
        self
    }

    pub fn parent(mut self, parent: &str) -> Self {
        self.task.parent = Some(parent.to_string());
        self
    }

    pub fn build(self) -> RawTaskSpec {
        self.task
    }
}
