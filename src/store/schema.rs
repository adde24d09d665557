// src/store/schema.rs

use rusqlite::{params, Connection};

use crate::errors::Result;

pub const SCHEMA_VERSION: &str = "1";

const SQL: &str = r#"
CREATE TABLE IF NOT EXISTS meta (
  key TEXT PRIMARY KEY,
  value TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS tasks (
  id TEXT PRIMARY KEY,
  parent_id TEXT REFERENCES tasks(id),
  task_type TEXT NOT NULL CHECK (task_type IN ('project', 'epic', 'task', 'subtask')),
  title TEXT NOT NULL,
  description TEXT,
  acceptance_criteria TEXT,
  priority INTEGER NOT NULL DEFAULT 2 CHECK (priority BETWEEN 0 AND 4),
  requires_submission INTEGER,
  validator_json TEXT,
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks(parent_id);

CREATE TABLE IF NOT EXISTS task_objectives (
  task_id TEXT NOT NULL REFERENCES tasks(id),
  position INTEGER NOT NULL,
  objective TEXT NOT NULL,
  PRIMARY KEY (task_id, position)
);

CREATE TABLE IF NOT EXISTS dependencies (
  task_id TEXT NOT NULL REFERENCES tasks(id),
  depends_on_id TEXT NOT NULL REFERENCES tasks(id),
  dep_type TEXT NOT NULL CHECK (dep_type IN ('blocks', 'parent_child', 'related')),
  created_at_ms INTEGER NOT NULL,
  PRIMARY KEY (task_id, depends_on_id, dep_type)
);

CREATE INDEX IF NOT EXISTS idx_dependencies_target ON dependencies(depends_on_id);

CREATE TABLE IF NOT EXISTS learner_task_progress (
  task_id TEXT NOT NULL REFERENCES tasks(id),
  learner_id TEXT NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('open', 'in_progress', 'blocked', 'closed')),
  notes TEXT,
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL,
  started_at_ms INTEGER,
  closed_at_ms INTEGER,
  PRIMARY KEY (task_id, learner_id)
);

CREATE INDEX IF NOT EXISTS idx_progress_learner ON learner_task_progress(learner_id);

CREATE TABLE IF NOT EXISTS submissions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  task_id TEXT NOT NULL REFERENCES tasks(id),
  learner_id TEXT NOT NULL,
  attempt_number INTEGER NOT NULL,
  payload TEXT NOT NULL,
  payload_digest TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL,
  UNIQUE (task_id, learner_id, attempt_number)
);

CREATE TABLE IF NOT EXISTS validations (
  submission_id INTEGER PRIMARY KEY REFERENCES submissions(id),
  passed INTEGER NOT NULL,
  message TEXT NOT NULL,
  validator TEXT NOT NULL,
  created_at_ms INTEGER NOT NULL
);
"#;

/// Create all tables (idempotent) and stamp the schema version.
pub fn install(conn: &Connection) -> Result<()> {
    conn.execute_batch(SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO meta(key, value) VALUES (?1, ?2)",
        params!["schema_version", SCHEMA_VERSION],
    )?;
    Ok(())
}
