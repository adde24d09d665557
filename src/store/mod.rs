// src/store/mod.rs

//! SQLite-backed persistence for the template and instance layers.
//!
//! - [`tasks`] and [`deps`] hold the shared template graph.
//! - [`progress`] holds per-learner status rows (lazily created).
//! - [`submissions`] holds append-only attempts and their validations.
//!
//! The free functions in those modules take a `&Connection` so that the
//! engine can compose them inside one transaction. [`Store`] owns the
//! connections and hands out transactions.

pub mod deps;
pub mod progress;
pub mod records;
pub mod schema;
pub mod submissions;
pub mod tasks;

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::anyhow;
use rusqlite::{Connection, ErrorCode, Transaction, TransactionBehavior};
use tracing::debug;

use crate::errors::{LearnpathError, Result};

pub use records::{
    resolve_status, Dependency, ProgressRecord, SubmissionRecord, TaskRecord, ValidationRecord,
};

/// Idle reader connections kept open per store.
const MAX_IDLE_READERS: usize = 8;

/// Handle to the relational store.
///
/// Cloning is cheap; all clones share the writer connection and the reader
/// pool. Every unit of work runs inside a transaction obtained from
/// [`Store::write`] or [`Store::read`]. Writes are serialised on one
/// connection. A file-backed store serves reads from pooled connections
/// in WAL mode, so readers never wait on each other or on the writer.
#[derive(Debug, Clone)]
pub struct Store {
    writer: Arc<Mutex<Connection>>,
    readers: Option<Arc<ReaderPool>>,
}

#[derive(Debug)]
struct ReaderPool {
    path: PathBuf,
    busy_timeout: Duration,
    idle: Mutex<Vec<Connection>>,
}

impl Store {
    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>, busy_timeout: Duration) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = open_file(path, busy_timeout)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;\nPRAGMA synchronous=NORMAL;")?;
        schema::install(&conn)?;
        debug!(path = ?path, "opened store");

        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            readers: Some(Arc::new(ReaderPool {
                path: path.to_path_buf(),
                busy_timeout,
                idle: Mutex::new(Vec::new()),
            })),
        })
    }

    /// Private in-memory database (tests, dry runs). Reads share the writer
    /// connection, since a second connection would see a different database.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        schema::install(&conn)?;
        Ok(Self {
            writer: Arc::new(Mutex::new(conn)),
            readers: None,
        })
    }

    /// Run `f` inside a `BEGIN IMMEDIATE` transaction and commit on success.
    ///
    /// The write lock is taken up front, so check-then-write sequences inside
    /// `f` cannot interleave with another writer. Returning an error drops the
    /// transaction, which rolls back every write made by `f`.
    pub fn write<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let mut conn = lock(&self.writer)?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Run `f` inside a deferred transaction, giving it a consistent snapshot.
    pub fn read<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        let Some(pool) = &self.readers else {
            let mut conn = lock(&self.writer)?;
            return run_read(&mut conn, f);
        };

        let mut conn = pool.checkout()?;
        let out = run_read(&mut conn, f);
        pool.checkin(conn);
        out
    }
}

impl ReaderPool {
    fn checkout(&self) -> Result<Connection> {
        if let Some(conn) = lock(&self.idle)?.pop() {
            return Ok(conn);
        }
        debug!(path = ?self.path, "opening reader connection");
        open_file(&self.path, self.busy_timeout)
    }

    fn checkin(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < MAX_IDLE_READERS {
                idle.push(conn);
            }
        }
    }
}

fn open_file(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(busy_timeout)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

fn run_read<T>(
    conn: &mut Connection,
    f: impl FnOnce(&Transaction<'_>) -> Result<T>,
) -> Result<T> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Deferred)?;
    f(&tx)
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| LearnpathError::Other(anyhow!("store lock poisoned")))
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(duration) => duration,
        Err(_) => return 0,
    };

    i64::try_from(now.as_millis()).unwrap_or(i64::MAX)
}

/// Whether `err` is a UNIQUE / PRIMARY KEY violation (as opposed to a foreign
/// key or CHECK failure).
pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(code, message) => {
            code.code == ErrorCode::ConstraintViolation
                && (code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                    || message.as_deref().is_some_and(|value| {
                        value.contains("UNIQUE constraint failed")
                            || value.contains("PRIMARY KEY constraint failed")
                    }))
        }
        _ => false,
    }
}

/// Parse a TEXT column into one of the string-backed enums in [`crate::types`].
pub(crate) fn parse_text_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    raw.parse::<T>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, e.into())
    })
}
