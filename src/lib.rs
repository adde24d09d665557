// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod ids;
pub mod ingest;
pub mod logging;
pub mod output;
pub mod store;
pub mod types;
pub mod validators;

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use crate::cli::{CliArgs, Command, DepCommand};
use crate::config::{default_config_path, load_and_validate, load_or_default, EngineConfig};
use crate::engine::Engine;

pub use crate::engine::{CloseResult, NewTask, SubmitResult, TaskDetail, TaskEdit};
pub use crate::errors::LearnpathError;

/// High-level entry point used by `main.rs`.
///
/// Resolves configuration, opens the engine and runs one subcommand, writing
/// its result to stdout.
pub fn run(args: CliArgs) -> Result<()> {
    let config = resolve_config(&args)?;
    debug!(db = ?config.store.path, cascade = ?config.engine.cascade, "configuration resolved");

    let engine = Engine::from_config(&config)
        .with_context(|| format!("failed to open store at {}", config.store.path.display()))?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    dispatch(&engine, args.command, args.json, &mut out)?;
    out.flush()?;
    Ok(())
}

/// An explicit `--config` must exist; the default location may be absent.
fn resolve_config(args: &CliArgs) -> Result<EngineConfig> {
    let config = match &args.config {
        Some(path) => load_and_validate(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => {
            let path = default_config_path();
            load_or_default(&path)
                .with_context(|| format!("failed to load config {}", path.display()))?
        }
    };

    Ok(match &args.db {
        Some(db) => config.with_store_path(db),
        None => config,
    })
}

fn emit<W: Write, T: Serialize>(
    out: &mut W,
    json: bool,
    value: &T,
    human: impl FnOnce(&mut W, &T) -> io::Result<()>,
) -> Result<()> {
    if json {
        output::print_json(out, value)
    } else {
        human(out, value)?;
        Ok(())
    }
}

fn dispatch<W: Write>(engine: &Engine, command: Command, json: bool, out: &mut W) -> Result<()> {
    match command {
        Command::Import { file, dry_run } => {
            let plan = ingest::load_import(&file)
                .with_context(|| format!("failed to load import {}", file.display()))?;
            let report = engine.import(&plan, dry_run)?;
            emit(out, json, &report, |w, r| output::print_import(w, r))
        }
        Command::Ready { scope, task_type } => {
            let ready = engine.get_ready(&scope.project, &scope.learner, task_type)?;
            emit(out, json, &ready, |w, r| output::print_task_list(w, r))
        }
        Command::Show(target) => {
            let detail = engine.show_task(&target.task, &target.learner)?;
            emit(out, json, &detail, |w, d| output::print_detail(w, d))
        }
        Command::Start(target) => {
            let record = engine.start_task(&target.task, &target.learner)?;
            emit(out, json, &record, |w, r| output::print_progress(w, r))
        }
        Command::Submit {
            target,
            payload,
            payload_file,
        } => {
            let payload = match (payload, payload_file) {
                (Some(payload), _) => payload,
                (None, Some(path)) => fs::read_to_string(&path)
                    .with_context(|| format!("failed to read payload {}", path.display()))?,
                (None, None) => anyhow::bail!("either --payload or --payload-file is required"),
            };
            let result = engine.submit(&target.task, &target.learner, &payload)?;
            emit(out, json, &result, |w, r| output::print_submit(w, r))
        }
        Command::Close { target, reason } => {
            let result = engine.close_task(&target.task, &target.learner, &reason)?;
            emit(out, json, &result, |w, r| output::print_close(w, r))
        }
        Command::Reopen { target, to, reason } => {
            let record = engine.reopen_task(&target.task, &target.learner, to, &reason)?;
            emit(out, json, &record, |w, r| output::print_progress(w, r))
        }
        Command::Dep(DepCommand::Add {
            task,
            depends_on,
            dep_type,
        }) => {
            let dep = engine.add_dependency(&task, &depends_on, dep_type)?;
            emit(out, json, &dep, |w, d| {
                output::print_dependencies(w, "added", std::slice::from_ref(d))
            })
        }
        Command::Dep(DepCommand::Remove { task, depends_on }) => {
            let removed = engine.remove_dependency(&task, &depends_on)?;
            emit(out, json, &removed, |w, r| output::print_dependencies(w, "removed", r))
        }
        Command::Blocked(scope) => {
            let blocked = engine.blocked_work(&scope.project, &scope.learner)?;
            emit(out, json, &blocked, |w, b| output::print_blocked(w, b))
        }
        Command::Summary(scope) => {
            let summary = engine.progress_summary(&scope.project, &scope.learner)?;
            emit(out, json, &summary, |w, s| output::print_summary(w, s))
        }
        Command::History(target) => {
            let history = engine.submissions(&target.task, &target.learner)?;
            emit(out, json, &history, |w, h| output::print_history(w, h))
        }
        Command::Audit => {
            let cycles = engine.detect_cycles()?;
            emit(out, json, &cycles, |w, c| output::print_cycles(w, c))
        }
    }
}
