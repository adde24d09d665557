// src/output.rs

//! Human-readable and JSON rendering of command results.

use std::io::{self, Write};

use anyhow::Result;
use serde::Serialize;

use crate::dag::{BlockedTask, ProgressSummary, TaskSummary};
use crate::engine::{CloseResult, SubmitResult, TaskDetail};
use crate::ingest::ImportReport;
use crate::store::{Dependency, ProgressRecord, SubmissionRecord};
use crate::types::TaskId;

/// Write `value` as pretty JSON followed by a newline.
pub fn print_json<T: Serialize>(out: &mut impl Write, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

pub fn print_task_list(out: &mut impl Write, tasks: &[TaskSummary]) -> io::Result<()> {
    if tasks.is_empty() {
        return writeln!(out, "no ready work");
    }
    for task in tasks {
        writeln!(
            out,
            "{:<24} P{} {:<8} {:<11} {}",
            task.id, task.priority, task.task_type, task.status, task.title
        )?;
    }
    Ok(())
}

pub fn print_blocked(out: &mut impl Write, blocked: &[BlockedTask]) -> io::Result<()> {
    if blocked.is_empty() {
        return writeln!(out, "nothing is blocked");
    }
    for entry in blocked {
        writeln!(
            out,
            "{:<24} P{} {:<8} blocked by: {}",
            entry.task.id,
            entry.task.priority,
            entry.task.task_type,
            entry.blockers.join(", ")
        )?;
    }
    Ok(())
}

pub fn print_detail(out: &mut impl Write, detail: &TaskDetail) -> io::Result<()> {
    let task = &detail.task;
    writeln!(out, "{} [{}] {}", task.id, task.task_type, task.title)?;
    if let Some(parent) = &task.parent_id {
        writeln!(out, "  parent:      {parent}")?;
    }
    writeln!(out, "  priority:    P{}", task.priority)?;
    writeln!(
        out,
        "  status:      {} (stored: {})",
        detail.effective_status, detail.stored_status
    )?;
    writeln!(out, "  submission:  {}", if detail.requires_submission { "required" } else { "not required" })?;
    writeln!(out, "  attempts:    {}", detail.attempts)?;
    if let Some(description) = &task.description {
        writeln!(out, "  description: {description}")?;
    }
    if let Some(criteria) = &task.acceptance_criteria {
        writeln!(out, "  acceptance:  {criteria}")?;
    }
    for objective in &detail.objectives {
        writeln!(out, "  objective:   {objective}")?;
    }
    if !detail.blockers.is_empty() {
        writeln!(out, "  blocked by:  {}", detail.blockers.join(", "))?;
    }
    print_edges(out, "depends on", &detail.dependencies, |d| &d.depends_on_id)?;
    print_edges(out, "needed by", &detail.dependents, |d| &d.task_id)?;
    if let Some(latest) = &detail.latest_submission {
        print_submission(out, latest)?;
    }
    Ok(())
}

fn print_edges(
    out: &mut impl Write,
    label: &str,
    edges: &[Dependency],
    other_end: impl Fn(&Dependency) -> &TaskId,
) -> io::Result<()> {
    for dep in edges {
        writeln!(out, "  {label:<11}  {} ({})", other_end(dep), dep.dep_type)?;
    }
    Ok(())
}

pub fn print_progress(out: &mut impl Write, record: &ProgressRecord) -> io::Result<()> {
    writeln!(out, "{} for {}: {}", record.task_id, record.learner_id, record.status)
}

pub fn print_close(out: &mut impl Write, result: &CloseResult) -> io::Result<()> {
    print_progress(out, &result.record)?;
    for closed in &result.auto_closed {
        writeln!(out, "  auto-closed {} ({})", closed.id, closed.task_type)?;
    }
    Ok(())
}

pub fn print_submit(out: &mut impl Write, result: &SubmitResult) -> io::Result<()> {
    writeln!(
        out,
        "attempt #{} on {}: {} - {}",
        result.attempt_number,
        result.task_id,
        if result.validation_passed { "passed" } else { "failed" },
        result.message
    )?;
    writeln!(out, "status: {}", result.status)?;
    for closed in &result.auto_closed {
        writeln!(out, "  auto-closed {} ({})", closed.id, closed.task_type)?;
    }
    writeln!(out, "ready:")?;
    print_task_list(out, &result.ready_tasks)
}

fn print_submission(out: &mut impl Write, submission: &SubmissionRecord) -> io::Result<()> {
    let verdict = match &submission.validation {
        Some(v) if v.passed => format!("passed ({}): {}", v.validator, v.message),
        Some(v) => format!("failed ({}): {}", v.validator, v.message),
        None => "not validated".to_string(),
    };
    let digest: String = submission.payload_digest.chars().take(12).collect();
    writeln!(out, "  #{:<3} {} {}", submission.attempt_number, digest, verdict)
}

pub fn print_history(out: &mut impl Write, history: &[SubmissionRecord]) -> io::Result<()> {
    if history.is_empty() {
        return writeln!(out, "no submissions");
    }
    for submission in history {
        print_submission(out, submission)?;
    }
    Ok(())
}

pub fn print_summary(out: &mut impl Write, summary: &ProgressSummary) -> io::Result<()> {
    writeln!(out, "{} for {}", summary.project_id, summary.learner_id)?;
    writeln!(out, "  open:        {}", summary.open)?;
    writeln!(out, "  in_progress: {}", summary.in_progress)?;
    writeln!(out, "  blocked:     {}", summary.blocked)?;
    writeln!(out, "  closed:      {}", summary.closed)?;
    writeln!(out, "  total:       {}", summary.total)
}

pub fn print_import(out: &mut impl Write, report: &ImportReport) -> io::Result<()> {
    let verb = if report.dry_run { "would import" } else { "imported" };
    writeln!(out, "{verb} {} task(s) (digest {})", report.tasks, report.digest)?;
    for (task_type, count) in &report.tasks_by_type {
        writeln!(out, "  {task_type:<8} {count}")?;
    }
    writeln!(out, "  parent_child edges: {}", report.parent_child_edges)?;
    writeln!(out, "  explicit edges:     {}", report.explicit_edges)?;
    writeln!(out, "  objectives:         {}", report.objectives)
}

pub fn print_dependencies(out: &mut impl Write, verb: &str, deps: &[Dependency]) -> io::Result<()> {
    for dep in deps {
        writeln!(out, "{verb} {} -> {} ({})", dep.task_id, dep.depends_on_id, dep.dep_type)?;
    }
    Ok(())
}

pub fn print_cycles(out: &mut impl Write, cycles: &[Vec<TaskId>]) -> io::Result<()> {
    if cycles.is_empty() {
        return writeln!(out, "no cycles");
    }
    for cycle in cycles {
        writeln!(out, "cycle: {}", cycle.join(", "))?;
    }
    Ok(())
}
