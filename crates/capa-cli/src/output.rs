//! Render de resultados: texto para operadores, JSON para scripts.

use std::collections::BTreeSet;

use capa_core::{AuditReport, HistoryEntry, Permission, ReviewItem, TransitionOutcome, WorkflowView};
use capa_domain::Workflow;
use serde::Serialize;

use crate::error::CliResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

pub struct Printer {
    pub format: OutputFormat,
}

impl Printer {
    fn json<T: Serialize>(&self, value: &T) -> CliResult<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    pub fn outcome(&self, out: &TransitionOutcome) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(&serde_json::json!({
                "workflow": out.workflow,
                "action": out.tag,
                "history_recorded": out.history_recorded(),
            }));
        }
        println!("{} #{} -> {} ({})", out.workflow.id, out.workflow.sequence_id, out.workflow.status, out.tag);
        if !out.history_recorded() {
            eprintln!("warning: history entry not recorded; run `capa audit {}`", out.workflow.id);
        }
        Ok(())
    }

    pub fn view(&self, view: &WorkflowView) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(view);
        }
        let w = &view.workflow;
        workflow_block(w);
        println!("overdue:      {}", view.overdue);
        println!("remaining:    {}", remaining(view.remaining_secs));
        println!("actions:      {}", permissions(&view.permitted));
        println!();
        self.history_lines(&view.history);
        Ok(())
    }

    pub fn history(&self, entries: &[HistoryEntry]) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(&entries);
        }
        self.history_lines(entries);
        Ok(())
    }

    fn history_lines(&self, entries: &[HistoryEntry]) {
        for e in entries {
            println!("{:>3}  {}  {:<20} {:<20} by {}{}",
                     e.seq,
                     e.created_at.format("%Y-%m-%d %H:%M:%S"),
                     e.action,
                     e.status_after,
                     e.performed_by,
                     e.notes.as_deref().map(|n| format!("  \"{n}\"")).unwrap_or_default());
        }
    }

    pub fn workflows(&self, list: &[Workflow]) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(&list);
        }
        for w in list {
            println!("#{:<4} {}  {:<20} {:<10} due {}  {}",
                     w.sequence_id,
                     w.id,
                     w.status,
                     w.nature,
                     w.deadline.format("%Y-%m-%d %H:%M"),
                     w.title);
        }
        Ok(())
    }

    pub fn queue(&self, items: &[ReviewItem]) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(&items);
        }
        for i in items {
            println!("{} #{:<4} {}  {:<20} {:>9}  [{}]  {}",
                     if i.overdue { "!" } else { " " },
                     i.workflow.sequence_id,
                     i.workflow.id,
                     i.workflow.status,
                     remaining(i.remaining_secs),
                     permissions(&i.permitted),
                     i.workflow.title);
        }
        Ok(())
    }

    pub fn audit(&self, report: &AuditReport) -> CliResult<()> {
        if self.format == OutputFormat::Json {
            return self.json(report);
        }
        println!("workflow:     {}", report.workflow_id);
        println!("recorded:     {}", report.recorded_status);
        println!("derived:      {}",
                 report.derived_status.map(|s| s.to_string()).unwrap_or_else(|| "-".into()));
        if let Some(e) = &report.replay_error {
            println!("replay error: {e}");
        }
        println!("entries:      {}", report.entries);
        match report.first_broken_seq {
            Some(seq) => println!("chain:        broken at seq {seq}"),
            None => println!("chain:        ok"),
        }
        println!("consistent:   {}", report.is_consistent());
        Ok(())
    }
}

fn workflow_block(w: &Workflow) {
    println!("workflow:     {} (#{})", w.id, w.sequence_id);
    println!("deviation:    {}", w.deviation_id);
    println!("title:        {}", w.title);
    println!("description:  {}", w.description);
    println!("nature:       {}", w.nature);
    println!("responsible:  {}", w.responsible_id);
    println!("deadline:     {}", w.deadline.to_rfc3339());
    println!("status:       {}", w.status);
    if let Some(n) = &w.response_notes {
        println!("response:     {n}");
    }
    for p in &w.evidence_photos {
        println!("evidence:     {p}");
    }
    if let Some(n) = &w.validator_notes {
        println!("validator:    {n}");
    }
}

/// `2d 3h`, `5h 12m`, `40m`; `due` cuando el deadline ya pasó.
fn remaining(secs: Option<i64>) -> String {
    let Some(secs) = secs else { return "due".into() };
    let (days, hours, minutes) = (secs / 86_400, secs % 86_400 / 3_600, secs % 3_600 / 60);
    match (days, hours) {
        (0, 0) => format!("{}m", minutes.max(1)),
        (0, h) => format!("{h}h {minutes}m"),
        (d, h) => format!("{d}d {h}h"),
    }
}

fn permissions(set: &BTreeSet<Permission>) -> String {
    if set.is_empty() {
        return "read-only".into();
    }
    set.iter()
       .map(|p| match p {
           Permission::Respond => "respond",
           Permission::Validate => "approve/return",
       })
       .collect::<Vec<_>>()
       .join(", ")
}
