use crate::cmd::Workspace;
use crate::output::print_json;
use anyhow::Context;
use flowdesk_core::engine::TransitionOutcome;
use flowdesk_core::status::WorkflowStatus;
use std::path::Path;

pub fn assign(
    root: &Path,
    code: &str,
    user_id: &str,
    notes: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let outcome = ws
        .workflow()
        .assign(&ws.session(), code, user_id, notes)
        .with_context(|| format!("cannot assign {code} to '{user_id}'"))?;
    report(&outcome, json)
}

pub fn status(
    root: &Path,
    code: &str,
    target: &str,
    notes: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let target: WorkflowStatus = target.parse()?;
    let ws = Workspace::open(root)?;
    let outcome = ws
        .workflow()
        .update_status(&ws.session(), code, target, notes)
        .with_context(|| format!("cannot move {code} to {target}"))?;
    report(&outcome, json)
}

fn report(outcome: &TransitionOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(outcome);
    }
    let p = &outcome.project;
    if outcome.from == outcome.to {
        println!("{}: {} (unchanged)", p.code, outcome.to);
    } else {
        println!("{}: {} -> {}", p.code, outcome.from, outcome.to);
    }
    if let Some(assignee) = &p.assignee {
        println!("  assignee: {assignee}");
    }
    if outcome.step.is_none() {
        println!("  warning: history entry was not recorded");
    }
    if let Some(n) = &outcome.notification {
        println!("  notified: {}", n.user_id);
    }
    Ok(())
}
