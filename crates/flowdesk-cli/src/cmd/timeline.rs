use crate::cmd::Workspace;
use crate::output::{print_json, print_table, timeline_rows};
use anyhow::Context;
use flowdesk_core::backend::ProjectStore;
use flowdesk_core::timeline;
use std::path::Path;

pub fn run(root: &Path, code: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let entries = timeline::project_timeline(&ws.backend, &ws.backend, code)
        .with_context(|| format!("cannot load history for {code}"))?;

    let project = ws.backend.read_project(code)?;
    let steps = ws.backend.list_workflow_steps(code)?;
    let consistency = timeline::verify_history(&project, &steps);

    if json {
        return print_json(&serde_json::json!({
            "code": code,
            "entries": entries,
            "consistent": consistency.is_ok(),
        }));
    }
    if entries.is_empty() {
        println!("No history for {code}.");
    } else {
        print_table(
            &["AT", "FROM", "TO", "ASSIGNEE", "BY", "NOTES"],
            timeline_rows(&entries),
        );
    }
    if let Err(e) = consistency {
        eprintln!("warning: {e}");
    }
    Ok(())
}
