use crate::cmd::Workspace;
use crate::output::{print_json, print_table};
use flowdesk_core::policy;
use flowdesk_core::status::WorkflowStatus;
use std::path::Path;

pub fn pool(root: &Path, status: &str, json: bool) -> anyhow::Result<()> {
    let status: WorkflowStatus = status.parse()?;
    let ws = Workspace::open(root)?;
    let users = ws.workflow().next_assignees(status)?;

    if json {
        return print_json(&serde_json::json!({
            "status": status,
            "next_status": policy::next_status_for_assignment(status),
            "users": users,
        }));
    }
    if users.is_empty() {
        println!("No one can receive a project at {status}; assignment is unavailable.");
        return Ok(());
    }
    let rows = users
        .iter()
        .map(|u| vec![u.id.clone(), u.name.clone(), u.role.to_string()])
        .collect();
    print_table(&["ID", "NAME", "ROLE"], rows);
    Ok(())
}

pub fn statuses(json: bool) -> anyhow::Result<()> {
    let all = WorkflowStatus::all();
    if json {
        let items: Vec<_> = all
            .iter()
            .map(|s| {
                serde_json::json!({
                    "status": s,
                    "label": s.label(),
                    "tone": s.tone(),
                    "terminal": s.is_terminal(),
                })
            })
            .collect();
        return print_json(&items);
    }
    let rows = all
        .iter()
        .map(|s| vec![s.to_string(), s.label(), s.tone().to_string()])
        .collect();
    print_table(&["STATUS", "LABEL", "TONE"], rows);
    Ok(())
}
