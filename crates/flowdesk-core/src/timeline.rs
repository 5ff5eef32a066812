use crate::backend::{ProjectStore, UserDirectory};
use crate::error::{FlowError, Result};
use crate::project::Project;
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;
use crate::user::{self, User};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Shown for actors that are no longer in the active-user set.
pub const UNKNOWN_USER: &str = "Unknown User";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    pub from: Option<WorkflowStatus>,
    pub to: WorkflowStatus,
    /// Display label of `to`.
    pub label: String,
    pub assigned_to_name: Option<String>,
    pub assigned_by_name: String,
    pub at: DateTime<Utc>,
    pub notes: Option<String>,
}

fn name_or_placeholder(users: &[User], id: &str) -> String {
    user::display_name(users, id)
        .unwrap_or(UNKNOWN_USER)
        .to_string()
}

/// Project `steps` into display entries, oldest first. Steps sharing a
/// timestamp keep their append order.
pub fn project_steps(mut steps: Vec<WorkflowStep>, users: &[User]) -> Vec<TimelineEntry> {
    steps.sort_by_key(|s| s.created_at);
    steps
        .into_iter()
        .map(|s| TimelineEntry {
            from: s.from,
            to: s.to,
            label: s.to.label(),
            assigned_to_name: s
                .assigned_to
                .as_deref()
                .map(|id| name_or_placeholder(users, id)),
            assigned_by_name: name_or_placeholder(users, &s.assigned_by),
            at: s.created_at,
            notes: s.notes,
        })
        .collect()
}

/// Read-only history of `code` with actor names resolved against the
/// active-user set.
pub fn project_timeline(
    store: &dyn ProjectStore,
    users: &dyn UserDirectory,
    code: &str,
) -> Result<Vec<TimelineEntry>> {
    store.read_project(code)?;
    let steps = store.list_workflow_steps(code)?;
    let active = users.list_active_users()?;
    Ok(project_steps(steps, &active))
}

/// Check that the latest step leads to the project's current status.
pub fn verify_history(project: &Project, steps: &[WorkflowStep]) -> Result<()> {
    let latest = steps
        .iter()
        .enumerate()
        .max_by_key(|(i, s)| (s.created_at, *i))
        .map(|(_, s)| s);
    match latest {
        None => Err(FlowError::IntegrityViolation {
            code: project.code.clone(),
            reason: "no workflow steps recorded".to_string(),
        }),
        Some(step) if step.to != project.status => Err(FlowError::IntegrityViolation {
            code: project.code.clone(),
            reason: format!(
                "status is {} but the latest step leads to {}",
                project.status, step.to
            ),
        }),
        Some(_) => Ok(()),
    }
}
