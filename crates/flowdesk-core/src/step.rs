use crate::status::WorkflowStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Immutable audit record of one transition. Appended once, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    pub id: String,
    pub project_code: String,
    /// `None` only for the intake step that opens the history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<WorkflowStatus>,
    pub to: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    pub assigned_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl WorkflowStep {
    pub fn record(
        project_code: impl Into<String>,
        from: Option<WorkflowStatus>,
        to: WorkflowStatus,
        assigned_to: Option<String>,
        assigned_by: impl Into<String>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            project_code: project_code.into(),
            from,
            to,
            assigned_to,
            assigned_by: assigned_by.into(),
            created_at: Utc::now(),
            notes: notes.filter(|n| !n.trim().is_empty()),
        }
    }
}
