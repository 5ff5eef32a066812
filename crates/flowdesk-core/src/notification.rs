use crate::project::Project;
use crate::status::WorkflowStatus;
use crate::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// NotificationKind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Assignment,
    Revision,
    Approval,
    Completion,
    StatusChange,
}

impl NotificationKind {
    /// Kind raised when a project enters `status` through a status update.
    pub fn for_status(status: WorkflowStatus) -> Self {
        match status {
            WorkflowStatus::QcRevisionNeeded | WorkflowStatus::RevisionRequested => {
                NotificationKind::Revision
            }
            WorkflowStatus::QcApproved | WorkflowStatus::ClientApproved => {
                NotificationKind::Approval
            }
            WorkflowStatus::Completed => NotificationKind::Completion,
            _ => NotificationKind::StatusChange,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::Assignment => "assignment",
            NotificationKind::Revision => "revision",
            NotificationKind::Approval => "approval",
            NotificationKind::Completion => "completion",
            NotificationKind::StatusChange => "status_change",
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Notification
// ---------------------------------------------------------------------------

/// Message handed to the notification sink. The sink assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
}

impl NewNotification {
    pub fn assignment(project: &Project, assignee: &User, by: &User) -> Self {
        Self {
            user_id: assignee.id.clone(),
            kind: NotificationKind::Assignment,
            title: format!("New assignment: {}", project.code),
            message: format!(
                "{} assigned you \"{}\" ({}).",
                by.name,
                project.title,
                project.status.label()
            ),
            project_code: Some(project.code.clone()),
        }
    }

    pub fn status_update(project: &Project, recipient: &str, by: &User) -> Self {
        let kind = NotificationKind::for_status(project.status);
        let title = match kind {
            NotificationKind::Revision => format!("Revision needed: {}", project.code),
            NotificationKind::Approval => format!("Approved: {}", project.code),
            NotificationKind::Completion => format!("Completed: {}", project.code),
            _ => format!("Status update: {}", project.code),
        };
        Self {
            user_id: recipient.to_string(),
            kind,
            title,
            message: format!(
                "{} moved \"{}\" to {}.",
                by.name,
                project.title,
                project.status.label()
            ),
            project_code: Some(project.code.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    #[serde(default)]
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn issue(new: NewNotification) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            kind: new.kind,
            title: new.title,
            message: new.message,
            project_code: new.project_code,
            read: false,
            created_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
