//! Collaborator interfaces the workflow core consumes. Persistence, user
//! management, authentication, and notification delivery all live behind
//! these traits; [`crate::memory::MemoryBackend`] and
//! [`crate::file::FileBackend`] are the two bundled implementations.

use crate::error::Result;
use crate::notification::{NewNotification, Notification};
use crate::project::{Project, ProjectPatch};
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;
use crate::user::User;

/// Authentication provider: who is signed in right now.
pub trait ActorSource {
    /// `None` while unauthenticated.
    fn current_actor(&self) -> Option<User>;
}

pub trait UserDirectory: Send + Sync {
    /// Users eligible to appear in assignee pools (`is_active == true`).
    fn list_active_users(&self) -> Result<Vec<User>>;

    /// Look up any user, active or not.
    fn find_user(&self, id: &str) -> Result<User>;
}

pub trait ProjectStore: Send + Sync {
    /// Insert a new project. Fails with `ProjectExists` on a duplicate code.
    fn create_project(&self, project: &Project) -> Result<()>;

    fn read_project(&self, code: &str) -> Result<Project>;

    fn list_projects(&self) -> Result<Vec<Project>>;

    /// Apply `patch` as one unit, only if the stored status still equals
    /// `expected`. A mismatch is `ConcurrentModification`.
    fn update_project(
        &self,
        code: &str,
        expected: WorkflowStatus,
        patch: &ProjectPatch,
    ) -> Result<Project>;

    /// Append-only audit write.
    fn append_workflow_step(&self, step: &WorkflowStep) -> Result<()>;

    /// Steps for `code` in the order they were appended.
    fn list_workflow_steps(&self, code: &str) -> Result<Vec<WorkflowStep>>;
}

pub trait NotificationSink: Send + Sync {
    fn create_notification(&self, notification: NewNotification) -> Result<Notification>;

    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>>;

    /// Flip the read flag; the only mutation a notification ever sees.
    fn mark_notification_read(&self, id: &str) -> Result<Notification>;
}
