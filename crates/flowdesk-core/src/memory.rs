//! In-process backend. Every collaborator trait over one lock, with switches
//! to make individual writes fail.

use crate::backend::{ActorSource, NotificationSink, ProjectStore, UserDirectory};
use crate::error::{FlowError, Result};
use crate::notification::{NewNotification, Notification};
use crate::project::{Project, ProjectPatch};
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;
use crate::user::User;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Inner {
    users: Vec<User>,
    projects: BTreeMap<String, Project>,
    steps: Vec<WorkflowStep>,
    notifications: Vec<Notification>,
    signed_in: Option<String>,
}

/// Which writes should fail with an injected I/O error.
#[derive(Debug, Default)]
pub struct Faults {
    pub update_project: AtomicBool,
    pub append_step: AtomicBool,
    pub create_notification: AtomicBool,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    inner: Mutex<Inner>,
    pub faults: Faults,
}

fn injected(flag: &AtomicBool, op: &str) -> Result<()> {
    if flag.load(Ordering::SeqCst) {
        return Err(FlowError::Io(std::io::Error::other(format!(
            "injected failure in {op}"
        ))));
    }
    Ok(())
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_user(&self, user: User) -> Result<()> {
        user.validate()?;
        let mut inner = self.lock();
        if inner.users.iter().any(|u| u.id == user.id) {
            return Err(FlowError::UserExists(user.id));
        }
        inner.users.push(user);
        Ok(())
    }

    pub fn deactivate_user(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| FlowError::UserNotFound(id.to_string()))?;
        user.is_active = false;
        Ok(())
    }

    pub fn sign_in(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        if !inner.users.iter().any(|u| u.id == id) {
            return Err(FlowError::UserNotFound(id.to_string()));
        }
        inner.signed_in = Some(id.to_string());
        Ok(())
    }

    pub fn sign_out(&self) {
        self.lock().signed_in = None;
    }

    /// Overwrite a stored project without any checks. Stands in for an
    /// administrative write that bypasses the workflow.
    pub fn put_project(&self, project: Project) {
        self.lock().projects.insert(project.code.clone(), project);
    }

    pub fn all_notifications(&self) -> Vec<Notification> {
        self.lock().notifications.clone()
    }
}

impl ActorSource for MemoryBackend {
    fn current_actor(&self) -> Option<User> {
        let inner = self.lock();
        let id = inner.signed_in.as_deref()?;
        inner.users.iter().find(|u| u.id == id).cloned()
    }
}

impl UserDirectory for MemoryBackend {
    fn list_active_users(&self) -> Result<Vec<User>> {
        Ok(self.lock().users.iter().filter(|u| u.is_active).cloned().collect())
    }

    fn find_user(&self, id: &str) -> Result<User> {
        self.lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| FlowError::UserNotFound(id.to_string()))
    }
}

impl ProjectStore for MemoryBackend {
    fn create_project(&self, project: &Project) -> Result<()> {
        let mut inner = self.lock();
        if inner.projects.contains_key(&project.code) {
            return Err(FlowError::ProjectExists(project.code.clone()));
        }
        inner.projects.insert(project.code.clone(), project.clone());
        Ok(())
    }

    fn read_project(&self, code: &str) -> Result<Project> {
        self.lock()
            .projects
            .get(code)
            .cloned()
            .ok_or_else(|| FlowError::ProjectNotFound(code.to_string()))
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let mut projects: Vec<_> = self.lock().projects.values().cloned().collect();
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    fn update_project(
        &self,
        code: &str,
        expected: WorkflowStatus,
        patch: &ProjectPatch,
    ) -> Result<Project> {
        injected(&self.faults.update_project, "update_project")?;
        let mut inner = self.lock();
        let project = inner
            .projects
            .get_mut(code)
            .ok_or_else(|| FlowError::ProjectNotFound(code.to_string()))?;
        if project.status != expected {
            return Err(FlowError::ConcurrentModification {
                code: code.to_string(),
                expected: expected.to_string(),
                actual: project.status.to_string(),
            });
        }
        project.apply(patch);
        Ok(project.clone())
    }

    fn append_workflow_step(&self, step: &WorkflowStep) -> Result<()> {
        injected(&self.faults.append_step, "append_workflow_step")?;
        self.lock().steps.push(step.clone());
        Ok(())
    }

    fn list_workflow_steps(&self, code: &str) -> Result<Vec<WorkflowStep>> {
        Ok(self
            .lock()
            .steps
            .iter()
            .filter(|s| s.project_code == code)
            .cloned()
            .collect())
    }
}

impl NotificationSink for MemoryBackend {
    fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
        injected(&self.faults.create_notification, "create_notification")?;
        let issued = Notification::issue(notification);
        self.lock().notifications.push(issued.clone());
        Ok(issued)
    }

    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        Ok(self
            .lock()
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .cloned()
            .collect())
    }

    fn mark_notification_read(&self, id: &str) -> Result<Notification> {
        let mut inner = self.lock();
        let n = inner
            .notifications
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FlowError::NotificationNotFound(id.to_string()))?;
        n.read = true;
        Ok(n.clone())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
