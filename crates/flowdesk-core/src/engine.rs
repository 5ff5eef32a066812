//! The assignment engine: executes policy-checked transitions against the
//! project store, records the audit step, and raises notifications.
//!
//! Every transition follows the same order:
//!
//! 1. resolve the actor and claim the project's in-flight slot
//! 2. read the project and check assignee integrity
//! 3. authorize against [`crate::policy`]
//! 4. compare-and-swap the project record on the status that was read
//! 5. append the workflow step, then emit the notification
//!
//! A failure in (4) aborts with nothing written. Failures in (5) are logged and
//! reported as absent fields of [`TransitionOutcome`]; the project has already
//! moved and stays moved.

use crate::backend::{NotificationSink, ProjectStore, UserDirectory};
use crate::config::Config;
use crate::error::{FlowError, Result};
use crate::notification::{NewNotification, Notification};
use crate::policy::{self, Action};
use crate::project::{Project, ProjectPatch};
use crate::session::Session;
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;
use crate::user::User;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

// ---------------------------------------------------------------------------
// Options / outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkflowOptions {
    pub notify_assignments: bool,
    pub notify_status_changes: bool,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            notify_assignments: true,
            notify_status_changes: true,
        }
    }
}

impl WorkflowOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            notify_assignments: config.notifies_assignments(),
            notify_status_changes: config.notifies_status_changes(),
        }
    }
}

/// What a committed transition produced. `step` and `notification` are `None`
/// when their write failed (or notifications are switched off).
#[derive(Debug, Clone, Serialize)]
pub struct TransitionOutcome {
    pub project: Project,
    pub from: WorkflowStatus,
    pub to: WorkflowStatus,
    pub step: Option<WorkflowStep>,
    pub notification: Option<Notification>,
}

// ---------------------------------------------------------------------------
// In-flight guard
// ---------------------------------------------------------------------------

struct InFlight<'w> {
    slots: &'w Mutex<HashSet<String>>,
    code: String,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.code);
    }
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

pub struct Workflow<'a> {
    store: &'a dyn ProjectStore,
    users: &'a dyn UserDirectory,
    notifier: &'a dyn NotificationSink,
    options: WorkflowOptions,
    in_flight: Mutex<HashSet<String>>,
}

impl<'a> Workflow<'a> {
    pub fn new(
        store: &'a dyn ProjectStore,
        users: &'a dyn UserDirectory,
        notifier: &'a dyn NotificationSink,
    ) -> Self {
        Self {
            store,
            users,
            notifier,
            options: WorkflowOptions::default(),
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_options(mut self, options: WorkflowOptions) -> Self {
        self.options = options;
        self
    }

    fn claim(&self, code: &str) -> Result<InFlight<'_>> {
        let mut slots = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !slots.insert(code.to_string()) {
            return Err(FlowError::TransitionInFlight(code.to_string()));
        }
        Ok(InFlight {
            slots: &self.in_flight,
            code: code.to_string(),
        })
    }

    fn active_users(&self) -> Result<Vec<User>> {
        self.users
            .list_active_users()
            .map_err(|e| e.into_persistence("list_active_users"))
    }

    /// Read the project and its active-user context, rejecting records whose
    /// assignee could not have been put there by the policy.
    fn load(&self, code: &str) -> Result<(Project, Vec<User>)> {
        let project = self
            .store
            .read_project(code)
            .map_err(|e| e.into_persistence("read_project"))?;
        let users = self.active_users()?;
        if let Some(assignee) = project.assignee.as_deref() {
            if !users.iter().any(|u| u.id == assignee) {
                tracing::warn!(
                    project = %project.code,
                    assignee,
                    "assignee is not an active user; skipping integrity check"
                );
            }
        }
        policy::check_assignee_integrity(&project, &users)?;
        Ok((project, users))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Active users eligible to receive a project at `status`.
    pub fn next_assignees(&self, status: WorkflowStatus) -> Result<Vec<User>> {
        Ok(policy::next_assignees(status, &self.active_users()?))
    }

    /// Actions the signed-in actor may take on `code` right now.
    pub fn available_actions(&self, session: &Session, code: &str) -> Result<Vec<Action>> {
        let actor = session.require_actor()?;
        let (project, users) = self.load(code)?;
        Ok(policy::available_actions(&project, actor, &users))
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Hand `code` to `assignee_id`, moving it along the forward map.
    pub fn assign(
        &self,
        session: &Session,
        code: &str,
        assignee_id: &str,
        notes: Option<String>,
    ) -> Result<TransitionOutcome> {
        let actor = session.require_actor()?;
        let _slot = self.claim(code)?;
        let (project, _) = self.load(code)?;
        let assignee = self.users.find_user(assignee_id).map_err(|e| match e {
            FlowError::UserNotFound(_) => e,
            other => other.into_persistence("find_user"),
        })?;

        let from = project.status;
        let to = policy::authorize_assignment(&project, actor, &assignee)?;
        let patch = revision_patch(&project, to).with_assignee(&assignee.id);
        let updated = self
            .store
            .update_project(code, from, &patch)
            .map_err(|e| e.into_persistence("update_project"))?;

        let step = self.record_step(WorkflowStep::record(
            code,
            Some(from),
            to,
            Some(assignee.id.clone()),
            &actor.id,
            notes,
        ));
        let notification = if self.options.notify_assignments {
            self.emit(NewNotification::assignment(&updated, &assignee, actor))
        } else {
            tracing::debug!(project = code, "assignment notifications disabled");
            None
        };

        tracing::info!(
            project = code,
            %from,
            %to,
            assignee = %assignee.id,
            by = %actor.id,
            "project assigned"
        );
        Ok(TransitionOutcome {
            project: updated,
            from,
            to,
            step,
            notification,
        })
    }

    /// Set the status of `code` directly, keeping the current assignee.
    /// Setting the current status again records a touch.
    pub fn update_status(
        &self,
        session: &Session,
        code: &str,
        target: WorkflowStatus,
        notes: Option<String>,
    ) -> Result<TransitionOutcome> {
        let actor = session.require_actor()?;
        let _slot = self.claim(code)?;
        let (project, _) = self.load(code)?;

        let from = project.status;
        policy::authorize_status_update(&project, actor, target)?;
        let patch = revision_patch(&project, target);
        let updated = self
            .store
            .update_project(code, from, &patch)
            .map_err(|e| e.into_persistence("update_project"))?;

        let step = self.record_step(WorkflowStep::record(
            code,
            Some(from),
            target,
            updated.assignee.clone(),
            &actor.id,
            notes,
        ));
        let notification = match updated.assignee.as_deref() {
            Some(recipient) if self.options.notify_status_changes => {
                self.emit(NewNotification::status_update(&updated, recipient, actor))
            }
            Some(_) => {
                tracing::debug!(project = code, "status change notifications disabled");
                None
            }
            None => {
                tracing::debug!(project = code, "no assignee to notify");
                None
            }
        };

        tracing::info!(project = code, %from, to = %target, by = %actor.id, "status updated");
        Ok(TransitionOutcome {
            project: updated,
            from,
            to: target,
            step,
            notification,
        })
    }

    fn record_step(&self, step: WorkflowStep) -> Option<WorkflowStep> {
        match self.store.append_workflow_step(&step) {
            Ok(()) => Some(step),
            Err(e) => {
                tracing::warn!(
                    project = %step.project_code,
                    to = %step.to,
                    error = %e,
                    "transition committed but workflow step was not recorded"
                );
                None
            }
        }
    }

    fn emit(&self, notification: NewNotification) -> Option<Notification> {
        let recipient = notification.user_id.clone();
        match self.notifier.create_notification(notification) {
            Ok(n) => Some(n),
            Err(e) => {
                tracing::warn!(
                    user = %recipient,
                    error = %e,
                    "transition committed but notification was not delivered"
                );
                None
            }
        }
    }
}

/// Status patch for moving `project` to `to`, bumping the revision count when
/// the move enters a revision status.
fn revision_patch(project: &Project, to: WorkflowStatus) -> ProjectPatch {
    let patch = ProjectPatch::status(to);
    if to.is_revision() && project.status != to {
        patch.with_revision_count(project.revision_count + 1)
    } else {
        patch
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
