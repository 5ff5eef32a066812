//! Transition policy: who may move a project, where it may go, and who may
//! receive it.
//!
//! Everything is derived from two static tables:
//!
//! - [`rule`]: per status, the roles that may *assign* the project onward,
//!   the roles that may *receive* it, and the status an assignment forwards to.
//! - [`STATUS_ACTIONS`]: direct status changes that do not touch the assignee,
//!   each guarded by role and/or current-assignee identity.
//!
//! `Admin` passes every guard. All checks are pure so the same answers are
//! available to a UI deciding what to render and to the engine enforcing it.

use crate::error::{FlowError, Result};
use crate::project::Project;
use crate::role::Role;
use crate::status::WorkflowStatus;
use crate::user::User;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Assignment table
// ---------------------------------------------------------------------------

const CS_POOL: &[Role] = &[Role::Cs, Role::Lead];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusRule {
    /// Roles (besides Admin) allowed to assign the project at this status.
    pub actors: &'static [Role],
    /// Roles eligible to receive the project from an assignment here.
    pub receivers: &'static [Role],
    /// Status an assignment moves the project to; `None` keeps it in place.
    pub forward: Option<WorkflowStatus>,
}

pub fn rule(status: WorkflowStatus) -> StatusRule {
    use Role::*;
    use WorkflowStatus::*;

    let r = |actors: &'static [Role], receivers: &'static [Role], forward| StatusRule {
        actors,
        receivers,
        forward,
    };
    match status {
        Intake => r(&[Lead], CS_POOL, Some(AssignedToCs)),
        AssignedToCs => r(&[Cs], &[DesignHead], Some(AssignedToDesignHead)),
        AssignedToDesignHead => r(&[DesignHead], &[Designer], Some(AssignedToDesigner)),
        AssignedToDesigner => r(&[], &[], Some(InDesign)),
        InDesign => r(&[], &[Qc], None),
        DesignComplete => r(&[Qc], &[Qc], None),
        InQc => r(&[Qc], &[], None),
        QcApproved => r(&[], CS_POOL, None),
        QcRevisionNeeded => r(&[], &[Designer], Some(InDesign)),
        SentToClient | RevisionRequested | ClientApproved | Completed => r(&[], &[], None),
    }
}

/// Whether `role` may assign a project that sits at `status`.
pub fn can_assign(status: WorkflowStatus, role: Role) -> bool {
    role.is_admin() || rule(status).actors.contains(&role)
}

/// Roles that make up the assignee pool at `status`.
pub fn receiving_roles(status: WorkflowStatus) -> &'static [Role] {
    rule(status).receivers
}

/// Active users eligible to receive a project at `status`, in input order.
pub fn next_assignees(status: WorkflowStatus, users: &[User]) -> Vec<User> {
    let roles = receiving_roles(status);
    users
        .iter()
        .filter(|u| u.is_active && roles.contains(&u.role))
        .cloned()
        .collect()
}

/// Status an assignment action moves a project to. Statuses without a
/// forward edge are returned unchanged.
pub fn next_status_for_assignment(status: WorkflowStatus) -> WorkflowStatus {
    rule(status).forward.unwrap_or(status)
}

// ---------------------------------------------------------------------------
// Direct status actions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "role", rename_all = "snake_case")]
pub enum Guard {
    /// Actor must hold the role and be the current assignee.
    RoleAndAssignee(Role),
    /// Actor must hold the role or be the current assignee.
    RoleOrAssignee(Role),
}

impl Guard {
    pub fn permits(self, actor: &User, assignee: Option<&str>) -> bool {
        if actor.role.is_admin() {
            return true;
        }
        let is_assignee = assignee == Some(actor.id.as_str());
        match self {
            Guard::RoleAndAssignee(role) => actor.role == role && is_assignee,
            Guard::RoleOrAssignee(role) => actor.role == role || is_assignee,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusAction {
    pub from: WorkflowStatus,
    pub guard: Guard,
    pub targets: &'static [WorkflowStatus],
}

pub const STATUS_ACTIONS: &[StatusAction] = &[
    StatusAction {
        from: WorkflowStatus::AssignedToDesigner,
        guard: Guard::RoleAndAssignee(Role::Designer),
        targets: &[WorkflowStatus::InDesign],
    },
    StatusAction {
        from: WorkflowStatus::InDesign,
        guard: Guard::RoleAndAssignee(Role::Designer),
        targets: &[WorkflowStatus::DesignComplete],
    },
    StatusAction {
        from: WorkflowStatus::DesignComplete,
        guard: Guard::RoleAndAssignee(Role::Qc),
        targets: &[WorkflowStatus::QcApproved, WorkflowStatus::QcRevisionNeeded],
    },
    StatusAction {
        from: WorkflowStatus::QcApproved,
        guard: Guard::RoleAndAssignee(Role::Lead),
        targets: &[WorkflowStatus::SentToClient],
    },
    StatusAction {
        from: WorkflowStatus::SentToClient,
        guard: Guard::RoleAndAssignee(Role::Lead),
        targets: &[WorkflowStatus::ClientApproved, WorkflowStatus::RevisionRequested],
    },
    StatusAction {
        from: WorkflowStatus::ClientApproved,
        guard: Guard::RoleOrAssignee(Role::Lead),
        targets: &[WorkflowStatus::Completed],
    },
];

fn actions_from(status: WorkflowStatus) -> impl Iterator<Item = &'static StatusAction> {
    STATUS_ACTIONS.iter().filter(move |a| a.from == status)
}

/// Statuses `actor` may set directly on `project`, in table order.
pub fn status_targets(project: &Project, actor: &User) -> Vec<WorkflowStatus> {
    let assignee = project.assignee.as_deref();
    let mut targets = Vec::new();
    for action in actions_from(project.status) {
        if action.guard.permits(actor, assignee) {
            for &t in action.targets {
                if !targets.contains(&t) {
                    targets.push(t);
                }
            }
        }
    }
    targets
}

// ---------------------------------------------------------------------------
// Enforcement
// ---------------------------------------------------------------------------

fn terminal_error(project: &Project, to: WorkflowStatus) -> FlowError {
    FlowError::InvalidTransition {
        from: project.status.to_string(),
        to: to.to_string(),
        reason: format!("{} is terminal", project.status),
    }
}

fn unauthorized(project: &Project, actor: &User, action: impl Into<String>) -> FlowError {
    FlowError::Unauthorized {
        actor: actor.id.clone(),
        role: actor.role.to_string(),
        action: action.into(),
        status: project.status.to_string(),
    }
}

/// Validate an assignment of `project` to `assignee` by `actor` and return
/// the status the project moves to.
pub fn authorize_assignment(
    project: &Project,
    actor: &User,
    assignee: &User,
) -> Result<WorkflowStatus> {
    let next = next_status_for_assignment(project.status);
    if project.status.is_terminal() {
        return Err(terminal_error(project, next));
    }
    if !can_assign(project.status, actor.role) {
        return Err(unauthorized(project, actor, "assign"));
    }
    let receivers = receiving_roles(project.status);
    if receivers.is_empty() {
        return Err(FlowError::EmptyAssigneePool(project.status.to_string()));
    }
    if !assignee.is_active || !receivers.contains(&assignee.role) {
        return Err(FlowError::IneligibleAssignee {
            user: assignee.id.clone(),
            role: assignee.role.to_string(),
            status: project.status.to_string(),
        });
    }
    Ok(next)
}

/// Validate a direct status change. Setting the current status again is a
/// touch: it records a step without moving the project, and only Admin or
/// the current assignee may do it.
pub fn authorize_status_update(
    project: &Project,
    actor: &User,
    target: WorkflowStatus,
) -> Result<()> {
    if project.status.is_terminal() {
        return Err(terminal_error(project, target));
    }
    if target == project.status {
        if actor.role.is_admin() || project.is_assigned_to(&actor.id) {
            return Ok(());
        }
        return Err(unauthorized(project, actor, format!("update {target}")));
    }

    let mut matching = actions_from(project.status)
        .filter(|a| a.targets.contains(&target))
        .peekable();
    if matching.peek().is_none() {
        return Err(FlowError::InvalidTransition {
            from: project.status.to_string(),
            to: target.to_string(),
            reason: "no status action leads there".to_string(),
        });
    }
    let assignee = project.assignee.as_deref();
    if matching.any(|a| a.guard.permits(actor, assignee)) {
        Ok(())
    } else {
        Err(unauthorized(project, actor, format!("set status to {target}")))
    }
}

// ---------------------------------------------------------------------------
// Holder roles and integrity
// ---------------------------------------------------------------------------

static HOLDERS: OnceLock<BTreeMap<WorkflowStatus, BTreeSet<Role>>> = OnceLock::new();

fn holders() -> &'static BTreeMap<WorkflowStatus, BTreeSet<Role>> {
    HOLDERS.get_or_init(|| {
        let mut map: BTreeMap<WorkflowStatus, BTreeSet<Role>> = BTreeMap::new();
        loop {
            let mut changed = false;
            // An assignment hands the project to a receiver at the forward status.
            for &from in WorkflowStatus::all() {
                let r = rule(from);
                let to = r.forward.unwrap_or(from);
                let set = map.entry(to).or_default();
                for &role in r.receivers {
                    changed |= set.insert(role);
                }
            }
            // A direct status change keeps whoever held the project.
            for action in STATUS_ACTIONS {
                let src = map.get(&action.from).cloned().unwrap_or_default();
                for &to in action.targets {
                    let set = map.entry(to).or_default();
                    for &role in &src {
                        changed |= set.insert(role);
                    }
                }
            }
            if !changed {
                break map;
            }
        }
    })
}

/// Roles that may legitimately be the assignee of a project at `status`
/// when every write went through this policy.
pub fn holder_roles(status: WorkflowStatus) -> BTreeSet<Role> {
    holders().get(&status).cloned().unwrap_or_default()
}

/// Check that the project's assignee holds a role the policy could have put
/// there. Assignees missing from `users` (deactivated or deleted) cannot be
/// checked and are accepted.
pub fn check_assignee_integrity(project: &Project, users: &[User]) -> Result<()> {
    let Some(assignee_id) = project.assignee.as_deref() else {
        return Ok(());
    };
    let Some(user) = users.iter().find(|u| u.id == assignee_id) else {
        return Ok(());
    };
    if holder_roles(project.status).contains(&user.role) {
        return Ok(());
    }
    Err(FlowError::IntegrityViolation {
        code: project.code.clone(),
        reason: format!(
            "assignee '{}' has role {} which cannot hold a project at {}",
            user.id, user.role, project.status
        ),
    })
}

// ---------------------------------------------------------------------------
// Available actions
// ---------------------------------------------------------------------------

/// An action a UI may offer for a project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    Assign {
        next_status: WorkflowStatus,
        candidates: Vec<User>,
    },
    SetStatus {
        target: WorkflowStatus,
    },
}

/// Actions `actor` may take on `project`. An assignment is only offered when
/// its pool has at least one active user.
pub fn available_actions(project: &Project, actor: &User, users: &[User]) -> Vec<Action> {
    if project.status.is_terminal() {
        return Vec::new();
    }
    let mut actions = Vec::new();
    if can_assign(project.status, actor.role) {
        let candidates = next_assignees(project.status, users);
        if !candidates.is_empty() {
            actions.push(Action::Assign {
                next_status: next_status_for_assignment(project.status),
                candidates,
            });
        }
    }
    actions.extend(
        status_targets(project, actor)
            .into_iter()
            .map(|target| Action::SetStatus { target }),
    );
    actions
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::NewProject;
    use crate::status::WorkflowStatus::*;

    fn project_at(status: WorkflowStatus, assignee: Option<&str>) -> Project {
        let mut p = Project::from_intake(
            "PRJ-2026-001",
            NewProject {
                creative_type: "brochure".into(),
                brief: "tri-fold".into(),
                ..NewProject::default()
            },
        );
        p.status = status;
        p.assignee = assignee.map(str::to_string);
        p
    }

    fn user(id: &str, role: Role) -> User {
        User::new(id, id, format!("{id}@studio.test"), role)
    }

    #[test]
    fn can_assign_table() {
        let allowed = [
            (Intake, Role::Lead),
            (AssignedToCs, Role::Cs),
            (AssignedToDesignHead, Role::DesignHead),
            (DesignComplete, Role::Qc),
            (InQc, Role::Qc),
        ];
        for &status in WorkflowStatus::all() {
            for &role in Role::all() {
                let expected = role == Role::Admin || allowed.contains(&(status, role));
                assert_eq!(can_assign(status, role), expected, "{status} / {role}");
            }
        }
    }

    #[test]
    fn receiving_pools() {
        assert_eq!(receiving_roles(Intake), CS_POOL);
        assert_eq!(receiving_roles(AssignedToCs), &[Role::DesignHead]);
        assert_eq!(receiving_roles(AssignedToDesignHead), &[Role::Designer]);
        assert_eq!(receiving_roles(InDesign), &[Role::Qc]);
        assert_eq!(receiving_roles(DesignComplete), &[Role::Qc]);
        assert_eq!(receiving_roles(QcRevisionNeeded), &[Role::Designer]);
        assert_eq!(receiving_roles(QcApproved), CS_POOL);
        for status in [AssignedToDesigner, InQc, SentToClient, RevisionRequested, ClientApproved, Completed] {
            assert!(receiving_roles(status).is_empty(), "{status}");
        }
    }

    #[test]
    fn next_assignees_filters_inactive_and_roles() {
        let mut gone = user("cs-2", Role::Cs);
        gone.is_active = false;
        let users = vec![user("cs-1", Role::Cs), gone, user("d-1", Role::Designer), user("lead-1", Role::Lead)];
        let pool: Vec<_> = next_assignees(Intake, &users).into_iter().map(|u| u.id).collect();
        assert_eq!(pool, vec!["cs-1", "lead-1"]);
        assert!(next_assignees(SentToClient, &users).is_empty());
    }

    #[test]
    fn forward_map() {
        let defined = [
            (Intake, AssignedToCs),
            (AssignedToCs, AssignedToDesignHead),
            (AssignedToDesignHead, AssignedToDesigner),
            (AssignedToDesigner, InDesign),
            (QcRevisionNeeded, InDesign),
        ];
        for &status in WorkflowStatus::all() {
            let expected = defined
                .iter()
                .find(|(from, _)| *from == status)
                .map(|(_, to)| *to)
                .unwrap_or(status);
            assert_eq!(next_status_for_assignment(status), expected, "{status}");
        }
    }

    #[test]
    fn every_table_edge_is_a_lattice_edge() {
        for &status in WorkflowStatus::all() {
            if let Some(to) = rule(status).forward {
                assert!(status.leads_to(to), "{status} -> {to}");
            }
        }
        for action in STATUS_ACTIONS {
            for &to in action.targets {
                assert!(action.from.leads_to(to), "{} -> {to}", action.from);
            }
        }
    }

    #[test]
    fn nothing_leaves_completed() {
        assert_eq!(next_status_for_assignment(Completed), Completed);
        assert!(STATUS_ACTIONS.iter().all(|a| a.from != Completed));
        let admin = user("root", Role::Admin);
        let p = project_at(Completed, Some("lead-1"));
        assert!(authorize_status_update(&p, &admin, InDesign).is_err());
        assert!(authorize_assignment(&p, &admin, &user("cs-1", Role::Cs)).is_err());
        assert!(available_actions(&p, &admin, &[user("cs-1", Role::Cs)]).is_empty());
    }

    #[test]
    fn assignment_rejects_wrong_actor() {
        let p = project_at(Intake, None);
        let err = authorize_assignment(&p, &user("d-1", Role::Designer), &user("cs-1", Role::Cs))
            .unwrap_err();
        assert!(matches!(err, FlowError::Unauthorized { .. }));
    }

    #[test]
    fn assignment_rejects_assignee_outside_pool() {
        let p = project_at(Intake, None);
        let err = authorize_assignment(&p, &user("lead-1", Role::Lead), &user("qc-1", Role::Qc))
            .unwrap_err();
        assert!(matches!(err, FlowError::IneligibleAssignee { .. }));
    }

    #[test]
    fn assignment_without_pool_is_unavailable() {
        let p = project_at(SentToClient, Some("lead-1"));
        let err = authorize_assignment(&p, &user("root", Role::Admin), &user("cs-1", Role::Cs))
            .unwrap_err();
        assert!(err.is_unavailable());
    }

    #[test]
    fn designer_must_be_assignee_to_complete_design() {
        let p = project_at(InDesign, Some("d-1"));
        authorize_status_update(&p, &user("d-1", Role::Designer), DesignComplete).unwrap();
        let err = authorize_status_update(&p, &user("d-2", Role::Designer), DesignComplete)
            .unwrap_err();
        assert!(matches!(err, FlowError::Unauthorized { .. }));
    }

    #[test]
    fn completion_allows_lead_or_assignee() {
        let p = project_at(ClientApproved, Some("cs-1"));
        authorize_status_update(&p, &user("cs-1", Role::Cs), Completed).unwrap();
        authorize_status_update(&p, &user("lead-9", Role::Lead), Completed).unwrap();
        assert!(authorize_status_update(&p, &user("cs-2", Role::Cs), Completed).is_err());
    }

    #[test]
    fn undefined_status_edge_is_invalid_transition() {
        let p = project_at(InDesign, Some("d-1"));
        let err = authorize_status_update(&p, &user("d-1", Role::Designer), Completed).unwrap_err();
        assert!(matches!(err, FlowError::InvalidTransition { .. }));
    }

    #[test]
    fn touch_requires_admin_or_assignee() {
        let p = project_at(InDesign, Some("d-1"));
        authorize_status_update(&p, &user("d-1", Role::Designer), InDesign).unwrap();
        authorize_status_update(&p, &user("root", Role::Admin), InDesign).unwrap();
        assert!(authorize_status_update(&p, &user("qc-1", Role::Qc), InDesign).is_err());
    }

    #[test]
    fn holder_roles_follow_the_tables() {
        assert!(holder_roles(Intake).is_empty());
        assert_eq!(
            holder_roles(AssignedToCs),
            BTreeSet::from([Role::Lead, Role::Cs])
        );
        assert_eq!(holder_roles(AssignedToDesigner), BTreeSet::from([Role::Designer]));
        assert!(holder_roles(DesignComplete).contains(&Role::Qc));
        assert!(holder_roles(ClientApproved).contains(&Role::Lead));
        assert!(!holder_roles(SentToClient).contains(&Role::DesignHead));
    }

    #[test]
    fn integrity_flags_bypassed_writes() {
        let users = vec![user("dh-1", Role::DesignHead), user("cs-1", Role::Cs)];
        let bad = project_at(SentToClient, Some("dh-1"));
        assert!(matches!(
            check_assignee_integrity(&bad, &users),
            Err(FlowError::IntegrityViolation { .. })
        ));
        let ok = project_at(AssignedToCs, Some("cs-1"));
        check_assignee_integrity(&ok, &users).unwrap();
        let unknown = project_at(SentToClient, Some("former-employee"));
        check_assignee_integrity(&unknown, &users).unwrap();
    }

    #[test]
    fn available_actions_hide_empty_pools() {
        let qc = user("qc-1", Role::Qc);
        let p = project_at(DesignComplete, Some("qc-1"));
        // No other QC user exists besides the actor, who is in the pool.
        let actions = available_actions(&p, &qc, &[qc.clone()]);
        assert!(matches!(actions[0], Action::Assign { .. }));
        assert!(actions.contains(&Action::SetStatus { target: QcApproved }));
        assert!(actions.contains(&Action::SetStatus { target: QcRevisionNeeded }));

        let actions = available_actions(&p, &qc, &[]);
        assert!(actions.iter().all(|a| !matches!(a, Action::Assign { .. })));
    }
}
