use flowdesk_core::backend::{NotificationSink, ProjectStore, UserDirectory};
use flowdesk_core::engine::Workflow;
use flowdesk_core::intake::open_project;
use flowdesk_core::memory::MemoryBackend;
use flowdesk_core::notification::NotificationKind;
use flowdesk_core::policy::{self, Action};
use flowdesk_core::project::{NewProject, Project, ProjectPatch};
use flowdesk_core::role::Role;
use flowdesk_core::session::Session;
use flowdesk_core::status::WorkflowStatus;
use flowdesk_core::step::WorkflowStep;
use flowdesk_core::timeline::{project_timeline, verify_history, UNKNOWN_USER};
use flowdesk_core::user::User;
use flowdesk_core::FlowError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Barrier;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn staffed() -> MemoryBackend {
    let b = MemoryBackend::new();
    for (id, name, role) in [
        ("admin", "Ops", Role::Admin),
        ("lead-1", "Meera", Role::Lead),
        ("cs-1", "Ravi", Role::Cs),
        ("dh-1", "Anika", Role::DesignHead),
        ("d-1", "Tomas", Role::Designer),
        ("d-2", "Lea", Role::Designer),
        ("qc-1", "Kiran", Role::Qc),
    ] {
        b.add_user(User::new(id, name, format!("{id}@studio.test"), role))
            .unwrap();
    }
    b
}

fn session(b: &MemoryBackend, id: &str) -> Session {
    Session::new(b.find_user(id).unwrap())
}

fn open(b: &MemoryBackend) -> Project {
    open_project(
        b,
        &session(b, "lead-1"),
        NewProject {
            title: Some("Autumn lookbook".into()),
            creative_type: "print".into(),
            brief: "24 page lookbook".into(),
            ..NewProject::default()
        },
        "PRJ",
    )
    .unwrap()
}

/// Force a project to `status` held by `assignee`, with a matching history
/// entry so the store stays consistent.
fn seed(b: &MemoryBackend, code: &str, status: WorkflowStatus, assignee: &str) {
    let mut p = b.read_project(code).unwrap();
    let from = p.status;
    p.status = status;
    p.assignee = Some(assignee.to_string());
    b.put_project(p);
    b.append_workflow_step(&WorkflowStep::record(
        code,
        Some(from),
        status,
        Some(assignee.to_string()),
        "admin",
        Some("seeded".into()),
    ))
    .unwrap();
}

fn assert_history_consistent(b: &MemoryBackend, code: &str) {
    let project = b.read_project(code).unwrap();
    let steps = b.list_workflow_steps(code).unwrap();
    verify_history(&project, &steps).unwrap();
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn lead_assigns_intake_to_cs() {
    let b = staffed();
    let p = open(&b);
    let wf = Workflow::new(&b, &b, &b);

    let out = wf
        .assign(&session(&b, "lead-1"), &p.code, "cs-1", None)
        .unwrap();

    let stored = b.read_project(&p.code).unwrap();
    assert_eq!(stored.status, WorkflowStatus::AssignedToCs);
    assert_eq!(stored.assignee.as_deref(), Some("cs-1"));

    let steps = b.list_workflow_steps(&p.code).unwrap();
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[1].to, WorkflowStatus::AssignedToCs);
    assert_eq!(steps[1].assigned_by, "lead-1");

    let inbox = b.list_notifications("cs-1", false).unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].kind, NotificationKind::Assignment);
    assert_eq!(out.notification.unwrap().id, inbox[0].id);
    assert_history_consistent(&b, &p.code);
}

#[test]
fn qc_revision_goes_back_to_a_designer() {
    let b = staffed();
    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::DesignComplete, "qc-1");
    let wf = Workflow::new(&b, &b, &b);

    let out = wf
        .update_status(
            &session(&b, "qc-1"),
            &p.code,
            WorkflowStatus::QcRevisionNeeded,
            Some("kerning on p.4".into()),
        )
        .unwrap();
    assert_eq!(out.project.status, WorkflowStatus::QcRevisionNeeded);
    assert_eq!(out.project.revision_count, 1);

    // The QC holder cannot hand the revision on, and a design head is not in
    // the designer pool.
    assert!(matches!(
        wf.assign(&session(&b, "qc-1"), &p.code, "d-1", None),
        Err(FlowError::Unauthorized { .. })
    ));
    assert!(matches!(
        wf.assign(&session(&b, "admin"), &p.code, "dh-1", None),
        Err(FlowError::IneligibleAssignee { .. })
    ));

    let out = wf
        .assign(&session(&b, "admin"), &p.code, "d-2", None)
        .unwrap();
    assert_eq!(out.to, WorkflowStatus::InDesign);
    assert_eq!(out.project.assignee.as_deref(), Some("d-2"));
    assert_history_consistent(&b, &p.code);
}

#[test]
fn completion_is_terminal() {
    let b = staffed();
    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::ClientApproved, "cs-1");
    let wf = Workflow::new(&b, &b, &b);

    let out = wf
        .update_status(&session(&b, "cs-1"), &p.code, WorkflowStatus::Completed, None)
        .unwrap();
    assert_eq!(out.notification.unwrap().kind, NotificationKind::Completion);

    let admin = session(&b, "admin");
    for &target in WorkflowStatus::all() {
        assert!(
            wf.update_status(&admin, &p.code, target, None).is_err(),
            "completed -> {target} must be rejected"
        );
    }
    assert!(wf.assign(&admin, &p.code, "cs-1", None).is_err());
    assert!(wf.available_actions(&admin, &p.code).unwrap().is_empty());
    assert_eq!(
        b.read_project(&p.code).unwrap().status,
        WorkflowStatus::Completed
    );
    assert_history_consistent(&b, &p.code);
}

#[test]
fn lead_can_complete_without_being_assignee() {
    let b = staffed();
    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::ClientApproved, "cs-1");
    let wf = Workflow::new(&b, &b, &b);
    wf.update_status(&session(&b, "lead-1"), &p.code, WorkflowStatus::Completed, None)
        .unwrap();
}

#[test]
fn sent_to_client_has_no_assignee_pool() {
    let b = staffed();
    let wf = Workflow::new(&b, &b, &b);
    assert!(wf
        .next_assignees(WorkflowStatus::SentToClient)
        .unwrap()
        .is_empty());

    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::SentToClient, "lead-1");
    let actions = wf.available_actions(&session(&b, "admin"), &p.code).unwrap();
    assert!(actions.iter().all(|a| !matches!(a, Action::Assign { .. })));
    let err = wf
        .assign(&session(&b, "admin"), &p.code, "cs-1", None)
        .unwrap_err();
    assert!(err.is_unavailable());
}

// ---------------------------------------------------------------------------
// Concurrency
// ---------------------------------------------------------------------------

/// Store wrapper whose reads all meet at a barrier, so every client has read
/// the same status before any of them writes.
struct Lockstep<'a> {
    inner: &'a MemoryBackend,
    barrier: Barrier,
}

impl ProjectStore for Lockstep<'_> {
    fn create_project(&self, project: &Project) -> flowdesk_core::Result<()> {
        self.inner.create_project(project)
    }

    fn read_project(&self, code: &str) -> flowdesk_core::Result<Project> {
        let p = self.inner.read_project(code)?;
        self.barrier.wait();
        Ok(p)
    }

    fn list_projects(&self) -> flowdesk_core::Result<Vec<Project>> {
        self.inner.list_projects()
    }

    fn update_project(
        &self,
        code: &str,
        expected: WorkflowStatus,
        patch: &ProjectPatch,
    ) -> flowdesk_core::Result<Project> {
        self.inner.update_project(code, expected, patch)
    }

    fn append_workflow_step(&self, step: &WorkflowStep) -> flowdesk_core::Result<()> {
        self.inner.append_workflow_step(step)
    }

    fn list_workflow_steps(&self, code: &str) -> flowdesk_core::Result<Vec<WorkflowStep>> {
        self.inner.list_workflow_steps(code)
    }
}

#[test]
fn concurrent_qc_verdicts_exactly_one_wins() {
    let b = staffed();
    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::DesignComplete, "qc-1");
    let store = Lockstep {
        inner: &b,
        barrier: Barrier::new(2),
    };
    let qc = session(&b, "qc-1");

    let results: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = [WorkflowStatus::QcApproved, WorkflowStatus::QcRevisionNeeded]
            .into_iter()
            .map(|target| {
                let (store, b, qc, code) = (&store, &b, &qc, p.code.as_str());
                s.spawn(move || {
                    // Separate engines: two clients, one shared store.
                    let wf = Workflow::new(store, b, b);
                    wf.update_status(qc, code, target, None)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(FlowError::ConcurrentModification { .. })))
        .count();
    assert_eq!((wins, conflicts), (1, 1));

    let winner = results.into_iter().find_map(|r| r.ok()).unwrap();
    assert_eq!(b.read_project(&p.code).unwrap().status, winner.to);
    assert_history_consistent(&b, &p.code);
}

/// Store wrapper that parks the first read until released.
struct Gate<'a> {
    inner: &'a MemoryBackend,
    armed: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl ProjectStore for Gate<'_> {
    fn create_project(&self, project: &Project) -> flowdesk_core::Result<()> {
        self.inner.create_project(project)
    }

    fn read_project(&self, code: &str) -> flowdesk_core::Result<Project> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.wait();
            self.release.wait();
        }
        self.inner.read_project(code)
    }

    fn list_projects(&self) -> flowdesk_core::Result<Vec<Project>> {
        self.inner.list_projects()
    }

    fn update_project(
        &self,
        code: &str,
        expected: WorkflowStatus,
        patch: &ProjectPatch,
    ) -> flowdesk_core::Result<Project> {
        self.inner.update_project(code, expected, patch)
    }

    fn append_workflow_step(&self, step: &WorkflowStep) -> flowdesk_core::Result<()> {
        self.inner.append_workflow_step(step)
    }

    fn list_workflow_steps(&self, code: &str) -> flowdesk_core::Result<Vec<WorkflowStep>> {
        self.inner.list_workflow_steps(code)
    }
}

#[test]
fn second_submission_while_in_flight_is_refused() {
    let b = staffed();
    let p = open(&b);
    let gate = Gate {
        inner: &b,
        armed: AtomicBool::new(true),
        entered: Barrier::new(2),
        release: Barrier::new(2),
    };
    let wf = Workflow::new(&gate, &b, &b);
    let lead = session(&b, "lead-1");

    std::thread::scope(|s| {
        let first = s.spawn(|| wf.assign(&lead, &p.code, "cs-1", None));
        gate.entered.wait();
        assert!(matches!(
            wf.assign(&lead, &p.code, "cs-1", None),
            Err(FlowError::TransitionInFlight(_))
        ));
        gate.release.wait();
        first.join().unwrap().unwrap();
    });

    // Slot released: the next transition on the project goes through.
    wf.assign(&session(&b, "cs-1"), &p.code, "dh-1", None)
        .unwrap();
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn repeated_touch_only_appends() {
    let b = staffed();
    let p = open(&b);
    seed(&b, &p.code, WorkflowStatus::InDesign, "d-1");
    let wf = Workflow::new(&b, &b, &b);
    let designer = session(&b, "d-1");
    let before = b.list_workflow_steps(&p.code).unwrap().len();

    for i in 0..3 {
        let out = wf
            .update_status(&designer, &p.code, WorkflowStatus::InDesign, Some(format!("draft {i}")))
            .unwrap();
        assert_eq!(out.project.status, WorkflowStatus::InDesign);
        assert_eq!(out.project.assignee.as_deref(), Some("d-1"));
    }

    assert_eq!(b.list_workflow_steps(&p.code).unwrap().len(), before + 3);
    assert_eq!(b.list_notifications("d-1", false).unwrap().len(), 3);
    assert_history_consistent(&b, &p.code);
}

#[test]
fn full_pipeline_keeps_history_consistent() {
    let b = staffed();
    let p = open(&b);
    let code = p.code.as_str();
    let wf = Workflow::new(&b, &b, &b);

    wf.assign(&session(&b, "lead-1"), code, "cs-1", None).unwrap();
    wf.assign(&session(&b, "cs-1"), code, "dh-1", None).unwrap();
    wf.assign(&session(&b, "dh-1"), code, "d-1", None).unwrap();
    assert_history_consistent(&b, code);

    let designer = session(&b, "d-1");
    wf.update_status(&designer, code, WorkflowStatus::InDesign, None).unwrap();
    wf.update_status(&designer, code, WorkflowStatus::DesignComplete, None).unwrap();
    assert_history_consistent(&b, code);

    let qc = session(&b, "qc-1");
    wf.assign(&qc, code, "qc-1", Some("picking this up".into())).unwrap();
    wf.update_status(&qc, code, WorkflowStatus::QcApproved, None).unwrap();
    wf.assign(&session(&b, "admin"), code, "lead-1", None).unwrap();

    let lead = session(&b, "lead-1");
    for target in [
        WorkflowStatus::SentToClient,
        WorkflowStatus::ClientApproved,
        WorkflowStatus::Completed,
    ] {
        wf.update_status(&lead, code, target, None).unwrap();
        assert_history_consistent(&b, code);
    }

    let timeline = project_timeline(&b, &b, code).unwrap();
    let visited: Vec<_> = timeline.iter().map(|e| e.to).collect();
    assert_eq!(
        visited,
        vec![
            WorkflowStatus::Intake,
            WorkflowStatus::AssignedToCs,
            WorkflowStatus::AssignedToDesignHead,
            WorkflowStatus::AssignedToDesigner,
            WorkflowStatus::InDesign,
            WorkflowStatus::DesignComplete,
            WorkflowStatus::DesignComplete,
            WorkflowStatus::QcApproved,
            WorkflowStatus::QcApproved,
            WorkflowStatus::SentToClient,
            WorkflowStatus::ClientApproved,
            WorkflowStatus::Completed,
        ]
    );
    // Every table edge the project took is a lattice edge.
    for entry in &timeline {
        if let Some(from) = entry.from {
            assert!(from == entry.to || from.leads_to(entry.to));
        }
    }
}

#[test]
fn timeline_degrades_for_deactivated_actors() {
    let b = staffed();
    let p = open(&b);
    let wf = Workflow::new(&b, &b, &b);
    wf.assign(&session(&b, "lead-1"), &p.code, "cs-1", None).unwrap();
    b.deactivate_user("cs-1").unwrap();

    let timeline = project_timeline(&b, &b, &p.code).unwrap();
    assert_eq!(timeline[1].assigned_by_name, "Meera");
    assert_eq!(timeline[1].assigned_to_name.as_deref(), Some(UNKNOWN_USER));
}

#[test]
fn audit_and_notification_failures_do_not_roll_back() {
    let b = staffed();
    let p = open(&b);
    b.faults.append_step.store(true, Ordering::SeqCst);
    b.faults.create_notification.store(true, Ordering::SeqCst);
    let wf = Workflow::new(&b, &b, &b);

    let out = wf
        .assign(&session(&b, "lead-1"), &p.code, "cs-1", None)
        .unwrap();
    assert!(out.step.is_none());
    assert!(out.notification.is_none());
    assert_eq!(
        b.read_project(&p.code).unwrap().status,
        WorkflowStatus::AssignedToCs
    );
    assert!(b.all_notifications().is_empty());
}

#[test]
fn can_assign_is_false_off_table() {
    let listed = [
        (WorkflowStatus::Intake, Role::Lead),
        (WorkflowStatus::AssignedToCs, Role::Cs),
        (WorkflowStatus::AssignedToDesignHead, Role::DesignHead),
        (WorkflowStatus::DesignComplete, Role::Qc),
        (WorkflowStatus::InQc, Role::Qc),
    ];
    for &status in WorkflowStatus::all() {
        for &role in Role::all() {
            if role != Role::Admin && !listed.contains(&(status, role)) {
                assert!(!policy::can_assign(status, role), "{status} / {role}");
            }
        }
    }
}
