use crate::backend::ProjectStore;
use crate::error::{FlowError, Result};
use crate::project::{self, NewProject, Project};
use crate::session::Session;
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;

/// Open a project at `intake`.
///
/// An explicit `new.code` is validated as given; otherwise the next free
/// `{prefix}-{year}-{NNN}` code is generated. The opening step (`from: None`)
/// is written after the project so a failed append leaves a project whose
/// history can be repaired, never a step without a project.
pub fn open_project(
    store: &dyn ProjectStore,
    session: &Session,
    mut new: NewProject,
    prefix: &str,
) -> Result<Project> {
    let actor = session.require_actor()?;
    if !actor.role.is_staff() {
        return Err(FlowError::Unauthorized {
            actor: actor.id.clone(),
            role: actor.role.to_string(),
            action: "open a project".to_string(),
            status: WorkflowStatus::Intake.to_string(),
        });
    }

    let code = match new.code.take() {
        Some(code) => {
            project::validate_code(&code)?;
            code
        }
        None => {
            let existing = store
                .list_projects()
                .map_err(|e| e.into_persistence("list_projects"))?;
            let code = project::next_code(
                prefix,
                project::current_year(),
                existing.iter().map(|p| p.code.as_str()),
            )?;
            project::validate_code(&code)?;
            code
        }
    };

    let project = Project::from_intake(code, new);
    store
        .create_project(&project)
        .map_err(|e| e.into_persistence("create_project"))?;

    let step = WorkflowStep::record(
        &project.code,
        None,
        WorkflowStatus::Intake,
        None,
        &actor.id,
        None,
    );
    if let Err(e) = store.append_workflow_step(&step) {
        tracing::warn!(project = %project.code, error = %e, "failed to record intake step");
    }

    tracing::info!(project = %project.code, by = %actor.id, "project opened");
    Ok(project)
}
