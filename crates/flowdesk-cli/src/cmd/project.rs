use crate::cmd::Workspace;
use crate::output::{describe_action, print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use flowdesk_core::backend::{ProjectStore, UserDirectory};
use flowdesk_core::intake;
use flowdesk_core::project::NewProject;
use flowdesk_core::status::WorkflowStatus;
use flowdesk_core::user;
use std::path::Path;

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// Open a project at intake
    Create {
        /// Creative type, e.g. logo, packaging, social-post
        #[arg(long = "type", value_name = "TYPE")]
        creative_type: String,
        #[arg(long)]
        brief: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        client: Option<String>,
        /// Deadline as YYYY-MM-DD
        #[arg(long)]
        deadline: Option<String>,
        /// Explicit code (default: next PREFIX-YEAR-NNN)
        #[arg(long)]
        code: Option<String>,
    },
    /// List projects
    List {
        /// Only projects at this status
        #[arg(long)]
        status: Option<String>,
        /// Only projects assigned to the signed-in user
        #[arg(long)]
        mine: bool,
    },
    /// Show a project and the actions available to you
    Show { code: String },
}

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::Create {
            creative_type,
            brief,
            title,
            client,
            deadline,
            code,
        } => {
            let deadline = deadline
                .as_deref()
                .map(|d| {
                    NaiveDate::parse_from_str(d, "%Y-%m-%d")
                        .with_context(|| format!("invalid deadline '{d}': expected YYYY-MM-DD"))
                })
                .transpose()?;
            let form = NewProject {
                code,
                title,
                creative_type,
                brief,
                client,
                deadline,
            };
            create(root, form, json)
        }
        ProjectSubcommand::List { status, mine } => list(root, status.as_deref(), mine, json),
        ProjectSubcommand::Show { code } => show(root, &code, json),
    }
}

fn create(root: &Path, form: NewProject, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let project = intake::open_project(
        &ws.backend,
        &ws.session(),
        form,
        &ws.config.projects.code_prefix,
    )
    .context("failed to open project")?;

    if json {
        print_json(&project)?;
    } else {
        println!("Opened {}: {}", project.code, project.title);
    }
    Ok(())
}

fn list(root: &Path, status: Option<&str>, mine: bool, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let status = status.map(str::parse::<WorkflowStatus>).transpose()?;
    let me = if mine { Some(ws.actor()?.id) } else { None };

    let projects: Vec<_> = ws
        .backend
        .list_projects()?
        .into_iter()
        .filter(|p| status.map_or(true, |s| p.status == s))
        .filter(|p| me.as_deref().map_or(true, |id| p.is_assigned_to(id)))
        .collect();

    if json {
        return print_json(&projects);
    }
    if projects.is_empty() {
        println!("No projects.");
        return Ok(());
    }
    let users = ws.backend.list_active_users()?;
    let rows = projects
        .iter()
        .map(|p| {
            vec![
                p.code.clone(),
                p.title.clone(),
                p.status.to_string(),
                p.assignee
                    .as_deref()
                    .map(|id| user::display_name(&users, id).unwrap_or(id).to_string())
                    .unwrap_or_else(|| "-".into()),
                p.revision_count.to_string(),
                p.deadline.map(|d| d.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    print_table(
        &["CODE", "TITLE", "STATUS", "ASSIGNEE", "REVISIONS", "DEADLINE"],
        rows,
    );
    Ok(())
}

fn show(root: &Path, code: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let project = ws
        .backend
        .read_project(code)
        .with_context(|| format!("project '{code}' not found"))?;
    let session = ws.session();
    let actions = if session.actor().is_some() {
        ws.workflow().available_actions(&session, code)?
    } else {
        Vec::new()
    };

    if json {
        return print_json(&serde_json::json!({
            "project": project,
            "tone": project.status.tone(),
            "actions": actions,
        }));
    }

    println!("{}  {}", project.code, project.title);
    println!("  type:      {}", project.creative_type);
    if let Some(client) = &project.client {
        println!("  client:    {client}");
    }
    println!(
        "  status:    {} ({})",
        project.status.label(),
        project.status.tone()
    );
    match &project.assignee {
        Some(id) => {
            let name = ws
                .backend
                .find_user(id)
                .map(|u| u.name)
                .unwrap_or_else(|_| id.clone());
            println!("  assignee:  {name}");
        }
        None => println!("  assignee:  -"),
    }
    println!("  revisions: {}", project.revision_count);
    if let Some(deadline) = project.deadline {
        println!("  deadline:  {deadline}");
    }
    println!("  brief:     {}", project.brief);

    if session.actor().is_none() {
        println!("\nSign in to see available actions.");
    } else if actions.is_empty() {
        println!("\nNo actions available to you.");
    } else {
        println!("\nAvailable actions:");
        for action in &actions {
            println!("  {}", describe_action(action));
        }
    }
    Ok(())
}
