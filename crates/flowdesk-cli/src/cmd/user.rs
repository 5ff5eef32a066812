use crate::cmd::Workspace;
use crate::output::{print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use flowdesk_core::role::Role;
use flowdesk_core::user::User;
use std::path::Path;

#[derive(Subcommand)]
pub enum UserSubcommand {
    /// Add a user to the directory
    Add {
        id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// admin, lead, cs, design-head, designer, qc, client-serving, client
        #[arg(long)]
        role: String,
    },
    /// List users
    List {
        /// Include deactivated users
        #[arg(long)]
        all: bool,
    },
    /// Deactivate a user; they drop out of every assignee pool
    Deactivate { id: String },
}

pub fn run(root: &Path, subcmd: UserSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        UserSubcommand::Add {
            id,
            name,
            email,
            role,
        } => add(root, &id, &name, &email, &role, json),
        UserSubcommand::List { all } => list(root, all, json),
        UserSubcommand::Deactivate { id } => deactivate(root, &id, json),
    }
}

/// User management is Admin-only once the directory has anyone in it; the
/// very first user can be added without signing in.
fn require_manager(ws: &Workspace) -> anyhow::Result<()> {
    if ws.backend.list_all_users()?.is_empty() {
        return Ok(());
    }
    let actor = ws.actor()?;
    if !actor.role.can_manage_users() {
        anyhow::bail!(
            "{} ({}) may not manage users; sign in as an admin",
            actor.id,
            actor.role
        );
    }
    Ok(())
}

fn add(
    root: &Path,
    id: &str,
    name: &str,
    email: &str,
    role: &str,
    json: bool,
) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    require_manager(&ws)?;
    let role: Role = role.parse()?;
    let user = User::new(id, name, email, role);
    ws.backend
        .add_user(user.clone())
        .with_context(|| format!("failed to add user '{id}'"))?;

    if json {
        print_json(&user)?;
    } else {
        println!("Added {} ({}) as {}", user.name, user.id, user.role.label());
    }
    Ok(())
}

fn list(root: &Path, all: bool, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let users: Vec<User> = ws
        .backend
        .list_all_users()?
        .into_iter()
        .filter(|u| all || u.is_active)
        .collect();

    if json {
        return print_json(&users);
    }
    if users.is_empty() {
        println!("No users.");
        return Ok(());
    }
    let rows = users
        .iter()
        .map(|u| {
            vec![
                u.id.clone(),
                u.name.clone(),
                u.email.clone(),
                u.role.to_string(),
                if u.is_active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "NAME", "EMAIL", "ROLE", "ACTIVE"], rows);
    Ok(())
}

fn deactivate(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    require_manager(&ws)?;
    let user = ws
        .backend
        .deactivate_user(id)
        .with_context(|| format!("failed to deactivate '{id}'"))?;

    if json {
        print_json(&user)?;
    } else {
        println!("Deactivated {} ({})", user.name, user.id);
    }
    Ok(())
}
