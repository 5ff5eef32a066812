use crate::cmd::Workspace;
use crate::output::{print_json, print_table};
use clap::Subcommand;
use flowdesk_core::backend::NotificationSink;
use flowdesk_core::FlowError;
use std::path::Path;

#[derive(Subcommand)]
pub enum NotifySubcommand {
    /// List your notifications, newest first
    List {
        #[arg(long)]
        unread: bool,
    },
    /// Mark one of your notifications as read
    Read { id: String },
}

pub fn run(root: &Path, subcmd: NotifySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        NotifySubcommand::List { unread } => list(root, unread, json),
        NotifySubcommand::Read { id } => read(root, &id, json),
    }
}

fn list(root: &Path, unread: bool, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let me = ws.actor()?;
    let mut items = ws.backend.list_notifications(&me.id, unread)?;
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    if json {
        return print_json(&items);
    }
    if items.is_empty() {
        println!("No notifications.");
        return Ok(());
    }
    let rows = items
        .iter()
        .map(|n| {
            vec![
                n.id.clone(),
                if n.read { " " } else { "*" }.to_string(),
                n.kind.to_string(),
                n.title.clone(),
                n.message.clone(),
            ]
        })
        .collect();
    print_table(&["ID", "NEW", "KIND", "TITLE", "MESSAGE"], rows);
    Ok(())
}

fn read(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let me = ws.actor()?;
    let mine = ws.backend.list_notifications(&me.id, false)?;
    if !mine.iter().any(|n| n.id == id) {
        return Err(FlowError::NotificationNotFound(id.to_string()).into());
    }
    let n = ws.backend.mark_notification_read(id)?;

    if json {
        print_json(&n)?;
    } else {
        println!("Marked read: {}", n.title);
    }
    Ok(())
}
