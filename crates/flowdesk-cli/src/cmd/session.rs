use crate::cmd::Workspace;
use crate::output::print_json;
use anyhow::Context;
use std::path::Path;

pub fn login(root: &Path, user_id: &str, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let user = ws
        .backend
        .sign_in(user_id)
        .with_context(|| format!("cannot sign in as '{user_id}'"))?;

    if json {
        print_json(&user)?;
    } else {
        println!("Signed in as {} ({}, {})", user.name, user.id, user.role.label());
    }
    Ok(())
}

pub fn logout(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    ws.backend.sign_out()?;
    if json {
        print_json(&serde_json::json!({ "signed_in": false }))?;
    } else {
        println!("Signed out");
    }
    Ok(())
}

pub fn whoami(root: &Path, json: bool) -> anyhow::Result<()> {
    let ws = Workspace::open(root)?;
    let user = ws.actor()?;
    if json {
        print_json(&user)?;
    } else {
        println!("{} ({}), {}", user.name, user.id, user.role.label());
    }
    Ok(())
}
