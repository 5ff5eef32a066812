use crate::output::print_json;
use anyhow::Context;
use flowdesk_core::file::FileBackend;
use flowdesk_core::paths;
use std::path::Path;

pub fn run(root: &Path, agency: Option<&str>, json: bool) -> anyhow::Result<()> {
    let name = match agency {
        Some(name) => name.to_string(),
        None => root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "agency".to_string()),
    };
    let created = FileBackend::init(root, &name).context("failed to initialize workspace")?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "config_created": created,
        }))?;
    } else if created {
        println!("Initialized flowdesk for '{name}' in {}", root.display());
        println!("  {}", paths::CONFIG_FILE);
        println!("  {}/", paths::PROJECTS_DIR);
        println!("Next: flowdesk user add <id> --name <name> --email <email> --role admin");
    } else {
        println!("Already initialized: {}", paths::config_path(root).display());
    }
    Ok(())
}
