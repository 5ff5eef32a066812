use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const FLOWDESK_DIR: &str = ".flowdesk";
pub const PROJECTS_DIR: &str = ".flowdesk/projects";

pub const CONFIG_FILE: &str = ".flowdesk/config.yaml";
pub const USERS_FILE: &str = ".flowdesk/users.yaml";
pub const NOTIFICATIONS_FILE: &str = ".flowdesk/notifications.yaml";
pub const SESSION_FILE: &str = ".flowdesk/session.yaml";
pub const LOCK_FILE: &str = ".flowdesk/write.lock";

pub const MANIFEST_FILE: &str = "manifest.yaml";
pub const STEPS_FILE: &str = "steps.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn flowdesk_dir(root: &Path) -> PathBuf {
    root.join(FLOWDESK_DIR)
}

pub fn projects_dir(root: &Path) -> PathBuf {
    root.join(PROJECTS_DIR)
}

pub fn project_dir(root: &Path, code: &str) -> PathBuf {
    projects_dir(root).join(code)
}

pub fn project_manifest(root: &Path, code: &str) -> PathBuf {
    project_dir(root, code).join(MANIFEST_FILE)
}

pub fn project_steps(root: &Path, code: &str) -> PathBuf {
    project_dir(root, code).join(STEPS_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn users_path(root: &Path) -> PathBuf {
    root.join(USERS_FILE)
}

pub fn notifications_path(root: &Path) -> PathBuf {
    root.join(NOTIFICATIONS_FILE)
}

pub fn session_path(root: &Path) -> PathBuf {
    root.join(SESSION_FILE)
}

pub fn lock_path(root: &Path) -> PathBuf {
    root.join(LOCK_FILE)
}
