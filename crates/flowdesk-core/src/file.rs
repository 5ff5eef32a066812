//! File-backed implementation of the collaborator traits.
//!
//! Layout:
//!
//! ```text
//! .flowdesk/config.yaml                     agency configuration
//! .flowdesk/users.yaml                      user directory
//! .flowdesk/session.yaml                    signed-in user (local, gitignored)
//! .flowdesk/notifications.yaml              all notifications
//! .flowdesk/write.lock                      advisory lock for writers
//! .flowdesk/projects/<CODE>/manifest.yaml   project record
//! .flowdesk/projects/<CODE>/steps.yaml      append-only workflow steps
//! ```
//!
//! Every write goes through a temp-file rename. Read-check-write sequences
//! (the status compare-and-swap in particular) hold an exclusive advisory
//! lock on `write.lock`, so they are atomic across processes sharing a
//! workspace. An in-process mutex orders threads of one `FileBackend` before
//! they reach the file lock.

use crate::backend::{ActorSource, NotificationSink, ProjectStore, UserDirectory};
use crate::config::Config;
use crate::error::{FlowError, Result};
use crate::io;
use crate::notification::{NewNotification, Notification};
use crate::paths;
use crate::project::{self, Project, ProjectPatch};
use crate::status::WorkflowStatus;
use crate::step::WorkflowStep;
use crate::user::User;
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    user_id: String,
}

/// Held for the duration of one read-check-write. Dropping it closes the
/// lock file, which releases the advisory lock.
struct WriteGuard<'a> {
    _file: File,
    _thread: MutexGuard<'a, ()>,
}

#[derive(Debug)]
pub struct FileBackend {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileBackend {
    /// Open an initialized workspace.
    pub fn open(root: &Path) -> Result<Self> {
        if !paths::config_path(root).exists() {
            return Err(FlowError::NotInitialized);
        }
        Ok(Self::at(root))
    }

    /// Create the directory tree and a default config. Idempotent: an
    /// existing config is left untouched. Returns whether a config was written.
    pub fn init(root: &Path, agency_name: &str) -> Result<bool> {
        io::ensure_dir(&paths::projects_dir(root))?;
        let cfg = Config::new(agency_name);
        let data = serde_yaml::to_string(&cfg)?;
        let written = io::write_if_missing(&paths::config_path(root), data.as_bytes())?;
        io::ensure_gitignore_entry(root, paths::SESSION_FILE)?;
        io::ensure_gitignore_entry(root, paths::LOCK_FILE)?;
        Ok(written)
    }

    fn at(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn lock(&self) -> Result<WriteGuard<'_>> {
        let thread = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let path = paths::lock_path(&self.root);
        io::ensure_dir(&paths::flowdesk_dir(&self.root))?;
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)?;
        file.lock_exclusive()?;
        Ok(WriteGuard {
            _file: file,
            _thread: thread,
        })
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    pub fn list_all_users(&self) -> Result<Vec<User>> {
        io::read_yaml_list(&paths::users_path(&self.root))
    }

    pub fn add_user(&self, user: User) -> Result<()> {
        user.validate()?;
        let _guard = self.lock()?;
        let mut users = self.list_all_users()?;
        if users.iter().any(|u| u.id == user.id) {
            return Err(FlowError::UserExists(user.id));
        }
        users.push(user);
        io::write_yaml(&paths::users_path(&self.root), &users)
    }

    pub fn deactivate_user(&self, id: &str) -> Result<User> {
        let _guard = self.lock()?;
        let mut users = self.list_all_users()?;
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| FlowError::UserNotFound(id.to_string()))?;
        user.is_active = false;
        let updated = user.clone();
        io::write_yaml(&paths::users_path(&self.root), &users)?;
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Session
    // -----------------------------------------------------------------------

    pub fn sign_in(&self, user_id: &str) -> Result<User> {
        let user = self.find_user(user_id)?;
        if !user.is_active {
            return Err(FlowError::NotAuthenticated);
        }
        io::write_yaml(
            &paths::session_path(&self.root),
            &SessionFile {
                user_id: user.id.clone(),
            },
        )?;
        Ok(user)
    }

    pub fn sign_out(&self) -> Result<()> {
        let path = paths::session_path(&self.root);
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }

    fn signed_in_id(&self) -> Result<Option<String>> {
        let path = paths::session_path(&self.root);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(path)?;
        let session: SessionFile = serde_yaml::from_str(&data)?;
        Ok(Some(session.user_id))
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    fn load_notifications(&self) -> Result<Vec<Notification>> {
        io::read_yaml_list(&paths::notifications_path(&self.root))
    }

    fn save_notifications(&self, items: &[Notification]) -> Result<()> {
        io::write_yaml(&paths::notifications_path(&self.root), items)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    fn save_project(&self, project: &Project) -> Result<()> {
        io::write_yaml(&paths::project_manifest(&self.root, &project.code), project)
    }
}

impl ActorSource for FileBackend {
    fn current_actor(&self) -> Option<User> {
        let id = match self.signed_in_id() {
            Ok(Some(id)) => id,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "unreadable session file");
                return None;
            }
        };
        match self.find_user(&id) {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::warn!(user = %id, error = %e, "signed-in user not in directory");
                None
            }
        }
    }
}

impl UserDirectory for FileBackend {
    fn list_active_users(&self) -> Result<Vec<User>> {
        Ok(self
            .list_all_users()?
            .into_iter()
            .filter(|u| u.is_active)
            .collect())
    }

    fn find_user(&self, id: &str) -> Result<User> {
        self.list_all_users()?
            .into_iter()
            .find(|u| u.id == id)
            .ok_or_else(|| FlowError::UserNotFound(id.to_string()))
    }
}

impl ProjectStore for FileBackend {
    fn create_project(&self, project: &Project) -> Result<()> {
        project::validate_code(&project.code)?;
        let _guard = self.lock()?;
        if paths::project_manifest(&self.root, &project.code).exists() {
            return Err(FlowError::ProjectExists(project.code.clone()));
        }
        self.save_project(project)
    }

    fn read_project(&self, code: &str) -> Result<Project> {
        // Codes become path components; anything malformed cannot exist.
        if project::validate_code(code).is_err() {
            return Err(FlowError::ProjectNotFound(code.to_string()));
        }
        let manifest = paths::project_manifest(&self.root, code);
        if !manifest.exists() {
            return Err(FlowError::ProjectNotFound(code.to_string()));
        }
        let data = std::fs::read_to_string(&manifest)?;
        Ok(serde_yaml::from_str(&data)?)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        let dir = paths::projects_dir(&self.root);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut projects = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                let code = entry.file_name().to_string_lossy().into_owned();
                match self.read_project(&code) {
                    Ok(p) => projects.push(p),
                    Err(FlowError::ProjectNotFound(_)) => {}
                    Err(e) => return Err(e),
                }
            }
        }
        projects.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(projects)
    }

    fn update_project(
        &self,
        code: &str,
        expected: WorkflowStatus,
        patch: &ProjectPatch,
    ) -> Result<Project> {
        let _guard = self.lock()?;
        let mut project = self.read_project(code)?;
        if project.status != expected {
            return Err(FlowError::ConcurrentModification {
                code: code.to_string(),
                expected: expected.to_string(),
                actual: project.status.to_string(),
            });
        }
        project.apply(patch);
        self.save_project(&project)?;
        Ok(project)
    }

    fn append_workflow_step(&self, step: &WorkflowStep) -> Result<()> {
        let _guard = self.lock()?;
        let path = paths::project_steps(&self.root, &step.project_code);
        let mut steps: Vec<WorkflowStep> = io::read_yaml_list(&path)?;
        steps.push(step.clone());
        io::write_yaml(&path, &steps)
    }

    fn list_workflow_steps(&self, code: &str) -> Result<Vec<WorkflowStep>> {
        if project::validate_code(code).is_err() {
            return Ok(Vec::new());
        }
        io::read_yaml_list(&paths::project_steps(&self.root, code))
    }
}

impl NotificationSink for FileBackend {
    fn create_notification(&self, notification: NewNotification) -> Result<Notification> {
        let _guard = self.lock()?;
        let mut items = self.load_notifications()?;
        let issued = Notification::issue(notification);
        items.push(issued.clone());
        self.save_notifications(&items)?;
        Ok(issued)
    }

    fn list_notifications(&self, user_id: &str, unread_only: bool) -> Result<Vec<Notification>> {
        Ok(self
            .load_notifications()?
            .into_iter()
            .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
            .collect())
    }

    fn mark_notification_read(&self, id: &str) -> Result<Notification> {
        let _guard = self.lock()?;
        let mut items = self.load_notifications()?;
        let n = items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| FlowError::NotificationNotFound(id.to_string()))?;
        n.read = true;
        let updated = n.clone();
        self.save_notifications(&items)?;
        Ok(updated)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
