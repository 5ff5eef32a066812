pub mod config;
pub mod init;
pub mod notify;
pub mod pool;
pub mod project;
pub mod session;
pub mod timeline;
pub mod transition;
pub mod user;

use anyhow::Context;
use flowdesk_core::config::Config;
use flowdesk_core::engine::{Workflow, WorkflowOptions};
use flowdesk_core::file::FileBackend;
use flowdesk_core::session::Session;
use flowdesk_core::user::User;
use std::path::Path;

/// An opened workspace: the file backend plus its loaded config.
pub struct Workspace {
    pub backend: FileBackend,
    pub config: Config,
}

impl Workspace {
    pub fn open(root: &Path) -> anyhow::Result<Self> {
        let backend = FileBackend::open(root).context("failed to open workspace")?;
        let config = Config::load(root).context("failed to load config")?;
        Ok(Self { backend, config })
    }

    pub fn session(&self) -> Session {
        Session::resolve(&self.backend)
    }

    /// The signed-in user, or an error telling the operator to log in.
    pub fn actor(&self) -> anyhow::Result<User> {
        Ok(self.session().require_actor()?.clone())
    }

    pub fn workflow(&self) -> Workflow<'_> {
        Workflow::new(&self.backend, &self.backend, &self.backend)
            .with_options(WorkflowOptions::from_config(&self.config))
    }
}
