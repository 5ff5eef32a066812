pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod file;
pub mod intake;
pub mod io;
pub mod memory;
pub mod notification;
pub mod paths;
pub mod policy;
pub mod project;
pub mod role;
pub mod session;
pub mod status;
pub mod step;
pub mod timeline;
pub mod user;

pub use error::{FlowError, Result};
