use crate::error::{FlowError, Result};
use crate::role::Role;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

/// An actor in the workflow. Owned by the user-management collaborator; the
/// workflow core only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl User {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        email: impl Into<String>,
        role: Role,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            email: email.into(),
            role,
            is_active: true,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() || self.id.chars().any(char::is_whitespace) {
            return Err(FlowError::InvalidUserId(self.id.clone()));
        }
        validate_email(&self.email)
    }
}

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid regex"))
}

pub fn validate_email(email: &str) -> Result<()> {
    if !email_re().is_match(email) {
        return Err(FlowError::InvalidEmail(email.to_string()));
    }
    Ok(())
}

/// Resolve a user id to a display name within `users`.
pub fn display_name<'a>(users: &'a [User], id: &str) -> Option<&'a str> {
    users.iter().find(|u| u.id == id).map(|u| u.name.as_str())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
