use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// The single permission axis of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Lead,
    Cs,
    DesignHead,
    Designer,
    Qc,
    ClientServing,
    Client,
}

impl Role {
    pub fn all() -> &'static [Role] {
        &[
            Role::Admin,
            Role::Lead,
            Role::Cs,
            Role::DesignHead,
            Role::Designer,
            Role::Qc,
            Role::ClientServing,
            Role::Client,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Lead => "lead",
            Role::Cs => "cs",
            Role::DesignHead => "design_head",
            Role::Designer => "designer",
            Role::Qc => "qc",
            Role::ClientServing => "client_serving",
            Role::Client => "client",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Lead => "Sr. CS / Lead",
            Role::Cs => "CS",
            Role::DesignHead => "Design Head",
            Role::Designer => "Designer",
            Role::Qc => "QC",
            Role::ClientServing => "Client Serving",
            Role::Client => "Client",
        }
    }

    /// Super-role: passes every transition guard.
    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }

    /// Internal agency staff, as opposed to the client.
    pub fn is_staff(self) -> bool {
        self != Role::Client
    }

    pub fn can_manage_users(self) -> bool {
        self == Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "admin" => Ok(Role::Admin),
            "lead" | "sr_cs" | "srcs" => Ok(Role::Lead),
            "cs" => Ok(Role::Cs),
            "design_head" | "designhead" => Ok(Role::DesignHead),
            "designer" => Ok(Role::Designer),
            "qc" => Ok(Role::Qc),
            "client_serving" => Ok(Role::ClientServing),
            "client" => Ok(Role::Client),
            _ => Err(FlowError::InvalidRole(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
