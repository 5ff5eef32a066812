use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("not initialized: run 'flowdesk init'")]
    NotInitialized,

    #[error("not signed in: run 'flowdesk login <user-id>'")]
    NotAuthenticated,

    #[error("unauthorized: {actor} ({role}) may not {action} while project is {status}")]
    Unauthorized {
        actor: String,
        role: String,
        action: String,
        status: String,
    },

    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    #[error("no active user can receive a project at status {0}")]
    EmptyAssigneePool(String),

    #[error("user '{user}' ({role}) is not eligible to receive a project at status {status}")]
    IneligibleAssignee {
        user: String,
        role: String,
        status: String,
    },

    #[error("project {code} changed: expected status {expected}, found {actual}; reload and retry")]
    ConcurrentModification {
        code: String,
        expected: String,
        actual: String,
    },

    #[error("a transition on project {0} is already in flight")]
    TransitionInFlight(String),

    #[error("data integrity violation on project {code}: {reason}")]
    IntegrityViolation { code: String, reason: String },

    #[error("persistence failure during {op}: {message}")]
    Persistence { op: String, message: String },

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("notification not found: {0}")]
    NotificationNotFound(String),

    #[error("invalid status: {0}")]
    InvalidStatus(String),

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid project code '{0}': expected PREFIX-YYYY-NNN")]
    InvalidProjectCode(String),

    #[error("project code sequence {0}NNN is exhausted; pass an explicit code")]
    CodeSequenceExhausted(String),

    #[error("invalid user id '{0}': must be non-empty without whitespace")]
    InvalidUserId(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FlowError {
    /// Wrap a backend failure as a `Persistence` error unless it is already a
    /// domain outcome the caller needs to see as-is.
    pub fn into_persistence(self, op: &str) -> FlowError {
        match self {
            FlowError::ProjectNotFound(_)
            | FlowError::ProjectExists(_)
            | FlowError::UserNotFound(_)
            | FlowError::NotificationNotFound(_)
            | FlowError::ConcurrentModification { .. }
            | FlowError::Persistence { .. }
            | FlowError::NotInitialized => self,
            other => FlowError::Persistence {
                op: op.to_string(),
                message: other.to_string(),
            },
        }
    }

    /// True for outcomes a UI renders as "action unavailable" rather than a failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, FlowError::EmptyAssigneePool(_))
    }
}

pub type Result<T> = std::result::Result<T, FlowError>;
