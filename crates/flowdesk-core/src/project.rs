use crate::error::{FlowError, Result};
use crate::status::WorkflowStatus;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub code: String,
    pub title: String,
    pub creative_type: String,
    pub brief: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub status: WorkflowStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub revision_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// A freshly intaken project: status `intake`, nobody assigned.
    pub fn from_intake(code: impl Into<String>, new: NewProject) -> Self {
        let now = Utc::now();
        let title = new
            .title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| new.creative_type.clone());
        Self {
            code: code.into(),
            title,
            creative_type: new.creative_type,
            brief: new.brief,
            client: new.client,
            deadline: new.deadline,
            status: WorkflowStatus::Intake,
            assignee: None,
            revision_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_assigned_to(&self, user_id: &str) -> bool {
        self.assignee.as_deref() == Some(user_id)
    }

    /// Apply a patch in place. Callers that need compare-and-swap check the
    /// status before calling this.
    pub fn apply(&mut self, patch: &ProjectPatch) {
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(assignee) = &patch.assignee {
            self.assignee = assignee.clone();
        }
        if let Some(count) = patch.revision_count {
            self.revision_count = self.revision_count.max(count);
        }
        self.updated_at = Utc::now();
    }
}

// ---------------------------------------------------------------------------
// NewProject
// ---------------------------------------------------------------------------

/// Intake form payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    pub creative_type: String,
    pub brief: String,
    #[serde(default)]
    pub client: Option<String>,
    #[serde(default)]
    pub deadline: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// ProjectPatch
// ---------------------------------------------------------------------------

/// The workflow-owned fields of a project. `None` leaves a field untouched;
/// `assignee: Some(None)` clears the assignee.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkflowStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision_count: Option<u32>,
}

impl ProjectPatch {
    pub fn status(status: WorkflowStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn with_assignee(mut self, user_id: impl Into<String>) -> Self {
        self.assignee = Some(Some(user_id.into()));
        self
    }

    pub fn with_revision_count(mut self, count: u32) -> Self {
        self.revision_count = Some(count);
        self
    }
}

// ---------------------------------------------------------------------------
// Project codes
// ---------------------------------------------------------------------------

static CODE_RE: OnceLock<Regex> = OnceLock::new();
static PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn code_re() -> &'static Regex {
    CODE_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]*-[0-9]{4}-[0-9]{3,}$").unwrap())
}

fn prefix_re() -> &'static Regex {
    PREFIX_RE.get_or_init(|| Regex::new(r"^[A-Z][A-Z0-9]{0,9}$").unwrap())
}

pub fn validate_code(code: &str) -> Result<()> {
    if code.len() > 32 || !code_re().is_match(code) {
        return Err(FlowError::InvalidProjectCode(code.to_string()));
    }
    Ok(())
}

pub fn is_valid_prefix(prefix: &str) -> bool {
    prefix_re().is_match(prefix)
}

/// Next free code `{prefix}-{year}-{NNN}` given the codes already in use.
/// Sequence numbers restart every year. Fails once the year's highest
/// sequence number cannot be incremented.
pub fn next_code<'a>(
    prefix: &str,
    year: i32,
    existing: impl IntoIterator<Item = &'a str>,
) -> Result<String> {
    let stem = format!("{prefix}-{year:04}-");
    let max = existing
        .into_iter()
        .filter_map(|c| c.strip_prefix(&stem))
        .filter_map(|seq| seq.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    let next = max
        .checked_add(1)
        .ok_or_else(|| FlowError::CodeSequenceExhausted(stem.clone()))?;
    Ok(format!("{stem}{next:03}"))
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
