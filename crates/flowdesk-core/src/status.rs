use crate::error::FlowError;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// WorkflowStatus
// ---------------------------------------------------------------------------

/// A stage in the project pipeline. Declaration order is pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowStatus {
    Intake,
    AssignedToCs,
    AssignedToDesignHead,
    AssignedToDesigner,
    InDesign,
    DesignComplete,
    InQc,
    QcApproved,
    QcRevisionNeeded,
    SentToClient,
    RevisionRequested,
    ClientApproved,
    Completed,
}

impl WorkflowStatus {
    pub fn all() -> &'static [WorkflowStatus] {
        &[
            WorkflowStatus::Intake,
            WorkflowStatus::AssignedToCs,
            WorkflowStatus::AssignedToDesignHead,
            WorkflowStatus::AssignedToDesigner,
            WorkflowStatus::InDesign,
            WorkflowStatus::DesignComplete,
            WorkflowStatus::InQc,
            WorkflowStatus::QcApproved,
            WorkflowStatus::QcRevisionNeeded,
            WorkflowStatus::SentToClient,
            WorkflowStatus::RevisionRequested,
            WorkflowStatus::ClientApproved,
            WorkflowStatus::Completed,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            WorkflowStatus::Intake => "intake",
            WorkflowStatus::AssignedToCs => "assigned-to-cs",
            WorkflowStatus::AssignedToDesignHead => "assigned-to-design-head",
            WorkflowStatus::AssignedToDesigner => "assigned-to-designer",
            WorkflowStatus::InDesign => "in-design",
            WorkflowStatus::DesignComplete => "design-complete",
            WorkflowStatus::InQc => "in-qc",
            WorkflowStatus::QcApproved => "qc-approved",
            WorkflowStatus::QcRevisionNeeded => "qc-revision-needed",
            WorkflowStatus::SentToClient => "sent-to-client",
            WorkflowStatus::RevisionRequested => "revision-requested",
            WorkflowStatus::ClientApproved => "client-approved",
            WorkflowStatus::Completed => "completed",
        }
    }

    /// Display label: separators become spaces and each word is capitalized,
    /// so `assigned-to-cs` reads "Assigned To Cs".
    pub fn label(self) -> String {
        self.as_str()
            .split(|c: char| c == '-' || c == '_')
            .filter(|w| !w.is_empty())
            .map(|w| {
                let mut chars = w.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn tone(self) -> StatusTone {
        match self {
            WorkflowStatus::Intake => StatusTone::Neutral,
            WorkflowStatus::AssignedToCs
            | WorkflowStatus::AssignedToDesignHead
            | WorkflowStatus::AssignedToDesigner => StatusTone::Info,
            WorkflowStatus::InDesign | WorkflowStatus::InQc | WorkflowStatus::SentToClient => {
                StatusTone::Warning
            }
            WorkflowStatus::DesignComplete
            | WorkflowStatus::QcApproved
            | WorkflowStatus::ClientApproved
            | WorkflowStatus::Completed => StatusTone::Success,
            WorkflowStatus::QcRevisionNeeded | WorkflowStatus::RevisionRequested => {
                StatusTone::Danger
            }
        }
    }

    pub fn is_terminal(self) -> bool {
        self == WorkflowStatus::Completed
    }

    /// Statuses that count as a rework loop when entered.
    pub fn is_revision(self) -> bool {
        matches!(
            self,
            WorkflowStatus::QcRevisionNeeded | WorkflowStatus::RevisionRequested
        )
    }

    /// Edges of the status lattice. This is the structural shape of the
    /// pipeline; who may walk an edge is decided in `policy`.
    pub fn successors(self) -> &'static [WorkflowStatus] {
        use WorkflowStatus::*;
        match self {
            Intake => &[AssignedToCs],
            AssignedToCs => &[AssignedToDesignHead],
            AssignedToDesignHead => &[AssignedToDesigner],
            AssignedToDesigner => &[InDesign],
            InDesign => &[DesignComplete],
            DesignComplete => &[InQc, QcApproved, QcRevisionNeeded],
            InQc => &[QcApproved],
            QcApproved => &[SentToClient, QcRevisionNeeded],
            QcRevisionNeeded => &[InDesign],
            SentToClient => &[ClientApproved, RevisionRequested],
            RevisionRequested => &[InDesign],
            ClientApproved => &[Completed],
            Completed => &[],
        }
    }

    pub fn leads_to(self, target: WorkflowStatus) -> bool {
        self.successors().contains(&target)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        WorkflowStatus::all()
            .iter()
            .copied()
            .find(|st| st.as_str() == normalized)
            .ok_or_else(|| FlowError::InvalidStatus(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// StatusTone
// ---------------------------------------------------------------------------

/// Color/urgency bucket used when rendering a status badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusTone {
    Neutral,
    Info,
    Warning,
    Success,
    Danger,
}

impl fmt::Display for StatusTone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StatusTone::Neutral => "neutral",
            StatusTone::Info => "info",
            StatusTone::Warning => "warning",
            StatusTone::Success => "success",
            StatusTone::Danger => "danger",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
