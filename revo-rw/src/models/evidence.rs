//! Evidence items: the per-return photo capture checklist
//!
//! One `EvidenceItem` exists per photo step of the selected return reason.
//! An item is immutable once captured; re-capture replaces the item with a
//! fresh one rather than mutating it in place. A skip is recorded explicitly
//! so downstream analysis can distinguish "declined" from "never attempted".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a capture step is supposed to show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureTarget {
    Overview,
    Damage,
    Label,
    Closeup,
}

impl std::fmt::Display for CaptureTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureTarget::Overview => write!(f, "overview"),
            CaptureTarget::Damage => write!(f, "damage"),
            CaptureTarget::Label => write!(f, "label"),
            CaptureTarget::Closeup => write!(f, "closeup"),
        }
    }
}

/// Completion state of one evidence item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum EvidenceStatus {
    /// Not yet attempted
    Pending,
    /// Photo captured and uploaded to the backend
    Captured {
        upload_id: String,
        at: DateTime<Utc>,
    },
    /// Explicitly declined by the user
    Skipped { at: DateTime<Utc> },
}

/// One required-or-optional photo capture belonging to a single return
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub id: Uuid,
    /// Stable step identifier from the reason's photo checklist
    pub step_id: String,
    pub target: CaptureTarget,
    pub instruction: String,
    pub required: bool,
    pub status: EvidenceStatus,
}

impl EvidenceItem {
    pub fn new(step_id: &str, target: CaptureTarget, instruction: &str, required: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            step_id: step_id.to_string(),
            target,
            instruction: instruction.to_string(),
            required,
            status: EvidenceStatus::Pending,
        }
    }

    /// True once the item no longer blocks completion: captured or skipped.
    pub fn is_resolved(&self) -> bool {
        !matches!(self.status, EvidenceStatus::Pending)
    }

    pub fn is_captured(&self) -> bool {
        matches!(self.status, EvidenceStatus::Captured { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.status, EvidenceStatus::Skipped { .. })
    }
}
