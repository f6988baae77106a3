//! Return workflow state machine
//!
//! A return progresses through:
//! INITIATED → REASON_SELECTED → CAPTURING → ANALYZING →
//! {APPROVED | REJECTED | REVIEW} → COMPLETED
//!
//! Transitions are monotonic forward with two exceptions: an explicit
//! reset from ANALYZING back to CAPTURING (failed or cancelled submission,
//! full resubmission required) and cancellation from any non-terminal
//! state. Cancellation preserves all captured data for audit.

use crate::models::analysis::AnalysisResult;
use crate::models::evidence::EvidenceItem;
use crate::models::product::Product;
use crate::models::reason::ReturnReason;
use chrono::{DateTime, Utc};
use revo_common::{Error, Result};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle state of a return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnState {
    /// Product resolved, record created
    Initiated,
    /// Return reason attached
    ReasonSelected,
    /// Evidence checklist active
    Capturing,
    /// Submission in flight, awaiting analysis
    Analyzing,
    /// Auto-approved with refund
    Approved,
    /// Auto-rejected
    Rejected,
    /// Routed to human review (terminal for this workflow instance)
    Review,
    /// Closed out after approval/rejection/review
    Completed,
    /// Cancelled by the user
    Cancelled,
}

impl ReturnState {
    /// Terminal states accept no further workflow-driven transitions
    /// (REVIEW is terminal here; a human process may later move the record
    /// to COMPLETED outside this workflow).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ReturnState::Review | ReturnState::Completed | ReturnState::Cancelled
        )
    }

    fn can_transition_to(&self, to: ReturnState) -> bool {
        use ReturnState::*;
        if to == Cancelled {
            return !self.is_terminal();
        }
        matches!(
            (self, to),
            (Initiated, ReasonSelected)
                | (ReasonSelected, Capturing)
                | (Capturing, Analyzing)
                | (Analyzing, Approved)
                | (Analyzing, Rejected)
                | (Analyzing, Review)
                // Explicit reset path: failed/cancelled submission
                | (Analyzing, Capturing)
                | (Approved, Completed)
                | (Rejected, Completed)
        )
    }
}

impl std::fmt::Display for ReturnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ReturnState::Initiated => "initiated",
            ReturnState::ReasonSelected => "reason_selected",
            ReturnState::Capturing => "capturing",
            ReturnState::Analyzing => "analyzing",
            ReturnState::Approved => "approved",
            ReturnState::Rejected => "rejected",
            ReturnState::Review => "review",
            ReturnState::Completed => "completed",
            ReturnState::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// Record of one state transition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateTransition {
    pub return_id: Uuid,
    pub old_state: ReturnState,
    pub new_state: ReturnState,
    pub transitioned_at: DateTime<Utc>,
}

/// The aggregate root for one in-progress return
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnProcess {
    pub id: Uuid,
    pub product: Product,
    /// Set exactly once at reason selection, immutable afterwards
    pub reason: Option<ReturnReason>,
    /// Ordered evidence checklist, seeded from the reason's photo steps
    pub evidence: Vec<EvidenceItem>,
    pub state: ReturnState,
    pub analysis: Option<AnalysisResult>,
    pub refund_amount: Option<f64>,
    /// Backend-side return reference, assigned at reason selection
    pub tracking_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReturnProcess {
    /// Create a new record for a resolved product.
    pub fn new(product: Product) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            product,
            reason: None,
            evidence: Vec::new(),
            state: ReturnState::Initiated,
            analysis: None,
            refund_amount: None,
            tracking_ref: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Transition to a new state, rejecting anything the state machine
    /// does not allow.
    pub fn transition_to(&mut self, new_state: ReturnState) -> Result<StateTransition> {
        if !self.state.can_transition_to(new_state) {
            return Err(Error::InvalidStep(format!(
                "Illegal transition {} -> {} for return {}",
                self.state, new_state, self.id
            )));
        }
        let transition = StateTransition {
            return_id: self.id,
            old_state: self.state,
            new_state,
            transitioned_at: Utc::now(),
        };
        self.state = new_state;
        self.updated_at = transition.transitioned_at;
        Ok(transition)
    }

    /// Attach the selected reason and seed the evidence checklist.
    ///
    /// Errors if a reason is already set or evidence has been captured;
    /// the reason is immutable once chosen.
    pub fn attach_reason(&mut self, reason: &ReturnReason, tracking_ref: String) -> Result<()> {
        if self.reason.is_some() {
            return Err(Error::InvalidStep(format!(
                "Return {} already has reason '{}'",
                self.id,
                self.reason.as_ref().map(|r| r.id.as_str()).unwrap_or("?")
            )));
        }
        if self.evidence.iter().any(|e| e.is_resolved()) {
            return Err(Error::InvalidStep(format!(
                "Return {} has captured evidence; reset evidence before changing reason",
                self.id
            )));
        }
        self.transition_to(ReturnState::ReasonSelected)?;

        self.evidence = reason
            .photo_steps
            .iter()
            .map(|step| EvidenceItem::new(&step.id, step.target, &step.instruction, step.required))
            .collect();
        self.reason = Some(reason.clone());
        self.tracking_ref = Some(tracking_ref);

        self.transition_to(ReturnState::Capturing)?;
        Ok(())
    }

    /// Clear submission artifacts and return to CAPTURING.
    ///
    /// The only sanctioned way to replace an analysis result: full
    /// resubmission after an explicit reset.
    pub fn reset_for_resubmission(&mut self) -> Result<StateTransition> {
        let transition = self.transition_to(ReturnState::Capturing)?;
        self.analysis = None;
        self.refund_amount = None;
        Ok(transition)
    }

    /// Attach the analysis result received for this submission.
    pub fn attach_analysis(&mut self, analysis: AnalysisResult) -> Result<()> {
        if self.state != ReturnState::Analyzing {
            return Err(Error::InvalidStep(format!(
                "Cannot attach analysis in state {}",
                self.state
            )));
        }
        if self.analysis.is_some() {
            return Err(Error::InvalidStep(
                "Analysis already attached; reset before resubmitting".to_string(),
            ));
        }
        self.analysis = Some(analysis);
        self.updated_at = Utc::now();
        Ok(())
    }
}
