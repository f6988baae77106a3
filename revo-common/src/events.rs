//! Event types for the REVO workflow event system
//!
//! Events are broadcast on a lossy in-process bus and forwarded to UI
//! clients over SSE. Emission never blocks workflow progress: if no
//! subscriber is listening the event is dropped.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// REVO workflow event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ReturnEvent {
    /// A scanned code resolved to a product and a return record was created
    ReturnStarted {
        return_id: Uuid,
        product_id: String,
        timestamp: DateTime<Utc>,
    },

    /// Return reason attached, evidence checklist initialized
    ReasonSelected {
        return_id: Uuid,
        reason_id: String,
        required_steps: usize,
        timestamp: DateTime<Utc>,
    },

    /// One evidence photo captured and uploaded
    EvidenceCaptured {
        return_id: Uuid,
        step_id: String,
        upload_id: String,
        timestamp: DateTime<Utc>,
    },

    /// One evidence step explicitly skipped by the user
    EvidenceSkipped {
        return_id: Uuid,
        step_id: String,
        required: bool,
        timestamp: DateTime<Utc>,
    },

    /// Evidence set submitted for automated analysis
    AnalysisStarted {
        return_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Analysis result received from the backend
    AnalysisCompleted {
        return_id: Uuid,
        confidence: f64,
        timestamp: DateTime<Utc>,
    },

    /// Decision engine produced a final disposition
    DecisionReached {
        return_id: Uuid,
        outcome: String,
        refund_amount: Option<f64>,
        timestamp: DateTime<Utc>,
    },

    /// Submission failed or was cancelled; record reverted to capturing
    SubmissionFailed {
        return_id: Uuid,
        error_message: String,
        timestamp: DateTime<Utc>,
    },

    /// Workflow cancelled by the user; captured data preserved for audit
    ReturnCancelled {
        return_id: Uuid,
        timestamp: DateTime<Utc>,
    },
}

impl ReturnEvent {
    /// SSE event name for this variant
    pub fn name(&self) -> &'static str {
        match self {
            ReturnEvent::ReturnStarted { .. } => "ReturnStarted",
            ReturnEvent::ReasonSelected { .. } => "ReasonSelected",
            ReturnEvent::EvidenceCaptured { .. } => "EvidenceCaptured",
            ReturnEvent::EvidenceSkipped { .. } => "EvidenceSkipped",
            ReturnEvent::AnalysisStarted { .. } => "AnalysisStarted",
            ReturnEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            ReturnEvent::DecisionReached { .. } => "DecisionReached",
            ReturnEvent::SubmissionFailed { .. } => "SubmissionFailed",
            ReturnEvent::ReturnCancelled { .. } => "ReturnCancelled",
        }
    }
}

/// Broadcast event bus shared by the orchestrator and the SSE endpoint
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ReturnEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity.
    ///
    /// Older events are dropped once the buffer is full; SSE subscribers
    /// observe the lag and resume with current events.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReturnEvent> {
        self.tx.subscribe()
    }

    /// Emit an event, ignoring the no-subscriber case.
    ///
    /// Workflow progress must never depend on someone listening.
    pub fn emit_lossy(&self, event: ReturnEvent) {
        if let Err(e) = self.tx.send(event) {
            tracing::trace!("No subscribers for event: {:?}", e.0.name());
        }
    }

    /// Configured channel capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}
