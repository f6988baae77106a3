//! Workflow orchestrator
//!
//! Coordinates the full return flow: scan, reason selection, evidence
//! capture, submission and decision. The orchestrator owns the per-return
//! cancellation tokens; the store owns the per-record mutation gates. A
//! mutation holds its record's gate for its whole duration (backend calls
//! included), so a second mutation on the same return fails fast with
//! `RecordBusy` while snapshot reads stay wait-free.

use crate::models::{EvidenceItem, ReasonCatalog, ReturnProcess, ReturnReason, ReturnState};
use crate::services::{
    AnalysisRequestor, Decision, DecisionEngine, EvidenceCollector, Outcome, ProductResolver,
    Resolution,
};
use crate::store::ReturnStore;
use chrono::Utc;
use revo_common::events::{EventBus, ReturnEvent};
use revo_common::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub struct WorkflowOrchestrator {
    store: Arc<ReturnStore>,
    catalog: Arc<ReasonCatalog>,
    resolver: ProductResolver,
    requestor: AnalysisRequestor,
    engine: DecisionEngine,
    events: EventBus,
    /// One token per in-flight submission, removed when the submission ends
    cancel_tokens: RwLock<HashMap<Uuid, CancellationToken>>,
}

impl WorkflowOrchestrator {
    pub fn new(
        store: Arc<ReturnStore>,
        catalog: Arc<ReasonCatalog>,
        resolver: ProductResolver,
        requestor: AnalysisRequestor,
        engine: DecisionEngine,
        events: EventBus,
    ) -> Self {
        Self {
            store,
            catalog,
            resolver,
            requestor,
            engine,
            events,
            cancel_tokens: RwLock::new(HashMap::new()),
        }
    }

    /// Resolve a scanned code and open a return record for the product.
    ///
    /// No record is created when the code does not resolve or the product
    /// is not eligible for return.
    pub async fn scan(&self, code: &str) -> Result<ReturnProcess> {
        let product = match self.resolver.resolve(code).await? {
            Resolution::Found(product) => product,
            Resolution::NotFound => {
                return Err(Error::NotFound(format!("No product for code: {}", code.trim())))
            }
        };
        if !product.return_eligible {
            return Err(Error::Validation(format!(
                "Product '{}' is not eligible for return",
                product.name
            )));
        }

        let record = self.store.create(product).await;
        tracing::info!(return_id = %record.id, product_id = %record.product.id, "Return started");
        self.events.emit_lossy(ReturnEvent::ReturnStarted {
            return_id: record.id,
            product_id: record.product.id.clone(),
            timestamp: Utc::now(),
        });
        Ok(record)
    }

    /// The reason catalog, in presentation order.
    pub fn reasons(&self) -> &[ReturnReason] {
        self.catalog.all()
    }

    /// Attach the selected reason, creating the backend return record and
    /// seeding the evidence checklist.
    pub async fn select_reason(&self, id: Uuid, reason_id: &str) -> Result<ReturnProcess> {
        let reason = self.catalog.get(reason_id)?.clone();
        let slot = self.store.slot(id).await?;
        let _busy = slot.try_acquire(id)?;

        let product = {
            let record = slot.snapshot().await;
            if record.state != ReturnState::Initiated {
                return Err(Error::InvalidStep(format!(
                    "Reason can only be selected in state initiated, return {} is {}",
                    id, record.state
                )));
            }
            record.product
        };

        // Gate held across the backend call: a concurrent mutation on this
        // return fails fast instead of racing the initiate round-trip.
        let tracking_ref = self.requestor.initiate(&product.id, reason_id).await?;

        let updated = {
            let mut record = slot.write().await;
            record.attach_reason(&reason, tracking_ref)?;
            record.clone()
        };

        self.events.emit_lossy(ReturnEvent::ReasonSelected {
            return_id: id,
            reason_id: reason.id.clone(),
            required_steps: reason.required_step_count(),
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// Capture one evidence photo: upload to the backend, then mark the
    /// checklist item captured.
    pub async fn capture(&self, id: Uuid, step_id: &str, photo: Vec<u8>) -> Result<ReturnProcess> {
        let slot = self.store.slot(id).await?;
        let _busy = slot.try_acquire(id)?;

        let (tracking_ref, target) = {
            let record = slot.snapshot().await;
            Self::require_capturing(&record)?;
            let item = record
                .evidence
                .iter()
                .find(|e| e.step_id == step_id)
                .ok_or_else(|| Error::InvalidStep(format!("Unknown evidence step: {}", step_id)))?;
            if item.is_resolved() {
                return Err(Error::InvalidStep(format!(
                    "Evidence step '{}' is already resolved",
                    step_id
                )));
            }
            (Self::tracking_ref(&record)?, item.target)
        };

        let upload_id = self
            .requestor
            .upload_photo(&tracking_ref, step_id, target, photo)
            .await?;

        let updated = {
            let mut record = slot.write().await;
            EvidenceCollector::mark_captured(&mut record, step_id, upload_id.clone())?;
            record.clone()
        };

        self.events.emit_lossy(ReturnEvent::EvidenceCaptured {
            return_id: id,
            step_id: step_id.to_string(),
            upload_id,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// Replace an already-resolved step with a fresh pending one so it can
    /// be captured again.
    pub async fn recapture(&self, id: Uuid, step_id: &str) -> Result<ReturnProcess> {
        let slot = self.store.slot(id).await?;
        let _busy = slot.try_acquire(id)?;

        let mut record = slot.write().await;
        Self::require_capturing(&record)?;
        EvidenceCollector::recapture(&mut record, step_id)?;
        Ok(record.clone())
    }

    /// Explicitly skip an evidence step. Required steps may be skipped;
    /// the skip is recorded so the analysis can weigh the gap.
    pub async fn skip(&self, id: Uuid, step_id: &str) -> Result<ReturnProcess> {
        let slot = self.store.slot(id).await?;
        let _busy = slot.try_acquire(id)?;

        let (updated, required) = {
            let mut record = slot.write().await;
            Self::require_capturing(&record)?;
            let required = EvidenceCollector::skip(&mut record, step_id)?;
            (record.clone(), required)
        };

        self.events.emit_lossy(ReturnEvent::EvidenceSkipped {
            return_id: id,
            step_id: step_id.to_string(),
            required,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// Submit the evidence set for analysis and apply the automated
    /// decision.
    ///
    /// Cancellable while the analysis request is in flight; a cancelled or
    /// failed submission reverts the record to CAPTURING with its evidence
    /// intact, so the user can resubmit.
    pub async fn submit(&self, id: Uuid) -> Result<ReturnProcess> {
        let slot = self.store.slot(id).await?;
        let _busy = slot.try_acquire(id)?;

        let (tracking_ref, skipped) = {
            let record = slot.snapshot().await;
            Self::require_capturing(&record)?;
            if !EvidenceCollector::is_complete(&record) {
                let missing = EvidenceCollector::missing_required(&record);
                return Err(Error::Validation(format!(
                    "Evidence incomplete; capture or skip required steps: {}",
                    missing.join(", ")
                )));
            }
            (Self::tracking_ref(&record)?, EvidenceCollector::skipped_steps(&record))
        };

        {
            let mut record = slot.write().await;
            record.transition_to(ReturnState::Analyzing)?;
        }
        self.events.emit_lossy(ReturnEvent::AnalysisStarted {
            return_id: id,
            timestamp: Utc::now(),
        });

        let token = CancellationToken::new();
        self.cancel_tokens.write().await.insert(id, token.clone());

        let outcome = tokio::select! {
            _ = token.cancelled() => {
                Err(Error::Transient("Submission cancelled before completion".to_string()))
            }
            result = self.requestor.submit(&tracking_ref, &skipped) => result,
        };
        self.cancel_tokens.write().await.remove(&id);

        let decided = match outcome {
            Ok(analysis) => {
                let record = slot.snapshot().await;
                self.engine
                    .decide(&analysis, &record.product)
                    .map(|decision| (analysis, decision))
            }
            Err(err) => Err(err),
        };
        let (analysis, decision) = match decided {
            Ok(pair) => pair,
            Err(err) => {
                // Revert to the pre-submission state; evidence stays as
                // captured so the user can retry or adjust.
                let mut record = slot.write().await;
                record.reset_for_resubmission()?;
                tracing::warn!(return_id = %id, error = %err, "Submission did not complete");
                self.events.emit_lossy(ReturnEvent::SubmissionFailed {
                    return_id: id,
                    error_message: err.to_string(),
                    timestamp: Utc::now(),
                });
                return Err(err);
            }
        };

        self.events.emit_lossy(ReturnEvent::AnalysisCompleted {
            return_id: id,
            confidence: analysis.confidence,
            timestamp: Utc::now(),
        });

        let updated = {
            let mut record = slot.write().await;
            record.attach_analysis(analysis)?;
            let state = match decision.outcome {
                Outcome::Approved => ReturnState::Approved,
                Outcome::Rejected => ReturnState::Rejected,
                Outcome::Review => ReturnState::Review,
            };
            record.transition_to(state)?;
            record.refund_amount = decision.refund_amount;
            record.clone()
        };

        tracing::info!(
            return_id = %id,
            outcome = %decision.outcome,
            refund = ?decision.refund_amount,
            "Decision reached"
        );
        self.events.emit_lossy(ReturnEvent::DecisionReached {
            return_id: id,
            outcome: decision.outcome.to_string(),
            refund_amount: decision.refund_amount,
            timestamp: Utc::now(),
        });

        let closed = self.finalize(&slot, &tracking_ref, &decision).await;
        Ok(closed.unwrap_or(updated))
    }

    /// Report the disposition to the backend and close out approved and
    /// rejected returns. Notification failures are logged, not fatal; the
    /// local decision already stands.
    async fn finalize(
        &self,
        slot: &crate::store::RecordSlot,
        tracking_ref: &str,
        decision: &Decision,
    ) -> Option<ReturnProcess> {
        let notified = match decision.outcome {
            Outcome::Approved => {
                let refund = decision.refund_amount.unwrap_or(0.0);
                match self.requestor.approve(tracking_ref, refund).await {
                    Ok(confirmed) => {
                        let mut record = slot.write().await;
                        record.refund_amount = Some(confirmed);
                        true
                    }
                    Err(err) => {
                        tracing::warn!(tracking_ref, error = %err, "Approval notification failed");
                        false
                    }
                }
            }
            Outcome::Rejected => {
                let reason = decision.reason_codes.join("; ");
                match self.requestor.reject(tracking_ref, &reason).await {
                    Ok(()) => true,
                    Err(err) => {
                        tracing::warn!(tracking_ref, error = %err, "Rejection notification failed");
                        false
                    }
                }
            }
            Outcome::Review => return None,
        };

        if !notified {
            return None;
        }
        let mut record = slot.write().await;
        match record.transition_to(ReturnState::Completed) {
            Ok(_) => Some(record.clone()),
            Err(err) => {
                tracing::warn!(return_id = %record.id, error = %err, "Could not close out return");
                None
            }
        }
    }

    /// Signal the in-flight submission for this return to stop.
    ///
    /// Returns `InvalidStep` if no submission is in flight.
    pub async fn cancel_submission(&self, id: Uuid) -> Result<()> {
        let tokens = self.cancel_tokens.read().await;
        match tokens.get(&id) {
            Some(token) => {
                token.cancel();
                tracing::info!(return_id = %id, "Submission cancellation requested");
                Ok(())
            }
            None => Err(Error::InvalidStep(format!(
                "No submission in flight for return {}",
                id
            ))),
        }
    }

    /// Cancel the whole return. Fires any in-flight submission's token
    /// first, then waits for the gate; captured data is preserved for
    /// audit.
    pub async fn cancel(&self, id: Uuid) -> Result<ReturnProcess> {
        if let Some(token) = self.cancel_tokens.read().await.get(&id) {
            token.cancel();
        }
        let slot = self.store.slot(id).await?;
        // Waits for the in-flight mutation to observe the token and revert.
        let _busy = slot.acquire().await;

        let updated = {
            let mut record = slot.write().await;
            record.transition_to(ReturnState::Cancelled)?;
            record.clone()
        };

        tracing::info!(return_id = %id, "Return cancelled");
        self.events.emit_lossy(ReturnEvent::ReturnCancelled {
            return_id: id,
            timestamp: Utc::now(),
        });
        Ok(updated)
    }

    /// Current snapshot of a return record.
    pub async fn snapshot(&self, id: Uuid) -> Result<ReturnProcess> {
        self.store.get(id).await
    }

    /// Current evidence checklist of a return record.
    pub async fn evidence(&self, id: Uuid) -> Result<Vec<EvidenceItem>> {
        Ok(self.store.get(id).await?.evidence)
    }

    fn require_capturing(record: &ReturnProcess) -> Result<()> {
        if record.state != ReturnState::Capturing {
            return Err(Error::InvalidStep(format!(
                "Operation requires state capturing, return {} is {}",
                record.id, record.state
            )));
        }
        Ok(())
    }

    fn tracking_ref(record: &ReturnProcess) -> Result<String> {
        record.tracking_ref.clone().ok_or_else(|| {
            Error::Internal(format!("Return {} has no backend reference", record.id))
        })
    }

    #[cfg(test)]
    pub(crate) async fn insert_for_test(&self, product: crate::models::Product) -> ReturnProcess {
        self.store.create(product).await
    }
}
