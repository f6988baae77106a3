//! Evidence collector: completion and skip tracking for the capture
//! checklist
//!
//! Capture order is advisory only. The UI presents steps in catalog
//! order, but any pending item may be captured or skipped in any order so
//! a user can back out of a single photo and retry without restarting the
//! whole flow. Required items may be skipped; the skip is recorded
//! explicitly so the analysis can penalize missing mandatory evidence.

use crate::models::{EvidenceStatus, ReturnProcess};
use chrono::Utc;
use revo_common::{Error, Result};

/// Operations over a return's evidence checklist
pub struct EvidenceCollector;

impl EvidenceCollector {
    /// Mark a pending item as captured with its backend upload reference.
    ///
    /// Fails with `InvalidStep` if the step does not belong to the record
    /// or is already resolved; completed items are replaced via
    /// [`recapture`](Self::recapture), never mutated in place.
    pub fn mark_captured(record: &mut ReturnProcess, step_id: &str, upload_id: String) -> Result<()> {
        let item = Self::find_mut(record, step_id)?;
        if item.is_resolved() {
            return Err(Error::InvalidStep(format!(
                "Evidence step '{}' is already resolved; use recapture to replace it",
                step_id
            )));
        }
        item.status = EvidenceStatus::Captured {
            upload_id,
            at: Utc::now(),
        };
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Replace a resolved item with a fresh pending one.
    ///
    /// The old item is dropped wholesale (new id, pending status) so a
    /// completed capture is never edited after the fact.
    pub fn recapture(record: &mut ReturnProcess, step_id: &str) -> Result<()> {
        let position = record
            .evidence
            .iter()
            .position(|e| e.step_id == step_id)
            .ok_or_else(|| Error::InvalidStep(format!("Unknown evidence step: {}", step_id)))?;

        let old = &record.evidence[position];
        let fresh = crate::models::EvidenceItem::new(
            &old.step_id,
            old.target,
            &old.instruction,
            old.required,
        );
        record.evidence[position] = fresh;
        record.updated_at = Utc::now();
        Ok(())
    }

    /// Record an explicit skip, distinct from "never attempted".
    ///
    /// Permitted on any item, required ones included.
    pub fn skip(record: &mut ReturnProcess, step_id: &str) -> Result<bool> {
        let item = Self::find_mut(record, step_id)?;
        if item.is_resolved() {
            return Err(Error::InvalidStep(format!(
                "Evidence step '{}' is already resolved",
                step_id
            )));
        }
        let required = item.required;
        item.status = EvidenceStatus::Skipped { at: Utc::now() };
        record.updated_at = Utc::now();
        Ok(required)
    }

    /// True iff every required item is captured or explicitly skipped.
    /// Optional items never block completion.
    pub fn is_complete(record: &ReturnProcess) -> bool {
        record
            .evidence
            .iter()
            .filter(|e| e.required)
            .all(|e| e.is_resolved())
    }

    /// Step ids of required items still pending, in checklist order.
    pub fn missing_required(record: &ReturnProcess) -> Vec<String> {
        record
            .evidence
            .iter()
            .filter(|e| e.required && !e.is_resolved())
            .map(|e| e.step_id.clone())
            .collect()
    }

    /// Step ids that were explicitly skipped, in checklist order.
    pub fn skipped_steps(record: &ReturnProcess) -> Vec<String> {
        record
            .evidence
            .iter()
            .filter(|e| e.is_skipped())
            .map(|e| e.step_id.clone())
            .collect()
    }

    fn find_mut<'a>(
        record: &'a mut ReturnProcess,
        step_id: &str,
    ) -> Result<&'a mut crate::models::EvidenceItem> {
        record
            .evidence
            .iter_mut()
            .find(|e| e.step_id == step_id)
            .ok_or_else(|| Error::InvalidStep(format!("Unknown evidence step: {}", step_id)))
    }
}
