//! Analysis requestor: the client side of the verification backend
//!
//! Covers the return-side backend calls: initiating the backend return
//! record, uploading evidence photos, requesting analysis, and reporting
//! the final disposition. Transport failures map to `Transient` (safe to
//! retry with the same evidence set); an analyze response that arrives but
//! cannot be understood maps to `CorruptResult` (fatal for the
//! submission, never defaulted).

use crate::models::{AnalysisResult, CaptureTarget};
use crate::services::{transport_error, ApiEnvelope};
use revo_common::{Error, Result};
use serde::Deserialize;
use serde_json::json;

/// Backend-side view of a return, as returned by initiate/status calls
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteReturn {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub refund_amount: Option<f64>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

/// Response of a successful photo upload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    upload_id: String,
}

/// Response of a successful approval notification
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApproveResponse {
    refund_amount: f64,
}

/// Client for return submission and analysis
#[derive(Debug, Clone)]
pub struct AnalysisRequestor {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisRequestor {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Create the backend return record; returns its reference id.
    pub async fn initiate(&self, product_id: &str, reason_id: &str) -> Result<String> {
        let url = format!("{}/returns/initiate", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "productId": product_id, "reasonId": reason_id }))
            .send()
            .await
            .map_err(|e| transport_error("Return initiation failed", e))?;

        let envelope: ApiEnvelope<RemoteReturn> = self.read_envelope(response, "initiate").await?;
        let remote = envelope
            .data
            .ok_or_else(|| Error::Internal("Initiate response missing return record".to_string()))?;

        tracing::info!(tracking_ref = %remote.id, product_id, reason_id, "Backend return initiated");
        Ok(remote.id)
    }

    /// Upload one evidence photo; returns the backend upload id.
    pub async fn upload_photo(
        &self,
        tracking_ref: &str,
        step_id: &str,
        target: CaptureTarget,
        bytes: Vec<u8>,
    ) -> Result<String> {
        let url = format!("{}/returns/{}/photos", self.base_url, tracking_ref);

        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(format!("{}.jpg", step_id))
            .mime_str("image/jpeg")
            .map_err(|e| Error::Internal(format!("Cannot build photo part: {}", e)))?;
        let form = reqwest::multipart::Form::new()
            .text("stepId", step_id.to_string())
            .text("target", target.to_string())
            .part("photo", part);

        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error("Photo upload failed", e))?;

        let envelope: ApiEnvelope<UploadResponse> = self.read_envelope(response, "photo upload").await?;
        let upload = envelope
            .data
            .ok_or_else(|| Error::Internal("Upload response missing uploadId".to_string()))?;

        tracing::debug!(tracking_ref, step_id, upload_id = %upload.upload_id, "Photo uploaded");
        Ok(upload.upload_id)
    }

    /// Request analysis of the uploaded evidence set.
    ///
    /// Skipped step ids are sent along so the backend can penalize missing
    /// mandatory evidence instead of treating it as never requested.
    pub async fn submit(&self, tracking_ref: &str, skipped_steps: &[String]) -> Result<AnalysisResult> {
        let url = format!("{}/returns/{}/analyze", self.base_url, tracking_ref);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "skippedSteps": skipped_steps }))
            .send()
            .await
            .map_err(|e| transport_error("Analysis submission failed", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "Backend return not found: {}",
                tracking_ref
            )));
        }
        if status.is_server_error() {
            return Err(Error::Transient(format!("Analysis returned {}", status)));
        }
        if !status.is_success() {
            return Err(Error::Internal(format!(
                "Analysis returned unexpected status {}",
                status
            )));
        }

        // The payload arrived; anything unreadable from here on is corrupt,
        // not retryable.
        let envelope: ApiEnvelope<AnalysisResult> = response
            .json()
            .await
            .map_err(|e| Error::CorruptResult(format!("Unreadable analysis payload: {}", e)))?;

        if !envelope.success {
            return Err(Error::Transient(format!(
                "Analysis rejected by backend: {}",
                envelope.failure_detail()
            )));
        }
        let analysis = envelope
            .data
            .ok_or_else(|| Error::CorruptResult("Analysis payload missing result".to_string()))?;
        analysis.validate()?;

        tracing::info!(
            tracking_ref,
            confidence = analysis.confidence,
            recommendation = ?analysis.recommendation,
            "Analysis result received"
        );
        Ok(analysis)
    }

    /// Fetch the backend's current view of a return.
    pub async fn remote_status(&self, tracking_ref: &str) -> Result<RemoteReturn> {
        let url = format!("{}/returns/{}", self.base_url, tracking_ref);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| transport_error("Return status fetch failed", e))?;

        let envelope: ApiEnvelope<RemoteReturn> = self.read_envelope(response, "status").await?;
        envelope
            .data
            .ok_or_else(|| Error::Internal("Status response missing return record".to_string()))
    }

    /// Report an approval; returns the backend-confirmed refund amount.
    pub async fn approve(&self, tracking_ref: &str, refund_amount: f64) -> Result<f64> {
        let url = format!("{}/returns/{}/approve", self.base_url, tracking_ref);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "refundAmount": refund_amount }))
            .send()
            .await
            .map_err(|e| transport_error("Approval notification failed", e))?;

        let envelope: ApiEnvelope<ApproveResponse> = self.read_envelope(response, "approve").await?;
        Ok(envelope
            .data
            .map(|a| a.refund_amount)
            .unwrap_or(refund_amount))
    }

    /// Report a rejection with its reason codes.
    pub async fn reject(&self, tracking_ref: &str, reason: &str) -> Result<()> {
        let url = format!("{}/returns/{}/reject", self.base_url, tracking_ref);
        let response = self
            .http
            .post(&url)
            .json(&json!({ "reason": reason }))
            .send()
            .await
            .map_err(|e| transport_error("Rejection notification failed", e))?;

        let _: ApiEnvelope<serde_json::Value> = self.read_envelope(response, "reject").await?;
        Ok(())
    }

    /// Shared status/envelope handling for the non-analyze endpoints.
    async fn read_envelope<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
        context: &str,
    ) -> Result<ApiEnvelope<T>> {
        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("Backend {} target not found", context)));
        }
        if status.is_server_error() {
            return Err(Error::Transient(format!(
                "Backend {} returned {}",
                context, status
            )));
        }
        if !status.is_success() {
            return Err(Error::Internal(format!(
                "Backend {} returned unexpected status {}",
                context, status
            )));
        }

        let envelope: ApiEnvelope<T> = response
            .json()
            .await
            .map_err(|e| transport_error(&format!("Backend {} response unreadable", context), e))?;

        if !envelope.success {
            return Err(Error::Internal(format!(
                "Backend {} reported failure: {}",
                context,
                envelope.failure_detail()
            )));
        }
        Ok(envelope)
    }
}
