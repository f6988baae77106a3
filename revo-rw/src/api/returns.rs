//! Return workflow API handlers
//!
//! POST /returns/scan, reason selection, evidence capture/skip,
//! submission with cancellation, and workflow cancellation.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{EvidenceItem, ReturnProcess, ReturnReason};
use crate::AppState;

/// POST /returns/scan request
#[derive(Debug, Deserialize)]
pub struct ScanRequest {
    /// Scanned barcode or QR payload
    pub barcode: String,
}

/// POST /returns/{id}/reason request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectReasonRequest {
    pub reason_id: String,
}

/// Acknowledgement for cancellation endpoints
#[derive(Debug, Serialize)]
pub struct CancelResponse {
    pub return_id: Uuid,
    pub cancelled: bool,
}

/// POST /returns/scan
///
/// Resolve a scanned code and open a return record. 404 when the code has
/// no product; 422 when the product is not eligible for return.
pub async fn scan(
    State(state): State<AppState>,
    Json(request): Json<ScanRequest>,
) -> ApiResult<(StatusCode, Json<ReturnProcess>)> {
    let record = state.orchestrator.scan(&request.barcode).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// GET /returns/reasons
pub async fn list_reasons(State(state): State<AppState>) -> Json<Vec<ReturnReason>> {
    Json(state.orchestrator.reasons().to_vec())
}

/// GET /returns/{id}
pub async fn get_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReturnProcess>> {
    Ok(Json(state.orchestrator.snapshot(id).await?))
}

/// GET /returns/{id}/evidence
pub async fn get_evidence(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Vec<EvidenceItem>>> {
    Ok(Json(state.orchestrator.evidence(id).await?))
}

/// POST /returns/{id}/reason
pub async fn select_reason(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SelectReasonRequest>,
) -> ApiResult<Json<ReturnProcess>> {
    let record = state
        .orchestrator
        .select_reason(id, &request.reason_id)
        .await?;
    Ok(Json(record))
}

/// POST /returns/{id}/evidence/{step}/capture
///
/// Body is the raw photo bytes (image/jpeg).
pub async fn capture_evidence(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(Uuid, String)>,
    photo: Bytes,
) -> ApiResult<Json<ReturnProcess>> {
    if photo.is_empty() {
        return Err(ApiError::BadRequest(
            "Photo body must not be empty".to_string(),
        ));
    }
    let record = state
        .orchestrator
        .capture(id, &step_id, photo.to_vec())
        .await?;
    Ok(Json(record))
}

/// POST /returns/{id}/evidence/{step}/skip
pub async fn skip_evidence(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(Uuid, String)>,
) -> ApiResult<Json<ReturnProcess>> {
    Ok(Json(state.orchestrator.skip(id, &step_id).await?))
}

/// POST /returns/{id}/evidence/{step}/recapture
///
/// Resets an already-resolved step to pending so it can be captured again.
pub async fn recapture_evidence(
    State(state): State<AppState>,
    Path((id, step_id)): Path<(Uuid, String)>,
) -> ApiResult<Json<ReturnProcess>> {
    Ok(Json(state.orchestrator.recapture(id, &step_id).await?))
}

/// POST /returns/{id}/submit
///
/// Runs the full analysis round-trip before responding; the caller gets
/// the decided record or the failure that reverted it to capturing.
pub async fn submit_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReturnProcess>> {
    Ok(Json(state.orchestrator.submit(id).await?))
}

/// POST /returns/{id}/submit/cancel
pub async fn cancel_submission(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CancelResponse>> {
    state.orchestrator.cancel_submission(id).await?;
    Ok(Json(CancelResponse {
        return_id: id,
        cancelled: true,
    }))
}

/// POST /returns/{id}/cancel
pub async fn cancel_return(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ReturnProcess>> {
    Ok(Json(state.orchestrator.cancel(id).await?))
}

/// Build return workflow routes
pub fn return_routes() -> Router<AppState> {
    Router::new()
        .route("/returns/scan", post(scan))
        .route("/returns/reasons", get(list_reasons))
        .route("/returns/:id", get(get_return))
        .route("/returns/:id/evidence", get(get_evidence))
        .route("/returns/:id/reason", post(select_reason))
        .route("/returns/:id/evidence/:step/capture", post(capture_evidence))
        .route("/returns/:id/evidence/:step/skip", post(skip_evidence))
        .route(
            "/returns/:id/evidence/:step/recapture",
            post(recapture_evidence),
        )
        .route("/returns/:id/submit", post(submit_return))
        .route("/returns/:id/submit/cancel", post(cancel_submission))
        .route("/returns/:id/cancel", post(cancel_return))
}
