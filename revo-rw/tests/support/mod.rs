//! Shared test support: a stub verification backend and engine wiring
//!
//! The stub speaks the backend wire format (success/data envelope,
//! camelCase fields) on an ephemeral port. Tests configure the analysis
//! payload and an optional analyze delay to exercise cancellation.

// Not every test binary uses every helper.
#![allow(dead_code)]

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use revo_common::events::EventBus;
use revo_rw::models::ReasonCatalog;
use revo_rw::services::{
    AnalysisRequestor, DecisionEngine, ProductResolver, WorkflowOrchestrator,
};
use revo_rw::store::ReturnStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Barcode the stub resolves to a $100 returnable product
pub const KNOWN_CODE: &str = "0400100100";
/// Barcode the stub resolves to a product that is not return-eligible
pub const INELIGIBLE_CODE: &str = "0400100200";

#[derive(Clone)]
pub struct StubBackend {
    /// Analysis payload returned by the analyze endpoint
    pub analysis: Arc<Mutex<Value>>,
    /// Delay before the analyze endpoint responds
    pub analyze_delay: Arc<Mutex<Duration>>,
    pub uploads: Arc<AtomicUsize>,
    pub approvals: Arc<AtomicUsize>,
    pub rejections: Arc<AtomicUsize>,
}

impl StubBackend {
    fn new() -> Self {
        Self {
            analysis: Arc::new(Mutex::new(approve_analysis(0.85, "moderate"))),
            analyze_delay: Arc::new(Mutex::new(Duration::ZERO)),
            uploads: Arc::new(AtomicUsize::new(0)),
            approvals: Arc::new(AtomicUsize::new(0)),
            rejections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_analysis(&self, value: Value) {
        *self.analysis.lock().unwrap() = value;
    }

    pub fn set_analyze_delay(&self, delay: Duration) {
        *self.analyze_delay.lock().unwrap() = delay;
    }
}

/// Analysis payload that auto-approves at the default thresholds
pub fn approve_analysis(confidence: f64, wear: &str) -> Value {
    json!({
        "overallScore": 0.8,
        "confidence": confidence,
        "defectsFound": [],
        "fraudCheck": {
            "isOriginalItem": true,
            "confidence": 0.92,
            "matchedFeatures": ["logo", "stitching"],
            "suspiciousIndicators": []
        },
        "wearLevel": { "level": wear, "score": 0.4, "details": [] },
        "recommendation": "approve",
        "reasoning": "Consistent with reported reason"
    })
}

/// Analysis payload recommending rejection
pub fn reject_analysis(confidence: f64) -> Value {
    json!({
        "overallScore": 0.2,
        "confidence": confidence,
        "defectsFound": [],
        "fraudCheck": {
            "isOriginalItem": false,
            "confidence": 0.88,
            "matchedFeatures": [],
            "suspiciousIndicators": ["serial mismatch"]
        },
        "wearLevel": { "level": "heavy", "score": 0.9, "details": [] },
        "recommendation": "reject",
        "reasoning": "Item does not match purchase record"
    })
}

async fn scan(Json(body): Json<Value>) -> impl IntoResponse {
    let barcode = body["barcode"].as_str().unwrap_or_default();
    match barcode {
        KNOWN_CODE => Json(json!({ "success": true, "data": product(true) })).into_response(),
        INELIGIBLE_CODE => Json(json!({ "success": true, "data": product(false) })).into_response(),
        _ => StatusCode::NOT_FOUND.into_response(),
    }
}

fn product(eligible: bool) -> Value {
    json!({
        "id": "prod-1",
        "sku": "SKU-1",
        "name": "Trail Shoe",
        "brand": "Acme",
        "category": "footwear",
        "price": 100.0,
        "returnEligible": eligible,
        "returnWindow": 30,
        "condition": "new"
    })
}

async fn initiate() -> Json<Value> {
    Json(json!({ "success": true, "data": { "id": "rt-1" } }))
}

async fn upload(State(stub): State<StubBackend>) -> Json<Value> {
    let n = stub.uploads.fetch_add(1, Ordering::SeqCst) + 1;
    Json(json!({ "success": true, "data": { "uploadId": format!("up-{}", n) } }))
}

async fn analyze(State(stub): State<StubBackend>) -> Json<Value> {
    let delay = *stub.analyze_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    let analysis = stub.analysis.lock().unwrap().clone();
    Json(json!({ "success": true, "data": analysis }))
}

async fn approve(State(stub): State<StubBackend>, Json(body): Json<Value>) -> Json<Value> {
    stub.approvals.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "success": true, "data": { "refundAmount": body["refundAmount"] } }))
}

async fn reject(State(stub): State<StubBackend>) -> Json<Value> {
    stub.rejections.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "success": true }))
}

async fn remote_record(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "id": id,
            "status": "processing",
            "trackingNumber": "TRK-0001"
        }
    }))
}

/// Start the stub backend on an ephemeral port; returns it with its base
/// URL.
pub async fn spawn_backend() -> (StubBackend, String) {
    let stub = StubBackend::new();
    let app = Router::new()
        .route("/scan", post(scan))
        .route("/returns/initiate", post(initiate))
        .route("/returns/:id", get(remote_record))
        .route("/returns/:id/photos", post(upload))
        .route("/returns/:id/analyze", post(analyze))
        .route("/returns/:id/approve", post(approve))
        .route("/returns/:id/reject", post(reject))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (stub, format!("http://{}", addr))
}

/// Build a full engine wired against the given backend.
pub fn engine(base_url: &str) -> (Arc<WorkflowOrchestrator>, EventBus) {
    let (orchestrator, event_bus, _store) = engine_with_store(base_url);
    (orchestrator, event_bus)
}

/// Like [`engine`] but also hands back the store for direct assertions.
pub fn engine_with_store(
    base_url: &str,
) -> (Arc<WorkflowOrchestrator>, EventBus, Arc<ReturnStore>) {
    let http = reqwest::Client::new();
    let event_bus = EventBus::new(100);
    let store = Arc::new(ReturnStore::new());
    let orchestrator = WorkflowOrchestrator::new(
        store.clone(),
        Arc::new(ReasonCatalog::builtin()),
        ProductResolver::new(http.clone(), base_url.to_string()),
        AnalysisRequestor::new(http, base_url.to_string()),
        DecisionEngine::default(),
        event_bus.clone(),
    );
    (Arc::new(orchestrator), event_bus, store)
}
