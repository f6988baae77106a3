//! revo-rw library interface
//!
//! Exposes the workflow engine and router for integration testing.

pub mod api;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

pub use crate::error::{ApiError, ApiResult};

use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use revo_common::config::EngineConfig;
use revo_common::events::EventBus;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;

use crate::models::ReasonCatalog;
use crate::services::{
    AnalysisRequestor, DecisionEngine, DecisionPolicy, ProductResolver, WorkflowOrchestrator,
};
use crate::store::ReturnStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// The workflow engine behind every endpoint
    pub orchestrator: Arc<WorkflowOrchestrator>,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(orchestrator: Arc<WorkflowOrchestrator>, event_bus: EventBus) -> Self {
        Self {
            orchestrator,
            event_bus,
            startup_time: Utc::now(),
        }
    }

    /// Wire up the full engine from configuration.
    pub fn from_config(config: &EngineConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.backend.timeout_secs))
            .build()?;
        let event_bus = EventBus::new(100);

        let orchestrator = WorkflowOrchestrator::new(
            Arc::new(ReturnStore::new()),
            Arc::new(ReasonCatalog::builtin()),
            ProductResolver::new(http.clone(), config.backend.base_url.clone()),
            AnalysisRequestor::new(http, config.backend.base_url.clone()),
            DecisionEngine::new(DecisionPolicy::from_config(&config.decision)),
            event_bus.clone(),
        );
        Ok(Self::new(Arc::new(orchestrator), event_bus))
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::return_routes())
        .route("/events", get(api::return_event_stream))
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
