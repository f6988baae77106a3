//! revo-rw - Return Workflow Engine
//!
//! HTTP service driving the in-store return process: scan, reason
//! selection, evidence capture, submission and automated decision.
//! Integrates with the verification backend via HTTP and with UI clients
//! via REST + SSE.

use anyhow::Result;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use revo_common::config::EngineConfig;
use revo_rw::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting revo-rw (Return Workflow) service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    // Optional config file path as the single CLI argument
    let explicit_path: Option<PathBuf> = std::env::args().nth(1).map(PathBuf::from);
    let config = EngineConfig::load(explicit_path.as_deref())?;
    info!("Verification backend: {}", config.backend.base_url);

    let state = AppState::from_config(&config)?;
    let app = revo_rw::build_router(state);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on http://{}", bind_addr);
    info!("Health check: http://{}/health", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
