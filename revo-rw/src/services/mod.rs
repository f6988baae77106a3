//! Workflow services: backend clients, evidence collector, decision
//! engine and the top-level orchestrator

pub mod analysis_requestor;
pub mod decision;
pub mod evidence;
pub mod orchestrator;
pub mod resolver;

pub use analysis_requestor::AnalysisRequestor;
pub use decision::{Decision, DecisionEngine, DecisionPolicy, Outcome};
pub use evidence::EvidenceCollector;
pub use orchestrator::WorkflowOrchestrator;
pub use resolver::{ProductResolver, Resolution};

use revo_common::Error;
use serde::Deserialize;

/// Response envelope used by the verification backend on every endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "none")]
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

fn none<T>() -> Option<T> {
    None
}

impl<T> ApiEnvelope<T> {
    /// Human-readable failure detail, whichever field the backend filled.
    pub fn failure_detail(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| "no detail provided".to_string())
    }
}

/// Map a transport-level reqwest failure to the common taxonomy.
///
/// Everything at this layer is retryable by definition: the request may
/// never have reached the backend.
pub(crate) fn transport_error(context: &str, err: reqwest::Error) -> Error {
    Error::Transient(format!("{}: {}", context, err))
}
