//! Common error types for REVO
//!
//! The taxonomy separates expected outcomes (`NotFound`), retryable faults
//! (`Transient`), caller mistakes (`Validation`, `InvalidStep`), concurrency
//! conflicts (`RecordBusy`) and fatal backend payload corruption
//! (`CorruptResult`). Callers decide retry behavior; nothing here retries.

use thiserror::Error;

/// Common result type for REVO operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across REVO services
#[derive(Error, Debug)]
pub enum Error {
    /// Requested resource does not exist (expected outcome, not a fault)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Network/timeout failure; safe to retry with unchanged input
    #[error("Transient error: {0}")]
    Transient(String),

    /// Caller precondition violated (e.g. submitting incomplete evidence)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Operation targets a non-existent or already-resolved step
    #[error("Invalid step: {0}")]
    InvalidStep(String),

    /// Another mutation is in flight for the same record
    #[error("Record busy: {0}")]
    RecordBusy(String),

    /// Backend returned a malformed analysis payload (fatal for this submission)
    #[error("Corrupt analysis result: {0}")]
    CorruptResult(String),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True for failures that are safe to retry with unchanged input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Transient(_))
    }
}
