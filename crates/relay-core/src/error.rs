//! Core error type for the Relay orchestrator.
//!
//! `RelayError` covers the failures that can escape an operation. Backend
//! failures during a workflow step are *recorded* on the step instead of
//! being propagated, so a run only returns an error on configuration or
//! internal invariant violations.

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// Unknown agent role, bad override file, missing credentials.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generation or search backend call failed (network, auth, quota).
    #[error("Backend error: {0}")]
    Backend(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// A workflow step was asked to move backwards or skip a state.
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Backend(format!("HTTP request failed: {}", e))
    }
}
