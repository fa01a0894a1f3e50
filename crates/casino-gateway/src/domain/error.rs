//! Gateway error taxonomy and HTTP status mappings.

use crate::domain::correlation::CorrelationKey;
use crate::dispatch::DispatchError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::time::Duration;

/// Registry invariant violations. These indicate a gateway bug, not a
/// caller mistake, and should never occur in practice.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    /// A freshly generated key collided with an outstanding wait
    #[error("correlation key already registered: {0}")]
    DuplicateKey(CorrelationKey),
}

/// Failures of one initiated action, as seen by the calling client.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The outbound dispatch failed before any notification could occur
    #[error("dispatch to downstream service failed: {0}")]
    Dispatch(#[from] DispatchError),
    /// No completion notification arrived within the wait bound
    #[error("no completion within {}ms", .0.as_millis())]
    Timeout(Duration),
    /// Internal gateway failure
    #[error("internal gateway error: {0}")]
    Internal(String),
}

impl ActionError {
    /// HTTP status this error maps to
    pub fn status(&self) -> StatusCode {
        match self {
            ActionError::Dispatch(_) => StatusCode::BAD_GATEWAY,
            ActionError::Timeout(_) => StatusCode::REQUEST_TIMEOUT,
            ActionError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable error tag for response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            ActionError::Dispatch(_) => "dispatch_failed",
            ActionError::Timeout(_) => "timeout",
            ActionError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ActionError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        (self.status(), Json(body)).into_response()
    }
}

/// Service-level errors (startup and shutdown, not per-request).
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),
    /// Server socket bind error
    #[error("server bind error: {0}")]
    Bind(String),
    /// Downstream client construction error
    #[error("downstream client error: {0}")]
    Client(String),
    /// Internal server error
    #[error("internal error: {0}")]
    Internal(String),
}
