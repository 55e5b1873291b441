// src/errors.rs
// DOCUMENTATION: Custom error types and HTTP responses
// PURPOSE: Centralized error handling for entire application

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;

/// Application-specific error types
/// DOCUMENTATION: Maps every failure the service can surface to an HTTP
/// status code and JSON error response. Upstream provider trouble is
/// recovered internally and should normally never reach the client as an
/// error status; the variants exist so the composition root has something
/// typed to recover from.
#[derive(Error, Debug)]
pub enum ProximityError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Provider unavailable: {0}")]
    #[allow(dead_code)]
    ProviderUnavailable(String),

    #[error("All providers exhausted: {0}")]
    SearchExhausted(String),

    #[error("Unauthorized access")]
    Unauthorized,

    #[error("Internal server error")]
    #[allow(dead_code)]
    Internal(String),
}

/// Convert ProximityError to HTTP response
/// DOCUMENTATION: Maps error types to HTTP status codes and JSON responses.
/// Internal detail is logged server-side only; the body carries a generic
/// message for the Internal variant.
impl ResponseError for ProximityError {
    fn error_response(&self) -> HttpResponse {
        let (status, error_code) = match self {
            ProximityError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
            ProximityError::ProviderUnavailable(_) => {
                (StatusCode::BAD_GATEWAY, "PROVIDER_UNAVAILABLE")
            }
            ProximityError::SearchExhausted(_) => (StatusCode::BAD_GATEWAY, "SEARCH_EXHAUSTED"),
            ProximityError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ProximityError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let message = match self {
            ProximityError::Internal(detail) => {
                log::error!("Internal fault: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = json!({
            "success": false,
            "error": {
                "code": error_code,
                "message": message,
                "timestamp": chrono::Utc::now().to_rfc3339()
            }
        });

        HttpResponse::build(status).json(body)
    }

    fn status_code(&self) -> StatusCode {
        match self {
            ProximityError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ProximityError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            ProximityError::SearchExhausted(_) => StatusCode::BAD_GATEWAY,
            ProximityError::Unauthorized => StatusCode::UNAUTHORIZED,
            ProximityError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Single retryable-failure cause observed against one upstream endpoint
/// DOCUMENTATION: Timeouts, connection errors, bad statuses and unparseable
/// payloads all collapse into this one tagged type before any retry
/// decision is made, so the fallback/retry loops stay cause-agnostic.
#[derive(Debug, Clone)]
pub enum ProviderFailure {
    /// Request exceeded its deadline
    Timeout,
    /// Connection-level error (DNS, refused, reset, TLS)
    Network(String),
    /// Non-2xx HTTP status from the endpoint
    Status(u16),
    /// Body did not match the expected wire shape
    Payload(String),
}

impl ProviderFailure {
    /// Collapse a reqwest error into a tagged failure cause
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderFailure::Timeout
        } else if err.is_decode() {
            ProviderFailure::Payload(err.to_string())
        } else {
            ProviderFailure::Network(err.to_string())
        }
    }
}

impl std::fmt::Display for ProviderFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderFailure::Timeout => write!(f, "request timed out"),
            ProviderFailure::Network(detail) => write!(f, "network error: {}", detail),
            ProviderFailure::Status(code) => write!(f, "unexpected status {}", code),
            ProviderFailure::Payload(detail) => write!(f, "malformed payload: {}", detail),
        }
    }
}
