//! Common error types for Replenish
//!
//! This module defines the error taxonomy shared by the proxy and the client.
//! All errors map to an HTTP status code so the proxy can answer every failure
//! with a structured body.

use http::StatusCode;
use serde_json::Value;
use std::net::AddrParseError;
use thiserror::Error;

/// Main error type for Replenish
#[derive(Error, Debug)]
pub enum ReplenishError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// One or more form fields failed validation (client-local)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport-level failure calling the upstream service
    #[error("Upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    /// The upstream call exceeded its time budget
    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    /// Upstream answered with a body that is not JSON
    #[error("Upstream returned a non-JSON body ({} bytes)", raw.len())]
    UpstreamMalformed { raw: String },

    /// Upstream answered with a non-success status
    #[error("Upstream rejected the request: {status} {status_text}")]
    UpstreamRejected {
        status: u16,
        status_text: String,
        details: Value,
        raw: String,
    },

    /// A success response lacking a required field
    #[error("Incomplete response: {0}")]
    ResponseIncomplete(String),

    /// Request body could not be understood
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AddrParseError> for ReplenishError {
    fn from(err: AddrParseError) -> Self {
        ReplenishError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for ReplenishError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ReplenishError::UpstreamTimeout(err.to_string())
        } else if err.is_builder() {
            ReplenishError::Internal(format!("HTTP client error: {}", err))
        } else {
            ReplenishError::UpstreamUnreachable(err.to_string())
        }
    }
}

impl From<config::ConfigError> for ReplenishError {
    fn from(err: config::ConfigError) -> Self {
        ReplenishError::Config(err.to_string())
    }
}

impl ReplenishError {
    /// HTTP status the proxy answers with for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReplenishError::UpstreamRejected { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ReplenishError::UpstreamMalformed { .. } => StatusCode::BAD_GATEWAY,
            ReplenishError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ReplenishError::ResponseIncomplete(_) => StatusCode::BAD_GATEWAY,
            ReplenishError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            // Local failures, including unreadable request bodies, are all reported as 500
            ReplenishError::UpstreamUnreachable(_)
            | ReplenishError::InvalidInput(_)
            | ReplenishError::Config(_)
            | ReplenishError::Serialization(_)
            | ReplenishError::Io(_)
            | ReplenishError::Parse(_)
            | ReplenishError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short stable label, used for metrics and log fields
    pub fn kind(&self) -> &'static str {
        match self {
            ReplenishError::Config(_) => "config",
            ReplenishError::Validation(_) => "validation",
            ReplenishError::UpstreamUnreachable(_) => "upstream_unreachable",
            ReplenishError::UpstreamTimeout(_) => "upstream_timeout",
            ReplenishError::UpstreamMalformed { .. } => "upstream_malformed",
            ReplenishError::UpstreamRejected { .. } => "upstream_rejected",
            ReplenishError::ResponseIncomplete(_) => "response_incomplete",
            ReplenishError::InvalidInput(_) => "invalid_input",
            ReplenishError::Serialization(_) => "serialization",
            ReplenishError::Io(_) => "io",
            ReplenishError::Parse(_) => "parse",
            ReplenishError::Internal(_) => "internal",
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        ReplenishError::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        ReplenishError::InvalidInput(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        ReplenishError::UpstreamTimeout(msg.into())
    }

    /// Create an upstream unreachable error
    pub fn unreachable(msg: impl Into<String>) -> Self {
        ReplenishError::UpstreamUnreachable(msg.into())
    }

    /// Create an incomplete response error
    pub fn incomplete(msg: impl Into<String>) -> Self {
        ReplenishError::ResponseIncomplete(msg.into())
    }
}

/// Result type alias for Replenish operations
pub type Result<T> = std::result::Result<T, ReplenishError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejected_keeps_upstream_status() {
        let err = ReplenishError::UpstreamRejected {
            status: 503,
            status_text: "Service Unavailable".to_string(),
            details: json!({ "detail": "overloaded" }),
            raw: "{\"detail\":\"overloaded\"}".to_string(),
        };

        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.kind(), "upstream_rejected");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ReplenishError::UpstreamMalformed { raw: "oops".into() }.status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            ReplenishError::timeout("30s elapsed").status_code(),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ReplenishError::unreachable("connection refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ReplenishError::invalid_input("not json").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_malformed_display_does_not_echo_raw_body() {
        let err = ReplenishError::UpstreamMalformed {
            raw: "<html>secret</html>".to_string(),
        };
        assert!(!err.to_string().contains("secret"));
    }
}
