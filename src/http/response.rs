//! Error normalization.
//!
//! # Responsibilities
//! - Define the gateway failure taxonomy
//! - Map each failure to its HTTP status code
//! - Render the uniform JSON error envelope
//!
//! # Design Decisions
//! - Every failure is rendered at a single boundary
//! - Only handler faults are subject to verbosity redaction
//! - Envelope fields that do not apply are omitted, not null

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::schema::DEVELOPMENT;
use crate::routing::HandlerFault;

/// Placeholder message for handler faults outside development.
pub const REDACTED_MESSAGE: &str = "Something went wrong";

/// Message attached to malformed JSON bodies and frames.
pub const INVALID_JSON: &str = "Invalid JSON format";

/// How much handler-fault detail reaches the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbosityMode {
    /// Raw fault text is returned.
    Verbose,
    /// A fixed placeholder replaces the fault text.
    Redacted,
}

impl VerbosityMode {
    /// Development is verbose; every other environment is redacted.
    pub fn from_environment(environment: &str) -> Self {
        if environment == DEVELOPMENT {
            VerbosityMode::Verbose
        } else {
            VerbosityMode::Redacted
        }
    }
}

/// Uniform JSON body of every failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// Everything that can go wrong between accepting a request and answering it.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("no route for {path}")]
    NotFound { path: String },

    #[error("handler failed: {0}")]
    Handler(#[from] HandlerFault),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::NotFound { .. } => StatusCode::NOT_FOUND,
            GatewayError::Handler(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Build the envelope, redacting handler detail when asked to.
    pub fn envelope(&self, mode: VerbosityMode) -> ErrorEnvelope {
        match self {
            GatewayError::BadRequest(message) => ErrorEnvelope {
                error: "Bad request".to_string(),
                message: Some(message.clone()),
                path: None,
            },
            GatewayError::PayloadTooLarge { limit } => ErrorEnvelope {
                error: "Payload too large".to_string(),
                message: Some(format!("Request body exceeds {} bytes", limit)),
                path: None,
            },
            GatewayError::NotFound { path } => ErrorEnvelope {
                error: "Not found".to_string(),
                message: None,
                path: Some(path.clone()),
            },
            GatewayError::Handler(fault) => internal_error(fault.message(), mode),
        }
    }

    /// Render as a complete HTTP response.
    pub fn render(&self, mode: VerbosityMode) -> Response {
        (self.status(), Json(self.envelope(mode))).into_response()
    }
}

/// Envelope for a 500.
pub fn internal_error(detail: &str, mode: VerbosityMode) -> ErrorEnvelope {
    let message = match mode {
        VerbosityMode::Verbose => detail.to_string(),
        VerbosityMode::Redacted => REDACTED_MESSAGE.to_string(),
    };
    ErrorEnvelope {
        error: "Internal server error".to_string(),
        message: Some(message),
        path: None,
    }
}
