//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, parsable addresses)
//! - Validate CORS origins are usable header values
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderValue;
use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("environment must not be empty")]
    EmptyEnvironment,

    #[error("cors.allowed_origins entry `{0}` is not a valid origin")]
    Origin(String),

    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),

    #[error("channel.max_message_bytes must be greater than zero")]
    ZeroMessageSize,

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),
}

/// Check a configuration, collecting every error found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.environment.trim().is_empty() {
        errors.push(ValidationError::EmptyEnvironment);
    }

    for origin in &config.cors.allowed_origins {
        if !is_valid_origin(origin) {
            errors.push(ValidationError::Origin(origin.clone()));
        }
    }

    if config.limits.json_limit_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("json_limit_bytes"));
    }
    if config.limits.form_limit_bytes == 0 {
        errors.push(ValidationError::ZeroLimit("form_limit_bytes"));
    }

    if config.channel.max_message_bytes == 0 {
        errors.push(ValidationError::ZeroMessageSize);
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Origins are `scheme://host[:port]` with no path and no wildcard.
fn is_valid_origin(origin: &str) -> bool {
    if origin == "*" || HeaderValue::from_str(origin).is_err() {
        return false;
    }
    match origin.split_once("://") {
        Some((scheme, rest)) => {
            !scheme.is_empty() && !rest.is_empty() && !rest.contains('/')
        }
        None => false,
    }
}
