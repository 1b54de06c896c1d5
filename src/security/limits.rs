//! Request body size limits.
//!
//! # Responsibilities
//! - Reject bodies whose declared `Content-Length` exceeds the limit
//! - Stop reading as soon as streamed bytes exceed the limit
//! - Hand back the complete body only when it fits
//!
//! # Design Decisions
//! - Limits checked before any parsing (early rejection)
//! - A body of exactly `limit` bytes is accepted
//! - Return 413 Payload Too Large, never a truncated body

use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap};
use futures_util::StreamExt;

use crate::http::response::GatewayError;

/// Declared body length, if the client sent a parsable `Content-Length`.
pub fn declared_length(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Read a request body, failing with `PayloadTooLarge` once it exceeds `limit`.
pub async fn read_limited(
    body: Body,
    declared: Option<u64>,
    limit: usize,
) -> Result<Bytes, GatewayError> {
    if declared.is_some_and(|len| len > limit as u64) {
        return Err(GatewayError::PayloadTooLarge { limit });
    }

    let mut buffer = Vec::with_capacity(declared.map_or(0, |len| len as usize));
    let mut stream = body.into_data_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            tracing::debug!(error = %e, "Request body read failed");
            GatewayError::BadRequest("Failed to read request body".to_string())
        })?;
        if buffer.len() + chunk.len() > limit {
            return Err(GatewayError::PayloadTooLarge { limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(Bytes::from(buffer))
}
