//! Request handling.
//!
//! # Responsibilities
//! - Read the request ID assigned at the edge
//! - Build the [`RouteRequest`] handed to route handlers
//!
//! # Design Decisions
//! - Request ID is set by `SetRequestIdLayer` before anything else runs
//! - The original URL (path + query) is preserved for 404 diagnostics

use axum::http::{request::Parts, HeaderMap, Request, Uri};

use crate::http::body::DecodedBody;
use crate::routing::RouteRequest;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Access to the request ID, if one was assigned.
pub trait RequestIdExt {
    fn request_id(&self) -> Option<&str>;
}

impl RequestIdExt for HeaderMap {
    fn request_id(&self) -> Option<&str> {
        self.get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
    }
}

impl<B> RequestIdExt for Request<B> {
    fn request_id(&self) -> Option<&str> {
        self.headers().request_id()
    }
}

/// Path plus query, exactly as requested.
pub fn original_url(uri: &Uri) -> String {
    uri.path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Convert request parts into the handler-facing request.
pub fn route_request(parts: Parts) -> RouteRequest {
    let body = parts
        .extensions
        .get::<DecodedBody>()
        .cloned()
        .unwrap_or_default()
        .0;

    RouteRequest {
        original_url: original_url(&parts.uri),
        path: parts.uri.path().to_string(),
        method: parts.method,
        headers: parts.headers,
        body,
    }
}
