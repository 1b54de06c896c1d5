//! Route handler types.
//!
//! Handlers receive an owned [`RouteRequest`] with the body already decoded
//! and return either a JSON value (sent with 200) or a [`HandlerFault`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::{HeaderMap, Method};
use serde_json::Value;
use thiserror::Error;

/// A request as seen by route handlers.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub method: Method,
    /// Path without the query string.
    pub path: String,
    /// Path plus query string, as sent by the client.
    pub original_url: String,
    pub headers: HeaderMap,
    /// Decoded body; `{}` when the request carried none.
    pub body: Value,
}

impl RouteRequest {
    /// Value of a header, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// A failure raised inside a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
}

impl HandlerFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<serde_json::Error> for HandlerFault {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

pub type HandlerResult = Result<Value, HandlerFault>;

pub type HandlerFuture = Pin<Box<dyn Future<Output = HandlerResult> + Send>>;

/// Type-erased handler stored in the route table.
pub type BoxedHandler = Arc<dyn Fn(RouteRequest) -> HandlerFuture + Send + Sync>;

pub(crate) fn boxed<F, Fut>(handler: F) -> BoxedHandler
where
    F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(move |request| Box::pin(handler(request)) as HandlerFuture)
}
