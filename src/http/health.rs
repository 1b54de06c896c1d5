//! Liveness endpoint.

use serde::{Deserialize, Serialize};

use crate::clock::now_iso8601;
use crate::routing::{HandlerFault, RouteTableBuilder};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: String,
    pub environment: String,
}

impl HealthStatus {
    pub fn ok(environment: &str) -> Self {
        Self {
            status: "OK".to_string(),
            timestamp: now_iso8601(),
            environment: environment.to_string(),
        }
    }
}

/// Register `GET /health`, reporting the given environment name.
pub fn register(routes: &mut RouteTableBuilder, environment: String) {
    routes.get("/health", move |_| {
        let body = serde_json::to_value(HealthStatus::ok(&environment)).map_err(HandlerFault::from);
        async move { body }
    });
}
