//! Business routes served by the binary.
//!
//! The gateway treats these as an external collaborator: they are plugged
//! in through [`RouteRegistrar`] like any other route set.

use serde_json::json;

use crate::routing::{RouteRegistrar, RouteTableBuilder};

/// `GET /api/test` and `POST /api/data`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiRoutes;

impl RouteRegistrar for ApiRoutes {
    fn register(&self, routes: &mut RouteTableBuilder) {
        routes
            .get("/api/test", |_| async { Ok(json!({ "message": "test endpoint" })) })
            .post("/api/data", |request| async move {
                Ok(json!({ "received": request.body }))
            });
    }
}

/// Registrar that adds nothing; the gateway then serves `/health` only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRoutes;

impl RouteRegistrar for NoRoutes {
    fn register(&self, _routes: &mut RouteTableBuilder) {}
}
