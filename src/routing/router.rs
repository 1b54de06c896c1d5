//! Route table and registration.
//!
//! # Responsibilities
//! - Collect routes from the gateway and from external registrars
//! - Look up the handler for a method + path
//! - Return an explicit no-match rather than a silent default
//!
//! # Design Decisions
//! - Immutable after `build()` (shared behind `Arc` without locks)
//! - O(n) scan in registration order: first match wins

use std::future::Future;

use axum::http::Method;

use crate::routing::handler::{boxed, BoxedHandler, HandlerResult, RouteRequest};
use crate::routing::matcher::{ExactMatcher, Matcher};

/// Plug-in point for business routes.
pub trait RouteRegistrar: Send + Sync {
    fn register(&self, routes: &mut RouteTableBuilder);
}

struct Route {
    matcher: ExactMatcher,
    handler: BoxedHandler,
}

/// Immutable, ordered set of routes.
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder { routes: Vec::new() }
    }

    /// First handler whose matcher accepts the method and path.
    pub fn find(&self, method: &Method, path: &str) -> Option<&BoxedHandler> {
        self.routes
            .iter()
            .find(|route| route.matcher.matches(method, path))
            .map(|route| &route.handler)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl std::fmt::Debug for RouteTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.routes.iter().map(|r| &r.matcher))
            .finish()
    }
}

/// Builder collecting routes in registration order.
pub struct RouteTableBuilder {
    routes: Vec<Route>,
}

impl RouteTableBuilder {
    pub fn route<F, Fut>(&mut self, method: Method, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        tracing::debug!(method = %method, path = %path, "Route registered");
        self.routes.push(Route {
            matcher: ExactMatcher::new(method, path),
            handler: boxed(handler),
        });
        self
    }

    pub fn get<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<F, Fut>(&mut self, path: &str, handler: F) -> &mut Self
    where
        F: Fn(RouteRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        self.route(Method::POST, path, handler)
    }

    /// Let an external registrar add its routes.
    pub fn register(&mut self, registrar: &dyn RouteRegistrar) -> &mut Self {
        registrar.register(self);
        self
    }

    pub fn build(self) -> RouteTable {
        RouteTable {
            routes: self.routes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use serde_json::{json, Value};

    fn request(method: Method, path: &str) -> RouteRequest {
        RouteRequest {
            method,
            path: path.to_string(),
            original_url: path.to_string(),
            headers: HeaderMap::new(),
            body: json!({}),
        }
    }

    struct Pinger;

    impl RouteRegistrar for Pinger {
        fn register(&self, routes: &mut RouteTableBuilder) {
            routes.get("/ping", |_| async { Ok(json!("pong")) });
        }
    }

    #[tokio::test]
    async fn first_registered_match_wins() {
        let mut builder = RouteTable::builder();
        builder
            .get("/dup", |_| async { Ok(json!(1)) })
            .get("/dup", |_| async { Ok(json!(2)) });
        let table = builder.build();

        let handler = table.find(&Method::GET, "/dup").unwrap();
        let value: Value = handler(request(Method::GET, "/dup")).await.unwrap();
        assert_eq!(value, json!(1));
    }

    #[tokio::test]
    async fn registrars_contribute_routes() {
        let mut builder = RouteTable::builder();
        builder.register(&Pinger);
        let table = builder.build();

        assert_eq!(table.len(), 1);
        let handler = table.find(&Method::GET, "/ping").unwrap();
        assert_eq!(handler(request(Method::GET, "/ping")).await.unwrap(), json!("pong"));
    }

    #[test]
    fn unmatched_lookup_is_none() {
        let mut builder = RouteTable::builder();
        builder.post("/api/data", |req| async move { Ok(req.body) });
        let table = builder.build();

        assert!(table.find(&Method::GET, "/api/data").is_none());
        assert!(table.find(&Method::POST, "/api/other").is_none());
        assert!(RouteTable::builder().build().is_empty());
    }
}
