//! Shared utilities for integration tests.

use std::net::SocketAddr;
use std::time::Duration;

use axum::body::Body;
use axum::http::Response;
use genx_server::api::ApiRoutes;
use genx_server::channel::ConnectionTracker;
use genx_server::routing::{HandlerFault, RouteRegistrar, RouteTableBuilder};
use genx_server::{HttpServer, ServerConfig, Shutdown};
use serde_json::Value;
use tokio::net::TcpListener;

/// The production routes plus handlers that fail on purpose.
pub struct TestRoutes;

impl RouteRegistrar for TestRoutes {
    fn register(&self, routes: &mut RouteTableBuilder) {
        ApiRoutes.register(routes);
        routes
            .get("/api/error", |_| async { Err(HandlerFault::new("Test error")) })
            .get("/api/panic", |_| async {
                if true {
                    panic!("handler exploded");
                }
                Ok(Value::Null)
            });
    }
}

/// Default config for the given environment.
pub fn config_for(environment: &str) -> ServerConfig {
    let mut config = ServerConfig::default();
    config.environment = environment.to_string();
    config
}

/// Server built with [`TestRoutes`], for driving the stack without a socket.
pub fn build_server(config: ServerConfig) -> HttpServer {
    HttpServer::new(config, &TestRoutes)
}

/// A server listening on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub connections: ConnectionTracker,
}

#[allow(dead_code)]
impl TestServer {
    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn ws_url(&self) -> String {
        format!("ws://{}/", self.addr)
    }
}

/// Bind `127.0.0.1:0` and serve until the returned shutdown is triggered.
pub async fn spawn_server(config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = build_server(config);
    let shutdown = server.shutdown_handle();
    let connections = server.connections();

    tokio::spawn(async move {
        let _ = server.run(listener).await;
    });

    TestServer {
        addr,
        shutdown,
        connections,
    }
}

/// Read a whole response body as JSON.
#[allow(dead_code)]
pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Poll until `check` holds or the timeout elapses.
#[allow(dead_code)]
pub async fn wait_until(timeout: Duration, check: impl Fn() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
