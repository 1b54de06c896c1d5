//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum Router with the gateway middleware stack
//! - Dispatch requests through the immutable route table
//! - Hand WebSocket upgrades at `/` to the channel
//! - Normalize every failure into the JSON error envelope
//! - Bind server to listener with graceful shutdown
//!
//! # Middleware Order (outer → inner)
//! ```text
//! TraceLayer → SetRequestId → PropagateRequestId → CORS → CatchPanic
//!     → decode_body → dispatch (routes, then 404)
//! ```

use std::any::Any;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ws::rejection::WebSocketUpgradeRejection, ws::WebSocketUpgrade, Request, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::channel::{session, ChannelContext, ConnectionTracker};
use crate::config::{LimitsConfig, ServerConfig};
use crate::http::body::decode_body;
use crate::http::health;
use crate::http::request::{original_url, route_request, RequestIdExt};
use crate::http::response::{GatewayError, VerbosityMode};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::{HandlerFault, RouteRegistrar, RouteTable};
use crate::security::cors::cors_layer;

/// Application state injected into handlers and middleware.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<RouteTable>,
    pub verbosity: VerbosityMode,
    pub limits: LimitsConfig,
    pub channel: ChannelContext,
}

/// HTTP server for the gateway and the channel.
pub struct HttpServer {
    router: Router,
    config: ServerConfig,
    shutdown: Shutdown,
    connections: ConnectionTracker,
}

impl HttpServer {
    /// Create a new server. `/health` is registered first, then the
    /// registrar's routes.
    pub fn new(config: ServerConfig, registrar: &dyn RouteRegistrar) -> Self {
        let mut builder = RouteTable::builder();
        health::register(&mut builder, config.environment.clone());
        builder.register(registrar);
        let routes = Arc::new(builder.build());

        tracing::info!(routes = routes.len(), environment = %config.environment, "Route table built");

        let shutdown = Shutdown::new();
        let connections = ConnectionTracker::new();

        let state = AppState {
            routes,
            verbosity: VerbosityMode::from_environment(&config.environment),
            limits: config.limits,
            channel: ChannelContext {
                config: Arc::new(config.channel.clone()),
                tracker: connections.clone(),
                shutdown: shutdown.clone(),
            },
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            shutdown,
            connections,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &ServerConfig, state: AppState) -> Router {
        let verbosity = state.verbosity;

        Router::new()
            .route("/", any(root_handler))
            .fallback(dispatch)
            .layer(middleware::from_fn_with_state(state.clone(), decode_body))
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(cors_layer(&config.cors))
                    .layer(CatchPanicLayer::custom(
                        move |panic: Box<dyn Any + Send + 'static>| panic_response(panic, verbosity),
                    )),
            )
    }

    /// Run the server until the shutdown handle is triggered.
    pub async fn run(self, listener: TcpListener) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(self.shutdown.triggered())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// A copy of the router, for driving the stack without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Handle that stops the server and closes open channel sessions.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    /// Live channel connection count.
    pub fn connections(&self) -> ConnectionTracker {
        self.connections.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}

/// `/` serves the channel for upgrade requests and the route table otherwise.
async fn root_handler(
    State(state): State<AppState>,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    request: Request,
) -> Response {
    match upgrade {
        Ok(ws) => session::upgrade(ws, state.channel.clone()),
        Err(_) => dispatch(State(state), request).await,
    }
}

/// Route lookup and handler invocation; the outermost error boundary.
async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let start_time = Instant::now();
    let request_id = request.request_id().unwrap_or("unknown").to_string();
    let method = request.method().clone();
    let url = original_url(request.uri());

    let response = match call_route(&state, request).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => {
            match &err {
                GatewayError::Handler(fault) => {
                    tracing::error!(request_id = %request_id, method = %method, url = %url, error = %fault, "Handler failed");
                }
                other => {
                    tracing::debug!(request_id = %request_id, method = %method, url = %url, error = %other, "Request rejected");
                }
            }
            err.render(state.verbosity)
        }
    };

    metrics::record_request(method.as_str(), response.status().as_u16(), start_time);
    response
}

async fn call_route(state: &AppState, request: Request) -> Result<serde_json::Value, GatewayError> {
    let (parts, _body) = request.into_parts();
    let handler = state
        .routes
        .find(&parts.method, parts.uri.path())
        .ok_or_else(|| GatewayError::NotFound {
            path: original_url(&parts.uri),
        })?;

    Ok(handler(route_request(parts)).await?)
}

/// Render a panic that escaped a handler as a 500.
fn panic_response(panic: Box<dyn Any + Send + 'static>, verbosity: VerbosityMode) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "handler panicked".to_string()
    };

    tracing::error!(error = %detail, "Handler panicked");
    GatewayError::Handler(HandlerFault::new(detail)).render(verbosity)
}
