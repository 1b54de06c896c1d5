//! GenX gateway server library.
//!
//! An HTTP gateway (CORS, size-limited body decoding, exact-match dispatch,
//! uniform JSON errors) and a WebSocket welcome/echo channel sharing one
//! Axum server.

pub mod api;
pub mod channel;
pub mod clock;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteRegistrar, RouteTableBuilder};
