//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → security::cors (allow-list)
//!     → body.rs (content-type, size limit, decode)
//!     → server.rs dispatch (route table lookup)
//!         → handler JSON (200)
//!         → response.rs (error envelope: 400 / 404 / 413 / 500)
//!     → Send to client
//!
//! GET / with Upgrade: websocket
//!     → channel::session
//! ```

pub mod body;
pub mod health;
pub mod request;
pub mod response;
pub mod server;

pub use request::{RequestIdExt, X_REQUEST_ID};
pub use response::{ErrorEnvelope, GatewayError, VerbosityMode};
pub use server::HttpServer;
