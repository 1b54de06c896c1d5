//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     gateway routes (/health)
//!     → RouteRegistrar::register (business routes)
//!     → RouteTableBuilder::build
//!     → Freeze as immutable RouteTable
//!
//! Per request:
//!     (method, path)
//!     → router.rs (ordered scan)
//!     → matcher.rs (exact method + path)
//!     → Return: handler or no-match (404)
//! ```
//!
//! # Design Decisions
//! - Routes registered at startup, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First match wins (registration order)

pub mod handler;
pub mod matcher;
pub mod router;

pub use handler::{BoxedHandler, HandlerFault, HandlerFuture, HandlerResult, RouteRequest};
pub use router::{RouteRegistrar, RouteTable, RouteTableBuilder};
