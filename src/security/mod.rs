//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin allow-list, credentials)
//!     → limits.rs (body size, before parsing)
//!     → Pass to body decoding
//! ```
//!
//! # Design Decisions
//! - Fail closed: oversized bodies are never parsed
//! - No trust in client-declared lengths beyond early rejection

pub mod cors;
pub mod limits;
