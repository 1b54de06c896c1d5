//! WebSocket channel subsystem.
//!
//! # Data Flow
//! ```text
//! GET / (Upgrade: websocket)
//!     → session.rs (upgrade, receive loop)
//!     → connection.rs (state machine: Connecting → Open → Closed)
//!     → protocol.rs (parse frame, build welcome / echo / error)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - One task per connection, no state shared between connections
//! - Malformed frames are answered in-protocol and never close the socket
//! - Message size and idle time are bounded

pub mod connection;
pub mod protocol;
pub mod session;

pub use connection::{CloseReason, Connection, ConnectionId, ConnectionState, ConnectionTracker};
pub use protocol::ProtocolMessage;
pub use session::ChannelContext;
