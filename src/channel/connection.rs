//! Connection state machine and lifecycle tracking.
//!
//! # Responsibilities
//! - Track connection state (Connecting → Open → Closed)
//! - Generate unique connection IDs for tracing
//! - Turn inbound frames into protocol replies while open
//! - Count live connections
//!
//! # Design Decisions
//! - Pure state machine: no I/O, driven by `session.rs`
//! - Welcome is produced by the only `Connecting → Open` transition,
//!   so it is emitted exactly once and always first
//! - Nothing is produced once `Closed`

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::channel::protocol::{reply_to, ProtocolMessage};
use crate::observability::metrics;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Connection state for lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Upgrade accepted, welcome not yet produced.
    Connecting,
    /// Welcome sent; frames are answered.
    Open,
    /// Closed by either peer, a transport error, or the server.
    Closed,
}

/// Why a connection reached `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    PeerClosed,
    TransportError,
    IdleTimeout,
    ServerShutdown,
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            CloseReason::PeerClosed => "peer_closed",
            CloseReason::TransportError => "transport_error",
            CloseReason::IdleTimeout => "idle_timeout",
            CloseReason::ServerShutdown => "server_shutdown",
        };
        f.write_str(reason)
    }
}

/// One channel conversation.
#[derive(Debug)]
pub struct Connection {
    id: ConnectionId,
    state: ConnectionState,
    welcome: String,
    frames: u64,
}

impl Connection {
    pub fn new(welcome: impl Into<String>) -> Self {
        Self {
            id: ConnectionId::new(),
            state: ConnectionState::Connecting,
            welcome: welcome.into(),
            frames: 0,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Number of frames answered so far.
    pub fn frames_handled(&self) -> u64 {
        self.frames
    }

    /// `Connecting → Open`. Yields the welcome message on the first call only.
    pub fn open(&mut self) -> Option<ProtocolMessage> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        self.state = ConnectionState::Open;
        Some(ProtocolMessage::welcome(self.welcome.as_str()))
    }

    /// Answer one inbound frame. `None` unless the connection is open.
    pub fn on_frame(&mut self, frame: &[u8]) -> Option<ProtocolMessage> {
        if self.state != ConnectionState::Open {
            return None;
        }
        self.frames += 1;
        Some(reply_to(frame))
    }

    /// Move to `Closed`. Returns false if it was already closed.
    pub fn close(&mut self, reason: CloseReason) -> bool {
        if self.state == ConnectionState::Closed {
            return false;
        }
        tracing::debug!(connection_id = %self.id, reason = %reason, frames = self.frames, "Connection closed");
        self.state = ConnectionState::Closed;
        true
    }
}

/// Counts live connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionTracker {
    active_count: Arc<AtomicU64>,
}

impl ConnectionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new live connection. Returns a guard that decrements on drop.
    pub fn track(&self) -> ConnectionGuard {
        self.active_count.fetch_add(1, Ordering::SeqCst);
        metrics::connection_opened();
        ConnectionGuard {
            active_count: Arc::clone(&self.active_count),
        }
    }

    /// Get current active connection count.
    pub fn active_count(&self) -> u64 {
        self.active_count.load(Ordering::SeqCst)
    }
}

/// Guard that decrements active connection count on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    active_count: Arc<AtomicU64>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active_count.fetch_sub(1, Ordering::SeqCst);
        metrics::connection_closed();
    }
}
