//! Per-connection receive loop.
//!
//! Drives a [`Connection`] from the socket: welcome first, then one reply per
//! inbound frame in arrival order, until the peer leaves, the transport
//! fails, the connection idles out, or the server shuts down.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;

use crate::channel::connection::{CloseReason, Connection, ConnectionTracker};
use crate::channel::protocol::ProtocolMessage;
use crate::config::ChannelConfig;
use crate::lifecycle::Shutdown;
use crate::observability::metrics;

/// Everything a session needs from the server, cloned per connection.
#[derive(Clone)]
pub struct ChannelContext {
    pub config: Arc<ChannelConfig>,
    pub tracker: ConnectionTracker,
    pub shutdown: Shutdown,
}

/// Complete the upgrade and hand the socket to [`run`].
pub fn upgrade(ws: WebSocketUpgrade, ctx: ChannelContext) -> Response {
    let max = ctx.config.max_message_bytes;
    ws.max_message_size(max)
        .max_frame_size(max)
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| run(socket, ctx))
}

enum Inbound {
    Frame(Vec<u8>),
    Control,
    Closed,
    Failed(axum::Error),
    Idle,
}

/// Serve one connection until it closes.
pub async fn run(mut socket: WebSocket, ctx: ChannelContext) {
    let _guard = ctx.tracker.track();
    let shutdown = ctx.shutdown.triggered();
    tokio::pin!(shutdown);
    let mut conn = Connection::new(ctx.config.welcome_message.as_str());
    let idle = idle_timeout(&ctx.config);

    tracing::info!(connection_id = %conn.id(), "Channel client connected");

    if let Some(welcome) = conn.open() {
        if let Err(e) = send(&mut socket, &welcome).await {
            tracing::warn!(connection_id = %conn.id(), error = %e, "Failed to send welcome");
            conn.close(CloseReason::TransportError);
            return;
        }
    }

    let reason = loop {
        let inbound = tokio::select! {
            _ = &mut shutdown => break CloseReason::ServerShutdown,
            inbound = next_inbound(&mut socket, idle) => inbound,
        };

        match inbound {
            Inbound::Frame(payload) => {
                let Some(reply) = conn.on_frame(&payload) else {
                    continue;
                };
                metrics::record_frame(reply.kind());
                if let ProtocolMessage::Error { .. } = reply {
                    tracing::debug!(connection_id = %conn.id(), bytes = payload.len(), "Invalid frame");
                }
                if let Err(e) = send(&mut socket, &reply).await {
                    tracing::warn!(connection_id = %conn.id(), error = %e, "Failed to send reply");
                    break CloseReason::TransportError;
                }
            }
            Inbound::Control => continue,
            Inbound::Closed => break CloseReason::PeerClosed,
            Inbound::Failed(e) => {
                tracing::warn!(connection_id = %conn.id(), error = %e, "Channel transport error");
                break CloseReason::TransportError;
            }
            Inbound::Idle => break CloseReason::IdleTimeout,
        }
    };

    if let Some(frame) = close_frame(reason) {
        let _ = socket.send(Message::Close(Some(frame))).await;
    }
    conn.close(reason);

    tracing::info!(
        connection_id = %conn.id(),
        reason = %reason,
        frames = conn.frames_handled(),
        "Channel client disconnected"
    );
}

fn idle_timeout(config: &ChannelConfig) -> Option<Duration> {
    match config.idle_timeout_secs {
        0 => None,
        secs => Some(Duration::from_secs(secs)),
    }
}

async fn next_inbound(socket: &mut WebSocket, idle: Option<Duration>) -> Inbound {
    let received = match idle {
        Some(limit) => match tokio::time::timeout(limit, socket.recv()).await {
            Ok(received) => received,
            Err(_) => return Inbound::Idle,
        },
        None => socket.recv().await,
    };

    match received {
        None => Inbound::Closed,
        Some(Err(e)) => Inbound::Failed(e),
        Some(Ok(Message::Text(text))) => Inbound::Frame(text.as_str().as_bytes().to_vec()),
        Some(Ok(Message::Binary(bytes))) => Inbound::Frame(bytes.to_vec()),
        Some(Ok(Message::Close(_))) => Inbound::Closed,
        // Pongs are queued by the transport itself.
        Some(Ok(Message::Ping(_) | Message::Pong(_))) => Inbound::Control,
    }
}

async fn send(socket: &mut WebSocket, message: &ProtocolMessage) -> Result<(), axum::Error> {
    let json = message.to_json().map_err(axum::Error::new)?;
    socket.send(Message::Text(json.into())).await
}

/// Server-initiated closes carry a code; peer and transport closes do not.
fn close_frame(reason: CloseReason) -> Option<CloseFrame> {
    match reason {
        CloseReason::IdleTimeout => Some(CloseFrame {
            code: close_code::NORMAL,
            reason: "idle timeout".into(),
        }),
        CloseReason::ServerShutdown => Some(CloseFrame {
            code: close_code::AWAY,
            reason: "server shutting down".into(),
        }),
        CloseReason::PeerClosed | CloseReason::TransportError => None,
    }
}
