//! Channel wire messages.
//!
//! Every outbound message is a JSON object tagged by `type`:
//!
//! ```text
//! {"type":"welcome","message":"...","timestamp":"2024-05-01T12:00:00.000Z"}
//! {"type":"echo","data":<parsed frame>,"timestamp":"..."}
//! {"type":"error","message":"Invalid JSON format"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::clock::now_iso8601;
use crate::http::response::INVALID_JSON;

/// Outbound protocol message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProtocolMessage {
    Welcome { message: String, timestamp: String },
    Echo { data: Value, timestamp: String },
    Error { message: String },
}

impl ProtocolMessage {
    pub fn welcome(message: impl Into<String>) -> Self {
        ProtocolMessage::Welcome {
            message: message.into(),
            timestamp: now_iso8601(),
        }
    }

    pub fn echo(data: Value) -> Self {
        ProtocolMessage::Echo {
            data,
            timestamp: now_iso8601(),
        }
    }

    pub fn invalid_json() -> Self {
        ProtocolMessage::Error {
            message: INVALID_JSON.to_string(),
        }
    }

    /// The `type` tag, for logs and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ProtocolMessage::Welcome { .. } => "welcome",
            ProtocolMessage::Echo { .. } => "echo",
            ProtocolMessage::Error { .. } => "error",
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Interpret one inbound frame. Payloads that are not UTF-8 JSON are errors.
pub fn reply_to(frame: &[u8]) -> ProtocolMessage {
    match serde_json::from_slice::<Value>(frame) {
        Ok(data) => ProtocolMessage::echo(data),
        Err(_) => ProtocolMessage::invalid_json(),
    }
}
