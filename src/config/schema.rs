//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Name of the environment that surfaces raw handler errors.
pub const DEVELOPMENT: &str = "development";

/// Root configuration for the server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Deployment environment name, echoed by `/health`.
    pub environment: String,

    /// Cross-origin policy.
    pub cors: CorsConfig,

    /// Request body limits.
    pub limits: LimitsConfig,

    /// WebSocket channel settings.
    pub channel: ChannelConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            environment: DEVELOPMENT.to_string(),
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            channel: ChannelConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Whether the configured environment is the development one.
    pub fn is_development(&self) -> bool {
        self.environment == DEVELOPMENT
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:5000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:5000".to_string(),
        }
    }
}

/// CORS allow-list.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins that receive `Access-Control-Allow-Origin`.
    pub allowed_origins: Vec<String>,

    /// Emit `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec![
                "http://localhost:3000".to_string(),
                "http://0.0.0.0:3000".to_string(),
            ],
            allow_credentials: true,
        }
    }
}

/// Body size limits, in bytes, per decoded content type.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum `application/json` body size.
    pub json_limit_bytes: usize,

    /// Maximum `application/x-www-form-urlencoded` body size.
    pub form_limit_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            json_limit_bytes: 10 * 1024 * 1024, // 10MB
            form_limit_bytes: 100 * 1024,
        }
    }
}

/// WebSocket channel configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Text of the welcome message sent on connect.
    pub welcome_message: String,

    /// Maximum inbound message size accepted by the transport.
    pub max_message_bytes: usize,

    /// Close connections that stay silent this long. 0 disables.
    pub idle_timeout_secs: u64,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            welcome_message: "Connected to GenZ Trading Bot Pro".to_string(),
            max_message_bytes: 1024 * 1024,
            idle_timeout_secs: 300,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log format. Defaults to pretty in development and JSON elsewhere.
    pub log_format: Option<LogFormat>,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: None,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
