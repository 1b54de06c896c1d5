//! GenX gateway server.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────┐
//!                      │                    genx-server                    │
//!   HTTP request       │  ┌──────┐   ┌──────┐   ┌────────┐   ┌─────────┐  │
//!   ───────────────────┼─▶│ cors │──▶│ body │──▶│dispatch│──▶│ routes  │  │
//!                      │  └──────┘   └──────┘   └───┬────┘   └─────────┘  │
//!   JSON response      │                            ▼                     │
//!   ◀──────────────────┼──────────────────── error envelope               │
//!                      │                                                   │
//!   WebSocket /        │  ┌─────────┐   ┌────────────┐   ┌──────────┐     │
//!   ◀─────────────────▶┼─▶│ session │──▶│ connection │──▶│ protocol │     │
//!                      │  └─────────┘   └────────────┘   └──────────┘     │
//!                      └──────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use genx_server::api::ApiRoutes;
use genx_server::config::load_config;
use genx_server::lifecycle::shutdown_signal;
use genx_server::observability::{logging, metrics};
use genx_server::HttpServer;

#[derive(Parser)]
#[command(name = "genx-server")]
#[command(about = "HTTP gateway and WebSocket echo channel", long_about = None)]
struct Cli {
    /// TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability, config.is_development());

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = %config.environment,
        bind_address = %config.listener.bind_address,
        allowed_origins = ?config.cors.allowed_origins,
        json_limit_bytes = config.limits.json_limit_bytes,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, &ApiRoutes);
    let shutdown = server.shutdown_handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown.trigger();
    });

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
