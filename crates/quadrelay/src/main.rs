//! Quadrelay broker binary.
//!
//! # Usage
//!
//! ```bash
//! # Listen on 0.0.0.0:3000
//! quadrelay
//!
//! # Custom port, JSON logs, lone-player notices
//! PORT=8080 quadrelay --json-logs --lone-player-notice
//! ```

use std::time::Duration;

use clap::Parser;
use quadrelay::prelude::*;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "quadrelay=info";

/// Quadrelay session broker
#[derive(Parser, Debug)]
#[command(name = "quadrelay", version, about = "Four-player WebSocket session broker")]
struct Args {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value = "3000")]
    port: u16,

    /// Bind address
    #[arg(long, env = "QUADRELAY_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Also tell the last remaining member of a room that they are alone
    #[arg(long, env = "QUADRELAY_LONE_PLAYER_NOTICE")]
    lone_player_notice: bool,

    /// Per-frame write timeout in milliseconds
    #[arg(long, env = "QUADRELAY_SEND_TIMEOUT_MS", default_value = "5000")]
    send_timeout_ms: u64,

    /// Enable structured JSON logging
    #[arg(long, env = "QUADRELAY_JSON_LOGS")]
    json_logs: bool,
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), QuadrelayError> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    tracing::info!("quadrelay v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ServerConfig {
        bind_addr: format!("{}:{}", args.host, args.port),
        send_timeout: Duration::from_millis(args.send_timeout_ms),
        room: RoomConfig {
            lone_player_notice: args.lone_player_notice,
            ..RoomConfig::default()
        },
    };

    let server = QuadrelayServer::builder().config(config).build().await?;
    tracing::info!(addr = %server.local_addr()?, "listening");

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
            tracing::info!("shutdown requested");
        })
        .await
}
