//! `QuadrelayServer` builder and server loop.
//!
//! This is the entry point for running a Quadrelay broker. It ties the
//! layers together: transport → session hub → room registry.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use quadrelay_protocol::JsonCodec;
use quadrelay_room::RoomConfig;
use quadrelay_session::SessionHub;
use quadrelay_transport::{Transport, WebSocketTransport};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;

use crate::QuadrelayError;
use crate::handler::handle_connection;

/// Server-level settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,
    /// Upper bound on a single frame write before the peer is dropped.
    pub send_timeout: Duration,
    /// Room sizing and notification policy.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:3000".to_string(),
            send_timeout: Duration::from_secs(5),
            room: RoomConfig::default(),
        }
    }
}

/// Builder for configuring and starting a Quadrelay server.
///
/// # Example
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use quadrelay::prelude::*;
///
/// # async fn start() -> Result<(), QuadrelayError> {
/// let server = QuadrelayServer::builder()
///     .bind("0.0.0.0:3000")
///     .send_timeout(Duration::from_secs(2))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct QuadrelayServerBuilder {
    config: ServerConfig,
}

impl QuadrelayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the room configuration.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Sets the per-frame write timeout.
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<QuadrelayServer, QuadrelayError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;
        let hub = Arc::new(SessionHub::new(&self.config.room, JsonCodec));

        Ok(QuadrelayServer {
            transport,
            hub,
            send_timeout: self.config.send_timeout,
        })
    }
}

/// A bound Quadrelay server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct QuadrelayServer {
    transport: WebSocketTransport,
    hub: Arc<SessionHub<JsonCodec>>,
    send_timeout: Duration,
}

impl QuadrelayServer {
    /// Creates a new builder.
    pub fn builder() -> QuadrelayServerBuilder {
        QuadrelayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, QuadrelayError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns the session hub shared by every connection task.
    pub fn hub(&self) -> Arc<SessionHub<JsonCodec>> {
        Arc::clone(&self.hub)
    }

    /// Runs the accept loop until the process is terminated.
    pub async fn run(self) -> Result<(), QuadrelayError> {
        self.run_until(std::future::pending()).await
    }

    /// Runs the accept loop until `shutdown` resolves.
    ///
    /// On shutdown the listener stops accepting, every open room is closed
    /// with a `RoomClosed` carrying `null`, and connection tasks get up to
    /// one send timeout to flush that notice.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<(), QuadrelayError>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "quadrelay server running");

        let mut tasks = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => break,
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
                // `accept` only takes the socket off the listener, so losing
                // this race to another branch drops nothing.
                accepted = self.transport.accept() => match accepted {
                    Ok(incoming) => {
                        let hub = Arc::clone(&self.hub);
                        tasks.spawn(handle_connection(incoming, hub, self.send_timeout));
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        let rooms = self.hub.close_all().await;
        tracing::info!(rooms, connections = tasks.len(), "shutting down");

        let drained = tokio::time::timeout(self.send_timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await;
        if drained.is_err() {
            tracing::warn!(remaining = tasks.len(), "connections still open at shutdown");
            tasks.abort_all();
        }
        Ok(())
    }
}
