//! `Server` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room. The server owns
//! exactly one [`Room`], constructed here and shared with every connection
//! task through [`ServerState`].

use std::sync::Arc;
use std::time::Duration;

use headstails_protocol::{Codec, JsonCodec};
use headstails_room::{CoinFlipper, RandomFlipper, Room};
use headstails_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::ServerError;
use crate::handler::handle_connection;

/// Server settings. Override individual fields through [`ServerBuilder`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Connections beyond this many players are turned away after the
    /// handshake. `None` means no limit.
    pub max_players: Option<usize>,

    /// How long a new connection has to send its `join` message.
    pub handshake_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_players: None,
            handshake_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared server state passed to each connection handler task.
///
/// The room mutex is the only synchronization point for game state. It is
/// held for whole room operations and never across socket I/O.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) room: Mutex<Room>,
    pub(crate) codec: C,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use headstails::prelude::*;
///
/// # async fn run() -> Result<(), ServerError> {
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .max_players(2)
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
    make_room: Box<dyn FnOnce() -> Room + Send>,
}

impl ServerBuilder {
    /// Creates a new builder with default settings and a fair coin.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            make_room: Box::new(|| Room::with_flipper(RandomFlipper)),
        }
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Caps the number of players in the room.
    pub fn max_players(mut self, max: usize) -> Self {
        self.config.max_players = Some(max);
        self
    }

    /// Sets how long a connection may take to send `join`.
    pub fn handshake_timeout(mut self, timeout: Duration) -> Self {
        self.config.handshake_timeout = timeout;
        self
    }

    /// Uses `flipper` to settle rounds instead of a fair coin.
    pub fn flipper(mut self, flipper: impl CoinFlipper) -> Self {
        self.make_room = Box::new(move || Room::with_flipper(flipper));
        self
    }

    /// Binds the listener and builds the server.
    ///
    /// Uses `JsonCodec` over `WebSocketTransport`.
    pub async fn build(self) -> Result<Server<JsonCodec>, ServerError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let state = Arc::new(ServerState {
            room: Mutex::new((self.make_room)()),
            codec: JsonCodec,
            config: self.config,
        });

        Ok(Server { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound server. Call [`run()`](Self::run) to start accepting players.
pub struct Server<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl Server<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }
}

impl<C: Codec> Server<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop.
    ///
    /// Each accepted connection gets its own task running the handshake
    /// and message loop. A failed accept is logged and does not stop the
    /// loop. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("headstails server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
