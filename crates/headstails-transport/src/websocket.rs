//! WebSocket transport implementation using `tokio-tungstenite`.
//!
//! The listener runs on its own task. Each TCP connection is upgraded on a
//! task of its own and handed to [`WebSocketTransport::accept`] through a
//! queue once the upgrade completes, so a client that stalls mid-upgrade
//! never holds up the players behind it.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

/// How long a TCP client gets to finish the WebSocket upgrade.
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

/// Upgraded connections waiting for `accept`.
const ACCEPT_BACKLOG: usize = 64;

type WsStream = tokio_tungstenite::WebSocketStream<TcpStream>;
type Incoming = Result<WebSocketConnection, TransportError>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
///
/// Dropping the transport stops the listener.
pub struct WebSocketTransport {
    local_addr: SocketAddr,
    incoming: mpsc::Receiver<Incoming>,
    listener: JoinHandle<()>,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address and starts
    /// listening.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        let local_addr =
            listener.local_addr().map_err(TransportError::AcceptFailed)?;
        tracing::info!(%local_addr, "WebSocket transport listening");

        let (tx, incoming) = mpsc::channel(ACCEPT_BACKLOG);
        let listener = tokio::spawn(listen(listener, tx));
        Ok(Self {
            local_addr,
            incoming,
            listener,
        })
    }

    /// Returns the address the listener is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        Ok(self.local_addr)
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    /// Returns the next connection that finished its upgrade, or a TCP
    /// accept error.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        match self.incoming.recv().await {
            Some(result) => result,
            None => Err(TransportError::AcceptFailed(std::io::Error::other(
                "listener stopped",
            ))),
        }
    }
}

/// Accepts TCP connections until the transport goes away.
async fn listen(listener: TcpListener, tx: mpsc::Sender<Incoming>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(pair) => pair,
            Err(e) => {
                if tx.send(Err(TransportError::AcceptFailed(e))).await.is_err() {
                    return;
                }
                continue;
            }
        };

        let tx = tx.clone();
        tokio::spawn(async move {
            match upgrade(stream, peer).await {
                Ok(conn) => {
                    let _ = tx.send(Ok(conn)).await;
                }
                Err(e) => {
                    tracing::debug!(%peer, error = %e, "WebSocket upgrade failed");
                }
            }
        });
    }
}

/// Runs the WebSocket handshake on a fresh TCP stream.
async fn upgrade(
    stream: TcpStream,
    peer: SocketAddr,
) -> Result<WebSocketConnection, TransportError> {
    let ws = tokio::time::timeout(
        UPGRADE_TIMEOUT,
        tokio_tungstenite::accept_async(stream),
    )
    .await
    .map_err(|_| {
        TransportError::AcceptFailed(std::io::Error::new(
            std::io::ErrorKind::TimedOut,
            "upgrade timed out",
        ))
    })?
    .map_err(|e| {
        TransportError::AcceptFailed(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            e,
        ))
    })?;

    let id = ConnectionId::next();
    tracing::debug!(%id, %peer, "accepted WebSocket connection");

    let (sink, stream) = ws.split();
    Ok(WebSocketConnection {
        id,
        peer,
        sink: Mutex::new(sink),
        stream: Mutex::new(stream),
    })
}

/// A single WebSocket connection.
///
/// The socket is split so that a blocked `recv` never holds up a `send`
/// from another task. Each half has its own lock; the sink lock is what
/// keeps concurrent writers from interleaving frames.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WsStream, Message>>,
    stream: Mutex<SplitStream<WsStream>>,
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    /// UTF-8 data goes out as a text frame, anything else as binary.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        let msg = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink.lock().await.send(msg).await.map_err(send_error)
    }

    /// Text and binary frames are returned as raw bytes. Control frames are
    /// skipped; a close frame ends the stream.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    return Ok(Some(text.as_bytes().to_vec()));
                }
                Ok(Message::Binary(data)) => return Ok(Some(data.into())),
                Ok(Message::Close(_)) => return Ok(None),
                Ok(_) => {}
                Err(e) => {
                    return Err(TransportError::ReceiveFailed(
                        std::io::Error::new(
                            std::io::ErrorKind::ConnectionReset,
                            e,
                        ),
                    ));
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.sink.lock().await.close().await.map_err(send_error)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}

fn send_error(e: tungstenite::Error) -> TransportError {
    match e {
        tungstenite::Error::ConnectionClosed
        | tungstenite::Error::AlreadyClosed => {
            TransportError::ConnectionClosed(e.to_string())
        }
        other => TransportError::SendFailed(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            other,
        )),
    }
}
