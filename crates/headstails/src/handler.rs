//! Per-connection handler: handshake, seating, and the message loop.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive `join` → validate the name
//!   2. Seat the player → `joined` to them, line-up to everyone
//!   3. Loop: receive messages → route them through the room
//!   4. On disconnect → remove the player, tell whoever is left
//!
//! All outbound frames go through the player's outbox and a dedicated
//! writer task, so the read loop never waits on a slow socket write.

use std::sync::Arc;
use std::time::Duration;

use headstails_protocol::{Codec, JoinPayload, Message, MessageType, PlayerId};
use headstails_room::{Inbox, Outbox};
use headstails_transport::{Connection, WebSocketConnection};
use tokio::task::JoinHandle;

use crate::ServerError;
use crate::router;
use crate::server::ServerState;

/// How long a departing player's writer may keep flushing before it is
/// cut off.
const WRITER_GRACE: Duration = Duration::from_secs(2);

/// Drop guard that takes a player out of the room when the handler exits.
///
/// The normal path calls [`release`](Self::release). If the handler task
/// unwinds instead, `Drop` spawns the same cleanup, since it cannot take
/// the async lock itself.
struct SeatGuard<C: Codec> {
    player_id: PlayerId,
    state: Option<Arc<ServerState<C>>>,
}

impl<C: Codec> SeatGuard<C> {
    fn new(player_id: PlayerId, state: &Arc<ServerState<C>>) -> Self {
        Self {
            player_id,
            state: Some(Arc::clone(state)),
        }
    }

    async fn release(mut self) {
        if let Some(state) = self.state.take() {
            router::leave(&mut *state.room.lock().await, self.player_id);
        }
    }
}

impl<C: Codec> Drop for SeatGuard<C> {
    fn drop(&mut self) {
        if let Some(state) = self.state.take() {
            let player_id = self.player_id;
            tokio::spawn(async move {
                router::leave(&mut *state.room.lock().await, player_id);
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), ServerError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    // --- Step 1: Handshake ---
    let name = match perform_handshake(&conn, &state).await {
        Ok(name) => name,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "handshake rejected");
            let _ = conn.close().await;
            return Err(e);
        }
    };

    // --- Step 2: Seat the player ---
    let (outbox, inbox) = Outbox::channel();
    let writer = tokio::spawn(write_loop(
        Arc::clone(&conn),
        inbox,
        Arc::clone(&state),
    ));

    let admitted = {
        let mut room = state.room.lock().await;
        router::admit(&mut room, &name, outbox.clone(), state.config.max_players)
    };
    let player_id = match admitted {
        Ok(player_id) => player_id,
        Err(e) => {
            tracing::info!(%conn_id, error = %e, "player turned away");
            if let Ok(msg) = router::error_message(&e.to_string()) {
                let _ = outbox.deliver(msg);
            }
            drop(outbox);
            finish_writer(writer, WRITER_GRACE).await;
            let _ = conn.close().await;
            return Err(e);
        }
    };
    // From here the room holds the only sender.
    drop(outbox);
    let guard = SeatGuard::new(player_id, &state);

    tracing::info!(%conn_id, %player_id, %name, "player joined");

    // --- Step 3: Message loop ---
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::info!(%player_id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                break;
            }
        };

        let msg: Message = match state.codec.decode(&data) {
            Ok(msg) => msg,
            Err(e) => {
                tracing::debug!(
                    %player_id, error = %e, "failed to decode message"
                );
                break;
            }
        };

        let mut room = state.room.lock().await;
        if let Err(e) = router::dispatch(&mut room, player_id, msg) {
            tracing::debug!(%player_id, error = %e, "failed to answer message");
        }
    }

    // --- Step 4: Cleanup ---
    // Leaving unregisters the outbox, which lets the writer drain and stop.
    guard.release().await;
    finish_writer(writer, WRITER_GRACE).await;
    let _ = conn.close().await;
    tracing::info!(%player_id, "player left");

    Ok(())
}

/// Waits for the opening `join` and returns the trimmed player name.
///
/// Fails closed: nothing is written to the room or to the socket, and the
/// caller drops the connection.
async fn perform_handshake<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
) -> Result<String, ServerError> {
    let data = match tokio::time::timeout(
        state.config.handshake_timeout,
        conn.recv(),
    )
    .await
    {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(ServerError::HandshakeFailed(
                "connection closed before join".into(),
            ));
        }
        Ok(Err(e)) => return Err(ServerError::Transport(e)),
        Err(_) => {
            return Err(ServerError::HandshakeFailed(
                "timed out waiting for join".into(),
            ));
        }
    };

    let msg: Message = state.codec.decode(&data)?;
    if msg.kind != MessageType::Join {
        return Err(ServerError::HandshakeFailed(format!(
            "expected join, got {}",
            msg.kind
        )));
    }

    let name = msg
        .payload_as::<JoinPayload>()
        .map(|p| p.name.trim().to_string())
        .unwrap_or_default();
    if name.is_empty() {
        return Err(ServerError::HandshakeFailed("missing name".into()));
    }

    Ok(name)
}

/// Drains one player's inbox onto their socket until every sender is gone
/// or a write fails.
async fn write_loop<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut inbox: Inbox,
    state: Arc<ServerState<C>>,
) {
    while let Some(msg) = inbox.recv().await {
        let bytes = match state.codec.encode(&msg) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::error!(kind = %msg.kind, error = %e, "failed to encode message");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "write failed");
            break;
        }
    }
}

/// Waits up to `grace` for the writer to drain, then aborts it so a peer
/// that stopped reading cannot keep the task alive. Returns `true` if the
/// writer finished on its own.
async fn finish_writer(mut writer: JoinHandle<()>, grace: Duration) -> bool {
    match tokio::time::timeout(grace, &mut writer).await {
        Ok(_) => true,
        Err(_) => {
            tracing::debug!("writer still blocked after grace period, aborting");
            writer.abort();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_finish_writer_waits_for_a_draining_writer() {
        let writer = tokio::spawn(async {
            tokio::time::sleep(Duration::from_millis(10)).await;
        });
        assert!(finish_writer(writer, Duration::from_secs(1)).await);
    }

    #[tokio::test]
    async fn test_finish_writer_aborts_a_stuck_writer() {
        let (dropped_tx, dropped_rx) = tokio::sync::oneshot::channel::<()>();
        let writer = tokio::spawn(async move {
            // Held until the task is torn down.
            let _tx = dropped_tx;
            std::future::pending::<()>().await;
        });

        assert!(!finish_writer(writer, Duration::from_millis(20)).await);
        // Abort drops the task's future, which closes the channel.
        tokio::time::timeout(Duration::from_secs(1), dropped_rx)
            .await
            .expect("stuck writer was not torn down")
            .unwrap_err();
    }
}
