//! Per-player outbound queues and room-wide fan-out.
//!
//! Every connection gets one [`Outbox`]: the sending half of an unbounded
//! queue that a single writer task drains onto the socket. Because direct
//! replies and broadcasts both go through that queue, frames for one
//! connection can never interleave, and enqueueing never waits on the
//! network, so it is safe to do while holding the room lock.

use std::collections::HashMap;

use headstails_protocol::{Message, PlayerId};
use tokio::sync::mpsc;

use crate::RoomError;

/// The receiving side of an [`Outbox`], owned by the connection's writer.
pub type Inbox = mpsc::UnboundedReceiver<Message>;

/// Send-handle for one connection.
///
/// Cheap to clone; the writer task stops once every clone is dropped.
#[derive(Debug, Clone)]
pub struct Outbox {
    sender: mpsc::UnboundedSender<Message>,
}

impl Outbox {
    /// Creates an outbox and the inbox its writer task reads from.
    pub fn channel() -> (Self, Inbox) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    /// Stamps `msg` with the current time and queues it.
    ///
    /// # Errors
    /// Returns [`RoomError::OutboxClosed`] if the writer task is gone.
    pub fn deliver(&self, mut msg: Message) -> Result<(), RoomError> {
        msg.stamp();
        self.enqueue(msg)
    }

    fn enqueue(&self, msg: Message) -> Result<(), RoomError> {
        self.sender.send(msg).map_err(|_| RoomError::OutboxClosed)
    }
}

/// The set of outboxes for everyone in a room, keyed by player.
#[derive(Debug, Default)]
pub struct Broadcaster {
    outboxes: HashMap<PlayerId, Outbox>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the outbox for `player_id`.
    pub fn register(
        &mut self,
        player_id: PlayerId,
        outbox: Outbox,
    ) -> Option<Outbox> {
        self.outboxes.insert(player_id, outbox)
    }

    /// Forgets the outbox for `player_id`. Dropping the returned handle
    /// lets that player's writer task finish.
    pub fn unregister(&mut self, player_id: PlayerId) -> Option<Outbox> {
        self.outboxes.remove(&player_id)
    }

    /// Number of registered outboxes.
    pub fn len(&self) -> usize {
        self.outboxes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outboxes.is_empty()
    }

    /// Sends `msg` to one player.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotFound`] if the player has no outbox,
    /// [`RoomError::OutboxClosed`] if its writer is gone.
    pub fn send_to(
        &self,
        player_id: PlayerId,
        msg: Message,
    ) -> Result<(), RoomError> {
        self.outboxes
            .get(&player_id)
            .ok_or(RoomError::PlayerNotFound(player_id))?
            .deliver(msg)
    }

    /// Stamps `msg` once and queues a copy for every registered player.
    ///
    /// Delivery is independent per recipient: a closed outbox is logged
    /// and skipped. Returns how many outboxes accepted the message.
    pub fn broadcast(&self, mut msg: Message) -> usize {
        msg.stamp();
        let mut delivered = 0;
        for (player_id, outbox) in &self.outboxes {
            match outbox.enqueue(msg.clone()) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::debug!(
                        %player_id,
                        kind = %msg.kind,
                        error = %e,
                        "broadcast skipped recipient"
                    );
                }
            }
        }
        delivered
    }
}
