//! The room: players, pending coin choices, and the lobby stage.
//!
//! `Room` is plain data with synchronous methods. It has no lock of its
//! own; the owner keeps it behind one `tokio::sync::Mutex` and holds that
//! for the whole of each operation, including deciding what to broadcast.
//! Every check-then-write sequence below (uniqueness, all-ready, round
//! resolution) therefore runs atomically with respect to other players.

use headstails_protocol::{
    Character, Choice, Message, PlayerId, PlayerSummary, Stage, TakenChoices,
};

use crate::{Broadcaster, CoinFlipper, Outbox, Player, RandomFlipper, RoomError};

/// Number of pending choices that triggers a coin flip.
pub const ARBITRATION_SIZE: usize = 2;

/// What happened when a player picked a side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoiceOutcome {
    /// Pending choices right after this one was recorded, before any reset.
    pub taken: TakenChoices,
    /// Set when this choice completed the round.
    pub resolution: Option<Resolution>,
}

/// The result of a coin flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// The side the coin landed on.
    pub flip: Choice,
    /// The player who picked that side. Only `None` if nobody did.
    pub winner: Option<PlayerId>,
}

/// A single game room.
pub struct Room {
    /// Admitted players, in join order.
    players: Vec<Player>,
    /// Choices for the current round. Keys are always a subset of
    /// `players`, and no two keys map to the same side.
    pending: TakenChoices,
    stage: Stage,
    flipper: Box<dyn CoinFlipper>,
    broadcaster: Broadcaster,
}

impl Room {
    /// Creates an empty lobby that flips a fair coin.
    pub fn new() -> Self {
        Self::with_flipper(RandomFlipper)
    }

    /// Creates an empty lobby that uses `flipper` to settle rounds.
    pub fn with_flipper(flipper: impl CoinFlipper) -> Self {
        Self {
            players: Vec::new(),
            pending: TakenChoices::new(),
            stage: Stage::Lobby,
            flipper: Box::new(flipper),
            broadcaster: Broadcaster::new(),
        }
    }

    // -- Membership --

    /// Admits a new player under a fresh id and returns a copy of its record.
    ///
    /// There is no capacity check here. A server that wants a fixed room
    /// size rejects the connection before calling this.
    pub fn admit(&mut self, name: impl Into<String>) -> Player {
        let player = Player::new(name);
        tracing::info!(
            player_id = %player.id,
            name = %player.name,
            players = self.players.len() + 1,
            "player admitted"
        );
        self.players.push(player.clone());
        player
    }

    /// Connects an admitted player's outbound queue to the room.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotFound`] if `player_id` was never admitted or
    /// has already been removed.
    pub fn attach(
        &mut self,
        player_id: PlayerId,
        outbox: Outbox,
    ) -> Result<(), RoomError> {
        if self.player(player_id).is_none() {
            return Err(RoomError::PlayerNotFound(player_id));
        }
        self.broadcaster.register(player_id, outbox);
        Ok(())
    }

    /// Removes a player, their pending choice, and their outbox.
    ///
    /// Idempotent: removing an unknown id is a no-op that returns `None`.
    /// Never changes the stage.
    pub fn remove(&mut self, player_id: PlayerId) -> Option<Player> {
        let index = self.players.iter().position(|p| p.id == player_id)?;
        let player = self.players.remove(index);
        self.pending.remove(&player_id);
        self.broadcaster.unregister(player_id);
        tracing::info!(
            %player_id,
            players = self.players.len(),
            "player removed"
        );
        Some(player)
    }

    // -- Lobby --

    /// Sets a player's ready flag.
    ///
    /// Returns `Some(Stage::GameStarted)` on the one call that moves the
    /// room out of the lobby: the room is non-empty and every player is now
    /// ready. Every other call returns `None`.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotFound`] if the player is not in the room.
    pub fn set_ready(
        &mut self,
        player_id: PlayerId,
        status: bool,
    ) -> Result<Option<Stage>, RoomError> {
        self.player_mut(player_id)?.ready = status;

        let all_ready =
            !self.players.is_empty() && self.players.iter().all(|p| p.ready);
        if all_ready && self.stage.can_transition_to(Stage::GameStarted) {
            self.stage = Stage::GameStarted;
            tracing::info!(players = self.players.len(), "game started");
            return Ok(Some(self.stage));
        }
        Ok(None)
    }

    /// Appends a character to a player's list.
    ///
    /// # Errors
    /// [`RoomError::PlayerNotFound`] if the player is not in the room.
    pub fn add_character(
        &mut self,
        player_id: PlayerId,
        character: Character,
    ) -> Result<(), RoomError> {
        self.player_mut(player_id)?.characters.push(character);
        Ok(())
    }

    // -- Coin flip --

    /// Records a player's pick for the current round.
    ///
    /// `choice` must be exactly `"heads"` or `"tails"`. A player may switch
    /// sides as long as the other side is free. When the pick brings the
    /// round to [`ARBITRATION_SIZE`] pending choices, the coin is flipped,
    /// the winner determined, and the pending choices cleared, all in this
    /// same call.
    ///
    /// # Errors
    /// - [`RoomError::InvalidChoice`] for any other string.
    /// - [`RoomError::PlayerNotFound`] if the player is not in the room.
    /// - [`RoomError::ChoiceTaken`] if someone else holds that side.
    ///
    /// Nothing is modified when an error is returned.
    pub fn record_choice(
        &mut self,
        player_id: PlayerId,
        choice: &str,
    ) -> Result<ChoiceOutcome, RoomError> {
        let choice: Choice = choice
            .parse()
            .map_err(|_| RoomError::InvalidChoice(choice.to_string()))?;
        if self.player(player_id).is_none() {
            return Err(RoomError::PlayerNotFound(player_id));
        }
        if let Some(holder) = self.holder_of(choice) {
            if holder != player_id {
                return Err(RoomError::ChoiceTaken { choice, holder });
            }
        }

        self.pending.insert(player_id, choice);
        let taken = self.pending.clone();
        let resolution = if self.pending.len() == ARBITRATION_SIZE {
            Some(self.resolve())
        } else {
            None
        };

        Ok(ChoiceOutcome { taken, resolution })
    }

    /// Flips the coin for the pending choices and starts a new round.
    fn resolve(&mut self) -> Resolution {
        let flip = self.flipper.flip();
        let winner = self.holder_of(flip);
        self.pending.clear();
        tracing::info!(%flip, winner = ?winner, "round resolved");
        Resolution { flip, winner }
    }

    /// Finds who currently holds `choice`, scanning in id order.
    fn holder_of(&self, choice: Choice) -> Option<PlayerId> {
        self.pending
            .iter()
            .find(|(_, c)| **c == choice)
            .map(|(id, _)| *id)
    }

    // -- Queries --

    /// Snapshot of every player, in join order.
    pub fn summary(&self) -> Vec<PlayerSummary> {
        self.players.iter().map(Player::summary).collect()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Choices recorded in the current, unresolved round.
    pub fn taken_choices(&self) -> &TakenChoices {
        &self.pending
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn player_mut(
        &mut self,
        player_id: PlayerId,
    ) -> Result<&mut Player, RoomError> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(RoomError::PlayerNotFound(player_id))
    }

    // -- Delivery --

    /// Sends `msg` to every attached player. See [`Broadcaster::broadcast`].
    pub fn broadcast(&self, msg: Message) -> usize {
        self.broadcaster.broadcast(msg)
    }

    /// Sends `msg` to one attached player.
    ///
    /// # Errors
    /// See [`Broadcaster::send_to`].
    pub fn send_to(
        &self,
        player_id: PlayerId,
        msg: Message,
    ) -> Result<(), RoomError> {
        self.broadcaster.send_to(player_id, msg)
    }
}

impl Default for Room {
    fn default() -> Self {
        Self::new()
    }
}
