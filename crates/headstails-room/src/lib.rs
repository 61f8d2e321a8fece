//! Room coordination for headstails.
//!
//! A [`Room`] tracks who is connected, who is ready, and which side of the
//! coin each player has picked, and settles a round with a coin flip once
//! both sides are taken. It also owns the fan-out to every player's
//! [`Outbox`].
//!
//! # Key types
//!
//! - [`Room`]: the state machine (admit, ready, choose, remove)
//! - [`Player`]: one admitted player, free of any transport type
//! - [`Outbox`] / [`Broadcaster`]: per-connection send queues and fan-out
//! - [`CoinFlipper`]: where flip outcomes come from ([`RandomFlipper`],
//!   [`FixedFlipper`])

mod error;
mod flip;
mod outbox;
mod player;
mod room;

pub use error::RoomError;
pub use flip::{CoinFlipper, FixedFlipper, RandomFlipper};
pub use outbox::{Broadcaster, Inbox, Outbox};
pub use player::Player;
pub use room::{ARBITRATION_SIZE, ChoiceOutcome, Resolution, Room};
