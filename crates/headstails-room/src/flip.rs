//! The source of coin-flip outcomes.
//!
//! The room never calls a random number generator directly; it asks its
//! [`CoinFlipper`]. Production rooms use [`RandomFlipper`], tests inject a
//! [`FixedFlipper`] to assert exact winners.

use headstails_protocol::Choice;
use rand::Rng;

/// Produces the side a coin lands on.
///
/// `Send + Sync` because the room (and its flipper) sits behind a mutex
/// shared by every connection task.
pub trait CoinFlipper: Send + Sync + 'static {
    /// Flips the coin once.
    fn flip(&self) -> Choice;
}

/// A fair coin backed by the thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomFlipper;

impl CoinFlipper for RandomFlipper {
    fn flip(&self) -> Choice {
        if rand::rng().random_bool(0.5) {
            Choice::Heads
        } else {
            Choice::Tails
        }
    }
}

/// A coin that always lands on the same side.
#[derive(Debug, Clone, Copy)]
pub struct FixedFlipper(pub Choice);

impl CoinFlipper for FixedFlipper {
    fn flip(&self) -> Choice {
        self.0
    }
}
