//! # headstails
//!
//! Real-time heads-or-tails server for browser clients.
//!
//! Players connect over WebSocket, join a shared room with a name, mark
//! themselves ready, and pick a side of the coin. Once both sides are taken
//! the server flips the coin and announces the winner to everyone. Every
//! state change is pushed to all connected players.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use headstails::prelude::*;
//!
//! # async fn run() -> Result<(), ServerError> {
//! let server = Server::builder()
//!     .bind("0.0.0.0:8080")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod router;
mod server;

pub use error::ServerError;
pub use server::{Server, ServerBuilder, ServerConfig};

/// Re-exports for convenient use.
pub mod prelude {
    pub use crate::{Server, ServerBuilder, ServerConfig, ServerError};
    pub use headstails_protocol::{
        Character, Choice, JsonCodec, Message, MessageType, PlayerId,
        PlayerSummary, Stage,
    };
    pub use headstails_room::{CoinFlipper, FixedFlipper, RandomFlipper};
}
