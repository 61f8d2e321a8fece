//! Runs a headstails room on one port.
//!
//! ```text
//! HEADSTAILS_ADDR=0.0.0.0:9000 HEADSTAILS_MAX_PLAYERS=2 RUST_LOG=debug cargo run -p coin-flip
//! ```

use headstails::prelude::*;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, thiserror::Error)]
enum ConfigError {
    #[error("HEADSTAILS_MAX_PLAYERS={value:?} is not a player count: {source}")]
    MaxPlayers {
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Builds the server config from the two optional environment values.
fn config_from(
    addr: Option<String>,
    max_players: Option<String>,
) -> Result<ServerConfig, ConfigError> {
    let max_players = match max_players {
        Some(raw) => match raw.trim().parse::<usize>() {
            Ok(max) => Some(max),
            Err(source) => {
                return Err(ConfigError::MaxPlayers { value: raw, source });
            }
        },
        None => None,
    };

    Ok(ServerConfig {
        bind_addr: addr.unwrap_or_else(|| DEFAULT_ADDR.to_string()),
        max_players,
        ..ServerConfig::default()
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = config_from(
        std::env::var("HEADSTAILS_ADDR").ok(),
        std::env::var("HEADSTAILS_MAX_PLAYERS").ok(),
    )?;
    tracing::info!(
        addr = %config.bind_addr,
        max_players = ?config.max_players,
        "starting coin-flip server"
    );

    let server = Server::builder().config(config).build().await?;
    server.run().await?;
    Ok(())
}
