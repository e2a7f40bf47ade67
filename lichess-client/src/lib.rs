//! Blocking client for a lichess-style board API.
//!
//! The server speaks REST for imperative actions and NDJSON long-poll
//! streams for events: one account-wide lobby stream plus one stream per
//! game. Both streams are exposed as blocking iterators of typed events;
//! the consumer is expected to run each iterator on its own thread.
//!
//! # Example
//!
//! ```no_run
//! use lichess_client::{GameTransport, LichessClient};
//!
//! fn main() -> Result<(), lichess_client::ClientError> {
//!     let client = LichessClient::new("someApiToken");
//!     for event in client.stream_lobby()? {
//!         println!("{:?}", event?);
//!     }
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod events;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
mod traits;

pub use client::LichessClient;
pub use error::{ClientError, ClientResult};
pub use events::{
    ChatLine, GameEvent, GameStatus, GameStateBody, GameFull, LobbyEvent, LobbyGame, OpponentGone,
    Variant,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{ScriptedTransport, TransportCall};
pub use traits::{AiChallengeParams, EventStream, GameTransport, SeekParams};
