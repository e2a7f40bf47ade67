//! Transport abstraction over the board API.

use crate::error::ClientResult;
use crate::events::{GameEvent, LobbyEvent};

/// A blocking stream of decoded events. `next()` may block indefinitely
/// between messages; run it on a dedicated thread.
pub type EventStream<T> = Box<dyn Iterator<Item = ClientResult<T>> + Send>;

/// The remote game server, reduced to what the synchronization core needs.
/// Implemented by [`crate::LichessClient`] and by the scripted mock.
pub trait GameTransport: Send + Sync {
    /// Open the account-wide lobby event stream.
    fn stream_lobby(&self) -> ClientResult<EventStream<LobbyEvent>>;

    /// Open the event stream for one game.
    fn stream_game(&self, game_id: &str) -> ClientResult<EventStream<GameEvent>>;

    /// Submit a move in UCI notation. Success here only means the server
    /// accepted the request; the applied move comes back on the game stream.
    fn submit_move(&self, game_id: &str, uci: &str) -> ClientResult<()>;

    fn resign(&self, game_id: &str) -> ClientResult<()>;

    fn abort(&self, game_id: &str) -> ClientResult<()>;

    /// Enter the opponent-seek pool. A matching opponent eventually shows
    /// up as a `gameStart` lobby event.
    fn seek_opponent(&self, params: &SeekParams) -> ClientResult<()>;

    /// Challenge the server's computer player.
    fn challenge_computer(&self, params: &AiChallengeParams) -> ClientResult<()>;
}

impl<T: GameTransport + ?Sized> GameTransport for std::sync::Arc<T> {
    fn stream_lobby(&self) -> ClientResult<EventStream<LobbyEvent>> {
        (**self).stream_lobby()
    }

    fn stream_game(&self, game_id: &str) -> ClientResult<EventStream<GameEvent>> {
        (**self).stream_game(game_id)
    }

    fn submit_move(&self, game_id: &str, uci: &str) -> ClientResult<()> {
        (**self).submit_move(game_id, uci)
    }

    fn resign(&self, game_id: &str) -> ClientResult<()> {
        (**self).resign(game_id)
    }

    fn abort(&self, game_id: &str) -> ClientResult<()> {
        (**self).abort(game_id)
    }

    fn seek_opponent(&self, params: &SeekParams) -> ClientResult<()> {
        (**self).seek_opponent(params)
    }

    fn challenge_computer(&self, params: &AiChallengeParams) -> ClientResult<()> {
        (**self).challenge_computer(params)
    }
}

/// Parameters for seeking a human opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeekParams {
    pub time_minutes: u32,
    pub increment_secs: u32,
    pub rated: bool,
}

impl Default for SeekParams {
    fn default() -> Self {
        Self {
            time_minutes: 10,
            increment_secs: 0,
            rated: false,
        }
    }
}

/// Parameters for challenging the computer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiChallengeParams {
    /// Engine strength, 1–8.
    pub level: u8,
    pub time_minutes: u32,
    pub increment_secs: u32,
    /// "white", "black", or None for random.
    pub color: Option<String>,
}

impl Default for AiChallengeParams {
    fn default() -> Self {
        Self {
            level: 3,
            time_minutes: 10,
            increment_secs: 0,
            color: None,
        }
    }
}
