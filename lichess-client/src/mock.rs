//! Scripted transport for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{ClientError, ClientResult};
use crate::events::{GameEvent, LobbyEvent};
use crate::traits::{AiChallengeParams, EventStream, GameTransport, SeekParams};

/// Transport whose streams replay pre-scripted events and whose imperative
/// calls are recorded for assertion.
#[derive(Default)]
pub struct ScriptedTransport {
    lobby: Mutex<Vec<ClientResult<LobbyEvent>>>,
    games: Mutex<HashMap<String, Vec<ClientResult<GameEvent>>>>,
    reject_actions: Mutex<Option<String>>,
    calls: Arc<Mutex<Vec<TransportCall>>>,
}

/// One recorded imperative call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    SubmitMove { game_id: String, uci: String },
    Resign { game_id: String },
    Abort { game_id: String },
    SeekOpponent(SeekParams),
    ChallengeComputer(AiChallengeParams),
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the lobby stream.
    pub fn with_lobby_events(self, events: Vec<ClientResult<LobbyEvent>>) -> Self {
        *lock(&self.lobby) = events;
        self
    }

    /// Script one game's stream.
    pub fn with_game_events(self, game_id: &str, events: Vec<ClientResult<GameEvent>>) -> Self {
        lock(&self.games).insert(game_id.to_string(), events);
        self
    }

    /// Make every imperative call fail with the given rejection message.
    pub fn rejecting_actions(self, message: &str) -> Self {
        *lock(&self.reject_actions) = Some(message.to_string());
        self
    }

    /// Calls recorded so far, in order.
    pub fn calls(&self) -> Vec<TransportCall> {
        lock(&self.calls).clone()
    }

    fn record(&self, call: TransportCall) -> ClientResult<()> {
        lock(&self.calls).push(call);
        match lock(&self.reject_actions).clone() {
            Some(message) => Err(ClientError::Rejected {
                status: 400,
                message,
            }),
            None => Ok(()),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl GameTransport for ScriptedTransport {
    fn stream_lobby(&self) -> ClientResult<EventStream<LobbyEvent>> {
        let events = std::mem::take(&mut *lock(&self.lobby));
        Ok(Box::new(events.into_iter()))
    }

    fn stream_game(&self, game_id: &str) -> ClientResult<EventStream<GameEvent>> {
        let events = lock(&self.games).remove(game_id).unwrap_or_default();
        Ok(Box::new(events.into_iter()))
    }

    fn submit_move(&self, game_id: &str, uci: &str) -> ClientResult<()> {
        self.record(TransportCall::SubmitMove {
            game_id: game_id.to_string(),
            uci: uci.to_string(),
        })
    }

    fn resign(&self, game_id: &str) -> ClientResult<()> {
        self.record(TransportCall::Resign {
            game_id: game_id.to_string(),
        })
    }

    fn abort(&self, game_id: &str) -> ClientResult<()> {
        self.record(TransportCall::Abort {
            game_id: game_id.to_string(),
        })
    }

    fn seek_opponent(&self, params: &SeekParams) -> ClientResult<()> {
        self.record(TransportCall::SeekOpponent(params.clone()))
    }

    fn challenge_computer(&self, params: &AiChallengeParams) -> ClientResult<()> {
        self.record(TransportCall::ChallengeComputer(params.clone()))
    }
}
