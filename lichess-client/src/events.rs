//! Typed wire events for the lobby and game NDJSON streams.
//!
//! Field names follow the board API: `gameId`, `initialFen`, `wtime`/`btime`
//! (remaining milliseconds), `winc`/`binc` (increment milliseconds),
//! space-joined UCI `moves`. Payloads carry no sequence numbers; ordering is
//! whatever the stream delivered.

use serde::Deserialize;

/// Account-wide lobby stream events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum LobbyEvent {
    GameStart { game: LobbyGame },
    GameFinish { game: LobbyGame },
    /// Challenges, declines, and anything newer than this client.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LobbyGame {
    pub game_id: String,
    /// Which side this account plays: "white" or "black".
    #[serde(default)]
    pub color: Option<String>,
    /// FEN of the current (not initial) position.
    #[serde(default)]
    pub fen: Option<String>,
    #[serde(default)]
    pub is_my_turn: bool,
}

/// Per-game stream events.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GameEvent {
    /// Authoritative snapshot: full move list plus clock state. Sent once
    /// when the stream opens and again after a reconnect.
    GameFull(GameFull),
    /// Incremental update after each move (or clock/status change).
    GameState(GameStateBody),
    ChatLine(ChatLine),
    OpponentGone(OpponentGone),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameFull {
    pub id: String,
    #[serde(default)]
    pub variant: Option<Variant>,
    /// "startpos" or a FEN string.
    #[serde(default)]
    pub initial_fen: Option<String>,
    pub state: GameStateBody,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateBody {
    /// Space-joined UCI moves from the initial position.
    #[serde(default)]
    pub moves: String,
    pub wtime: u64,
    pub btime: u64,
    #[serde(default)]
    pub winc: u64,
    #[serde(default)]
    pub binc: u64,
    pub status: GameStatus,
    /// "white" or "black", present once the game is decided.
    #[serde(default)]
    pub winner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatLine {
    pub username: String,
    pub text: String,
    #[serde(default)]
    pub room: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpponentGone {
    pub gone: bool,
    #[serde(default)]
    pub claim_win_in_seconds: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Variant {
    pub key: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameStatus {
    Created,
    Started,
    Aborted,
    Mate,
    Resign,
    Stalemate,
    Timeout,
    #[serde(rename = "outoftime")]
    OutOfTime,
    Cheat,
    NoStart,
    UnknownFinish,
    Draw,
    VariantEnd,
}

impl GameStatus {
    /// Whether this status ends the game.
    pub fn is_terminal(self) -> bool {
        !matches!(self, GameStatus::Created | GameStatus::Started)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_lobby_game_start() {
        let ev: LobbyEvent = serde_json::from_str(
            r#"{"type":"gameStart","game":{"gameId":"abc123","color":"black","fen":"startpos","isMyTurn":false}}"#,
        )
        .unwrap();
        match ev {
            LobbyEvent::GameStart { game } => {
                assert_eq!(game.game_id, "abc123");
                assert_eq!(game.color.as_deref(), Some("black"));
                assert!(!game.is_my_turn);
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn unknown_lobby_event_maps_to_other() {
        let ev: LobbyEvent =
            serde_json::from_str(r#"{"type":"challenge","challenge":{"id":"x"}}"#).unwrap();
        assert_eq!(ev, LobbyEvent::Other);
    }

    #[test]
    fn decodes_game_full() {
        let ev: GameEvent = serde_json::from_str(
            r#"{"type":"gameFull","id":"abc123","variant":{"key":"standard"},
                "initialFen":"startpos",
                "state":{"type":"gameState","moves":"e2e4 e7e5","wtime":600000,
                         "btime":598000,"winc":0,"binc":0,"status":"started"}}"#,
        )
        .unwrap();
        match ev {
            GameEvent::GameFull(full) => {
                assert_eq!(full.id, "abc123");
                assert_eq!(full.state.moves, "e2e4 e7e5");
                assert_eq!(full.state.status, GameStatus::Started);
            }
            other => panic!("wrong event: {other:?}"),
        }
    }

    #[test]
    fn decodes_terminal_state() {
        let ev: GameEvent = serde_json::from_str(
            r#"{"type":"gameState","moves":"e2e4","wtime":1,"btime":2,
                "winc":0,"binc":0,"status":"outoftime","winner":"black"}"#,
        )
        .unwrap();
        match ev {
            GameEvent::GameState(state) => {
                assert_eq!(state.status, GameStatus::OutOfTime);
                assert!(state.status.is_terminal());
                assert_eq!(state.winner.as_deref(), Some("black"));
            }
            other => panic!("wrong event: {other:?}"),
        }
    }
}
