//! In-memory state of one live game.
//!
//! The board is maintained incrementally: it always equals the starting
//! position with `move_history` replayed on top. History is append/pop
//! only, which keeps snapshot diffing O(1) in the common case.

use chess_rules::{self, Board, Color, RulesError, UciMove};
use lichess_client::{GameStatus, Variant as WireVariant};

use crate::events::Orientation;

/// Game variant, as far as board reconstruction cares about it. Anything
/// that starts from a non-standard position carries its FEN.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Variant {
    #[default]
    Standard,
    FromPosition(String),
}

impl Variant {
    /// Non-standard variants matter here only insofar as they change the
    /// starting position; the server sends that as `initialFen`.
    pub fn from_wire(variant: Option<&WireVariant>, initial_fen: Option<&str>) -> Self {
        match (initial_fen, variant) {
            (Some(fen), _) if fen != "startpos" => Variant::FromPosition(fen.to_owned()),
            (_, _) => Variant::Standard,
        }
    }

    pub fn starting_board(&self) -> Result<Board, RulesError> {
        match self {
            Variant::Standard => Ok(Board::default()),
            Variant::FromPosition(fen) => chess_rules::parse_fen(fen),
        }
    }
}

/// Why a game ended, reduced from the wire status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeReason {
    Mate,
    Resign,
    OutOfTime,
    Aborted,
    Stalemate,
    Draw,
    Other,
}

impl OutcomeReason {
    pub fn from_status(status: GameStatus) -> Self {
        match status {
            GameStatus::Mate => OutcomeReason::Mate,
            GameStatus::Resign => OutcomeReason::Resign,
            GameStatus::OutOfTime | GameStatus::Timeout => OutcomeReason::OutOfTime,
            GameStatus::Aborted => OutcomeReason::Aborted,
            GameStatus::Stalemate => OutcomeReason::Stalemate,
            GameStatus::Draw => OutcomeReason::Draw,
            _ => OutcomeReason::Other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameOutcome {
    pub winner: Option<Color>,
    pub reason: OutcomeReason,
}

impl GameOutcome {
    /// Human-readable result line for the status bar.
    pub fn message(&self) -> String {
        let sides = self.winner.map(|winner| match winner {
            Color::White => ("white", "black"),
            Color::Black => ("black", "white"),
        });
        match (self.reason, sides) {
            (OutcomeReason::Mate, Some((winner, loser))) => {
                format!("{winner} won. {loser} got mated")
            }
            (OutcomeReason::Resign, Some((winner, loser))) => {
                format!("{winner} won. {loser} resigned")
            }
            (OutcomeReason::OutOfTime, Some((winner, loser))) => {
                format!("{winner} won. {loser} timed out")
            }
            (OutcomeReason::Aborted, _) => "game aborted".to_owned(),
            (OutcomeReason::Stalemate, _) => "draw by stalemate".to_owned(),
            (OutcomeReason::Draw, _) => "game drawn".to_owned(),
            (_, Some((winner, _))) => format!("{winner} won"),
            (_, None) => "game over".to_owned(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    game_id: String,
    variant: Variant,
    orientation: Orientation,
    move_history: Vec<UciMove>,
    board: Board,
    terminal: Option<GameOutcome>,
}

impl SessionState {
    pub fn new(
        game_id: String,
        variant: Variant,
        orientation: Orientation,
    ) -> Result<Self, RulesError> {
        let board = variant.starting_board()?;
        Ok(Self {
            game_id,
            variant,
            orientation,
            move_history: Vec::new(),
            board,
            terminal: None,
        })
    }

    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn flip_orientation(&mut self) {
        self.orientation = self.orientation.toggled();
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &[UciMove] {
        &self.move_history
    }

    pub fn side_to_move(&self) -> Color {
        self.board.side_to_move()
    }

    pub fn terminal(&self) -> Option<&GameOutcome> {
        self.terminal.as_ref()
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal.is_some()
    }

    pub fn set_terminal(&mut self, outcome: GameOutcome) {
        self.terminal = Some(outcome);
    }

    /// Append one move, keeping board and history in lockstep. The move is
    /// stored in wire form; castling conversion happens inside the rules
    /// layer.
    pub fn push_move(&mut self, mv: UciMove) -> Result<(), RulesError> {
        self.board = chess_rules::apply_move(&self.board, mv)?;
        self.move_history.push(mv);
        Ok(())
    }

    /// Retract the most recent move by replaying the shortened history
    /// from the starting position.
    pub fn pop_move(&mut self) -> Result<Option<UciMove>, RulesError> {
        let Some(popped) = self.move_history.pop() else {
            return Ok(None);
        };
        let mut board = self.variant.starting_board()?;
        for &mv in &self.move_history {
            board = chess_rules::apply_move(&board, mv)?;
        }
        self.board = board;
        Ok(Some(popped))
    }

    /// Discard local history and reload wholesale from an authoritative
    /// move list.
    pub fn reload(&mut self, moves: &[UciMove]) -> Result<(), RulesError> {
        let mut board = self.variant.starting_board()?;
        for &mv in moves {
            board = chess_rules::apply_move(&board, mv)?;
        }
        self.board = board;
        self.move_history = moves.to_vec();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_rules::parse_move_list;

    fn session() -> SessionState {
        SessionState::new("abc123".into(), Variant::Standard, Orientation::Normal)
            .expect("standard start position")
    }

    #[test]
    fn parity_tracks_history_length() {
        let mut state = session();
        assert_eq!(state.side_to_move(), Color::White);
        for mv in parse_move_list("e2e4 e7e5 g1f3").unwrap() {
            state.push_move(mv).unwrap();
        }
        assert_eq!(state.history().len(), 3);
        assert_eq!(state.side_to_move(), Color::Black);
    }

    #[test]
    fn pop_restores_previous_position() {
        let mut state = session();
        let moves = parse_move_list("e2e4 c7c5").unwrap();
        state.push_move(moves[0]).unwrap();
        let before = state.board().clone();
        state.push_move(moves[1]).unwrap();
        let popped = state.pop_move().unwrap();
        assert_eq!(popped, Some(moves[1]));
        assert_eq!(state.board(), &before);
        assert_eq!(state.history(), &moves[..1]);
    }

    #[test]
    fn reload_replaces_history_wholesale() {
        let mut state = session();
        for mv in parse_move_list("e2e4 e7e5").unwrap() {
            state.push_move(mv).unwrap();
        }
        let fresh = parse_move_list("d2d4 d7d5 g1f3").unwrap();
        state.reload(&fresh).unwrap();
        assert_eq!(state.history(), &fresh[..]);
        assert_eq!(state.side_to_move(), Color::Black);
    }

    #[test]
    fn reload_rejects_illegal_history() {
        let mut state = session();
        let garbage = parse_move_list("e2e5").unwrap();
        assert!(state.reload(&garbage).is_err());
        assert!(state.history().is_empty());
    }

    #[test]
    fn castling_arrives_in_wire_form() {
        let mut state = session();
        for mv in parse_move_list("e2e4 e7e5 g1f3 b8c6 f1c4 g8f6 e1g1").unwrap() {
            state.push_move(mv).unwrap();
        }
        let last = *state.history().last().unwrap();
        assert_eq!(last.to_string(), "e1g1");
        assert_eq!(state.side_to_move(), Color::Black);
    }

    #[test]
    fn outcome_messages_match_expected_wording() {
        let mate = GameOutcome {
            winner: Some(Color::White),
            reason: OutcomeReason::Mate,
        };
        assert_eq!(mate.message(), "white won. black got mated");
        let resign = GameOutcome {
            winner: Some(Color::Black),
            reason: OutcomeReason::Resign,
        };
        assert_eq!(resign.message(), "black won. white resigned");
        let aborted = GameOutcome {
            winner: None,
            reason: OutcomeReason::Aborted,
        };
        assert_eq!(aborted.message(), "game aborted");
    }
}
