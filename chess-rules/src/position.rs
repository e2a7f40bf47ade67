//! Position queries: legality, special-move classification, check detection.

use cozy_chess::{Board, Color, File, Move, Piece, Rank, Square};

use crate::uci::UciMove;

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("invalid move text: {0}")]
    InvalidMoveText(String),
    #[error("illegal move: {0}")]
    IllegalMove(UciMove),
    #[error("no legal move matches: {0}")]
    NoMatchingMove(String),
    #[error("ambiguous move: {0}")]
    AmbiguousMove(String),
    #[error("invalid FEN")]
    InvalidFen,
}

/// Parse a FEN string into a board.
pub fn parse_fen(fen: &str) -> Result<Board, RulesError> {
    fen.parse().map_err(|_| RulesError::InvalidFen)
}

/// All legal moves in the position, in cozy-chess notation
/// (castling is king-takes-rook).
pub fn legal_moves(board: &Board) -> Vec<Move> {
    let mut moves = Vec::new();
    board.generate_moves(|batch| {
        moves.extend(batch);
        false
    });
    moves
}

/// Resolve a wire-format move against the position's legal moves.
///
/// Standard UCI writes castling as a two-square king move (`e1g1`) while
/// cozy-chess wants the king-takes-rook form (`e1h1`); everything else maps
/// one to one. Returns `None` when no legal move corresponds.
pub fn to_board_move(board: &Board, mv: UciMove) -> Option<Move> {
    let legal = legal_moves(board);
    let literal = Move {
        from: mv.from,
        to: mv.to,
        promotion: mv.promotion,
    };
    if legal.contains(&literal) {
        return Some(literal);
    }

    // UCI castling shape: king on the e-file moving to the g- or c-file of
    // its own back rank.
    let is_king = board.piece_on(mv.from) == Some(Piece::King);
    let back_rank = matches!(mv.from.rank(), Rank::First | Rank::Eighth);
    if is_king && back_rank && mv.from.file() == File::E && mv.promotion.is_none() {
        let rook_file = match mv.to.file() {
            File::G => File::H,
            File::C => File::A,
            _ => return None,
        };
        let converted = Move {
            from: mv.from,
            to: Square::new(rook_file, mv.from.rank()),
            promotion: None,
        };
        if legal.contains(&converted) {
            return Some(converted);
        }
    }
    None
}

/// Whether the move is legal in the position.
pub fn is_legal(board: &Board, mv: UciMove) -> bool {
    to_board_move(board, mv).is_some()
}

/// Play a move, returning the resulting position. The input board is
/// untouched; callers decide whether to commit.
pub fn apply_move(board: &Board, mv: UciMove) -> Result<Board, RulesError> {
    let board_move = to_board_move(board, mv).ok_or(RulesError::IllegalMove(mv))?;
    let mut next = board.clone();
    next.play_unchecked(board_move);
    Ok(next)
}

/// Whether the move's board effect goes beyond "source empties, destination
/// gains the moved piece": castling, en passant capture, or promotion.
pub fn is_special(board: &Board, mv: UciMove) -> bool {
    if mv.promotion.is_some() {
        return true;
    }
    let piece = board.piece_on(mv.from);
    let mover = board.color_on(mv.from);
    match piece {
        // Castling in either notation: a multi-file king move, or a king
        // "capturing" its own rook.
        Some(Piece::King) => {
            let file_delta = (mv.from.file() as i8 - mv.to.file() as i8).abs();
            file_delta > 1 || board.color_on(mv.to) == mover
        }
        // En passant: a pawn capture landing on an empty square.
        Some(Piece::Pawn) => mv.from.file() != mv.to.file() && board.piece_on(mv.to).is_none(),
        _ => false,
    }
}

/// Whether the side to move is in check.
pub fn in_check(board: &Board) -> bool {
    !board.checkers().is_empty()
}

/// Locate a side's king.
pub fn king_square(board: &Board, color: Color) -> Square {
    board.king(color)
}
