//! User move-text parsing: accepts UCI or SAN.
//!
//! SAN is resolved by spelling out each legal move's acceptable notations
//! and matching the (normalized) input against them, so disambiguated and
//! undisambiguated forms are both accepted as long as the result is unique.

use cozy_chess::{Board, Move, Piece};

use crate::position::{legal_moves, RulesError};
use crate::uci::{file_char, parse_uci_move, piece_char, rank_char, UciMove};

/// Parse user-entered move text against the current position.
///
/// Tries UCI first ("e2e4", "e7e8q"), then SAN ("Nf3", "exd5", "e8=Q",
/// "O-O"). The returned move is in standard wire form, castling included
/// (`e1g1`, never `e1h1`), ready to submit to the server.
pub fn parse_move_text(board: &Board, text: &str) -> Result<UciMove, RulesError> {
    let trimmed = text.trim();
    if let Ok(mv) = parse_uci_move(&trimmed.to_ascii_lowercase()) {
        if crate::position::is_legal(board, mv) {
            return Ok(mv);
        }
    }
    resolve_san(board, trimmed)
}

fn resolve_san(board: &Board, text: &str) -> Result<UciMove, RulesError> {
    let wanted = normalize(text);
    if wanted.is_empty() {
        return Err(RulesError::InvalidMoveText(text.to_string()));
    }

    let mut matched: Vec<Move> = Vec::new();
    for mv in legal_moves(board) {
        if spellings(board, mv).iter().any(|s| *s == wanted) {
            matched.push(mv);
        }
    }
    matched.dedup();

    match matched.len() {
        0 => Err(RulesError::NoMatchingMove(text.to_string())),
        1 => Ok(to_wire_move(board, matched[0])),
        _ => Err(RulesError::AmbiguousMove(text.to_string())),
    }
}

/// Strip decorations that do not identify the move: check/mate marks,
/// annotation glyphs, capture-by-en-passant suffix. `0-0` becomes `O-O`.
fn normalize(text: &str) -> String {
    text.trim()
        .trim_end_matches(['+', '#', '!', '?'])
        .trim_end_matches(" e.p.")
        .replace('0', "O")
}

/// Acceptable SAN spellings for one legal move.
fn spellings(board: &Board, mv: Move) -> Vec<String> {
    let piece = match board.piece_on(mv.from) {
        Some(p) => p,
        None => return Vec::new(),
    };

    // cozy-chess encodes castling as the king capturing its own rook.
    if piece == Piece::King && board.color_on(mv.to) == board.color_on(mv.from) {
        return if mv.to.file() > mv.from.file() {
            vec!["O-O".to_string()]
        } else {
            vec!["O-O-O".to_string()]
        };
    }

    let dest = format!("{}{}", file_char(mv.to.file()), rank_char(mv.to.rank()));
    let is_en_passant =
        piece == Piece::Pawn && mv.from.file() != mv.to.file() && board.piece_on(mv.to).is_none();
    let is_capture = board.piece_on(mv.to).is_some() || is_en_passant;

    if piece == Piece::Pawn {
        let mut forms = Vec::new();
        let base = if is_capture {
            format!("{}x{}", file_char(mv.from.file()), dest)
        } else {
            dest
        };
        match mv.promotion {
            Some(promo) => {
                let p = piece_char(promo).to_ascii_uppercase();
                forms.push(format!("{}={}", base, p));
                forms.push(format!("{}{}", base, p));
            }
            None => forms.push(base),
        }
        return forms;
    }

    let letter = piece_char(piece).to_ascii_uppercase();
    let capture = if is_capture { "x" } else { "" };
    let from_file = file_char(mv.from.file());
    let from_rank = rank_char(mv.from.rank());

    // Undisambiguated plus every disambiguation level; uniqueness is
    // enforced by the caller, not by picking the minimal form.
    vec![
        format!("{}{}{}", letter, capture, dest),
        format!("{}{}{}{}", letter, from_file, capture, dest),
        format!("{}{}{}{}", letter, from_rank, capture, dest),
        format!("{}{}{}{}{}", letter, from_file, from_rank, capture, dest),
    ]
}

/// Convert a cozy-chess legal move back to standard wire notation.
fn to_wire_move(board: &Board, mv: Move) -> UciMove {
    use cozy_chess::{File, Square};

    if board.piece_on(mv.from) == Some(Piece::King)
        && board.color_on(mv.to) == board.color_on(mv.from)
    {
        let king_file = if mv.to.file() > mv.from.file() {
            File::G
        } else {
            File::C
        };
        return UciMove::new(mv.from, Square::new(king_file, mv.from.rank()));
    }
    UciMove {
        from: mv.from,
        to: mv.to,
        promotion: mv.promotion,
    }
}
