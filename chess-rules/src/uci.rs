//! UCI move text handling.
//!
//! Moves are kept in the exact source/destination form the server sent them
//! in (standard UCI, so castling is `e1g1`). Conversion to cozy-chess's
//! king-takes-rook castling notation happens only when a move is applied to
//! a board, in [`crate::position`].

use cozy_chess::{File, Piece, Rank, Square};

use crate::position::RulesError;

/// A move as transmitted over the wire: source square, destination square,
/// optional promotion piece. Equality is structural.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
}

impl UciMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }
}

impl std::fmt::Display for UciMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", format_square(self.from), format_square(self.to))?;
        if let Some(promo) = self.promotion {
            write!(f, "{}", piece_char(promo))?;
        }
        Ok(())
    }
}

/// Parse a square in algebraic notation ("e4").
pub fn parse_square(s: &str) -> Option<Square> {
    let mut chars = s.chars();
    let file = parse_file(chars.next()?)?;
    let rank = parse_rank(chars.next()?)?;
    if chars.next().is_some() {
        return None;
    }
    Some(Square::new(file, rank))
}

/// Format a square as algebraic notation ("e4").
pub fn format_square(sq: Square) -> String {
    format!("{}{}", file_char(sq.file()), rank_char(sq.rank()))
}

/// Parse a single UCI move ("e2e4", "e7e8q").
pub fn parse_uci_move(text: &str) -> Result<UciMove, RulesError> {
    if text.len() < 4 || text.len() > 5 {
        return Err(RulesError::InvalidMoveText(text.to_string()));
    }
    let from = parse_square(&text[0..2]);
    let to = parse_square(&text[2..4]);
    let (from, to) = match (from, to) {
        (Some(f), Some(t)) => (f, t),
        _ => return Err(RulesError::InvalidMoveText(text.to_string())),
    };
    let promotion = match text.as_bytes().get(4) {
        None => None,
        Some(&c) => Some(
            promotion_piece(c as char).ok_or_else(|| RulesError::InvalidMoveText(text.to_string()))?,
        ),
    };
    Ok(UciMove {
        from,
        to,
        promotion,
    })
}

/// Parse a space-joined move list as sent in server snapshots.
/// An empty string is an empty list, not an error.
pub fn parse_move_list(text: &str) -> Result<Vec<UciMove>, RulesError> {
    text.split_whitespace().map(parse_uci_move).collect()
}

pub(crate) fn file_char(file: File) -> char {
    (b'a' + file as u8) as char
}

pub(crate) fn rank_char(rank: Rank) -> char {
    (b'1' + rank as u8) as char
}

fn parse_file(c: char) -> Option<File> {
    match c {
        'a' => Some(File::A),
        'b' => Some(File::B),
        'c' => Some(File::C),
        'd' => Some(File::D),
        'e' => Some(File::E),
        'f' => Some(File::F),
        'g' => Some(File::G),
        'h' => Some(File::H),
        _ => None,
    }
}

fn parse_rank(c: char) -> Option<Rank> {
    match c {
        '1' => Some(Rank::First),
        '2' => Some(Rank::Second),
        '3' => Some(Rank::Third),
        '4' => Some(Rank::Fourth),
        '5' => Some(Rank::Fifth),
        '6' => Some(Rank::Sixth),
        '7' => Some(Rank::Seventh),
        '8' => Some(Rank::Eighth),
        _ => None,
    }
}

pub(crate) fn promotion_piece(c: char) -> Option<Piece> {
    match c.to_ascii_lowercase() {
        'q' => Some(Piece::Queen),
        'r' => Some(Piece::Rook),
        'b' => Some(Piece::Bishop),
        'n' => Some(Piece::Knight),
        _ => None,
    }
}

pub(crate) fn piece_char(piece: Piece) -> char {
    match piece {
        Piece::Pawn => 'p',
        Piece::Knight => 'n',
        Piece::Bishop => 'b',
        Piece::Rook => 'r',
        Piece::Queen => 'q',
        Piece::King => 'k',
    }
}
