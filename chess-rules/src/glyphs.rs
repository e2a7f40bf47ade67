//! Unicode glyphs for rendering pieces.

use cozy_chess::{Color, Piece};

/// Glyph used for an empty square.
pub const EMPTY_SQUARE: char = ' ';

/// Figurine glyph for a piece of the given color.
pub fn piece_glyph(piece: Piece, color: Color) -> char {
    match (color, piece) {
        (Color::White, Piece::King) => '\u{2654}',
        (Color::White, Piece::Queen) => '\u{2655}',
        (Color::White, Piece::Rook) => '\u{2656}',
        (Color::White, Piece::Bishop) => '\u{2657}',
        (Color::White, Piece::Knight) => '\u{2658}',
        (Color::White, Piece::Pawn) => '\u{2659}',
        (Color::Black, Piece::King) => '\u{265a}',
        (Color::Black, Piece::Queen) => '\u{265b}',
        (Color::Black, Piece::Rook) => '\u{265c}',
        (Color::Black, Piece::Bishop) => '\u{265d}',
        (Color::Black, Piece::Knight) => '\u{265e}',
        (Color::Black, Piece::Pawn) => '\u{265f}',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_and_black_glyphs_differ() {
        assert_ne!(
            piece_glyph(Piece::King, Color::White),
            piece_glyph(Piece::King, Color::Black)
        );
    }
}
