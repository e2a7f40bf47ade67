//! Rules collaborator: move parsing, legality and position queries.
//!
//! Everything the synchronization core needs to ask about a chess position
//! lives here, as thin functions over `cozy-chess`. cozy-chess types are
//! re-exported so downstream crates never import it directly.

pub mod glyphs;
pub mod position;
pub mod san;
pub mod uci;

pub use cozy_chess::{Board, Color, File, Piece, Rank, Square};

pub use glyphs::{piece_glyph, EMPTY_SQUARE};
pub use position::{apply_move, in_check, is_legal, is_special, king_square, parse_fen, RulesError};
pub use san::parse_move_text;
pub use uci::{format_square, parse_move_list, parse_square, parse_uci_move, UciMove};
