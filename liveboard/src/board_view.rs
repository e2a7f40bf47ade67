//! Renderable snapshot of a position.
//!
//! A `BoardView` is a full 8x8 grid of glyphs plus highlights, computed
//! from scratch after every applied move. Highlights are never tracked
//! incrementally; diffing two complete views clears stale last-move and
//! check marks without any bookkeeping surviving a resync.

use smallvec::SmallVec;

use chess_rules::{self, piece_glyph, Board, File, Rank, Square, UciMove, EMPTY_SQUARE};

use crate::events::{Cell, CellPatch, Highlight, Orientation};

/// Map a board square to a display cell. Row 0 is the top row of the
/// drawn board. Mirroring for a flipped board happens here and nowhere
/// else.
pub fn to_cell(square: Square, orientation: Orientation) -> Cell {
    let file = square.file() as usize;
    let rank = square.rank() as usize;
    match orientation {
        Orientation::Normal => Cell {
            col: file as u8,
            row: (7 - rank) as u8,
        },
        Orientation::Flipped => Cell {
            col: (7 - file) as u8,
            row: rank as u8,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardView {
    glyphs: [[char; 8]; 8],
    highlights: [[Highlight; 8]; 8],
}

impl BoardView {
    /// Build a view of `board`, highlighting the last move's endpoints
    /// and, when the side to move is in check, its king's square.
    pub fn from_position(board: &Board, last_move: Option<UciMove>) -> Self {
        let mut glyphs = [[EMPTY_SQUARE; 8]; 8];
        let mut highlights = [[Highlight::None; 8]; 8];

        for &rank in &Rank::ALL {
            for &file in &File::ALL {
                let square = Square::new(file, rank);
                if let Some(piece) = board.piece_on(square) {
                    if let Some(color) = board.color_on(square) {
                        glyphs[rank as usize][file as usize] = piece_glyph(piece, color);
                    }
                }
            }
        }

        if let Some(mv) = last_move {
            highlights[mv.from.rank() as usize][mv.from.file() as usize] = Highlight::LastMove;
            highlights[mv.to.rank() as usize][mv.to.file() as usize] = Highlight::LastMove;
        }
        if chess_rules::in_check(board) {
            let king = chess_rules::king_square(board, board.side_to_move());
            highlights[king.rank() as usize][king.file() as usize] = Highlight::Check;
        }

        Self { glyphs, highlights }
    }

    fn at(&self, square: Square) -> (char, Highlight) {
        let rank = square.rank() as usize;
        let file = square.file() as usize;
        (self.glyphs[rank][file], self.highlights[rank][file])
    }

    /// All 64 cells in display space, for a full redraw.
    pub fn full_cells(&self, orientation: Orientation) -> Vec<CellPatch> {
        let mut cells = Vec::with_capacity(64);
        for &rank in &Rank::ALL {
            for &file in &File::ALL {
                let square = Square::new(file, rank);
                let (glyph, highlight) = self.at(square);
                cells.push(CellPatch {
                    cell: to_cell(square, orientation),
                    glyph,
                    highlight,
                });
            }
        }
        cells
    }

    /// Cells that differ from `previous`, in display space. A plain move
    /// from a highlight-free position yields exactly the two endpoint
    /// cells; otherwise stale highlights add a couple more.
    pub fn diff(&self, previous: &BoardView, orientation: Orientation) -> SmallVec<[CellPatch; 4]> {
        let mut patches = SmallVec::new();
        for &rank in &Rank::ALL {
            for &file in &File::ALL {
                let square = Square::new(file, rank);
                let (glyph, highlight) = self.at(square);
                if (glyph, highlight) != previous.at(square) {
                    patches.push(CellPatch {
                        cell: to_cell(square, orientation),
                        glyph,
                        highlight,
                    });
                }
            }
        }
        patches
    }
}
