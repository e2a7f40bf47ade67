//! The three closed unions flowing through the dispatcher: inbound server
//! events, user commands, and outbound render commands.

use lichess_client::{GameEvent, LobbyEvent};
use smallvec::SmallVec;

/// An event read off one of the inbound streams. Ordering within a stream
/// is arrival order; nothing is guaranteed across streams.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Lobby(LobbyEvent),
    Game(GameEvent),
}

/// A command issued by the user through the display surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    /// Activate the menu entry on the given zero-based line.
    MenuSelect(usize),
    /// Move text: UCI or SAN.
    MakeMove(String),
    Resign,
    Abort,
    FlipBoard,
    ChangeTheme(String),
    Resize,
    Exit,
}

/// Which player's perspective the board is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    /// White at the bottom.
    #[default]
    Normal,
    /// Black at the bottom.
    Flipped,
}

impl Orientation {
    pub fn toggled(self) -> Self {
        match self {
            Orientation::Normal => Orientation::Flipped,
            Orientation::Flipped => Orientation::Normal,
        }
    }
}

/// A display-space cell: column 0 is leftmost, row 0 is topmost, as drawn.
/// Board-to-display mapping (including orientation mirroring) has already
/// happened by the time a `Cell` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub col: u8,
    pub row: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Highlight {
    #[default]
    None,
    /// Source or destination of the most recent move.
    LastMove,
    /// The checked king's square.
    Check,
}

/// One square's worth of render state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellPatch {
    pub cell: Cell,
    pub glyph: char,
    pub highlight: Highlight,
}

/// Everything the display surface can be told to do.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Replace the whole board; carries all 64 cells.
    RedrawFullBoard { cells: Vec<CellPatch> },
    /// Update only the listed cells.
    PatchSquares(SmallVec<[CellPatch; 4]>),
    SetClockText { white: String, black: String },
    SetStatusLine(String),
    ShowError(String),
}
