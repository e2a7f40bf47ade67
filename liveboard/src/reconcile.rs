//! Classifies an authoritative move list against local history.
//!
//! The server resends the whole move list on every update and gives no
//! sequence numbers, so the length delta against local history is the only
//! signal. Exactly one move longer is an append, exactly one shorter is a
//! take-back, equal length is a duplicate delivery, and everything else
//! (multi-move jumps, shrunken lists, prefix divergence) degrades to a
//! wholesale reload. An appended move is validated against the local
//! position before it is trusted; stale reconnects can replay garbage.

use chess_rules::{self, UciMove};

use crate::session::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciliation {
    /// One new move at the tail. `special` means the move changes more
    /// than two squares (castling, en passant, promotion) and needs a
    /// full redraw.
    Append { mv: UciMove, special: bool },
    /// The server retracted the last local move.
    Takeback,
    /// Duplicate delivery. Must produce no render commands.
    Noop,
    /// Histories diverged; discard local state and reload from the list.
    Resync,
}

/// Compare an incoming move list with the session's history.
pub fn classify(state: &SessionState, incoming: &[UciMove]) -> Reconciliation {
    let local = state.history();
    let n = incoming.len();
    let p = local.len();

    if n == p + 1 {
        if incoming[..p] != *local {
            return Reconciliation::Resync;
        }
        let mv = incoming[p];
        if !chess_rules::is_legal(state.board(), mv) {
            return Reconciliation::Resync;
        }
        let special = chess_rules::is_special(state.board(), mv);
        Reconciliation::Append { mv, special }
    } else if p > 0 && n == p - 1 {
        if incoming != &local[..n] {
            return Reconciliation::Resync;
        }
        Reconciliation::Takeback
    } else if n == p {
        if incoming == local {
            Reconciliation::Noop
        } else {
            Reconciliation::Resync
        }
    } else {
        Reconciliation::Resync
    }
}
