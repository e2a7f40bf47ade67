//! Display adapter boundary.
//!
//! The core emits `RenderCommand`s and knows nothing about how they are
//! drawn. `TerminalSurface` is a plain ANSI renderer that keeps the last
//! known cell grid and repaints it on every command batch; anything
//! fancier plugs in behind the same trait.

use std::io::{self, Write};

use chess_rules::EMPTY_SQUARE;

use crate::events::{CellPatch, Highlight, RenderCommand};

pub trait DisplaySurface {
    fn render(&mut self, command: &RenderCommand);

    fn render_all(&mut self, commands: &[RenderCommand]) {
        for command in commands {
            self.render(command);
        }
    }

    /// Adopt a new theme. Surfaces without themes ignore it.
    fn set_theme(&mut self, _name: &str) {}
}

/// Highlight colors, selectable by theme name. Unknown names fall back to
/// the default palette.
#[derive(Debug, Clone, Copy)]
struct Palette {
    last_move: &'static str,
    check: &'static str,
}

const RESET: &str = "\x1b[0m";

fn palette_for(theme: &str) -> Palette {
    match theme {
        "mono" => Palette {
            last_move: "\x1b[7m",
            check: "\x1b[4m",
        },
        _ => Palette {
            last_move: "\x1b[43m",
            check: "\x1b[41m",
        },
    }
}

pub struct TerminalSurface<W: Write> {
    out: W,
    cells: [[(char, Highlight); 8]; 8],
    clock_line: String,
    status_line: String,
    palette: Palette,
}

impl TerminalSurface<io::Stdout> {
    pub fn stdout(theme: &str) -> Self {
        Self::new(io::stdout(), theme)
    }
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W, theme: &str) -> Self {
        Self {
            out,
            cells: [[(EMPTY_SQUARE, Highlight::None); 8]; 8],
            clock_line: String::new(),
            status_line: String::new(),
            palette: palette_for(theme),
        }
    }

    fn apply(&mut self, patches: &[CellPatch]) {
        for patch in patches {
            let row = patch.cell.row as usize;
            let col = patch.cell.col as usize;
            self.cells[row][col] = (patch.glyph, patch.highlight);
        }
    }

    fn repaint(&mut self) {
        // Clear screen, home cursor, then draw the grid top row first.
        let mut frame = String::from("\x1b[2J\x1b[H");
        for row in &self.cells {
            for &(glyph, highlight) in row {
                match highlight {
                    Highlight::None => frame.push(glyph),
                    Highlight::LastMove => {
                        frame.push_str(self.palette.last_move);
                        frame.push(glyph);
                        frame.push_str(RESET);
                    }
                    Highlight::Check => {
                        frame.push_str(self.palette.check);
                        frame.push(glyph);
                        frame.push_str(RESET);
                    }
                }
                frame.push(' ');
            }
            frame.push('\n');
        }
        frame.push('\n');
        frame.push_str(&self.clock_line);
        frame.push('\n');
        frame.push_str(&self.status_line);
        frame.push('\n');

        if let Err(err) = self.out.write_all(frame.as_bytes()).and_then(|()| self.out.flush()) {
            tracing::warn!(error = %err, "terminal write failed");
        }
    }
}

impl<W: Write> DisplaySurface for TerminalSurface<W> {
    fn render(&mut self, command: &RenderCommand) {
        match command {
            RenderCommand::RedrawFullBoard { cells } => {
                self.cells = [[(EMPTY_SQUARE, Highlight::None); 8]; 8];
                self.apply(cells);
                self.repaint();
            }
            RenderCommand::PatchSquares(patches) => {
                self.apply(patches);
                self.repaint();
            }
            RenderCommand::SetClockText { white, black } => {
                self.clock_line = format!("white {white}  black {black}");
                self.repaint();
            }
            RenderCommand::SetStatusLine(text) => {
                self.status_line = text.clone();
                self.repaint();
            }
            RenderCommand::ShowError(text) => {
                self.status_line = format!("error: {text}");
                self.repaint();
            }
        }
    }

    fn set_theme(&mut self, name: &str) {
        self.palette = palette_for(name);
        self.repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Cell;
    use smallvec::smallvec;

    fn surface() -> TerminalSurface<Vec<u8>> {
        TerminalSurface::new(Vec::new(), "default")
    }

    #[test]
    fn patch_updates_the_kept_grid() {
        let mut surface = surface();
        surface.render(&RenderCommand::PatchSquares(smallvec![CellPatch {
            cell: Cell { col: 4, row: 4 },
            glyph: '\u{2659}',
            highlight: Highlight::LastMove,
        }]));
        assert_eq!(surface.cells[4][4].0, '\u{2659}');
        assert_eq!(surface.cells[4][4].1, Highlight::LastMove);
    }

    #[test]
    fn full_redraw_resets_untouched_cells() {
        let mut surface = surface();
        surface.render(&RenderCommand::PatchSquares(smallvec![CellPatch {
            cell: Cell { col: 0, row: 0 },
            glyph: 'x',
            highlight: Highlight::None,
        }]));
        surface.render(&RenderCommand::RedrawFullBoard { cells: vec![] });
        assert_eq!(surface.cells[0][0].0, EMPTY_SQUARE);
    }

    #[test]
    fn status_and_clock_lines_reach_the_output() {
        let mut surface = surface();
        surface.render(&RenderCommand::SetClockText {
            white: "3:00".into(),
            black: "2:59".into(),
        });
        surface.render(&RenderCommand::SetStatusLine("your move".into()));
        let written = String::from_utf8(surface.out.clone()).unwrap();
        assert!(written.contains("white 3:00  black 2:59"));
        assert!(written.contains("your move"));
    }
}
