//! Countdown clock estimation between authoritative snapshots.
//!
//! Ground truth for both clocks only ever arrives in server snapshots. In
//! between, the displayed value for the side on the clock is estimated from
//! elapsed wall time since the last sync; the other side's value is frozen.
//! Every sync resets the reference instant and replaces the remaining
//! times with the server's, so estimation error never accumulates across
//! moves. Running out of time locally is a display floor at zero, never a
//! locally-declared result.

use std::time::Instant;

use chess_rules::Color;

#[derive(Debug, Clone)]
pub struct ClockModel {
    white_ms: u64,
    black_ms: u64,
    white_inc_ms: u64,
    black_inc_ms: u64,
    side_on_clock: Color,
    running: bool,
    last_sync: Instant,
}

impl ClockModel {
    /// Build from a full snapshot's clock fields.
    pub fn from_snapshot(
        wtime: u64,
        btime: u64,
        winc: u64,
        binc: u64,
        side_on_clock: Color,
        running: bool,
    ) -> Self {
        Self {
            white_ms: wtime,
            black_ms: btime,
            white_inc_ms: winc,
            black_inc_ms: binc,
            side_on_clock,
            running,
            last_sync: Instant::now(),
        }
    }

    /// Adopt a new authoritative snapshot. Replaces both remaining times
    /// (the server never changes the non-moving side's value between that
    /// side's own moves, so the only effective overwrite is the side whose
    /// clock was running) and restarts estimation from now.
    pub fn sync(&mut self, wtime: u64, btime: u64, side_on_clock: Color, running: bool) {
        self.white_ms = wtime;
        self.black_ms = btime;
        self.side_on_clock = side_on_clock;
        self.running = running;
        self.last_sync = Instant::now();
    }

    /// Stop the clock (terminal game state).
    pub fn stop(&mut self) {
        self.white_ms = self.remaining_ms(Color::White);
        self.black_ms = self.remaining_ms(Color::Black);
        self.running = false;
        self.last_sync = Instant::now();
    }

    pub fn running(&self) -> bool {
        self.running
    }

    pub fn side_on_clock(&self) -> Color {
        self.side_on_clock
    }

    pub fn increment_ms(&self, side: Color) -> u64 {
        match side {
            Color::White => self.white_inc_ms,
            Color::Black => self.black_inc_ms,
        }
    }

    /// Current estimate of a side's remaining time.
    pub fn remaining_ms(&self, side: Color) -> u64 {
        self.remaining_at(side, Instant::now())
    }

    /// Estimate at a caller-supplied instant (test seam).
    pub fn remaining_at(&self, side: Color, now: Instant) -> u64 {
        let base = match side {
            Color::White => self.white_ms,
            Color::Black => self.black_ms,
        };
        if self.running && side == self.side_on_clock {
            let elapsed = now.saturating_duration_since(self.last_sync).as_millis() as u64;
            base.saturating_sub(elapsed)
        } else {
            base
        }
    }

    /// Display strings for both sides. A nonzero increment is shown next
    /// to the remaining time, `3:00+2` style.
    pub fn display_pair(&self) -> (String, String) {
        (self.display_side(Color::White), self.display_side(Color::Black))
    }

    fn display_side(&self, side: Color) -> String {
        let remaining = Self::format_ms(self.remaining_ms(side));
        match self.increment_ms(side) {
            0 => remaining,
            inc => format!("{remaining}+{}", inc / 1000),
        }
    }

    /// Format milliseconds for display: `M:SS`, or `M:SS.t` under ten
    /// seconds.
    pub fn format_ms(ms: u64) -> String {
        let total_secs = ms / 1000;
        let minutes = total_secs / 60;
        let seconds = total_secs % 60;
        if total_secs < 10 {
            let tenths = (ms % 1000) / 100;
            format!("{}:{:02}.{}", minutes, seconds, tenths)
        } else {
            format!("{}:{:02}", minutes, seconds)
        }
    }
}
