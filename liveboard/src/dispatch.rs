//! The single consumer loop's brain: one tick drains user commands, then
//! lobby events, then game events, mutates session and clock state, and
//! emits render commands. All mutation happens here, on one thread.

use chess_rules::{self, Color, UciMove};
use lichess_client::{
    AiChallengeParams, ClientError, GameEvent, GameFull, GameStateBody, GameTransport, LobbyEvent,
    LobbyGame, SeekParams,
};
use tracing::{debug, warn};

use crate::board_view::BoardView;
use crate::clock::ClockModel;
use crate::error::{CoreError, CoreResult};
use crate::events::{InboundEvent, Orientation, RenderCommand, UiCommand};
use crate::reconcile::{self, Reconciliation};
use crate::session::{GameOutcome, OutcomeReason, SessionState, Variant};

const MENU_LINES: [&str; 3] = ["seek opponent", "challenge computer", "exit"];

fn menu_text() -> String {
    let items: Vec<String> = MENU_LINES
        .iter()
        .enumerate()
        .map(|(index, label)| format!("[{index}] {label}"))
        .collect();
    format!("menu: {}", items.join("  "))
}

fn color_from_name(name: &str) -> Option<Color> {
    match name {
        "white" => Some(Color::White),
        "black" => Some(Color::Black),
        _ => None,
    }
}

fn to_core(err: ClientError) -> CoreError {
    match err {
        ClientError::Rejected { message, .. } => CoreError::RemoteRejection(message),
        other => CoreError::Transport(other),
    }
}

/// Map a tick-level failure to its render command. User mistakes and
/// server refusals are transient status text; a desync has already been
/// absorbed by a reload; anything else is shown as an error.
fn report(err: &CoreError, out: &mut Vec<RenderCommand>) {
    match err {
        CoreError::IllegalLocalCommand(_) | CoreError::RemoteRejection(_) => {
            out.push(RenderCommand::SetStatusLine(err.to_string()));
        }
        CoreError::ProtocolDesync => {}
        CoreError::Transport(_) | CoreError::Spawn(_) | CoreError::Rules(_) => {
            out.push(RenderCommand::ShowError(err.to_string()));
        }
    }
}

/// One joined game: authoritative-state mirror, clock estimate, and the
/// last rendered view for diffing.
struct Live {
    state: SessionState,
    clock: ClockModel,
    view: BoardView,
    player_color: Option<Color>,
}

enum Phase {
    NoSession,
    AwaitingFull {
        game_id: String,
        orientation: Orientation,
        player_color: Option<Color>,
    },
    Active(Live),
    Terminal(Live),
}

pub struct SessionDispatcher<T: GameTransport> {
    transport: T,
    phase: Phase,
    shutdown: bool,
    pending_game_stream: Option<String>,
    pending_theme: Option<String>,
}

impl<T: GameTransport> SessionDispatcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            phase: Phase::NoSession,
            shutdown: false,
            pending_game_stream: None,
            pending_theme: None,
        }
    }

    /// Commands to render before the first tick.
    pub fn startup(&self) -> Vec<RenderCommand> {
        vec![RenderCommand::SetStatusLine(menu_text())]
    }

    /// The user asked to quit.
    pub fn shutdown_requested(&self) -> bool {
        self.shutdown
    }

    /// Game id whose stream the runtime should start reading, set when a
    /// lobby event joins a game.
    pub fn take_pending_game_stream(&mut self) -> Option<String> {
        self.pending_game_stream.take()
    }

    /// Theme name the user switched to this tick, for the runtime to
    /// persist and hand to the display adapter.
    pub fn take_theme_change(&mut self) -> Option<String> {
        self.pending_theme.take()
    }

    /// Whether a game stream is worth keeping alive: a session is joined
    /// or running, but not finished.
    pub fn in_game(&self) -> bool {
        matches!(self.phase, Phase::AwaitingFull { .. } | Phase::Active(_))
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn current_game_id(&self) -> Option<String> {
        match &self.phase {
            Phase::AwaitingFull { game_id, .. } => Some(game_id.clone()),
            Phase::Active(live) | Phase::Terminal(live) => Some(live.state.game_id().to_owned()),
            Phase::NoSession => None,
        }
    }

    /// Process one tick's worth of drained input. UI commands are applied
    /// before server events so a user action always sees the state it was
    /// issued against; lobby events are applied before game events.
    pub fn tick(
        &mut self,
        ui_commands: Vec<UiCommand>,
        inbound: Vec<InboundEvent>,
    ) -> Vec<RenderCommand> {
        let mut out = Vec::new();

        for command in ui_commands {
            self.apply_ui(command, &mut out);
        }

        let (lobby, game): (Vec<_>, Vec<_>) = inbound
            .into_iter()
            .partition(|event| matches!(event, InboundEvent::Lobby(_)));
        for event in lobby {
            if let InboundEvent::Lobby(event) = event {
                self.apply_lobby(event, &mut out);
            }
        }
        for event in game {
            if let InboundEvent::Game(event) = event {
                self.apply_game(event, &mut out);
            }
        }

        self.emit_clock(&mut out);
        out
    }

    fn emit_clock(&self, out: &mut Vec<RenderCommand>) {
        let Phase::Active(live) = &self.phase else {
            return;
        };
        if !live.clock.running() {
            return;
        }
        // Floor at zero: once the estimate runs out, stop updating and
        // wait for the server to declare the flag fall.
        if live.clock.remaining_ms(live.clock.side_on_clock()) == 0 {
            return;
        }
        if out
            .iter()
            .any(|command| matches!(command, RenderCommand::SetClockText { .. }))
        {
            return;
        }
        let (white, black) = live.clock.display_pair();
        out.push(RenderCommand::SetClockText { white, black });
    }

    fn apply_ui(&mut self, command: UiCommand, out: &mut Vec<RenderCommand>) {
        match command {
            UiCommand::Exit => {
                self.phase = Phase::NoSession;
                self.pending_game_stream = None;
                self.shutdown = true;
            }
            UiCommand::MenuSelect(line) => self.menu_select(line, out),
            UiCommand::MakeMove(text) => self.make_move(&text, out),
            UiCommand::Resign => self.game_action(out, |transport, id| transport.resign(id)),
            UiCommand::Abort => self.game_action(out, |transport, id| transport.abort(id)),
            UiCommand::FlipBoard => {
                if let Phase::Active(live) | Phase::Terminal(live) = &mut self.phase {
                    live.state.flip_orientation();
                    out.push(RenderCommand::RedrawFullBoard {
                        cells: live.view.full_cells(live.state.orientation()),
                    });
                }
            }
            UiCommand::ChangeTheme(name) => {
                out.push(RenderCommand::SetStatusLine(format!("theme set to {name}")));
                self.pending_theme = Some(name);
            }
            UiCommand::Resize => match &self.phase {
                Phase::Active(live) | Phase::Terminal(live) => {
                    out.push(RenderCommand::RedrawFullBoard {
                        cells: live.view.full_cells(live.state.orientation()),
                    });
                }
                Phase::NoSession | Phase::AwaitingFull { .. } => {
                    out.push(RenderCommand::SetStatusLine(menu_text()));
                }
            },
        }
    }

    fn menu_select(&mut self, line: usize, out: &mut Vec<RenderCommand>) {
        match &self.phase {
            Phase::Terminal(_) => {
                // Any selection dismisses the finished game.
                self.phase = Phase::NoSession;
                out.push(RenderCommand::SetStatusLine(menu_text()));
            }
            Phase::NoSession => match line {
                0 => self.report_action(
                    self.transport.seek_opponent(&SeekParams::default()),
                    "seeking an opponent",
                    out,
                ),
                1 => self.report_action(
                    self.transport.challenge_computer(&AiChallengeParams::default()),
                    "challenging the computer",
                    out,
                ),
                2 => {
                    self.shutdown = true;
                }
                _ => {}
            },
            Phase::AwaitingFull { .. } | Phase::Active(_) => {}
        }
    }

    fn report_action(
        &self,
        result: Result<(), ClientError>,
        started: &str,
        out: &mut Vec<RenderCommand>,
    ) {
        match result {
            Ok(()) => out.push(RenderCommand::SetStatusLine(started.to_owned())),
            Err(err) => report(&to_core(err), out),
        }
    }

    fn game_action(
        &mut self,
        out: &mut Vec<RenderCommand>,
        action: impl FnOnce(&T, &str) -> Result<(), ClientError>,
    ) {
        let Phase::Active(live) = &self.phase else {
            out.push(RenderCommand::SetStatusLine("no active game".to_owned()));
            return;
        };
        if let Err(err) = action(&self.transport, live.state.game_id()) {
            report(&to_core(err), out);
        }
    }

    /// Validate locally, then submit. The move is never applied here; the
    /// server echoes it back through the game stream.
    fn make_move(&mut self, text: &str, out: &mut Vec<RenderCommand>) {
        let Phase::Active(live) = &self.phase else {
            out.push(RenderCommand::SetStatusLine("no active game".to_owned()));
            return;
        };
        if let Some(color) = live.player_color {
            if live.state.side_to_move() != color {
                report(&CoreError::IllegalLocalCommand("not your turn".into()), out);
                return;
            }
        }
        let mv = match chess_rules::parse_move_text(live.state.board(), text) {
            Ok(mv) => mv,
            Err(err) => {
                report(
                    &CoreError::IllegalLocalCommand(format!("illegal move {text}: {err}")),
                    out,
                );
                return;
            }
        };
        if let Err(err) = self
            .transport
            .submit_move(live.state.game_id(), &mv.to_string())
        {
            report(&to_core(err), out);
        }
    }

    fn apply_lobby(&mut self, event: LobbyEvent, out: &mut Vec<RenderCommand>) {
        match event {
            LobbyEvent::GameStart { game } => match self.phase {
                Phase::NoSession | Phase::Terminal(_) => self.join(game, out),
                Phase::AwaitingFull { .. } | Phase::Active(_) => {
                    debug!(game_id = %game.game_id, "already in a game, ignoring gameStart");
                }
            },
            LobbyEvent::GameFinish { game } => {
                out.push(RenderCommand::SetStatusLine(format!(
                    "game {} finished",
                    game.game_id
                )));
            }
            LobbyEvent::Other => {}
        }
    }

    fn join(&mut self, game: LobbyGame, out: &mut Vec<RenderCommand>) {
        let player_color = game.color.as_deref().and_then(color_from_name);
        let orientation = match player_color {
            Some(Color::Black) => Orientation::Flipped,
            _ => Orientation::Normal,
        };
        out.push(RenderCommand::SetStatusLine(format!(
            "joining game {}",
            game.game_id
        )));
        self.pending_game_stream = Some(game.game_id.clone());
        self.phase = Phase::AwaitingFull {
            game_id: game.game_id,
            orientation,
            player_color,
        };
    }

    fn apply_game(&mut self, event: GameEvent, out: &mut Vec<RenderCommand>) {
        match event {
            GameEvent::GameFull(full) => self.apply_full(full, out),
            GameEvent::GameState(body) => self.apply_state(body, out),
            GameEvent::ChatLine(chat) => {
                if !matches!(self.phase, Phase::NoSession) {
                    out.push(RenderCommand::SetStatusLine(format!(
                        "{}: {}",
                        chat.username, chat.text
                    )));
                }
            }
            GameEvent::OpponentGone(gone) => {
                if matches!(self.phase, Phase::Active(_)) {
                    let text = if gone.gone {
                        "opponent left the game"
                    } else {
                        "opponent is back"
                    };
                    out.push(RenderCommand::SetStatusLine(text.to_owned()));
                }
            }
        }
    }

    /// Authoritative snapshot: rebuild the whole session from it. Arrives
    /// once per stream open, and again after reconnects.
    fn apply_full(&mut self, full: GameFull, out: &mut Vec<RenderCommand>) {
        let (orientation, player_color) = match &self.phase {
            Phase::AwaitingFull {
                orientation,
                player_color,
                ..
            } => (*orientation, *player_color),
            Phase::Active(live) => (live.state.orientation(), live.player_color),
            Phase::NoSession | Phase::Terminal(_) => {
                debug!(game_id = %full.id, "dropping gameFull with no session");
                return;
            }
        };

        let status = full.state.status;
        let winner = full.state.winner.clone();
        let mut live = match build_live(full, orientation, player_color) {
            Ok(live) => live,
            Err(err) => {
                warn!(error = %err, "unusable game snapshot");
                out.push(RenderCommand::ShowError(format!("bad snapshot: {err}")));
                return;
            }
        };

        out.push(RenderCommand::RedrawFullBoard {
            cells: live.view.full_cells(orientation),
        });
        let (white, black) = live.clock.display_pair();
        out.push(RenderCommand::SetClockText { white, black });

        if status.is_terminal() {
            finish(&mut live, status, winner.as_deref(), out);
            self.phase = Phase::Terminal(live);
        } else {
            self.phase = Phase::Active(live);
        }
    }

    /// Incremental update. Only meaningful with an active session; in
    /// `AwaitingFull` the snapshot that is still in flight supersedes it.
    fn apply_state(&mut self, body: GameStateBody, out: &mut Vec<RenderCommand>) {
        let phase = std::mem::replace(&mut self.phase, Phase::NoSession);
        self.phase = match phase {
            Phase::Active(mut live) => {
                step_live(&mut live, &body, out);
                if body.status.is_terminal() {
                    finish(&mut live, body.status, body.winner.as_deref(), out);
                    Phase::Terminal(live)
                } else {
                    Phase::Active(live)
                }
            }
            other @ Phase::AwaitingFull { .. } => {
                debug!("dropping gameState received before the full snapshot");
                other
            }
            other => other,
        };
    }
}

fn build_live(
    full: GameFull,
    orientation: Orientation,
    player_color: Option<Color>,
) -> Result<Live, CoreError> {
    let variant = Variant::from_wire(full.variant.as_ref(), full.initial_fen.as_deref());
    let mut state = SessionState::new(full.id, variant, orientation)?;
    let moves = chess_rules::parse_move_list(&full.state.moves)?;
    state.reload(&moves)?;

    let running = moves.len() % 2 == 1 && !full.state.status.is_terminal();
    let clock = ClockModel::from_snapshot(
        full.state.wtime,
        full.state.btime,
        full.state.winc,
        full.state.binc,
        state.side_to_move(),
        running,
    );
    let view = BoardView::from_position(state.board(), moves.last().copied());
    Ok(Live {
        state,
        clock,
        view,
        player_color,
    })
}

/// Apply one incremental update's move list to a live session.
fn step_live(live: &mut Live, body: &GameStateBody, out: &mut Vec<RenderCommand>) {
    let moves = match chess_rules::parse_move_list(&body.moves) {
        Ok(moves) => moves,
        Err(err) => {
            warn!(error = %err, "dropping update with unparseable moves");
            return;
        }
    };

    let orientation = live.state.orientation();
    match reconcile::classify(&live.state, &moves) {
        Reconciliation::Noop => {
            // Duplicate delivery: no render output, no clock churn.
            return;
        }
        Reconciliation::Append { mv, special } => {
            if live.state.push_move(mv).is_err() {
                // classify() validated legality; treat a failure here as
                // divergence and fall back to a reload.
                if let Err(err) = resync(live, &moves, out) {
                    warn!(error = %err, "reload after failed append did not converge");
                }
            } else {
                let view = current_view(live);
                if special {
                    out.push(RenderCommand::RedrawFullBoard {
                        cells: view.full_cells(orientation),
                    });
                } else {
                    out.push(RenderCommand::PatchSquares(view.diff(&live.view, orientation)));
                }
                live.view = view;
            }
        }
        Reconciliation::Takeback => {
            if live.state.pop_move().is_err() {
                if let Err(err) = resync(live, &moves, out) {
                    warn!(error = %err, "reload after failed takeback did not converge");
                }
            } else {
                let view = current_view(live);
                out.push(RenderCommand::RedrawFullBoard {
                    cells: view.full_cells(orientation),
                });
                live.view = view;
            }
        }
        Reconciliation::Resync => {
            if let Err(err) = resync(live, &moves, out) {
                warn!(error = %err, "dropping update with illegal move list");
            }
        }
    }

    live.clock.sync(
        body.wtime,
        body.btime,
        live.state.side_to_move(),
        !body.status.is_terminal(),
    );
}

/// Discard local history and reload wholesale from the server's list.
fn resync(live: &mut Live, moves: &[UciMove], out: &mut Vec<RenderCommand>) -> CoreResult<()> {
    if live.state.reload(moves).is_err() {
        return Err(CoreError::ProtocolDesync);
    }
    let view = current_view(live);
    out.push(RenderCommand::RedrawFullBoard {
        cells: view.full_cells(live.state.orientation()),
    });
    live.view = view;
    Ok(())
}

fn current_view(live: &Live) -> BoardView {
    BoardView::from_position(live.state.board(), live.state.history().last().copied())
}

fn finish(live: &mut Live, status: lichess_client::GameStatus, winner: Option<&str>, out: &mut Vec<RenderCommand>) {
    live.clock.stop();
    let outcome = GameOutcome {
        winner: winner.and_then(color_from_name),
        reason: OutcomeReason::from_status(status),
    };
    out.push(RenderCommand::SetStatusLine(outcome.message()));
    let (white, black) = live.clock.display_pair();
    out.push(RenderCommand::SetClockText { white, black });
    live.state.set_terminal(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use lichess_client::{GameStatus, ScriptedTransport, TransportCall};

    fn lobby_start(game_id: &str, color: &str) -> InboundEvent {
        InboundEvent::Lobby(LobbyEvent::GameStart {
            game: LobbyGame {
                game_id: game_id.into(),
                color: Some(color.into()),
                fen: None,
                is_my_turn: color == "white",
            },
        })
    }

    fn full_snapshot(game_id: &str, moves: &str) -> InboundEvent {
        InboundEvent::Game(GameEvent::GameFull(GameFull {
            id: game_id.into(),
            variant: None,
            initial_fen: None,
            state: state_body(moves, GameStatus::Started, None),
        }))
    }

    fn state_body(moves: &str, status: GameStatus, winner: Option<&str>) -> GameStateBody {
        GameStateBody {
            moves: moves.into(),
            wtime: 600_000,
            btime: 600_000,
            winc: 0,
            binc: 0,
            status,
            winner: winner.map(str::to_owned),
        }
    }

    fn state_update(moves: &str, status: GameStatus, winner: Option<&str>) -> InboundEvent {
        InboundEvent::Game(GameEvent::GameState(state_body(moves, status, winner)))
    }

    fn joined(dispatcher: &mut SessionDispatcher<ScriptedTransport>) {
        dispatcher.tick(vec![], vec![lobby_start("g1", "white")]);
        assert_eq!(dispatcher.take_pending_game_stream().as_deref(), Some("g1"));
        dispatcher.tick(vec![], vec![full_snapshot("g1", "")]);
    }

    #[test]
    fn join_then_snapshot_activates_with_one_redraw() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        dispatcher.tick(vec![], vec![lobby_start("g1", "white")]);
        let commands = dispatcher.tick(vec![], vec![full_snapshot("g1", "e2e4 e7e5 g1f3")]);
        let redraws = commands
            .iter()
            .filter(|c| matches!(c, RenderCommand::RedrawFullBoard { .. }))
            .count();
        assert_eq!(redraws, 1);
        // Odd move count: white's reply is due, clock runs.
        assert!(matches!(&dispatcher.phase, Phase::Active(live) if live.clock.running()));
    }

    #[test]
    fn move_command_submits_but_never_mutates() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        joined(&mut dispatcher);
        dispatcher.tick(vec![UiCommand::MakeMove("e4".into())], vec![]);
        assert_eq!(
            dispatcher.transport.calls(),
            vec![TransportCall::SubmitMove {
                game_id: "g1".into(),
                uci: "e2e4".into()
            }]
        );
        let Phase::Active(live) = &dispatcher.phase else {
            panic!("expected active phase");
        };
        assert!(live.state.history().is_empty());
    }

    #[test]
    fn out_of_turn_move_is_reported_not_submitted() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        dispatcher.tick(vec![], vec![lobby_start("g1", "black")]);
        dispatcher.tick(vec![], vec![full_snapshot("g1", "")]);
        let commands = dispatcher.tick(vec![UiCommand::MakeMove("e7e5".into())], vec![]);
        assert!(commands
            .iter()
            .any(|c| *c == RenderCommand::SetStatusLine("not your turn".into())));
        assert!(dispatcher.transport.calls().is_empty());
    }

    #[test]
    fn rejected_submission_becomes_a_status_line() {
        let mut dispatcher =
            SessionDispatcher::new(ScriptedTransport::new().rejecting_actions("too late"));
        joined(&mut dispatcher);
        let commands = dispatcher.tick(vec![UiCommand::MakeMove("e2e4".into())], vec![]);
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::SetStatusLine(s) if s.contains("too late"))));
    }

    #[test]
    fn duplicate_update_produces_no_render_commands() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        joined(&mut dispatcher);
        dispatcher.tick(vec![], vec![state_update("e2e4", GameStatus::Started, None)]);
        let commands = dispatcher.tick(vec![], vec![state_update("e2e4", GameStatus::Started, None)]);
        assert!(commands
            .iter()
            .all(|c| matches!(c, RenderCommand::SetClockText { .. })));
    }

    #[test]
    fn game_state_before_snapshot_is_dropped() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        dispatcher.tick(vec![], vec![lobby_start("g1", "white")]);
        let commands = dispatcher.tick(vec![], vec![state_update("e2e4", GameStatus::Started, None)]);
        assert!(commands.is_empty());
        assert!(matches!(dispatcher.phase, Phase::AwaitingFull { .. }));
    }

    #[test]
    fn menu_select_seeks_and_exits() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        dispatcher.tick(vec![UiCommand::MenuSelect(0)], vec![]);
        assert_eq!(
            dispatcher.transport.calls(),
            vec![TransportCall::SeekOpponent(SeekParams::default())]
        );
        dispatcher.tick(vec![UiCommand::MenuSelect(2)], vec![]);
        assert!(dispatcher.shutdown_requested());
    }

    #[test]
    fn terminal_dismiss_returns_to_menu() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        joined(&mut dispatcher);
        dispatcher.tick(
            vec![],
            vec![state_update("", GameStatus::Resign, Some("black"))],
        );
        assert!(matches!(dispatcher.phase, Phase::Terminal(_)));
        let commands = dispatcher.tick(vec![UiCommand::MenuSelect(0)], vec![]);
        assert!(matches!(dispatcher.phase, Phase::NoSession));
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::SetStatusLine(s) if s.starts_with("menu:"))));
    }

    #[test]
    fn flip_board_redraws_without_touching_history() {
        let mut dispatcher = SessionDispatcher::new(ScriptedTransport::new());
        joined(&mut dispatcher);
        dispatcher.tick(vec![], vec![state_update("e2e4", GameStatus::Started, None)]);
        let commands = dispatcher.tick(vec![UiCommand::FlipBoard], vec![]);
        assert!(commands
            .iter()
            .any(|c| matches!(c, RenderCommand::RedrawFullBoard { .. })));
        let Phase::Active(live) = &dispatcher.phase else {
            panic!("expected active phase");
        };
        assert_eq!(live.state.orientation(), Orientation::Flipped);
        assert_eq!(live.state.history().len(), 1);
    }
}
