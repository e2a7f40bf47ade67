//! Wires the pieces together: reader threads feeding the shared queue, the
//! dispatcher ticking at a fixed interval, the display surface consuming
//! render commands, and reconnection when a reader dies.

use std::io::BufRead;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use lichess_client::GameTransport;
use tracing::{info, warn};

use crate::config::Config;
use crate::dispatch::SessionDispatcher;
use crate::error::{CoreError, CoreResult};
use crate::display::DisplaySurface;
use crate::events::{InboundEvent, RenderCommand, UiCommand};
use crate::queue::{EventQueue, Publisher};
use crate::reader::{StreamReader, StreamRole};

const TICK: Duration = Duration::from_millis(100);
/// Ticks to wait between reconnection attempts.
const RECONNECT_TICKS: u32 = 50;

/// Turn one line of user input into a command. Lines starting with `:` are
/// actions, a lone digit selects a menu entry, anything else is move text.
pub fn parse_input_line(line: &str) -> Option<UiCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Some(rest) = trimmed.strip_prefix(':') {
        let mut parts = rest.split_whitespace();
        return match parts.next()? {
            "q" | "quit" | "exit" => Some(UiCommand::Exit),
            "resign" => Some(UiCommand::Resign),
            "abort" => Some(UiCommand::Abort),
            "flip" => Some(UiCommand::FlipBoard),
            "theme" => parts.next().map(|name| UiCommand::ChangeTheme(name.to_owned())),
            _ => None,
        };
    }
    if trimmed.len() == 1 {
        if let Some(digit) = trimmed.chars().next().and_then(|c| c.to_digit(10)) {
            return Some(UiCommand::MenuSelect(digit as usize));
        }
    }
    Some(UiCommand::MakeMove(trimmed.to_owned()))
}

/// Read stdin lines into the UI command queue until EOF or revocation.
pub fn spawn_input_thread(publisher: Publisher<UiCommand>) -> std::io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("input".to_owned())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if let Some(command) = parse_input_line(&line) {
                    if !publisher.publish(command) {
                        break;
                    }
                }
            }
        })
}

pub struct Runtime<T: GameTransport + 'static, S: DisplaySurface> {
    transport: Arc<T>,
    dispatcher: SessionDispatcher<Arc<T>>,
    surface: S,
    config: Config,
    config_path: std::path::PathBuf,
    inbound: EventQueue<InboundEvent>,
    ui: EventQueue<UiCommand>,
    lobby_reader: Option<StreamReader>,
    game_reader: Option<StreamReader>,
    reconnect_in: u32,
}

impl<T: GameTransport + 'static, S: DisplaySurface> Runtime<T, S> {
    pub fn new(transport: T, config: Config, config_path: std::path::PathBuf, surface: S) -> Self {
        let transport = Arc::new(transport);
        Self {
            dispatcher: SessionDispatcher::new(Arc::clone(&transport)),
            transport,
            surface,
            config,
            config_path,
            inbound: EventQueue::new(),
            ui: EventQueue::new(),
            lobby_reader: None,
            game_reader: None,
            reconnect_in: 0,
        }
    }

    /// Handle for the display adapter's input side.
    pub fn ui_publisher(&self) -> Publisher<UiCommand> {
        self.ui.publisher()
    }

    pub fn run(&mut self) -> CoreResult<()> {
        self.start_lobby_reader()?;
        let startup = self.dispatcher.startup();
        self.surface.render_all(&startup);

        loop {
            thread::sleep(TICK);
            self.step();
            if self.dispatcher.shutdown_requested() {
                break;
            }
        }

        info!("shutting down");
        self.stop_readers();
        Ok(())
    }

    /// One tick: drain, dispatch, render, then follow up on whatever the
    /// dispatcher asked for.
    fn step(&mut self) {
        let ui_commands = self.ui.drain();
        let inbound = self.inbound.drain();
        let commands = self.dispatcher.tick(ui_commands, inbound);
        self.surface.render_all(&commands);

        if let Some(game_id) = self.dispatcher.take_pending_game_stream() {
            self.start_game_reader(&game_id);
        }
        if let Some(theme) = self.dispatcher.take_theme_change() {
            self.surface.set_theme(&theme);
            self.config.theme = theme;
            if let Err(err) = self.config.save_to(&self.config_path) {
                warn!(error = %err, "could not persist theme change");
            }
        }
        self.check_readers();
    }

    fn start_lobby_reader(&mut self) -> CoreResult<()> {
        let stream = self.transport.stream_lobby()?;
        let source = stream.map(|item| item.map(InboundEvent::Lobby));
        self.lobby_reader = Some(StreamReader::spawn(
            StreamRole::Lobby,
            source,
            self.inbound.publisher(),
        )?);
        Ok(())
    }

    fn start_game_reader(&mut self, game_id: &str) {
        if let Some(reader) = self.game_reader.take() {
            reader.stop();
        }
        let spawned = self
            .transport
            .stream_game(game_id)
            .map_err(CoreError::from)
            .and_then(|stream| {
                let source = stream.map(|item| item.map(InboundEvent::Game));
                StreamReader::spawn(StreamRole::Game, source, self.inbound.publisher())
                    .map_err(CoreError::from)
            });
        match spawned {
            Ok(reader) => self.game_reader = Some(reader),
            Err(err) => {
                warn!(game_id, error = %err, "could not open game stream");
                self.surface.render(&RenderCommand::ShowError(format!(
                    "cannot open game stream: {err}"
                )));
            }
        }
    }

    /// Reader death is recoverable: surface it and retry with a fresh
    /// reader after a pause instead of crashing.
    fn check_readers(&mut self) {
        if self.reconnect_in > 0 {
            self.reconnect_in -= 1;
            return;
        }

        let lobby_dead = self
            .lobby_reader
            .as_ref()
            .map_or(true, StreamReader::is_finished);
        if lobby_dead {
            self.surface.render(&RenderCommand::SetStatusLine(
                "lobby stream disconnected, reconnecting".to_owned(),
            ));
            if let Err(err) = self.start_lobby_reader() {
                warn!(error = %err, "lobby reconnect failed");
            }
            self.reconnect_in = RECONNECT_TICKS;
            return;
        }

        if self.dispatcher.in_game() {
            let game_dead = self
                .game_reader
                .as_ref()
                .map_or(true, StreamReader::is_finished);
            if game_dead {
                if let Some(game_id) = self.dispatcher.current_game_id() {
                    self.surface.render(&RenderCommand::SetStatusLine(
                        "game stream disconnected, reconnecting".to_owned(),
                    ));
                    self.start_game_reader(&game_id);
                    self.reconnect_in = RECONNECT_TICKS;
                }
            }
        }
    }

    fn stop_readers(&mut self) {
        if let Some(reader) = self.lobby_reader.take() {
            reader.stop();
        }
        if let Some(reader) = self.game_reader.take() {
            reader.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lichess_client::{
        GameEvent, GameFull, GameStateBody, GameStatus, LobbyEvent, LobbyGame, ScriptedTransport,
    };

    #[derive(Default)]
    struct RecordingSurface {
        commands: Vec<RenderCommand>,
    }

    impl DisplaySurface for RecordingSurface {
        fn render(&mut self, command: &RenderCommand) {
            self.commands.push(command.clone());
        }
    }

    fn test_config() -> (Config, std::path::PathBuf, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config");
        let config = Config {
            api_token: "tok".into(),
            theme: "default".into(),
        };
        (config, path, dir)
    }

    fn step_until<T, S>(runtime: &mut Runtime<T, S>, mut done: impl FnMut(&S) -> bool)
    where
        T: GameTransport + 'static,
        S: DisplaySurface,
    {
        for _ in 0..100 {
            runtime.step();
            if done(&runtime.surface) {
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("condition not reached within 100 steps");
    }

    #[test]
    fn parses_input_lines() {
        assert_eq!(parse_input_line(":quit"), Some(UiCommand::Exit));
        assert_eq!(parse_input_line(":resign"), Some(UiCommand::Resign));
        assert_eq!(parse_input_line(":flip"), Some(UiCommand::FlipBoard));
        assert_eq!(
            parse_input_line(":theme wood"),
            Some(UiCommand::ChangeTheme("wood".into()))
        );
        assert_eq!(parse_input_line("1"), Some(UiCommand::MenuSelect(1)));
        assert_eq!(
            parse_input_line("  Nf3 "),
            Some(UiCommand::MakeMove("Nf3".into()))
        );
        assert_eq!(parse_input_line(""), None);
        assert_eq!(parse_input_line(":bogus"), None);
    }

    #[test]
    fn lobby_event_flows_through_to_a_board_redraw() {
        let transport = ScriptedTransport::new()
            .with_lobby_events(vec![Ok(LobbyEvent::GameStart {
                game: LobbyGame {
                    game_id: "g1".into(),
                    color: Some("white".into()),
                    fen: None,
                    is_my_turn: true,
                },
            })])
            .with_game_events(
                "g1",
                vec![Ok(GameEvent::GameFull(GameFull {
                    id: "g1".into(),
                    variant: None,
                    initial_fen: None,
                    state: GameStateBody {
                        moves: String::new(),
                        wtime: 600_000,
                        btime: 600_000,
                        winc: 0,
                        binc: 0,
                        status: GameStatus::Started,
                        winner: None,
                    },
                }))],
            );
        let (config, path, _dir) = test_config();
        let mut runtime = Runtime::new(transport, config, path, RecordingSurface::default());
        runtime.start_lobby_reader().unwrap();

        step_until(&mut runtime, |surface| {
            surface
                .commands
                .iter()
                .any(|c| matches!(c, RenderCommand::RedrawFullBoard { .. }))
        });
        runtime.stop_readers();
    }

    #[test]
    fn exit_command_requests_shutdown() {
        let (config, path, _dir) = test_config();
        let mut runtime = Runtime::new(
            ScriptedTransport::new(),
            config,
            path,
            RecordingSurface::default(),
        );
        let publisher = runtime.ui_publisher();
        assert!(publisher.publish(UiCommand::Exit));
        runtime.step();
        assert!(runtime.dispatcher.shutdown_requested());
    }

    #[test]
    fn theme_change_is_persisted() {
        let (config, path, _dir) = test_config();
        let mut runtime = Runtime::new(
            ScriptedTransport::new(),
            config,
            path.clone(),
            RecordingSurface::default(),
        );
        let publisher = runtime.ui_publisher();
        publisher.publish(UiCommand::ChangeTheme("wood".into()));
        runtime.step();
        let saved = Config::load_from(&path).unwrap();
        assert_eq!(saved.theme, "wood");
    }
}
