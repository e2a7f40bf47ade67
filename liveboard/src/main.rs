use anyhow::Context;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use lichess_client::LichessClient;
use liveboard::config::{config_path, Config};
use liveboard::display::TerminalSurface;
use liveboard::runtime::{spawn_input_thread, Runtime};

fn main() -> anyhow::Result<()> {
    // Logs go to a file; stdout belongs to the board.
    let log_dir = "logs";
    std::fs::create_dir_all(log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(log_dir, "liveboard");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let path = config_path();
    let config = Config::load_from(&path)
        .with_context(|| format!("loading configuration from {}", path.display()))?;
    tracing::info!("liveboard starting");

    let client = LichessClient::new(&config.api_token);
    let surface = TerminalSurface::stdout(&config.theme);
    let mut runtime = Runtime::new(client, config, path, surface);

    let input = spawn_input_thread(runtime.ui_publisher()).context("starting input thread")?;
    let result = runtime.run();
    drop(input);

    tracing::info!("liveboard exiting");
    result.context("running the session loop")
}
