//! MoneyMoni TUI - a terminal client for the MoneyMoni household budget API.
//!
//! Without a subcommand this launches the keyboard-driven interface.
//! Subcommands run one-shot tasks instead (health check, CSV import/export,
//! monthly report, receipt upload, config file).

mod app;
mod cli;
mod form;
mod ui;

use std::io;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use moneymoni_core::{ApiClient, Config, LocalStore, Navigator, SessionManager};

use app::{App, AppState};
use cli::Cli;
use ui::input::handle_input;
use ui::render::render;

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

/// Log file prefix inside the log directory
const LOG_FILE_PREFIX: &str = "moneymoni.log";

// ============================================================================
// Logging
// ============================================================================

fn env_filter() -> EnvFilter {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Log to stderr for the one-shot commands.
fn init_stderr_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter())
        .init();
}

/// Log to a daily-rolling file while the TUI owns the terminal. The returned
/// guard flushes pending lines on drop and must outlive the event loop.
fn init_file_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(env_filter())
        .init();
    Ok(guard)
}

// ============================================================================
// Entry point
// ============================================================================

fn build_session(config: &Config, navigator: Navigator) -> Result<SessionManager> {
    let api = ApiClient::with_timeout(&config.api_base_url, config.request_timeout())?
        .with_navigator(navigator);
    let store = LocalStore::open(&config.cache_dir()?)?;
    Ok(SessionManager::restore(api, store))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load()?;

    let start_route = cli.start_route();
    if let Some(command) = cli.command {
        init_stderr_tracing();
        return cli::run(command, &config).await;
    }

    let _log_guard = init_file_tracing(&config.log_dir()?)?;
    info!(api = %config.api_base_url, start = start_route.path(), "MoneyMoni TUI starting");

    let navigator = Navigator::new(start_route);
    let session = build_session(&config, navigator.clone())?;
    let mut app = App::new(config, session, navigator);
    app.sync_route();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("MoneyMoni TUI shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| render(f, app))?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Completed fetches, session confirmation, route changes
        app.tick().await;

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
