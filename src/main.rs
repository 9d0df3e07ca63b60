// src/main.rs

use color_eyre::eyre::Result;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers,
    },
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod app;
mod config;
mod core;
mod errors;
mod logging;
mod ui;

use crate::app::{App, AppState};
use crate::config::ScanConfig;
use crate::core::models::{ScanEvent, ScanReport};
use crate::core::scanner::ScanOrchestrator;
use crate::errors::ConfigError;

/// Channels the scan task reports back on.
struct ScanChannels {
    report_tx: mpsc::Sender<ScanReport>,
    events_tx: mpsc::UnboundedSender<ScanEvent>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    logging::initialize_logging()?;
    info!(version = env!("CARGO_PKG_VERSION"), "Starting subscan-rs.");

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let result = run_app(&mut terminal).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>) -> Result<()> {
    let mut app = App::new();
    let (report_tx, mut report_rx) = mpsc::channel(1);
    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let channels = ScanChannels { report_tx, events_tx };

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(&mut app, &channels)?;
        }

        // Drain progress before looking for the report: events of a run are
        // always sent before its report.
        while let Ok(event) = events_rx.try_recv() {
            app.apply_event(event);
        }
        if let Ok(report) = report_rx.try_recv() {
            app.finish_scan(report);
        }
        app.on_tick();
    }

    info!("Shutting down.");
    Ok(())
}

/// Single entry point for terminal events, dispatching on the current state.
fn handle_events(app: &mut App, channels: &ScanChannels) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                app.quit();
                return Ok(());
            }
            if app.show_disclaimer {
                handle_disclaimer_input(app, key.code);
                return Ok(());
            }
            match key.code {
                KeyCode::Tab => app.toggle_logs(),
                KeyCode::Left if app.show_logs => app.scroll_logs_left(),
                KeyCode::Right if app.show_logs => app.scroll_logs_right(),
                _ => match app.state {
                    AppState::Idle => handle_idle_input(app, key, channels),
                    AppState::Scanning => handle_scanning_input(app, key.code),
                    AppState::Finished => handle_finished_input(app, key.code),
                },
            }
        }
    }
    Ok(())
}

fn handle_disclaimer_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Enter => app.show_disclaimer = false,
        KeyCode::Esc | KeyCode::Char('q' | 'Q') => app.quit(),
        _ => {}
    }
}

/// Typing the target. Every printable key goes into the input box, so quitting
/// is on `Esc` here.
fn handle_idle_input(app: &mut App, key: KeyEvent, channels: &ScanChannels) {
    match key.code {
        KeyCode::Esc => app.quit(),
        KeyCode::Char(c) => {
            app.input.push(c);
            app.input_error = None;
        }
        KeyCode::Backspace => {
            app.input.pop();
            app.input_error = None;
        }
        KeyCode::Enter => {
            if app.input.trim().is_empty() {
                return;
            }
            match prepare_scan(&app.input) {
                Ok((config, candidates)) => start_scan(app, config, candidates, channels),
                Err(e) => {
                    warn!(error = %e, "Scan not started.");
                    app.input_error = Some(e.to_string());
                }
            }
        }
        _ => {}
    }
}

fn handle_scanning_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Esc => app.cancel_scan(),
        KeyCode::Char('q' | 'Q') => app.quit(),
        _ => {}
    }
}

fn handle_finished_input(app: &mut App, key_code: KeyCode) {
    match key_code {
        KeyCode::Char('q' | 'Q') => app.quit(),
        KeyCode::Char('n' | 'N') => app.reset(),
        KeyCode::Char('e' | 'E') => app.export(),
        KeyCode::Up => app.select_previous(),
        KeyCode::Down => app.select_next(),
        _ => {}
    }
}

/// Validates everything a run needs before any probing starts.
fn prepare_scan(input: &str) -> Result<(ScanConfig, Vec<String>), ConfigError> {
    let config = ScanConfig::from_env(input)?;
    let candidates = crate::core::wordlist::load_candidates(&config.wordlist)?;
    Ok((config, candidates))
}

fn start_scan(app: &mut App, config: ScanConfig, candidates: Vec<String>, channels: &ScanChannels) {
    let token = CancellationToken::new();
    app.begin_scan(config.target.to_string(), token.clone(), config.output_dir.clone());

    let report_tx = channels.report_tx.clone();
    let events_tx = channels.events_tx.clone();
    tokio::spawn(async move {
        let report = ScanOrchestrator::with_network(config)
            .with_cancellation(token)
            .with_events(events_tx)
            .run(candidates)
            .await;
        let _ = report_tx.send(report).await;
    });
}
