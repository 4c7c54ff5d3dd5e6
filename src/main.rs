//! BLOCKFALL - terminal front-end
//!
//! Drives a [`Session`] from the keyboard and draws its snapshots.

mod audio;
mod input;
mod ui;

use audio::AudioQueue;
use blockfall::events::{EventBus, EventReceiver};
use blockfall::settings::Settings;
use blockfall::{EngineEvent, Map, Session};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use input::{Action, KeyBindings};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::{
    io::{self, stdout},
    time::Duration,
};
use tracing_subscriber::EnvFilter;

/// Target frame rate
const TARGET_FPS: u64 = 60;
const FRAME_DURATION: Duration = Duration::from_micros(1_000_000 / TARGET_FPS);

/// Get the blockfall temp directory, creating it if needed
fn blockfall_temp_dir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join("blockfall");
    let _ = std::fs::create_dir_all(&dir);
    dir
}

fn main() -> io::Result<()> {
    // Generate session ID for this instance
    let session_id: u32 = rand::random();

    let log_dir = blockfall_temp_dir();
    let log_file = format!("{:08x}.log", session_id);

    // Setup tracing to log file
    let file_appender = tracing_appender::rolling::never(&log_dir, &log_file);
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blockfall=debug")),
        )
        .with_ansi(false)
        .init();

    tracing::info!(
        "BLOCKFALL starting up, session={:08x}, log={}",
        session_id,
        log_dir.join(&log_file).display()
    );

    let settings = Settings::load();
    let config = settings.map_config().map_err(io::Error::other)?;
    let pieces = settings.piece_source().map_err(io::Error::other)?;
    let keys = KeyBindings::from_settings(&settings);
    let cell_size = config.cell_size;

    let (bus, events) = EventBus::bounded(config.event_capacity);
    let map = Map::new(config, Box::new(pieces), bus).map_err(io::Error::other)?;
    let audio = AudioQueue::new(settings.sfx_gain());

    // Setup terminal
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut session = Session::start(map);
    let result = run_app(&mut terminal, &session, &events, &keys, &audio, cell_size);
    session.stop();

    // Restore terminal
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;

    let score = session.score();
    println!("\nThanks for playing BLOCKFALL!");
    println!("Final Score: {}", score.points);
    println!("Level: {} | Lines: {}", score.level, score.lines);
    tracing::info!("session ended with {} points", score.points);

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &Session,
    events: &EventReceiver,
    keys: &KeyBindings,
    audio: &AudioQueue,
    cell_size: u16,
) -> io::Result<()> {
    loop {
        // Copy everything out under one lock so the frame is consistent
        let (snapshot, score, game_over) =
            session.with_map(|map| (map.snapshot(), map.score().clone(), map.is_game_over()));

        terminal.draw(|frame| {
            ui::render_game(
                frame,
                &ui::View {
                    snapshot: &snapshot,
                    score: &score,
                    cell_size,
                    game_over,
                },
            )
        })?;

        if event::poll(FRAME_DURATION)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match keys.action_for(key) {
                        Some(Action::Quit) => return Ok(()),
                        Some(Action::Input(input)) => {
                            session.dispatch(input);
                        }
                        None => {}
                    }
                }
            }
        }

        for event in events.try_iter() {
            match event {
                EngineEvent::Sound(cue) => audio.submit(cue),
                EngineEvent::RowsCleared { count } => {
                    tracing::debug!("cleared {} rows", count);
                }
                EngineEvent::GameOver => tracing::info!("game over"),
                EngineEvent::StateChanged => {}
            }
        }
    }
}
