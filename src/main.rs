use chrono::Local;
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use notify_rust::{Notification, Urgency};
use ratatui::prelude::*;
use std::{io, time::Instant};
use tracing::{error, info, warn};

mod app;
mod cards;
mod charge;
mod config;
mod countdown;
mod error;
mod input;
mod intro;
mod logging;
mod music;
mod timers;
mod ui;

use app::{App, FRAME_RATE};
use cards::CardDeck;
use config::{Args, CONFIG_FILE, LOG_FILE};
use countdown::{CountdownEffect, TARGET_DATE_ISO};
use error::Result;
use input::KeyHold;
use music::{CommandPlayer, Music};

// ============================================================================
// Utilities
// ============================================================================

fn notify(title: &str, body: &str) {
    let shown = Notification::new()
        .summary(title)
        .body(body)
        .appname("sweetdown")
        .icon("emblem-favorite")
        .urgency(Urgency::Critical)
        .show();

    if let Err(e) = shown {
        warn!(error = %e, "desktop notification failed");
    }
}

// ============================================================================
// Main
// ============================================================================

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = logging::init(&config::app_dir(), LOG_FILE, &args.log_level);

    let mut config = config::load_or_init(&config::get_path(CONFIG_FILE))?;
    config.apply_args(&args);

    let target = countdown::parse_target(TARGET_DATE_ISO)?;
    let deck = match &config.cards_path {
        Some(path) => CardDeck::load(path)?,
        None => CardDeck::default(),
    };

    let mut music = Music::new(Box::new(CommandPlayer::default()), config.music_path.clone(), config.volume);
    if config.autoplay {
        music.autoplay();
    }

    info!(target_at = %target, theme = %config.theme, "starting");
    let mut app = App::new(config, deck, target, music, Local::now());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    // Key releases make Space a real hold; without them we fall back to
    // watching auto-repeat.
    let releases = terminal::supports_keyboard_enhancement().unwrap_or(false);
    if releases {
        execute!(stdout, PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES))?;
    }
    app.key_hold = KeyHold::new(releases);

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app);
    app.music.stop();

    if releases {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)?;
    }
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    if let Err(e) = &res {
        error!(error = %e, "exited with error");
    }
    info!("bye");
    res
}

fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui::render_ui(f, app, Instant::now()))?;

        let timeout = FRAME_RATE.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            let now = Instant::now();
            match event::read()? {
                Event::Key(key) => {
                    if input::handle_key(key, app, now) {
                        return Ok(());
                    }
                }
                Event::Mouse(mouse) => {
                    let area = terminal.size()?;
                    input::handle_mouse(mouse, app, now, area);
                }
                _ => {}
            }
        }

        if last_tick.elapsed() >= FRAME_RATE {
            for effect in app.tick(Instant::now(), Local::now()) {
                match effect {
                    CountdownEffect::Celebrate if app.config.notifications => {
                        notify("Time's up! 🎀", "Your event has started! ✨");
                    }
                    CountdownEffect::Celebrate => {}
                }
            }
            last_tick = Instant::now();
        }
    }
}
