use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

use crate::app::App;
use crate::intro::IntroStep;
use crate::ui;

/// How long a held key may go without a repeat before it counts as
/// released, on terminals that never report key releases.
pub const KEY_HOLD_GRACE: Duration = Duration::from_millis(600);

/// Turns Space key events into press/release edges.
#[derive(Debug, Default)]
pub struct KeyHold {
    last_seen: Option<Instant>,
    reports_release: bool,
}

impl KeyHold {
    pub fn new(reports_release: bool) -> Self {
        Self { last_seen: None, reports_release }
    }

    /// Returns true on the first press of a hold.
    pub fn press(&mut self, now: Instant) -> bool {
        self.last_seen.replace(now).is_none()
    }

    /// Returns true if a hold was in progress.
    pub fn release(&mut self) -> bool {
        self.last_seen.take().is_some()
    }

    pub fn is_held(&self) -> bool {
        self.last_seen.is_some()
    }

    pub fn expired(&mut self, now: Instant) -> bool {
        if self.reports_release {
            return false;
        }
        match self.last_seen {
            Some(seen) if now.saturating_duration_since(seen) > KEY_HOLD_GRACE => {
                self.last_seen = None;
                true
            }
            _ => false,
        }
    }
}

fn contains(r: Rect, col: u16, row: u16) -> bool {
    col >= r.x && col < r.right() && row >= r.y && row < r.bottom()
}

// ============================================================================
// Keyboard
// ============================================================================

/// Returns true when the app should quit.
pub fn handle_key(key: KeyEvent, app: &mut App, now: Instant) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    // Space drives the charge, so its repeats and releases matter.
    if key.code == KeyCode::Char(' ') && app.intro_step() == Some(IntroStep::Loading) {
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => {
                if app.key_hold.press(now) {
                    app.press(now);
                }
            }
            KeyEventKind::Release => {
                if app.key_hold.release() {
                    app.release(now);
                }
            }
        }
        return false;
    }

    // A hold that began on the heart is not a tap. Only a fresh press
    // after it ends reaches the card.
    if key.code == KeyCode::Char(' ') {
        match key.kind {
            KeyEventKind::Release => {
                app.key_hold.release();
                return false;
            }
            KeyEventKind::Repeat => return false,
            KeyEventKind::Press if app.key_hold.is_held() => {
                app.key_hold.press(now);
                return false;
            }
            KeyEventKind::Press => {}
        }
    }

    if key.kind == KeyEventKind::Release {
        return false;
    }

    if app.modal_open() {
        match key.code {
            KeyCode::Char(c) => app.modal_input(c),
            KeyCode::Backspace => app.modal_backspace(),
            KeyCode::Enter => app.modal_submit(now),
            KeyCode::Esc => app.modal_cancel(),
            _ => {}
        }
        return false;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return true,
        KeyCode::Char('m') | KeyCode::Char('M') => app.music.toggle(),
        KeyCode::Enter | KeyCode::Char(' ') if app.current_card().is_some() => app.tap_card(),
        KeyCode::Char('r') | KeyCode::Char('R') if app.is_finished() => app.reload(),
        _ => {}
    }
    false
}

// ============================================================================
// Mouse
// ============================================================================

pub fn handle_mouse(ev: MouseEvent, app: &mut App, now: Instant, area: Rect) {
    let regions = ui::regions(area, app.current_card().map_or(0, |c| c.tilt_degrees));
    let (col, row) = (ev.column, ev.row);

    match ev.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if contains(regions.music, col, row) && !app.modal_open() {
                app.music.toggle();
                return;
            }
            app.music.first_interaction();

            if app.modal_open() {
                if contains(regions.modal_cancel, col, row) {
                    app.modal_cancel();
                } else if contains(regions.modal_next, col, row) {
                    app.modal_submit(now);
                }
                return;
            }

            match app.intro_step() {
                Some(IntroStep::Loading) if contains(regions.heart, col, row) => app.press(now),
                Some(_) if app.current_card().is_some() && contains(regions.card, col, row) => app.tap_card(),
                None if app.is_finished() && contains(regions.restart, col, row) => app.reload(),
                _ => {}
            }
        }
        MouseEventKind::Up(MouseButton::Left) => app.release(now),
        // Dragging off the heart counts as letting go.
        MouseEventKind::Drag(MouseButton::Left) if !contains(regions.heart, col, row) => app.release(now),
        _ => {}
    }
}
