use rand::Rng;
use ratatui::{prelude::*, widgets::*};
use std::time::Instant;

use crate::app::{App, IntroView, Screen};
use crate::cards::{CARD_COUNT, Card};
use crate::charge::SETTLE_DELAY;
use crate::countdown::CountdownEngine;
use crate::intro::{IntroStep, Modal};

// ============================================================================
// Themes
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Theme {
    pub days_color: Color,
    pub hours_color: Color,
    pub minutes_color: Color,
    pub seconds_color: Color,
    pub heart_color: Color,
    pub border_color: Color,
    pub accent_color: Color,
}

pub fn get_theme(name: &str) -> Theme {
    match name {
        "nord" => Theme {
            days_color: Color::Rgb(136, 192, 208),
            hours_color: Color::Rgb(180, 142, 173),
            minutes_color: Color::Rgb(129, 161, 193),
            seconds_color: Color::Rgb(191, 97, 106),
            heart_color: Color::Rgb(191, 97, 106),
            border_color: Color::Rgb(94, 129, 172),
            accent_color: Color::Rgb(235, 203, 139),
        },
        "dracula" => Theme {
            days_color: Color::Rgb(255, 121, 198),
            hours_color: Color::Rgb(189, 147, 249),
            minutes_color: Color::Rgb(139, 233, 253),
            seconds_color: Color::Rgb(255, 85, 85),
            heart_color: Color::Rgb(255, 85, 85),
            border_color: Color::Rgb(98, 114, 164),
            accent_color: Color::Rgb(255, 121, 198),
        },
        "gruvbox" => Theme {
            days_color: Color::Rgb(211, 134, 155),
            hours_color: Color::Rgb(177, 98, 134),
            minutes_color: Color::Rgb(131, 165, 152),
            seconds_color: Color::Rgb(251, 73, 52),
            heart_color: Color::Rgb(251, 73, 52),
            border_color: Color::Rgb(250, 189, 47),
            accent_color: Color::Rgb(254, 128, 25),
        },
        _ => Theme {
            days_color: Color::Rgb(249, 168, 212),
            hours_color: Color::Rgb(196, 181, 253),
            minutes_color: Color::Rgb(125, 211, 252),
            seconds_color: Color::Rgb(253, 164, 175),
            heart_color: Color::Rgb(244, 63, 94),
            border_color: Color::Rgb(251, 207, 232),
            accent_color: Color::Rgb(225, 29, 72),
        },
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Clickable and drawable areas. Rendering and mouse hit-testing share
/// these so a click always lands where the thing was drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Regions {
    pub header: Rect,
    pub body: Rect,
    pub footer: Rect,
    pub music: Rect,
    pub heart: Rect,
    pub caption: Rect,
    pub gauge: Rect,
    pub card: Rect,
    pub modal: Rect,
    pub modal_cancel: Rect,
    pub modal_next: Rect,
    pub restart: Rect,
}

const HEART_W: u16 = 21;
const HEART_H: u16 = 8;
const CARD_W: u16 = 44;
const CARD_H: u16 = 14;
const MODAL_W: u16 = 52;
const MODAL_H: u16 = 11;

pub fn regions(area: Rect, tilt_degrees: i16) -> Regions {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1), Constraint::Length(2)])
        .split(area);
    let (header, body, footer) = (chunks[0], chunks[1], chunks[2]);

    let music = Rect {
        x: footer.right().saturating_sub(4),
        y: footer.y,
        width: 3.min(footer.width),
        height: 1.min(footer.height),
    };

    let loading = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(HEART_H),
            Constraint::Length(2),
            Constraint::Length(3),
        ])
        .split(body);

    let mut card = centered_fixed(CARD_W, CARD_H, body);
    let shift = tilt_degrees.unsigned_abs().min(card.x.saturating_sub(body.x));
    let room = body.right().saturating_sub(card.right());
    card.x = if tilt_degrees < 0 { card.x - shift } else { card.x + (tilt_degrees as u16).min(room) };

    let modal = centered_fixed(MODAL_W, MODAL_H, area);
    let modal_rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3)])
        .split(modal.inner(&Margin { horizontal: 1, vertical: 1 }));
    let buttons = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(modal_rows[1]);

    let celebrate = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(3), Constraint::Length(1)])
        .split(body);

    Regions {
        header,
        body,
        footer,
        music,
        heart: centered_fixed(HEART_W, HEART_H, loading[0]),
        caption: loading[1],
        gauge: centered_fixed(40, 3, loading[2]),
        card,
        modal,
        modal_cancel: buttons[0],
        modal_next: buttons[1],
        restart: centered_fixed(16, 3, celebrate[1]),
    }
}

fn centered_fixed(w: u16, h: u16, r: Rect) -> Rect {
    let w = w.min(r.width);
    let h = h.min(r.height);
    Rect {
        x: r.x + (r.width - w) / 2,
        y: r.y + (r.height - h) / 2,
        width: w,
        height: h,
    }
}

// ============================================================================
// Explosion
// ============================================================================

#[derive(Clone, Debug)]
pub struct Particle {
    /// Degrees.
    pub angle: f64,
    /// Fraction of half the screen.
    pub distance: f64,
    /// Seconds.
    pub delay: f64,
    pub size: u8,
}

pub fn burst(count: usize) -> Vec<Particle> {
    let mut rng = rand::rng();
    (0..count)
        .map(|_| Particle {
            angle: rng.random_range(0.0..360.0),
            distance: rng.random_range(0.1..1.0),
            delay: rng.random_range(0.0..0.5),
            size: rng.random_range(0..3),
        })
        .collect()
}

// ============================================================================
// UI Rendering
// ============================================================================

pub fn render_ui(f: &mut Frame, app: &App, now: Instant) {
    let area = f.size();
    let r = regions(area, app.current_card().map_or(0, |c| c.tilt_degrees));

    render_header(f, app, &r);

    match &app.screen {
        Screen::Intro(view) => {
            match view.sequencer.step() {
                IntroStep::Loading => render_loading(f, app, view, &r, now),
                step => {
                    if let (Some(card), Some(n)) = (view.sequencer.current_card(), step.card_number()) {
                        render_card(f, app, card, n, &r);
                    }
                }
            }
            if let Some(modal) = view.sequencer.modal() {
                render_modal(f, app, modal, &r);
            }
        }
        Screen::Countdown(view) if view.engine.is_finished() => render_celebrate(f, app, &r),
        Screen::Countdown(view) => render_countdown(f, app, &view.engine, &r),
    }

    render_footer(f, app, &r);
}

fn render_header(f: &mut Frame, app: &App, r: &Regions) {
    let header = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(app.theme.border_color))
        .title(Span::styled(" 💖 Cute Countdown Timer ", Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD)));
    f.render_widget(header, r.header);
}

const HEART_S: &[&str] = &[" ▄▄ ▄▄ ", "▀█████▀", "  ▀█▀  "];
const HEART_M: &[&str] = &[
    " ▄███▄ ▄███▄ ",
    "█████████████",
    " ▀█████████▀ ",
    "   ▀█████▀   ",
    "     ▀█▀     ",
];
const HEART_L: &[&str] = &[
    "  ▄█████▄   ▄█████▄  ",
    "▄███████████████████▄",
    "█████████████████████",
    " ▀█████████████████▀ ",
    "   ▀█████████████▀   ",
    "     ▀█████████▀     ",
    "       ▀█████▀       ",
    "         ▀█▀         ",
];

fn heart_art(progress: f64) -> &'static [&'static str] {
    if progress < 33.0 {
        HEART_S
    } else if progress < 66.0 {
        HEART_M
    } else {
        HEART_L
    }
}

fn render_loading(f: &mut Frame, app: &App, view: &IntroView, r: &Regions, now: Instant) {
    let charge = view.sequencer.charge();

    if let Some(elapsed) = view.settle_elapsed(now) {
        render_particles(f, app, r, elapsed.as_secs_f64());
        return;
    }

    let mut style = Style::default().fg(app.theme.heart_color);
    if charge.progress() >= 70.0 {
        style = style.add_modifier(Modifier::BOLD);
    }
    let art: Vec<Line> = heart_art(charge.progress()).iter().map(|l| Line::from(*l)).collect();
    let top = r.heart.y + (r.heart.height.saturating_sub(art.len() as u16)) / 2;
    f.render_widget(
        Paragraph::new(art).style(style).alignment(Alignment::Center),
        Rect { y: top, height: r.heart.bottom() - top, ..r.heart },
    );

    let caption = vec![
        Line::from(Span::styled(charge.stage_text(), Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(Span::styled("(hold the heart, or hold Space ❤️)", Style::default()
            .fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
    ];
    f.render_widget(Paragraph::new(caption).alignment(Alignment::Center), r.caption);

    f.render_widget(
        Gauge::default()
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded))
            .gauge_style(Style::default().fg(app.theme.heart_color).bg(Color::Black))
            .percent(charge.progress() as u16),
        r.gauge,
    );
}

fn render_particles(f: &mut Frame, app: &App, r: &Regions, elapsed: f64) {
    let total = SETTLE_DELAY.as_secs_f64();
    let cx = f64::from(r.heart.x) + f64::from(r.heart.width) / 2.0;
    let cy = f64::from(r.heart.y) + f64::from(r.heart.height) / 2.0;
    let half_w = f64::from(r.body.width) / 2.0;
    let half_h = f64::from(r.body.height) / 2.0;
    let body = r.body;

    for p in &app.particles {
        let t = ((elapsed - p.delay) / (total - p.delay)).clamp(0.0, 1.0);
        if t <= 0.0 || t >= 1.0 {
            continue;
        }
        // Ease out: fast start, slow finish.
        let travel = 1.0 - (1.0 - t).powi(2);
        let rad = p.angle.to_radians();
        let x = cx + rad.cos() * p.distance * travel * half_w;
        let y = cy + rad.sin() * p.distance * travel * half_h;
        if x < f64::from(body.x) || y < f64::from(body.y) {
            continue;
        }
        let (x, y) = (x as u16, y as u16);
        if x >= body.right() || y >= body.bottom() {
            continue;
        }

        let symbol = ["·", "♥", "❤"][usize::from(p.size.min(2))];
        let color = if t > 0.6 { Color::DarkGray } else { app.theme.heart_color };
        f.buffer_mut().get_mut(x, y).set_symbol(symbol).set_fg(color);
    }
}

fn render_card(f: &mut Frame, app: &App, card: &Card, number: usize, r: &Regions) {
    let hint = if number == CARD_COUNT { "(tap to begin)" } else { "(tap to continue)" };
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("🖼  {}", card.image_path), Style::default()
            .fg(Color::DarkGray).add_modifier(Modifier::ITALIC))),
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(card.title.as_str(), Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled(card.body.as_str(), Style::default().fg(Color::White))),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::Gray))),
    ];

    f.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::default()
                .title(format!(" {} / {} ", number, CARD_COUNT))
                .title_alignment(Alignment::Center)
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(app.theme.border_color))),
        r.card,
    );
}

fn render_modal(f: &mut Frame, app: &App, modal: &Modal, r: &Regions) {
    f.render_widget(Clear, r.modal);
    f.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(app.theme.accent_color)),
        r.modal,
    );

    let inner = r.modal.inner(&Margin { horizontal: 1, vertical: 1 });
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(2), Constraint::Length(3), Constraint::Min(0)])
        .split(inner);

    f.render_widget(
        Paragraph::new(modal.prompt())
            .style(Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true }),
        rows[0],
    );

    let (text, style) = if modal.answer().is_empty() {
        ("type your answer here...".to_string(), Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC))
    } else {
        (format!("{}▏", modal.answer()), Style::default().fg(Color::White))
    };
    f.render_widget(
        Paragraph::new(text).style(style).block(Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(app.theme.border_color))),
        rows[1],
    );

    let next_style = if modal.can_submit() {
        Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    f.render_widget(button("Cancel", Style::default().fg(Color::Gray)), r.modal_cancel);
    f.render_widget(button("Next 💖", next_style), r.modal_next);
}

fn button(label: &str, style: Style) -> Paragraph<'_> {
    Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).border_style(style))
}

fn render_countdown(f: &mut Frame, app: &App, engine: &CountdownEngine, r: &Regions) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(r.body);

    let target = engine.target().format("%A, %B %d, %Y %I:%M %p").to_string();
    f.render_widget(
        Paragraph::new(format!("Target: {}", target))
            .style(Style::default().fg(app.theme.accent_color))
            .alignment(Alignment::Center),
        sections[1],
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(sections[3]);

    let t = app.theme;
    let [days, hours, minutes, seconds] = engine.remaining().fields();
    let cards = [
        ("DAYS", days, t.days_color),
        ("HOURS", hours, t.hours_color),
        ("MINUTES", minutes, t.minutes_color),
        ("SECONDS", seconds, t.seconds_color),
    ];

    for ((label, value, color), area) in cards.into_iter().zip(columns.iter()) {
        let pad = area.height.saturating_sub(4) / 2;
        let mut lines: Vec<Line> = (0..pad).map(|_| Line::from("")).collect();
        lines.push(Line::from(Span::styled(value, Style::default().fg(color).add_modifier(Modifier::BOLD))));
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(label, Style::default().fg(Color::Gray))));

        f.render_widget(
            Paragraph::new(lines).alignment(Alignment::Center).block(Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(color))),
            *area,
        );
    }
}

const FIREWORK: &[&str] = &["·", "∘", "○", "◯", "✺", "✹", "⁘", " "];

fn render_celebrate(f: &mut Frame, app: &App, r: &Regions) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Length(4), Constraint::Min(1)])
        .split(r.body);

    let banner = vec![
        Line::from(Span::styled("Time's up! 🎀", Style::default()
            .fg(app.theme.accent_color).add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("Your event has started! ✨", Style::default().fg(Color::White))),
    ];
    f.render_widget(Paragraph::new(banner).alignment(Alignment::Center), sections[1]);

    let sky = sections[2];
    let bursts = [
        (0.25, 0.40, 4u8, app.theme.days_color),
        (0.50, 0.25, 5, app.theme.minutes_color),
        (0.75, 0.50, 6, app.theme.hours_color),
    ];
    for (fx, fy, period, color) in bursts {
        let x = sky.x + (f64::from(sky.width) * fx) as u16;
        let y = sky.y + (f64::from(sky.height.saturating_sub(4)) * fy) as u16;
        if x < sky.right() && y < sky.bottom() && y < r.restart.y {
            let symbol = FIREWORK[usize::from(app.animation_frame / period) % FIREWORK.len()];
            f.buffer_mut().get_mut(x, y).set_symbol(symbol).set_fg(color);
        }
    }

    f.render_widget(button("Restart", Style::default().fg(app.theme.accent_color)), r.restart);
}

fn render_footer(f: &mut Frame, app: &App, r: &Regions) {
    let keys: Vec<(&str, &str)> = match &app.screen {
        _ if app.modal_open() => vec![("Enter", "Next"), ("Esc", "Cancel")],
        Screen::Intro(view) if view.is_animating() => vec![("Hold", "Keep going...")],
        Screen::Intro(view) if view.sequencer.step() == IntroStep::Loading => {
            vec![("Hold", "Charge"), ("M", "Music"), ("Q", "Quit")]
        }
        Screen::Intro(_) => vec![("Enter", "Tap card"), ("M", "Music"), ("Q", "Quit")],
        Screen::Countdown(view) if view.engine.is_finished() => {
            vec![("R", "Restart"), ("M", "Music"), ("Q", "Quit")]
        }
        Screen::Countdown(_) => vec![("M", "Music"), ("Q", "Quit")],
    };

    let mut spans = Vec::new();
    for (i, (key, desc)) in keys.into_iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  •  "));
        }
        spans.push(span_key(key, app));
        spans.push(Span::raw(format!(" {}", desc)));
    }

    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center).style(Style::default().fg(Color::DarkGray)),
        Rect { width: r.footer.width.saturating_sub(r.music.width + 1), ..r.footer },
    );

    let (icon, color) = if app.music.is_playing() { ("♪", Color::Green) } else { ("🔇", Color::DarkGray) };
    f.render_widget(
        Paragraph::new(icon).style(Style::default().fg(color).add_modifier(Modifier::BOLD)),
        r.music,
    );
}

fn span_key<'a>(text: &'a str, app: &App) -> Span<'a> {
    Span::styled(text, Style::default().fg(app.theme.accent_color).add_modifier(Modifier::BOLD))
}
