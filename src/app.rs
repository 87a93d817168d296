use chrono::{DateTime, Local};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use crate::cards::{Card, CardDeck};
use crate::charge::SETTLE_DELAY;
use crate::config::Config;
use crate::countdown::{CountdownEffect, CountdownEngine, SAMPLE_PERIOD};
use crate::input::KeyHold;
use crate::intro::{IntroEffect, IntroError, IntroSequencer, IntroStep};
use crate::music::Music;
use crate::timers::{FrameLoop, Interval, Timeout};
use crate::ui::{self, Particle, Theme};

pub const FRAME_RATE: Duration = Duration::from_millis(16);
const PARTICLE_COUNT: usize = 100;

// ============================================================================
// Views
// ============================================================================

/// Intro sequencer plus the frame loop and settle timer that only exist
/// while it is mounted.
pub struct IntroView {
    pub sequencer: IntroSequencer,
    frames: FrameLoop,
    settle: Timeout,
}

impl IntroView {
    fn mount(deck: CardDeck) -> Self {
        Self {
            sequencer: IntroSequencer::new(deck),
            frames: FrameLoop::default(),
            settle: Timeout::default(),
        }
    }

    pub fn is_animating(&self) -> bool {
        self.frames.is_running()
    }

    /// Time since the heart exploded, while the settle delay runs.
    pub fn settle_elapsed(&self, now: Instant) -> Option<Duration> {
        self.settle.remaining(now).map(|left| SETTLE_DELAY.saturating_sub(left))
    }
}

/// Countdown engine plus its sampling interval.
pub struct CountdownView {
    pub engine: CountdownEngine,
    sampler: Interval,
}

impl CountdownView {
    fn mount(target: DateTime<Local>, wall: DateTime<Local>, now: Instant) -> Self {
        Self {
            engine: CountdownEngine::new(target, wall),
            sampler: Interval::start(SAMPLE_PERIOD, now),
        }
    }
}

pub enum Screen {
    Intro(IntroView),
    Countdown(CountdownView),
}

// ============================================================================
// Application State
// ============================================================================

pub struct App {
    pub config: Config,
    pub deck: CardDeck,
    pub target: DateTime<Local>,
    pub screen: Screen,
    pub music: Music,
    pub theme: Theme,
    pub particles: Vec<Particle>,
    pub key_hold: KeyHold,
    pub animation_frame: u8,
    last_wall: DateTime<Local>,
}

impl App {
    pub fn new(config: Config, deck: CardDeck, target: DateTime<Local>, music: Music, wall: DateTime<Local>) -> Self {
        let theme = ui::get_theme(&config.theme);
        Self {
            screen: Screen::Intro(IntroView::mount(deck.clone())),
            config,
            deck,
            target,
            music,
            theme,
            particles: Vec::new(),
            key_hold: KeyHold::default(),
            animation_frame: 0,
            last_wall: wall,
        }
    }

    /// Starts over from the loading heart, as a page reload would. The
    /// countdown view and its interval are dropped with the old screen.
    pub fn reload(&mut self) {
        info!("reloading");
        self.screen = Screen::Intro(IntroView::mount(self.deck.clone()));
        self.particles.clear();
        self.key_hold.release();
    }

    pub fn intro_step(&self) -> Option<IntroStep> {
        match &self.screen {
            Screen::Intro(view) => Some(view.sequencer.step()),
            Screen::Countdown(_) => None,
        }
    }

    pub fn current_card(&self) -> Option<&Card> {
        match &self.screen {
            Screen::Intro(view) => view.sequencer.current_card(),
            Screen::Countdown(_) => None,
        }
    }

    pub fn modal_open(&self) -> bool {
        matches!(&self.screen, Screen::Intro(view) if view.sequencer.modal().is_some())
    }

    pub fn is_finished(&self) -> bool {
        matches!(&self.screen, Screen::Countdown(view) if view.engine.is_finished())
    }

    fn intro_mut(&mut self) -> Option<&mut IntroSequencer> {
        match &mut self.screen {
            Screen::Intro(view) => Some(&mut view.sequencer),
            Screen::Countdown(_) => None,
        }
    }

    fn run_intro_effects(&mut self, effects: Vec<IntroEffect>, now: Instant) {
        let Screen::Intro(view) = &mut self.screen else {
            return;
        };

        let mut complete = false;
        for effect in effects {
            match effect {
                IntroEffect::RequestFrame => view.frames.request(),
                IntroEffect::CancelFrame => view.frames.cancel(),
                IntroEffect::ScheduleSettle(delay) => {
                    view.settle.schedule(now, delay);
                    self.particles = ui::burst(PARTICLE_COUNT);
                }
                IntroEffect::Complete => complete = true,
            }
        }

        if complete {
            info!("intro complete, mounting countdown");
            self.particles.clear();
            self.screen = Screen::Countdown(CountdownView::mount(self.target, self.last_wall, now));
        }
    }

    fn rejected(result: Result<Vec<IntroEffect>, IntroError>) -> Vec<IntroEffect> {
        result.unwrap_or_else(|e| {
            debug!(error = %e, "intro input rejected");
            Vec::new()
        })
    }

    // ------------------------------------------------------------------------
    // Input
    // ------------------------------------------------------------------------

    pub fn press(&mut self, now: Instant) {
        let effects = self.intro_mut().map(|i| i.press_charge(now)).unwrap_or_default();
        self.run_intro_effects(effects, now);
    }

    pub fn release(&mut self, now: Instant) {
        let effects = self.intro_mut().map(|i| i.release_charge()).unwrap_or_default();
        self.run_intro_effects(effects, now);
    }

    pub fn tap_card(&mut self) {
        let Some(intro) = self.intro_mut() else { return };
        let Some(card) = intro.step().card_number() else { return };
        if let Err(e) = intro.request_card_advance(card) {
            debug!(error = %e, "card tap rejected");
        }
    }

    pub fn modal_input(&mut self, c: char) {
        if let Some(modal) = self.intro_mut().and_then(|i| i.modal_mut()) {
            modal.push(c);
        }
    }

    pub fn modal_backspace(&mut self) {
        if let Some(modal) = self.intro_mut().and_then(|i| i.modal_mut()) {
            modal.backspace();
        }
    }

    pub fn modal_submit(&mut self, now: Instant) {
        let Some(intro) = self.intro_mut() else { return };
        let effects = Self::rejected(intro.submit_modal());
        self.run_intro_effects(effects, now);
    }

    pub fn modal_cancel(&mut self) {
        if let Some(Err(e)) = self.intro_mut().map(|i| i.cancel_modal()) {
            debug!(error = %e, "cancel rejected");
        }
    }

    // ------------------------------------------------------------------------
    // Tick
    // ------------------------------------------------------------------------

    /// Advances timers. Returns countdown effects for the caller to act on.
    pub fn tick(&mut self, now: Instant, wall: DateTime<Local>) -> Vec<CountdownEffect> {
        self.last_wall = wall;
        self.animation_frame = self.animation_frame.wrapping_add(1);

        if self.key_hold.expired(now) {
            self.release(now);
        }
        self.music.sync();

        match &mut self.screen {
            Screen::Intro(view) => {
                let mut effects = Vec::new();
                if view.frames.poll() {
                    effects.extend(view.sequencer.frame(now));
                }
                if view.settle.poll(now) {
                    effects.extend(Self::rejected(view.sequencer.advance_from_loading()));
                    self.particles.clear();
                }
                self.run_intro_effects(effects, now);
                Vec::new()
            }
            Screen::Countdown(view) => {
                if view.sampler.poll(now) {
                    view.engine.sample(wall)
                } else {
                    Vec::new()
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::music::tests::recording;
    use chrono::Duration as ChronoDuration;

    const MS: Duration = Duration::from_millis(1);

    fn app(target_in_ms: i64) -> (App, Instant, DateTime<Local>) {
        let wall = Local::now();
        let (music, _) = recording(false);
        let app = App::new(
            Config::default(),
            CardDeck::default(),
            wall + ChronoDuration::milliseconds(target_in_ms),
            music,
            wall,
        );
        (app, Instant::now(), wall)
    }

    /// Holds the heart for the full charge and waits out the settle delay.
    fn charge(app: &mut App, t0: Instant, wall: DateTime<Local>) -> Instant {
        app.press(t0);
        let mut t = t0;
        while t < t0 + 3000 * MS {
            t += FRAME_RATE;
            app.tick(t, wall);
        }
        let done = t + SETTLE_DELAY;
        app.tick(done, wall);
        done
    }

    fn answer(app: &mut App, now: Instant) {
        app.tap_card();
        for c in "yes".chars() {
            app.modal_input(c);
        }
        app.modal_submit(now);
    }

    #[test]
    fn hold_then_settle_reaches_first_card() {
        let (mut app, t0, wall) = app(60_000);
        app.press(t0);
        for i in 1..=190 {
            app.tick(t0 + i * FRAME_RATE, wall);
        }
        let Screen::Intro(view) = &app.screen else { panic!("intro expected") };
        assert_eq!(view.sequencer.charge().progress(), 100.0);
        assert!(!view.is_animating());
        assert!(view.settle_elapsed(t0 + 3100 * MS).is_some());
        assert_eq!(app.particles.len(), PARTICLE_COUNT);

        // Releasing during the settle window changes nothing.
        app.release(t0 + 3100 * MS);
        app.tick(t0 + 3500 * MS, wall);
        assert_eq!(app.intro_step(), Some(IntroStep::Loading));

        app.tick(t0 + 4600 * MS, wall);
        assert_eq!(app.intro_step(), Some(IntroStep::Card1));
        assert!(app.particles.is_empty());
    }

    #[test]
    fn early_release_stops_the_frame_loop() {
        let (mut app, t0, wall) = app(60_000);
        app.press(t0);
        app.tick(t0 + 1000 * MS, wall);
        app.release(t0 + 1000 * MS);

        let Screen::Intro(view) = &app.screen else { panic!("intro expected") };
        assert!(!view.is_animating());
        assert_eq!(view.sequencer.charge().progress(), 0.0);
        app.tick(t0 + 10_000 * MS, wall);
        assert_eq!(app.intro_step(), Some(IntroStep::Loading));
    }

    #[test]
    fn full_intro_mounts_countdown() {
        let (mut app, t0, wall) = app(60_000);
        let t = charge(&mut app, t0, wall);
        answer(&mut app, t);
        answer(&mut app, t);
        assert_eq!(app.intro_step(), Some(IntroStep::Card3));

        app.tap_card();
        assert!(app.modal_open());
        app.modal_submit(t);
        assert_eq!(app.intro_step(), Some(IntroStep::Card3));
        app.modal_cancel();
        assert!(!app.modal_open());

        answer(&mut app, t);
        assert!(app.intro_step().is_none());
        assert!(app.tick(t, wall).is_empty());
        let Screen::Countdown(view) = &app.screen else { panic!("countdown expected") };
        assert_eq!(view.engine.remaining().minutes, 1);
    }

    #[test]
    fn countdown_celebrates_once() {
        let (mut app, t0, wall) = app(500);
        let t = charge(&mut app, t0, wall);
        for card in 0..3 {
            answer(&mut app, t + card * MS);
        }

        assert!(app.tick(t, wall).is_empty());
        assert!(!app.is_finished());
        let later = wall + ChronoDuration::milliseconds(600);
        assert_eq!(app.tick(t + SAMPLE_PERIOD, later), vec![CountdownEffect::Celebrate]);
        assert!(app.is_finished());
        assert!(app.tick(t + 2 * SAMPLE_PERIOD, wall).is_empty());
        assert!(app.is_finished());
    }

    #[test]
    fn sampling_waits_for_the_period() {
        let (mut app, t0, wall) = app(500);
        let t = charge(&mut app, t0, wall);
        for _ in 0..3 {
            answer(&mut app, t);
        }
        app.tick(t, wall);
        let later = wall + ChronoDuration::milliseconds(600);
        assert!(app.tick(t + 100 * MS, later).is_empty());
        assert!(!app.is_finished());
    }

    #[test]
    fn reload_restarts_the_intro() {
        let (mut app, t0, wall) = app(0);
        let t = charge(&mut app, t0, wall);
        for _ in 0..3 {
            answer(&mut app, t);
        }
        app.tick(t, wall);
        assert!(app.is_finished());

        app.reload();
        assert_eq!(app.intro_step(), Some(IntroStep::Loading));
        assert!(!app.is_finished());
    }

    #[test]
    fn tick_notices_a_dead_player() {
        let (mut app, t0, wall) = app(60_000);
        let (music, log) = recording(false);
        app.music = music;
        app.music.autoplay();
        app.tick(t0, wall);
        assert!(app.music.is_playing());

        log.borrow_mut().exited = true;
        app.tick(t0 + FRAME_RATE, wall);
        assert!(!app.music.is_playing());
    }
}
