use std::time::{Duration, Instant};
use tracing::debug;

pub const CHARGE_DURATION: Duration = Duration::from_millis(3000);
pub const SETTLE_DELAY: Duration = Duration::from_millis(1500);
pub const FULL: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ChargeState {
    Idle,
    Pressed { started: Instant },
    Exploding,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChargeEffect {
    RequestFrame,
    CancelFrame,
    /// Charge is complete; the step may advance after the settle delay.
    Exploded,
}

/// Press-and-hold ramp. All or nothing: letting go early drops back to zero.
#[derive(Debug, Clone)]
pub struct ChargeGesture {
    state: ChargeState,
    progress: f64,
}

impl Default for ChargeGesture {
    fn default() -> Self {
        Self {
            state: ChargeState::Idle,
            progress: 0.0,
        }
    }
}

impl ChargeGesture {
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_exploding(&self) -> bool {
        self.state == ChargeState::Exploding
    }

    pub fn press(&mut self, now: Instant) -> Vec<ChargeEffect> {
        match self.state {
            ChargeState::Idle => {
                self.state = ChargeState::Pressed { started: now };
                self.progress = 0.0;
                debug!("charge pressed");
                vec![ChargeEffect::RequestFrame]
            }
            _ => Vec::new(),
        }
    }

    pub fn release(&mut self) -> Vec<ChargeEffect> {
        match self.state {
            ChargeState::Pressed { .. } => {
                debug!(progress = self.progress, "charge released early");
                self.state = ChargeState::Idle;
                self.progress = 0.0;
                vec![ChargeEffect::CancelFrame]
            }
            _ => Vec::new(),
        }
    }

    /// Resamples the ramp; called once per frame while pressed.
    pub fn frame(&mut self, now: Instant) -> Vec<ChargeEffect> {
        let ChargeState::Pressed { started } = self.state else {
            return Vec::new();
        };

        let elapsed = now.saturating_duration_since(started);
        self.progress = (elapsed.as_secs_f64() / CHARGE_DURATION.as_secs_f64() * FULL).min(FULL);

        if self.progress < FULL {
            return Vec::new();
        }

        debug!("charge full, exploding");
        self.state = ChargeState::Exploding;
        vec![ChargeEffect::CancelFrame, ChargeEffect::Exploded]
    }

    /// Caption that eggs the user on as the charge fills.
    pub fn stage_text(&self) -> &'static str {
        if self.progress < 30.0 {
            "Go on, give the heart a poke"
        } else if self.progress < 70.0 {
            "A little more..."
        } else {
            "Almost theeere..."
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn ramps_linearly() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        assert_eq!(charge.press(t0), vec![ChargeEffect::RequestFrame]);
        charge.frame(t0 + 1500 * MS);
        assert!((charge.progress() - 50.0).abs() < 1e-9);
        charge.frame(t0 + 750 * MS);
        assert!((charge.progress() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn full_hold_explodes_once() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        charge.press(t0);
        assert!(charge.frame(t0 + 2999 * MS).is_empty());
        assert_eq!(
            charge.frame(t0 + 3000 * MS),
            vec![ChargeEffect::CancelFrame, ChargeEffect::Exploded]
        );
        assert_eq!(charge.progress(), FULL);
        assert!(charge.is_exploding());
        assert!(charge.frame(t0 + 4000 * MS).is_empty());
    }

    #[test]
    fn early_release_resets_without_carry_over() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        charge.press(t0);
        charge.frame(t0 + 1260 * MS);
        assert!((charge.progress() - 42.0).abs() < 1e-9);

        assert_eq!(charge.release(), vec![ChargeEffect::CancelFrame]);
        assert_eq!(charge.progress(), 0.0);

        let t1 = t0 + 5000 * MS;
        charge.press(t1);
        assert_eq!(charge.progress(), 0.0);
        charge.frame(t1 + 300 * MS);
        assert!((charge.progress() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn duplicate_press_and_stray_release_are_ignored() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        assert!(charge.release().is_empty());
        charge.press(t0);
        // A second press (touch plus mouse) must not restart the ramp.
        assert!(charge.press(t0 + 1000 * MS).is_empty());
        charge.frame(t0 + 1500 * MS);
        assert!((charge.progress() - 50.0).abs() < 1e-9);
    }

    #[test]
    fn input_is_ignored_while_exploding() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        charge.press(t0);
        charge.frame(t0 + 3000 * MS);
        assert!(charge.release().is_empty());
        assert!(charge.press(t0 + 3100 * MS).is_empty());
        assert!(charge.is_exploding());
        assert_eq!(charge.progress(), FULL);
    }

    #[test]
    fn stage_text_follows_progress() {
        let t0 = Instant::now();
        let mut charge = ChargeGesture::default();
        assert_eq!(charge.stage_text(), "Go on, give the heart a poke");
        charge.press(t0);
        charge.frame(t0 + 1500 * MS);
        assert_eq!(charge.stage_text(), "A little more...");
        charge.frame(t0 + 2400 * MS);
        assert_eq!(charge.stage_text(), "Almost theeere...");
    }
}
