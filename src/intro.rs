//! Linear intro: charge the heart, then answer one question per card.
//!
//! Every operation either returns the effects the host has to run or an
//! `IntroError` that leaves the sequencer exactly as it was.

use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info};

use crate::cards::{Card, CardDeck};
use crate::charge::{ChargeEffect, ChargeGesture, SETTLE_DELAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IntroStep {
    Loading,
    Card1,
    Card2,
    Card3,
    Done,
}

impl IntroStep {
    /// 1-based card number for card steps.
    pub fn card_number(self) -> Option<usize> {
        match self {
            Self::Card1 => Some(1),
            Self::Card2 => Some(2),
            Self::Card3 => Some(3),
            Self::Loading | Self::Done => None,
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Loading => Self::Card1,
            Self::Card1 => Self::Card2,
            Self::Card2 => Self::Card3,
            Self::Card3 | Self::Done => Self::Done,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IntroEffect {
    RequestFrame,
    CancelFrame,
    ScheduleSettle(Duration),
    /// The intro reached Done. Emitted exactly once.
    Complete,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntroError {
    #[error("not allowed in step {0:?}")]
    WrongStep(IntroStep),
    #[error("charge has not reached full")]
    ChargeIncomplete,
    #[error("card {card} is not on screen (step {step:?})")]
    NotOnCard { card: usize, step: IntroStep },
    #[error("a question is already open")]
    ModalOpen,
    #[error("no question is open")]
    NoModal,
    #[error("answer is empty")]
    EmptyAnswer,
}

/// Question popup opened by tapping a card.
#[derive(Debug, Clone, PartialEq)]
pub struct Modal {
    card: usize,
    prompt: String,
    answer: String,
}

impl Modal {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }

    pub fn push(&mut self, c: char) {
        self.answer.push(c);
    }

    pub fn backspace(&mut self) {
        self.answer.pop();
    }

    pub fn can_submit(&self) -> bool {
        !self.answer.trim().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntroSequencer {
    step: IntroStep,
    deck: CardDeck,
    charge: ChargeGesture,
    modal: Option<Modal>,
}

impl IntroSequencer {
    pub fn new(deck: CardDeck) -> Self {
        Self {
            step: IntroStep::Loading,
            deck,
            charge: ChargeGesture::default(),
            modal: None,
        }
    }

    pub fn step(&self) -> IntroStep {
        self.step
    }

    pub fn charge(&self) -> &ChargeGesture {
        &self.charge
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    pub fn modal_mut(&mut self) -> Option<&mut Modal> {
        self.modal.as_mut()
    }

    pub fn current_card(&self) -> Option<&Card> {
        self.step.card_number().and_then(|n| self.deck.card(n))
    }

    pub fn press_charge(&mut self, now: Instant) -> Vec<IntroEffect> {
        if self.step != IntroStep::Loading {
            return Vec::new();
        }
        Self::lift(self.charge.press(now))
    }

    pub fn release_charge(&mut self) -> Vec<IntroEffect> {
        if self.step != IntroStep::Loading {
            return Vec::new();
        }
        Self::lift(self.charge.release())
    }

    pub fn frame(&mut self, now: Instant) -> Vec<IntroEffect> {
        if self.step != IntroStep::Loading {
            return Vec::new();
        }
        Self::lift(self.charge.frame(now))
    }

    fn lift(effects: Vec<ChargeEffect>) -> Vec<IntroEffect> {
        effects
            .into_iter()
            .map(|e| match e {
                ChargeEffect::RequestFrame => IntroEffect::RequestFrame,
                ChargeEffect::CancelFrame => IntroEffect::CancelFrame,
                ChargeEffect::Exploded => IntroEffect::ScheduleSettle(SETTLE_DELAY),
            })
            .collect()
    }

    /// Leaves the loading step once the charge has exploded. The host calls
    /// this when the settle delay runs out.
    pub fn advance_from_loading(&mut self) -> Result<Vec<IntroEffect>, IntroError> {
        if self.step != IntroStep::Loading {
            return Err(IntroError::WrongStep(self.step));
        }
        if !self.charge.is_exploding() {
            return Err(IntroError::ChargeIncomplete);
        }

        self.step = IntroStep::Card1;
        info!(step = ?self.step, "intro advanced");
        Ok(Vec::new())
    }

    pub fn request_card_advance(&mut self, card: usize) -> Result<(), IntroError> {
        if self.modal.is_some() {
            return Err(IntroError::ModalOpen);
        }
        if self.step.card_number() != Some(card) {
            return Err(IntroError::NotOnCard { card, step: self.step });
        }

        let prompt = self
            .deck
            .card(card)
            .map(|c| c.prompt.clone())
            .ok_or(IntroError::NotOnCard { card, step: self.step })?;
        debug!(card, "question opened");
        self.modal = Some(Modal { card, prompt, answer: String::new() });
        Ok(())
    }

    pub fn confirm_modal(&mut self, answer: &str) -> Result<Vec<IntroEffect>, IntroError> {
        if self.modal.is_none() {
            return Err(IntroError::NoModal);
        }
        if answer.trim().is_empty() {
            return Err(IntroError::EmptyAnswer);
        }

        self.modal = None;
        self.step = self.step.next();
        info!(step = ?self.step, "intro advanced");

        if self.step == IntroStep::Done {
            Ok(vec![IntroEffect::Complete])
        } else {
            Ok(Vec::new())
        }
    }

    /// Confirms with whatever has been typed into the open modal.
    pub fn submit_modal(&mut self) -> Result<Vec<IntroEffect>, IntroError> {
        let answer = self.modal.as_ref().ok_or(IntroError::NoModal)?.answer.clone();
        self.confirm_modal(&answer)
    }

    pub fn cancel_modal(&mut self) -> Result<(), IntroError> {
        match self.modal.take() {
            Some(modal) => {
                debug!(card = modal.card, "question dismissed");
                Ok(())
            }
            None => Err(IntroError::NoModal),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    fn charged(t0: Instant) -> IntroSequencer {
        let mut intro = IntroSequencer::new(CardDeck::default());
        intro.press_charge(t0);
        intro.frame(t0 + 3000 * MS);
        intro
    }

    fn answer_card(intro: &mut IntroSequencer, card: usize) -> Vec<IntroEffect> {
        intro.request_card_advance(card).unwrap();
        intro.confirm_modal("yes").unwrap()
    }

    #[test]
    fn holding_for_full_charge_reaches_first_card() {
        let t0 = Instant::now();
        let mut intro = IntroSequencer::new(CardDeck::default());

        assert_eq!(intro.press_charge(t0), vec![IntroEffect::RequestFrame]);
        assert!(intro.frame(t0 + 1000 * MS).is_empty());
        assert_eq!(
            intro.frame(t0 + 3000 * MS),
            vec![IntroEffect::CancelFrame, IntroEffect::ScheduleSettle(1500 * MS)]
        );
        assert_eq!(intro.charge().progress(), 100.0);
        assert_eq!(intro.step(), IntroStep::Loading);

        intro.advance_from_loading().unwrap();
        assert_eq!(intro.step(), IntroStep::Card1);
    }

    #[test]
    fn cannot_leave_loading_without_full_charge() {
        let t0 = Instant::now();
        let mut intro = IntroSequencer::new(CardDeck::default());
        assert_eq!(intro.advance_from_loading(), Err(IntroError::ChargeIncomplete));

        intro.press_charge(t0);
        intro.frame(t0 + 2000 * MS);
        assert_eq!(intro.advance_from_loading(), Err(IntroError::ChargeIncomplete));
        assert_eq!(intro.step(), IntroStep::Loading);
    }

    #[test]
    fn tapping_card_opens_its_prompt() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();

        intro.request_card_advance(1).unwrap();
        let deck = CardDeck::default();
        assert_eq!(intro.modal().map(|m| m.prompt()), deck.card(1).map(|c| c.prompt.as_str()));
        assert_eq!(intro.step(), IntroStep::Card1);
    }

    #[test]
    fn wrong_card_is_rejected() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();

        assert_eq!(
            intro.request_card_advance(2),
            Err(IntroError::NotOnCard { card: 2, step: IntroStep::Card1 })
        );
        assert!(intro.modal().is_none());
    }

    #[test]
    fn blank_answers_are_no_ops() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();
        intro.request_card_advance(1).unwrap();

        assert_eq!(intro.confirm_modal(""), Err(IntroError::EmptyAnswer));
        assert_eq!(intro.confirm_modal("   "), Err(IntroError::EmptyAnswer));
        assert_eq!(intro.step(), IntroStep::Card1);
        assert!(intro.modal().is_some());
    }

    #[test]
    fn cancel_keeps_current_card() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();
        intro.request_card_advance(1).unwrap();

        intro.cancel_modal().unwrap();
        assert!(intro.modal().is_none());
        assert_eq!(intro.step(), IntroStep::Card1);
        assert_eq!(intro.cancel_modal(), Err(IntroError::NoModal));
        assert_eq!(intro.confirm_modal("yes"), Err(IntroError::NoModal));
    }

    #[test]
    fn last_card_completes_exactly_once() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();
        assert!(answer_card(&mut intro, 1).is_empty());
        assert!(answer_card(&mut intro, 2).is_empty());

        intro.request_card_advance(3).unwrap();
        assert_eq!(intro.modal().map(|m| m.prompt()), Some("Did you miss me hehe..."));
        assert_eq!(intro.confirm_modal("yes"), Ok(vec![IntroEffect::Complete]));
        assert_eq!(intro.step(), IntroStep::Done);

        assert_eq!(intro.request_card_advance(3), Err(IntroError::NotOnCard { card: 3, step: IntroStep::Done }));
        assert_eq!(intro.confirm_modal("yes"), Err(IntroError::NoModal));
    }

    #[test]
    fn submit_uses_typed_answer() {
        let mut intro = charged(Instant::now());
        intro.advance_from_loading().unwrap();
        intro.request_card_advance(1).unwrap();

        let modal = intro.modal_mut().unwrap();
        modal.push(' ');
        assert!(!modal.can_submit());
        assert_eq!(intro.submit_modal(), Err(IntroError::EmptyAnswer));

        let modal = intro.modal_mut().unwrap();
        modal.push('o');
        modal.push('k');
        modal.backspace();
        assert_eq!(modal.answer(), " o");
        assert!(intro.submit_modal().unwrap().is_empty());
        assert_eq!(intro.step(), IntroStep::Card2);
    }

    #[test]
    fn charge_input_outside_loading_is_ignored() {
        let t0 = Instant::now();
        let mut intro = charged(t0);
        intro.advance_from_loading().unwrap();
        assert!(intro.press_charge(t0).is_empty());
        assert!(intro.frame(t0).is_empty());
        assert!(intro.release_charge().is_empty());
        assert_eq!(intro.advance_from_loading(), Err(IntroError::WrongStep(IntroStep::Card1)));
    }

    #[test]
    fn observed_steps_are_a_strict_prefix() {
        let t0 = Instant::now();
        let mut intro = IntroSequencer::new(CardDeck::default());
        let mut seen = vec![intro.step()];
        let mut record = |intro: &IntroSequencer| {
            if seen.last() != Some(&intro.step()) {
                seen.push(intro.step());
            }
        };

        // Noise that must not move the sequence.
        let _ = intro.request_card_advance(1);
        let _ = intro.confirm_modal("yes");
        intro.press_charge(t0);
        intro.release_charge();
        record(&intro);

        intro.press_charge(t0);
        intro.frame(t0 + 3000 * MS);
        intro.advance_from_loading().unwrap();
        record(&intro);
        for card in 1..=3 {
            let _ = intro.request_card_advance(card + 1);
            let _ = intro.confirm_modal(" ");
            answer_card(&mut intro, card);
            record(&intro);
        }

        assert_eq!(
            seen,
            vec![IntroStep::Loading, IntroStep::Card1, IntroStep::Card2, IntroStep::Card3, IntroStep::Done]
        );
    }
}
