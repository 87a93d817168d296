use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{Error, Result};

pub const CARD_COUNT: usize = 3;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Card {
    pub id: u8,
    pub image_path: String,
    pub title: String,
    pub body: String,
    /// Question shown in the modal when the card is tapped.
    pub prompt: String,
    pub tilt_degrees: i16,
}

/// The three intro cards, in display order. Card `n` sits at index `n - 1`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(transparent)]
pub struct CardDeck([Card; CARD_COUNT]);

impl Default for CardDeck {
    fn default() -> Self {
        Self([
            Card {
                id: 1,
                image_path: "assets/card-1.jpg".into(),
                title: "Hiii you 💕".into(),
                body: "You made it in...".into(),
                prompt: "You made it in...".into(),
                tilt_degrees: -5,
            },
            Card {
                id: 2,
                image_path: "assets/card-2.jpg".into(),
                title: "Ready yet? ✨".into(),
                body: "I have something to tell you...".into(),
                prompt: "I have something to tell you...".into(),
                tilt_degrees: 5,
            },
            Card {
                id: 3,
                image_path: "assets/card-3.jpg".into(),
                title: "Love you 💖".into(),
                body: "Did you miss me hehe...".into(),
                prompt: "Did you miss me hehe...".into(),
                tilt_degrees: -3,
            },
        ])
    }
}

impl CardDeck {
    /// Card for a 1-based card number.
    pub fn card(&self, number: usize) -> Option<&Card> {
        number.checked_sub(1).and_then(|i| self.0.get(i))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.0.iter()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let deck: Self = serde_json::from_str(&raw).map_err(|e| Error::Deck {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        if let Some(card) = deck.iter().find(|c| c.prompt.trim().is_empty()) {
            return Err(Error::Deck {
                path: path.to_path_buf(),
                reason: format!("card {} has an empty prompt", card.id),
            });
        }
        Ok(deck)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn cards_are_one_indexed() {
        let deck = CardDeck::default();
        assert!(deck.card(0).is_none());
        assert_eq!(deck.card(1).map(|c| c.id), Some(1));
        assert_eq!(deck.card(3).map(|c| c.tilt_degrees), Some(-3));
        assert!(deck.card(4).is_none());
    }

    #[test]
    fn loads_deck_from_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let json = serde_json::to_string(&CardDeck::default()).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let deck = CardDeck::load(file.path()).unwrap();
        assert_eq!(deck, CardDeck::default());
    }

    #[test]
    fn rejects_wrong_card_count() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let two: Vec<Card> = CardDeck::default().iter().take(2).cloned().collect();
        file.write_all(serde_json::to_string(&two).unwrap().as_bytes()).unwrap();

        assert!(matches!(CardDeck::load(file.path()), Err(Error::Deck { .. })));
    }

    #[test]
    fn rejects_blank_prompt() {
        let mut deck = CardDeck::default();
        deck.0[1].prompt = "  ".into();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&deck).unwrap().as_bytes()).unwrap();

        let err = CardDeck::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("card 2"));
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(CardDeck::load(&dir.path().join("nope.json")), Err(Error::Io(_))));
    }
}
