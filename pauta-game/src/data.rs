//! Decision deck and boss roster loaded once per process.
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use crate::constants::{BOARD_FINAL_TILE, BOARD_START};
use crate::indicators::Indicator;

const DEFAULT_DECK_DATA: &str = include_str!("../assets/data/cards.json");
const DEFAULT_BOSS_DATA: &str = include_str!("../assets/data/bosses.json");

/// Problems found while loading or validating static game data.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to parse game data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("deck has no cards")]
    EmptyDeck,
    #[error("duplicate card id `{0}`")]
    DuplicateCard(String),
    #[error("card `{0}` has no options")]
    NoOptions(String),
    #[error("card `{card}` repeats option id `{option}`")]
    DuplicateOption { card: String, option: String },
    #[error("duplicate boss id `{0}`")]
    DuplicateBoss(String),
    #[error("boss `{id}` sits on tile {position}, outside the board")]
    BossOutOfBounds { id: String, position: i32 },
    #[error("more than one boss guards tile {0}")]
    BossTileConflict(i32),
    #[error("unknown configuration `{0}`")]
    UnknownConfig(String),
}

/// Who a non-indicator effect lands on. Only the acting player today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EffectTarget {
    #[default]
    Player,
}

/// A single consequence of picking a decision option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Effect {
    Indicator {
        indicator: Indicator,
        change: i32,
    },
    Capital {
        capital: EffectTarget,
        change: i32,
    },
    Board {
        board: EffectTarget,
        change: i32,
    },
}

impl Effect {
    #[must_use]
    pub const fn indicator(indicator: Indicator, change: i32) -> Self {
        Self::Indicator { indicator, change }
    }

    #[must_use]
    pub const fn capital(change: i32) -> Self {
        Self::Capital {
            capital: EffectTarget::Player,
            change,
        }
    }

    #[must_use]
    pub const fn board(change: i32) -> Self {
        Self::Board {
            board: EffectTarget::Player,
            change,
        }
    }

    /// Raw magnitude before any role modifier.
    #[must_use]
    pub const fn change(&self) -> i32 {
        match self {
            Self::Indicator { change, .. }
            | Self::Capital { change, .. }
            | Self::Board { change, .. } => *change,
        }
    }
}

/// Presentation hint carried through from the card data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OptionVariant {
    #[default]
    Default,
    Destructive,
    Outline,
    Secondary,
    Ghost,
}

/// A choice within a decision card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effects: Vec<Effect>,
    #[serde(default)]
    pub variant: OptionVariant,
}

/// A dilemma drawn by the active player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionCard {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub dilemma: String,
    pub options: Vec<DecisionOption>,
}

impl DecisionCard {
    #[must_use]
    pub fn option(&self, option_id: &str) -> Option<&DecisionOption> {
        self.options.iter().find(|option| option.id == option_id)
    }
}

/// Container for every decision card in play
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Deck {
    pub cards: Vec<DecisionCard>,
}

impl Deck {
    /// Load a deck from JSON and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or the deck is malformed.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let deck: Self = serde_json::from_str(json)?;
        deck.validate()?;
        Ok(deck)
    }

    /// Create a deck from pre-parsed cards
    #[must_use]
    pub const fn from_cards(cards: Vec<DecisionCard>) -> Self {
        Self { cards }
    }

    /// The deck shipped with the game.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded card data is malformed.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::from_json(DEFAULT_DECK_DATA)
    }

    /// Check card and option identifiers are present and unique.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<(), DataError> {
        if self.cards.is_empty() {
            return Err(DataError::EmptyDeck);
        }
        let mut card_ids = HashSet::new();
        for card in &self.cards {
            if !card_ids.insert(card.id.as_str()) {
                return Err(DataError::DuplicateCard(card.id.clone()));
            }
            if card.options.is_empty() {
                return Err(DataError::NoOptions(card.id.clone()));
            }
            let mut option_ids = HashSet::new();
            for option in &card.options {
                if !option_ids.insert(option.id.as_str()) {
                    return Err(DataError::DuplicateOption {
                        card: card.id.clone(),
                        option: option.id.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn card(&self, card_id: &str) -> Option<&DecisionCard> {
        self.cards.iter().find(|card| card.id == card_id)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

/// Minimum indicator level needed to pass a boss tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossRequirement {
    pub indicator: Indicator,
    pub level: i32,
}

/// A fixed gate on the board.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Boss {
    pub id: String,
    pub name: String,
    pub position: i32,
    pub requirement: BossRequirement,
}

/// Every boss on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BossRoster {
    pub bosses: Vec<Boss>,
}

impl BossRoster {
    /// Load bosses from JSON and validate them.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or two bosses collide.
    pub fn from_json(json: &str) -> Result<Self, DataError> {
        let roster: Self = serde_json::from_str(json)?;
        roster.validate()?;
        Ok(roster)
    }

    #[must_use]
    pub const fn from_bosses(bosses: Vec<Boss>) -> Self {
        Self { bosses }
    }

    /// The roster shipped with the game.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded boss data is malformed.
    pub fn load_from_static() -> Result<Self, DataError> {
        Self::from_json(DEFAULT_BOSS_DATA)
    }

    /// # Errors
    ///
    /// Returns the first boss that is off the board, duplicated, or shares a tile.
    pub fn validate(&self) -> Result<(), DataError> {
        let mut ids = HashSet::new();
        let mut tiles = HashSet::new();
        for boss in &self.bosses {
            if !(BOARD_START..=BOARD_FINAL_TILE).contains(&boss.position) {
                return Err(DataError::BossOutOfBounds {
                    id: boss.id.clone(),
                    position: boss.position,
                });
            }
            if !ids.insert(boss.id.as_str()) {
                return Err(DataError::DuplicateBoss(boss.id.clone()));
            }
            if !tiles.insert(boss.position) {
                return Err(DataError::BossTileConflict(boss.position));
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn at(&self, position: i32) -> Option<&Boss> {
        self.bosses.iter().find(|boss| boss.position == position)
    }

    /// Tile the nation must reach before a collective victory is possible.
    #[must_use]
    pub fn final_tile(&self) -> i32 {
        self.bosses
            .iter()
            .map(|boss| boss.position)
            .max()
            .unwrap_or(BOARD_FINAL_TILE)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Boss> {
        self.bosses.iter()
    }
}

impl<'a> IntoIterator for &'a BossRoster {
    type Item = &'a Boss;
    type IntoIter = std::slice::Iter<'a, Boss>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_json_keeps_the_shipped_shapes() {
        let json = r#"[
            { "indicator": "education", "change": 2 },
            { "capital": "player", "change": 15 },
            { "board": "player", "change": -1 }
        ]"#;
        let effects: Vec<Effect> = serde_json::from_str(json).unwrap();
        assert_eq!(
            effects,
            vec![
                Effect::indicator(Indicator::Education, 2),
                Effect::capital(15),
                Effect::board(-1),
            ]
        );
        let back = serde_json::to_value(Effect::capital(3)).unwrap();
        assert_eq!(back["capital"], "player");
    }

    #[test]
    fn static_deck_and_roster_load() {
        let deck = Deck::load_from_static().unwrap();
        assert_eq!(deck.len(), 2);
        let card = deck.card("card1").unwrap();
        assert_eq!(card.options.len(), 5);
        assert!(card.option("c1o3").unwrap().effects.is_empty());

        let roster = BossRoster::load_from_static().unwrap();
        assert_eq!(roster.bosses.len(), 4);
        assert_eq!(roster.at(5).unwrap().name, "Negacionismo");
        assert_eq!(roster.final_tile(), 20);
    }

    #[test]
    fn deck_validation_rejects_duplicates() {
        let json = r#"{ "cards": [
            { "id": "a", "title": "A", "options": [ { "id": "x", "name": "X" } ] },
            { "id": "a", "title": "B", "options": [ { "id": "y", "name": "Y" } ] }
        ] }"#;
        assert!(matches!(
            Deck::from_json(json),
            Err(DataError::DuplicateCard(id)) if id == "a"
        ));
        assert!(matches!(
            Deck::from_json(r#"{ "cards": [] }"#),
            Err(DataError::EmptyDeck)
        ));
    }

    #[test]
    fn roster_validation_rejects_shared_tiles_and_off_board_bosses() {
        let shared = r#"{ "bosses": [
            { "id": "a", "name": "A", "position": 5, "requirement": { "indicator": "education", "level": 5 } },
            { "id": "b", "name": "B", "position": 5, "requirement": { "indicator": "economy", "level": 2 } }
        ] }"#;
        assert!(matches!(
            BossRoster::from_json(shared),
            Err(DataError::BossTileConflict(5))
        ));
        let off_board = r#"{ "bosses": [
            { "id": "a", "name": "A", "position": 21, "requirement": { "indicator": "education", "level": 5 } }
        ] }"#;
        assert!(matches!(
            BossRoster::from_json(off_board),
            Err(DataError::BossOutOfBounds { position: 21, .. })
        ));
    }

    #[test]
    fn empty_roster_falls_back_to_board_end() {
        assert_eq!(BossRoster::default().final_tile(), BOARD_FINAL_TILE);
    }
}
