use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{BOARD_FINAL_TILE, BOARD_START, STARTING_CAPITAL};
use crate::indicators::{Indicator, Indicators};
use crate::roles::Role;

/// Shared nation state every player acts upon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub indicators: Indicators,
    pub board_position: i32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::initial()
    }
}

impl GameState {
    /// Fixed configuration every game starts from.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            indicators: Indicators::initial(),
            board_position: BOARD_START,
        }
    }

    #[must_use]
    pub const fn indicator(&self, indicator: Indicator) -> i32 {
        self.indicators.get(indicator)
    }

    /// Builder-style override used by setups and tests.
    #[must_use]
    pub fn with_indicator(mut self, indicator: Indicator, value: i32) -> Self {
        self.indicators.set(indicator, value);
        self
    }

    #[must_use]
    pub const fn with_board_position(mut self, position: i32) -> Self {
        self.board_position = clamp_position(position);
        self
    }

    /// True when indicators and board position honour their bounds.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.indicators.within_bounds()
            && (BOARD_START..=BOARD_FINAL_TILE).contains(&self.board_position)
    }
}

pub(crate) const fn clamp_position(position: i32) -> i32 {
    if position < BOARD_START {
        BOARD_START
    } else if position > BOARD_FINAL_TILE {
        BOARD_FINAL_TILE
    } else {
        position
    }
}

/// A seated government member.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    pub role: Role,
    pub capital: i32,
    /// Hidden secondary win condition; never changes after seating.
    pub is_opportunist: bool,
    pub avatar: String,
    /// Optional free-text label shown instead of the role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Player {
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        is_opportunist: bool,
    ) -> Self {
        let id = id.into();
        let avatar = id.trim_start_matches('p').to_string();
        Self {
            id,
            name: name.into(),
            role,
            capital: STARTING_CAPITAL,
            is_opportunist,
            avatar,
            title: None,
        }
    }

    /// Seat a player, rolling the hidden opportunist flag.
    #[must_use]
    pub fn seat<R: Rng>(
        id: impl Into<String>,
        name: impl Into<String>,
        role: Role,
        opportunist_chance: f64,
        rng: &mut R,
    ) -> Self {
        let chance = if opportunist_chance.is_finite() {
            opportunist_chance.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self::new(id, name, role, rng.gen_bool(chance))
    }

    /// Role label for logs, preferring a custom title when one is set.
    #[must_use]
    pub fn role_label(&self) -> &str {
        self.title
            .as_deref()
            .unwrap_or_else(|| self.role.display_name())
    }
}
