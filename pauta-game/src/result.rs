//! End game result types
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{MSG_COLLECTIVE_VICTORY, MSG_HUNGER_COLLAPSE, MSG_INDICATOR_COLLAPSE};
use crate::indicators::Indicator;

/// Possible game ending types
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Ending {
    /// An essential indicator fell to zero
    IndicatorCollapse { indicator: Indicator },
    /// Hunger reached the collapse threshold
    HungerCollapse,
    /// The hidden opportunist alienated the people and got rich
    OpportunistVictory { player_id: String, player_name: String },
    /// The nation reached the final tile prospering
    CollectiveVictory,
}

impl Ending {
    #[must_use]
    pub const fn is_collapse(&self) -> bool {
        matches!(self, Self::IndicatorCollapse { .. } | Self::HungerCollapse)
    }

    /// Player-facing message announcing the ending.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::IndicatorCollapse { .. } => MSG_INDICATOR_COLLAPSE.to_string(),
            Self::HungerCollapse => MSG_HUNGER_COLLAPSE.to_string(),
            Self::OpportunistVictory { player_name, .. } => format!(
                "O Oportunista venceu! Com o povo alienado, {player_name} acumulou poder e riqueza."
            ),
            Self::CollectiveVictory => MSG_COLLECTIVE_VICTORY.to_string(),
        }
    }
}

impl fmt::Display for Ending {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IndicatorCollapse { indicator } => write!(f, "collapse:{indicator}"),
            Self::HungerCollapse => write!(f, "collapse:hunger"),
            Self::OpportunistVictory { player_id, .. } => write!(f, "opportunist:{player_id}"),
            Self::CollectiveVictory => write!(f, "collective"),
        }
    }
}

/// Verdict handed back to callers after every decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GameOverResult {
    pub is_game_over: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ending: Option<Ending>,
}

impl GameOverResult {
    #[must_use]
    pub fn ongoing() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn ended(ending: Ending) -> Self {
        Self {
            is_game_over: true,
            message: ending.message(),
            ending: Some(ending),
        }
    }
}

impl From<Option<Ending>> for GameOverResult {
    fn from(ending: Option<Ending>) -> Self {
        ending.map_or_else(Self::ongoing, Self::ended)
    }
}
