//! Board movement and boss gates
use serde::{Deserialize, Serialize};

use crate::constants::BOARD_START;
use crate::data::{Boss, BossRoster};
use crate::state::{GameState, clamp_position};

/// When a boss tile is checked on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum BossGateRule {
    /// Only forward movement is gated.
    #[default]
    Guarded,
    /// Legacy rule: any landing on a boss tile is checked, even without moving.
    Unconditional,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "boss", rename_all = "snake_case")]
pub enum BossOutcome {
    #[default]
    None,
    Cleared(Boss),
    Blocked(Boss),
}

impl BossOutcome {
    #[must_use]
    pub const fn boss(&self) -> Option<&Boss> {
        match self {
            Self::None => None,
            Self::Cleared(boss) | Self::Blocked(boss) => Some(boss),
        }
    }

    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Blocked(_))
    }
}

/// Move the nation by `board_delta` and settle any boss on the destination tile.
#[must_use]
pub fn apply_board_delta(
    state: &GameState,
    board_delta: i32,
    bosses: &BossRoster,
    rule: BossGateRule,
) -> (GameState, BossOutcome) {
    let mut next = *state;
    next.board_position = clamp_position(state.board_position.saturating_add(board_delta));

    let gated = match rule {
        BossGateRule::Guarded => board_delta > 0,
        BossGateRule::Unconditional => true,
    };
    if !gated {
        return (next, BossOutcome::None);
    }
    let Some(boss) = bosses.at(next.board_position) else {
        return (next, BossOutcome::None);
    };

    if next.indicator(boss.requirement.indicator) < boss.requirement.level {
        next.board_position = (next.board_position - 1).max(BOARD_START);
        (next, BossOutcome::Blocked(boss.clone()))
    } else {
        (next, BossOutcome::Cleared(boss.clone()))
    }
}
