//! Decision resolution: applies a chosen option to the nation and the acting player.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::constants::{BOARD_LABEL, CAPITAL_LABEL, NO_EFFECT_SUMMARY};
use crate::data::{DecisionOption, Effect};
use crate::state::{GameState, Player};

/// Ordered, human-readable effect lines; most options carry four or fewer.
pub type EffectSummary = SmallVec<[String; 4]>;

/// Outcome of resolving one option. Board movement is accumulated, not applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub state: GameState,
    pub player: Player,
    pub board_delta: i32,
    pub effects: EffectSummary,
}

impl Resolution {
    /// Log line for the effects, `Nenhum efeito.` when nothing happened.
    #[must_use]
    pub fn summary(&self) -> String {
        summarize(&self.effects)
    }
}

#[must_use]
pub fn summarize(effects: &[String]) -> String {
    if effects.is_empty() {
        NO_EFFECT_SUMMARY.to_string()
    } else {
        effects.join(", ")
    }
}

fn signed(change: i32) -> String {
    if change > 0 {
        format!("+{change}")
    } else {
        change.to_string()
    }
}

/// Apply every effect of `option` in list order on behalf of `player`.
#[must_use]
pub fn resolve(state: &GameState, player: &Player, option: &DecisionOption) -> Resolution {
    let mut next_state = *state;
    let mut next_player = player.clone();
    let mut board_delta: i32 = 0;
    let mut effects = EffectSummary::new();

    for effect in &option.effects {
        match *effect {
            Effect::Indicator { indicator, change } => {
                let adjusted = player.role.adjust_indicator(indicator, change);
                next_state.indicators.apply(indicator, adjusted);
                effects.push(format!("{} {}", indicator.display_name(), signed(adjusted)));
            }
            Effect::Capital { change, .. } => {
                let adjusted = player.role.adjust_capital(change);
                next_player.capital = next_player.capital.saturating_add(adjusted);
                effects.push(format!("{CAPITAL_LABEL} {}", signed(adjusted)));
            }
            Effect::Board { change, .. } => {
                board_delta = board_delta.saturating_add(change);
                effects.push(format!("{BOARD_LABEL} {}", signed(change)));
            }
        }
    }

    Resolution {
        state: next_state,
        player: next_player,
        board_delta,
        effects,
    }
}
