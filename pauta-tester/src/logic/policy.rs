use std::fmt;

use pauta_game::{DecisionCard, DecisionOption, Effect, GameState, Player, Polarity};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

/// Decision returned by a [`PlayerPolicy`]
#[derive(Debug, Clone)]
pub struct PolicyDecision {
    pub option_index: usize,
    pub rationale: Option<String>,
}

impl PolicyDecision {
    #[must_use]
    pub fn new(option_index: usize, rationale: Option<String>) -> Self {
        Self {
            option_index,
            rationale,
        }
    }
}

/// Policy interface for automated play strategies.
pub trait PlayerPolicy {
    /// Name used for logging/debug output.
    fn name(&self) -> &'static str;

    /// Select an option on the card the acting player drew.
    fn pick_option(
        &mut self,
        state: &GameState,
        player: &Player,
        card: &DecisionCard,
    ) -> PolicyDecision;
}

/// Built-in gameplay strategies for automated runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameplayStrategy {
    /// Push the nation forward, favouring board progress.
    Transformative,
    /// Pocket as much capital as the card allows.
    Opportunistic,
    /// Uniformly random option, seeded per run.
    Random,
}

impl GameplayStrategy {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            GameplayStrategy::Transformative => "Transformative",
            GameplayStrategy::Opportunistic => "Opportunistic",
            GameplayStrategy::Random => "Random",
        }
    }

    #[must_use]
    pub fn create_policy(self, seed: u64) -> Box<dyn PlayerPolicy + Send> {
        match self {
            GameplayStrategy::Transformative => Box::new(TransformativePolicy),
            GameplayStrategy::Opportunistic => Box::new(OpportunisticPolicy),
            GameplayStrategy::Random => Box::new(RandomPolicy::new(seed)),
        }
    }
}

impl fmt::Display for GameplayStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

struct TransformativePolicy;
struct OpportunisticPolicy;

struct RandomPolicy {
    rng: ChaCha20Rng,
}

impl RandomPolicy {
    fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha20Rng::seed_from_u64(seed),
        }
    }
}

impl PlayerPolicy for TransformativePolicy {
    fn name(&self) -> &'static str {
        "Transformative"
    }

    fn pick_option(
        &mut self,
        _state: &GameState,
        player: &Player,
        card: &DecisionCard,
    ) -> PolicyDecision {
        let (idx, score) = card
            .options
            .iter()
            .enumerate()
            .map(|(idx, option)| (idx, progress_score(player, option)))
            // First option wins ties, so iterate in reverse for max_by_key.
            .rev()
            .max_by_key(|(_, score)| *score)
            .unwrap_or((0, (0, 0)));

        PolicyDecision::new(
            idx,
            Some(format!("board {:+} nation {:+}", score.0, score.1)),
        )
    }
}

impl PlayerPolicy for OpportunisticPolicy {
    fn name(&self) -> &'static str {
        "Opportunistic"
    }

    fn pick_option(
        &mut self,
        _state: &GameState,
        player: &Player,
        card: &DecisionCard,
    ) -> PolicyDecision {
        let (idx, gain) = card
            .options
            .iter()
            .enumerate()
            .map(|(idx, option)| (idx, capital_gain(player, option)))
            .rev()
            .max_by_key(|(_, gain)| *gain)
            .unwrap_or((0, 0));

        PolicyDecision::new(idx, Some(format!("capital {gain:+}")))
    }
}

impl PlayerPolicy for RandomPolicy {
    fn name(&self) -> &'static str {
        "Random"
    }

    fn pick_option(
        &mut self,
        _state: &GameState,
        _player: &Player,
        card: &DecisionCard,
    ) -> PolicyDecision {
        if card.options.is_empty() {
            return PolicyDecision::new(0, Some("no options".to_string()));
        }
        let idx = self.rng.gen_range(0..card.options.len());
        PolicyDecision::new(idx, None)
    }
}

/// Board movement first, then the signed indicator swing as seen by the player's role.
fn progress_score(player: &Player, option: &DecisionOption) -> (i32, i32) {
    option
        .effects
        .iter()
        .fold((0, 0), |(board, nation), effect| match *effect {
            Effect::Board { change, .. } => (board + change, nation),
            Effect::Indicator { indicator, change } => {
                let adjusted = player.role.adjust_indicator(indicator, change);
                let signed = match indicator.polarity() {
                    Polarity::HigherIsBetter => adjusted,
                    Polarity::LowerIsBetter => -adjusted,
                };
                (board, nation + signed)
            }
            Effect::Capital { .. } => (board, nation),
        })
}

fn capital_gain(player: &Player, option: &DecisionOption) -> i32 {
    option
        .effects
        .iter()
        .filter_map(|effect| match *effect {
            Effect::Capital { change, .. } => Some(player.role.adjust_capital(change)),
            _ => None,
        })
        .sum()
}
