//! Win/loss evaluation with an external advisory service and a local fallback.
//!
//! Collapse checks are deterministic and always run first. Victory checks
//! consult a [`WinAdvisor`]; whenever the advisor fails, times out, or is
//! absent, [`fallback_verdict`] decides instead. The fallback is the
//! reference behaviour, not a degraded mode.
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{
    COLLECTIVE_INDICATOR_FLOOR, HUNGER_COLLAPSE_THRESHOLD, INDICATOR_MIN,
    OPPORTUNIST_CAPITAL_TARGET, OPPORTUNIST_EDUCATION_CEILING,
};
use crate::indicators::Indicator;
use crate::result::{Ending, GameOverResult};
use crate::state::{GameState, Player};

#[cfg(feature = "async")]
use std::time::Duration;

/// Snapshot handed to the advisory service, taken after the board has moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryInput {
    pub economy: i32,
    pub education: i32,
    pub well_being: i32,
    pub popular_support: i32,
    pub hunger: i32,
    pub military_religion: i32,
    pub capital: i32,
    pub is_opportunist: bool,
    pub board_position: i32,
    pub final_tile: i32,
}

impl AdvisoryInput {
    /// Gather indicators plus the first opportunist's capital, if any.
    #[must_use]
    pub fn gather(state: &GameState, players: &[Player], final_tile: i32) -> Self {
        let opportunist = find_opportunist(players);
        let indicators = &state.indicators;
        Self {
            economy: indicators.economy,
            education: indicators.education,
            well_being: indicators.well_being,
            popular_support: indicators.popular_support,
            hunger: indicators.hunger,
            military_religion: indicators.military_religion,
            capital: opportunist.map_or(0, |player| player.capital),
            is_opportunist: opportunist.is_some(),
            board_position: state.board_position,
            final_tile,
        }
    }

    fn values(&self) -> [i32; 6] {
        [
            self.economy,
            self.education,
            self.well_being,
            self.popular_support,
            self.hunger,
            self.military_religion,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AdvisoryVerdict {
    pub opportunist_victory: bool,
    pub collective_victory: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvisoryError {
    #[error("advisory service unavailable: {0}")]
    Unavailable(String),
    #[error("advisory service timed out after {0} ms")]
    Timeout(u64),
    #[error("advisory service returned a malformed verdict: {0}")]
    Malformed(String),
}

/// External win-condition evaluator. Implementations may fail freely.
pub trait WinAdvisor {
    /// Evaluate victory conditions for the given snapshot.
    ///
    /// # Errors
    ///
    /// Any error is recovered by the caller through [`fallback_verdict`].
    fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError>;
}

/// Asynchronous evaluator, awaited under a bounded timeout.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait AsyncWinAdvisor: Send + Sync {
    /// # Errors
    ///
    /// Any error is recovered by the caller through [`fallback_verdict`].
    async fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError>;
}

/// Advisor that applies the deterministic rules directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LocalAdvisor;

impl WinAdvisor for LocalAdvisor {
    fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError> {
        Ok(fallback_verdict(input))
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncWinAdvisor for LocalAdvisor {
    async fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError> {
        WinAdvisor::evaluate(self, input)
    }
}

/// Advisor standing in for a missing service; every call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OfflineAdvisor;

impl WinAdvisor for OfflineAdvisor {
    fn evaluate(&self, _input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError> {
        Err(AdvisoryError::Unavailable(String::from("no advisor configured")))
    }
}

#[cfg(feature = "async")]
#[async_trait::async_trait]
impl AsyncWinAdvisor for OfflineAdvisor {
    async fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError> {
        WinAdvisor::evaluate(self, input)
    }
}

#[must_use]
pub fn find_opportunist(players: &[Player]) -> Option<&Player> {
    players.iter().find(|player| player.is_opportunist)
}

/// Deterministic victory rules used whenever the advisor cannot answer.
#[must_use]
pub fn fallback_verdict(input: &AdvisoryInput) -> AdvisoryVerdict {
    AdvisoryVerdict {
        opportunist_victory: input.is_opportunist
            && input.capital >= OPPORTUNIST_CAPITAL_TARGET
            && input.education < OPPORTUNIST_EDUCATION_CEILING,
        collective_victory: input.board_position >= input.final_tile
            && input
                .values()
                .iter()
                .all(|value| *value > COLLECTIVE_INDICATOR_FLOOR),
    }
}

/// Collapse checks, in order: essential indicator floor, then hunger ceiling.
#[must_use]
pub fn collapse_ending(state: &GameState) -> Option<Ending> {
    if let Some(indicator) = Indicator::ESSENTIAL
        .into_iter()
        .find(|indicator| state.indicator(*indicator) <= INDICATOR_MIN)
    {
        return Some(Ending::IndicatorCollapse { indicator });
    }
    if state.indicators.hunger >= HUNGER_COLLAPSE_THRESHOLD {
        return Some(Ending::HungerCollapse);
    }
    None
}

/// Turn an advisory outcome into a verdict, substituting the fallback on failure.
#[must_use]
pub fn settle_verdict(
    outcome: Result<AdvisoryVerdict, AdvisoryError>,
    input: &AdvisoryInput,
) -> AdvisoryVerdict {
    outcome.unwrap_or_else(|err| {
        warn!("win-condition advisor failed, applying local rules: {err}");
        fallback_verdict(input)
    })
}

/// Victory endings for a settled verdict. Opportunist wins take precedence.
#[must_use]
pub fn victory_ending(
    verdict: AdvisoryVerdict,
    state: &GameState,
    players: &[Player],
    final_tile: i32,
) -> Option<Ending> {
    if verdict.opportunist_victory
        && let Some(opportunist) = find_opportunist(players)
    {
        return Some(Ending::OpportunistVictory {
            player_id: opportunist.id.clone(),
            player_name: opportunist.name.clone(),
        });
    }
    if verdict.collective_victory && state.board_position >= final_tile {
        return Some(Ending::CollectiveVictory);
    }
    None
}

/// Full evaluation: collapse first, then victory through the advisor.
#[must_use]
pub fn check_end_conditions(
    state: &GameState,
    players: &[Player],
    final_tile: i32,
    advisor: &dyn WinAdvisor,
) -> GameOverResult {
    if let Some(ending) = collapse_ending(state) {
        return GameOverResult::ended(ending);
    }
    let input = AdvisoryInput::gather(state, players, final_tile);
    let verdict = settle_verdict(advisor.evaluate(&input), &input);
    victory_ending(verdict, state, players, final_tile).into()
}

/// Await an async advisor, mapping an elapsed deadline to [`AdvisoryError::Timeout`].
///
/// # Errors
///
/// Returns the advisor's own error or a timeout; callers settle either with the fallback.
#[cfg(feature = "async")]
pub async fn consult_with_timeout<A>(
    advisor: &A,
    input: &AdvisoryInput,
    timeout: Duration,
) -> Result<AdvisoryVerdict, AdvisoryError>
where
    A: AsyncWinAdvisor + ?Sized,
{
    match tokio::time::timeout(timeout, advisor.evaluate(input)).await {
        Ok(outcome) => outcome,
        Err(_elapsed) => Err(AdvisoryError::Timeout(
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

/// Async counterpart of [`check_end_conditions`].
#[cfg(feature = "async")]
pub async fn check_end_conditions_async<A>(
    state: &GameState,
    players: &[Player],
    final_tile: i32,
    advisor: &A,
    timeout: Duration,
) -> GameOverResult
where
    A: AsyncWinAdvisor + ?Sized,
{
    if let Some(ending) = collapse_ending(state) {
        return GameOverResult::ended(ending);
    }
    let input = AdvisoryInput::gather(state, players, final_tile);
    let outcome = consult_with_timeout(advisor, &input, timeout).await;
    let verdict = settle_verdict(outcome, &input);
    victory_ending(verdict, state, players, final_tile).into()
}
