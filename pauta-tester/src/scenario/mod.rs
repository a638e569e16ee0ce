//! Catalog of logic scenarios the tester can run.
use anyhow::{Result, ensure};
use pauta_game::{BossOutcome, Ending, SessionConfig};

use crate::logic::{GameplayStrategy, SimulationPlan, SimulationSummary};

/// Identical submissions raced per decision in the concurrency scenario.
const CONTENDERS: usize = 8;

#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

fn honest_table(config: &mut SessionConfig) {
    config.opportunist_chance = 0.0;
}

fn opportunist_table(config: &mut SessionConfig) {
    config.opportunist_chance = 1.0;
}

fn played_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        !summary.decisions.is_empty(),
        "Table should accept at least one decision"
    );
    ensure!(
        summary.journal_len >= summary.decisions.len(),
        "Journal has {} entries for {} decisions",
        summary.journal_len,
        summary.decisions.len()
    );
    Ok(())
}

fn closed_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(summary.game_ended, "Game should end within the decision limit");
    ensure!(
        summary.rejected_after_end == Some(true),
        "Finished table accepted a late decision"
    );
    Ok(())
}

fn boss_expectation(summary: &SimulationSummary) -> Result<()> {
    let first = summary
        .boss_outcomes()
        .next()
        .and_then(BossOutcome::boss)
        .map(|boss| boss.position);
    ensure!(
        first == Some(5),
        "Forward play should meet the first boss on tile 5, met {first:?}"
    );
    Ok(())
}

fn collapse_expectation(summary: &SimulationSummary) -> Result<()> {
    closed_expectation(summary)?;
    ensure!(
        summary.ending.as_ref().is_some_and(Ending::is_collapse),
        "Honest greed should collapse the nation, ended with {:?}",
        summary.ending
    );
    Ok(())
}

fn opportunist_expectation(summary: &SimulationSummary) -> Result<()> {
    closed_expectation(summary)?;
    ensure!(
        summary.capital_gained() > 0,
        "Opportunist options should pay capital"
    );
    match &summary.ending {
        Some(Ending::OpportunistVictory { player_id, .. }) => {
            let winner = summary.players.iter().find(|p| &p.id == player_id);
            ensure!(
                winner.is_some_and(|p| p.is_opportunist),
                "Opportunist victory credited to {player_id}, who is not an opportunist"
            );
        }
        Some(ending) => {
            ensure!(
                ending.is_collapse(),
                "A board that never moves cannot end in {ending}"
            );
        }
        None => {}
    }
    Ok(())
}

fn replay_expectation(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.replay_fingerprint == Some(summary.fingerprint),
        "Replay of seed {} diverged: {:#x} vs {:?}",
        summary.seed,
        summary.fingerprint,
        summary.replay_fingerprint
    );
    Ok(())
}

fn contention_expectation(summary: &SimulationSummary) -> Result<()> {
    let Some(stats) = summary.contention else {
        anyhow::bail!("Contended run recorded no contention");
    };
    ensure!(
        stats.rounds == summary.decisions.len(),
        "{} rounds for {} decisions",
        stats.rounds,
        summary.decisions.len()
    );
    ensure!(
        stats.rejected == stats.rounds * (CONTENDERS - 1),
        "Expected {} retriable rejections, saw {}",
        stats.rounds * (CONTENDERS - 1),
        stats.rejected
    );
    Ok(())
}

fn smoke_scenario() -> TestScenario {
    TestScenario::simulation(
        "Smoke Test",
        SimulationPlan::new(GameplayStrategy::Random).with_expectation(played_expectation),
    )
}

fn boss_gate_scenario() -> TestScenario {
    TestScenario::simulation(
        "Boss Gate Enforcement",
        SimulationPlan::new(GameplayStrategy::Transformative)
            .with_setup(honest_table)
            .with_expectation(played_expectation)
            .with_expectation(boss_expectation),
    )
}

fn collapse_scenario() -> TestScenario {
    TestScenario::simulation(
        "Indicator Collapse",
        SimulationPlan::new(GameplayStrategy::Opportunistic)
            .with_setup(honest_table)
            .with_expectation(collapse_expectation),
    )
}

fn opportunist_scenario() -> TestScenario {
    TestScenario::simulation(
        "Opportunist Table",
        SimulationPlan::new(GameplayStrategy::Opportunistic)
            .with_setup(opportunist_table)
            .with_expectation(opportunist_expectation),
    )
}

fn determinism_scenario() -> TestScenario {
    TestScenario::simulation(
        "Deterministic Replay",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_replay()
            .with_expectation(replay_expectation),
    )
}

fn concurrency_scenario() -> TestScenario {
    TestScenario::simulation(
        "Concurrent Submissions",
        SimulationPlan::new(GameplayStrategy::Random)
            .with_contenders(CONTENDERS)
            .with_max_decisions(30)
            .with_expectation(played_expectation)
            .with_expectation(contention_expectation),
    )
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    match name.to_lowercase().as_str() {
        "smoke" => Some(smoke_scenario()),
        "boss-gate" | "boss" => Some(boss_gate_scenario()),
        "collapse" => Some(collapse_scenario()),
        "opportunist" => Some(opportunist_scenario()),
        "determinism" | "deterministic" => Some(determinism_scenario()),
        "concurrency" | "contention" => Some(concurrency_scenario()),
        _ => None,
    }
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    vec![
        ("smoke", "Smoke Test"),
        ("boss-gate", "Boss Gate Enforcement"),
        ("collapse", "Indicator Collapse"),
        ("opportunist", "Opportunist Table"),
        ("determinism", "Deterministic Replay"),
        ("concurrency", "Concurrent Submissions"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_scenario_resolves() {
        for (key, description) in list_scenarios() {
            let scenario = get_scenario(key).unwrap();
            assert_eq!(scenario.name, description);
            assert!(!scenario.plan.expectations.is_empty(), "{key}");
        }
    }

    #[test]
    fn lookups_ignore_case_and_accept_aliases() {
        assert_eq!(get_scenario("BOSS").unwrap().name, "Boss Gate Enforcement");
        assert_eq!(get_scenario("contention").unwrap().plan.contenders, CONTENDERS);
        assert!(get_scenario("weather").is_none());
    }
}
