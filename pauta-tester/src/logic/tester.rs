use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::logic::simulation::{SimulationPlan, SimulationSummary, Simulator};
use crate::scenario::TestScenario;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub advisor: String,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester {
    simulator: Simulator,
    verbose: bool,
}

impl LogicTester {
    pub const fn new(simulator: Simulator, verbose: bool) -> Self {
        Self { simulator, verbose }
    }

    pub async fn run_scenario(
        &self,
        scenario: &TestScenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (strategy: {} advisor: {} seed: {})",
                    scenario.name.bright_white(),
                    scenario.plan.strategy,
                    self.simulator.advisor(),
                    seed
                );
            }

            let result = self.run_single_scenario(scenario, seed, iterations).await;
            results.push(result);
        }

        results
    }

    async fn run_single_scenario(
        &self,
        scenario: &TestScenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let (successes, failures, performance_data) = self
            .run_simulation_iterations(&scenario.plan, seed, iterations)
            .await;

        let avg_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.name.clone(),
            seed,
            advisor: self.simulator.advisor().to_string(),
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration: avg_duration,
            performance_data,
        }
    }

    async fn run_simulation_iterations(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        iterations: usize,
    ) -> (usize, Vec<String>, Vec<Duration>) {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));

            let failure = match self.simulator.run_plan(plan, iteration_seed).await {
                Ok(summary) => evaluate_expectations(plan, &summary)
                    .map(|err| (err, describe_run(&summary))),
                Err(err) => Some((format!("{err:#}"), "table never ran".to_string())),
            };

            if let Some((err, context)) = failure {
                failures.push(format!(
                    "Iteration {} (strategy {}, seed {}): {} | {}",
                    i + 1,
                    plan.strategy.label(),
                    iteration_seed,
                    err,
                    context
                ));

                if self.verbose {
                    println!(
                        "  ❌ Iteration {}/{} failed: {}",
                        i + 1,
                        iterations,
                        err.clone().red()
                    );
                    println!("     ↳ {context}");
                }
            } else {
                successes += 1;
                let duration = start_time.elapsed();
                performance_data.push(duration);

                if self.verbose {
                    println!(
                        "  ✅ Iteration {}/{} passed ({duration:?}) strategy:{}",
                        i + 1,
                        iterations,
                        plan.strategy.label()
                    );
                }
            }
        }

        (successes, failures, performance_data)
    }
}

/// Audit violations fail first, then the plan's own expectations in order.
fn evaluate_expectations(plan: &SimulationPlan, summary: &SimulationSummary) -> Option<String> {
    if let Some(violation) = summary.violations.first() {
        let extra = summary.violations.len() - 1;
        return Some(if extra == 0 {
            violation.clone()
        } else {
            format!("{violation} (+{extra} more)")
        });
    }
    for expectation in &plan.expectations {
        if let Err(err) = expectation(summary) {
            return Some(err.to_string());
        }
    }
    None
}

fn describe_run(summary: &SimulationSummary) -> String {
    let status = if summary.game_ended {
        "ended"
    } else {
        "halted"
    };
    let indicators = &summary.final_state.indicators;
    format!(
        "code {} | {} decisions, {status}, ending '{}' | board {} eco {} edu {} bem {} apoio {} fome {} ordem {} | last: {}",
        summary.code,
        summary.decisions.len(),
        summary.ending_message,
        summary.final_state.board_position,
        indicators.economy,
        indicators.education,
        indicators.well_being,
        indicators.popular_support,
        indicators.hunger,
        indicators.military_religion,
        summarize_decision_path(summary)
    )
}

fn summarize_decision_path(summary: &SimulationSummary) -> String {
    if summary.decisions.is_empty() {
        return "no decisions recorded".to_string();
    }

    summary
        .decisions
        .iter()
        .rev()
        .take(3)
        .map(|entry| {
            let rationale = entry
                .rationale
                .as_deref()
                .filter(|s| !s.is_empty())
                .unwrap_or("-");
            format!(
                "turn {} {} ({}): {} -> {} [{} {}]",
                entry.turn,
                entry.player_id,
                entry.role,
                entry.card_id,
                entry.option_name,
                entry.policy_name,
                rationale
            )
        })
        .collect::<Vec<_>>()
        .join(" | ")
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u128(duration.as_millis())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(durations.len()))?;
        for duration in durations {
            seq.serialize_element(&duration.as_millis())?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis_vec = Vec::<u64>::deserialize(deserializer)?;
        Ok(millis_vec.into_iter().map(Duration::from_millis).collect())
    }
}
