//! Headless game driver: seats a table, plays it with a strategy, and audits
//! every committed decision.
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use pauta_game::constants::{GAME_OVER_ROLE_LABEL, STARTING_CAPITAL};
use pauta_game::endgame::consult_with_timeout;
use pauta_game::{
    BossOutcome, BossRoster, DataLoader, DecisionCard, DecisionError, DecisionReport, Deck,
    Ending, GameCode, GameSession, GameState, LocalAdvisor, OfflineAdvisor, Player,
    SessionConfig, SessionPhase, SessionRegistry, StaticDataLoader, advance_turn,
    check_end_conditions,
};
use thiserror::Error;
use tokio::task::JoinSet;

use crate::logic::advisors::AdvisorKind;
use crate::logic::policy::{GameplayStrategy, PlayerPolicy};

pub const DEFAULT_DECISION_LIMIT: usize = 200;

const SEAT_NAMES: [&str; 6] = ["Ana", "Bruno", "Caio", "Duda", "Elis", "Fabi"];

pub type Expectation = fn(&SimulationSummary) -> Result<()>;
pub type ConfigSetup = fn(&mut SessionConfig);

/// What a scenario plays and what it expects afterwards.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub strategy: GameplayStrategy,
    pub max_decisions: usize,
    /// Seat count override; the tester's `--players` applies otherwise.
    pub players: Option<usize>,
    /// Identical submissions raced per decision; 1 plays without contention.
    pub contenders: usize,
    /// Play the same seed a second time and keep its fingerprint.
    pub replay: bool,
    pub setup: Option<ConfigSetup>,
    pub expectations: Vec<Expectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(strategy: GameplayStrategy) -> Self {
        Self {
            strategy,
            max_decisions: DEFAULT_DECISION_LIMIT,
            players: None,
            contenders: 1,
            replay: false,
            setup: None,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_max_decisions(mut self, max_decisions: usize) -> Self {
        self.max_decisions = max_decisions;
        self
    }

    #[must_use]
    pub fn with_players(mut self, players: usize) -> Self {
        self.players = Some(players);
        self
    }

    #[must_use]
    pub fn with_contenders(mut self, contenders: usize) -> Self {
        self.contenders = contenders.max(1);
        self
    }

    #[must_use]
    pub fn with_replay(mut self) -> Self {
        self.replay = true;
        self
    }

    #[must_use]
    pub fn with_setup(mut self, setup: ConfigSetup) -> Self {
        self.setup = Some(setup);
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: Expectation) -> Self {
        self.expectations.push(expectation);
        self
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("no player holds the turn")]
    NoActingPlayer,
    #[error("no card is on the table")]
    NoCard,
    #[error("card {card} has no option at index {index}")]
    MissingOption { card: String, index: usize },
    #[error("no contender committed turn {0}")]
    NoWinner(u32),
}

/// Snapshot of a committed decision.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub turn: u32,
    pub player_id: String,
    pub role: String,
    pub card_id: String,
    pub option_name: String,
    pub policy_name: String,
    pub rationale: Option<String>,
    pub boss: BossOutcome,
}

/// Losers of raced submissions, all of which must be retriable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentionStats {
    pub rounds: usize,
    pub rejected: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub code: GameCode,
    pub strategy: GameplayStrategy,
    pub advisor: AdvisorKind,
    pub decisions: Vec<DecisionRecord>,
    pub final_state: GameState,
    pub players: Vec<Player>,
    pub game_ended: bool,
    pub ending: Option<Ending>,
    pub ending_message: String,
    pub journal_len: usize,
    pub violations: Vec<String>,
    /// Whether a submission after the end was refused; `None` while still running.
    pub rejected_after_end: Option<bool>,
    pub fingerprint: u64,
    pub replay_fingerprint: Option<u64>,
    pub contention: Option<ContentionStats>,
}

impl SimulationSummary {
    pub fn boss_outcomes(&self) -> impl Iterator<Item = &BossOutcome> {
        self.decisions
            .iter()
            .map(|record| &record.boss)
            .filter(|outcome| outcome.boss().is_some())
    }

    /// Capital the table accumulated over the starting stake.
    #[must_use]
    pub fn capital_gained(&self) -> i32 {
        self.players
            .iter()
            .map(|player| player.capital - STARTING_CAPITAL)
            .sum()
    }
}

/// Plays plans against freshly loaded game data.
#[derive(Debug, Clone)]
pub struct Simulator {
    deck: Deck,
    bosses: BossRoster,
    base_config: SessionConfig,
    advisor: AdvisorKind,
    players: usize,
}

impl Simulator {
    /// # Errors
    ///
    /// Returns an error if the embedded game data fails to load.
    pub fn try_new(advisor: AdvisorKind, players: usize) -> Result<Self> {
        let loader = StaticDataLoader;
        Ok(Self {
            deck: loader.load_deck().context("loading deck")?,
            bosses: loader.load_bosses().context("loading bosses")?,
            base_config: loader
                .load_config("session")
                .context("loading session config")?,
            advisor,
            players,
        })
    }

    #[must_use]
    pub const fn advisor(&self) -> AdvisorKind {
        self.advisor
    }

    /// Play `plan` once for `seed`.
    ///
    /// # Errors
    ///
    /// Returns an error when the table cannot be seated or a decision the
    /// policy picked is rejected.
    pub async fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut summary = if plan.contenders > 1 {
            self.play_contended(plan, seed).await?
        } else {
            self.play_solo(plan, seed).await?
        };
        if plan.replay {
            let replay = self.play_solo(plan, seed).await?;
            summary.replay_fingerprint = Some(replay.fingerprint);
        }
        Ok(summary)
    }

    fn session_config(&self, plan: &SimulationPlan) -> SessionConfig {
        let mut config = self.base_config;
        if let Some(setup) = plan.setup {
            setup(&mut config);
        }
        if let Some(timeout_ms) = self.advisor.timeout_override_ms() {
            config.advisory_timeout_ms = timeout_ms;
        }
        config
    }

    fn seat_count(&self, plan: &SimulationPlan) -> usize {
        plan.players.unwrap_or(self.players)
    }

    fn open_table(&self, plan: &SimulationPlan, seed: u64) -> Result<GameSession> {
        let mut session = GameSession::new(
            GameCode::from_entropy(seed),
            self.session_config(plan),
            self.deck.clone(),
            self.bosses.clone(),
        );
        session.reseed(seed);
        for name in seat_names(self.seat_count(plan)) {
            session
                .join(&name)
                .with_context(|| format!("seating {name}"))?;
        }
        session.start().context("starting table")?;
        Ok(session)
    }

    async fn play_solo(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut session = self.open_table(plan, seed)?;
        let mut policy = plan.strategy.create_policy(seed);
        let mut decisions = Vec::new();
        let mut violations = Vec::new();
        let mut calls = 0_u64;

        while decisions.len() < plan.max_decisions && !session.is_over() {
            let before = session.clone();
            let (player, card, option_id, record) = choose(&before, policy.as_mut())?;
            let pending = session.prepare(&player.id, &option_id, before.version())?;
            let advisory = if pending.needs_advisory() {
                let advisor = self.advisor.for_call(calls);
                calls += 1;
                let timeout = before.config().advisory_timeout();
                Some(consult_with_timeout(&advisor, pending.advisory_input(), timeout).await)
            } else {
                None
            };
            let report = session.commit(pending, advisory)?;
            debug!(
                "{}: turn {} {} picked {} on {}",
                session.code(),
                report.turn,
                player.id,
                report.decision,
                card.id
            );
            violations.extend(audit_decision(&before, &session, &report));
            decisions.push(record.with_boss(report.boss));
        }

        Ok(self.summarize(plan, seed, &session, decisions, violations, None))
    }

    async fn play_contended(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let registry = Arc::new(SessionRegistry::new(
            self.deck.clone(),
            self.bosses.clone(),
            self.session_config(plan),
        ));
        let code = registry.create(seed)?;
        for name in seat_names(self.seat_count(plan)) {
            registry
                .join(code.as_str(), &name)
                .with_context(|| format!("seating {name}"))?;
        }
        registry.start(code.as_str())?;

        let mut policy = plan.strategy.create_policy(seed);
        let mut decisions = Vec::new();
        let mut violations = Vec::new();
        let mut stats = ContentionStats::default();
        let mut calls = 0_u64;

        loop {
            let before = registry.snapshot(code.as_str())?;
            if before.is_over() || decisions.len() >= plan.max_decisions {
                break;
            }
            let (player, _card, option_id, record) = choose(&before, policy.as_mut())?;

            let mut contenders = JoinSet::new();
            for _ in 0..plan.contenders {
                let registry = Arc::clone(&registry);
                let code = code.clone();
                let player_id = player.id.clone();
                let option_id = option_id.clone();
                let version = before.version();
                let advisor = self.advisor.for_call(calls);
                calls += 1;
                contenders.spawn(async move {
                    registry
                        .submit_async(code.as_str(), &player_id, &option_id, version, &advisor)
                        .await
                });
            }

            let mut winners = Vec::new();
            while let Some(joined) = contenders.join_next().await {
                match joined.context("contender task panicked")? {
                    Ok(report) => winners.push(report),
                    Err(err) if err.is_retriable() => stats.rejected += 1,
                    Err(err) => violations.push(format!(
                        "turn {}: contender failed with a non-retriable error: {err}",
                        before.turn()
                    )),
                }
            }
            stats.rounds += 1;
            if winners.len() != 1 {
                violations.push(format!(
                    "turn {}: {} contenders committed, expected exactly one",
                    before.turn(),
                    winners.len()
                ));
            }
            let Some(report) = winners.into_iter().next() else {
                return Err(TableError::NoWinner(before.turn()).into());
            };

            let after = registry.snapshot(code.as_str())?;
            violations.extend(audit_decision(&before, &after, &report));
            decisions.push(record.with_boss(report.boss));
        }

        let session = registry.snapshot(code.as_str())?;
        Ok(self.summarize(plan, seed, &session, decisions, violations, Some(stats)))
    }

    fn summarize(
        &self,
        plan: &SimulationPlan,
        seed: u64,
        session: &GameSession,
        decisions: Vec<DecisionRecord>,
        violations: Vec<String>,
        contention: Option<ContentionStats>,
    ) -> SimulationSummary {
        let game_over = session.game_over();
        SimulationSummary {
            seed,
            code: session.code().clone(),
            strategy: plan.strategy,
            advisor: self.advisor,
            decisions,
            final_state: *session.state(),
            players: session.players().to_vec(),
            game_ended: game_over.is_game_over,
            ending: game_over.ending.clone(),
            ending_message: game_over.message.clone(),
            journal_len: session.journal().len(),
            violations,
            rejected_after_end: session.is_over().then(|| refuses_late_decision(session)),
            fingerprint: session.fingerprint(),
            replay_fingerprint: None,
            contention,
        }
    }
}

impl DecisionRecord {
    fn with_boss(mut self, boss: BossOutcome) -> Self {
        self.boss = boss;
        self
    }
}

fn seat_names(count: usize) -> Vec<String> {
    (0..count)
        .map(|idx| {
            SEAT_NAMES
                .get(idx)
                .map_or_else(|| format!("Jogador {}", idx + 1), |name| (*name).to_string())
        })
        .collect()
}

/// Ask the policy for the acting player's option.
fn choose(
    session: &GameSession,
    policy: &mut (dyn PlayerPolicy + Send),
) -> Result<(Player, DecisionCard, String, DecisionRecord), TableError> {
    let player = session
        .current_player()
        .cloned()
        .ok_or(TableError::NoActingPlayer)?;
    let card = session.current_card().cloned().ok_or(TableError::NoCard)?;
    let pick = policy.pick_option(session.state(), &player, &card);
    let option = card
        .options
        .get(pick.option_index)
        .ok_or_else(|| TableError::MissingOption {
            card: card.id.clone(),
            index: pick.option_index,
        })?;
    let option_id = option.id.clone();
    let record = DecisionRecord {
        turn: session.turn(),
        player_id: player.id.clone(),
        role: player.role_label().to_string(),
        card_id: card.id.clone(),
        option_name: option.name.clone(),
        policy_name: policy.name().to_string(),
        rationale: pick.rationale,
        boss: BossOutcome::None,
    };
    Ok((player, card, option_id, record))
}

/// A finished table must turn away the acting player without changing.
fn refuses_late_decision(session: &GameSession) -> bool {
    let mut probe = session.clone();
    let Some(player_id) = probe.current_player().map(|player| player.id.clone()) else {
        return true;
    };
    let Some(option_id) = probe
        .current_card()
        .and_then(|card| card.options.first())
        .map(|option| option.id.clone())
    else {
        return true;
    };
    let version = probe.version();
    let refused = matches!(
        probe.apply_decision(&player_id, &option_id, version, &OfflineAdvisor),
        Err(DecisionError::GameOver)
    );
    refused && probe.fingerprint() == session.fingerprint()
}

/// Invariants every committed decision must uphold.
pub fn audit_decision(
    before: &GameSession,
    after: &GameSession,
    report: &DecisionReport,
) -> Vec<String> {
    let mut violations = Vec::new();
    let turn = report.turn;
    let state = after.state();

    if !state.is_consistent() {
        violations.push(format!("turn {turn}: state out of bounds {state:?}"));
    }
    if after.version() != before.version() + 1 || report.version != after.version() {
        violations.push(format!(
            "turn {turn}: version moved {} -> {} (report {})",
            before.version(),
            after.version(),
            report.version
        ));
    }
    if after.journal().len() <= before.journal().len() {
        violations.push(format!("turn {turn}: journal did not grow"));
    }
    audit_roster(before, after, &report.player_id, turn, &mut violations);
    audit_boss(&report.boss, state, turn, &mut violations);

    if report.result.is_game_over {
        if after.phase() != SessionPhase::Finished {
            violations.push(format!(
                "turn {turn}: game over but phase is {}",
                after.phase().as_str()
            ));
        }
        let closed = after
            .journal()
            .last()
            .is_some_and(|entry| entry.is_system() && entry.player_role == GAME_OVER_ROLE_LABEL);
        if !closed {
            violations.push(format!("turn {turn}: journal lacks the closing entry"));
        }
        if report.next_player_id.is_some() {
            violations.push(format!("turn {turn}: finished game names a next player"));
        }
    } else {
        let expected = advance_turn(
            before.current_player_index(),
            before.players().len(),
            before.turn(),
        );
        let actual = (after.current_player_index(), after.turn());
        if expected != actual {
            violations.push(format!(
                "turn {turn}: seat/turn {actual:?}, expected {expected:?}"
            ));
        }
        let next = after.current_player().map(|player| player.id.as_str());
        if report.next_player_id.as_deref() != next {
            violations.push(format!(
                "turn {turn}: report names {:?} as next, table has {next:?}",
                report.next_player_id
            ));
        }
        let previous_card = before.current_card().map(|card| card.id.as_str());
        let next_card = after.current_card().map(|card| card.id.as_str());
        if after.deck().len() > 1 && previous_card == next_card {
            violations.push(format!("turn {turn}: card {next_card:?} drawn twice in a row"));
        }
    }

    let expected =
        check_end_conditions(state, after.players(), after.final_tile(), &LocalAdvisor);
    if expected.ending != report.result.ending {
        violations.push(format!(
            "turn {turn}: ending {:?} disagrees with the local rules ({:?})",
            report.result.ending, expected.ending
        ));
    }

    violations
}

fn audit_roster(
    before: &GameSession,
    after: &GameSession,
    acting_id: &str,
    turn: u32,
    violations: &mut Vec<String>,
) {
    if before.players().len() != after.players().len() {
        violations.push(format!("turn {turn}: roster size changed"));
        return;
    }
    for (old, new) in before.players().iter().zip(after.players()) {
        if old.id != new.id || old.role != new.role || old.is_opportunist != new.is_opportunist {
            violations.push(format!("turn {turn}: seat {} was reassigned", old.id));
        }
        if new.id != acting_id && new.capital != old.capital {
            violations.push(format!(
                "turn {turn}: idle player {} capital moved {} -> {}",
                new.id, old.capital, new.capital
            ));
        }
    }
}

fn audit_boss(outcome: &BossOutcome, state: &GameState, turn: u32, violations: &mut Vec<String>) {
    match outcome {
        BossOutcome::None => {}
        BossOutcome::Blocked(boss) => {
            let level = state.indicator(boss.requirement.indicator);
            if state.board_position >= boss.position || level >= boss.requirement.level {
                violations.push(format!(
                    "turn {turn}: {} blocked with board {} and {} {level}",
                    boss.name, state.board_position, boss.requirement.indicator
                ));
            }
        }
        BossOutcome::Cleared(boss) => {
            let level = state.indicator(boss.requirement.indicator);
            if state.board_position != boss.position || level < boss.requirement.level {
                violations.push(format!(
                    "turn {turn}: {} cleared with board {} and {} {level}",
                    boss.name, state.board_position, boss.requirement.indicator
                ));
            }
        }
    }
}
