//! One game table: lobby, decision pipeline, restart.
//!
//! Every mutation after the lobby funnels through [`GameSession::prepare`] and
//! [`GameSession::commit`]. `prepare` validates and computes the whole outcome
//! without touching the session; `commit` writes it in one step, guarded by
//! the session `version` so a decision computed against an older snapshot is
//! refused instead of overwriting newer state.
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use std::time::Duration;
use thiserror::Error;
use twox_hash::XxHash64;

use crate::boss::{BossGateRule, BossOutcome, apply_board_delta};
use crate::code::GameCode;
use crate::constants::{ADVISORY_TIMEOUT_MS, FIRST_TURN, MAX_PLAYERS, OPPORTUNIST_CHANCE, STARTING_CAPITAL};
use crate::data::{BossRoster, DecisionCard, Deck};
use crate::endgame::{
    AdvisoryError, AdvisoryInput, AdvisoryVerdict, WinAdvisor, collapse_ending, fallback_verdict,
    settle_verdict, victory_ending,
};
use crate::journal::{Journal, LogDraft};
use crate::resolution::{EffectSummary, resolve};
use crate::result::{Ending, GameOverResult};
use crate::rng::SessionRng;
use crate::roles::Role;
use crate::state::{GameState, Player};
use crate::turns::{advance_turn, draw_card};

#[cfg(feature = "async")]
use crate::endgame::{AsyncWinAdvisor, consult_with_timeout};

/// Per-session rules and limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub boss_gate: BossGateRule,
    pub advisory_timeout_ms: u64,
    pub max_players: usize,
    pub opportunist_chance: f64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            boss_gate: BossGateRule::Guarded,
            advisory_timeout_ms: ADVISORY_TIMEOUT_MS,
            max_players: MAX_PLAYERS,
            opportunist_chance: OPPORTUNIST_CHANCE,
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub const fn advisory_timeout(&self) -> Duration {
        Duration::from_millis(self.advisory_timeout_ms)
    }

    /// Seat limit, never above the number of distinct roles.
    #[must_use]
    pub fn seat_limit(&self) -> usize {
        self.max_players.clamp(1, MAX_PLAYERS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    Lobby,
    InProgress,
    Finished,
}

impl SessionPhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lobby => "lobby",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LobbyError {
    #[error("player name must not be blank")]
    BlankName,
    #[error("table is full ({max} players)")]
    Full { max: usize },
    #[error("game already started")]
    AlreadyStarted,
    #[error("no players have joined")]
    NoPlayers,
}

/// Reasons a decision is refused. The session is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecisionError {
    #[error("game has not started")]
    NotStarted,
    #[error("game is over")]
    GameOver,
    #[error("unknown player `{0}`")]
    UnknownPlayer(String),
    #[error("it is {expected}'s turn, not {player}'s")]
    NotYourTurn { player: String, expected: String },
    #[error("unknown option `{0}`")]
    UnknownOption(String),
    #[error("stale session state: expected version {expected}, found {actual}")]
    StaleState { expected: u64, actual: u64 },
}

impl DecisionError {
    /// Whether resubmitting against a fresh snapshot can succeed.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::StaleState { .. })
    }
}

/// A fully computed decision that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDecision {
    base_version: u64,
    player_id: String,
    decision: String,
    state: GameState,
    players: Vec<Player>,
    effects: EffectSummary,
    board_delta: i32,
    boss: BossOutcome,
    collapse: Option<Ending>,
    advisory_input: AdvisoryInput,
}

impl PendingDecision {
    /// Collapse already decided the game; no advisor call is needed.
    #[must_use]
    pub const fn needs_advisory(&self) -> bool {
        self.collapse.is_none()
    }

    #[must_use]
    pub const fn advisory_input(&self) -> &AdvisoryInput {
        &self.advisory_input
    }

    #[must_use]
    pub const fn base_version(&self) -> u64 {
        self.base_version
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub const fn boss(&self) -> &BossOutcome {
        &self.boss
    }

    #[must_use]
    pub const fn board_delta(&self) -> i32 {
        self.board_delta
    }
}

/// What a committed decision did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecisionReport {
    pub version: u64,
    pub turn: u32,
    pub player_id: String,
    pub decision: String,
    pub effects: EffectSummary,
    pub boss: BossOutcome,
    pub result: GameOverResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_player_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_card_id: Option<String>,
}

/// A game table with its roster, nation state, and audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSession {
    code: GameCode,
    config: SessionConfig,
    phase: SessionPhase,
    state: GameState,
    players: Vec<Player>,
    current_player_index: usize,
    turn: u32,
    current_card_id: Option<String>,
    journal: Journal,
    game_over: GameOverResult,
    version: u64,
    rng: SessionRng,
    #[serde(skip)]
    deck: Deck,
    #[serde(skip)]
    bosses: BossRoster,
}

impl GameSession {
    /// Open a lobby. Random streams are seeded from the game code.
    #[must_use]
    pub fn new(code: GameCode, config: SessionConfig, deck: Deck, bosses: BossRoster) -> Self {
        let rng = SessionRng::from_seed(code.seed());
        Self {
            code,
            config,
            phase: SessionPhase::Lobby,
            state: GameState::initial(),
            players: Vec::new(),
            current_player_index: 0,
            turn: FIRST_TURN,
            current_card_id: None,
            journal: Journal::new(),
            game_over: GameOverResult::ongoing(),
            version: 0,
            rng,
            deck,
            bosses,
        }
    }

    /// Replace the random streams with ones derived from `seed`.
    pub fn reseed(&mut self, seed: u64) {
        self.rng = SessionRng::from_seed(seed);
    }

    /// Reattach static data after deserializing a snapshot.
    #[must_use]
    pub fn rehydrate(mut self, deck: Deck, bosses: BossRoster) -> Self {
        self.deck = deck;
        self.bosses = bosses;
        self
    }

    #[must_use]
    pub const fn code(&self) -> &GameCode {
        &self.code
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    #[must_use]
    pub const fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub const fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.id == player_id)
    }

    #[must_use]
    pub fn current_player(&self) -> Option<&Player> {
        self.players.get(self.current_player_index)
    }

    #[must_use]
    pub const fn current_player_index(&self) -> usize {
        self.current_player_index
    }

    #[must_use]
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&DecisionCard> {
        self.current_card_id
            .as_deref()
            .and_then(|card_id| self.deck.card(card_id))
    }

    #[must_use]
    pub const fn journal(&self) -> &Journal {
        &self.journal
    }

    #[must_use]
    pub const fn game_over(&self) -> &GameOverResult {
        &self.game_over
    }

    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.game_over.is_game_over
    }

    /// Optimistic-concurrency token; bumped on every accepted mutation.
    #[must_use]
    pub const fn version(&self) -> u64 {
        self.version
    }

    #[must_use]
    pub const fn deck(&self) -> &Deck {
        &self.deck
    }

    #[must_use]
    pub const fn bosses(&self) -> &BossRoster {
        &self.bosses
    }

    #[must_use]
    pub fn final_tile(&self) -> i32 {
        self.bosses.final_tile()
    }

    /// Seat a player under the first role nobody holds yet.
    ///
    /// # Errors
    ///
    /// Rejects blank names, joins after the game started, and full tables.
    pub fn join(&mut self, name: &str) -> Result<&Player, LobbyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::BlankName);
        }
        if self.phase != SessionPhase::Lobby {
            return Err(LobbyError::AlreadyStarted);
        }
        let max = self.config.seat_limit();
        let Some(role) = self.next_free_role().filter(|_| self.players.len() < max) else {
            return Err(LobbyError::Full { max });
        };
        let id = format!("p{}", self.players.len() + 1);
        let player = Player::seat(
            id,
            name,
            role,
            self.config.opportunist_chance,
            self.rng.seating(),
        );
        debug!("{}: {} joined as {}", self.code, player.name, player.role);
        self.players.push(player);
        self.bump_version();
        let seated = self.players.len() - 1;
        Ok(&self.players[seated])
    }

    fn next_free_role(&self) -> Option<Role> {
        Role::ALL
            .into_iter()
            .find(|role| self.players.iter().all(|player| player.role != *role))
    }

    /// Close the lobby and deal the first card.
    ///
    /// # Errors
    ///
    /// Fails when nobody joined or the game is already running.
    pub fn start(&mut self) -> Result<(), LobbyError> {
        if self.phase != SessionPhase::Lobby {
            return Err(LobbyError::AlreadyStarted);
        }
        if self.players.is_empty() {
            return Err(LobbyError::NoPlayers);
        }
        self.phase = SessionPhase::InProgress;
        self.current_card_id = self.draw_next(None);
        self.bump_version();
        info!(
            "{}: game started with {} players",
            self.code,
            self.players.len()
        );
        Ok(())
    }

    /// Reset the nation to its opening configuration, keeping the roster and hidden flags.
    ///
    /// # Errors
    ///
    /// Fails when the table has no players.
    pub fn restart(&mut self) -> Result<(), LobbyError> {
        if self.players.is_empty() {
            return Err(LobbyError::NoPlayers);
        }
        self.state = GameState::initial();
        for player in &mut self.players {
            player.capital = STARTING_CAPITAL;
        }
        self.current_player_index = 0;
        self.turn = FIRST_TURN;
        self.journal.clear();
        self.game_over = GameOverResult::ongoing();
        self.phase = SessionPhase::InProgress;
        self.current_card_id = self.draw_next(None);
        self.bump_version();
        info!("{}: game restarted", self.code);
        Ok(())
    }

    /// Validate a submission and compute its full outcome without mutating anything.
    ///
    /// # Errors
    ///
    /// Returns the first validation failure, checked in this order: version,
    /// phase, player, turn ownership, option.
    pub fn prepare(
        &self,
        player_id: &str,
        option_id: &str,
        expected_version: u64,
    ) -> Result<PendingDecision, DecisionError> {
        if expected_version != self.version {
            return Err(DecisionError::StaleState {
                expected: expected_version,
                actual: self.version,
            });
        }
        match self.phase {
            SessionPhase::Lobby => return Err(DecisionError::NotStarted),
            SessionPhase::Finished => return Err(DecisionError::GameOver),
            SessionPhase::InProgress => {}
        }
        let Some(acting_index) = self.players.iter().position(|p| p.id == player_id) else {
            return Err(DecisionError::UnknownPlayer(player_id.to_string()));
        };
        if acting_index != self.current_player_index {
            let expected = self
                .current_player()
                .map_or_else(String::new, |player| player.id.clone());
            return Err(DecisionError::NotYourTurn {
                player: player_id.to_string(),
                expected,
            });
        }
        let option = self
            .current_card()
            .and_then(|card| card.option(option_id))
            .ok_or_else(|| DecisionError::UnknownOption(option_id.to_string()))?;

        let acting = &self.players[acting_index];
        let resolution = resolve(&self.state, acting, option);
        let (state, boss) = apply_board_delta(
            &resolution.state,
            resolution.board_delta,
            &self.bosses,
            self.config.boss_gate,
        );
        let mut players = self.players.clone();
        players[acting_index] = resolution.player;
        let advisory_input = AdvisoryInput::gather(&state, &players, self.final_tile());

        Ok(PendingDecision {
            base_version: self.version,
            player_id: player_id.to_string(),
            decision: option.name.clone(),
            collapse: collapse_ending(&state),
            state,
            players,
            effects: resolution.effects,
            board_delta: resolution.board_delta,
            boss,
            advisory_input,
        })
    }

    /// Write a prepared decision. `advisory` is the advisor's answer, or `None`
    /// when no advisor was consulted; failures fall back to the local rules.
    ///
    /// # Errors
    ///
    /// Returns [`DecisionError::StaleState`] when the session moved on since `prepare`.
    pub fn commit(
        &mut self,
        pending: PendingDecision,
        advisory: Option<Result<AdvisoryVerdict, AdvisoryError>>,
    ) -> Result<DecisionReport, DecisionError> {
        if pending.base_version != self.version {
            return Err(DecisionError::StaleState {
                expected: pending.base_version,
                actual: self.version,
            });
        }
        let final_tile = self.final_tile();
        let ending = pending.collapse.clone().or_else(|| {
            let verdict = match advisory {
                Some(outcome) => settle_verdict(outcome, &pending.advisory_input),
                None => fallback_verdict(&pending.advisory_input),
            };
            victory_ending(verdict, &pending.state, &pending.players, final_tile)
        });

        let turn = self.turn;
        let summary = crate::resolution::summarize(&pending.effects);
        if let Some(acting) = pending.players.iter().find(|p| p.id == pending.player_id) {
            self.journal
                .record(LogDraft::decision(turn, acting, &pending.decision, summary));
        }
        if let Some(draft) = LogDraft::boss(turn, &pending.boss) {
            debug!("{}: {}", self.code, draft.decision);
            self.journal.record(draft);
        }
        debug!(
            "{}: turn {turn} {} chose {} (board {:+})",
            self.code, pending.player_id, pending.decision, pending.board_delta
        );

        self.state = pending.state;
        self.players = pending.players;

        let result = GameOverResult::from(ending);
        if result.is_game_over {
            self.journal.record(LogDraft::game_over(turn, &result.message));
            self.phase = SessionPhase::Finished;
            self.game_over = result.clone();
            if let Some(ending) = &result.ending {
                info!("{}: game over on turn {turn} ({ending})", self.code);
            }
        } else {
            let (next_index, next_turn) =
                advance_turn(self.current_player_index, self.players.len(), self.turn);
            self.current_player_index = next_index;
            self.turn = next_turn;
            let previous = self.current_card_id.take();
            self.current_card_id = self.draw_next(previous.as_deref());
        }
        self.bump_version();

        let (next_player_id, next_card_id) = if result.is_game_over {
            (None, None)
        } else {
            (
                self.current_player().map(|player| player.id.clone()),
                self.current_card_id.clone(),
            )
        };
        Ok(DecisionReport {
            version: self.version,
            turn,
            player_id: pending.player_id,
            decision: pending.decision,
            effects: pending.effects,
            boss: pending.boss,
            result,
            next_player_id,
            next_card_id,
        })
    }

    /// Resolve one decision end to end.
    ///
    /// # Errors
    ///
    /// See [`GameSession::prepare`]; advisor failures are never surfaced.
    pub fn apply_decision(
        &mut self,
        player_id: &str,
        option_id: &str,
        expected_version: u64,
        advisor: &dyn WinAdvisor,
    ) -> Result<DecisionReport, DecisionError> {
        let pending = self.prepare(player_id, option_id, expected_version)?;
        let advisory = pending
            .needs_advisory()
            .then(|| advisor.evaluate(&pending.advisory_input));
        self.commit(pending, advisory)
    }

    /// Async counterpart of [`GameSession::apply_decision`], bounded by the session's advisory timeout.
    ///
    /// # Errors
    ///
    /// See [`GameSession::prepare`].
    #[cfg(feature = "async")]
    pub async fn apply_decision_async<A>(
        &mut self,
        player_id: &str,
        option_id: &str,
        expected_version: u64,
        advisor: &A,
    ) -> Result<DecisionReport, DecisionError>
    where
        A: AsyncWinAdvisor + ?Sized,
    {
        let pending = self.prepare(player_id, option_id, expected_version)?;
        let advisory = if pending.needs_advisory() {
            Some(
                consult_with_timeout(
                    advisor,
                    &pending.advisory_input,
                    self.config.advisory_timeout(),
                )
                .await,
            )
        } else {
            None
        };
        self.commit(pending, advisory)
    }

    /// Stable hash of the serialized session, for replay comparisons.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(&bytes);
        hasher.finish()
    }

    fn draw_next(&mut self, previous: Option<&str>) -> Option<String> {
        draw_card(&self.deck, previous, self.rng.deck()).map(|card| card.id.clone())
    }

    const fn bump_version(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Boss, BossRequirement, DecisionOption, Effect, OptionVariant};
    use crate::endgame::{LocalAdvisor, OfflineAdvisor};
    use crate::indicators::Indicator;

    fn option(id: &str, effects: Vec<Effect>) -> DecisionOption {
        DecisionOption {
            id: id.to_string(),
            name: format!("Opção {id}"),
            description: String::new(),
            effects,
            variant: OptionVariant::Default,
        }
    }

    fn deck() -> Deck {
        let options = vec![
            option("advance", vec![Effect::board(1)]),
            option("noop", Vec::new()),
            option("starve", vec![Effect::indicator(Indicator::Hunger, 10)]),
            option("loot", vec![Effect::capital(200), Effect::indicator(Indicator::Education, -3)]),
        ];
        Deck::from_cards(vec![
            DecisionCard {
                id: String::from("c1"),
                title: String::from("Um"),
                dilemma: String::new(),
                options: options.clone(),
            },
            DecisionCard {
                id: String::from("c2"),
                title: String::from("Dois"),
                dilemma: String::new(),
                options,
            },
        ])
    }

    fn bosses() -> BossRoster {
        BossRoster::from_bosses(vec![Boss {
            id: String::from("boss1"),
            name: String::from("Negacionismo"),
            position: 2,
            requirement: BossRequirement {
                indicator: Indicator::Education,
                level: 5,
            },
        }])
    }

    fn table(names: &[&str]) -> GameSession {
        let config = SessionConfig {
            opportunist_chance: 0.0,
            ..SessionConfig::default()
        };
        let code = GameCode::parse("ABCDEF").unwrap();
        let mut session = GameSession::new(code, config, deck(), bosses());
        for name in names {
            session.join(name).unwrap();
        }
        session.start().unwrap();
        session
    }

    fn play(session: &mut GameSession, option_id: &str) -> Result<DecisionReport, DecisionError> {
        let player_id = session.current_player().unwrap().id.clone();
        let version = session.version();
        session.apply_decision(&player_id, option_id, version, &OfflineAdvisor)
    }

    #[test]
    fn lobby_assigns_roles_in_seating_order() {
        let code = GameCode::parse("ABCDEF").unwrap();
        let mut session = GameSession::new(code, SessionConfig::default(), deck(), bosses());
        let roles: Vec<Role> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|name| session.join(name).unwrap().role)
            .collect();
        assert_eq!(roles, Role::ALL.to_vec());
        assert_eq!(session.join("g"), Err(LobbyError::Full { max: 6 }));
        assert_eq!(session.players()[5].id, "p6");
    }

    #[test]
    fn lobby_rejects_blank_names_and_late_joins() {
        let code = GameCode::parse("ABCDEF").unwrap();
        let mut session = GameSession::new(code, SessionConfig::default(), deck(), bosses());
        assert_eq!(session.join("   "), Err(LobbyError::BlankName));
        assert_eq!(session.start(), Err(LobbyError::NoPlayers));
        session.join(" Ana ").unwrap();
        assert_eq!(session.players()[0].name, "Ana");
        session.start().unwrap();
        assert_eq!(session.join("Bruno"), Err(LobbyError::AlreadyStarted));
        assert_eq!(session.start(), Err(LobbyError::AlreadyStarted));
        assert!(session.current_card().is_some());
    }

    #[test]
    fn decisions_rotate_seats_and_turns() {
        let mut session = table(&["a", "b", "c", "d"]);
        for _ in 0..3 {
            play(&mut session, "noop").unwrap();
        }
        assert_eq!(session.current_player_index(), 3);
        assert_eq!(session.turn(), 1);
        let report = play(&mut session, "noop").unwrap();
        assert_eq!(report.turn, 1);
        assert_eq!(session.current_player_index(), 0);
        assert_eq!(session.turn(), 2);
        assert_eq!(report.next_player_id.as_deref(), Some("p1"));
    }

    #[test]
    fn next_card_differs_from_the_played_one() {
        let mut session = table(&["a", "b"]);
        for _ in 0..10 {
            let before = session.current_card().unwrap().id.clone();
            play(&mut session, "noop").unwrap();
            assert_ne!(session.current_card().unwrap().id, before);
        }
    }

    #[test]
    fn rejected_decisions_leave_the_session_untouched() {
        let mut session = table(&["a", "b"]);
        let before = session.fingerprint();
        let version = session.version();

        assert_eq!(
            session.apply_decision("p2", "noop", version, &OfflineAdvisor),
            Err(DecisionError::NotYourTurn {
                player: String::from("p2"),
                expected: String::from("p1"),
            })
        );
        assert_eq!(
            session.apply_decision("p9", "noop", version, &OfflineAdvisor),
            Err(DecisionError::UnknownPlayer(String::from("p9")))
        );
        assert_eq!(
            session.apply_decision("p1", "bogus", version, &OfflineAdvisor),
            Err(DecisionError::UnknownOption(String::from("bogus")))
        );
        let stale = session.apply_decision("p1", "noop", version + 1, &OfflineAdvisor);
        assert!(stale.as_ref().is_err_and(DecisionError::is_retriable));
        assert_eq!(session.fingerprint(), before);
        assert_eq!(session.version(), version);
    }

    #[test]
    fn lobby_refuses_decisions() {
        let code = GameCode::parse("ABCDEF").unwrap();
        let mut session = GameSession::new(code, SessionConfig::default(), deck(), bosses());
        session.join("Ana").unwrap();
        let version = session.version();
        assert_eq!(
            session.apply_decision("p1", "noop", version, &OfflineAdvisor),
            Err(DecisionError::NotStarted)
        );
    }

    #[test]
    fn boss_block_is_logged_as_a_system_entry() {
        let mut session = table(&["a"]);
        let report = play(&mut session, "advance").unwrap();
        assert!(report.boss.is_blocked());
        assert_eq!(session.state().board_position, 1);
        let entries = session.journal().entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].effects, "Progresso +1");
        assert_eq!(entries[1].decision, "Falha ao enfrentar Negacionismo");
    }

    #[test]
    fn collapse_ends_the_game_without_advancing() {
        let mut session = table(&["a", "b"]);
        let report = play(&mut session, "starve").unwrap();
        assert!(report.result.is_game_over);
        assert_eq!(report.result.ending, Some(Ending::HungerCollapse));
        assert_eq!(session.phase(), SessionPhase::Finished);
        assert_eq!(session.current_player_index(), 0);
        assert_eq!(session.turn(), 1);
        let last = session.journal().last().unwrap();
        assert_eq!(last.player_role, "Fim de Jogo");
        assert_eq!(last.decision, report.result.message);

        let version = session.version();
        assert_eq!(
            session.apply_decision("p1", "noop", version, &OfflineAdvisor),
            Err(DecisionError::GameOver)
        );
    }

    #[test]
    fn opportunist_wins_through_the_fallback() {
        let code = GameCode::parse("ABCDEF").unwrap();
        let config = SessionConfig {
            opportunist_chance: 1.0,
            ..SessionConfig::default()
        };
        let mut session = GameSession::new(code, config, deck(), bosses());
        session.join("Ana").unwrap();
        session.start().unwrap();
        let report = play(&mut session, "loot").unwrap();
        assert!(matches!(
            report.result.ending,
            Some(Ending::OpportunistVictory { ref player_name, .. }) if player_name == "Ana"
        ));
    }

    #[test]
    fn local_and_offline_advisors_agree() {
        let mut offline = table(&["a", "b"]);
        let mut local = table(&["a", "b"]);
        for option_id in ["noop", "advance", "loot", "advance", "noop"] {
            let player_id = offline.current_player().unwrap().id.clone();
            let a = offline
                .apply_decision(&player_id, option_id, offline.version(), &OfflineAdvisor)
                .unwrap();
            let b = local
                .apply_decision(&player_id, option_id, local.version(), &LocalAdvisor)
                .unwrap();
            assert_eq!(a, b);
        }
        assert_eq!(offline.fingerprint(), local.fingerprint());
    }

    /// Every bounded indicator to the ceiling, hunger to 8, and a leap to the final tile.
    fn final_stretch(id: &str, well_being: i32) -> DecisionOption {
        option(
            id,
            vec![
                Effect::indicator(Indicator::Economy, 10),
                Effect::indicator(Indicator::Education, 10),
                Effect::indicator(Indicator::WellBeing, well_being),
                Effect::indicator(Indicator::PopularSupport, 10),
                Effect::indicator(Indicator::MilitaryReligion, 10),
                Effect::indicator(Indicator::Hunger, 6),
                Effect::board(19),
            ],
        )
    }

    fn final_stretch_table() -> GameSession {
        let card = DecisionCard {
            id: String::from("finale"),
            title: String::from("Reta Final"),
            dilemma: String::new(),
            options: vec![final_stretch("prosper", 10), final_stretch("falter", 2)],
        };
        let config = SessionConfig {
            opportunist_chance: 0.0,
            ..SessionConfig::default()
        };
        let mut session = GameSession::new(
            GameCode::parse("ABCDEF").unwrap(),
            config,
            Deck::from_cards(vec![card]),
            BossRoster::load_from_static().unwrap(),
        );
        session.join("Ana").unwrap();
        session.start().unwrap();
        session
    }

    #[test]
    fn reaching_the_final_tile_prospering_wins_for_every_advisor() {
        let advisors: [&dyn WinAdvisor; 2] = [&OfflineAdvisor, &LocalAdvisor];
        let mut reports = Vec::new();
        for advisor in advisors {
            let mut session = final_stretch_table();
            let report = session
                .apply_decision("p1", "prosper", session.version(), advisor)
                .unwrap();
            assert_eq!(session.state().board_position, 20);
            assert!(matches!(report.boss, BossOutcome::Cleared(ref boss) if boss.position == 20));
            assert_eq!(report.result.ending, Some(Ending::CollectiveVictory));
            assert!(session.is_over());
            reports.push(report);
        }
        assert_eq!(reports[0], reports[1]);
    }

    #[test]
    fn final_boss_blocks_a_struggling_nation() {
        let advisors: [&dyn WinAdvisor; 2] = [&OfflineAdvisor, &LocalAdvisor];
        for advisor in advisors {
            let mut session = final_stretch_table();
            let report = session
                .apply_decision("p1", "falter", session.version(), advisor)
                .unwrap();
            assert_eq!(session.state().board_position, 19);
            assert!(matches!(report.boss, BossOutcome::Blocked(ref boss) if boss.position == 20));
            assert_eq!(report.result.ending, None);
            assert!(!session.is_over());
        }
    }

    #[test]
    fn pending_decision_shows_the_advisor_the_moved_board() {
        let session = final_stretch_table();
        let pending = session.prepare("p1", "prosper", session.version()).unwrap();
        assert_eq!(pending.advisory_input().board_position, 20);
        assert_eq!(pending.advisory_input().final_tile, 20);
        let verdict = WinAdvisor::evaluate(&LocalAdvisor, pending.advisory_input()).unwrap();
        assert!(verdict.collective_victory);
    }

    #[test]
    fn restart_restores_the_opening_position() {
        let mut session = table(&["a", "b"]);
        play(&mut session, "loot").unwrap();
        play(&mut session, "starve").unwrap();
        assert!(session.is_over());
        let flags: Vec<bool> = session.players().iter().map(|p| p.is_opportunist).collect();

        session.restart().unwrap();
        assert_eq!(*session.state(), GameState::initial());
        assert_eq!(session.turn(), 1);
        assert_eq!(session.current_player_index(), 0);
        assert!(session.journal().is_empty());
        assert!(!session.is_over());
        assert!(session.players().iter().all(|p| p.capital == STARTING_CAPITAL));
        let after: Vec<bool> = session.players().iter().map(|p| p.is_opportunist).collect();
        assert_eq!(flags, after);
        assert!(play(&mut session, "noop").is_ok());
    }

    #[test]
    fn commit_refuses_a_pending_decision_from_an_older_version() {
        let mut session = table(&["a", "b"]);
        let pending = session.prepare("p1", "noop", session.version()).unwrap();
        play(&mut session, "noop").unwrap();
        let err = session.commit(pending, None).unwrap_err();
        assert!(err.is_retriable());
    }

    #[test]
    fn same_code_replays_identically() {
        let mut a = table(&["a", "b", "c"]);
        let mut b = table(&["a", "b", "c"]);
        for _ in 0..6 {
            play(&mut a, "noop").unwrap();
            play(&mut b, "noop").unwrap();
        }
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn snapshot_roundtrip_needs_rehydration() {
        let mut session = table(&["a", "b"]);
        play(&mut session, "noop").unwrap();
        let json = serde_json::to_string(&session).unwrap();
        let restored: GameSession = serde_json::from_str(&json).unwrap();
        assert!(restored.current_card().is_none());
        let restored = restored.rehydrate(deck(), bosses());
        assert_eq!(restored.fingerprint(), session.fingerprint());
        assert_eq!(
            restored.current_card().map(|card| &card.id),
            session.current_card().map(|card| &card.id)
        );
    }
}
