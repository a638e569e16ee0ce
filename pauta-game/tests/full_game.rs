use pauta_game::{
    BossGateRule, BossOutcome, BossRoster, DataLoader, DecisionError, Deck, Ending, GameCode,
    GameSession, GameState, Indicator, OfflineAdvisor, Role, SessionConfig, SessionPhase,
    StaticDataLoader, advance_turn, check_end_conditions, collapse_ending,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

fn table(code: &str, config: SessionConfig, names: &[&str]) -> GameSession {
    let deck = StaticDataLoader.load_deck().unwrap();
    let bosses = StaticDataLoader.load_bosses().unwrap();
    let mut session = GameSession::new(GameCode::parse(code).unwrap(), config, deck, bosses);
    for name in names {
        session.join(name).unwrap();
    }
    session.start().unwrap();
    session
}

fn honest_config() -> SessionConfig {
    SessionConfig {
        opportunist_chance: 0.0,
        ..SessionConfig::default()
    }
}

/// Play until the game ends or `limit` decisions were made, picking options at random.
fn play_random(session: &mut GameSession, seed: u64, limit: usize) -> usize {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    for played in 0..limit {
        if session.is_over() {
            return played;
        }
        let card = session.current_card().unwrap();
        let option = card.options[rng.gen_range(0..card.options.len())].id.clone();
        let player_id = session.current_player().unwrap().id.clone();
        let before_version = session.version();
        let report = session
            .apply_decision(&player_id, &option, before_version, &OfflineAdvisor)
            .unwrap();

        assert_eq!(session.version(), before_version + 1);
        assert_eq!(report.version, session.version());
        assert!(session.state().is_consistent(), "{:?}", session.state());
        assert!(session.state().indicators.hunger >= 0);
        if !report.result.is_game_over {
            assert_eq!(report.next_player_id.as_deref(), session.current_player().map(|p| p.id.as_str()));
        }
    }
    limit
}

#[test]
fn random_games_keep_every_invariant() {
    for seed in 0..40_u64 {
        let code = GameCode::from_entropy(seed);
        let mut session = table(
            code.as_str(),
            SessionConfig::default(),
            &["Ana", "Bruno", "Caio", "Duda"],
        );
        play_random(&mut session, seed, 300);
        if session.is_over() {
            assert_eq!(session.phase(), SessionPhase::Finished);
            let last = session.journal().last().unwrap();
            assert_eq!(last.player_name, "Sistema");
            assert_eq!(last.player_role, "Fim de Jogo");
            assert_eq!(last.decision, session.game_over().message);
        }
    }
}

#[test]
fn transformative_play_reaches_the_first_boss() {
    let mut session = table("PAUTA3", honest_config(), &["Ana"]);
    let mut saw_boss = false;
    for _ in 0..20 {
        if session.is_over() {
            break;
        }
        let option = session.current_card().unwrap().options[0].id.clone();
        let report = session
            .apply_decision("p1", &option, session.version(), &OfflineAdvisor)
            .unwrap();
        if let Some(boss) = report.boss.boss() {
            assert_eq!(boss.name, "Negacionismo");
            saw_boss = true;
            break;
        }
    }
    assert!(saw_boss || session.is_over());
}

#[test]
fn four_player_rotation_matches_turn_sequencer() {
    let mut session = table("RTAA44", honest_config(), &["a", "b", "c", "d"]);
    let mut expected = (session.current_player_index(), session.turn());
    for _ in 0..8 {
        let neutral = session
            .current_card()
            .unwrap()
            .options
            .iter()
            .find(|option| option.name == "Neutra")
            .unwrap()
            .id
            .clone();
        let player_id = session.current_player().unwrap().id.clone();
        let report = session
            .apply_decision(&player_id, &neutral, session.version(), &OfflineAdvisor)
            .unwrap();
        if report.result.is_game_over {
            return;
        }
        expected = advance_turn(expected.0, 4, expected.1);
        assert_eq!((session.current_player_index(), session.turn()), expected);
    }
}

#[test]
fn collapse_is_final_regardless_of_board() {
    let state = GameState::initial()
        .with_indicator(Indicator::Economy, 0)
        .with_board_position(20);
    let result = check_end_conditions(&state, &[], 20, &OfflineAdvisor);
    assert!(result.is_game_over);
    assert!(collapse_ending(&state).is_some_and(|ending| ending.is_collapse()));
}

#[test]
fn economy_drain_collapses_and_locks_the_table() {
    let mut session = table("DRENA2", honest_config(), &["Ana", "Bruno"]);
    let mut guard = 0;
    while !session.is_over() {
        guard += 1;
        assert!(guard < 50, "economy never collapsed");
        let card = session.current_card().unwrap();
        let option = card
            .options
            .iter()
            .min_by_key(|option| {
                option
                    .effects
                    .iter()
                    .filter(|effect| matches!(effect, pauta_game::Effect::Indicator { indicator: Indicator::Economy, .. }))
                    .map(pauta_game::Effect::change)
                    .sum::<i32>()
            })
            .unwrap()
            .id
            .clone();
        let player_id = session.current_player().unwrap().id.clone();
        session
            .apply_decision(&player_id, &option, session.version(), &OfflineAdvisor)
            .unwrap();
    }
    assert!(matches!(
        session.game_over().ending,
        Some(Ending::IndicatorCollapse { .. } | Ending::HungerCollapse)
    ));
    let player_id = session.current_player().unwrap().id.clone();
    let option = session.current_card().unwrap().options[0].id.clone();
    assert_eq!(
        session.apply_decision(&player_id, &option, session.version(), &OfflineAdvisor),
        Err(DecisionError::GameOver)
    );
}

#[test]
fn unconditional_gate_is_opt_in() {
    assert_eq!(SessionConfig::default().boss_gate, BossGateRule::Guarded);
    let config = SessionConfig {
        boss_gate: BossGateRule::Unconditional,
        opportunist_chance: 0.0,
        ..SessionConfig::default()
    };
    let session = table("GATE22", config, &["Ana"]);
    assert_eq!(session.config().boss_gate, BossGateRule::Unconditional);
}

#[test]
fn roles_follow_lobby_order() {
    let session = table(
        "LBBY66",
        SessionConfig::default(),
        &["a", "b", "c", "d", "e", "f"],
    );
    let roles: Vec<Role> = session.players().iter().map(|player| player.role).collect();
    assert_eq!(roles, Role::ALL);
}

#[test]
fn replay_from_the_same_code_is_deterministic() {
    let mut first = table("REPL4Y", SessionConfig::default(), &["a", "b", "c"]);
    let mut second = table("REPL4Y", SessionConfig::default(), &["a", "b", "c"]);
    play_random(&mut first, 99, 60);
    play_random(&mut second, 99, 60);
    assert_eq!(first.fingerprint(), second.fingerprint());
}

#[test]
fn blocked_boss_keeps_the_nation_before_the_tile() {
    let deck = Deck::load_from_static().unwrap();
    let bosses = BossRoster::load_from_static().unwrap();
    let state = GameState::initial().with_board_position(4);
    let (next, outcome) =
        pauta_game::apply_board_delta(&state, 1, &bosses, BossGateRule::Guarded);
    assert_eq!(next.board_position, 4);
    assert!(matches!(outcome, BossOutcome::Blocked(ref boss) if boss.position == 5));
    assert_eq!(deck.len(), 2);
}
