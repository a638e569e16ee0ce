//! Centralized balance and tuning constants for Brasil em Pauta.
//!
//! These values define the deterministic rules of the national simulation.
//! Keeping them together ensures that gameplay can only be adjusted via
//! code changes reviewed in version control, rather than through external
//! JSON assets.

// Indicator bounds ---------------------------------------------------------
pub const INDICATOR_MIN: i32 = 0;
pub const INDICATOR_MAX: i32 = 10;
/// Hunger has no upper clamp; reaching this value collapses the nation.
pub const HUNGER_COLLAPSE_THRESHOLD: i32 = 10;

// Board --------------------------------------------------------------------
pub const BOARD_START: i32 = 1;
pub const BOARD_FINAL_TILE: i32 = 20;

// Players ------------------------------------------------------------------
pub const STARTING_CAPITAL: i32 = 5;
pub const OPPORTUNIST_CHANCE: f64 = 0.25;
pub const MAX_PLAYERS: usize = 6;
pub const FIRST_TURN: u32 = 1;

// Deterministic win-condition fallback -------------------------------------
pub const OPPORTUNIST_CAPITAL_TARGET: i32 = 100;
/// Education must stay strictly below this for the opportunist to win.
pub const OPPORTUNIST_EDUCATION_CEILING: i32 = 3;
/// Every indicator must be strictly above this for a collective victory.
pub const COLLECTIVE_INDICATOR_FLOOR: i32 = 7;
pub const ADVISORY_TIMEOUT_MS: u64 = 5_000;

// Game codes ---------------------------------------------------------------
pub const GAME_CODE_LEN: usize = 6;
pub(crate) const GAME_CODE_ATTEMPTS: u64 = 32;

// Player-facing copy -------------------------------------------------------
pub const NO_EFFECT_SUMMARY: &str = "Nenhum efeito.";
pub const CAPITAL_LABEL: &str = "Capital";
pub const BOARD_LABEL: &str = "Progresso";
pub const SYSTEM_NAME: &str = "Sistema";
pub const BOSS_ROLE_LABEL: &str = "Chefe";
pub const GAME_OVER_ROLE_LABEL: &str = "Fim de Jogo";
pub const BOSS_BLOCKED_EFFECT: &str = "Progresso da nação regrediu.";
pub const BOSS_CLEARED_EFFECT: &str = "A nação avança!";
pub const GAME_OVER_EFFECT: &str = "A partida terminou.";
pub const MSG_INDICATOR_COLLAPSE: &str =
    "Colapso! Um indicador essencial chegou a zero. O país entrou em ruínas. Todos perdem.";
pub const MSG_HUNGER_COLLAPSE: &str =
    "Colapso! A fome atingiu níveis insustentáveis. O país entrou em ruínas. Todos perdem.";
pub const MSG_COLLECTIVE_VICTORY: &str =
    "Vitória Coletiva! A nação prosperou e alcançou a Justiça Social!";

// RNG stream domains -------------------------------------------------------
pub(crate) const RNG_DOMAIN_DECK: &[u8] = b"pauta.deck";
pub(crate) const RNG_DOMAIN_SEATING: &[u8] = b"pauta.seating";
