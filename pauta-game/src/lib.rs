//! Brasil em Pauta Game Engine
//!
//! Platform-agnostic rules for the Brasil em Pauta civic board game: the
//! indicator model, role modifiers, decision resolution, boss gates, win/loss
//! evaluation, and turn sequencing, composed into thread-safe game sessions.
//! This crate carries no UI, transport, or persistence of its own.

pub mod boss;
pub mod code;
pub mod constants;
pub mod data;
pub mod endgame;
pub mod indicators;
pub mod journal;
pub mod numbers;
pub mod registry;
pub mod resolution;
pub mod result;
pub mod rng;
pub mod roles;
pub mod session;
pub mod state;
pub mod turns;

// Re-export commonly used types
pub use boss::{BossGateRule, BossOutcome, apply_board_delta};
pub use code::{GameCode, InvalidCode, normalize_code};
pub use data::{
    Boss, BossRequirement, BossRoster, DataError, DecisionCard, DecisionOption, Deck, Effect,
    OptionVariant,
};
pub use endgame::{
    AdvisoryError, AdvisoryInput, AdvisoryVerdict, LocalAdvisor, OfflineAdvisor, WinAdvisor,
    check_end_conditions, collapse_ending, fallback_verdict,
};
#[cfg(feature = "async")]
pub use endgame::{AsyncWinAdvisor, check_end_conditions_async};
pub use indicators::{Indicator, Indicators, Polarity};
pub use journal::{Journal, LogEntry};
pub use registry::{RegistryError, SessionRegistry, SharedSession};
pub use resolution::{EffectSummary, Resolution, resolve};
pub use result::{Ending, GameOverResult};
pub use roles::{Modifier, Role};
pub use session::{
    DecisionError, DecisionReport, GameSession, LobbyError, PendingDecision, SessionConfig,
    SessionPhase,
};
pub use state::{GameState, Player};
pub use turns::{advance_turn, draw_card};

const DEFAULT_SESSION_CONFIG: &str = include_str!("../assets/data/session.json");

/// Trait for abstracting data loading operations
/// Platform-specific implementations should provide this
pub trait DataLoader {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the decision deck
    ///
    /// # Errors
    ///
    /// Returns an error if the deck cannot be loaded or fails validation.
    fn load_deck(&self) -> Result<Deck, Self::Error>;

    /// Load the boss roster
    ///
    /// # Errors
    ///
    /// Returns an error if the roster cannot be loaded or fails validation.
    fn load_bosses(&self) -> Result<BossRoster, Self::Error>;

    /// Load configuration data for a specific system
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded or parsed.
    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned;
}

/// Loader backed by the JSON assets compiled into the crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticDataLoader;

impl DataLoader for StaticDataLoader {
    type Error = DataError;

    fn load_deck(&self) -> Result<Deck, Self::Error> {
        Deck::load_from_static()
    }

    fn load_bosses(&self) -> Result<BossRoster, Self::Error> {
        BossRoster::load_from_static()
    }

    fn load_config<T>(&self, config_name: &str) -> Result<T, Self::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        match config_name {
            "session" => Ok(serde_json::from_str(DEFAULT_SESSION_CONFIG)?),
            other => Err(DataError::UnknownConfig(other.to_string())),
        }
    }
}

/// Trait for abstracting save/load operations
/// Platform-specific implementations should provide this
pub trait GameStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), Self::Error>;

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded.
    fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, Self::Error>;

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    fn delete_save(&self, save_name: &str) -> Result<(), Self::Error>;
}

/// Main game engine for managing game sessions
pub struct GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    data_loader: L,
    storage: S,
}

impl<L, S> GameEngine<L, S>
where
    L: DataLoader,
    S: GameStorage,
{
    /// Create a new game engine with the provided data loader and storage
    pub const fn new(data_loader: L, storage: S) -> Self {
        Self {
            data_loader,
            storage,
        }
    }

    /// Session rules as configured by the data loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the session configuration cannot be loaded.
    pub fn session_config(&self) -> Result<SessionConfig, L::Error> {
        self.data_loader.load_config("session")
    }

    /// Open a lobby for `code` with freshly loaded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck, bosses, or configuration cannot be loaded.
    pub fn create_session(&self, code: GameCode) -> Result<GameSession, L::Error> {
        let config = self.session_config()?;
        let deck = self.data_loader.load_deck()?;
        let bosses = self.data_loader.load_bosses()?;
        Ok(GameSession::new(code, config, deck, bosses))
    }

    /// Build a registry whose sessions share the loaded data.
    ///
    /// # Errors
    ///
    /// Returns an error if the deck, bosses, or configuration cannot be loaded.
    pub fn create_registry(&self) -> Result<SessionRegistry, L::Error> {
        let config = self.session_config()?;
        let deck = self.data_loader.load_deck()?;
        let bosses = self.data_loader.load_bosses()?;
        Ok(SessionRegistry::new(deck, bosses, config))
    }

    /// Save a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be saved.
    pub fn save_session(&self, save_name: &str, session: &GameSession) -> Result<(), S::Error> {
        self.storage.save_session(save_name, session)
    }

    /// Load a session snapshot
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be loaded or rehydrated.
    pub fn load_session(&self, save_name: &str) -> Result<Option<GameSession>, anyhow::Error>
    where
        L::Error: Into<anyhow::Error>,
        S::Error: Into<anyhow::Error>,
    {
        if let Some(session) = self.storage.load_session(save_name).map_err(Into::into)? {
            // Rehydrate with fresh data
            let deck = self.data_loader.load_deck().map_err(Into::into)?;
            let bosses = self.data_loader.load_bosses().map_err(Into::into)?;
            Ok(Some(session.rehydrate(deck, bosses)))
        } else {
            Ok(None)
        }
    }

    /// Delete a saved session
    ///
    /// # Errors
    ///
    /// Returns an error if the save cannot be deleted.
    pub fn delete_session(&self, save_name: &str) -> Result<(), S::Error> {
        self.storage.delete_save(save_name)
    }
}
