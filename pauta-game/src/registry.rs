//! Live sessions keyed by game code.
//!
//! Each session sits behind its own mutex. Submissions never queue: a second
//! writer arriving while the lock is held gets [`RegistryError::Busy`], and a
//! writer holding an outdated version gets a stale-state rejection. Both are
//! retriable.
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock, TryLockError};
use thiserror::Error;

use crate::code::{GameCode, InvalidCode};
use crate::constants::GAME_CODE_ATTEMPTS;
use crate::data::{BossRoster, Deck};
use crate::endgame::WinAdvisor;
use crate::session::{DecisionError, DecisionReport, GameSession, LobbyError, SessionConfig};
use crate::state::Player;

#[cfg(feature = "async")]
use crate::endgame::{AsyncWinAdvisor, consult_with_timeout};

pub type SharedSession = Arc<Mutex<GameSession>>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("no game with code {0}")]
    NotFound(GameCode),
    #[error(transparent)]
    InvalidCode(#[from] InvalidCode),
    #[error("game {0} is busy with another decision")]
    Busy(GameCode),
    #[error("game {0} is unavailable after a crashed writer")]
    Poisoned(GameCode),
    #[error("session table lock poisoned")]
    TablePoisoned,
    #[error("could not allocate a free game code")]
    CodeSpaceExhausted,
    #[error(transparent)]
    Decision(#[from] DecisionError),
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}

impl RegistryError {
    /// Whether the caller should refresh and try again.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        match self {
            Self::Busy(_) => true,
            Self::Decision(err) => err.is_retriable(),
            _ => false,
        }
    }
}

/// Thread-safe table of running games sharing one deck and boss roster.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<GameCode, SharedSession>>,
    deck: Deck,
    bosses: BossRoster,
    config: SessionConfig,
}

impl SessionRegistry {
    #[must_use]
    pub fn new(deck: Deck, bosses: BossRoster, config: SessionConfig) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            deck,
            bosses,
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Open a lobby under a fresh code derived from `entropy`.
    ///
    /// # Errors
    ///
    /// Fails when every candidate code is taken or the table lock is poisoned.
    pub fn create(&self, entropy: u64) -> Result<GameCode, RegistryError> {
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RegistryError::TablePoisoned)?;
        let code = (0..GAME_CODE_ATTEMPTS)
            .map(|attempt| GameCode::from_entropy(entropy.wrapping_add(attempt)))
            .find(|code| !sessions.contains_key(code))
            .ok_or(RegistryError::CodeSpaceExhausted)?;
        let session = GameSession::new(
            code.clone(),
            self.config,
            self.deck.clone(),
            self.bosses.clone(),
        );
        sessions.insert(code.clone(), Arc::new(Mutex::new(session)));
        debug!("opened game {code}");
        Ok(code)
    }

    /// Look up a session by user-typed code.
    ///
    /// # Errors
    ///
    /// Fails for malformed or unknown codes.
    pub fn get(&self, code: &str) -> Result<SharedSession, RegistryError> {
        self.lookup(code).map(|(_, shared)| shared)
    }

    fn lookup(&self, code: &str) -> Result<(GameCode, SharedSession), RegistryError> {
        let code = GameCode::parse(code)?;
        let sessions = self
            .sessions
            .read()
            .map_err(|_| RegistryError::TablePoisoned)?;
        match sessions.get(&code) {
            Some(shared) => Ok((code, Arc::clone(shared))),
            None => Err(RegistryError::NotFound(code)),
        }
    }

    /// Drop a session, returning whether it existed.
    ///
    /// # Errors
    ///
    /// Fails for malformed codes or a poisoned table.
    pub fn remove(&self, code: &str) -> Result<bool, RegistryError> {
        let code = GameCode::parse(code)?;
        let mut sessions = self
            .sessions
            .write()
            .map_err(|_| RegistryError::TablePoisoned)?;
        Ok(sessions.remove(&code).is_some())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sessions.read().map_or(0, |sessions| sessions.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `f` with exclusive access to one session, refusing to wait for a busy one.
    ///
    /// # Errors
    ///
    /// Fails for unknown codes, a session held by another writer, or a poisoned lock.
    pub fn with_session<R>(
        &self,
        code: &str,
        f: impl FnOnce(&mut GameSession) -> R,
    ) -> Result<R, RegistryError> {
        let (code, shared) = self.lookup(code)?;
        let mut guard = lock_now(&code, &shared)?;
        Ok(f(&mut guard))
    }

    /// Clone of the session as it stands. Reads wait for a writer to finish
    /// instead of failing with [`RegistryError::Busy`].
    ///
    /// # Errors
    ///
    /// Fails for unknown codes or a poisoned lock.
    pub fn snapshot(&self, code: &str) -> Result<GameSession, RegistryError> {
        let (code, shared) = self.lookup(code)?;
        let guard = lock_wait(&code, &shared)?;
        Ok(guard.clone())
    }

    /// # Errors
    ///
    /// Lobby rejections plus lookup failures.
    pub fn join(&self, code: &str, name: &str) -> Result<Player, RegistryError> {
        self.with_session(code, |session| session.join(name).cloned())?
            .map_err(RegistryError::from)
    }

    /// # Errors
    ///
    /// Lobby rejections plus lookup failures.
    pub fn start(&self, code: &str) -> Result<u64, RegistryError> {
        self.with_session(code, |session| session.start().map(|()| session.version()))?
            .map_err(RegistryError::from)
    }

    /// # Errors
    ///
    /// Lobby rejections plus lookup failures.
    pub fn restart(&self, code: &str) -> Result<u64, RegistryError> {
        self.with_session(code, |session| session.restart().map(|()| session.version()))?
            .map_err(RegistryError::from)
    }

    /// Apply one decision under the session lock.
    ///
    /// # Errors
    ///
    /// Decision rejections plus lookup and locking failures.
    pub fn submit(
        &self,
        code: &str,
        player_id: &str,
        option_id: &str,
        expected_version: u64,
        advisor: &dyn WinAdvisor,
    ) -> Result<DecisionReport, RegistryError> {
        self.with_session(code, |session| {
            session.apply_decision(player_id, option_id, expected_version, advisor)
        })?
        .map_err(RegistryError::from)
    }

    /// Apply one decision, releasing the session lock while the advisor runs.
    ///
    /// The decision is computed against `expected_version` and only written if
    /// the session is still at that version afterwards.
    ///
    /// # Errors
    ///
    /// Decision rejections plus lookup and locking failures.
    #[cfg(feature = "async")]
    pub async fn submit_async<A>(
        &self,
        code: &str,
        player_id: &str,
        option_id: &str,
        expected_version: u64,
        advisor: &A,
    ) -> Result<DecisionReport, RegistryError>
    where
        A: AsyncWinAdvisor + ?Sized,
    {
        let (code, shared) = self.lookup(code)?;
        let pending = {
            let guard = lock_now(&code, &shared)?;
            guard.prepare(player_id, option_id, expected_version)?
        };
        let advisory = if pending.needs_advisory() {
            let timeout = self.config.advisory_timeout();
            Some(consult_with_timeout(advisor, pending.advisory_input(), timeout).await)
        } else {
            None
        };
        let mut guard = lock_now(&code, &shared)?;
        Ok(guard.commit(pending, advisory)?)
    }
}

fn lock_wait<'a>(
    code: &GameCode,
    shared: &'a SharedSession,
) -> Result<MutexGuard<'a, GameSession>, RegistryError> {
    shared.lock().map_err(|_| {
        warn!("session {code} lock poisoned");
        RegistryError::Poisoned(code.clone())
    })
}

fn lock_now<'a>(
    code: &GameCode,
    shared: &'a SharedSession,
) -> Result<MutexGuard<'a, GameSession>, RegistryError> {
    match shared.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(RegistryError::Busy(code.clone())),
        Err(TryLockError::Poisoned(_)) => {
            warn!("session {code} lock poisoned");
            Err(RegistryError::Poisoned(code.clone()))
        }
    }
}
