//! Advisory collaborators the tester can put behind a table.
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use clap::ValueEnum;
use pauta_game::{
    AdvisoryError, AdvisoryInput, AdvisoryVerdict, AsyncWinAdvisor, LocalAdvisor, OfflineAdvisor,
    WinAdvisor,
};

/// Timeout applied to tables with the flaky advisor.
pub const FLAKY_TIMEOUT_MS: u64 = 25;
/// How long a stalled flaky call sleeps; always past the timeout.
pub const FLAKY_STALL_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum AdvisorKind {
    /// Deterministic rules answered in-process
    Local,
    /// Every call fails, forcing the fallback
    Offline,
    /// Cycles through answering, failing, and stalling past the timeout
    Flaky,
}

impl AdvisorKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Offline => "offline",
            Self::Flaky => "flaky",
        }
    }

    /// Advisor for the `call`-th consultation of a run.
    #[must_use]
    pub const fn for_call(self, call: u64) -> TableAdvisor {
        let behaviour = match self {
            Self::Local => Behaviour::Answer,
            Self::Offline => Behaviour::Offline,
            Self::Flaky => match call % 3 {
                0 => Behaviour::Answer,
                1 => Behaviour::Drop,
                _ => Behaviour::Stall,
            },
        };
        TableAdvisor {
            behaviour,
            stall: Duration::from_millis(FLAKY_STALL_MS),
        }
    }

    /// Advisory timeout the table should run with, if this advisor needs a tighter one.
    #[must_use]
    pub const fn timeout_override_ms(self) -> Option<u64> {
        match self {
            Self::Flaky => Some(FLAKY_TIMEOUT_MS),
            Self::Local | Self::Offline => None,
        }
    }
}

impl fmt::Display for AdvisorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Answer,
    Offline,
    Drop,
    Stall,
}

/// One consultation's advisor, answering with the local rules unless its
/// behaviour says otherwise.
#[derive(Debug, Clone, Copy)]
pub struct TableAdvisor {
    behaviour: Behaviour,
    stall: Duration,
}

#[async_trait]
impl AsyncWinAdvisor for TableAdvisor {
    async fn evaluate(&self, input: &AdvisoryInput) -> Result<AdvisoryVerdict, AdvisoryError> {
        match self.behaviour {
            Behaviour::Answer => WinAdvisor::evaluate(&LocalAdvisor, input),
            Behaviour::Offline => AsyncWinAdvisor::evaluate(&OfflineAdvisor, input).await,
            Behaviour::Drop => Err(AdvisoryError::Unavailable(
                "flaky advisor dropped the call".to_string(),
            )),
            Behaviour::Stall => {
                tokio::time::sleep(self.stall).await;
                WinAdvisor::evaluate(&LocalAdvisor, input)
            }
        }
    }
}
