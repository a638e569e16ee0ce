//! Government roles and the modifiers they apply to raw card effects.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::indicators::Indicator;
use crate::numbers::{Rounding, scale_i32};

/// Scaling applied to a raw effect magnitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Modifier {
    pub factor: f64,
    pub rounding: Rounding,
}

impl Modifier {
    pub const DOUBLE: Self = Self {
        factor: 2.0,
        rounding: Rounding::Nearest,
    };
    pub const BOOST: Self = Self {
        factor: 1.5,
        rounding: Rounding::Up,
    };
    pub const HALVE: Self = Self {
        factor: 0.5,
        rounding: Rounding::Down,
    };

    #[must_use]
    pub fn apply(self, change: i32) -> i32 {
        scale_i32(change, self.factor, self.rounding)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Role {
    MinisterOfEducation,
    EconomyManager,
    Agriculture,
    Religious,
    Influencer,
    MilitaryCommander,
}

impl Role {
    /// Seating order used when players join a lobby.
    pub const ALL: [Self; 6] = [
        Self::MinisterOfEducation,
        Self::EconomyManager,
        Self::Influencer,
        Self::Agriculture,
        Self::Religious,
        Self::MilitaryCommander,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::MinisterOfEducation => "ministerOfEducation",
            Self::EconomyManager => "economyManager",
            Self::Agriculture => "agriculture",
            Self::Religious => "religious",
            Self::Influencer => "influencer",
            Self::MilitaryCommander => "militaryCommander",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::MinisterOfEducation => "Ministro da Educação",
            Self::EconomyManager => "Gestor da Economia",
            Self::Agriculture => "Agricultura",
            Self::Religious => "Líder Religioso",
            Self::Influencer => "Influencer",
            Self::MilitaryCommander => "Comandante Militar",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::MinisterOfEducation => "Efeito dobrado em ações para Educação.",
            Self::EconomyManager => "Gera recursos mais facilmente.",
            Self::Agriculture => "Reduz a Fome com menos custo.",
            Self::Religious => "Aumenta o Bem-Estar e Apoio Popular.",
            Self::Influencer => "Manipula o Apoio Popular facilmente.",
            Self::MilitaryCommander => "Evita que indicadores caiam em crises.",
        }
    }

    /// Modifier for an indicator effect, if this role has one.
    ///
    /// Each role owns at most one rule, so no two rules can fire for the
    /// same effect.
    #[must_use]
    pub fn indicator_modifier(self, indicator: Indicator, change: i32) -> Option<Modifier> {
        match (self, indicator) {
            (Self::MinisterOfEducation, Indicator::Education) if change > 0 => {
                Some(Modifier::DOUBLE)
            }
            (Self::Influencer, Indicator::PopularSupport) => Some(Modifier::DOUBLE),
            (Self::Agriculture, Indicator::Hunger) if change < 0 => Some(Modifier::DOUBLE),
            (Self::Religious, Indicator::WellBeing | Indicator::PopularSupport) if change > 0 => {
                Some(Modifier::BOOST)
            }
            (Self::MilitaryCommander, _) if change < 0 => Some(Modifier::HALVE),
            _ => None,
        }
    }

    /// Modifier for a capital effect, if this role has one.
    #[must_use]
    pub const fn capital_modifier(self, change: i32) -> Option<Modifier> {
        match self {
            Self::EconomyManager if change > 0 => Some(Modifier::BOOST),
            _ => None,
        }
    }

    #[must_use]
    pub fn adjust_indicator(self, indicator: Indicator, change: i32) -> i32 {
        self.indicator_modifier(indicator, change)
            .map_or(change, |modifier| modifier.apply(change))
    }

    #[must_use]
    pub fn adjust_capital(self, change: i32) -> i32 {
        self.capital_modifier(change)
            .map_or(change, |modifier| modifier.apply(change))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}
