//! National indicators and their bounds.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{INDICATOR_MAX, INDICATOR_MIN};

/// Whether a rising value helps or hurts the nation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsBetter,
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Indicator {
    Economy,
    Education,
    WellBeing,
    PopularSupport,
    Hunger,
    MilitaryReligion,
}

impl Indicator {
    pub const ALL: [Self; 6] = [
        Self::Economy,
        Self::Education,
        Self::WellBeing,
        Self::PopularSupport,
        Self::Hunger,
        Self::MilitaryReligion,
    ];

    /// Indicators whose floor collapses the nation.
    pub const ESSENTIAL: [Self; 5] = [
        Self::Economy,
        Self::Education,
        Self::WellBeing,
        Self::PopularSupport,
        Self::MilitaryReligion,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Economy => "economy",
            Self::Education => "education",
            Self::WellBeing => "wellBeing",
            Self::PopularSupport => "popularSupport",
            Self::Hunger => "hunger",
            Self::MilitaryReligion => "militaryReligion",
        }
    }

    /// Label shown to players in the effect log.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Economy => "Economia",
            Self::Education => "Educação",
            Self::WellBeing => "Bem-Estar",
            Self::PopularSupport => "Apoio Popular",
            Self::Hunger => "Fome (Inverso)",
            Self::MilitaryReligion => "Ordem e Coesão",
        }
    }

    #[must_use]
    pub const fn polarity(self) -> Polarity {
        match self {
            Self::Hunger => Polarity::LowerIsBetter,
            _ => Polarity::HigherIsBetter,
        }
    }

    /// Upper clamp applied after a mutation; hunger is only bounded below.
    #[must_use]
    pub const fn ceiling(self) -> Option<i32> {
        match self {
            Self::Hunger => None,
            _ => Some(INDICATOR_MAX),
        }
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|indicator| indicator.as_str().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

/// Current value of every national indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Indicators {
    pub economy: i32,
    pub education: i32,
    pub well_being: i32,
    pub popular_support: i32,
    pub hunger: i32,
    pub military_religion: i32,
}

impl Default for Indicators {
    fn default() -> Self {
        Self::initial()
    }
}

impl Indicators {
    /// Starting nation profile for a fresh game.
    #[must_use]
    pub const fn initial() -> Self {
        Self {
            economy: 7,
            education: 4,
            well_being: 5,
            popular_support: 5,
            hunger: 2,
            military_religion: 4,
        }
    }

    #[must_use]
    pub const fn get(&self, indicator: Indicator) -> i32 {
        match indicator {
            Indicator::Economy => self.economy,
            Indicator::Education => self.education,
            Indicator::WellBeing => self.well_being,
            Indicator::PopularSupport => self.popular_support,
            Indicator::Hunger => self.hunger,
            Indicator::MilitaryReligion => self.military_religion,
        }
    }

    const fn slot_mut(&mut self, indicator: Indicator) -> &mut i32 {
        match indicator {
            Indicator::Economy => &mut self.economy,
            Indicator::Education => &mut self.education,
            Indicator::WellBeing => &mut self.well_being,
            Indicator::PopularSupport => &mut self.popular_support,
            Indicator::Hunger => &mut self.hunger,
            Indicator::MilitaryReligion => &mut self.military_religion,
        }
    }

    /// Add `change` to an indicator and clamp it, returning the new value.
    pub fn apply(&mut self, indicator: Indicator, change: i32) -> i32 {
        let slot = self.slot_mut(indicator);
        let raised = slot.saturating_add(change);
        *slot = match indicator.ceiling() {
            Some(ceiling) => raised.clamp(INDICATOR_MIN, ceiling),
            None => raised.max(INDICATOR_MIN),
        };
        *slot
    }

    /// Overwrite an indicator, clamping the same way as [`Self::apply`].
    pub fn set(&mut self, indicator: Indicator, value: i32) {
        let slot = self.slot_mut(indicator);
        *slot = value;
        self.apply(indicator, 0);
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, i32)> + '_ {
        Indicator::ALL
            .into_iter()
            .map(move |indicator| (indicator, self.get(indicator)))
    }

    /// True when every value honours its clamp bounds.
    #[must_use]
    pub fn within_bounds(&self) -> bool {
        self.iter().all(|(indicator, value)| {
            value >= INDICATOR_MIN && indicator.ceiling().is_none_or(|ceiling| value <= ceiling)
        })
    }
}
