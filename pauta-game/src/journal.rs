//! Append-only audit trail shown to players.
use serde::{Deserialize, Serialize};

use crate::boss::BossOutcome;
use crate::constants::{
    BOSS_BLOCKED_EFFECT, BOSS_CLEARED_EFFECT, BOSS_ROLE_LABEL, GAME_OVER_EFFECT,
    GAME_OVER_ROLE_LABEL, SYSTEM_NAME,
};
use crate::state::Player;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: u64,
    pub turn: u32,
    pub player_name: String,
    pub player_role: String,
    pub decision: String,
    pub effects: String,
}

impl LogEntry {
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.player_name == SYSTEM_NAME
    }
}

/// Entry contents before the journal stamps an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
    pub turn: u32,
    pub player_name: String,
    pub player_role: String,
    pub decision: String,
    pub effects: String,
}

impl LogDraft {
    #[must_use]
    pub fn decision(turn: u32, player: &Player, decision: &str, effects: String) -> Self {
        Self {
            turn,
            player_name: player.name.clone(),
            player_role: player.role_label().to_string(),
            decision: decision.to_string(),
            effects,
        }
    }

    /// System line for a boss encounter; `None` when no boss was involved.
    #[must_use]
    pub fn boss(turn: u32, outcome: &BossOutcome) -> Option<Self> {
        let (decision, effects) = match outcome {
            BossOutcome::None => return None,
            BossOutcome::Blocked(boss) => {
                (format!("Falha ao enfrentar {}", boss.name), BOSS_BLOCKED_EFFECT)
            }
            BossOutcome::Cleared(boss) => {
                (format!("Vitória sobre {}", boss.name), BOSS_CLEARED_EFFECT)
            }
        };
        Some(Self::system(turn, BOSS_ROLE_LABEL, decision, effects))
    }

    #[must_use]
    pub fn game_over(turn: u32, message: &str) -> Self {
        Self::system(turn, GAME_OVER_ROLE_LABEL, message.to_string(), GAME_OVER_EFFECT)
    }

    fn system(turn: u32, role: &str, decision: String, effects: &str) -> Self {
        Self {
            turn,
            player_name: SYSTEM_NAME.to_string(),
            player_role: role.to_string(),
            decision,
            effects: effects.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Journal {
    entries: Vec<LogEntry>,
    next_id: u64,
}

impl Journal {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }

    /// Stamp and append an entry, returning its id.
    pub fn record(&mut self, draft: LogDraft) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id.saturating_add(1);
        self.entries.push(LogEntry {
            id,
            turn: draft.turn,
            player_name: draft.player_name,
            player_role: draft.player_role,
            decision: draft.decision,
            effects: draft.effects,
        });
        id
    }

    /// Entries in the order they were written.
    #[must_use]
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Entries most recent first, as the log panel lists them.
    pub fn newest_first(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().rev()
    }

    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.last()
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry; ids keep increasing so stale references never alias.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Boss, BossRequirement};
    use crate::indicators::Indicator;
    use crate::roles::Role;

    fn boss() -> Boss {
        Boss {
            id: String::from("boss2"),
            name: String::from("Corrupção Sistêmica"),
            position: 12,
            requirement: BossRequirement {
                indicator: Indicator::PopularSupport,
                level: 6,
            },
        }
    }

    #[test]
    fn ids_increase_and_survive_clear() {
        let mut journal = Journal::new();
        let player = Player::new("p1", "Ana", Role::Agriculture, false);
        let first = journal.record(LogDraft::decision(1, &player, "Plantar", String::from("Fome (Inverso) -4")));
        let second = journal.record(LogDraft::game_over(1, "fim"));
        assert_eq!((first, second), (1, 2));
        journal.clear();
        assert!(journal.is_empty());
        assert_eq!(journal.record(LogDraft::game_over(2, "fim")), 3);
    }

    #[test]
    fn decision_entry_uses_role_label() {
        let mut journal = Journal::new();
        let mut player = Player::new("p3", "Caio", Role::Religious, false);
        player.title = Some(String::from("Bispo"));
        journal.record(LogDraft::decision(4, &player, "Culto", String::from("Nenhum efeito.")));
        let entry = journal.last().unwrap();
        assert_eq!(entry.player_role, "Bispo");
        assert_eq!(entry.turn, 4);
        assert!(!entry.is_system());
    }

    #[test]
    fn boss_entries_are_system_lines() {
        let blocked = LogDraft::boss(2, &BossOutcome::Blocked(boss())).unwrap();
        assert_eq!(blocked.player_name, "Sistema");
        assert_eq!(blocked.player_role, "Chefe");
        assert_eq!(blocked.decision, "Falha ao enfrentar Corrupção Sistêmica");
        assert_eq!(blocked.effects, "Progresso da nação regrediu.");

        let cleared = LogDraft::boss(2, &BossOutcome::Cleared(boss())).unwrap();
        assert_eq!(cleared.decision, "Vitória sobre Corrupção Sistêmica");
        assert_eq!(cleared.effects, "A nação avança!");

        assert!(LogDraft::boss(2, &BossOutcome::None).is_none());
    }

    #[test]
    fn newest_first_reverses_insertion() {
        let mut journal = Journal::new();
        journal.record(LogDraft::game_over(1, "a"));
        journal.record(LogDraft::game_over(1, "b"));
        let order: Vec<&str> = journal.newest_first().map(|e| e.decision.as_str()).collect();
        assert_eq!(order, vec!["b", "a"]);
        let json = serde_json::to_value(&journal).unwrap();
        assert_eq!(json["entries"][0]["playerRole"], "Fim de Jogo");
    }
}
