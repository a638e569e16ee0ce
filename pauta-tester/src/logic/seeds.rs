use anyhow::{Result, bail};
use pauta_game::GameCode;
use std::collections::HashMap;

/// Seed requested on the command line, with the game code it came from.
#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<GameCode>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    /// A table seeded like the game opened under `code`.
    #[must_use]
    pub fn from_game_code(code: GameCode) -> Self {
        Self {
            seed: code.seed(),
            code: Some(code),
        }
    }
}

/// Resolve CLI seed tokens: integers (negatives by magnitude) or six-character game codes.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Ok(code) = GameCode::parse(token) {
            pending.push(SeedInfo::from_game_code(code));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for info in pending {
        if let Some(entry) = index.get(&info.seed).and_then(|&at| deduped.get_mut(at)) {
            if entry.code.is_none() && info.code.is_some() {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}
