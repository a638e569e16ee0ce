//! Short, shareable game codes.
//! Format: six characters from an alphabet without look-alikes, e.g. `K7MQ2X`.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::GAME_CODE_LEN;

/// 32 symbols: no `0/O` or `1/I`.
pub const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Trim and uppercase user input, as the lobby does before a lookup.
#[must_use]
pub fn normalize_code(input: &str) -> String {
    input.trim().to_ascii_uppercase()
}

#[must_use]
pub fn is_valid_code(code: &str) -> bool {
    code.len() == GAME_CODE_LEN && code.bytes().all(|b| CODE_ALPHABET.contains(&b))
}

/// A validated, normalized game code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GameCode(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid game code: {0:?}")]
pub struct InvalidCode(pub String);

impl GameCode {
    /// Parse user input, normalizing case and whitespace first.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCode`] when the normalized text is not a well-formed code.
    pub fn parse(input: &str) -> Result<Self, InvalidCode> {
        let code = normalize_code(input);
        if is_valid_code(&code) {
            Ok(Self(code))
        } else {
            Err(InvalidCode(input.to_string()))
        }
    }

    /// Derive a code from arbitrary entropy, mixed so nearby inputs diverge.
    #[must_use]
    pub fn from_entropy(entropy: u64) -> Self {
        let mut buf = [0_u8; 13];
        buf[..5].copy_from_slice(b"PAUTA");
        buf[5..].copy_from_slice(&entropy.to_le_bytes());
        let mut hash = fnv1a64(&buf);
        let mut code = String::with_capacity(GAME_CODE_LEN);
        for _ in 0..GAME_CODE_LEN {
            let idx = usize::try_from(hash & 0x1F).unwrap_or(0);
            code.push(char::from(CODE_ALPHABET[idx]));
            hash >>= 5;
        }
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Stable seed for the session's random streams.
    #[must_use]
    pub fn seed(&self) -> u64 {
        fnv1a64(self.0.as_bytes())
    }
}

impl fmt::Display for GameCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for GameCode {
    type Err = InvalidCode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for GameCode {
    type Error = InvalidCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<GameCode> for String {
    fn from(code: GameCode) -> Self {
        code.0
    }
}

impl AsRef<str> for GameCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
