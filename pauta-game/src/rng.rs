//! Deterministic per-session random streams.
//!
//! Each concern draws from its own `ChaCha20Rng`, keyed off the session seed
//! with HMAC-SHA256 domain separation, so reseating players never perturbs
//! the card sequence. Stream positions survive serialization, which lets a
//! saved session resume exactly where it stopped.
use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::constants::{RNG_DOMAIN_DECK, RNG_DOMAIN_SEATING};

/// Derive an independent stream seed for `domain_tag` from the session seed.
#[must_use]
pub fn derive_stream_seed(session_seed: u64, domain_tag: &[u8]) -> u64 {
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(&session_seed.to_le_bytes()) else {
        return session_seed;
    };
    mac.update(domain_tag);
    let digest = mac.finalize().into_bytes();
    let mut seed_bytes = [0_u8; 8];
    seed_bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(seed_bytes)
}

/// Serialized form of [`SessionRng`]: the seed plus each stream's word position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSnapshot {
    pub seed: u64,
    pub deck_word_pos: u128,
    pub seating_word_pos: u128,
}

/// Card-draw and seating streams for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "StreamSnapshot", into = "StreamSnapshot")]
pub struct SessionRng {
    seed: u64,
    deck: ChaCha20Rng,
    seating: ChaCha20Rng,
}

impl SessionRng {
    #[must_use]
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            deck: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, RNG_DOMAIN_DECK)),
            seating: ChaCha20Rng::seed_from_u64(derive_stream_seed(seed, RNG_DOMAIN_SEATING)),
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Stream used for card draws.
    pub const fn deck(&mut self) -> &mut ChaCha20Rng {
        &mut self.deck
    }

    /// Stream used for opportunist rolls at seating time.
    pub const fn seating(&mut self) -> &mut ChaCha20Rng {
        &mut self.seating
    }
}

impl From<StreamSnapshot> for SessionRng {
    fn from(snapshot: StreamSnapshot) -> Self {
        let mut rng = Self::from_seed(snapshot.seed);
        rng.deck.set_word_pos(snapshot.deck_word_pos);
        rng.seating.set_word_pos(snapshot.seating_word_pos);
        rng
    }
}

impl From<SessionRng> for StreamSnapshot {
    fn from(rng: SessionRng) -> Self {
        Self {
            seed: rng.seed,
            deck_word_pos: rng.deck.get_word_pos(),
            seating_word_pos: rng.seating.get_word_pos(),
        }
    }
}
