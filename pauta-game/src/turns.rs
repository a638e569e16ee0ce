//! Turn rotation and card draws.
use rand::Rng;

use crate::data::{DecisionCard, Deck};

/// Pass the turn to the next seat; the round counter only moves when seat 0 comes up again.
///
/// A player count of zero leaves both values untouched.
#[must_use]
pub const fn advance_turn(current_index: usize, player_count: usize, turn: u32) -> (usize, u32) {
    if player_count == 0 {
        return (current_index, turn);
    }
    let next_index = (current_index + 1) % player_count;
    let next_turn = if next_index == 0 {
        turn.saturating_add(1)
    } else {
        turn
    };
    (next_index, next_turn)
}

/// Draw a card uniformly, avoiding an immediate repeat of `previous` when the deck allows it.
#[must_use]
pub fn draw_card<'a, R: Rng + ?Sized>(
    deck: &'a Deck,
    previous: Option<&str>,
    rng: &mut R,
) -> Option<&'a DecisionCard> {
    let candidates: Vec<&DecisionCard> = deck
        .cards
        .iter()
        .filter(|card| previous != Some(card.id.as_str()))
        .collect();
    if candidates.is_empty() {
        return deck.cards.first();
    }
    let idx = rng.gen_range(0..candidates.len());
    candidates.get(idx).copied()
}
