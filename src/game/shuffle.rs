use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::changer::StateChanger;
use super::error::{EngineError, EngineResult};
use super::state::GameState;

/// Randomly reorders one pile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shuffle {
    pile: String,
}

impl Shuffle {
    pub fn new(pile: impl Into<String>) -> Self {
        Self { pile: pile.into() }
    }

    pub fn pile(&self) -> &str {
        &self.pile
    }

    /// Marks the pile as shuffling without reordering it, so a UI can play
    /// its animation before `make` commits the permutation.
    pub fn animate(&self, state: &GameState) -> EngineResult<GameState> {
        let mut next = state.clone();
        next.get_pile_state_mut(&self.pile)?.is_shuffling = true;
        Ok(next)
    }

    /// Same as `make`, drawing the permutation from `rng`.
    pub fn make_with_rng<R: Rng + ?Sized>(
        &self,
        state: &GameState,
        rng: &mut R,
    ) -> EngineResult<GameState> {
        let mut next = state.clone();
        let pile = next.get_pile_state_mut(&self.pile)?;
        pile.is_shuffling = false;
        pile.cards.shuffle(rng);
        Ok(next)
    }
}

impl StateChanger for Shuffle {
    fn name(&self) -> &'static str {
        "shuffle"
    }

    fn validate(&self, state: &GameState) -> EngineResult<()> {
        let pile = state.get_pile_state(&self.pile)?;
        if pile.cards.is_empty() {
            return Err(EngineError::invalid(format!("pile {} has no cards", self.pile)));
        }
        Ok(())
    }

    fn make(&self, state: &GameState) -> EngineResult<GameState> {
        self.make_with_rng(state, &mut SmallRng::from_entropy())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut cards: Vec<String>) -> Vec<String> {
        cards.sort();
        cards
    }

    #[test]
    fn rejects_missing_or_empty_piles() {
        let state = GameState::sample();
        assert!(Shuffle::new("player1Deck").is_valid(&state));
        assert!(!Shuffle::new("player1Hand").is_valid(&state));
        assert!(!Shuffle::new("nope").is_valid(&state));
    }

    #[test]
    fn animate_flags_without_reordering() {
        let state = GameState::sample();
        let shuffle = Shuffle::new("player1Deck");

        let animated = shuffle.animate(&state).expect("deck exists");
        let pile = animated.get_pile_state("player1Deck").expect("deck exists");

        assert!(pile.is_shuffling);
        assert_eq!(pile.cards, state.piles["player1Deck"].cards);
        assert!(!state.piles["player1Deck"].is_shuffling);
    }

    #[test]
    fn make_produces_a_permutation() {
        let state = GameState::sample();
        let shuffle = Shuffle::new("player1Deck");
        let animated = shuffle.animate(&state).expect("deck exists");

        let shuffled = shuffle.make(&animated).expect("deck exists");
        let pile = shuffled.get_pile_state("player1Deck").expect("deck exists");

        assert!(!pile.is_shuffling);
        assert_eq!(
            sorted(pile.cards.clone()),
            sorted(state.piles["player1Deck"].cards.clone())
        );
        assert_eq!(shuffled.total_cards(), state.total_cards());
    }

    #[test]
    fn positions_are_roughly_uniform() {
        let state = GameState::sample();
        let shuffle = Shuffle::new("player1Deck");
        let cards = state.piles["player1Deck"].cards.clone();
        let n = cards.len();
        let trials = 12_000;
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        // counts[card][position]
        let mut counts = vec![vec![0usize; n]; n];

        for _ in 0..trials {
            let next = shuffle.make_with_rng(&state, &mut rng).expect("deck exists");
            for (position, card) in next.piles["player1Deck"].cards.iter().enumerate() {
                let card_index = cards.iter().position(|c| c == card).expect("same cards");
                counts[card_index][position] += 1;
            }
        }

        let expected = trials as f64 / n as f64;
        for row in &counts {
            for &count in row {
                let deviation = (count as f64 - expected).abs() / expected;
                assert!(deviation < 0.1, "positional bias: {count} vs {expected}");
            }
        }
    }
}
