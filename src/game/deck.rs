//! Card deck: per-color active and discard pools.
//!
//! Both colors share the same lifecycle: cards are dealt from the front of
//! a shuffled `active` pool, spent cards land on the `discard` pile, and
//! the discard pile is shuffled back in once it outgrows twice the active
//! pool. No card is ever created or destroyed here, so for each color
//! `active + discard + cards in circulation` always equals the number of
//! cards introduced through the catalog or `add_card`.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::VecDeque;

use super::entities::{Card, CardColor};
use super::errors::GameError;

#[derive(Debug, Default)]
struct Pool {
    active: VecDeque<Card>,
    discard: Vec<Card>,
}

impl Pool {
    fn recycle(&mut self, rng: &mut StdRng) {
        self.active.extend(self.discard.drain(..));
        self.active.make_contiguous().shuffle(rng);
    }
}

#[derive(Debug)]
pub struct Deck {
    prompts: Pool,
    responses: Pool,
    introduced_prompts: usize,
    introduced_responses: usize,
}

impl Deck {
    /// Build a deck from the loaded catalog, shuffling both colors.
    #[must_use]
    pub fn new(catalog: Vec<Card>, rng: &mut StdRng) -> Self {
        let mut deck = Self {
            prompts: Pool::default(),
            responses: Pool::default(),
            introduced_prompts: 0,
            introduced_responses: 0,
        };
        for card in catalog {
            deck.add_card(card);
        }
        deck.prompts.active.make_contiguous().shuffle(rng);
        deck.responses.active.make_contiguous().shuffle(rng);
        deck
    }

    fn pool(&self, color: CardColor) -> &Pool {
        match color {
            CardColor::Prompt => &self.prompts,
            CardColor::Response => &self.responses,
        }
    }

    fn pool_mut(&mut self, color: CardColor) -> &mut Pool {
        match color {
            CardColor::Prompt => &mut self.prompts,
            CardColor::Response => &mut self.responses,
        }
    }

    fn draw(pool: &mut Pool, color: CardColor, rng: &mut StdRng) -> Result<Card, GameError> {
        if pool.active.is_empty() {
            if pool.discard.is_empty() {
                return Err(GameError::DeckExhausted(color));
            }
            pool.recycle(rng);
        }
        pool.active
            .pop_front()
            .ok_or(GameError::DeckExhausted(color))
    }

    /// Draw the next prompt card.
    pub fn draw_prompt(&mut self, rng: &mut StdRng) -> Result<Card, GameError> {
        Self::draw(&mut self.prompts, CardColor::Prompt, rng)
    }

    /// Top a hand up to `hand_size` response cards. All-or-nothing: when
    /// the response pools run dry mid-deal, the drawn cards go back and the
    /// hand is left untouched.
    pub fn deal_hand(
        &mut self,
        hand: &mut Vec<Card>,
        hand_size: usize,
        rng: &mut StdRng,
    ) -> Result<(), GameError> {
        let mut drawn = Vec::new();
        while hand.len() + drawn.len() < hand_size {
            match Self::draw(&mut self.responses, CardColor::Response, rng) {
                Ok(card) => drawn.push(card),
                Err(e) => {
                    self.responses.active.extend(drawn);
                    return Err(e);
                }
            }
        }
        hand.append(&mut drawn);
        Ok(())
    }

    /// Move spent cards onto the named discard pile.
    pub fn discard(&mut self, cards: impl IntoIterator<Item = Card>, color: CardColor) {
        self.pool_mut(color).discard.extend(cards);
    }

    /// Shuffle the discard pile back into the active pool once it has grown
    /// beyond twice the active pool's size. Below the threshold this is a
    /// no-op, so calling it every reset is safe.
    pub fn replenish(&mut self, color: CardColor, rng: &mut StdRng) {
        let pool = self.pool_mut(color);
        if pool.discard.len() > 2 * pool.active.len() {
            pool.recycle(rng);
        }
    }

    /// Insert a newly authored card at the back of its color's active pool.
    pub fn add_card(&mut self, card: Card) {
        match card.color {
            CardColor::Prompt => self.introduced_prompts += 1,
            CardColor::Response => self.introduced_responses += 1,
        }
        let color = card.color;
        self.pool_mut(color).active.push_back(card);
    }

    #[must_use]
    pub fn active_len(&self, color: CardColor) -> usize {
        self.pool(color).active.len()
    }

    #[must_use]
    pub fn discard_len(&self, color: CardColor) -> usize {
        self.pool(color).discard.len()
    }

    /// Total cards of this color ever introduced (catalog plus runtime
    /// additions). Used to verify card conservation.
    #[must_use]
    pub fn introduced(&self, color: CardColor) -> usize {
        match color {
            CardColor::Prompt => self.introduced_prompts,
            CardColor::Response => self.introduced_responses,
        }
    }
}
