//! The game session: a single state machine owning every mutable piece of
//! game state.
//!
//! All command handlers run against one `Session`. Each returns the output
//! events the transport should deliver; on error the session is left
//! exactly as it was. Abandonment (dealer departs, too few players, deck
//! runs out) is a forced reset, never a failure.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::constants::{HAND_SIZE, KICK_THRESHOLD, MIN_PLAYERS};
use super::deck::Deck;
use super::entities::{
    fill_blanks, normalize_loaded_card, normalize_prompt_text, normalize_response_text, Card,
    CardColor, Player, Username,
};
use super::errors::GameError;
use super::kick::KickArbiter;
use super::registry::PlayerRegistry;
use super::round::Round;

/// Session phase. `Join` accepts new players freely; `Play` collects
/// submissions; `Winner` waits on the dealer's pick.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Phase {
    Join,
    Play,
    Winner,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Join => "join",
            Self::Play => "play",
            Self::Winner => "winner",
        };
        write!(f, "{repr}")
    }
}

/// Tunable session settings.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct GameConfig {
    pub hand_size: usize,
    pub min_players: usize,
    pub kick_threshold: f64,
    /// Seed for the session RNG. `None` seeds from the OS; tests pass a
    /// fixed seed for reproducible shuffles and dealer rotation.
    pub rng_seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            hand_size: HAND_SIZE,
            min_players: MIN_PLAYERS,
            kick_threshold: KICK_THRESHOLD,
            rng_seed: None,
        }
    }
}

/// Chat-facing output produced by a command. The transport decides how to
/// deliver each one.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum Outgoing {
    /// Message for the whole room.
    Broadcast(GameEvent),
    /// Message for a single player.
    Notify(Username, GameEvent),
}

/// Events that the session emits as rounds progress.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    Joined { name: Username, needed: usize },
    ReadyToStart { name: Username },
    Queued { name: Username },
    Left { name: Username },
    Kicked { name: Username },
    Roster { players: Vec<Username>, queued: Vec<Username> },
    PromptRead { dealer: Username, prompt: String },
    HandListing { cards: Vec<String> },
    AllSubmitted,
    AnswerRevealed { number: usize, filled: String },
    ChooseWinnerHint { dealer: Username },
    RoundWon { winner: Username },
    TopScores { entries: Vec<(Username, u64)> },
    DealerLeft,
    NotEnoughPlayers,
    DeckOut { color: CardColor },
    CardAdded { text: String, color: CardColor },
    CardPersistFailed,
    ScorePersistFailed,
    PokePlay,
    DealerIdle,
    AlreadyPlayed { name: Username },
    NothingToDo,
    SelfPoke,
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Joined { name, needed } => {
                format!("[*] {name} has joined the game! Waiting for {needed} more player(s).")
            }
            Self::ReadyToStart { name } => format!(
                "[*] {name} has joined the game! There are now enough players to play!"
            ),
            Self::Queued { name } => format!("[*] {name} has joined the queue!"),
            Self::Left { name } => format!("{name} has left the game!"),
            Self::Kicked { name } => format!("{name} has been kicked from the game!"),
            Self::Roster { players, queued } => {
                let players = players
                    .iter()
                    .map(Username::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                if queued.is_empty() {
                    format!("[*] Current players: {players}.")
                } else {
                    let queued = queued
                        .iter()
                        .map(Username::as_str)
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("[*] Current players: {players}. Queued: {queued}.")
                }
            }
            Self::PromptRead { dealer, prompt } => format!("[*] {dealer} reads: {prompt}"),
            Self::HandListing { cards } => {
                format!("Your hand is: [{}]", cards.join(". "))
            }
            Self::AllSubmitted => "[*] All players have turned in their cards.".to_string(),
            Self::AnswerRevealed { number, filled } => {
                format!("[*] [Answer #{number}]: {filled}")
            }
            Self::ChooseWinnerHint { dealer } => {
                format!("{dealer}, please choose a winner.")
            }
            Self::RoundWon { winner } => format!("{winner}, you won this round! Congrats!"),
            Self::TopScores { entries } => entries
                .iter()
                .map(|(name, score)| format!("{name}: {score}"))
                .collect::<Vec<_>>()
                .join("\n"),
            Self::DealerLeft => "Game restarting... dealer left.".to_string(),
            Self::NotEnoughPlayers => {
                "There are less than 3 players playing now. Waiting for more players..."
                    .to_string()
            }
            Self::DeckOut { color } => {
                format!("The {color} deck is out of cards. Round abandoned.")
            }
            Self::CardAdded { text, color } => {
                format!("Card \"{text}\" ({color}) added to the deck!")
            }
            Self::CardPersistFailed => {
                "Your card is in play but could not be saved to the catalog.".to_string()
            }
            Self::ScorePersistFailed => {
                "The win counted, but the score could not be saved.".to_string()
            }
            Self::PokePlay => "Please play a card.".to_string(),
            Self::DealerIdle => "The dealer doesn't need to do anything right now.".to_string(),
            Self::AlreadyPlayed { name } => {
                format!("{name} has already played their cards!")
            }
            Self::NothingToDo => "Players do not need to do anything right now.".to_string(),
            Self::SelfPoke => "Why are you poking yourself?".to_string(),
        };
        write!(f, "{repr}")
    }
}

/// Result of a successful winner selection. The engine records the win
/// against the ledger after in-memory state has already advanced.
#[derive(Debug)]
pub struct WinnerOutcome {
    pub winner: Username,
    /// Active players at the moment of the win, for ledger backfill and the
    /// leaderboard broadcast.
    pub roster: Vec<Username>,
    pub events: Vec<Outgoing>,
}

/// Read-only per-player snapshot for the status command. The engine
/// attaches the persisted score.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct StatusSnapshot {
    pub name: Username,
    pub playing: bool,
    pub is_dealer: bool,
    pub hand: Vec<String>,
}

#[derive(Debug)]
pub struct Session {
    config: GameConfig,
    phase: Phase,
    deck: Deck,
    registry: PlayerRegistry,
    round: Option<Round>,
    kicks: KickArbiter,
    next_card_id: u64,
    rng: StdRng,
}

impl Session {
    /// Build a session from the catalog's cards. Card text is normalized
    /// leniently and both pools are shuffled.
    #[must_use]
    pub fn new(config: GameConfig, catalog: Vec<Card>) -> Self {
        let mut rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        let cards: Vec<Card> = catalog.into_iter().map(normalize_loaded_card).collect();
        let next_card_id = cards.iter().map(|c| c.id).max().map_or(1, |m| m + 1);
        let deck = Deck::new(cards, &mut rng);
        log::info!(
            "session ready: {} prompts, {} responses",
            deck.introduced(CardColor::Prompt),
            deck.introduced(CardColor::Response),
        );
        Self {
            config,
            phase: Phase::Join,
            deck,
            registry: PlayerRegistry::default(),
            round: None,
            kicks: KickArbiter::default(),
            next_card_id,
            rng,
        }
    }

    // === Commands ===

    /// Admit a player, or queue them when a round is running.
    pub fn join(&mut self, name: &Username) -> Result<Vec<Outgoing>, GameError> {
        if self.registry.contains(name) || self.registry.is_queued(name) {
            return Err(GameError::AlreadyJoined);
        }
        let mut out = Vec::new();
        match self.phase {
            Phase::Join => {
                let mut player = Player::new(name.clone());
                self.deck
                    .deal_hand(&mut player.hand, self.config.hand_size, &mut self.rng)?;
                self.registry.insert(player);
                log::info!("{name} joined; {} active", self.registry.player_count());
                if self.registry.player_count() >= self.config.min_players {
                    out.push(Outgoing::Broadcast(GameEvent::ReadyToStart {
                        name: name.clone(),
                    }));
                    out.extend(self.start_round());
                } else {
                    out.push(Outgoing::Broadcast(GameEvent::Joined {
                        name: name.clone(),
                        needed: self.config.min_players - self.registry.player_count(),
                    }));
                }
            }
            Phase::Play | Phase::Winner => {
                self.registry.queue_join(name.clone());
                log::info!("{name} queued for the next round");
                out.push(Outgoing::Broadcast(GameEvent::Queued { name: name.clone() }));
            }
        }
        out.push(self.roster_event());
        Ok(out)
    }

    /// Remove a player at their own request.
    pub fn leave(&mut self, name: &Username) -> Result<Vec<Outgoing>, GameError> {
        self.remove_player(name, false)
    }

    /// Submit response cards by 1-based hand index.
    pub fn play(&mut self, name: &Username, indices: &[usize]) -> Result<Vec<Outgoing>, GameError> {
        if !self.registry.contains(name) {
            return Err(GameError::NotInGame);
        }
        let Some(round) = self.round.as_ref() else {
            return Err(GameError::WrongPhase);
        };
        if round.dealer == *name {
            return Err(GameError::IsDealer);
        }
        if !round.is_respondent(name) {
            return Err(GameError::NotInGame);
        }
        let expected = round.prompt.blank_count();
        if self.phase != Phase::Play
            || round.has_submitted(name)
            || indices.len() != expected
        {
            return Err(GameError::InvalidSubmission { expected });
        }
        let hand_len = self.registry.player(name).map_or(0, |p| p.hand.len());
        let mut seen = HashSet::new();
        for &i in indices {
            if i == 0 || i > hand_len || !seen.insert(i) {
                return Err(GameError::InvalidSubmission { expected });
            }
        }

        let Some(player) = self.registry.player_mut(name) else {
            return Err(GameError::NotInGame);
        };
        // Keep the cards in selection order, then pop highest index first
        // so lower indices stay valid during removal.
        let picked: Vec<Card> = indices.iter().map(|&i| player.hand[i - 1].clone()).collect();
        let mut sorted = indices.to_vec();
        sorted.sort_unstable();
        for &i in sorted.iter().rev() {
            player.hand.remove(i - 1);
        }

        let Some(round) = self.round.as_mut() else {
            return Err(GameError::WrongPhase);
        };
        round.record_submission(name.clone(), picked);
        log::debug!(
            "{name} submitted; {}/{} answers in",
            round.submissions.len(),
            round.respondents.len()
        );
        let done = round.all_submitted();
        let mut out = Vec::new();
        if done {
            out.extend(self.reveal_answers());
        }
        Ok(out)
    }

    /// Dealer picks the winning answer by its revealed number.
    pub fn choose_winner(
        &mut self,
        name: &Username,
        answer: usize,
    ) -> Result<WinnerOutcome, GameError> {
        if self.phase != Phase::Winner {
            return Err(GameError::WrongPhase);
        }
        let Some(round) = self.round.as_ref() else {
            return Err(GameError::WrongPhase);
        };
        if round.dealer != *name {
            return Err(GameError::NotDealer);
        }
        if answer == 0 || answer > round.reveal_order.len() {
            return Err(GameError::InvalidSelection);
        }
        let winner = round.reveal_order[answer - 1].clone();
        let roster = self.registry.names();
        log::info!("{winner} won the round (answer #{answer})");
        let mut events = vec![Outgoing::Broadcast(GameEvent::RoundWon {
            winner: winner.clone(),
        })];
        events.extend(self.reset());
        Ok(WinnerOutcome {
            winner,
            roster,
            events,
        })
    }

    /// Record a kick vote; removes the target once the tally clears the
    /// threshold among `player_count - 1` eligible voters.
    pub fn vote_kick(
        &mut self,
        voter: &Username,
        target: &Username,
    ) -> Result<Vec<Outgoing>, GameError> {
        if !self.registry.contains(target) {
            return Err(GameError::UnknownTarget(target.clone()));
        }
        let votes = self.kicks.vote(voter, target)?;
        let eligible = self.registry.player_count().saturating_sub(1);
        log::debug!("kick vote against {target}: {votes}/{eligible}");
        if self.kicks.passes(target, eligible, self.config.kick_threshold) {
            self.remove_player(target, true)
        } else {
            Ok(Vec::new())
        }
    }

    /// Author a new card. Returns the card so the engine can persist it.
    pub fn add_card(
        &mut self,
        text: &str,
        color: &str,
    ) -> Result<(Card, Vec<Outgoing>), GameError> {
        let color: CardColor = color.parse()?;
        let text = match color {
            CardColor::Prompt => normalize_prompt_text(text)?,
            CardColor::Response => normalize_response_text(text)?,
        };
        let card = Card {
            id: self.next_card_id,
            text,
            color,
            official: false,
        };
        self.next_card_id += 1;
        self.deck.add_card(card.clone());
        log::info!("new {color} card added: {}", card.text);
        let out = vec![Outgoing::Broadcast(GameEvent::CardAdded {
            text: card.text.clone(),
            color,
        })];
        Ok((card, out))
    }

    /// Nudge an idle player with a reminder of what they owe the round.
    pub fn poke(
        &mut self,
        poker: &Username,
        target: &Username,
    ) -> Result<Vec<Outgoing>, GameError> {
        if !self.registry.contains(target) {
            return Err(GameError::UnknownTarget(target.clone()));
        }
        if poker == target {
            return Ok(vec![Outgoing::Notify(poker.clone(), GameEvent::SelfPoke)]);
        }
        match self.round.as_ref() {
            Some(round) if round.dealer == *target => {
                if self.phase == Phase::Winner {
                    Ok(self.answer_events())
                } else {
                    Ok(vec![Outgoing::Broadcast(GameEvent::DealerIdle)])
                }
            }
            Some(round) if self.phase == Phase::Play && round.is_respondent(target) => {
                if round.has_submitted(target) {
                    Ok(vec![Outgoing::Broadcast(GameEvent::AlreadyPlayed {
                        name: target.clone(),
                    })])
                } else {
                    Ok(vec![
                        Outgoing::Notify(target.clone(), GameEvent::PokePlay),
                        Outgoing::Notify(
                            target.clone(),
                            GameEvent::HandListing {
                                cards: self.hand_lines(target),
                            },
                        ),
                    ])
                }
            }
            _ => Ok(vec![Outgoing::Broadcast(GameEvent::NothingToDo)]),
        }
    }

    /// Read-only view of one player's standing.
    #[must_use]
    pub fn status(&self, name: &Username) -> StatusSnapshot {
        let playing = self.registry.contains(name);
        let is_dealer = self
            .round
            .as_ref()
            .is_some_and(|round| round.dealer == *name);
        StatusSnapshot {
            name: name.clone(),
            playing,
            is_dealer,
            hand: self.hand_lines(name),
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub fn round(&self) -> Option<&Round> {
        self.round.as_ref()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.registry.player_count()
    }

    #[must_use]
    pub fn roster(&self) -> Vec<Username> {
        self.registry.names()
    }

    #[must_use]
    pub fn queued(&self) -> Vec<Username> {
        self.registry.queued()
    }

    #[must_use]
    pub fn hand_of(&self, name: &Username) -> Option<&[Card]> {
        self.registry.player(name).map(|p| p.hand.as_slice())
    }

    /// Cards of a color currently accounted for: deck pools plus everything
    /// in circulation (hands, the drawn prompt, submissions). Always equals
    /// [`Self::cards_introduced`] for that color.
    #[must_use]
    pub fn card_census(&self, color: CardColor) -> usize {
        let mut n = self.deck.active_len(color) + self.deck.discard_len(color);
        match color {
            CardColor::Prompt => {
                if self.round.is_some() {
                    n += 1;
                }
            }
            CardColor::Response => {
                n += self
                    .registry
                    .players()
                    .iter()
                    .map(|p| p.hand.len())
                    .sum::<usize>();
                if let Some(round) = &self.round {
                    n += round.submissions.values().map(Vec::len).sum::<usize>();
                }
            }
        }
        n
    }

    #[must_use]
    pub fn cards_introduced(&self, color: CardColor) -> usize {
        self.deck.introduced(color)
    }

    // === Internals ===

    fn roster_event(&self) -> Outgoing {
        Outgoing::Broadcast(GameEvent::Roster {
            players: self.registry.names(),
            queued: self.registry.queued(),
        })
    }

    fn hand_lines(&self, name: &Username) -> Vec<String> {
        self.registry.player(name).map_or_else(Vec::new, |p| {
            p.hand
                .iter()
                .enumerate()
                .map(|(i, card)| format!("{}: {}", i + 1, card.text))
                .collect()
        })
    }

    /// Start a fresh round. On deck exhaustion the session falls back to
    /// the join phase instead of failing.
    fn start_round(&mut self) -> Vec<Outgoing> {
        let mut out = Vec::new();
        let Some(dealer) = self.registry.next_dealer() else {
            self.phase = Phase::Join;
            return out;
        };
        let prompt = match self.deck.draw_prompt(&mut self.rng) {
            Ok(card) => card,
            Err(_) => {
                log::warn!("prompt deck exhausted; back to join phase");
                out.push(Outgoing::Broadcast(GameEvent::DeckOut {
                    color: CardColor::Prompt,
                }));
                self.phase = Phase::Join;
                return out;
            }
        };
        for player in self.registry.players_mut() {
            if self
                .deck
                .deal_hand(&mut player.hand, self.config.hand_size, &mut self.rng)
                .is_err()
            {
                log::warn!("response deck exhausted; back to join phase");
                out.push(Outgoing::Broadcast(GameEvent::DeckOut {
                    color: CardColor::Response,
                }));
                self.deck.discard([prompt], CardColor::Prompt);
                self.phase = Phase::Join;
                return out;
            }
        }
        let respondents: Vec<Username> = self
            .registry
            .names()
            .into_iter()
            .filter(|n| *n != dealer)
            .collect();
        log::info!(
            "round started: dealer {dealer}, {} respondents",
            respondents.len()
        );
        out.push(Outgoing::Broadcast(GameEvent::PromptRead {
            dealer: dealer.clone(),
            prompt: prompt.text.clone(),
        }));
        for name in &respondents {
            out.push(Outgoing::Notify(
                name.clone(),
                GameEvent::HandListing {
                    cards: self.hand_lines(name),
                },
            ));
        }
        self.round = Some(Round::new(prompt, dealer, respondents));
        self.phase = Phase::Play;
        out
    }

    /// Reveal the anonymized answers and hand control to the dealer.
    fn reveal_answers(&mut self) -> Vec<Outgoing> {
        let mut out = vec![Outgoing::Broadcast(GameEvent::AllSubmitted)];
        if let Some(round) = self.round.as_mut() {
            let mut order = round.respondents.clone();
            order.shuffle(&mut self.rng);
            round.reveal_order = order;
        }
        self.phase = Phase::Winner;
        out.extend(self.answer_events());
        out
    }

    /// Numbered answer reveal, reusable by poke when the dealer stalls.
    fn answer_events(&self) -> Vec<Outgoing> {
        let Some(round) = self.round.as_ref() else {
            return Vec::new();
        };
        let mut out = Vec::new();
        for (i, name) in round.reveal_order.iter().enumerate() {
            if let Some(cards) = round.submissions.get(name) {
                out.push(Outgoing::Broadcast(GameEvent::AnswerRevealed {
                    number: i + 1,
                    filled: fill_blanks(&round.prompt.text, cards),
                }));
            }
        }
        out.push(Outgoing::Broadcast(GameEvent::ChooseWinnerHint {
            dealer: round.dealer.clone(),
        }));
        out
    }

    /// Tear down the current round, recycle spent cards, admit the queue,
    /// and either start the next round or fall back to the join phase.
    fn reset(&mut self) -> Vec<Outgoing> {
        let mut out = Vec::new();
        if let Some(round) = self.round.take() {
            let Round {
                prompt,
                submissions,
                ..
            } = round;
            self.deck.discard([prompt], CardColor::Prompt);
            for (_, cards) in submissions {
                self.deck.discard(cards, CardColor::Response);
            }
        }
        self.kicks.clear();
        self.deck.replenish(CardColor::Prompt, &mut self.rng);
        self.deck.replenish(CardColor::Response, &mut self.rng);
        for name in self.registry.drain_join_queue() {
            let mut player = Player::new(name.clone());
            if self
                .deck
                .deal_hand(&mut player.hand, self.config.hand_size, &mut self.rng)
                .is_err()
            {
                out.push(Outgoing::Broadcast(GameEvent::DeckOut {
                    color: CardColor::Response,
                }));
            }
            log::info!("{name} admitted from the queue");
            self.registry.insert(player);
        }
        if self.registry.player_count() >= self.config.min_players {
            out.extend(self.start_round());
        } else {
            self.phase = Phase::Join;
        }
        out
    }

    /// Shared removal path for leave and kick.
    fn remove_player(&mut self, name: &Username, kicked: bool) -> Result<Vec<Outgoing>, GameError> {
        let active = self.registry.contains(name);
        if !active && !self.registry.is_queued(name) {
            return Err(GameError::NotInGame);
        }
        let mut out = vec![Outgoing::Broadcast(if kicked {
            GameEvent::Kicked { name: name.clone() }
        } else {
            GameEvent::Left { name: name.clone() }
        })];
        self.registry.purge_queues(name);
        self.kicks.purge(name);
        if active {
            if let Some(player) = self.registry.remove(name) {
                self.deck.discard(player.hand, CardColor::Response);
            }
            log::info!(
                "{name} removed (kicked: {kicked}); {} active",
                self.registry.player_count()
            );
            let mut dealer_left = false;
            let mut reveal = false;
            let mut renumbered = false;
            if let Some(round) = self.round.as_mut() {
                if round.dealer == *name {
                    dealer_left = true;
                } else if round.is_respondent(name) {
                    if let Some(cards) = round.remove_respondent(name) {
                        self.deck.discard(cards, CardColor::Response);
                    }
                    reveal = self.phase == Phase::Play && round.all_submitted();
                    // Dropping a revealed answer shifts the numbers of the
                    // ones after it, so the dealer needs a fresh listing.
                    renumbered = self.phase == Phase::Winner;
                }
            }
            let below_min = self.registry.player_count() < self.config.min_players;
            if below_min && self.phase != Phase::Join {
                if dealer_left {
                    out.push(Outgoing::Broadcast(GameEvent::DealerLeft));
                }
                out.push(Outgoing::Broadcast(GameEvent::NotEnoughPlayers));
                out.extend(self.reset());
            } else if dealer_left {
                out.push(Outgoing::Broadcast(GameEvent::DealerLeft));
                out.extend(self.reset());
            } else if reveal {
                out.extend(self.reveal_answers());
            } else if renumbered {
                out.extend(self.answer_events());
            }
        }
        out.push(self.roster_event());
        Ok(out)
    }
}
