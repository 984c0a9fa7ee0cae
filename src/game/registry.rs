//! Player registry: active players, the mid-round join queue, and the
//! dealer rotation queue.
//!
//! Players are kept in join order so roster listings are stable.

use std::collections::VecDeque;

use super::entities::{Player, Username};

#[derive(Debug, Default)]
pub struct PlayerRegistry {
    players: Vec<Player>,
    join_queue: VecDeque<Username>,
    dealer_queue: VecDeque<Username>,
}

impl PlayerRegistry {
    #[must_use]
    pub fn contains(&self, name: &Username) -> bool {
        self.players.iter().any(|p| p.name == *name)
    }

    #[must_use]
    pub fn is_queued(&self, name: &Username) -> bool {
        self.join_queue.contains(name)
    }

    #[must_use]
    pub fn player(&self, name: &Username) -> Option<&Player> {
        self.players.iter().find(|p| p.name == *name)
    }

    pub fn player_mut(&mut self, name: &Username) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.name == *name)
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Active player names in join order.
    #[must_use]
    pub fn names(&self) -> Vec<Username> {
        self.players.iter().map(|p| p.name.clone()).collect()
    }

    /// Queued player names in arrival order.
    #[must_use]
    pub fn queued(&self) -> Vec<Username> {
        self.join_queue.iter().cloned().collect()
    }

    pub fn insert(&mut self, player: Player) {
        self.players.push(player);
    }

    /// Remove an active player, returning them (with their hand) so the
    /// caller can discard the cards.
    pub fn remove(&mut self, name: &Username) -> Option<Player> {
        let idx = self.players.iter().position(|p| p.name == *name)?;
        Some(self.players.remove(idx))
    }

    pub fn queue_join(&mut self, name: Username) {
        self.join_queue.push_back(name);
    }

    /// Take everyone out of the join queue for admission at a reset.
    pub fn drain_join_queue(&mut self) -> Vec<Username> {
        self.join_queue.drain(..).collect()
    }

    /// Pop the next dealer, refilling the rotation with all current players
    /// when it runs out. This is round-robin, not random.
    pub fn next_dealer(&mut self) -> Option<Username> {
        if self.dealer_queue.is_empty() {
            self.dealer_queue.extend(self.names());
        }
        self.dealer_queue.pop_front()
    }

    /// Drop a departing player from both queues.
    pub fn purge_queues(&mut self, name: &Username) {
        self.dealer_queue.retain(|n| n != name);
        self.join_queue.retain(|n| n != name);
    }
}
