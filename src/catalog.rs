//! Card catalog boundary: where card definitions live between sessions.
//!
//! The engine only needs two operations, so the trait stays small and a
//! durable backend (file, database) can be dropped in without touching
//! game code.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::game::entities::Card;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog backend failure: {0}")]
    Backend(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Storage abstraction for the card collection.
#[async_trait]
pub trait CardCatalog: Send + Sync {
    /// Every card available at session start, official and player-authored.
    async fn load_initial_cards(&self) -> CatalogResult<Vec<Card>>;

    /// Save a player-authored card for future sessions. The card is already
    /// live in the current session when this is called.
    async fn persist_new_card(&self, card: &Card) -> CatalogResult<()>;
}

/// In-memory catalog backend.
pub struct MemoryCatalog {
    cards: Mutex<Vec<Card>>,
}

impl MemoryCatalog {
    #[must_use]
    pub fn new(cards: Vec<Card>) -> Self {
        Self {
            cards: Mutex::new(cards),
        }
    }
}

#[async_trait]
impl CardCatalog for MemoryCatalog {
    async fn load_initial_cards(&self) -> CatalogResult<Vec<Card>> {
        Ok(self.cards.lock().await.clone())
    }

    async fn persist_new_card(&self, card: &Card) -> CatalogResult<()> {
        self.cards.lock().await.push(card.clone());
        Ok(())
    }
}
