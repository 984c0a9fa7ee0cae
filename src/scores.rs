//! Score ledger boundary.
//!
//! Scores outlive a session, so they sit behind a trait the same way the
//! card catalog does. The engine treats ledger failures as non-fatal: a
//! round's winner stands even if the write is lost.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::game::entities::Username;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger backend failure: {0}")]
    Backend(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Storage abstraction for cumulative win counts.
#[async_trait]
pub trait ScoreLedger: Send + Sync {
    /// Credit a round win. Every name in `roster` is backfilled with a zero
    /// entry first, so the leaderboard lists players who have not won yet.
    async fn record_win(&self, winner: &Username, roster: &[Username]) -> LedgerResult<()>;

    /// One player's win count; zero when they have never appeared.
    async fn score(&self, name: &Username) -> LedgerResult<u64>;

    /// The `limit` highest scores among `roster`, descending. Players who
    /// have left the game are filtered out even if they won earlier. Ties
    /// keep first-seen order.
    async fn top_scores(
        &self,
        roster: &[Username],
        limit: usize,
    ) -> LedgerResult<Vec<(Username, u64)>>;
}

/// In-memory ledger backend. Entries keep insertion order so ties rank
/// deterministically.
pub struct MemoryLedger {
    entries: Mutex<Vec<(Username, u64)>>,
}

impl MemoryLedger {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
        }
    }
}

impl Default for MemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ScoreLedger for MemoryLedger {
    async fn record_win(&self, winner: &Username, roster: &[Username]) -> LedgerResult<()> {
        let mut entries = self.entries.lock().await;
        for name in roster {
            if !entries.iter().any(|(n, _)| n == name) {
                entries.push((name.clone(), 0));
            }
        }
        if let Some(entry) = entries.iter_mut().find(|(n, _)| n == winner) {
            entry.1 += 1;
        } else {
            entries.push((winner.clone(), 1));
        }
        Ok(())
    }

    async fn score(&self, name: &Username) -> LedgerResult<u64> {
        let entries = self.entries.lock().await;
        Ok(entries
            .iter()
            .find(|(n, _)| n == name)
            .map_or(0, |(_, s)| *s))
    }

    async fn top_scores(
        &self,
        roster: &[Username],
        limit: usize,
    ) -> LedgerResult<Vec<(Username, u64)>> {
        let mut entries: Vec<(Username, u64)> = self
            .entries
            .lock()
            .await
            .iter()
            .filter(|(name, _)| roster.contains(name))
            .cloned()
            .collect();
        // Stable sort preserves insertion order among equal scores.
        entries.sort_by(|a, b| b.1.cmp(&a.1));
        entries.truncate(limit);
        Ok(entries)
    }
}
