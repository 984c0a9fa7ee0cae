//! Engine actor with async message handling.
//!
//! One actor owns one session. Commands arrive over an mpsc inbox and run
//! strictly one at a time, so game state never needs a lock. Persistence
//! (catalog, ledger) happens here, after the in-memory state has already
//! advanced; a storage failure downgrades to a warning event instead of
//! rolling the game back.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use super::messages::{EngineMessage, EngineResponse, RosterResponse, StatusResponse};
use crate::catalog::{CardCatalog, CatalogError};
use crate::game::constants::TOP_SCORES_SHOWN;
use crate::game::entities::Username;
use crate::game::session::{GameConfig, GameEvent, Outgoing, Session};
use crate::scores::ScoreLedger;

/// The engine's command inbox has gone away.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("engine is closed")]
pub struct EngineClosed;

/// Cloneable handle for sending commands to a running [`EngineActor`].
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineMessage>,
}

impl EngineHandle {
    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<EngineResponse>) -> EngineMessage,
    ) -> Result<EngineResponse, EngineClosed> {
        let (tx, rx) = oneshot::channel();
        self.sender.send(build(tx)).await.map_err(|_| EngineClosed)?;
        rx.await.map_err(|_| EngineClosed)
    }

    pub async fn join(&self, name: Username) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::Join { name, response })
            .await
    }

    pub async fn leave(&self, name: Username) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::Leave { name, response })
            .await
    }

    pub async fn play(
        &self,
        name: Username,
        indices: Vec<usize>,
    ) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::Play {
            name,
            indices,
            response,
        })
        .await
    }

    pub async fn choose_winner(
        &self,
        name: Username,
        answer: usize,
    ) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::ChooseWinner {
            name,
            answer,
            response,
        })
        .await
    }

    pub async fn vote_kick(
        &self,
        voter: Username,
        target: Username,
    ) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::VoteKick {
            voter,
            target,
            response,
        })
        .await
    }

    pub async fn add_card(
        &self,
        name: Username,
        text: String,
        color: String,
    ) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::AddCard {
            name,
            text,
            color,
            response,
        })
        .await
    }

    pub async fn poke(
        &self,
        poker: Username,
        target: Username,
    ) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::Poke {
            poker,
            target,
            response,
        })
        .await
    }

    pub async fn status(&self, name: Username) -> Result<StatusResponse, EngineClosed> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineMessage::Status { name, response: tx })
            .await
            .map_err(|_| EngineClosed)?;
        rx.await.map_err(|_| EngineClosed)
    }

    pub async fn list_players(&self) -> Result<RosterResponse, EngineClosed> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(EngineMessage::ListPlayers { response: tx })
            .await
            .map_err(|_| EngineClosed)?;
        rx.await.map_err(|_| EngineClosed)
    }

    pub async fn top_scores(&self) -> Result<EngineResponse, EngineClosed> {
        self.request(|response| EngineMessage::TopScores { response })
            .await
    }

    pub async fn shutdown(&self) -> Result<(), EngineClosed> {
        self.sender
            .send(EngineMessage::Shutdown)
            .await
            .map_err(|_| EngineClosed)
    }
}

/// Actor owning a single game session plus its storage boundaries.
pub struct EngineActor {
    session: Session,
    inbox: mpsc::Receiver<EngineMessage>,
    catalog: Arc<dyn CardCatalog>,
    ledger: Arc<dyn ScoreLedger>,
}

impl EngineActor {
    /// Load the catalog and build the actor plus a handle for callers.
    pub async fn new(
        config: GameConfig,
        catalog: Arc<dyn CardCatalog>,
        ledger: Arc<dyn ScoreLedger>,
    ) -> Result<(Self, EngineHandle), CatalogError> {
        let cards = catalog.load_initial_cards().await?;
        let session = Session::new(config, cards);
        let (sender, inbox) = mpsc::channel(100);
        let actor = Self {
            session,
            inbox,
            catalog,
            ledger,
        };
        Ok((actor, EngineHandle { sender }))
    }

    /// Run the command loop until shutdown or until every handle is gone.
    pub async fn run(mut self) {
        log::info!("game engine starting");
        while let Some(message) = self.inbox.recv().await {
            if !self.handle_message(message).await {
                break;
            }
        }
        log::info!("game engine stopped");
    }

    async fn handle_message(&mut self, message: EngineMessage) -> bool {
        match message {
            EngineMessage::Join { name, response } => {
                let result = self.session.join(&name);
                let _ = response.send(EngineResponse::from_session(result));
            }

            EngineMessage::Leave { name, response } => {
                let result = self.session.leave(&name);
                let _ = response.send(EngineResponse::from_session(result));
            }

            EngineMessage::Play {
                name,
                indices,
                response,
            } => {
                let result = self.session.play(&name, &indices);
                let _ = response.send(EngineResponse::from_session(result));
            }

            EngineMessage::ChooseWinner {
                name,
                answer,
                response,
            } => {
                let reply = self.handle_choose_winner(&name, answer).await;
                let _ = response.send(reply);
            }

            EngineMessage::VoteKick {
                voter,
                target,
                response,
            } => {
                let result = self.session.vote_kick(&voter, &target);
                let _ = response.send(EngineResponse::from_session(result));
            }

            EngineMessage::AddCard {
                name,
                text,
                color,
                response,
            } => {
                let reply = self.handle_add_card(&name, &text, &color).await;
                let _ = response.send(reply);
            }

            EngineMessage::Poke {
                poker,
                target,
                response,
            } => {
                let result = self.session.poke(&poker, &target);
                let _ = response.send(EngineResponse::from_session(result));
            }

            EngineMessage::Status { name, response } => {
                let snapshot = self.session.status(&name);
                let score = match self.ledger.score(&name).await {
                    Ok(score) => score,
                    Err(err) => {
                        log::warn!("could not read score for {name}: {err}");
                        0
                    }
                };
                let _ = response.send(StatusResponse { snapshot, score });
            }

            EngineMessage::ListPlayers { response } => {
                let _ = response.send(RosterResponse {
                    players: self.session.roster(),
                    queued: self.session.queued(),
                });
            }

            EngineMessage::TopScores { response } => {
                let mut outgoing = Vec::new();
                let roster = self.session.roster();
                match self.ledger.top_scores(&roster, TOP_SCORES_SHOWN).await {
                    Ok(entries) => {
                        outgoing.push(Outgoing::Broadcast(GameEvent::TopScores { entries }));
                    }
                    Err(err) => log::warn!("could not read the leaderboard: {err}"),
                }
                let _ = response.send(EngineResponse {
                    result: Ok(()),
                    outgoing,
                });
            }

            EngineMessage::Shutdown => {
                log::info!("engine shutting down");
                return false;
            }
        }
        true
    }

    /// The winner stands as soon as the session advances; a ledger failure
    /// only produces a warning for the dealer.
    async fn handle_choose_winner(&mut self, name: &Username, answer: usize) -> EngineResponse {
        match self.session.choose_winner(name, answer) {
            Ok(outcome) => {
                let mut outgoing = outcome.events;
                if let Err(err) = self.ledger.record_win(&outcome.winner, &outcome.roster).await {
                    log::error!("failed to record win for {}: {err}", outcome.winner);
                    outgoing.push(Outgoing::Notify(
                        name.clone(),
                        GameEvent::ScorePersistFailed,
                    ));
                }
                match self.ledger.top_scores(&outcome.roster, TOP_SCORES_SHOWN).await {
                    Ok(entries) => {
                        outgoing.push(Outgoing::Broadcast(GameEvent::TopScores { entries }));
                    }
                    Err(err) => log::warn!("could not read the leaderboard: {err}"),
                }
                EngineResponse {
                    result: Ok(()),
                    outgoing,
                }
            }
            Err(err) => EngineResponse {
                result: Err(err),
                outgoing: Vec::new(),
            },
        }
    }

    async fn handle_add_card(&mut self, name: &Username, text: &str, color: &str) -> EngineResponse {
        match self.session.add_card(text, color) {
            Ok((card, mut outgoing)) => {
                if let Err(err) = self.catalog.persist_new_card(&card).await {
                    log::error!("failed to persist card {}: {err}", card.id);
                    outgoing.push(Outgoing::Notify(name.clone(), GameEvent::CardPersistFailed));
                }
                EngineResponse {
                    result: Ok(()),
                    outgoing,
                }
            }
            Err(err) => EngineResponse {
                result: Err(err),
                outgoing: Vec::new(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogResult, MemoryCatalog};
    use crate::game::entities::Card;
    use crate::game::errors::GameError;
    use crate::scores::{LedgerError, LedgerResult, MemoryLedger};
    use async_trait::async_trait;

    fn seeded_catalog() -> Arc<MemoryCatalog> {
        let mut cards = Vec::new();
        for i in 0..10 {
            cards.push(Card::prompt(i + 1, &format!("Prompt {i} __________.")));
        }
        for i in 0..40 {
            cards.push(Card::response(100 + i, &format!("Response {i}")));
        }
        Arc::new(MemoryCatalog::new(cards))
    }

    async fn started_engine() -> EngineHandle {
        let config = GameConfig {
            rng_seed: Some(7),
            ..GameConfig::default()
        };
        let (actor, handle) = EngineActor::new(config, seeded_catalog(), Arc::new(MemoryLedger::new()))
            .await
            .unwrap();
        tokio::spawn(actor.run());
        handle
    }

    #[tokio::test]
    async fn commands_round_trip_through_the_actor() {
        let handle = started_engine().await;
        for name in ["alice", "bob", "carol"] {
            handle.join(name.into()).await.unwrap().result.unwrap();
        }
        let reply = handle.join("alice".into()).await.unwrap();
        assert_eq!(reply.result, Err(GameError::AlreadyJoined));
        assert!(reply.outgoing.is_empty());

        handle.play("bob".into(), vec![1]).await.unwrap().result.unwrap();
        handle
            .play("carol".into(), vec![1])
            .await
            .unwrap()
            .result
            .unwrap();
        let reply = handle.choose_winner("alice".into(), 1).await.unwrap();
        reply.result.unwrap();
        // The leaderboard rides along with every win.
        assert!(reply.outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Broadcast(GameEvent::TopScores { .. })
        )));

        let status = handle.status("bob".into()).await.unwrap();
        assert!(status.snapshot.playing);
        let winner_score = handle.status("bob".into()).await.unwrap().score
            + handle.status("carol".into()).await.unwrap().score;
        assert_eq!(winner_score, 1);
    }

    #[tokio::test]
    async fn shutdown_closes_the_handle() {
        let handle = started_engine().await;
        handle.shutdown().await.unwrap();
        assert_eq!(handle.join("alice".into()).await, Err(EngineClosed));
    }

    struct FailingLedger;

    #[async_trait]
    impl ScoreLedger for FailingLedger {
        async fn record_win(&self, _: &Username, _: &[Username]) -> LedgerResult<()> {
            Err(LedgerError::Backend("disk on fire".into()))
        }

        async fn score(&self, _: &Username) -> LedgerResult<u64> {
            Err(LedgerError::Backend("disk on fire".into()))
        }

        async fn top_scores(&self, _: &[Username], _: usize) -> LedgerResult<Vec<(Username, u64)>> {
            Err(LedgerError::Backend("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn ledger_failure_warns_but_does_not_fail_the_round() {
        let config = GameConfig {
            rng_seed: Some(8),
            ..GameConfig::default()
        };
        let (actor, handle) = EngineActor::new(config, seeded_catalog(), Arc::new(FailingLedger))
            .await
            .unwrap();
        tokio::spawn(actor.run());

        for name in ["alice", "bob", "carol"] {
            handle.join(name.into()).await.unwrap().result.unwrap();
        }
        handle.play("bob".into(), vec![1]).await.unwrap().result.unwrap();
        handle
            .play("carol".into(), vec![1])
            .await
            .unwrap()
            .result
            .unwrap();
        let reply = handle.choose_winner("alice".into(), 1).await.unwrap();
        assert!(reply.result.is_ok());
        assert!(reply.outgoing.contains(&Outgoing::Notify(
            "alice".into(),
            GameEvent::ScorePersistFailed,
        )));
        // A broken ledger also reads a score of zero.
        assert_eq!(handle.status("bob".into()).await.unwrap().score, 0);
    }

    struct FailingCatalog;

    #[async_trait]
    impl CardCatalog for FailingCatalog {
        async fn load_initial_cards(&self) -> CatalogResult<Vec<Card>> {
            Ok(vec![Card::response(1, "Only card")])
        }

        async fn persist_new_card(&self, _: &Card) -> CatalogResult<()> {
            Err(CatalogError::Backend("read-only".into()))
        }
    }

    #[tokio::test]
    async fn card_persist_failure_keeps_the_card_in_play() {
        let config = GameConfig {
            rng_seed: Some(9),
            ..GameConfig::default()
        };
        let (actor, handle) =
            EngineActor::new(config, Arc::new(FailingCatalog), Arc::new(MemoryLedger::new()))
                .await
                .unwrap();
        tokio::spawn(actor.run());

        let reply = handle
            .add_card("alice".into(), "A brand new answer".into(), "white".into())
            .await
            .unwrap();
        assert!(reply.result.is_ok());
        assert!(reply.outgoing.iter().any(|o| matches!(
            o,
            Outgoing::Broadcast(GameEvent::CardAdded { .. })
        )));
        assert!(reply.outgoing.contains(&Outgoing::Notify(
            "alice".into(),
            GameEvent::CardPersistFailed,
        )));
    }
}
