//! # CAH Engine
//!
//! A single-session, turn-based Cards Against Humanity game engine.
//!
//! The game runs as a simple phase machine: players join until there are
//! enough to play, each round one dealer reads a prompt card while everyone
//! else submits response cards from their hands, the answers are revealed
//! anonymously in a shuffled order, and the dealer picks a winner. The
//! dealer role rotates round-robin and the session keeps going until too
//! few players remain.
//!
//! ## Architecture
//!
//! - [`game`]: synchronous game logic. [`game::Session`] owns the deck,
//!   the player registry, the current round, and kick votes, and exposes
//!   one method per player command. Commands either fully apply or return
//!   a [`game::GameError`] leaving the state untouched.
//! - [`engine`]: an actor wrapping a session. Commands are serialized
//!   through an mpsc inbox so the game never needs a lock, and replies
//!   carry the chat events the transport should deliver.
//! - [`catalog`] / [`scores`]: storage boundaries for cards and win
//!   counts, with in-memory backends included.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cah_engine::catalog::MemoryCatalog;
//! use cah_engine::engine::EngineActor;
//! use cah_engine::game::GameConfig;
//! use cah_engine::scores::MemoryLedger;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let catalog = Arc::new(MemoryCatalog::new(vec![]));
//! let ledger = Arc::new(MemoryLedger::new());
//! let (actor, handle) = EngineActor::new(GameConfig::default(), catalog, ledger).await?;
//! tokio::spawn(actor.run());
//!
//! let reply = handle.join("alice".into()).await?;
//! for event in reply.outgoing {
//!     println!("{event:?}");
//! }
//! # Ok(())
//! # }
//! ```

/// Core game logic, entities, and the session state machine.
pub mod game;
pub use game::{
    GameConfig, GameError, GameEvent, Outgoing, Phase, Session, StatusSnapshot,
    constants::{self, BLANK, HAND_SIZE, KICK_THRESHOLD, MIN_PLAYERS},
    entities::{Card, CardColor, CardId, Player, Username},
};

/// Command-serializing engine actor.
pub mod engine;
pub use engine::{
    EngineActor, EngineClosed, EngineHandle, EngineResponse, RosterResponse, StatusResponse,
};

/// Card storage boundary.
pub mod catalog;
pub use catalog::{CardCatalog, CatalogError, MemoryCatalog};

/// Score storage boundary.
pub mod scores;
pub use scores::{LedgerError, MemoryLedger, ScoreLedger};
