//! Core game logic: cards, players, rounds, and the session state machine.
//!
//! Everything in this module is synchronous and deterministic given the
//! session RNG; the async engine actor wraps a [`session::Session`] and
//! serializes commands into it.

pub mod constants;
pub mod deck;
pub mod entities;
pub mod errors;
pub mod kick;
pub mod registry;
pub mod round;
pub mod session;

pub use errors::GameError;
pub use session::{
    GameConfig, GameEvent, Outgoing, Phase, Session, StatusSnapshot, WinnerOutcome,
};
