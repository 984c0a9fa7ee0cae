//! Command-serializing game engine.
//!
//! A single actor owns the session and processes commands one at a time,
//! keeping the game state free of locks.

pub mod actor;
pub mod messages;

pub use actor::{EngineActor, EngineClosed, EngineHandle};
pub use messages::{EngineMessage, EngineResponse, RosterResponse, StatusResponse};
