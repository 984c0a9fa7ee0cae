//! Command-boundary error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::{CardColor, Username};

/// Errors produced while validating a player command.
///
/// Every variant is recovered at the command boundary: the failed command
/// leaves session state untouched and the error text is relayed to the
/// invoking player only. None of these are fatal to the session.
#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("you are already a part of the game")]
    AlreadyJoined,
    #[error("you are not a part of the game")]
    NotInGame,
    #[error("you are the dealer")]
    IsDealer,
    #[error("you may not choose the winner")]
    NotDealer,
    #[error("it is not time for that")]
    WrongPhase,
    #[error("play exactly {expected} card number(s) from your hand")]
    InvalidSubmission { expected: usize },
    #[error("that answer doesn't exist")]
    InvalidSelection,
    #[error("player '{0}' doesn't exist")]
    UnknownTarget(Username),
    #[error("you can't kick yourself")]
    SelfKick,
    #[error("you already voted to kick this player")]
    DuplicateVote,
    #[error("a prompt card needs 1 to 3 blanks and some text")]
    InvalidCardFormat,
    #[error("that card color doesn't exist: {0}")]
    InvalidColor(String),
    #[error("the {0} deck is out of cards")]
    DeckExhausted(CardColor),
}
