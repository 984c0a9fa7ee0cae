//! Engine actor message types.

use tokio::sync::oneshot;

use crate::game::entities::Username;
use crate::game::errors::GameError;
use crate::game::session::{Outgoing, StatusSnapshot};

/// Messages that can be sent to an `EngineActor`. Each carries a oneshot
/// channel for the reply, except `Shutdown`.
#[derive(Debug)]
pub enum EngineMessage {
    /// Join the game, or the queue when a round is running.
    Join {
        name: Username,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Leave the game voluntarily.
    Leave {
        name: Username,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Submit response cards by 1-based hand index.
    Play {
        name: Username,
        indices: Vec<usize>,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Dealer picks the winning answer by its revealed number.
    ChooseWinner {
        name: Username,
        answer: usize,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Vote to kick another player.
    VoteKick {
        voter: Username,
        target: Username,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Author a new card into the live deck.
    AddCard {
        name: Username,
        text: String,
        color: String,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Nudge an idle player.
    Poke {
        poker: Username,
        target: Username,
        response: oneshot::Sender<EngineResponse>,
    },

    /// Per-player standing plus persisted score.
    Status {
        name: Username,
        response: oneshot::Sender<StatusResponse>,
    },

    /// Active and queued player names.
    ListPlayers {
        response: oneshot::Sender<RosterResponse>,
    },

    /// Broadcast the leaderboard.
    TopScores {
        response: oneshot::Sender<EngineResponse>,
    },

    /// Stop the actor.
    Shutdown,
}

/// Reply to a game command: the command's own outcome plus everything the
/// transport should deliver to the room.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineResponse {
    pub result: Result<(), GameError>,
    pub outgoing: Vec<Outgoing>,
}

impl EngineResponse {
    pub(crate) fn from_session(result: Result<Vec<Outgoing>, GameError>) -> Self {
        match result {
            Ok(outgoing) => Self {
                result: Ok(()),
                outgoing,
            },
            Err(err) => Self {
                result: Err(err),
                outgoing: Vec::new(),
            },
        }
    }
}

/// Reply to a status query.
#[derive(Clone, Debug)]
pub struct StatusResponse {
    pub snapshot: StatusSnapshot,
    pub score: u64,
}

/// Reply to a roster query.
#[derive(Clone, Debug, PartialEq)]
pub struct RosterResponse {
    pub players: Vec<Username>,
    pub queued: Vec<Username>,
}
