//! Per-round ephemeral state.

use std::collections::HashMap;

use super::entities::{Card, Username};

/// State of a single round: exists only while the session is in `Play` or
/// `Winner` phase and is discarded wholesale by `reset`.
#[derive(Debug)]
pub struct Round {
    pub prompt: Card,
    pub dealer: Username,
    /// Everyone eligible to submit this round, in join order. The dealer is
    /// never a respondent.
    pub respondents: Vec<Username>,
    pub submissions: HashMap<Username, Vec<Card>>,
    /// Shuffled copy of `respondents`, fixed once when the last submission
    /// arrives; answer numbers index into this so authorship stays hidden.
    pub reveal_order: Vec<Username>,
}

impl Round {
    #[must_use]
    pub fn new(prompt: Card, dealer: Username, respondents: Vec<Username>) -> Self {
        Self {
            prompt,
            dealer,
            respondents,
            submissions: HashMap::new(),
            reveal_order: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_respondent(&self, name: &Username) -> bool {
        self.respondents.contains(name)
    }

    #[must_use]
    pub fn has_submitted(&self, name: &Username) -> bool {
        self.submissions.contains_key(name)
    }

    /// The round moves to winner adjudication exactly when every respondent
    /// has submitted.
    #[must_use]
    pub fn all_submitted(&self) -> bool {
        !self.respondents.is_empty() && self.submissions.len() == self.respondents.len()
    }

    pub fn record_submission(&mut self, name: Username, cards: Vec<Card>) {
        self.submissions.insert(name, cards);
    }

    /// Drop a departing respondent, returning any cards they had submitted
    /// so the caller can discard them.
    pub fn remove_respondent(&mut self, name: &Username) -> Option<Vec<Card>> {
        self.respondents.retain(|n| n != name);
        self.reveal_order.retain(|n| n != name);
        self.submissions.remove(name)
    }
}
