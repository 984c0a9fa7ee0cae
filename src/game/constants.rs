//! Game-wide constants.

/// Number of response cards every active player's hand is topped up to.
pub const HAND_SIZE: usize = 8;

/// Minimum number of active players needed to run a round.
pub const MIN_PLAYERS: usize = 3;

/// Fraction of eligible voters that must vote to kick a player before the
/// kick passes. The comparison is strict: votes/eligible must exceed this.
pub const KICK_THRESHOLD: f64 = 0.70;

/// Canonical blank token inside prompt card text. Runs of underscores in
/// user-supplied prompts are collapsed to this before counting blanks.
pub const BLANK: &str = "__________";

/// Maximum number of blanks allowed on a user-authored prompt card.
pub const MAX_BLANKS: usize = 3;

/// Maximum length of card text accepted from users.
pub const MAX_CARD_TEXT_LENGTH: usize = 256;

/// Maximum length of a player name, in characters.
pub const MAX_NAME_LENGTH: usize = 32;

/// Number of entries shown on the leaderboard.
pub const TOP_SCORES_SHOWN: usize = 5;
