use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

use super::constants::{BLANK, MAX_BLANKS, MAX_CARD_TEXT_LENGTH, MAX_NAME_LENGTH};
use super::errors::GameError;

/// Identifier assigned by the card catalog. New cards authored at runtime
/// get the next id after the highest loaded one.
pub type CardId = u64;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum CardColor {
    /// A card with blank markers, read aloud by the dealer.
    Prompt,
    /// A card played by respondents to fill a prompt's blanks.
    Response,
}

impl fmt::Display for CardColor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Prompt => "prompt",
            Self::Response => "response",
        };
        write!(f, "{repr}")
    }
}

impl FromStr for CardColor {
    type Err = GameError;

    // The classic deck calls these "black" and "white", so both spellings
    // are accepted from chat.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prompt" | "black" => Ok(Self::Prompt),
            "response" | "white" => Ok(Self::Response),
            other => Err(GameError::InvalidColor(other.to_string())),
        }
    }
}

/// An immutable card. Prompt cards carry one or more [`BLANK`] tokens in
/// their text; response cards are plain phrases.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Card {
    pub id: CardId,
    pub text: String,
    pub color: CardColor,
    pub official: bool,
}

impl Card {
    #[must_use]
    pub fn prompt(id: CardId, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            color: CardColor::Prompt,
            official: true,
        }
    }

    #[must_use]
    pub fn response(id: CardId, text: &str) -> Self {
        Self {
            id,
            text: text.to_string(),
            color: CardColor::Response,
            official: true,
        }
    }

    /// Number of canonical blank tokens in this card's text. Only
    /// meaningful for prompt cards; zero for responses.
    #[must_use]
    pub fn blank_count(&self) -> usize {
        self.text.matches(BLANK).count()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    /// Sanitize a raw chat name: whitespace becomes underscores and the
    /// name is capped at [`MAX_NAME_LENGTH`] characters. Counting chars,
    /// not bytes, keeps multibyte names from splitting mid-character.
    pub fn new(s: &str) -> Self {
        let username: String = s
            .chars()
            .take(MAX_NAME_LENGTH)
            .map(|c| if c.is_ascii_whitespace() { '_' } else { c })
            .collect();
        Self(username)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&str> for Username {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An active player and the response cards they hold.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Player {
    pub name: Username,
    pub hand: Vec<Card>,
}

impl Player {
    #[must_use]
    pub fn new(name: Username) -> Self {
        Self {
            name,
            hand: Vec::new(),
        }
    }
}

/// Normalize user-authored response card text: trim whitespace and strip a
/// single trailing period. Empty text is rejected.
pub fn normalize_response_text(text: &str) -> Result<String, GameError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CARD_TEXT_LENGTH {
        return Err(GameError::InvalidCardFormat);
    }
    let stripped = trimmed.strip_suffix('.').unwrap_or(trimmed);
    if stripped.is_empty() {
        return Err(GameError::InvalidCardFormat);
    }
    Ok(stripped.to_string())
}

/// Normalize user-authored prompt card text. Runs of one or more
/// underscores collapse to the canonical blank token; a prompt with no
/// blank at all gets one appended. More than [`MAX_BLANKS`] blanks is
/// rejected.
pub fn normalize_prompt_text(text: &str) -> Result<String, GameError> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_CARD_TEXT_LENGTH {
        return Err(GameError::InvalidCardFormat);
    }
    let mut normalized = collapse_blank_runs(trimmed);
    let count = normalized.matches(BLANK).count();
    if count == 0 {
        normalized.push_str(&format!(" {BLANK}."));
    } else if count > MAX_BLANKS {
        return Err(GameError::InvalidCardFormat);
    }
    Ok(normalized)
}

/// Lenient normalization applied to catalog-loaded cards at session start.
/// The blank-count policy only binds user-authored cards, so existing
/// catalog content is kept apart from canonicalizing blank runs and
/// guaranteeing prompts carry at least one blank.
#[must_use]
pub fn normalize_loaded_card(card: Card) -> Card {
    let text = match card.color {
        CardColor::Response => {
            let trimmed = card.text.trim();
            trimmed.strip_suffix('.').unwrap_or(trimmed).to_string()
        }
        CardColor::Prompt => {
            let mut normalized = collapse_blank_runs(card.text.trim());
            if !normalized.contains(BLANK) {
                normalized.push_str(&format!(" {BLANK}."));
            }
            normalized
        }
    };
    Card { text, ..card }
}

/// Fill a prompt's blanks with the given answer cards, in order. Blanks
/// beyond the supplied answers are left as-is.
#[must_use]
pub fn fill_blanks(prompt: &str, answers: &[Card]) -> String {
    let mut out = String::with_capacity(prompt.len());
    let mut rest = prompt;
    let mut i = 0;
    while let Some(pos) = rest.find(BLANK) {
        out.push_str(&rest[..pos]);
        match answers.get(i) {
            Some(card) => out.push_str(&card.text),
            None => out.push_str(BLANK),
        }
        i += 1;
        rest = &rest[pos + BLANK.len()..];
    }
    out.push_str(rest);
    out
}

fn collapse_blank_runs(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c == '_' {
            if !in_run {
                out.push_str(BLANK);
                in_run = true;
            }
        } else {
            in_run = false;
            out.push(c);
        }
    }
    out
}
