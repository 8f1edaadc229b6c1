use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::AnswerParseError;

/// Maximum length, in characters, for participant status text and story text.
pub const MAX_TEXT_LEN: usize = 255;

/// Ephemeral per-session participant identity assigned by the host platform.
/// Not stable across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ParticipantId(pub String);

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ParticipantId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identity of one polling question. The inner value is the creation
/// timestamp in milliseconds, which also gives stories their total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StoryId(pub i64);

impl fmt::Display for StoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The fixed set of castable answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Answer {
    #[serde(rename = "0")]
    Zero,
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "5")]
    Five,
    #[serde(rename = "8")]
    Eight,
    #[serde(rename = "u")]
    Unknown,
    #[serde(rename = "c")]
    Coffee,
}

impl Answer {
    pub const ALL: [Answer; 9] = [
        Answer::Zero,
        Answer::Half,
        Answer::One,
        Answer::Two,
        Answer::Three,
        Answer::Five,
        Answer::Eight,
        Answer::Unknown,
        Answer::Coffee,
    ];

    /// The literal stored in the replicated state.
    pub fn as_wire(&self) -> &'static str {
        match self {
            Answer::Zero => "0",
            Answer::Half => "1/2",
            Answer::One => "1",
            Answer::Two => "2",
            Answer::Three => "3",
            Answer::Five => "5",
            Answer::Eight => "8",
            Answer::Unknown => "u",
            Answer::Coffee => "c",
        }
    }

    /// Human-facing button label.
    pub fn label(&self) -> &'static str {
        match self {
            Answer::Unknown => "No idea!",
            Answer::Coffee => "Coffee!",
            other => other.as_wire(),
        }
    }
}

impl FromStr for Answer {
    type Err = AnswerParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Answer::ALL
            .into_iter()
            .find(|answer| answer.as_wire() == raw)
            .ok_or_else(|| AnswerParseError(raw.to_string()))
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// Tri-state vote-cast indicator kept per participant. `Unset` means the
/// participant has never voted in this session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteFlag {
    #[default]
    Unset,
    Cast,
    Cleared,
}

impl VoteFlag {
    pub const CAST_WIRE: &'static str = "TRUE";
    pub const CLEARED_WIRE: &'static str = "FALSE";

    /// Marker literal written to the replicated state. `Unset` has no wire
    /// form; it is the absence of the key.
    pub fn as_wire(&self) -> Option<&'static str> {
        match self {
            VoteFlag::Unset => None,
            VoteFlag::Cast => Some(Self::CAST_WIRE),
            VoteFlag::Cleared => Some(Self::CLEARED_WIRE),
        }
    }

    pub fn from_state(raw: Option<&str>) -> Self {
        match raw {
            Some(Self::CAST_WIRE) => VoteFlag::Cast,
            Some(Self::CLEARED_WIRE) => VoteFlag::Cleared,
            _ => VoteFlag::Unset,
        }
    }
}

/// One session member as reported by the host roster feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

impl Participant {
    /// Display name with any email-shaped suffix removed.
    pub fn short_name(&self) -> &str {
        short_display_name(&self.display_name)
    }
}

/// Truncates an email-shaped display name at the first `@`.
pub fn short_display_name(name: &str) -> &str {
    match name.split_once('@') {
        Some((local, _)) => local,
        None => name,
    }
}

/// Clamps free text to [`MAX_TEXT_LEN`] characters.
pub fn clamp_text(text: &str) -> &str {
    match text.char_indices().nth(MAX_TEXT_LEN) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
