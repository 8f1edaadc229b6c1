//! Composite keys namespacing per-participant and per-question values inside
//! the flat replicated store.
//!
//! Key grammar, with `:` as the delimiter:
//!
//! - `<participantId>:status`
//! - `<participantId>:voteStatus`
//! - `<storyId>:<participantId>:answer`
//! - `<storyId>:userStory` (the story id is its creation time in millis)
//! - `activeUserStory`
//!
//! Unrelated apps may write into the same namespace, so parsing never fails
//! hard: anything that does not match the grammar decodes to `None`.

use shared::domain::{ParticipantId, StoryId};

pub const FIELD_STATUS: &str = "status";
pub const FIELD_VOTE_STATUS: &str = "voteStatus";
pub const FIELD_ANSWER: &str = "answer";
pub const FIELD_STORY: &str = "userStory";
pub const KEY_ACTIVE_STORY: &str = "activeUserStory";

const DELIM: char = ':';

/// Decoded form of a replicated-state key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StateKey {
    Status(ParticipantId),
    VoteStatus(ParticipantId),
    Answer {
        story: StoryId,
        participant: ParticipantId,
    },
    StoryText(StoryId),
    ActiveStory,
}

impl StateKey {
    pub fn status(participant: &ParticipantId) -> Self {
        StateKey::Status(participant.clone())
    }

    pub fn vote_status(participant: &ParticipantId) -> Self {
        StateKey::VoteStatus(participant.clone())
    }

    pub fn answer(story: StoryId, participant: &ParticipantId) -> Self {
        StateKey::Answer {
            story,
            participant: participant.clone(),
        }
    }

    pub fn encode(&self) -> String {
        match self {
            StateKey::Status(p) => format!("{p}{DELIM}{FIELD_STATUS}"),
            StateKey::VoteStatus(p) => format!("{p}{DELIM}{FIELD_VOTE_STATUS}"),
            StateKey::Answer { story, participant } => {
                format!("{story}{DELIM}{participant}{DELIM}{FIELD_ANSWER}")
            }
            StateKey::StoryText(story) => format!("{story}{DELIM}{FIELD_STORY}"),
            StateKey::ActiveStory => KEY_ACTIVE_STORY.to_string(),
        }
    }

    /// Inverse of [`StateKey::encode`]. Malformed keys decode to `None`.
    pub fn parse(raw: &str) -> Option<StateKey> {
        if raw == KEY_ACTIVE_STORY {
            return Some(StateKey::ActiveStory);
        }
        let (scope, field) = parse_scope_and_field(raw)?;
        match field {
            FIELD_STATUS => Some(StateKey::Status(ParticipantId(scope.to_string()))),
            FIELD_VOTE_STATUS => Some(StateKey::VoteStatus(ParticipantId(scope.to_string()))),
            FIELD_STORY => {
                let story = parse_story_id(scope)?;
                Some(StateKey::StoryText(story))
            }
            FIELD_ANSWER => {
                let (story_raw, participant) = scope.split_once(DELIM)?;
                if participant.is_empty() {
                    return None;
                }
                let story = parse_story_id(story_raw)?;
                Some(StateKey::Answer {
                    story,
                    participant: ParticipantId(participant.to_string()),
                })
            }
            _ => None,
        }
    }
}

/// Splits `scope:field`, rejecting empty scopes. The field is always the
/// final delimiter-separated segment; the scope keeps any inner delimiters.
pub fn parse_scope_and_field(raw: &str) -> Option<(&str, &str)> {
    let (scope, field) = raw.rsplit_once(DELIM)?;
    if scope.is_empty() {
        return None;
    }
    Some((scope, field))
}

fn parse_story_id(raw: &str) -> Option<StoryId> {
    raw.parse::<i64>().ok().map(StoryId)
}
