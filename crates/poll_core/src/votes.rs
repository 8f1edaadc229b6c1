//! Toggle-vote recording and per-answer tallying for the active story.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::{
    domain::{short_display_name, Answer, Participant, ParticipantId, StoryId, VoteFlag},
    protocol::StateDelta,
};

use crate::{keys::StateKey, store::StateStore};

/// Produces the delta for a participant submitting `answer` on `story`.
///
/// Re-submitting the recorded answer removes it (toggle-off) and marks the
/// vote flag cleared; anything else, including overwriting an unrecognized
/// stored value, records the new answer and marks the flag cast. Callers
/// resolve the active story first; with no valid active story there is
/// nothing to record and no delta to build.
pub fn record_vote(
    store: &StateStore<'_>,
    participant: &ParticipantId,
    story: StoryId,
    answer: Answer,
) -> StateDelta {
    let answer_key = StateKey::answer(story, participant);
    let flag_key = StateKey::vote_status(participant);
    let current = store
        .get(&answer_key)
        .and_then(|raw| raw.parse::<Answer>().ok());

    if current == Some(answer) {
        StateDelta::remove(answer_key.encode())
            .and_set(flag_key.encode(), VoteFlag::CLEARED_WIRE)
    } else {
        StateDelta::set(answer_key.encode(), answer.as_wire())
            .and_set(flag_key.encode(), VoteFlag::CAST_WIRE)
    }
}

/// One participant inside a tally bucket.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Voter {
    pub participant: ParticipantId,
    pub display_name: String,
    pub voted_at: DateTime<Utc>,
}

/// Participants grouped by their recorded answer for one story, each bucket
/// ordered by who answered first.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tally {
    buckets: BTreeMap<Answer, Vec<Voter>>,
}

impl Tally {
    /// Walks the roster once, dropping each participant with a recognized
    /// recorded answer into that answer's bucket. Participants without a
    /// recorded answer, and unrecognized answer values, land nowhere.
    pub fn compute(
        store: &StateStore<'_>,
        story: StoryId,
        participants: &[Participant],
    ) -> Self {
        let mut buckets: BTreeMap<Answer, Vec<Voter>> = BTreeMap::new();
        for participant in participants {
            let key = StateKey::answer(story, &participant.id);
            let Some(answer) = store.get(&key).and_then(|raw| raw.parse::<Answer>().ok())
            else {
                continue;
            };
            // The host stamps every write; a missing stamp sorts first
            // rather than dropping the vote.
            let voted_at = store
                .metadata(&key)
                .map(|meta| meta.timestamp)
                .unwrap_or(DateTime::<Utc>::MIN_UTC);
            buckets.entry(answer).or_default().push(Voter {
                participant: participant.id.clone(),
                display_name: short_display_name(&participant.display_name).to_string(),
                voted_at,
            });
        }
        for bucket in buckets.values_mut() {
            bucket.sort_by_key(|voter| voter.voted_at);
        }
        Self { buckets }
    }

    pub fn bucket(&self, answer: Answer) -> &[Voter] {
        self.buckets.get(&answer).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True iff the participant appears in any bucket.
    pub fn has_responded(&self, participant: &ParticipantId) -> bool {
        self.buckets
            .values()
            .any(|bucket| bucket.iter().any(|voter| &voter.participant == participant))
    }

    /// Count of participants with a recognized recorded answer.
    pub fn total(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}
