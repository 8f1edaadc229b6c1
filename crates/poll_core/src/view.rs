//! Assembles the immutable render-ready view of the session. Pure data in,
//! pure data out; the rendering surface lives entirely outside this crate.

use std::collections::HashMap;

use serde::Serialize;
use shared::domain::{short_display_name, ParticipantId, StoryId, VoteFlag};

use crate::{
    keys::StateKey,
    store::{SessionSnapshot, StateStore},
    stories,
    votes::Tally,
};

/// One story row: text plus how many recorded answers it has accumulated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StorySummary {
    pub id: StoryId,
    pub text: String,
    pub answer_count: usize,
}

/// Per-participant decorated display data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParticipantCard {
    pub id: ParticipantId,
    pub display_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub status: String,
    pub vote_flag: VoteFlag,
}

/// Snapshot handed to the rendering layer. Recomputed from scratch on every
/// change; no incremental diffing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub active_story: Option<StorySummary>,
    pub stories: Vec<StorySummary>,
    pub tally: Tally,
    pub participants: Vec<ParticipantCard>,
    pub responded_by_me: bool,
    pub total_votes: usize,
}

/// Builds the view for one snapshot, or `None` while the session is still
/// missing its state or roster ("not ready" is never rendered as "empty").
pub fn build(snapshot: &SessionSnapshot, local_id: &ParticipantId) -> Option<ViewModel> {
    let shared = snapshot.shared.as_ref()?;
    let roster = snapshot.roster.as_ref()?;
    let store = StateStore::new(shared);

    let answer_counts = count_answers(&store);
    let stories: Vec<StorySummary> = stories::list_stories(&store)
        .into_iter()
        .map(|story| StorySummary {
            answer_count: answer_counts.get(&story.id).copied().unwrap_or(0),
            id: story.id,
            text: story.text,
        })
        .collect();

    let active = stories::resolve_active(&store)
        .and_then(|story| stories.iter().find(|s| s.id == story.id).cloned());

    let tally = active
        .as_ref()
        .map(|story| Tally::compute(&store, story.id, roster))
        .unwrap_or_default();

    let participants = roster
        .iter()
        .map(|participant| ParticipantCard {
            id: participant.id.clone(),
            display_name: short_display_name(&participant.display_name).to_string(),
            avatar_url: participant.avatar_url.clone(),
            status: store
                .get(&StateKey::status(&participant.id))
                .unwrap_or_default()
                .to_string(),
            vote_flag: VoteFlag::from_state(store.get(&StateKey::vote_status(&participant.id))),
        })
        .collect();

    let responded_by_me = tally.has_responded(local_id);
    let total_votes = tally.total();

    Some(ViewModel {
        active_story: active,
        stories,
        tally,
        participants,
        responded_by_me,
        total_votes,
    })
}

/// Recorded-answer counts per story, over the whole store. Only recognized
/// answer literals count.
fn count_answers(store: &StateStore<'_>) -> HashMap<StoryId, usize> {
    let mut counts: HashMap<StoryId, usize> = HashMap::new();
    for (key, value) in store.decoded_entries() {
        if let StateKey::Answer { story, .. } = key {
            if value.parse::<shared::domain::Answer>().is_ok() {
                *counts.entry(story).or_default() += 1;
            }
        }
    }
    counts
}
