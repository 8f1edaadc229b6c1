//! User-story registry: extracting the defined questions from the store and
//! resolving the active one.

use chrono::Utc;
use shared::{
    domain::{clamp_text, StoryId},
    protocol::StateDelta,
};

use crate::{keys::StateKey, store::StateStore};

/// One polling question. Never deleted, only superseded by a newer active
/// pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStory {
    pub id: StoryId,
    pub text: String,
}

/// All defined stories, oldest first. Ordering comes from the creation id
/// embedded in the key, never from map iteration order.
pub fn list_stories(store: &StateStore<'_>) -> Vec<UserStory> {
    let mut stories: Vec<UserStory> = store
        .decoded_entries()
        .filter_map(|(key, text)| match key {
            StateKey::StoryText(id) => Some(UserStory {
                id,
                text: text.to_string(),
            }),
            _ => None,
        })
        .collect();
    stories.sort_by_key(|story| story.id);
    stories
}

/// The raw active-story pointer, if present and well-formed.
pub fn active_story_id(store: &StateStore<'_>) -> Option<StoryId> {
    store
        .get(&StateKey::ActiveStory)?
        .parse::<i64>()
        .ok()
        .map(StoryId)
}

/// The active story, required to reference a defined one. A pointer left
/// dangling by a race decays to `None`, which suppresses vote recording
/// downstream instead of crashing.
pub fn resolve_active(store: &StateStore<'_>) -> Option<UserStory> {
    let wanted = active_story_id(store)?;
    list_stories(store)
        .into_iter()
        .find(|story| story.id == wanted)
}

/// Delta defining a new story. The id is minted from the current time and
/// doubles as the story's creation order.
pub fn create_story_delta(text: &str) -> (StoryId, StateDelta) {
    let id = StoryId(Utc::now().timestamp_millis());
    let delta = StateDelta::set(StateKey::StoryText(id).encode(), clamp_text(text));
    (id, delta)
}

/// Delta repointing the single active-story key.
pub fn activate_story_delta(id: StoryId) -> StateDelta {
    StateDelta::set(StateKey::ActiveStory.encode(), id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::protocol::SharedState;

    fn state_with(entries: &[(&str, &str)]) -> SharedState {
        let mut state = SharedState::default();
        for (k, v) in entries {
            state.entries.insert((*k).to_string(), (*v).to_string());
        }
        state
    }

    #[test]
    fn stories_come_back_oldest_first_regardless_of_map_order() {
        let state = state_with(&[
            ("3000:userStory", "third"),
            ("1000:userStory", "first"),
            ("2000:userStory", "second"),
        ]);
        let store = StateStore::new(&state);

        let stories = list_stories(&store);
        let texts: Vec<_> = stories.iter().map(|s| s.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn unscannable_story_entries_are_skipped() {
        let state = state_with(&[
            ("1000:userStory", "good"),
            ("later:userStory", "bad id"),
            ("userStory", "no scope"),
        ]);
        let store = StateStore::new(&state);

        let stories = list_stories(&store);
        assert_eq!(stories.len(), 1);
        assert_eq!(stories[0].id, StoryId(1000));
    }

    #[test]
    fn dangling_active_pointer_resolves_to_none() {
        let state = state_with(&[
            ("1000:userStory", "defined"),
            ("activeUserStory", "2000"),
        ]);
        let store = StateStore::new(&state);

        assert_eq!(active_story_id(&store), Some(StoryId(2000)));
        assert_eq!(resolve_active(&store), None);
    }

    #[test]
    fn garbage_active_pointer_resolves_to_none() {
        let state = state_with(&[("activeUserStory", "not-a-story")]);
        let store = StateStore::new(&state);
        assert_eq!(active_story_id(&store), None);
        assert_eq!(resolve_active(&store), None);
    }

    #[test]
    fn active_pointer_resolves_when_it_references_a_defined_story() {
        let state = state_with(&[
            ("1000:userStory", "defined"),
            ("activeUserStory", "1000"),
        ]);
        let store = StateStore::new(&state);

        let active = resolve_active(&store).expect("active story");
        assert_eq!(active.text, "defined");
    }

    #[test]
    fn created_story_text_is_clamped() {
        let long: String = "s".repeat(300);
        let (id, delta) = create_story_delta(&long);
        let stored = delta
            .add
            .get(&StateKey::StoryText(id).encode())
            .expect("story text");
        assert_eq!(stored.chars().count(), 255);
    }
}
