//! Typed read views over the replicated session data.

use shared::{
    domain::Participant,
    protocol::{EntryMeta, SharedState},
};

use crate::keys::StateKey;

/// Everything the engine knows about the session at one instant. Snapshots
/// are replaced wholesale on every host push and never mutated in place.
///
/// `shared` and `roster` start out absent: a session that has not yet
/// received its first push is "not ready", which is distinct from a session
/// whose replicated state happens to be empty.
#[derive(Debug, Clone, Default)]
pub struct SessionSnapshot {
    pub shared: Option<SharedState>,
    pub roster: Option<Vec<Participant>>,
}

impl SessionSnapshot {
    pub fn is_ready(&self) -> bool {
        self.shared.is_some() && self.roster.is_some()
    }
}

/// Read-only typed view over one [`SharedState`] snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StateStore<'a> {
    state: &'a SharedState,
}

impl<'a> StateStore<'a> {
    pub fn new(state: &'a SharedState) -> Self {
        Self { state }
    }

    pub fn get(&self, key: &StateKey) -> Option<&'a str> {
        self.state.entries.get(&key.encode()).map(String::as_str)
    }

    pub fn metadata(&self, key: &StateKey) -> Option<&'a EntryMeta> {
        self.state.metadata.get(&key.encode())
    }

    /// Raw scan over every entry, in map order.
    pub fn entries(&self) -> impl Iterator<Item = (&'a str, &'a str)> {
        self.state
            .entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Scan yielding only entries whose key matches the engine's grammar.
    /// Foreign keys sharing the namespace are skipped, not errors.
    pub fn decoded_entries(&self) -> impl Iterator<Item = (StateKey, &'a str)> {
        self.entries()
            .filter_map(|(raw, value)| StateKey::parse(raw).map(|key| (key, value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::domain::ParticipantId;

    #[test]
    fn foreign_keys_are_invisible_to_decoded_scans() {
        let mut state = SharedState::default();
        state
            .entries
            .insert("p-1:status".into(), "here".into());
        state
            .entries
            .insert("some.other.app/config".into(), "{}".into());

        let store = StateStore::new(&state);
        let decoded: Vec<_> = store.decoded_entries().collect();
        assert_eq!(decoded.len(), 1);
        assert_eq!(
            decoded[0].0,
            StateKey::Status(ParticipantId::from("p-1"))
        );
        assert_eq!(store.entries().count(), 2);
    }

    #[test]
    fn snapshot_readiness_requires_state_and_roster() {
        let mut snapshot = SessionSnapshot::default();
        assert!(!snapshot.is_ready());
        snapshot.shared = Some(SharedState::default());
        assert!(!snapshot.is_ready());
        snapshot.roster = Some(Vec::new());
        assert!(snapshot.is_ready());
    }
}
