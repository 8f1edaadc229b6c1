use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Participant, ParticipantId};

/// A key-scoped mutation of the replicated state, applied atomically by the
/// host. Additions overwrite, removals drop the key and its metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDelta {
    pub add: HashMap<String, String>,
    pub remove: Vec<String>,
}

impl StateDelta {
    /// Delta writing a single key.
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::default().and_set(key, value)
    }

    /// Delta removing a single key.
    pub fn remove(key: impl Into<String>) -> Self {
        Self::default().and_remove(key)
    }

    pub fn and_set(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.add.insert(key.into(), value.into());
        self
    }

    pub fn and_remove(mut self, key: impl Into<String>) -> Self {
        self.remove.push(key.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.add.is_empty() && self.remove.is_empty()
    }
}

/// Per-key provenance recorded by the host on every write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryMeta {
    pub timestamp: DateTime<Utc>,
    pub writer: ParticipantId,
}

/// One wholesale snapshot of the replicated key-value blob and its metadata.
/// State and metadata always travel together.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    pub entries: HashMap<String, String>,
    pub metadata: HashMap<String, EntryMeta>,
}

/// Asynchronous pushes from the host platform. Delivery is strictly
/// sequential per subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum HostEvent {
    StateChanged { state: SharedState },
    ParticipantsChanged { participants: Vec<Participant> },
}
