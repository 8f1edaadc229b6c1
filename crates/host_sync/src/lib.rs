//! Host-platform contract for the shared replicated state, plus an
//! in-process reference host used by tests and the demo tooling.
//!
//! The real host owns transport, delivery, and per-key last-write-wins
//! resolution; this crate only pins down the interface the engine consumes.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, Mutex};
use tracing::debug;
use uuid::Uuid;

use shared::{
    domain::{Participant, ParticipantId},
    protocol::{EntryMeta, HostEvent, SharedState, StateDelta},
};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// The surface the host platform exposes to one local participant.
#[async_trait]
pub trait SessionHost: Send + Sync {
    /// Applies additions and removals to the shared state. Fire-and-forget
    /// from the caller's perspective; a submitted delta may not be visible in
    /// the very next snapshot.
    async fn submit_delta(&self, delta: StateDelta) -> Result<()>;

    /// Snapshot already held by the host, if any. Used to seed a session that
    /// attached after the first push.
    async fn current_state(&self) -> Result<Option<SharedState>>;

    /// Roster already held by the host, if any.
    async fn current_participants(&self) -> Result<Option<Vec<Participant>>>;

    /// Ephemeral identity of the local participant, stable for the session.
    fn local_participant_id(&self) -> ParticipantId;

    /// Push feed of state and roster changes, delivered in order.
    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent>;
}

/// Null object for sessions wired up before a real host is attached.
/// Every operation fails; the event feed never yields.
pub struct MissingSessionHost {
    events: broadcast::Sender<HostEvent>,
}

impl MissingSessionHost {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(1);
        Self { events }
    }
}

impl Default for MissingSessionHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionHost for MissingSessionHost {
    async fn submit_delta(&self, _delta: StateDelta) -> Result<()> {
        Err(anyhow!("session host is unavailable"))
    }

    async fn current_state(&self) -> Result<Option<SharedState>> {
        Err(anyhow!("session host is unavailable"))
    }

    async fn current_participants(&self) -> Result<Option<Vec<Participant>>> {
        Err(anyhow!("session host is unavailable"))
    }

    fn local_participant_id(&self) -> ParticipantId {
        ParticipantId::from("unattached-local")
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.events.subscribe()
    }
}

struct RoomShared {
    state: SharedState,
    roster: Vec<Participant>,
    last_stamp: DateTime<Utc>,
}

/// In-process replicated-state room: one shared blob, many attached
/// participants. Applies deltas under a single lock, which gives every
/// subscriber the globally ordered snapshot sequence the real host
/// guarantees.
pub struct InMemoryRoom {
    inner: Mutex<RoomShared>,
    events: broadcast::Sender<HostEvent>,
}

impl InMemoryRoom {
    pub fn new() -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Arc::new(Self {
            inner: Mutex::new(RoomShared {
                state: SharedState::default(),
                roster: Vec::new(),
                last_stamp: DateTime::<Utc>::MIN_UTC,
            }),
            events,
        })
    }

    /// Attaches a new participant with a freshly minted ephemeral id and
    /// pushes the updated roster to everyone.
    pub async fn join(
        self: &Arc<Self>,
        display_name: impl Into<String>,
        avatar_url: Option<String>,
    ) -> Arc<InMemoryHost> {
        let participant = Participant {
            id: ParticipantId(Uuid::new_v4().to_string()),
            display_name: display_name.into(),
            avatar_url,
        };
        let id = participant.id.clone();
        {
            // Broadcast under the lock so subscribers never observe roster
            // updates out of order.
            let mut inner = self.inner.lock().await;
            inner.roster.push(participant);
            let _ = self.events.send(HostEvent::ParticipantsChanged {
                participants: inner.roster.clone(),
            });
        }
        debug!(participant_id = %id, "participant joined room");
        Arc::new(InMemoryHost {
            room: Arc::clone(self),
            local_id: id,
        })
    }

    /// Drops a participant from the roster. Their replicated entries stay
    /// behind, as they would on the real host.
    pub async fn leave(&self, id: &ParticipantId) {
        {
            let mut inner = self.inner.lock().await;
            inner.roster.retain(|p| &p.id != id);
            let _ = self.events.send(HostEvent::ParticipantsChanged {
                participants: inner.roster.clone(),
            });
        }
        debug!(participant_id = %id, "participant left room");
    }

    pub async fn snapshot(&self) -> SharedState {
        self.inner.lock().await.state.clone()
    }

    pub async fn roster(&self) -> Vec<Participant> {
        self.inner.lock().await.roster.clone()
    }

    async fn apply(&self, delta: StateDelta, writer: &ParticipantId) {
        if delta.is_empty() {
            return;
        }
        let mut inner = self.inner.lock().await;
        // Write stamps must keep advancing even for same-millisecond writes
        // or a wall clock stepping backwards.
        let stamp = Utc::now().max(inner.last_stamp + Duration::milliseconds(1));
        inner.last_stamp = stamp;
        for key in &delta.remove {
            inner.state.entries.remove(key);
            inner.state.metadata.remove(key);
        }
        for (key, value) in delta.add {
            inner.state.entries.insert(key.clone(), value);
            inner.state.metadata.insert(
                key,
                EntryMeta {
                    timestamp: stamp,
                    writer: writer.clone(),
                },
            );
        }
        // Broadcast under the lock so every subscriber sees the same
        // monotonically advancing snapshot sequence.
        let _ = self.events.send(HostEvent::StateChanged {
            state: inner.state.clone(),
        });
    }
}

/// One participant's handle onto an [`InMemoryRoom`].
pub struct InMemoryHost {
    room: Arc<InMemoryRoom>,
    local_id: ParticipantId,
}

#[async_trait]
impl SessionHost for InMemoryHost {
    async fn submit_delta(&self, delta: StateDelta) -> Result<()> {
        self.room.apply(delta, &self.local_id).await;
        Ok(())
    }

    async fn current_state(&self) -> Result<Option<SharedState>> {
        Ok(Some(self.room.snapshot().await))
    }

    async fn current_participants(&self) -> Result<Option<Vec<Participant>>> {
        Ok(Some(self.room.roster().await))
    }

    fn local_participant_id(&self) -> ParticipantId {
        self.local_id.clone()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.room.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
