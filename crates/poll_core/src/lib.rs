//! State reconciliation and derived-view engine for the collaborative
//! planning-poker widget.
//!
//! The host platform replicates a flat key-value blob (plus per-key write
//! metadata) across all session participants and pushes roster changes;
//! everything here is a pure function of the latest snapshot. [`PollSession`]
//! is the thin event-driven shell: it consumes host pushes strictly in
//! order, swaps in each snapshot wholesale, and emits a freshly built
//! [`ViewModel`] for the rendering layer after every change.

use std::sync::Arc;

use host_sync::SessionHost;
use shared::{
    domain::{clamp_text, Answer, ParticipantId, StoryId},
    protocol::{HostEvent, StateDelta},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

pub mod keys;
pub mod store;
pub mod stories;
pub mod view;
pub mod votes;

pub use store::{SessionSnapshot, StateStore};
pub use stories::UserStory;
pub use view::{ParticipantCard, StorySummary, ViewModel};
pub use votes::{Tally, Voter};

const EVENT_CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session intake already started")]
    AlreadyStarted,
}

/// Events fanned out to render-layer subscribers.
#[derive(Debug, Clone)]
pub enum PollEvent {
    /// A fresh view of the session; replaces anything rendered before.
    ViewUpdated(ViewModel),
    /// A background failure (delta submission, host seeding). The session
    /// keeps running on the last good snapshot.
    Error(String),
}

struct SessionInner {
    snapshot: SessionSnapshot,
    editing: bool,
    intake_started: bool,
}

/// One participant's poll session on top of a [`SessionHost`].
pub struct PollSession {
    host: Arc<dyn SessionHost>,
    local_id: ParticipantId,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<PollEvent>,
}

impl PollSession {
    pub fn new(host: Arc<dyn SessionHost>) -> Arc<Self> {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let local_id = host.local_participant_id();
        Arc::new(Self {
            host,
            local_id,
            inner: Mutex::new(SessionInner {
                snapshot: SessionSnapshot::default(),
                editing: false,
                intake_started: false,
            }),
            events,
        })
    }

    pub fn local_participant_id(&self) -> ParticipantId {
        self.local_id.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PollEvent> {
        self.events.subscribe()
    }

    /// Current view, or `None` while the session is not ready.
    pub async fn view(&self) -> Option<ViewModel> {
        let inner = self.inner.lock().await;
        view::build(&inner.snapshot, &self.local_id)
    }

    /// Seeds the snapshot from whatever the host already holds, then spawns
    /// the intake task consuming host pushes for the rest of the session.
    pub async fn start(self: &Arc<Self>) -> Result<(), SessionError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.intake_started {
                return Err(SessionError::AlreadyStarted);
            }
            inner.intake_started = true;
        }

        // Subscribe before seeding so a push racing the seed is buffered
        // rather than lost.
        let mut host_events = self.host.subscribe_events();

        match self.host.current_state().await {
            Ok(Some(state)) => {
                self.ingest(HostEvent::StateChanged { state }).await;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("failed to seed replicated state: {err}");
                let _ = self
                    .events
                    .send(PollEvent::Error(format!("failed to seed state: {err}")));
            }
        }
        match self.host.current_participants().await {
            Ok(Some(participants)) => {
                self.ingest(HostEvent::ParticipantsChanged { participants })
                    .await;
            }
            Ok(None) => {}
            Err(err) => {
                warn!("failed to seed roster: {err}");
                let _ = self
                    .events
                    .send(PollEvent::Error(format!("failed to seed roster: {err}")));
            }
        }

        let session = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match host_events.recv().await {
                    Ok(event) => session.ingest(event).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        // Each push carries the full snapshot, so dropping
                        // stale ones only skips intermediate views.
                        warn!(skipped, "host event intake lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("host event feed closed; intake task exiting");
                        break;
                    }
                }
            }
        });

        Ok(())
    }

    /// Toggle-vote on the active story. Without a valid active story there
    /// is nothing being asked, so no delta is submitted.
    pub async fn answer(&self, answer: Answer) {
        let delta = {
            let inner = self.inner.lock().await;
            let Some(shared) = inner.snapshot.shared.as_ref() else {
                info!("ignoring vote before first state snapshot");
                return;
            };
            let store = StateStore::new(shared);
            let Some(active) = stories::resolve_active(&store) else {
                info!("ignoring vote: no active story");
                return;
            };
            votes::record_vote(&store, &self.local_id, active.id, answer)
        };
        self.submit(delta).await;
    }

    /// Overwrites the local participant's status text, clamped to the
    /// maximum length.
    pub async fn set_status(&self, text: &str) {
        let delta = StateDelta::set(
            keys::StateKey::status(&self.local_id).encode(),
            clamp_text(text),
        );
        self.submit(delta).await;
    }

    /// Defines a new story and returns its id. The story is not activated;
    /// call [`PollSession::activate_story`] to open it for voting.
    pub async fn create_story(&self, text: &str) -> StoryId {
        let (id, delta) = stories::create_story_delta(text);
        info!(story_id = %id, "creating story");
        self.submit(delta).await;
        id
    }

    /// Repoints the shared active-story pointer. Concurrent repoints resolve
    /// last-write-wins at the host.
    pub async fn activate_story(&self, id: StoryId) {
        info!(story_id = %id, "activating story");
        self.submit(stories::activate_story_delta(id)).await;
    }

    /// Gates view emission while the local user edits text. Pushes received
    /// meanwhile still replace the snapshot; they are just not rendered
    /// until the edit ends, at which point one fresh view is emitted.
    pub async fn set_editing(&self, editing: bool) {
        let mut inner = self.inner.lock().await;
        let was_editing = inner.editing;
        inner.editing = editing;
        if was_editing && !editing {
            // Emitted under the lock so the render feed never sees views
            // out of snapshot order.
            if let Some(view) = view::build(&inner.snapshot, &self.local_id) {
                let _ = self.events.send(PollEvent::ViewUpdated(view));
            }
        }
    }

    async fn ingest(&self, event: HostEvent) {
        let mut inner = self.inner.lock().await;
        match event {
            HostEvent::StateChanged { state } => {
                inner.snapshot.shared = Some(state);
            }
            HostEvent::ParticipantsChanged { participants } => {
                inner.snapshot.roster = Some(participants);
            }
        }
        if inner.editing {
            debug!("edit in progress; view recompute skipped");
            return;
        }
        if let Some(view) = view::build(&inner.snapshot, &self.local_id) {
            let _ = self.events.send(PollEvent::ViewUpdated(view));
        }
    }

    /// Fire-and-forget submission: failures are reported on the event feed
    /// and otherwise dropped, with no retry or compensation here.
    async fn submit(&self, delta: StateDelta) {
        if let Err(err) = self.host.submit_delta(delta).await {
            warn!("delta submission failed: {err}");
            let _ = self
                .events
                .send(PollEvent::Error(format!("delta submission failed: {err}")));
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
