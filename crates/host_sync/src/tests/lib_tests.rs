use super::*;

#[tokio::test]
async fn join_broadcasts_roster_to_existing_subscribers() {
    let room = InMemoryRoom::new();
    let alice = room.join("alice", None).await;
    let mut events = alice.subscribe_events();

    let _bob = room.join("bob", None).await;

    match events.recv().await.expect("event") {
        HostEvent::ParticipantsChanged { participants } => {
            assert_eq!(participants.len(), 2);
            assert_eq!(participants[1].display_name, "bob");
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn leave_keeps_departed_participants_entries() {
    let room = InMemoryRoom::new();
    let alice = room.join("alice", None).await;
    alice
        .submit_delta(StateDelta::set("k", "v"))
        .await
        .expect("submit");

    room.leave(&alice.local_participant_id()).await;

    assert!(room.roster().await.is_empty());
    assert_eq!(room.snapshot().await.entries.get("k").map(String::as_str), Some("v"));
}

#[tokio::test]
async fn later_write_to_same_key_wins() {
    let room = InMemoryRoom::new();
    let alice = room.join("alice", None).await;
    let bob = room.join("bob", None).await;

    alice
        .submit_delta(StateDelta::set("k", "from-alice"))
        .await
        .expect("submit");
    bob.submit_delta(StateDelta::set("k", "from-bob"))
        .await
        .expect("submit");

    let state = room.snapshot().await;
    assert_eq!(state.entries.get("k").map(String::as_str), Some("from-bob"));
    assert_eq!(
        state.metadata.get("k").map(|m| m.writer.clone()),
        Some(bob.local_participant_id())
    );
}

#[tokio::test]
async fn write_stamps_strictly_advance() {
    let room = InMemoryRoom::new();
    let host = room.join("alice", None).await;

    for i in 0..5 {
        host.submit_delta(StateDelta::set(format!("k{i}"), "v"))
            .await
            .expect("submit");
    }

    let state = room.snapshot().await;
    let mut stamps: Vec<_> = (0..5)
        .map(|i| state.metadata[&format!("k{i}")].timestamp)
        .collect();
    let sorted = {
        let mut s = stamps.clone();
        s.sort();
        s
    };
    assert_eq!(stamps, sorted);
    stamps.dedup();
    assert_eq!(stamps.len(), 5, "stamps must be unique");
}

#[tokio::test]
async fn removal_drops_key_and_metadata() {
    let room = InMemoryRoom::new();
    let host = room.join("alice", None).await;
    host.submit_delta(StateDelta::set("k", "v"))
        .await
        .expect("submit");

    host.submit_delta(StateDelta::remove("k"))
        .await
        .expect("submit");

    let state = room.snapshot().await;
    assert!(state.entries.is_empty());
    assert!(state.metadata.is_empty());
}

#[tokio::test]
async fn empty_delta_emits_no_event() {
    let room = InMemoryRoom::new();
    let host = room.join("alice", None).await;
    let mut events = host.subscribe_events();

    host.submit_delta(StateDelta::default())
        .await
        .expect("submit");
    host.submit_delta(StateDelta::set("k", "v"))
        .await
        .expect("submit");

    match events.recv().await.expect("event") {
        HostEvent::StateChanged { state } => {
            assert_eq!(state.entries.len(), 1);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn missing_host_fails_every_operation() {
    let host = MissingSessionHost::new();
    assert!(host.submit_delta(StateDelta::set("k", "v")).await.is_err());
    assert!(host.current_state().await.is_err());
    assert!(host.current_participants().await.is_err());
}
