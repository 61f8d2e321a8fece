//! Integration tests for the room: the lobby and coin-flip scenarios end to
//! end, randomized operation sequences, and concurrent access through the
//! same `Mutex<Room>` the server uses.

use std::collections::HashSet;
use std::sync::Arc;

use headstails_protocol::{
    Choice, Message, MessageType, PlayerId, Stage, TakenChoices,
};
use headstails_room::{
    ARBITRATION_SIZE, FixedFlipper, Outbox, Resolution, Room, RoomError,
};
use rand::Rng;
use tokio::sync::Mutex;

// =========================================================================
// Helpers
// =========================================================================

/// Asserts the invariants that must hold between any two room operations.
fn assert_invariants(room: &Room) {
    let taken = room.taken_choices();
    let sides: HashSet<Choice> = taken.values().copied().collect();
    assert_eq!(sides.len(), taken.len(), "two players share a side: {taken:?}");
    assert!(taken.len() < ARBITRATION_SIZE, "unresolved full round: {taken:?}");
    for id in taken.keys() {
        assert!(room.player(*id).is_some(), "choice from absent player {id}");
    }
}

fn side(heads: bool) -> &'static str {
    if heads { "heads" } else { "tails" }
}

// =========================================================================
// Scenarios
// =========================================================================

#[test]
fn test_second_player_cannot_take_the_same_side() {
    let mut room = Room::new();
    let a = room.admit("A");
    let b = room.admit("B");

    room.record_choice(a.id, "heads").unwrap();
    let err = room.record_choice(b.id, "heads").unwrap_err();

    match err {
        RoomError::ChoiceTaken { choice, holder } => {
            assert_eq!(choice, Choice::Heads);
            assert_eq!(holder, a.id);
        }
        other => panic!("expected ChoiceTaken, got {other:?}"),
    }
    let expected: TakenChoices = [(a.id, Choice::Heads)].into_iter().collect();
    assert_eq!(room.taken_choices(), &expected);
}

#[test]
fn test_everyone_ready_starts_the_game_exactly_once() {
    let mut room = Room::new();
    let a = room.admit("A");
    let b = room.admit("B");

    let mut stage_changes = Vec::new();
    stage_changes.push(room.set_ready(a.id, true).unwrap());
    assert_eq!(room.stage(), Stage::Lobby);
    stage_changes.push(room.set_ready(b.id, true).unwrap());
    stage_changes.push(room.set_ready(a.id, true).unwrap());
    stage_changes.push(room.set_ready(b.id, false).unwrap());
    stage_changes.push(room.set_ready(b.id, true).unwrap());

    let events: Vec<Stage> = stage_changes.into_iter().flatten().collect();
    assert_eq!(events, vec![Stage::GameStarted]);
    assert_eq!(room.stage(), Stage::GameStarted);
}

#[test]
fn test_empty_room_never_starts() {
    let mut room = Room::new();
    let a = room.admit("A");
    room.remove(a.id);
    assert!(room.is_empty());
    assert!(room.set_ready(a.id, true).is_err());
    assert_eq!(room.stage(), Stage::Lobby);
}

#[test]
fn test_late_joiner_blocks_the_start() {
    let mut room = Room::new();
    let a = room.admit("A");
    let b = room.admit("B");
    room.set_ready(a.id, true).unwrap();
    let c = room.admit("C");
    assert_eq!(room.set_ready(b.id, true).unwrap(), None);
    assert_eq!(room.set_ready(c.id, true).unwrap(), Some(Stage::GameStarted));
}

#[test]
fn test_two_choices_resolve_the_round() {
    for flip in [Choice::Heads, Choice::Tails] {
        let mut room = Room::with_flipper(FixedFlipper(flip));
        let a = room.admit("A");
        let b = room.admit("B");

        let first = room.record_choice(a.id, "heads").unwrap();
        assert!(first.resolution.is_none());
        let second = room.record_choice(b.id, "tails").unwrap();

        let expected_winner = if flip == Choice::Heads { a.id } else { b.id };
        assert_eq!(
            second.resolution,
            Some(Resolution {
                flip,
                winner: Some(expected_winner),
            })
        );
        assert_eq!(second.taken.get(&expected_winner), Some(&flip));
        assert!(room.taken_choices().is_empty());
    }
}

#[test]
fn test_new_round_starts_after_resolution() {
    let mut room = Room::with_flipper(FixedFlipper(Choice::Tails));
    let a = room.admit("A");
    let b = room.admit("B");
    room.record_choice(a.id, "heads").unwrap();
    room.record_choice(b.id, "tails").unwrap();

    // Sides are free again; swap them.
    room.record_choice(a.id, "tails").unwrap();
    let outcome = room.record_choice(b.id, "heads").unwrap();
    assert_eq!(outcome.resolution.unwrap().winner, Some(a.id));
}

#[test]
fn test_third_player_can_settle_a_round() {
    // Arbitration looks at pending choices only, not at room size.
    let mut room = Room::with_flipper(FixedFlipper(Choice::Heads));
    let a = room.admit("A");
    let _b = room.admit("B");
    let c = room.admit("C");

    room.record_choice(c.id, "tails").unwrap();
    let outcome = room.record_choice(a.id, "heads").unwrap();
    assert_eq!(outcome.resolution.unwrap().winner, Some(a.id));
}

#[test]
fn test_leaving_player_frees_their_side() {
    let mut room = Room::new();
    let a = room.admit("A");
    let b = room.admit("B");
    room.record_choice(a.id, "heads").unwrap();
    room.remove(a.id);

    let outcome = room.record_choice(b.id, "heads").unwrap();
    assert!(outcome.resolution.is_none());
    assert_eq!(outcome.taken.len(), 1);
}

#[test]
fn test_messages_flow_through_attached_outboxes() {
    let mut room = Room::new();
    let a = room.admit("A");
    let (outbox, mut inbox) = Outbox::channel();
    room.attach(a.id, outbox).unwrap();

    room.send_to(a.id, Message::new(MessageType::Joined)).unwrap();
    room.broadcast(Message::new(MessageType::Waiting));

    assert_eq!(inbox.try_recv().unwrap().kind, MessageType::Joined);
    assert_eq!(inbox.try_recv().unwrap().kind, MessageType::Waiting);
}

// =========================================================================
// Randomized sequences
// =========================================================================

#[test]
fn test_random_operation_sequences_keep_invariants() {
    let mut rng = rand::rng();

    for _ in 0..50 {
        let mut room = Room::new();
        let mut ids: Vec<PlayerId> =
            (0..4).map(|i| room.admit(format!("p{i}")).id).collect();
        let mut started = 0;

        for _ in 0..200 {
            let id = if ids.is_empty() || rng.random_bool(0.05) {
                PlayerId::new()
            } else {
                ids[rng.random_range(0..ids.len())]
            };
            match rng.random_range(0..10) {
                0 => {
                    ids.push(room.admit("late").id);
                }
                1 => {
                    room.remove(id);
                    ids.retain(|p| *p != id);
                }
                2 | 3 => {
                    if let Ok(Some(_)) = room.set_ready(id, rng.random_bool(0.7)) {
                        started += 1;
                    }
                }
                _ => {
                    let before = room.taken_choices().clone();
                    match room.record_choice(id, side(rng.random_bool(0.5))) {
                        Ok(outcome) => {
                            let sides: HashSet<_> =
                                outcome.taken.values().collect();
                            assert_eq!(sides.len(), outcome.taken.len());
                            assert_eq!(
                                outcome.resolution.is_some(),
                                outcome.taken.len() == ARBITRATION_SIZE
                            );
                            if let Some(res) = outcome.resolution {
                                let winner = res.winner.expect("both sides taken");
                                assert_eq!(outcome.taken.get(&winner), Some(&res.flip));
                            }
                        }
                        Err(_) => assert_eq!(room.taken_choices(), &before),
                    }
                }
            }
            assert_invariants(&room);
        }
        assert!(started <= 1, "stage changed {started} times");
    }
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_choices_never_share_a_side() {
    let room = Arc::new(Mutex::new(Room::new()));
    let ids: Vec<PlayerId> = {
        let mut room = room.lock().await;
        (0..8).map(|i| room.admit(format!("p{i}")).id).collect()
    };

    let mut tasks = Vec::new();
    for (n, id) in ids.into_iter().enumerate() {
        let room = Arc::clone(&room);
        tasks.push(tokio::spawn(async move {
            let mut resolutions = 0;
            for round in 0..200 {
                let heads = (n + round) % 3 != 0;
                let mut room = room.lock().await;
                match room.record_choice(id, side(heads)) {
                    Ok(outcome) => {
                        if let Some(res) = outcome.resolution {
                            assert_eq!(outcome.taken.len(), ARBITRATION_SIZE);
                            let winner = res.winner.expect("both sides taken");
                            assert_eq!(outcome.taken.get(&winner), Some(&res.flip));
                            resolutions += 1;
                        }
                    }
                    Err(RoomError::ChoiceTaken { holder, .. }) => {
                        assert_ne!(holder, id);
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
                assert_invariants(&room);
                drop(room);
                tokio::task::yield_now().await;
            }
            resolutions
        }));
    }

    let mut total = 0;
    for task in tasks {
        total += task.await.expect("task panicked");
    }
    assert!(total > 0, "no round ever resolved");
    assert_invariants(&*room.lock().await);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_ready_emits_one_stage_change() {
    let room = Arc::new(Mutex::new(Room::new()));
    let ids: Vec<PlayerId> = {
        let mut room = room.lock().await;
        (0..16).map(|i| room.admit(format!("p{i}")).id).collect()
    };

    let mut tasks = Vec::new();
    for id in ids {
        let room = Arc::clone(&room);
        tasks.push(tokio::spawn(async move {
            room.lock().await.set_ready(id, true).unwrap()
        }));
    }

    let mut changes = 0;
    for task in tasks {
        if task.await.unwrap().is_some() {
            changes += 1;
        }
    }
    assert_eq!(changes, 1);
    assert_eq!(room.lock().await.stage(), Stage::GameStarted);
}
