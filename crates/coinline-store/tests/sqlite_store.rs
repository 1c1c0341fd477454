//! Integration tests for the SQLite store: a snapshot written through
//! `save` must come back from `load` exactly, field for field.

use coinline_protocol::{
    CooldownSnapshot, FullState, MachineId, MachineSnapshot, PlayerHandle,
    PlayerSnapshot, Timestamp, TurnPhase,
};
use coinline_store::{SqliteStore, StateStore};

fn handle(h: &str) -> PlayerHandle {
    PlayerHandle::new(h)
}

fn machine(id: &str) -> MachineId {
    MachineId::new(id)
}

/// A floor with every field shape exercised: an active turn, a pending
/// offer with a deadline, an idle machine, stats, and a cooldown.
fn busy_floor() -> FullState {
    FullState {
        machines: vec![
            MachineSnapshot {
                id: machine("Maimai"),
                queue: vec![handle("bob"), handle("carol")],
                holder: Some(handle("alice")),
                phase: TurnPhase::Active,
                turn_started: Some(Timestamp::from_millis(50_000)),
                turn_deadline: None,
                active_since: Some(Timestamp::from_millis(55_000)),
            },
            MachineSnapshot {
                id: machine("Chunithm"),
                queue: vec![handle("dave")],
                holder: None,
                phase: TurnPhase::AwaitingAccept,
                turn_started: Some(Timestamp::from_millis(58_000)),
                turn_deadline: Some(Timestamp::from_millis(118_000)),
                active_since: None,
            },
            MachineSnapshot {
                id: machine("Wacca"),
                queue: vec![],
                holder: None,
                phase: TurnPhase::Idle,
                turn_started: None,
                turn_deadline: None,
                active_since: None,
            },
        ],
        players: vec![
            PlayerSnapshot {
                handle: handle("alice"),
                play_time_ms: 600_000,
                play_time_offset_ms: 120_000,
                skip_count: 2,
                session_count: 9,
            },
            PlayerSnapshot {
                handle: handle("bob"),
                play_time_ms: 0,
                play_time_offset_ms: 0,
                skip_count: 0,
                session_count: 0,
            },
        ],
        cooldowns: vec![CooldownSnapshot {
            player: handle("erin"),
            machine: machine("Wacca"),
            expires_at: Timestamp::from_millis(70_000),
        }],
        paused: false,
        pause_started: None,
    }
}

#[tokio::test]
async fn test_load_fresh_database_returns_none() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_then_load_round_trips_exactly() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = busy_floor();

    store.save(&state).await.unwrap();
    let loaded = store.load().await.unwrap().expect("should be saved");

    assert_eq!(loaded, state);
}

#[tokio::test]
async fn test_save_empty_floor_loads_as_saved_not_fresh() {
    // An empty-but-saved floor must be distinguishable from a database
    // that has never been written.
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = FullState {
        machines: vec![],
        players: vec![],
        cooldowns: vec![],
        paused: false,
        pause_started: None,
    };

    store.save(&state).await.unwrap();

    assert_eq!(store.load().await.unwrap(), Some(state));
}

#[tokio::test]
async fn test_save_replaces_previous_snapshot() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    store.save(&busy_floor()).await.unwrap();

    let mut second = busy_floor();
    second.machines[0].queue.clear();
    second.cooldowns.clear();
    second.paused = true;
    second.pause_started = Some(Timestamp::from_millis(99_000));
    store.save(&second).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded, second);
    assert!(loaded.paused);
    assert_eq!(loaded.pause_started, Some(Timestamp::from_millis(99_000)));
}

#[tokio::test]
async fn test_machine_order_is_preserved() {
    // Machines come back in configured (saved) order, not alphabetical.
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = busy_floor();

    store.save(&state).await.unwrap();
    let loaded = store.load().await.unwrap().unwrap();

    let ids: Vec<&str> = loaded.machines.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["Maimai", "Chunithm", "Wacca"]);
}

#[tokio::test]
async fn test_double_save_is_idempotent() {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let state = busy_floor();

    store.save(&state).await.unwrap();
    store.save(&state).await.unwrap();

    assert_eq!(store.load().await.unwrap(), Some(state));
}
