//! The serialized queue engine: one mutex around the whole floor, with
//! persist-then-commit semantics and change notices.
//!
//! Every mutating entry point follows the same shape:
//!
//! 1. take the lock (the single serialization point across all machines —
//!    cross-machine exclusivity needs a globally consistent view),
//! 2. run the expiry sweep on a working copy and commit it,
//! 3. run the requested transition on a fresh working copy,
//! 4. save the resulting snapshot; only then swap the working copy in,
//! 5. release the lock and publish one change notice.
//!
//! The working-copy discipline is what makes failures atomic: a rejected
//! transition or a failed save leaves the guarded state exactly as it
//! was, so no caller ever observes a half-applied operation. Notices go
//! out after the lock is released and are best-effort — observers pull
//! full snapshots, so a lost notice can't diverge anyone's view.

use std::time::Duration;

use coinline_notify::{ChangeBus, ChangeFeed};
use coinline_protocol::{FullState, MachineId, PlayerHandle, Timestamp};
use coinline_store::StateStore;
use tokio::sync::Mutex;

use crate::{Clock, EngineConfig, EngineError, FloorState};

/// The Coinline queue engine.
///
/// Generic over its store and clock so tests can run on an in-memory
/// store with a hand-driven clock while production uses SQLite and the
/// system clock.
pub struct QueueEngine<S: StateStore, C: Clock> {
    state: Mutex<FloorState>,
    store: S,
    clock: C,
    bus: ChangeBus,
}

impl<S: StateStore, C: Clock> QueueEngine<S, C> {
    /// Opens the engine, rehydrating the floor from the store.
    ///
    /// A fresh store starts an all-idle floor and writes its initial
    /// snapshot immediately, so a crash before the first operation still
    /// rehydrates cleanly.
    pub async fn open(
        config: EngineConfig,
        store: S,
        clock: C,
    ) -> Result<Self, EngineError> {
        let state = match store.load().await? {
            Some(snapshot) => {
                let state = FloorState::from_snapshot(config, &snapshot);
                tracing::info!("floor state restored from store");
                state
            }
            None => {
                let state = FloorState::new(config);
                store.save(&state.snapshot()).await?;
                tracing::info!("fresh floor state initialized");
                state
            }
        };
        Ok(Self {
            state: Mutex::new(state),
            store,
            clock,
            bus: ChangeBus::default(),
        })
    }

    /// Subscribes to change notices.
    pub fn subscribe(&self) -> ChangeFeed {
        self.bus.subscribe()
    }

    /// The engine's current wall-clock time.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    // -- Player operations -------------------------------------------------

    /// Joins a machine's queue.
    pub async fn join(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.join(machine, player, now)?)).await
    }

    /// Accepts a pending turn offer.
    pub async fn accept_turn(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.accept(machine, player, now)?))
            .await
    }

    /// Finishes an active turn, returning its elapsed duration for the
    /// reward accrual downstream.
    pub async fn finish_turn(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<Duration, EngineError> {
        self.run(|floor, now| Ok(floor.finish(machine, player, now)?))
            .await
    }

    /// Forfeits a pending turn offer.
    pub async fn skip_turn(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.skip(machine, player, now)?)).await
    }

    /// Leaves a machine's queue (or abandons one's own pending offer).
    pub async fn leave(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.leave(machine, player, now)?)).await
    }

    /// Returns a consistent snapshot of the whole floor.
    ///
    /// Reads run the expiry sweep too, so callers never observe a stale
    /// offer or a lapsed cooldown no matter how quiet the floor is.
    pub async fn snapshot(&self) -> Result<FullState, EngineError> {
        self.run(|floor, _| Ok(floor.snapshot())).await
    }

    /// Runs just the expiry sweep. Invoked by the background scheduler;
    /// every other entry point sweeps on its own.
    pub async fn sweep(&self) -> Result<(), EngineError> {
        self.run(|_, _| Ok(())).await
    }

    // -- Administrative operations -----------------------------------------

    /// Pauses or resumes the floor.
    pub async fn set_paused(&self, paused: bool) -> Result<(), EngineError> {
        self.run(|floor, now| {
            floor.set_paused(paused, now);
            Ok(())
        })
        .await
    }

    /// Installs a player as a machine's active holder.
    pub async fn force_set_holder(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.force_set_holder(machine, player, now)?))
            .await
    }

    /// Evicts a player from a machine (queue, offer, or active turn).
    pub async fn remove_from_queue(
        &self,
        machine: &MachineId,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.remove_from_queue(machine, player, now)?))
            .await
    }

    /// Replaces a machine's queue with a permutation of itself.
    pub async fn reorder_queue(
        &self,
        machine: &MachineId,
        order: Vec<PlayerHandle>,
    ) -> Result<(), EngineError> {
        self.run(|floor, now| Ok(floor.reorder_queue(machine, order, now)?))
            .await
    }

    /// Soft-resets a player's displayed counters.
    pub async fn reset_stats(
        &self,
        player: &PlayerHandle,
    ) -> Result<(), EngineError> {
        self.run(|floor, _| Ok(floor.reset_stats(player)?)).await
    }

    // -- Internals ---------------------------------------------------------

    /// The single mutation path described in the module docs.
    async fn run<T>(
        &self,
        op: impl FnOnce(&mut FloorState, Timestamp) -> Result<T, EngineError>,
    ) -> Result<T, EngineError> {
        let now = self.clock.now();
        let mut guard = self.state.lock().await;
        let mut changed = false;

        // Sweep first, committed on its own, so a rejected operation
        // still leaves expiries applied.
        let mut swept = guard.clone();
        swept.expire_sweep(now);
        if swept != *guard {
            self.store.save(&swept.snapshot()).await?;
            *guard = swept;
            changed = true;
        }

        let mut working = guard.clone();
        let result = op(&mut working, now);
        if result.is_ok() && working != *guard {
            self.store.save(&working.snapshot()).await?;
            *guard = working;
            changed = true;
        }

        drop(guard);
        if changed {
            self.bus.publish();
        }
        result
    }
}
