//! The floor aggregate: every machine's queue/turn state machine, player
//! counters, courtesy cooldowns, and the global pause flag, mutated as one
//! unit.
//!
//! All functions here are pure state transitions: they take the current
//! wall-clock time as an argument, validate their precondition before
//! touching anything, and either apply the full effect or return a typed
//! error with no effect at all. Persistence, locking, and notification
//! live one layer up in [`QueueEngine`](crate::QueueEngine).
//!
//! # Cross-machine exclusivity
//!
//! A player holds at most one machine's active turn. The `active_index`
//! map (player → machine) is maintained on every accept, finish, and
//! force-set, and consulted by `advance_machine` to decide who at the
//! queue head is actually eligible: a head that is busy elsewhere is
//! rotated to just behind the next eligible player — never to the tail,
//! and never with a skip-count penalty.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use coinline_protocol::{
    CooldownSnapshot, FullState, MachineId, MachineSnapshot, PlayerHandle,
    PlayerSnapshot, Timestamp, TurnPhase,
};

use crate::EngineConfig;
use crate::error::{
    AcceptError, AdminError, FinishError, JoinError, LeaveError, SkipError,
};

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// One machine's queue/turn state. During `AwaitingAccept` the offered
/// player is `queue[0]`; `holder` is set only while `Active`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Machine {
    id: MachineId,
    queue: Vec<PlayerHandle>,
    holder: Option<PlayerHandle>,
    phase: TurnPhase,
    turn_started: Option<Timestamp>,
    turn_deadline: Option<Timestamp>,
    active_since: Option<Timestamp>,
}

impl Machine {
    fn new(id: MachineId) -> Self {
        Self {
            id,
            queue: Vec::new(),
            holder: None,
            phase: TurnPhase::Idle,
            turn_started: None,
            turn_deadline: None,
            active_since: None,
        }
    }

    fn clear_offer(&mut self) {
        self.turn_started = None;
        self.turn_deadline = None;
    }

    fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            id: self.id.clone(),
            queue: self.queue.clone(),
            holder: self.holder.clone(),
            phase: self.phase,
            turn_started: self.turn_started,
            turn_deadline: self.turn_deadline,
            active_since: self.active_since,
        }
    }

    fn from_snapshot(snapshot: &MachineSnapshot) -> Self {
        Self {
            id: snapshot.id.clone(),
            queue: snapshot.queue.clone(),
            holder: snapshot.holder.clone(),
            phase: snapshot.phase,
            turn_started: snapshot.turn_started,
            turn_deadline: snapshot.turn_deadline,
            active_since: snapshot.active_since,
        }
    }
}

// ---------------------------------------------------------------------------
// Player stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PlayerStats {
    /// Raw cumulative active play time. Never decreases.
    play_time_ms: i64,
    /// Subtracted for display after an admin stats reset.
    play_time_offset_ms: i64,
    skip_count: u32,
    session_count: u32,
}

// ---------------------------------------------------------------------------
// FloorState
// ---------------------------------------------------------------------------

/// The whole arcade floor as one owned aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FloorState {
    config: EngineConfig,
    machines: Vec<Machine>,
    players: BTreeMap<PlayerHandle, PlayerStats>,
    cooldowns: BTreeMap<(PlayerHandle, MachineId), Timestamp>,
    /// player → machine currently holding them `Active`. Derived; rebuilt
    /// on rehydration, maintained incrementally everywhere else.
    active_index: HashMap<PlayerHandle, MachineId>,
    paused: bool,
    pause_started: Option<Timestamp>,
}

impl FloorState {
    /// Creates a fresh floor: every configured machine idle, no players.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.validated();
        let machines = config
            .machines
            .iter()
            .cloned()
            .map(Machine::new)
            .collect();
        Self {
            config,
            machines,
            players: BTreeMap::new(),
            cooldowns: BTreeMap::new(),
            active_index: HashMap::new(),
            paused: false,
            pause_started: None,
        }
    }

    /// Rehydrates a floor from a stored snapshot.
    ///
    /// Machines present in the config but absent from the snapshot start
    /// idle; stored machines no longer configured are dropped with a
    /// warning.
    pub fn from_snapshot(config: EngineConfig, snapshot: &FullState) -> Self {
        let config = config.validated();

        let machines: Vec<Machine> = config
            .machines
            .iter()
            .map(|id| {
                snapshot
                    .machines
                    .iter()
                    .find(|m| &m.id == id)
                    .map(Machine::from_snapshot)
                    .unwrap_or_else(|| Machine::new(id.clone()))
            })
            .collect();
        for stored in &snapshot.machines {
            if !config.machines.contains(&stored.id) {
                tracing::warn!(
                    machine = %stored.id,
                    "stored machine is no longer configured — dropping"
                );
            }
        }

        let players = snapshot
            .players
            .iter()
            .map(|p| {
                (
                    p.handle.clone(),
                    PlayerStats {
                        play_time_ms: p.play_time_ms,
                        play_time_offset_ms: p.play_time_offset_ms,
                        skip_count: p.skip_count,
                        session_count: p.session_count,
                    },
                )
            })
            .collect();

        let cooldowns = snapshot
            .cooldowns
            .iter()
            .map(|c| ((c.player.clone(), c.machine.clone()), c.expires_at))
            .collect();

        let mut active_index = HashMap::new();
        for m in &machines {
            if let Some(holder) = &m.holder {
                active_index.insert(holder.clone(), m.id.clone());
            }
        }

        Self {
            config,
            machines,
            players,
            cooldowns,
            active_index,
            paused: snapshot.paused,
            pause_started: snapshot.pause_started,
        }
    }

    /// A consistent, deterministically ordered copy of the whole floor.
    pub fn snapshot(&self) -> FullState {
        FullState {
            machines: self.machines.iter().map(Machine::snapshot).collect(),
            players: self
                .players
                .iter()
                .map(|(handle, s)| PlayerSnapshot {
                    handle: handle.clone(),
                    play_time_ms: s.play_time_ms,
                    play_time_offset_ms: s.play_time_offset_ms,
                    skip_count: s.skip_count,
                    session_count: s.session_count,
                })
                .collect(),
            cooldowns: self
                .cooldowns
                .iter()
                .map(|((player, machine), expires_at)| CooldownSnapshot {
                    player: player.clone(),
                    machine: machine.clone(),
                    expires_at: *expires_at,
                })
                .collect(),
            paused: self.paused,
            pause_started: self.pause_started,
        }
    }

    /// Whether the floor is globally paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    // -- Player operations ------------------------------------------------

    /// Appends a player to a machine's queue and advances.
    pub fn join(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), JoinError> {
        if self.paused {
            return Err(JoinError::Paused);
        }
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| JoinError::UnknownMachine(machine.clone()))?;
        {
            let m = &self.machines[idx];
            if m.queue.contains(player) || m.holder.as_ref() == Some(player) {
                return Err(JoinError::AlreadyQueued(player.clone()));
            }
        }
        if let Some(until) =
            self.cooldowns.get(&(player.clone(), machine.clone()))
        {
            if *until > now {
                return Err(JoinError::CooldownActive { until: *until });
            }
        }

        self.stats_mut(player);
        let m = &mut self.machines[idx];
        m.queue.push(player.clone());
        if m.phase == TurnPhase::Idle {
            m.phase = TurnPhase::Queued;
        }
        tracing::info!(
            machine = %machine,
            player = %player,
            position = m.queue.len(),
            "joined queue"
        );
        self.advance_machine(idx, now);
        Ok(())
    }

    /// The offered head accepts their turn and becomes the holder.
    pub fn accept(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), AcceptError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| AcceptError::UnknownMachine(machine.clone()))?;
        {
            let m = &self.machines[idx];
            if !m.phase.has_pending_offer() {
                return Err(AcceptError::NoActiveOffer);
            }
            if m.queue.first() != Some(player) {
                return Err(AcceptError::NotYourTurn(player.clone()));
            }
            if m.turn_deadline.is_some_and(|d| d <= now) {
                return Err(AcceptError::NoActiveOffer);
            }
        }
        if self.active_index.get(player).is_some_and(|held| held != machine) {
            return Err(AcceptError::NotYourTurn(player.clone()));
        }

        let m = &mut self.machines[idx];
        let accepted = m.queue.remove(0);
        m.holder = Some(accepted.clone());
        m.phase = TurnPhase::Active;
        m.turn_deadline = None;
        m.active_since = Some(now);
        self.active_index.insert(accepted.clone(), machine.clone());
        self.stats_mut(&accepted).session_count += 1;
        tracing::info!(machine = %machine, player = %accepted, "turn accepted");

        self.withdraw_foreign_offers(&accepted, idx, now);
        Ok(())
    }

    /// The active holder ends their turn. Returns the elapsed active
    /// duration, credited to their cumulative play time.
    pub fn finish(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<Duration, FinishError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| FinishError::UnknownMachine(machine.clone()))?;
        {
            let m = &self.machines[idx];
            if !m.phase.is_active() || m.holder.as_ref() != Some(player) {
                return Err(FinishError::NotPlaying(player.clone()));
            }
        }

        let elapsed = self.end_active_turn(idx, now);
        if self.machines[idx].queue.is_empty() {
            let until = now + self.config.courtesy_cooldown;
            self.cooldowns
                .insert((player.clone(), machine.clone()), until);
            tracing::debug!(
                machine = %machine,
                player = %player,
                %until,
                "courtesy cooldown installed"
            );
        }
        self.advance_all(now);
        Ok(elapsed)
    }

    /// The offered head forfeits their turn.
    ///
    /// With others waiting they drop exactly one position (behind the new
    /// head); alone, they leave the queue entirely. Either way the skip
    /// counter increments.
    pub fn skip(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), SkipError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| SkipError::UnknownMachine(machine.clone()))?;
        {
            let m = &self.machines[idx];
            if !m.phase.has_pending_offer() || m.queue.first() != Some(player)
            {
                return Err(SkipError::NotYourTurn(player.clone()));
            }
        }
        self.apply_skip(idx, now);
        Ok(())
    }

    /// A player voluntarily leaves a machine's queue, or abandons their
    /// own pending offer. No skip-count penalty.
    pub fn leave(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), LeaveError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| LeaveError::UnknownMachine(machine.clone()))?;
        let m = &mut self.machines[idx];

        if m.phase.has_pending_offer() && m.queue.first() == Some(player) {
            m.queue.remove(0);
            m.clear_offer();
            m.phase = if m.queue.is_empty() {
                TurnPhase::Idle
            } else {
                TurnPhase::Queued
            };
            tracing::info!(machine = %machine, player = %player, "abandoned pending offer");
            self.advance_machine(idx, now);
            return Ok(());
        }

        if let Some(pos) = m.queue.iter().position(|p| p == player) {
            m.queue.remove(pos);
            if m.queue.is_empty() && m.phase == TurnPhase::Queued {
                m.phase = TurnPhase::Idle;
            }
            tracing::info!(machine = %machine, player = %player, "left queue");
            return Ok(());
        }

        Err(LeaveError::NotWaiting(player.clone()))
    }

    /// Converts every overdue pending offer into a skip and prunes lapsed
    /// cooldowns. Idempotent for a fixed `now`; suppressed while paused.
    pub fn expire_sweep(&mut self, now: Timestamp) {
        if self.paused {
            return;
        }
        self.cooldowns.retain(|_, until| *until > now);

        for idx in 0..self.machines.len() {
            let overdue = {
                let m = &self.machines[idx];
                m.phase.has_pending_offer()
                    && m.turn_deadline.is_some_and(|d| d <= now)
            };
            if overdue {
                let m = &self.machines[idx];
                tracing::info!(
                    machine = %m.id,
                    player = %m.queue[0],
                    "turn offer expired"
                );
                self.apply_skip(idx, now);
            }
        }
    }

    // -- Administrative operations ----------------------------------------

    /// Pauses or resumes the floor. Resuming shifts active turns forward
    /// by the pause duration so paused time is not billed as play time;
    /// offer deadlines are left alone, so overdue offers expire right
    /// away on the sweep that follows.
    pub fn set_paused(&mut self, paused: bool, now: Timestamp) {
        if paused == self.paused {
            return;
        }
        if paused {
            self.paused = true;
            self.pause_started = Some(now);
            tracing::info!("floor paused");
        } else {
            let pause_duration = self
                .pause_started
                .map(|started| now.since(started))
                .unwrap_or_default();
            self.paused = false;
            self.pause_started = None;
            for m in &mut self.machines {
                if m.phase.is_active() {
                    if let Some(since) = m.active_since {
                        m.active_since = Some(since + pause_duration);
                    }
                }
            }
            tracing::info!(paused_for = ?pause_duration, "floor resumed");
            self.expire_sweep(now);
            self.advance_all(now);
        }
    }

    /// Installs a player as a machine's active holder, ending any turn
    /// that stands in the way (theirs elsewhere, or the current holder's
    /// here). Both ended turns are credited; neither gets a cooldown.
    pub fn force_set_holder(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), AdminError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| AdminError::UnknownMachine(machine.clone()))?;

        if let Some(held) = self.active_index.get(player).cloned() {
            let held_idx = self
                .machine_index(&held)
                .expect("active index entries point at configured machines");
            self.end_active_turn(held_idx, now);
        }
        if self.machines[idx].holder.is_some() {
            self.end_active_turn(idx, now);
        }

        let m = &mut self.machines[idx];
        if let Some(pos) = m.queue.iter().position(|p| p == player) {
            m.queue.remove(pos);
        }
        m.holder = Some(player.clone());
        m.phase = TurnPhase::Active;
        m.turn_started = Some(now);
        m.turn_deadline = None;
        m.active_since = Some(now);
        self.active_index.insert(player.clone(), machine.clone());
        self.stats_mut(player);
        tracing::info!(machine = %machine, player = %player, "holder force-set");

        self.withdraw_foreign_offers(player, idx, now);
        self.advance_all(now);
        Ok(())
    }

    /// Evicts a player from a machine — whether queued, offered, or
    /// holding the active turn (an ended turn is still credited).
    pub fn remove_from_queue(
        &mut self,
        machine: &MachineId,
        player: &PlayerHandle,
        now: Timestamp,
    ) -> Result<(), AdminError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| AdminError::UnknownMachine(machine.clone()))?;

        if self.machines[idx].holder.as_ref() == Some(player) {
            self.end_active_turn(idx, now);
            tracing::info!(machine = %machine, player = %player, "holder removed");
            self.advance_all(now);
            return Ok(());
        }

        let m = &mut self.machines[idx];
        if m.phase.has_pending_offer() && m.queue.first() == Some(player) {
            m.queue.remove(0);
            m.clear_offer();
            m.phase = if m.queue.is_empty() {
                TurnPhase::Idle
            } else {
                TurnPhase::Queued
            };
            tracing::info!(machine = %machine, player = %player, "offered player removed");
            self.advance_machine(idx, now);
            return Ok(());
        }
        if let Some(pos) = m.queue.iter().position(|p| p == player) {
            m.queue.remove(pos);
            if m.queue.is_empty() && m.phase == TurnPhase::Queued {
                m.phase = TurnPhase::Idle;
            }
            tracing::info!(machine = %machine, player = %player, "removed from queue");
            return Ok(());
        }

        Err(AdminError::NotPresent {
            player: player.clone(),
            machine: machine.clone(),
        })
    }

    /// Replaces a machine's queue order. The new order must be a
    /// permutation of the current queue. If a pending offer's head is
    /// displaced, the offer is withdrawn and the machine re-advances.
    pub fn reorder_queue(
        &mut self,
        machine: &MachineId,
        order: Vec<PlayerHandle>,
        now: Timestamp,
    ) -> Result<(), AdminError> {
        let idx = self
            .machine_index(machine)
            .ok_or_else(|| AdminError::UnknownMachine(machine.clone()))?;
        {
            let m = &self.machines[idx];
            let mut current: Vec<&PlayerHandle> = m.queue.iter().collect();
            let mut proposed: Vec<&PlayerHandle> = order.iter().collect();
            current.sort();
            proposed.sort();
            if current != proposed {
                return Err(AdminError::InvalidOrder(machine.clone()));
            }
        }

        let m = &mut self.machines[idx];
        let head_displaced =
            m.phase.has_pending_offer() && m.queue.first() != order.first();
        m.queue = order;
        if head_displaced {
            m.clear_offer();
            m.phase = TurnPhase::Queued;
        }
        tracing::info!(machine = %machine, "queue reordered");
        self.advance_machine(idx, now);
        Ok(())
    }

    /// Soft-resets a player's displayed counters. Raw play time is kept
    /// (it only ever grows); the offset hides it from display.
    pub fn reset_stats(
        &mut self,
        player: &PlayerHandle,
    ) -> Result<(), AdminError> {
        let stats = self
            .players
            .get_mut(player)
            .ok_or_else(|| AdminError::UnknownPlayer(player.clone()))?;
        stats.play_time_offset_ms = stats.play_time_ms;
        stats.skip_count = 0;
        stats.session_count = 0;
        tracing::info!(player = %player, "stats reset");
        Ok(())
    }

    // -- Internals ---------------------------------------------------------

    fn machine_index(&self, id: &MachineId) -> Option<usize> {
        self.machines.iter().position(|m| &m.id == id)
    }

    fn stats_mut(&mut self, player: &PlayerHandle) -> &mut PlayerStats {
        self.players.entry(player.clone()).or_default()
    }

    /// Players whose active turn is on a machine other than `here`.
    fn busy_elsewhere(&self, here: &MachineId) -> HashSet<PlayerHandle> {
        self.active_index
            .iter()
            .filter(|(_, held)| *held != here)
            .map(|(player, _)| player.clone())
            .collect()
    }

    /// Promotes the next eligible player to `AwaitingAccept`, rotating
    /// busy heads back. No-op while paused, while a turn is running, or
    /// while an offer is already pending.
    fn advance_machine(&mut self, idx: usize, now: Timestamp) {
        if self.paused {
            return;
        }
        {
            let m = &self.machines[idx];
            if m.holder.is_some() || m.phase.has_pending_offer() {
                return;
            }
        }
        if self.machines[idx].queue.is_empty() {
            let m = &mut self.machines[idx];
            m.phase = TurnPhase::Idle;
            m.clear_offer();
            return;
        }

        let here = self.machines[idx].id.clone();
        let busy = self.busy_elsewhere(&here);
        let deadline = now + self.config.turn_timeout;
        let m = &mut self.machines[idx];

        if !m.queue.iter().any(|p| !busy.contains(p)) {
            m.phase = TurnPhase::Queued;
            m.clear_offer();
            return;
        }
        while busy.contains(&m.queue[0]) {
            let blocked = m.queue.remove(0);
            let eligible = m
                .queue
                .iter()
                .position(|p| !busy.contains(p))
                .expect("an eligible player remains past the blocked head");
            tracing::debug!(
                machine = %m.id,
                player = %blocked,
                "head busy elsewhere — rotated behind next eligible"
            );
            m.queue.insert(eligible + 1, blocked);
        }

        m.phase = TurnPhase::AwaitingAccept;
        m.turn_started = Some(now);
        m.turn_deadline = Some(deadline);
        m.active_since = None;
        tracing::info!(
            machine = %m.id,
            player = %m.queue[0],
            deadline = %deadline,
            "turn offered"
        );
    }

    fn advance_all(&mut self, now: Timestamp) {
        for idx in 0..self.machines.len() {
            self.advance_machine(idx, now);
        }
    }

    /// Ends the active turn on `idx`, crediting the holder's play time.
    /// The caller decides what happens next (cooldown, advance).
    fn end_active_turn(&mut self, idx: usize, now: Timestamp) -> Duration {
        let m = &mut self.machines[idx];
        let holder = m.holder.take().expect("machine has an active holder");
        let elapsed = m
            .active_since
            .map(|since| now.since(since))
            .unwrap_or_default();
        m.phase = if m.queue.is_empty() {
            TurnPhase::Idle
        } else {
            TurnPhase::Queued
        };
        m.clear_offer();
        m.active_since = None;
        let machine_id = m.id.clone();

        self.active_index.remove(&holder);
        self.stats_mut(&holder).play_time_ms += elapsed.as_millis() as i64;
        tracing::info!(
            machine = %machine_id,
            player = %holder,
            played_ms = elapsed.as_millis() as u64,
            "turn ended"
        );
        elapsed
    }

    /// Removes the offered head, bumps their skip counter, and repositions
    /// them: one slot back if others wait, out entirely if alone. Shared
    /// by self-skip and the expiry sweep.
    fn apply_skip(&mut self, idx: usize, now: Timestamp) {
        let m = &mut self.machines[idx];
        let skipped = m.queue.remove(0);
        m.clear_offer();
        if m.queue.is_empty() {
            m.phase = TurnPhase::Idle;
            tracing::info!(
                machine = %m.id,
                player = %skipped,
                "turn skipped with empty queue — player leaves"
            );
        } else {
            m.queue.insert(1, skipped.clone());
            m.phase = TurnPhase::Queued;
            tracing::info!(
                machine = %m.id,
                player = %skipped,
                "turn skipped — moved behind next player"
            );
        }
        self.stats_mut(&skipped).skip_count += 1;
        self.advance_machine(idx, now);
    }

    /// Withdraws pending offers to `player` on machines other than
    /// `except`: a player who just went active elsewhere is no longer
    /// eligible, so the offer is converted into a blocked rotation
    /// (no skip penalty) by re-advancing.
    fn withdraw_foreign_offers(
        &mut self,
        player: &PlayerHandle,
        except: usize,
        now: Timestamp,
    ) {
        for idx in 0..self.machines.len() {
            if idx == except {
                continue;
            }
            let stale = {
                let m = &self.machines[idx];
                m.phase.has_pending_offer() && m.queue.first() == Some(player)
            };
            if stale {
                let m = &mut self.machines[idx];
                m.clear_offer();
                m.phase = TurnPhase::Queued;
                tracing::debug!(
                    machine = %m.id,
                    player = %player,
                    "pending offer withdrawn — player went active elsewhere"
                );
                self.advance_machine(idx, now);
            }
        }
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Unit tests for the pure floor transitions. Time is passed in
    //! explicitly, so nothing here sleeps or needs a runtime.

    use super::*;

    // -- Helpers ----------------------------------------------------------

    fn mid(id: &str) -> MachineId {
        MachineId::new(id)
    }

    fn ph(handle: &str) -> PlayerHandle {
        PlayerHandle::new(handle)
    }

    fn ts(ms: i64) -> Timestamp {
        Timestamp::from_millis(ms)
    }

    /// Two machines, 60 s accept timeout, 10 s courtesy cooldown.
    fn floor() -> FloorState {
        FloorState::new(EngineConfig::with_machines(["R1", "R2"]))
    }

    fn machine<'a>(state: &'a FloorState, id: &str) -> &'a Machine {
        let idx = state.machine_index(&mid(id)).expect("machine configured");
        &state.machines[idx]
    }

    fn queue_of(state: &FloorState, id: &str) -> Vec<String> {
        machine(state, id)
            .queue
            .iter()
            .map(|p| p.0.clone())
            .collect()
    }

    fn skip_count(state: &FloorState, player: &str) -> u32 {
        state.players.get(&ph(player)).map_or(0, |s| s.skip_count)
    }

    // =====================================================================
    // join
    // =====================================================================

    #[test]
    fn test_join_idle_machine_offers_turn_immediately() {
        let mut st = floor();

        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.queue, vec![ph("alice")]);
        assert_eq!(m.turn_started, Some(ts(0)));
        assert_eq!(m.turn_deadline, Some(ts(60_000)));
        assert!(m.holder.is_none());
    }

    #[test]
    fn test_join_twice_returns_already_queued() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        let result = st.join(&mid("R1"), &ph("alice"), ts(1));

        assert_eq!(result, Err(JoinError::AlreadyQueued(ph("alice"))));
    }

    #[test]
    fn test_join_while_holder_returns_already_queued() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();

        let result = st.join(&mid("R1"), &ph("alice"), ts(2));

        assert_eq!(result, Err(JoinError::AlreadyQueued(ph("alice"))));
    }

    #[test]
    fn test_join_unknown_machine_returns_not_found() {
        let mut st = floor();

        let result = st.join(&mid("Nope"), &ph("alice"), ts(0));

        assert_eq!(result, Err(JoinError::UnknownMachine(mid("Nope"))));
    }

    #[test]
    fn test_join_while_paused_is_rejected() {
        let mut st = floor();
        st.set_paused(true, ts(0));

        let result = st.join(&mid("R1"), &ph("alice"), ts(1));

        assert_eq!(result, Err(JoinError::Paused));
    }

    // =====================================================================
    // accept
    // =====================================================================

    #[test]
    fn test_accept_by_head_starts_active_turn() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        st.accept(&mid("R1"), &ph("alice"), ts(5_000)).unwrap();

        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::Active);
        assert_eq!(m.holder, Some(ph("alice")));
        assert!(m.queue.is_empty());
        assert_eq!(m.turn_deadline, None);
        assert_eq!(m.active_since, Some(ts(5_000)));
        assert_eq!(st.players[&ph("alice")].session_count, 1);
    }

    #[test]
    fn test_accept_by_non_head_returns_not_your_turn() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("bob"), ts(1)).unwrap();

        let result = st.accept(&mid("R1"), &ph("bob"), ts(2));

        assert_eq!(result, Err(AcceptError::NotYourTurn(ph("bob"))));
    }

    #[test]
    fn test_accept_without_offer_returns_no_active_offer() {
        let mut st = floor();

        let result = st.accept(&mid("R1"), &ph("alice"), ts(0));

        assert_eq!(result, Err(AcceptError::NoActiveOffer));
    }

    #[test]
    fn test_accept_after_deadline_returns_no_active_offer() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        let result = st.accept(&mid("R1"), &ph("alice"), ts(60_000));

        assert_eq!(result, Err(AcceptError::NoActiveOffer));
    }

    // =====================================================================
    // skip
    // =====================================================================

    #[test]
    fn test_skip_with_others_waiting_drops_one_position() {
        // Queue [A, B, C] with A offered: skipping A yields [B, A, C]
        // and B gets the next offer.
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();
        st.join(&mid("R1"), &ph("c"), ts(2)).unwrap();

        st.skip(&mid("R1"), &ph("a"), ts(3)).unwrap();

        assert_eq!(queue_of(&st, "R1"), vec!["b", "a", "c"]);
        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.queue[0], ph("b"));
        assert_eq!(skip_count(&st, "a"), 1);
        assert_eq!(skip_count(&st, "b"), 0);
    }

    #[test]
    fn test_skip_alone_removes_player_entirely() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();

        st.skip(&mid("R1"), &ph("a"), ts(1)).unwrap();

        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::Idle);
        assert!(m.queue.is_empty());
        assert_eq!(skip_count(&st, "a"), 1);
        // Skip-induced emptiness imposes no cooldown: re-join works now.
        st.join(&mid("R1"), &ph("a"), ts(2)).unwrap();
    }

    #[test]
    fn test_skip_by_non_head_returns_not_your_turn() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        let result = st.skip(&mid("R1"), &ph("b"), ts(2));

        assert_eq!(result, Err(SkipError::NotYourTurn(ph("b"))));
    }

    // =====================================================================
    // finish & courtesy cooldown
    // =====================================================================

    #[test]
    fn test_finish_credits_elapsed_play_time() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1_000)).unwrap();

        let elapsed = st.finish(&mid("R1"), &ph("alice"), ts(91_000)).unwrap();

        assert_eq!(elapsed, Duration::from_secs(90));
        assert_eq!(st.players[&ph("alice")].play_time_ms, 90_000);
        assert!(machine(&st, "R1").holder.is_none());
    }

    #[test]
    fn test_finish_with_empty_queue_installs_cooldown() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1_000)).unwrap();
        st.finish(&mid("R1"), &ph("alice"), ts(2_000)).unwrap();

        assert_eq!(machine(&st, "R1").phase, TurnPhase::Idle);
        // Blocked during the cooldown window...
        assert_eq!(
            st.join(&mid("R1"), &ph("alice"), ts(5_000)),
            Err(JoinError::CooldownActive { until: ts(12_000) })
        );
        // ...and open again after it lapses.
        st.join(&mid("R1"), &ph("alice"), ts(12_001)).unwrap();
    }

    #[test]
    fn test_finish_with_waiting_queue_advances_without_cooldown() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("bob"), ts(1)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(2)).unwrap();

        st.finish(&mid("R1"), &ph("alice"), ts(10_000)).unwrap();

        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.queue[0], ph("bob"));
        assert!(st.cooldowns.is_empty());
        // No cooldown: alice may re-join immediately.
        st.join(&mid("R1"), &ph("alice"), ts(10_001)).unwrap();
    }

    #[test]
    fn test_finish_when_not_holder_returns_not_playing() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        let result = st.finish(&mid("R1"), &ph("alice"), ts(1));

        assert_eq!(result, Err(FinishError::NotPlaying(ph("alice"))));
    }

    // =====================================================================
    // cross-machine exclusivity
    // =====================================================================

    #[test]
    fn test_busy_head_is_rotated_behind_next_eligible() {
        // Alice plays R1. On R2 the queue is [alice, bob]: advance must
        // offer bob and keep alice queued right behind him.
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();
        st.join(&mid("R2"), &ph("alice"), ts(2)).unwrap();

        st.join(&mid("R2"), &ph("bob"), ts(3)).unwrap();

        let m = machine(&st, "R2");
        assert_eq!(queue_of(&st, "R2"), vec!["bob", "alice"]);
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        // Rotation is not a skip: no penalty.
        assert_eq!(skip_count(&st, "alice"), 0);
    }

    #[test]
    fn test_fully_blocked_queue_stays_queued_without_offer() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();

        st.join(&mid("R2"), &ph("alice"), ts(2)).unwrap();

        let m = machine(&st, "R2");
        assert_eq!(m.phase, TurnPhase::Queued);
        assert_eq!(m.turn_deadline, None);
        assert_eq!(queue_of(&st, "R2"), vec!["alice"]);
    }

    #[test]
    fn test_finishing_elsewhere_unblocks_preserved_position() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();
        st.join(&mid("R2"), &ph("alice"), ts(2)).unwrap();
        st.join(&mid("R2"), &ph("bob"), ts(3)).unwrap();
        st.accept(&mid("R2"), &ph("bob"), ts(4)).unwrap();

        // Alice frees up on R1; finish advances every machine, and R2's
        // queue still holds her in preserved order.
        st.finish(&mid("R1"), &ph("alice"), ts(10_000)).unwrap();

        assert_eq!(queue_of(&st, "R2"), vec!["alice"]);
        // Bob still plays R2; once he finishes, alice gets the offer.
        st.finish(&mid("R2"), &ph("bob"), ts(11_000)).unwrap();
        let m = machine(&st, "R2");
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.queue[0], ph("alice"));
    }

    #[test]
    fn test_rotation_preserves_order_among_blocked_players() {
        // Three machines; alice and carol are busy on M1/M2. M3's queue
        // [alice, carol, bob] must become [bob, carol, alice]: bob offered,
        // blocked players keep their relative order behind him.
        let mut st = FloorState::new(EngineConfig::with_machines([
            "M1", "M2", "M3",
        ]));
        st.join(&mid("M1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("M1"), &ph("alice"), ts(1)).unwrap();
        st.join(&mid("M2"), &ph("carol"), ts(2)).unwrap();
        st.accept(&mid("M2"), &ph("carol"), ts(3)).unwrap();

        st.join(&mid("M3"), &ph("alice"), ts(4)).unwrap();
        st.join(&mid("M3"), &ph("carol"), ts(5)).unwrap();
        st.join(&mid("M3"), &ph("bob"), ts(6)).unwrap();

        assert_eq!(queue_of(&st, "M3"), vec!["bob", "carol", "alice"]);
        assert_eq!(machine(&st, "M3").phase, TurnPhase::AwaitingAccept);
    }

    #[test]
    fn test_accepting_one_machine_withdraws_offer_on_another() {
        // Alice holds simultaneous offers on R1 and R2 (legal — offers
        // are not exclusive, active turns are). Accepting R1 must convert
        // R2's offer into a blocked rotation, not leave it acceptable.
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.join(&mid("R2"), &ph("alice"), ts(1)).unwrap();
        assert!(machine(&st, "R2").phase.has_pending_offer());

        st.accept(&mid("R1"), &ph("alice"), ts(2)).unwrap();

        let m = machine(&st, "R2");
        assert_eq!(m.phase, TurnPhase::Queued);
        assert_eq!(m.turn_deadline, None);
        assert_eq!(queue_of(&st, "R2"), vec!["alice"]);
        assert_eq!(skip_count(&st, "alice"), 0);
    }

    // =====================================================================
    // expiry sweep
    // =====================================================================

    #[test]
    fn test_sweep_converts_overdue_offer_into_skip() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        st.expire_sweep(ts(60_000));

        assert_eq!(queue_of(&st, "R1"), vec!["b", "a"]);
        assert_eq!(skip_count(&st, "a"), 1);
        let m = machine(&st, "R1");
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.turn_deadline, Some(ts(120_000)));
    }

    #[test]
    fn test_sweep_is_idempotent_for_fixed_now() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        st.expire_sweep(ts(60_000));
        let once = st.snapshot();
        st.expire_sweep(ts(60_000));

        assert_eq!(st.snapshot(), once);
    }

    #[test]
    fn test_sweep_before_deadline_changes_nothing() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        let before = st.snapshot();

        st.expire_sweep(ts(59_999));

        assert_eq!(st.snapshot(), before);
    }

    #[test]
    fn test_sweep_prunes_lapsed_cooldowns() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();
        st.finish(&mid("R1"), &ph("alice"), ts(1_000)).unwrap();
        assert_eq!(st.cooldowns.len(), 1);

        st.expire_sweep(ts(11_001));

        assert!(st.cooldowns.is_empty());
    }

    // =====================================================================
    // pause
    // =====================================================================

    #[test]
    fn test_pause_suppresses_sweep_and_advance() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();
        st.set_paused(true, ts(2));
        let frozen = st.snapshot();

        // Deadline long past; nothing may move while paused.
        st.expire_sweep(ts(600_000));

        assert_eq!(st.snapshot(), frozen);
    }

    #[test]
    fn test_unpause_applies_due_expiries_immediately() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();
        st.set_paused(true, ts(2));

        st.set_paused(false, ts(600_000));

        // The overdue offer to `a` expired on resume; `b` holds a fresh one.
        assert_eq!(queue_of(&st, "R1"), vec!["b", "a"]);
        assert_eq!(skip_count(&st, "a"), 1);
        assert_eq!(
            machine(&st, "R1").turn_deadline,
            Some(ts(660_000))
        );
    }

    #[test]
    fn test_pause_does_not_bill_active_play_time() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        st.set_paused(true, ts(10_000));
        st.set_paused(false, ts(25_000));
        let elapsed = st.finish(&mid("R1"), &ph("alice"), ts(30_000)).unwrap();

        // 30 s wall clock minus 15 s paused = 15 s billed.
        assert_eq!(elapsed, Duration::from_secs(15));
        assert_eq!(st.players[&ph("alice")].play_time_ms, 15_000);
    }

    #[test]
    fn test_set_paused_same_value_is_a_no_op() {
        let mut st = floor();
        st.set_paused(true, ts(0));
        let before = st.snapshot();

        st.set_paused(true, ts(50));

        assert_eq!(st.snapshot(), before);
    }

    // =====================================================================
    // administrative operations
    // =====================================================================

    #[test]
    fn test_force_set_holder_ends_conflicting_turn() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        st.force_set_holder(&mid("R2"), &ph("alice"), ts(20_000))
            .unwrap();

        assert!(machine(&st, "R1").holder.is_none());
        assert_eq!(machine(&st, "R2").holder, Some(ph("alice")));
        // The ended R1 turn was credited.
        assert_eq!(st.players[&ph("alice")].play_time_ms, 20_000);
        assert_eq!(st.active_index.len(), 1);
    }

    #[test]
    fn test_force_set_holder_credits_displaced_holder() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        st.force_set_holder(&mid("R1"), &ph("bob"), ts(30_000)).unwrap();

        assert_eq!(machine(&st, "R1").holder, Some(ph("bob")));
        assert_eq!(st.players[&ph("alice")].play_time_ms, 30_000);
        assert!(!st.active_index.contains_key(&ph("alice")));
    }

    #[test]
    fn test_remove_from_queue_mid_queue_member() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();
        st.join(&mid("R1"), &ph("c"), ts(2)).unwrap();

        st.remove_from_queue(&mid("R1"), &ph("b"), ts(3)).unwrap();

        assert_eq!(queue_of(&st, "R1"), vec!["a", "c"]);
        // The pending offer to `a` is untouched.
        assert_eq!(machine(&st, "R1").phase, TurnPhase::AwaitingAccept);
    }

    #[test]
    fn test_remove_from_queue_evicts_offered_head() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        st.remove_from_queue(&mid("R1"), &ph("a"), ts(2)).unwrap();

        assert_eq!(queue_of(&st, "R1"), vec!["b"]);
        assert_eq!(machine(&st, "R1").queue[0], ph("b"));
        assert_eq!(machine(&st, "R1").phase, TurnPhase::AwaitingAccept);
        // Eviction is not a skip.
        assert_eq!(skip_count(&st, "a"), 0);
    }

    #[test]
    fn test_remove_from_queue_evicts_holder_with_credit() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(0)).unwrap();

        st.remove_from_queue(&mid("R1"), &ph("alice"), ts(45_000))
            .unwrap();

        assert!(machine(&st, "R1").holder.is_none());
        assert_eq!(st.players[&ph("alice")].play_time_ms, 45_000);
        // Administrative eviction installs no cooldown.
        st.join(&mid("R1"), &ph("alice"), ts(45_001)).unwrap();
    }

    #[test]
    fn test_remove_from_queue_absent_player_errors() {
        let mut st = floor();

        let result = st.remove_from_queue(&mid("R1"), &ph("ghost"), ts(0));

        assert_eq!(
            result,
            Err(AdminError::NotPresent {
                player: ph("ghost"),
                machine: mid("R1"),
            })
        );
    }

    #[test]
    fn test_reorder_queue_rejects_non_permutation() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        let result =
            st.reorder_queue(&mid("R1"), vec![ph("a"), ph("x")], ts(2));

        assert_eq!(result, Err(AdminError::InvalidOrder(mid("R1"))));
        assert_eq!(queue_of(&st, "R1"), vec!["a", "b"]);
    }

    #[test]
    fn test_reorder_queue_displacing_offered_head_reoffers() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();
        st.join(&mid("R1"), &ph("c"), ts(2)).unwrap();

        st.reorder_queue(&mid("R1"), vec![ph("c"), ph("a"), ph("b")], ts(3))
            .unwrap();

        let m = machine(&st, "R1");
        assert_eq!(queue_of(&st, "R1"), vec!["c", "a", "b"]);
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(m.turn_started, Some(ts(3)));
    }

    #[test]
    fn test_reset_stats_offsets_play_time_and_zeroes_counters() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.finish(&mid("R1"), &ph("alice"), ts(60_000)).unwrap();

        st.reset_stats(&ph("alice")).unwrap();

        let stats = &st.players[&ph("alice")];
        // Raw play time is untouched — the reward accrual keeps counting.
        assert_eq!(stats.play_time_ms, 60_000);
        assert_eq!(stats.play_time_offset_ms, 60_000);
        assert_eq!(stats.skip_count, 0);
        assert_eq!(stats.session_count, 0);
    }

    #[test]
    fn test_reset_stats_unknown_player_errors() {
        let mut st = floor();

        let result = st.reset_stats(&ph("ghost"));

        assert_eq!(result, Err(AdminError::UnknownPlayer(ph("ghost"))));
    }

    // =====================================================================
    // leave
    // =====================================================================

    #[test]
    fn test_leave_queue_removes_without_penalty() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        st.leave(&mid("R1"), &ph("b"), ts(2)).unwrap();

        assert_eq!(queue_of(&st, "R1"), vec!["a"]);
        assert_eq!(skip_count(&st, "b"), 0);
    }

    #[test]
    fn test_leave_as_offered_head_advances_next() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("a"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("b"), ts(1)).unwrap();

        st.leave(&mid("R1"), &ph("a"), ts(2)).unwrap();

        let m = machine(&st, "R1");
        assert_eq!(queue_of(&st, "R1"), vec!["b"]);
        assert_eq!(m.phase, TurnPhase::AwaitingAccept);
        assert_eq!(skip_count(&st, "a"), 0);
    }

    #[test]
    fn test_leave_when_not_waiting_errors() {
        let mut st = floor();

        let result = st.leave(&mid("R1"), &ph("a"), ts(0));

        assert_eq!(result, Err(LeaveError::NotWaiting(ph("a"))));
    }

    // =====================================================================
    // snapshot round trip
    // =====================================================================

    #[test]
    fn test_snapshot_rehydrates_bit_for_bit() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.join(&mid("R1"), &ph("bob"), ts(1)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(2)).unwrap();
        st.join(&mid("R2"), &ph("carol"), ts(3)).unwrap();
        st.join(&mid("R2"), &ph("alice"), ts(4)).unwrap();

        let snapshot = st.snapshot();
        let rehydrated =
            FloorState::from_snapshot(st.config.clone(), &snapshot);

        assert_eq!(rehydrated, st);
        assert_eq!(rehydrated.snapshot(), snapshot);
    }

    #[test]
    fn test_from_snapshot_rebuilds_active_index() {
        let mut st = floor();
        st.join(&mid("R1"), &ph("alice"), ts(0)).unwrap();
        st.accept(&mid("R1"), &ph("alice"), ts(1)).unwrap();

        let rehydrated =
            FloorState::from_snapshot(st.config.clone(), &st.snapshot());

        assert_eq!(
            rehydrated.active_index.get(&ph("alice")),
            Some(&mid("R1"))
        );
    }
}
