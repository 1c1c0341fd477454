//! Core types shared across Coinline's crates and its wire format.
//!
//! Everything here either identifies something on the arcade floor
//! (players, machines), pins an event to wall-clock time, or describes
//! the floor as a whole (`FullState`). These are the structures that get
//! persisted, broadcast, and rendered — so their serde shapes are part
//! of the public contract and are pinned down by the tests below.

use std::fmt;
use std::ops::Add;
use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player's unique handle.
///
/// Newtype over the registered name so a handle can't be confused with a
/// machine id in a signature. `#[serde(transparent)]` keeps the wire shape
/// a plain JSON string.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerHandle(pub String);

impl PlayerHandle {
    /// Creates a handle from anything string-like.
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    /// Returns the handle as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A machine's unique identifier — the configured cabinet name.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MachineId(pub String);

impl MachineId {
    /// Creates a machine id from anything string-like.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Timestamp
// ---------------------------------------------------------------------------

/// A wall-clock instant as integer milliseconds since the Unix epoch.
///
/// Deadlines and play-time accounting are persisted, so they need a
/// representation that survives a save/load round trip bit-for-bit.
/// Integer milliseconds do; floating-point seconds would not.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Creates a timestamp from epoch milliseconds.
    pub const fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    /// Returns the epoch milliseconds.
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// Elapsed time since `earlier`. Saturates to zero if `earlier` is
    /// actually later (clock skew across a restart).
    pub fn since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0).max(0) as u64)
    }
}

impl Add<Duration> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: Duration) -> Timestamp {
        Timestamp(self.0.saturating_add(rhs.as_millis() as i64))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

// ---------------------------------------------------------------------------
// TurnPhase
// ---------------------------------------------------------------------------

/// The turn lifecycle of a single machine.
///
/// ```text
/// Idle ──(join)──→ Queued ──(advance)──→ AwaitingAccept ──(accept)──→ Active
///   ↑                 ↑                        │                        │
///   │                 └──(skip, others wait)───┘                        │
///   └────────────────────(finish/skip, queue empty)─────────────────────┘
/// ```
///
/// - **Idle**: no queue, no holder.
/// - **Queued**: players waiting, nobody offered or playing. A machine
///   whose entire queue is busy on other machines also sits here.
/// - **AwaitingAccept**: the queue head has been offered the turn and a
///   deadline is running. The head stays in the queue until they accept.
/// - **Active**: the holder accepted and is playing. No deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    Idle,
    Queued,
    AwaitingAccept,
    Active,
}

impl TurnPhase {
    /// Returns `true` if an offer is pending (a deadline is running).
    pub fn has_pending_offer(&self) -> bool {
        matches!(self, Self::AwaitingAccept)
    }

    /// Returns `true` if a holder is actively playing.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    /// The canonical string form, used by the persistence layer.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "Idle",
            Self::Queued => "Queued",
            Self::AwaitingAccept => "AwaitingAccept",
            Self::Active => "Active",
        }
    }

    /// Parses the canonical string form. Inverse of [`as_str`](Self::as_str).
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Idle" => Some(Self::Idle),
            "Queued" => Some(Self::Queued),
            "AwaitingAccept" => Some(Self::AwaitingAccept),
            "Active" => Some(Self::Active),
            _ => None,
        }
    }
}

impl fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Floor snapshot
// ---------------------------------------------------------------------------

/// One machine's full queue/turn state.
///
/// During `AwaitingAccept` the offered player is `queue[0]`, not yet the
/// `holder`; `holder` is only set while the phase is `Active`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineSnapshot {
    /// The machine this snapshot describes.
    pub id: MachineId,
    /// Waiting players, front first.
    pub queue: Vec<PlayerHandle>,
    /// The player currently in an active turn, if any.
    pub holder: Option<PlayerHandle>,
    /// Current turn phase.
    pub phase: TurnPhase,
    /// When the pending offer (or the turn it became) was made.
    pub turn_started: Option<Timestamp>,
    /// When the pending offer lapses. `None` once accepted.
    pub turn_deadline: Option<Timestamp>,
    /// When the holder accepted and started playing.
    pub active_since: Option<Timestamp>,
}

/// A player's cumulative counters across all machines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// The player's handle.
    pub handle: PlayerHandle,
    /// Raw cumulative play time in milliseconds. Never decreases; the
    /// external reward accrual reads this figure.
    pub play_time_ms: i64,
    /// Milliseconds subtracted for display after an admin stats reset.
    pub play_time_offset_ms: i64,
    /// Turns forfeited (self-skip or accept timeout).
    pub skip_count: u32,
    /// Turns accepted and played.
    pub session_count: u32,
}

/// A live courtesy cooldown for one (player, machine) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownSnapshot {
    /// The player the cooldown applies to.
    pub player: PlayerHandle,
    /// The machine they may not re-join yet.
    pub machine: MachineId,
    /// When the cooldown lapses.
    pub expires_at: Timestamp,
}

/// A consistent copy of the entire arcade floor.
///
/// Machines appear in configured order; players and cooldowns are sorted
/// by key, so two snapshots of identical state compare (and serialize)
/// identically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FullState {
    /// Every configured machine, in configured order.
    pub machines: Vec<MachineSnapshot>,
    /// Every player ever seen, sorted by handle.
    pub players: Vec<PlayerSnapshot>,
    /// Every live courtesy cooldown, sorted by (player, machine).
    pub cooldowns: Vec<CooldownSnapshot>,
    /// Whether the floor is globally paused.
    pub paused: bool,
    /// When the current pause began, if paused.
    pub pause_started: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// Wire messages
// ---------------------------------------------------------------------------

/// Messages a connected client sends to the coordinator.
///
/// The first message on a connection must be `Hello`. The gateway in
/// front of the coordinator has already authenticated the caller; the
/// handle and `admin` flag here are asserted, not verified.
///
/// `#[serde(tag = "type")]` gives internally tagged JSON:
/// `{ "type": "Join", "machine": "Maimai" }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientRequest {
    /// Identify this connection. Must be the first message.
    Hello { handle: PlayerHandle, admin: bool },

    /// Request a full floor snapshot.
    Snapshot,

    /// Join a machine's queue.
    Join { machine: MachineId },

    /// Accept a pending turn offer.
    Accept { machine: MachineId },

    /// Finish an active turn.
    Finish { machine: MachineId },

    /// Forfeit a pending turn offer.
    Skip { machine: MachineId },

    /// Leave a machine's queue (or abandon one's own pending offer).
    Leave { machine: MachineId },

    // -- Administrative (rejected unless the Hello carried admin: true) --
    /// Pause or resume the whole floor.
    SetPaused { paused: bool },

    /// Install a player as a machine's active holder.
    ForceSetHolder { machine: MachineId, player: PlayerHandle },

    /// Evict a player from a machine (queue, pending offer, or holder).
    RemoveFromQueue { machine: MachineId, player: PlayerHandle },

    /// Replace a machine's queue order with a permutation of itself.
    ReorderQueue { machine: MachineId, order: Vec<PlayerHandle> },

    /// Reset a player's displayed counters.
    ResetStats { player: PlayerHandle },
}

/// Messages the coordinator sends to a connected client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Reply to `Hello`: the connection is registered.
    Welcome {
        handle: PlayerHandle,
        admin: bool,
        server_time: Timestamp,
    },

    /// Something on the floor changed — re-fetch a snapshot.
    ///
    /// Carries only a sequence number. Observers that miss a notice lose
    /// nothing: the next snapshot is always complete.
    Changed { seq: u64 },

    /// Reply to `Snapshot`.
    Snapshot { state: FullState },

    /// The requested operation succeeded.
    Ok,

    /// Reply to a successful `Finish`: how long the turn lasted.
    Finished { played_ms: u64 },

    /// The requested operation failed.
    /// `code` follows HTTP conventions (403 forbidden, 404 not found,
    /// 409 precondition failed).
    Error { code: u16, message: String },
}

// =========================================================================
// Tests
// =========================================================================
