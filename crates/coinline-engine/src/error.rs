//! Error types for the queue engine.
//!
//! Each operation has its own error enum so callers can match on exactly
//! the failures that operation can produce. A rejected operation never
//! leaves partial effects — the precondition is checked before any state
//! is touched.

use coinline_protocol::{MachineId, PlayerHandle, Timestamp};
use coinline_store::StoreError;

/// Failures of [`join`](crate::QueueEngine::join).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The player is already in this machine's queue or is its holder.
    #[error("{0} is already queued or playing on this machine")]
    AlreadyQueued(PlayerHandle),

    /// A courtesy cooldown forbids re-joining until it lapses.
    #[error("courtesy cooldown active until {until}")]
    CooldownActive { until: Timestamp },

    /// The floor is globally paused; joins are rejected, not queued up.
    #[error("the floor is paused")]
    Paused,
}

/// Failures of [`accept_turn`](crate::QueueEngine::accept_turn).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceptError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The machine has no pending offer to accept.
    #[error("no pending turn offer on this machine")]
    NoActiveOffer,

    /// There is a pending offer, but not for this player.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerHandle),
}

/// Failures of [`finish_turn`](crate::QueueEngine::finish_turn).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FinishError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The player is not this machine's active holder.
    #[error("{0} is not playing on this machine")]
    NotPlaying(PlayerHandle),
}

/// Failures of [`skip_turn`](crate::QueueEngine::skip_turn).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The player has no pending offer to forfeit here.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerHandle),
}

/// Failures of [`leave`](crate::QueueEngine::leave).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaveError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The player is neither queued nor offered on this machine.
    #[error("{0} is not waiting on this machine")]
    NotWaiting(PlayerHandle),
}

/// Failures of the administrative operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdminError {
    /// The machine id is not configured on this floor.
    #[error("machine {0} not found")]
    UnknownMachine(MachineId),

    /// The player has never been seen by the engine.
    #[error("player {0} not found")]
    UnknownPlayer(PlayerHandle),

    /// The player is not present anywhere on the named machine.
    #[error("{player} is not present on {machine}")]
    NotPresent {
        player: PlayerHandle,
        machine: MachineId,
    },

    /// The proposed queue order is not a permutation of the current queue.
    #[error("new order for {0} is not a permutation of its queue")]
    InvalidOrder(MachineId),
}

/// Top-level error returned by [`QueueEngine`](crate::QueueEngine)
/// operations: any operation's typed failure, or a persistence failure
/// (in which case in-memory state is unchanged).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Join(#[from] JoinError),

    #[error(transparent)]
    Accept(#[from] AcceptError),

    #[error(transparent)]
    Finish(#[from] FinishError),

    #[error(transparent)]
    Skip(#[from] SkipError),

    #[error(transparent)]
    Leave(#[from] LeaveError),

    #[error(transparent)]
    Admin(#[from] AdminError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
